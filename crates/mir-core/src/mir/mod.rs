//! Mid-level IR: per-function control flow graphs over typed temporaries.

use crate::span::Span;
use crate::types::{BorrowType, GenericPath, Path, PathParams, SimplePath, TypeRef};

pub mod pretty;

pub type BasicBlockId = usize;
pub type TemporaryId = usize;
pub type FieldIdx = usize;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub functions: Vec<Function>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSig {
    pub args: Vec<TypeRef>,
    pub ret: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub path: SimplePath,
    pub sig: FunctionSig,
    pub body: Body,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Body {
    /// Temporary index to its declared type. Append-only.
    pub temporaries: Vec<TypeRef>,
    pub basic_blocks: Vec<BasicBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub statements: Vec<Statement>,
    pub terminator: Terminator,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub source_info: Span,
    pub kind: StatementKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Assign(LValue, RValue),
    Drop { kind: DropKind, slot: LValue },
    Nop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropKind {
    Shallow,
    Deep,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Terminator {
    pub source_info: Span,
    pub kind: TerminatorKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TerminatorKind {
    Goto(BasicBlockId),
    Return,
    Diverge,
    Panic {
        dst: BasicBlockId,
    },
    If {
        cond: LValue,
        bb_true: BasicBlockId,
        bb_false: BasicBlockId,
    },
    Switch {
        val: LValue,
        targets: Vec<BasicBlockId>,
    },
    Call {
        ret_block: BasicBlockId,
        panic_block: BasicBlockId,
        ret_val: LValue,
        fcn: CallTarget,
        args: Vec<LValue>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallTarget {
    Value(LValue),
    Path(Path),
    Intrinsic { name: String, params: PathParams },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LValue {
    Return,
    Argument(usize),
    Temporary(TemporaryId),
    Static(GenericPath),
    Deref(Box<LValue>),
    Field(Box<LValue>, FieldIdx),
    Index(Box<LValue>, Box<LValue>),
}

impl LValue {
    pub fn deref(self) -> LValue {
        LValue::Deref(Box::new(self))
    }

    pub fn field(self, idx: FieldIdx) -> LValue {
        LValue::Field(Box::new(self), idx)
    }

    pub fn index(self, idx: LValue) -> LValue {
        LValue::Index(Box::new(self), Box::new(idx))
    }

    pub fn as_temporary(&self) -> Option<TemporaryId> {
        match self {
            LValue::Temporary(idx) => Some(*idx),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniOp {
    Inv,
    Neg,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RValue {
    Use(LValue),
    Constant(Constant),
    SizedArray {
        val: LValue,
        count: u64,
    },
    Borrow {
        kind: BorrowType,
        val: LValue,
    },
    /// Reinterpretation or numeric cast of `val` to `ty`.
    Cast {
        val: LValue,
        ty: TypeRef,
    },
    BinOp {
        lhs: LValue,
        op: BinOp,
        rhs: LValue,
    },
    UniOp {
        val: LValue,
        op: UniOp,
    },
    /// Metadata word (length or vtable) of a fat pointer.
    DstMeta(LValue),
    /// Data word of a fat pointer.
    DstPtr(LValue),
    /// Build a fat pointer from a data word and a metadata word.
    MakeDst {
        ptr: LValue,
        meta: LValue,
    },
    Tuple(Vec<LValue>),
    Array(Vec<LValue>),
    Struct {
        path: GenericPath,
        vals: Vec<LValue>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    StaticString(String),
    /// Reference to a constant item, replaced by its value during cleanup.
    Const(Path),
    ItemAddr(Path),
}

/// A value computed by constant evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(u64),
    Float(f64),
    /// Raw bytes of a string or byte-string constant.
    String(Vec<u8>),
    /// Address of another item.
    BorrowOf(Path),
}

impl Literal {
    pub fn as_integer(&self) -> Option<u64> {
        match self {
            Literal::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Literal::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Literal::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_borrow_of(&self) -> bool {
        matches!(self, Literal::BorrowOf(_))
    }
}

impl Statement {
    pub fn assign(source_info: Span, dst: LValue, src: RValue) -> Self {
        Self {
            source_info,
            kind: StatementKind::Assign(dst, src),
        }
    }

    pub fn nop(source_info: Span) -> Self {
        Self {
            source_info,
            kind: StatementKind::Nop,
        }
    }
}

impl Terminator {
    pub fn new(source_info: Span, kind: TerminatorKind) -> Self {
        Self { source_info, kind }
    }
}

impl BasicBlock {
    pub fn new(statements: Vec<Statement>, terminator: Terminator) -> Self {
        Self {
            statements,
            terminator,
        }
    }
}

impl Body {
    pub fn new(temporaries: Vec<TypeRef>, basic_blocks: Vec<BasicBlock>) -> Self {
        Self {
            temporaries,
            basic_blocks,
        }
    }

    pub fn statement_count(&self) -> usize {
        self.basic_blocks
            .iter()
            .map(|block| block.statements.len())
            .sum()
    }
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }
}
