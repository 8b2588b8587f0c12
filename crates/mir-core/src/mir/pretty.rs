use itertools::Itertools;
use std::fmt::{self, Display, Formatter};

use crate::pretty::{escape_bytes, PrettyCtx, PrettyPrintable};
use crate::types::BorrowType;

use super::{
    BasicBlock, BinOp, CallTarget, Constant, Function, LValue, Literal, Program, RValue,
    Statement, StatementKind, Terminator, TerminatorKind, UniOp,
};

impl PrettyPrintable for Program {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
        for (idx, function) in self.functions.iter().enumerate() {
            function.fmt_pretty(f, ctx)?;
            if idx + 1 < self.functions.len() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl PrettyPrintable for Function {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
        let params = self
            .sig
            .args
            .iter()
            .enumerate()
            .map(|(idx, ty)| format!("a{}: {}", idx, ty))
            .join(", ");
        ctx.writeln(f, format!("fn {}({}) -> {} {{", self.path, params, self.sig.ret))?;
        ctx.with_indent(|ctx| {
            for (idx, ty) in self.body.temporaries.iter().enumerate() {
                ctx.writeln(f, format!("let t{}: {};", idx, ty))?;
            }
            for (idx, block) in self.body.basic_blocks.iter().enumerate() {
                write_block(idx, block, f, ctx)?;
            }
            Ok(())
        })?;
        ctx.writeln(f, "}")
    }
}

fn write_block(
    index: usize,
    block: &BasicBlock,
    f: &mut Formatter<'_>,
    ctx: &mut PrettyCtx<'_>,
) -> fmt::Result {
    ctx.writeln(f, format!("bb{}:", index))?;
    ctx.with_indent(|ctx| {
        for (stmt_idx, stmt) in block.statements.iter().enumerate() {
            ctx.writeln(f, format!("s{}: {}", stmt_idx, stmt))?;
        }
        ctx.writeln(f, format!("terminator: {}", block.terminator))
    })
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StatementKind::Assign(dst, src) => write!(f, "{} = {}", dst, src),
            StatementKind::Drop { kind, slot } => write!(f, "drop({:?}, {})", kind, slot),
            StatementKind::Nop => write!(f, "nop"),
        }
    }
}

impl Display for Terminator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TerminatorKind::Goto(target) => write!(f, "goto bb{}", target),
            TerminatorKind::Return => write!(f, "return"),
            TerminatorKind::Diverge => write!(f, "diverge"),
            TerminatorKind::Panic { dst } => write!(f, "panic -> bb{}", dst),
            TerminatorKind::If {
                cond,
                bb_true,
                bb_false,
            } => write!(f, "if {} {{ bb{} }} else {{ bb{} }}", cond, bb_true, bb_false),
            TerminatorKind::Switch { val, targets } => write!(
                f,
                "switch {} [{}]",
                val,
                targets.iter().map(|bb| format!("bb{}", bb)).join(", ")
            ),
            TerminatorKind::Call {
                ret_block,
                panic_block,
                ret_val,
                fcn,
                args,
            } => write!(
                f,
                "{} = {}({}) -> bb{}, unwind bb{}",
                ret_val,
                fcn,
                args.iter().join(", "),
                ret_block,
                panic_block
            ),
        }
    }
}

impl Display for CallTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CallTarget::Value(lv) => write!(f, "({})", lv),
            CallTarget::Path(path) => write!(f, "{}", path),
            CallTarget::Intrinsic { name, params } => write!(f, "intrinsic \"{}\"{}", name, params),
        }
    }
}

impl Display for LValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LValue::Return => write!(f, "RETURN"),
            LValue::Argument(idx) => write!(f, "a{}", idx),
            LValue::Temporary(idx) => write!(f, "t{}", idx),
            LValue::Static(path) => write!(f, "static({})", path),
            LValue::Deref(inner) => write!(f, "(*{})", inner),
            LValue::Field(inner, idx) => write!(f, "{}.{}", inner, idx),
            LValue::Index(inner, idx) => write!(f, "{}[{}]", inner, idx),
        }
    }
}

impl Display for RValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RValue::Use(lv) => write!(f, "{}", lv),
            RValue::Constant(constant) => write!(f, "{}", constant),
            RValue::SizedArray { val, count } => write!(f, "[{}; {}]", val, count),
            RValue::Borrow { kind, val } => {
                let prefix = match kind {
                    BorrowType::Shared => "&",
                    BorrowType::Unique => "&mut ",
                    BorrowType::Owned => "&move ",
                };
                write!(f, "{}{}", prefix, val)
            }
            RValue::Cast { val, ty } => write!(f, "{} as {}", val, ty),
            RValue::BinOp { lhs, op, rhs } => write!(f, "{} {} {}", lhs, op, rhs),
            RValue::UniOp { val, op } => write!(f, "{}{}", op, val),
            RValue::DstMeta(lv) => write!(f, "META({})", lv),
            RValue::DstPtr(lv) => write!(f, "PTR({})", lv),
            RValue::MakeDst { ptr, meta } => write!(f, "DST({}, {})", ptr, meta),
            RValue::Tuple(vals) => write!(f, "({})", vals.iter().join(", ")),
            RValue::Array(vals) => write!(f, "[{}]", vals.iter().join(", ")),
            RValue::Struct { path, vals } => write!(f, "{} {{ {} }}", path, vals.iter().join(", ")),
        }
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(value) => write!(f, "{}i", value),
            Constant::Uint(value) => write!(f, "{}u", value),
            Constant::Float(value) => write!(f, "{:?}f", value),
            Constant::Bool(value) => write!(f, "{}", value),
            Constant::Bytes(bytes) => write!(f, "b\"{}\"", escape_bytes(bytes)),
            Constant::StaticString(text) => write!(f, "{:?}", text),
            Constant::Const(path) => write!(f, "const {}", path),
            Constant::ItemAddr(path) => write!(f, "addr {}", path),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(value) => write!(f, "{}", value),
            Literal::Float(value) => write!(f, "{:?}", value),
            Literal::String(bytes) => write!(f, "b\"{}\"", escape_bytes(bytes)),
            Literal::BorrowOf(path) => write!(f, "&{}", path),
        }
    }
}

impl Display for BinOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let op = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        };
        f.write_str(op)
    }
}

impl Display for UniOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            UniOp::Inv => f.write_str("!"),
            UniOp::Neg => f.write_str("-"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mir::{Body, FunctionSig};
    use crate::pretty::{pretty, PrettyOptions};
    use crate::span::Span;
    use crate::types::{SimplePath, TypeRef};

    #[test]
    fn function_dump_lists_temporaries_and_blocks() {
        let function = Function {
            path: SimplePath::parse("demo::len"),
            sig: FunctionSig {
                args: vec![TypeRef::usize()],
                ret: TypeRef::usize(),
            },
            body: Body::new(
                vec![TypeRef::usize()],
                vec![BasicBlock::new(
                    vec![Statement::assign(
                        Span::dummy(),
                        LValue::Temporary(0),
                        RValue::Constant(Constant::Uint(4)),
                    )],
                    Terminator::new(Span::dummy(), TerminatorKind::Return),
                )],
            ),
            span: Span::dummy(),
        };

        let text = pretty(&function, PrettyOptions::default()).to_string();
        let expected = "\
fn demo::len(a0: usize) -> usize {
    let t0: usize;
    bb0:
        s0: t0 = 4u
        terminator: return
}
";
        assert_eq!(text, expected);
    }

    #[test]
    fn lvalue_projection_display() {
        let lv = LValue::Temporary(3).deref().field(2);
        assert_eq!(lv.to_string(), "(*t3).2");
    }

    #[test]
    fn byte_literals_escape_non_ascii() {
        assert_eq!(Literal::String(vec![b'o', b'k', 0xff]).to_string(), "b\"ok\\xff\"");
        assert_eq!(Constant::StaticString("a\"b".into()).to_string(), "\"a\\\"b\"");
    }
}
