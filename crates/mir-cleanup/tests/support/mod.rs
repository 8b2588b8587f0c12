#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use mir_cleanup::{CleanupOptions, MirCleanup};
use mir_core::diagnostics::DiagnosticManager;
use mir_core::mir::{
    BasicBlock, Body, CallTarget, Function, FunctionSig, LValue, RValue, Statement,
    StatementKind, Terminator, TerminatorKind,
};
use mir_core::span::Span;
use mir_core::types::{
    BorrowType, CoreType, DefRef, GenericParams, GenericPath, Path, PathParams, SimplePath,
    StructData, StructDef, StructMarkings, TraitDef, TraitPath, TypePathBinding, TypeRef,
    VtableSlot,
};
use mir_core::CrateDb;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn span() -> Span {
    Span::new(0, 0, 0)
}

pub fn path(text: &str) -> SimplePath {
    SimplePath::parse(text)
}

pub fn u8_ty() -> TypeRef {
    TypeRef::Primitive(CoreType::U8)
}

pub fn shared(inner: TypeRef) -> TypeRef {
    TypeRef::new_borrow(BorrowType::Shared, inner)
}

pub fn const_ptr(inner: TypeRef) -> TypeRef {
    TypeRef::new_pointer(BorrowType::Shared, inner)
}

pub fn mut_ptr(inner: TypeRef) -> TypeRef {
    TypeRef::new_pointer(BorrowType::Unique, inner)
}

pub fn byte_array(size: u64) -> TypeRef {
    TypeRef::new_array(u8_ty(), size)
}

pub fn byte_slice() -> TypeRef {
    TypeRef::new_slice(u8_ty())
}

pub fn assign(dst: LValue, src: RValue) -> Statement {
    Statement::assign(span(), dst, src)
}

pub fn cast(val: LValue, ty: TypeRef) -> RValue {
    RValue::Cast { val, ty }
}

pub fn block(statements: Vec<Statement>, kind: TerminatorKind) -> BasicBlock {
    BasicBlock::new(statements, Terminator::new(span(), kind))
}

pub fn function(
    name: &str,
    args: Vec<TypeRef>,
    temporaries: Vec<TypeRef>,
    basic_blocks: Vec<BasicBlock>,
) -> Function {
    Function {
        path: path(name),
        sig: FunctionSig {
            args,
            ret: TypeRef::unit(),
        },
        body: Body::new(temporaries, basic_blocks),
        span: span(),
    }
}

/// Function with a single block of `statements` ending in `return`.
pub fn straight_line(name: &str, args: Vec<TypeRef>, temporaries: Vec<TypeRef>, statements: Vec<Statement>) -> Function {
    function(name, args, temporaries, vec![block(statements, TerminatorKind::Return)])
}

pub fn statements(function: &Function, block: usize) -> &[Statement] {
    &function.body.basic_blocks[block].statements
}

pub fn rvalue_at(function: &Function, block: usize, stmt: usize) -> &RValue {
    match &function.body.basic_blocks[block].statements[stmt].kind {
        StatementKind::Assign(_, src) => src,
        other => panic!("expected assignment, found {:?}", other),
    }
}

/// Source of the single assignment to temporary `idx` in `block`.
pub fn assigned_value(function: &Function, block: usize, idx: usize) -> &RValue {
    let found = statements(function, block)
        .iter()
        .filter_map(|stmt| match &stmt.kind {
            StatementKind::Assign(LValue::Temporary(dst), src) if *dst == idx => Some(src),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(found.len(), 1, "t{idx} should be assigned exactly once");
    found[0]
}

pub fn cleaner(db: &CrateDb, options: CleanupOptions) -> (MirCleanup<'_>, Arc<DiagnosticManager>) {
    let diagnostics = Arc::new(DiagnosticManager::new());
    let cleanup = MirCleanup::new(db)
        .with_options(options)
        .with_diagnostics(diagnostics.clone());
    (cleanup, diagnostics)
}

/// One-parameter wrapper struct whose only field propagates coercion.
pub fn add_wrapper(db: &mut CrateDb, name: &str) -> DefRef<StructDef> {
    db.add_struct(StructDef {
        path: path(name),
        params: GenericParams::new(["T"]),
        data: StructData::Tuple(vec![TypeRef::new_generic("T", 0)]),
        markings: StructMarkings {
            coerce_unsized_index: Some(0),
        },
    })
}

pub fn struct_ty(def: &DefRef<StructDef>, params: Vec<TypeRef>) -> TypeRef {
    TypeRef::new_struct(
        GenericPath::new(def.path.clone(), PathParams::new(params)),
        def.clone(),
    )
}

pub fn opaque_ty(name: &str) -> TypeRef {
    TypeRef::Path {
        path: Path::from(path(name)),
        binding: TypePathBinding::Opaque,
    }
}

pub fn slot(name: &str, index: usize, owner: GenericPath) -> VtableSlot {
    VtableSlot {
        name: name.to_string(),
        index,
        owner,
    }
}

/// `demo::Shape` with `size`, `align` and `area` in slots 0..=2.
pub fn add_shape_trait(db: &mut CrateDb) -> DefRef<TraitDef> {
    let shape = path("demo::Shape");
    let mut def = TraitDef::new(shape.clone());
    def.value_indexes = vec![
        slot("size", 0, shape.clone().into()),
        slot("align", 1, shape.clone().into()),
        slot("area", 2, shape.into()),
    ];
    db.add_trait(def)
}

pub fn add_square(db: &mut CrateDb) -> TypeRef {
    let def = db.add_struct(StructDef {
        path: path("demo::Square"),
        params: GenericParams::default(),
        data: StructData::Tuple(vec![TypeRef::Primitive(CoreType::F64)]),
        markings: StructMarkings::default(),
    });
    struct_ty(&def, vec![])
}

pub fn object_ty(def: &DefRef<TraitDef>, params: Vec<TypeRef>, bounds: BTreeMap<String, TypeRef>) -> TypeRef {
    let mut trait_ = TraitPath::new(
        GenericPath::new(def.path.clone(), PathParams::new(params)),
        Some(def.clone()),
    );
    trait_.type_bounds = bounds;
    TypeRef::new_trait_object(trait_)
}

/// `<object as named>::item(args..)`, returning into `ret_val`.
pub fn method_call(object: TypeRef, named: GenericPath, item: &str, ret_val: LValue, args: Vec<LValue>) -> TerminatorKind {
    TerminatorKind::Call {
        ret_block: 1,
        panic_block: 2,
        ret_val,
        fcn: CallTarget::Path(Path::UfcsKnown {
            ty: Box::new(object),
            trait_: named,
            item: item.to_string(),
            params: PathParams::default(),
        }),
        args,
    }
}

/// `a0: &Square` coerced to `&dyn Shape` in t0, then `t1 = area(t0)`.
pub fn shape_program(db: &mut CrateDb) -> Function {
    let shape = add_shape_trait(db);
    let square = add_square(db);
    let object = object_ty(&shape, vec![], BTreeMap::new());
    function(
        "demo::draw",
        vec![shared(square)],
        vec![shared(object.clone()), TypeRef::Primitive(CoreType::F64)],
        vec![
            block(
                vec![assign(
                    LValue::Temporary(0),
                    cast(LValue::Argument(0), shared(object.clone())),
                )],
                method_call(
                    object,
                    shape.path.clone().into(),
                    "area",
                    LValue::Temporary(1),
                    vec![LValue::Temporary(0)],
                ),
            ),
            block(vec![], TerminatorKind::Return),
            block(vec![], TerminatorKind::Diverge),
        ],
    )
}
