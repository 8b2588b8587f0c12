use std::collections::BTreeMap;

use mir_cleanup::{CleanupOptions, SlotAmbiguity};
use mir_core::diagnostics::DiagnosticLevel;
use mir_core::error::Result;
use mir_core::mir::{CallTarget, Function, LValue, RValue, TerminatorKind};
use mir_core::pretty::{pretty, PrettyOptions};
use mir_core::types::{
    CoreType, DefRef, GenericParams, GenericPath, PathParams, TraitDef, TraitPath, TypeRef,
};
use mir_core::CrateDb;
use pretty_assertions::assert_eq;

mod support;

use support::*;

fn call_target(function: &Function, block: usize) -> &CallTarget {
    match &function.body.basic_blocks[block].terminator.kind {
        TerminatorKind::Call { fcn, .. } => fcn,
        other => panic!("expected call, found {:?}", other),
    }
}

/// Slot index read by a virtualized call target `(*tN).idx`.
fn called_slot(function: &Function) -> usize {
    match call_target(function, 0) {
        CallTarget::Value(LValue::Field(_, idx)) => *idx,
        other => panic!("call was not virtualized: {}", other),
    }
}

#[test]
fn trait_object_call_reads_vtable_slot() -> Result<()> {
    init_tracing();
    let mut db = CrateDb::new();
    let mut function = shape_program(&mut db);

    let (cleanup, _) = cleaner(&db, CleanupOptions::default());
    let report = cleanup.cleanup_function(&mut function)?;

    let text = pretty(&function, PrettyOptions::default()).to_string();
    let expected = "\
fn demo::draw(a0: &demo::Square) -> () {
    let t0: &dyn demo::Shape;
    let t1: f64;
    let t2: *const demo::Shape#vtable;
    let t3: *const demo::Shape#vtable;
    let t4: *const ();
    bb0:
        s0: t2 = addr <demo::Square as demo::Shape>::#vtable
        s1: t0 = DST(a0, t2)
        s2: t3 = META((*t0))
        s3: t4 = PTR((*t0))
        terminator: t1 = ((*t3).2)(t4) -> bb1, unwind bb2
    bb1:
        terminator: return
    bb2:
        terminator: diverge
}
";
    assert_eq!(text, expected);
    assert_eq!(report.virtualized_calls, 1);
    assert_eq!(report.unsizings, 1);
    assert_eq!(report.statements_inserted, 3);
    assert_eq!(report.temporaries_added, 3);
    Ok(())
}

#[test]
fn call_keeps_other_arguments_and_targets() -> Result<()> {
    let mut db = CrateDb::new();
    let shape = add_shape_trait(&mut db);
    let object = object_ty(&shape, vec![], BTreeMap::new());
    let mut function = function(
        "demo::scale",
        vec![shared(object.clone()), TypeRef::Primitive(CoreType::F64)],
        vec![TypeRef::Primitive(CoreType::F64)],
        vec![
            block(
                vec![],
                method_call(
                    object,
                    shape.path.clone().into(),
                    "size",
                    LValue::Temporary(0),
                    vec![LValue::Argument(0), LValue::Argument(1)],
                ),
            ),
            block(vec![], TerminatorKind::Return),
            block(vec![], TerminatorKind::Diverge),
        ],
    );

    let (cleanup, _) = cleaner(&db, CleanupOptions::default());
    cleanup.cleanup_function(&mut function)?;

    let TerminatorKind::Call {
        ret_block,
        panic_block,
        ret_val,
        args,
        ..
    } = &function.body.basic_blocks[0].terminator.kind
    else {
        panic!("terminator should still be a call");
    };
    assert_eq!((*ret_block, *panic_block), (1, 2));
    assert_eq!(ret_val, &LValue::Temporary(0));
    assert_eq!(args, &vec![LValue::Temporary(2), LValue::Argument(1)]);
    assert_eq!(called_slot(&function), 0);
    assert_eq!(
        rvalue_at(&function, 0, 0),
        &RValue::DstMeta(LValue::Argument(0).deref())
    );
    Ok(())
}

/// `demo::Named { name }` and `demo::Labelled: Named { label }`.
fn labelled(db: &mut CrateDb) -> (DefRef<TraitDef>, DefRef<TraitDef>) {
    let named_path = path("demo::Named");
    let mut named = TraitDef::new(named_path.clone());
    named.value_indexes = vec![slot("name", 0, named_path.clone().into())];
    let named = db.add_trait(named);

    let labelled_path = path("demo::Labelled");
    let mut labelled = TraitDef::new(labelled_path.clone());
    labelled.parent_traits = vec![TraitPath::new(named_path.clone().into(), Some(named.clone()))];
    labelled.value_indexes = vec![
        slot("name", 0, named_path.into()),
        slot("label", 1, labelled_path.into()),
    ];
    (named, db.add_trait(labelled))
}

fn single_call(object: TypeRef, named: GenericPath, item: &str) -> Function {
    function(
        "demo::show",
        vec![shared(object.clone())],
        vec![TypeRef::unit()],
        vec![
            block(
                vec![],
                method_call(object, named, item, LValue::Temporary(0), vec![LValue::Argument(0)]),
            ),
            block(vec![], TerminatorKind::Return),
            block(vec![], TerminatorKind::Diverge),
        ],
    )
}

#[test]
fn supertrait_method_goes_through_object_vtable() -> Result<()> {
    let mut db = CrateDb::new();
    let (named, labelled) = labelled(&mut db);
    let object = object_ty(&labelled, vec![], BTreeMap::new());
    let mut function = single_call(object, named.path.clone().into(), "name");

    let (cleanup, _) = cleaner(&db, CleanupOptions::default());
    let report = cleanup.cleanup_function(&mut function)?;

    assert_eq!(called_slot(&function), 0);
    assert_eq!(report.virtualized_calls, 1);
    // The vtable is the object trait's, not the supertrait's.
    assert_eq!(
        function.body.temporaries[1].to_string(),
        "*const demo::Labelled#vtable"
    );
    Ok(())
}

#[test]
fn unrelated_trait_call_is_left_alone() -> Result<()> {
    let mut db = CrateDb::new();
    let (named, _) = labelled(&mut db);
    let shape = add_shape_trait(&mut db);
    let object = object_ty(&named, vec![], BTreeMap::new());
    let mut function = single_call(object, shape.path.clone().into(), "area");
    let before = function.clone();

    let (cleanup, _) = cleaner(&db, CleanupOptions::default());
    let report = cleanup.cleanup_function(&mut function)?;

    assert_eq!(function, before);
    assert_eq!(report.virtualized_calls, 0);
    Ok(())
}

#[test]
fn method_missing_from_vtable_is_fatal() {
    let mut db = CrateDb::new();
    let shape = add_shape_trait(&mut db);
    let object = object_ty(&shape, vec![], BTreeMap::new());
    let mut function = single_call(object, shape.path.clone().into(), "perimeter");

    let (cleanup, diagnostics) = cleaner(&db, CleanupOptions::default());
    let err = cleanup.cleanup_function(&mut function).unwrap_err();
    assert!(err.is_bug());
    let recorded = diagnostics.get_diagnostics();
    assert_eq!(recorded[0].source_context.as_deref(), Some("demo::show @ bb0/term"));
}

/// `demo::Top<T>: Base<T> + Base<u8> + Base<u64>`. No `get` slot is owned
/// by `Base<u64>`, so calls through it have several candidates.
fn diamond(db: &mut CrateDb) -> DefRef<TraitDef> {
    let base_path = path("demo::Base");
    let mut base = TraitDef::new(base_path.clone());
    base.params = GenericParams::new(["X"]);
    let base_of = |ty: TypeRef| GenericPath::new(base_path.clone(), PathParams::new(vec![ty]));
    base.value_indexes = vec![slot("get", 0, base_of(TypeRef::new_generic("X", 0)))];
    db.add_trait(base);

    let mut top = TraitDef::new(path("demo::Top"));
    top.params = GenericParams::new(["T"]);
    top.parent_traits = vec![
        TraitPath::new(base_of(TypeRef::new_generic("T", 0)), None),
        TraitPath::new(base_of(u8_ty()), None),
        TraitPath::new(base_of(TypeRef::Primitive(CoreType::U64)), None),
    ];
    top.value_indexes = vec![
        slot("get", 3, base_of(TypeRef::new_generic("T", 0))),
        slot("get", 4, base_of(u8_ty())),
        slot("get", 5, base_of(TypeRef::Primitive(CoreType::U16))),
        slot("get", 6, base_of(TypeRef::Primitive(CoreType::I16))),
    ];
    db.add_trait(top)
}

fn diamond_call(db: &mut CrateDb, arg: TypeRef) -> Function {
    let top = diamond(db);
    let object = object_ty(&top, vec![TypeRef::Primitive(CoreType::U32)], BTreeMap::new());
    single_call(
        object,
        GenericPath::new(path("demo::Base"), PathParams::new(vec![arg])),
        "get",
    )
}

#[test]
fn exact_owner_instantiation_is_preferred() -> Result<()> {
    let mut db = CrateDb::new();
    let mut via_param = diamond_call(&mut db, TypeRef::Primitive(CoreType::U32));
    let (cleanup, diagnostics) = cleaner(&db, CleanupOptions::default());
    cleanup.cleanup_function(&mut via_param)?;
    assert_eq!(called_slot(&via_param), 3);

    let mut db = CrateDb::new();
    let mut via_byte = diamond_call(&mut db, u8_ty());
    let (cleanup, _) = cleaner(&db, CleanupOptions::default());
    cleanup.cleanup_function(&mut via_byte)?;
    assert_eq!(called_slot(&via_byte), 4);

    assert!(diagnostics.warnings().is_empty());
    Ok(())
}

#[test]
fn ambiguous_slot_follows_policy() -> Result<()> {
    let ambiguous = TypeRef::Primitive(CoreType::U64);

    let mut db = CrateDb::new();
    let mut function = diamond_call(&mut db, ambiguous.clone());
    let (cleanup, diagnostics) = cleaner(&db, CleanupOptions::default());
    cleanup.cleanup_function(&mut function)?;
    assert_eq!(called_slot(&function), 3);
    let warnings = diagnostics.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].level, DiagnosticLevel::Warning);
    assert!(warnings[0].message.contains("[3, 4, 5, 6]"), "{}", warnings[0].message);
    assert_eq!(
        warnings[0].suggestions,
        vec!["set slot_ambiguity to `first` to accept the first slot silently".to_string()]
    );

    let mut db = CrateDb::new();
    let mut function = diamond_call(&mut db, ambiguous.clone());
    let options = CleanupOptions::default().slot_ambiguity(SlotAmbiguity::First);
    let (cleanup, diagnostics) = cleaner(&db, options);
    cleanup.cleanup_function(&mut function)?;
    assert_eq!(called_slot(&function), 3);
    assert!(diagnostics.get_diagnostics().is_empty());

    let mut db = CrateDb::new();
    let mut function = diamond_call(&mut db, ambiguous);
    let options = CleanupOptions::default().slot_ambiguity(SlotAmbiguity::Deny);
    let (cleanup, _) = cleaner(&db, options);
    assert!(cleanup.cleanup_function(&mut function).unwrap_err().is_bug());
    Ok(())
}

#[test]
fn slot_selection_is_deterministic() -> Result<()> {
    let options = CleanupOptions::default().slot_ambiguity(SlotAmbiguity::First);
    let mut chosen = Vec::new();
    for _ in 0..8 {
        let mut db = CrateDb::new();
        let mut function = diamond_call(&mut db, TypeRef::Primitive(CoreType::U64));
        let (cleanup, _) = cleaner(&db, options.clone());
        cleanup.cleanup_function(&mut function)?;
        chosen.push(called_slot(&function));
    }
    assert!(chosen.iter().all(|slot| *slot == chosen[0]));
    Ok(())
}
