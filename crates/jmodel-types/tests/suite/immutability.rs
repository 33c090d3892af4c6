use std::rc::Rc;

use jmodel_types::{
    CodeModel, InitState, ModelError, Modifiers, Mutability, NodeKey, TypeCategory, TypeVarOwner,
};

use pretty_assertions::assert_eq;

fn read_only(kind: &'static str, name: &str, attribute: &'static str) -> ModelError {
    ModelError::ReadOnly {
        kind,
        name: name.to_string(),
        attribute,
    }
}

#[test]
fn frozen_type_rejects_setters_and_keeps_reads() {
    let mut model = CodeModel::default();
    let ty = model
        .declare_type("demo.Frozen", TypeCategory::Class, None)
        .unwrap();
    let int = model.get_type("int").unwrap();
    let field = model.add_field(ty, "size", int).unwrap();
    let op = model.add_method(ty, "size").unwrap();
    let t = model.add_type_var(TypeVarOwner::Type(ty), "T").unwrap();

    model.set_immutable(ty.into());

    assert_eq!(
        model.set_modifiers(ty, Modifiers::PUBLIC).unwrap_err(),
        read_only("type", "demo.Frozen", "modifiers")
    );
    assert!(matches!(
        model.add_field(ty, "other", int),
        Err(ModelError::ReadOnly { .. })
    ));
    assert!(matches!(
        model.set_field_type(field, ty),
        Err(ModelError::ReadOnly { .. })
    ));
    assert!(matches!(
        model.add_parameter(op, "x", int, false),
        Err(ModelError::ReadOnly { .. })
    ));
    assert!(matches!(
        model.set_type_var_bound(t, Some(int)),
        Err(ModelError::ReadOnly { .. })
    ));
    assert!(matches!(
        model.add_super_type(ty, int),
        Err(ModelError::ReadOnly { .. })
    ));

    // Reads still work and see the pre-freeze state.
    assert_eq!(model.fields(ty), vec![field]);
    assert_eq!(model.methods(ty), vec![op]);
    assert_eq!(model.field(field).ty(), int);
    assert_eq!(model.type_variables(TypeVarOwner::Type(ty)), vec![t]);
    assert!(model.is_immutable(NodeKey::Field(field)));
    assert!(model.is_immutable(NodeKey::Operation(op)));
}

#[test]
fn freezing_is_idempotent() {
    let mut model = CodeModel::default();
    let ty = model
        .declare_type("demo.Twice", TypeCategory::Class, None)
        .unwrap();
    model.set_immutable(ty.into());
    model.set_immutable(ty.into());

    let lifecycle = model.lifecycle(ty.into());
    assert_eq!(lifecycle.mutability(), Mutability::Immutable);
    assert_eq!(lifecycle.init_state(), InitState::Done);
}

#[test]
fn freezing_runs_the_pending_lazy_fill_first() {
    let mut model = CodeModel::default();
    let ty = model
        .declare_type("demo.Lazy", TypeCategory::Class, None)
        .unwrap();
    let hook: jmodel_types::LazyInit = Rc::new(|model: &mut CodeModel, key: NodeKey| {
        let NodeKey::Type(ty) = key else {
            return Ok(());
        };
        let int = model.get_type("int").unwrap();
        model.add_field(ty, "filled", int)?;
        Ok(())
    });
    model.set_lazy_init(ty.into(), hook);

    model.set_immutable(ty.into());
    assert!(model.field_by_name(ty, "filled").is_some());
}

#[test]
fn mutating_an_uninitialized_node_initializes_it() {
    let mut model = CodeModel::default();
    let ty = model
        .declare_type("demo.Pending", TypeCategory::Class, None)
        .unwrap();
    let hook: jmodel_types::LazyInit = Rc::new(|model: &mut CodeModel, key: NodeKey| {
        if let NodeKey::Type(ty) = key {
            let int = model.get_type("int").unwrap();
            model.add_field(ty, "first", int)?;
        }
        Ok(())
    });
    model.set_lazy_init(ty.into(), hook);

    let int = model.get_type("int").unwrap();
    model.add_field(ty, "second", int).unwrap();

    let names: Vec<String> = model
        .fields(ty)
        .into_iter()
        .map(|field| model.field(field).name().to_string())
        .collect();
    assert_eq!(names, vec!["first", "second"]);
}

#[test]
fn shared_references_are_not_frozen_with_their_user() {
    let mut model = CodeModel::default();
    let user = model
        .declare_type("demo.User", TypeCategory::Class, None)
        .unwrap();
    let other = model
        .declare_type("demo.Other", TypeCategory::Class, None)
        .unwrap();
    model.add_field(user, "other", other).unwrap();

    model.set_immutable(user.into());

    assert!(model.is_immutable(user.into()));
    assert!(!model.is_immutable(other.into()));
    model.set_modifiers(other, Modifiers::FINAL).unwrap();
}

#[test]
fn finishing_a_unit_can_freeze_its_types() {
    let mut model = CodeModel::default();
    let unit = model.create_unit(Some("demo"));
    let ty = model
        .declare_type("demo.Done", TypeCategory::Class, Some(unit))
        .unwrap();
    let nested = model
        .declare_nested_type(ty, "Inner", TypeCategory::Class)
        .unwrap();

    model.finish_unit(unit, true);

    assert!(model.unit(unit).is_finished());
    assert!(model.is_immutable(ty.into()));
    assert!(model.is_immutable(nested.into()));
}
