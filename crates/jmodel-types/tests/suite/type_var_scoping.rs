use jmodel_types::{CodeModel, Modifiers, TypeCategory, TypeId, TypeVarOwner};

use pretty_assertions::assert_eq;

struct Fixture {
    model: CodeModel,
    outer_t: TypeId,
    inner: TypeId,
    method: jmodel_types::OperationId,
}

fn fixture(inner_modifiers: Modifiers) -> Fixture {
    let mut model = CodeModel::default();
    let outer = model
        .declare_type("demo.Outer", TypeCategory::Class, None)
        .unwrap();
    let outer_t = model.add_type_var(TypeVarOwner::Type(outer), "T").unwrap();
    let inner = model
        .declare_nested_type(outer, "Inner", TypeCategory::Class)
        .unwrap();
    model.set_modifiers(inner, inner_modifiers).unwrap();
    let method = model.add_method(inner, "get").unwrap();
    Fixture {
        model,
        outer_t,
        inner,
        method,
    }
}

#[test]
fn instance_inner_type_sees_outer_variables() {
    let Fixture {
        mut model,
        outer_t,
        method,
        ..
    } = fixture(Modifiers::empty());

    let scope = TypeVarOwner::Operation(method);
    assert_eq!(model.lookup_type_var(scope, "T", true), Some(outer_t));
    assert_eq!(model.lookup_type_var(scope, "T", false), None);
}

#[test]
fn static_inner_type_does_not_see_outer_variables() {
    let Fixture {
        mut model, method, ..
    } = fixture(Modifiers::STATIC);

    let scope = TypeVarOwner::Operation(method);
    assert_eq!(model.lookup_type_var(scope, "T", true), None);
}

#[test]
fn local_declarations_shadow_outer_ones() {
    let Fixture {
        mut model,
        outer_t,
        inner,
        method,
    } = fixture(Modifiers::empty());

    let local = model
        .add_type_var(TypeVarOwner::Operation(method), "T")
        .unwrap();
    assert_ne!(local, outer_t);
    assert_eq!(
        model.lookup_type_var(TypeVarOwner::Operation(method), "T", true),
        Some(local)
    );
    // The inner type itself still sees the outer declaration.
    assert_eq!(
        model.lookup_type_var(TypeVarOwner::Type(inner), "T", true),
        Some(outer_t)
    );
}

#[test]
fn static_method_does_not_see_its_type_variables() {
    let Fixture {
        mut model, inner, ..
    } = fixture(Modifiers::empty());
    let own = model.add_type_var(TypeVarOwner::Type(inner), "E").unwrap();
    let factory = model.add_method(inner, "create").unwrap();
    model
        .set_operation_modifiers(factory, Modifiers::STATIC)
        .unwrap();

    let scope = TypeVarOwner::Operation(factory);
    assert_eq!(model.lookup_type_var(scope, "E", true), None);
    assert_eq!(
        model.lookup_type_var(TypeVarOwner::Type(inner), "E", true),
        Some(own)
    );
}

#[test]
fn reparented_container_changes_scope() {
    let Fixture {
        mut model,
        inner,
        method,
        ..
    } = fixture(Modifiers::STATIC);
    let u = model
        .add_type_var(TypeVarOwner::Operation(method), "U")
        .unwrap();
    let container = model
        .type_var_container(TypeVarOwner::Operation(method))
        .unwrap();

    model
        .reparent_type_vars(container, TypeVarOwner::Type(inner))
        .unwrap();

    assert_eq!(model.type_var_owner(container), TypeVarOwner::Type(inner));
    assert_eq!(model.type_variables(TypeVarOwner::Type(inner)), vec![u]);
    assert!(model
        .type_variables(TypeVarOwner::Operation(method))
        .is_empty());
}
