use jmodel_types::{CodeModel, TypeCategory, TypeKind, TypeVarOwner};

use pretty_assertions::assert_eq;

#[test]
fn concrete_types_resolve_to_themselves() {
    let mut model = CodeModel::default();
    let list = model
        .declare_type("demo.List", TypeCategory::Interface, None)
        .unwrap();
    let e = model.add_type_var(TypeVarOwner::Type(list), "E").unwrap();
    let string = model
        .declare_type("java.lang.String", TypeCategory::Class, None)
        .unwrap();
    let list_of_string = model.create_parameterized(list, vec![string]);
    let array = model.create_array(list_of_string);
    let context = model.create_parameterized(list, vec![string]);

    assert_eq!(model.resolve(list, None), list);
    assert_eq!(model.resolve(list_of_string, None), list_of_string);
    assert_eq!(model.resolve(array, None), array);
    assert_eq!(model.resolve(array, Some(context)), array);

    // Placeholders do change, so a wrapper around one is rebuilt.
    let list_of_e = model.create_parameterized(list, vec![e]);
    assert_ne!(model.resolve(list_of_e, None), list_of_e);
}

#[test]
fn source_references_to_concrete_types_resolve_to_themselves() {
    let mut model = CodeModel::default();
    let unit = model.create_unit(Some("demo"));
    let holder = model
        .declare_type("demo.Holder", TypeCategory::Class, Some(unit))
        .unwrap();
    model
        .declare_type("demo.Bag", TypeCategory::Class, Some(unit))
        .unwrap();
    model
        .declare_type("demo.Item", TypeCategory::Class, Some(unit))
        .unwrap();
    let scope = Some(TypeVarOwner::Type(holder));

    let item = model.create_source_ref("Item", scope, Some(unit));
    let bag_of_items = model.create_source_ref("Bag", scope, Some(unit));
    model.source_add_type_argument(bag_of_items, item).unwrap();
    let items = model.create_source_ref("Item", scope, Some(unit));
    model.source_inc_array_count(items).unwrap();

    for ty in [item, bag_of_items, items] {
        let once = model.resolve(ty, None);
        let count = model.type_count();
        assert_eq!(once, ty);
        assert_eq!(model.resolve(once, None), once);
        assert_eq!(model.type_count(), count);
    }

    // A reference to a type variable is not concrete.
    model.add_type_var(TypeVarOwner::Type(holder), "T").unwrap();
    let t = model.create_source_ref("T", scope, Some(unit));
    assert_eq!(model.resolve(t, None), model.root_type());
}

#[test]
fn array_of_a_type_is_cached() {
    let mut model = CodeModel::default();
    let ty = model
        .declare_type("demo.Item", TypeCategory::Class, None)
        .unwrap();

    let first = model.create_array(ty);
    let second = model.create_array(ty);
    assert_eq!(first, second);
    assert_eq!(model.component_type(first), Some(ty));

    let nested = model.create_array(first);
    assert_eq!(model.component_type(nested), Some(first));
    assert_eq!(model.reference_string(nested), "Item[][]");
}

#[test]
fn type_variable_resolves_one_level_to_its_bound() {
    let mut model = CodeModel::default();
    let number = model
        .declare_type("demo.Number", TypeCategory::Class, None)
        .unwrap();
    let boxed = model
        .declare_type("demo.Box", TypeCategory::Class, None)
        .unwrap();
    let t = model.add_type_var(TypeVarOwner::Type(boxed), "T").unwrap();
    let u = model.add_type_var(TypeVarOwner::Type(boxed), "U").unwrap();
    model.set_type_var_bound(t, Some(number)).unwrap();
    model.set_type_var_bound(u, Some(t)).unwrap();

    assert_eq!(model.resolve(t, None), number);
    // One level only: U resolves to T, not to T's bound.
    assert_eq!(model.resolve(u, None), t);
    assert_eq!(model.as_type(u), number);
}

#[test]
fn type_variable_resolves_against_a_parameterized_context() {
    let mut model = CodeModel::default();
    let list = model
        .declare_type("demo.List", TypeCategory::Interface, None)
        .unwrap();
    let e = model.add_type_var(TypeVarOwner::Type(list), "E").unwrap();
    let string = model
        .declare_type("java.lang.String", TypeCategory::Class, None)
        .unwrap();

    // Directly parameterized context.
    let list_of_string = model.create_parameterized(list, vec![string]);
    assert_eq!(model.resolve(e, Some(list_of_string)), string);

    // A subtype that fixes the argument in its super-type declaration.
    let names = model
        .declare_type("demo.Names", TypeCategory::Class, None)
        .unwrap();
    let super_ref = model.create_parameterized(list, vec![string]);
    model.add_super_type(names, super_ref).unwrap();
    assert_eq!(model.resolve(e, Some(names)), string);

    // Unrelated context: fall back to the bound.
    let other = model
        .declare_type("demo.Other", TypeCategory::Class, None)
        .unwrap();
    assert_eq!(model.resolve(e, Some(other)), model.root_type());
}

#[test]
fn resolving_a_parameterized_type_substitutes_its_arguments() {
    let mut model = CodeModel::default();
    let list = model
        .declare_type("demo.List", TypeCategory::Interface, None)
        .unwrap();
    let e = model.add_type_var(TypeVarOwner::Type(list), "E").unwrap();
    let holder = model
        .declare_type("demo.Holder", TypeCategory::Class, None)
        .unwrap();
    let t = model.add_type_var(TypeVarOwner::Type(holder), "T").unwrap();
    let string = model
        .declare_type("java.lang.String", TypeCategory::Class, None)
        .unwrap();

    let list_of_t = model.create_parameterized(list, vec![t]);
    let context = model.create_parameterized(holder, vec![string]);
    let resolved = model.resolve(list_of_t, Some(context));

    match model.kind(resolved) {
        TypeKind::Parameterized(p) => {
            assert_eq!(p.base(), list);
            assert_eq!(p.args(), &[string]);
        }
        other => panic!("expected a parameterized type, got {}", other.label()),
    }
    assert_eq!(model.type_variables(TypeVarOwner::Type(list)), vec![e]);
}

#[test]
fn assignability_follows_the_super_type_closure() {
    let mut model = CodeModel::default();
    let named = model
        .declare_type("demo.Named", TypeCategory::Interface, None)
        .unwrap();
    let person = model
        .declare_type("demo.Person", TypeCategory::Class, None)
        .unwrap();
    let employee = model
        .declare_type("demo.Employee", TypeCategory::Class, None)
        .unwrap();
    model.add_super_type(person, named).unwrap();
    model.add_super_type(employee, person).unwrap();
    let root = model.root_type();
    let int = model.get_type("int").unwrap();

    assert!(model.is_assignable_from(named, employee));
    assert!(model.is_assignable_from(person, employee));
    assert!(!model.is_assignable_from(employee, person));
    assert!(model.is_assignable_from(root, named));
    assert!(!model.is_assignable_from(root, int));
}
