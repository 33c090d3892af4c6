use jmodel_types::{
    Annotation, CodeModel, ResolutionOptions, TypeCategory, TypeId, TypeKind, TypeVarOwner,
};

use pretty_assertions::assert_eq;

#[test]
fn delegate_is_computed_once() {
    let mut model = CodeModel::default();
    let unit = model.create_unit(Some("demo"));
    let holder = model
        .declare_type("demo.Holder", TypeCategory::Class, Some(unit))
        .unwrap();
    let r = model.create_source_ref("Holder", None, Some(unit));

    let first = model.delegate(r).unwrap();
    assert_eq!(first, holder);

    // Pending mutators after the first dereference do not change the outcome.
    let item = model
        .declare_type("demo.Item", TypeCategory::Class, Some(unit))
        .unwrap();
    model.source_add_type_argument(r, item).unwrap();
    model.source_inc_array_count(r).unwrap();

    assert_eq!(model.delegate(r), Some(first));
    assert!(model.source_ref(r).unwrap().is_resolved());
}

#[test]
fn forward_reference_sees_a_later_declaration() {
    let mut model = CodeModel::default();
    let unit = model.create_unit(Some("demo"));
    let early = model
        .declare_type("demo.Early", TypeCategory::Class, Some(unit))
        .unwrap();
    let r = model.create_source_ref("Late", Some(TypeVarOwner::Type(early)), Some(unit));
    let late = model
        .declare_type("demo.Late", TypeCategory::Interface, Some(unit))
        .unwrap();

    assert_eq!(model.delegate(r), Some(late));
    assert_eq!(model.category(r), TypeCategory::Interface);
}

#[test]
fn placeholder_is_upgraded_by_a_later_declaration() {
    let mut model = CodeModel::default();
    let unit = model.create_unit(Some("demo"));
    let r = model.create_source_ref("Later", None, Some(unit));
    let placeholder = model.delegate(r).unwrap();
    assert!(!model.raw(placeholder).unwrap().is_declared());

    let declared = model
        .declare_type("demo.Later", TypeCategory::Class, Some(unit))
        .unwrap();
    assert_eq!(declared, placeholder);
    assert!(model.raw(declared).unwrap().is_declared());
}

#[test]
fn type_variable_names_win_over_type_names() {
    let mut model = CodeModel::default();
    let unit = model.create_unit(Some("demo"));
    model
        .declare_type("demo.T", TypeCategory::Class, Some(unit))
        .unwrap();
    let boxed = model
        .declare_type("demo.Box", TypeCategory::Class, Some(unit))
        .unwrap();
    let t = model.add_type_var(TypeVarOwner::Type(boxed), "T").unwrap();

    let r = model.create_source_ref("T", Some(TypeVarOwner::Type(boxed)), Some(unit));
    assert_eq!(model.delegate(r), Some(t));
}

#[test]
fn qualified_source_name_prints_qualified() {
    let mut model = CodeModel::default();
    let unit = model.create_unit(Some("app"));
    let target = model
        .declare_type("lib.Widget", TypeCategory::Class, None)
        .unwrap();
    let r = model.create_source_ref("lib.Widget", None, Some(unit));

    let resolved = model.delegate(r).unwrap();
    assert!(matches!(model.kind(resolved), TypeKind::Proxy(_)));
    assert_eq!(model.unwrap_proxies(resolved), target);
    assert_eq!(model.reference_string(r), "lib.Widget");
}

#[test]
fn full_pending_state_is_applied_in_order() {
    let mut model = CodeModel::default();
    let unit = model.create_unit(Some("demo"));
    let map = model
        .declare_type("demo.Map", TypeCategory::Interface, Some(unit))
        .unwrap();
    model.add_type_var(TypeVarOwner::Type(map), "K").unwrap();
    model.add_type_var(TypeVarOwner::Type(map), "V").unwrap();
    model
        .declare_type("demo.Key", TypeCategory::Class, Some(unit))
        .unwrap();

    let key = model.create_source_ref("Key", None, Some(unit));
    let value = model.create_source_ref("?", None, Some(unit));
    let value_bound = model.create_source_ref("Key", None, Some(unit));
    model.source_set_extends_bound(value, value_bound).unwrap();

    let r = model.create_source_ref("Map", None, Some(unit));
    model.source_add_type_argument(r, key).unwrap();
    model.source_add_type_argument(r, value).unwrap();
    model.source_inc_array_count(r).unwrap();
    model
        .source_add_annotation(r, Annotation::new("Deprecated"))
        .unwrap();

    assert_eq!(model.reference_string(r), "@Deprecated Map<Key, ? extends Key>[]");
    let resolved = model.delegate(r).unwrap();
    let component = model.component_type(resolved).unwrap();
    assert_eq!(model.as_type(component), map);
}

#[test]
fn composed_reference_becomes_an_intersection() {
    let mut model = CodeModel::default();
    let unit = model.create_unit(Some("demo"));
    let a = model
        .declare_type("demo.A", TypeCategory::Interface, Some(unit))
        .unwrap();
    let b = model
        .declare_type("demo.B", TypeCategory::Interface, Some(unit))
        .unwrap();
    let r = model.create_source_ref("A", None, Some(unit));
    let second = model.create_source_ref("B", None, Some(unit));
    model.source_add_composed_type(r, second).unwrap();

    let resolved = model.delegate(r).unwrap();
    match model.kind(resolved) {
        TypeKind::Composed(c) => assert_eq!(c.parts().len(), 2),
        other => panic!("expected a composed type, got {}", other.label()),
    }
    assert_eq!(model.as_type(resolved), a);
    assert_eq!(model.reference_string(resolved), "A & B");
    assert_ne!(a, b);
}

#[test]
fn unknown_names_follow_the_creation_option() {
    let mut creating = CodeModel::default();
    let r = creating.create_source_ref("Missing", None, None);
    let created = creating.delegate(r).unwrap();
    assert_eq!(creating.qualified_name(created), "Missing");

    let options = ResolutionOptions {
        allow_create_missing: false,
        ..ResolutionOptions::default()
    };
    let mut strict = CodeModel::new(options, None);
    let r = strict.create_source_ref("Missing", None, None);
    assert_eq!(strict.delegate(r), None);
    assert_eq!(strict.resolve_pending_sources(), Vec::<TypeId>::new());
    let dangling = strict.create_source_ref("AlsoMissing", None, None);
    assert_eq!(strict.resolve_pending_sources(), vec![dangling]);
}
