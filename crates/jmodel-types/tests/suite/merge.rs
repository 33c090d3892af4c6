use jmodel_types::{
    CodeModel, MergeStrategy, ModelError, Modifiers, TypeCategory, TypeId, TypeKind, TypeMapper,
    TypeVarOwner,
};

use pretty_assertions::assert_eq;

fn declare(model: &mut CodeModel, name: &str, category: TypeCategory) -> TypeId {
    model.declare_type(name, category, None).unwrap()
}

#[test]
fn override_replaces_declared_super_types() {
    let mut model = CodeModel::default();
    let base = declare(&mut model, "demo.Base", TypeCategory::Class);
    let old = declare(&mut model, "demo.Old", TypeCategory::Interface);
    let first = declare(&mut model, "demo.First", TypeCategory::Interface);
    let second = declare(&mut model, "demo.Second", TypeCategory::Interface);

    let left = declare(&mut model, "demo.Left", TypeCategory::Class);
    model.add_super_type(left, base).unwrap();
    model.add_super_type(left, old).unwrap();
    let right = declare(&mut model, "demo.Right", TypeCategory::Class);
    model.add_super_type(right, first).unwrap();
    model.add_super_type(right, second).unwrap();

    model
        .merge_super_types(left, right, MergeStrategy::Override, &mut TypeMapper::new())
        .unwrap();

    assert_eq!(model.declared_super_types(left), vec![first, second]);
    assert_eq!(
        model.declared_super_types(left),
        model.declared_super_types(right)
    );
}

#[test]
fn override_keeps_source_super_type_references() {
    let mut model = CodeModel::default();
    let unit = model.create_unit(Some("demo"));
    for name in ["demo.Other", "demo.Named", "demo.Sized"] {
        model
            .declare_type(name, TypeCategory::Interface, Some(unit))
            .unwrap();
    }
    let left = model
        .declare_type("demo.Left", TypeCategory::Class, Some(unit))
        .unwrap();
    let right = model
        .declare_type("demo.Right", TypeCategory::Class, Some(unit))
        .unwrap();
    let other = model.create_source_ref("Other", Some(TypeVarOwner::Type(left)), Some(unit));
    model.add_super_type(left, other).unwrap();
    let named = model.create_source_ref("Named", Some(TypeVarOwner::Type(right)), Some(unit));
    let sized = model.create_source_ref("Sized", Some(TypeVarOwner::Type(right)), Some(unit));
    model.add_super_type(right, named).unwrap();
    model.add_super_type(right, sized).unwrap();

    model
        .merge_type(left, right, MergeStrategy::Override)
        .unwrap();

    assert_eq!(model.declared_super_types(left), vec![named, sized]);
    assert_eq!(
        model.declared_super_types(left),
        model.declared_super_types(right)
    );
}

#[test]
fn override_with_an_empty_right_side_clears_the_left() {
    let mut model = CodeModel::default();
    let old = declare(&mut model, "demo.Old", TypeCategory::Interface);
    let left = declare(&mut model, "demo.Left", TypeCategory::Class);
    model.add_super_type(left, old).unwrap();
    let right = declare(&mut model, "demo.Right", TypeCategory::Class);

    model
        .merge_type(left, right, MergeStrategy::Override)
        .unwrap();
    assert!(model.declared_super_types(left).is_empty());
}

#[test]
fn keep_changes_nothing() {
    let mut model = CodeModel::default();
    let left = declare(&mut model, "demo.Left", TypeCategory::Class);
    let right = declare(&mut model, "demo.Right", TypeCategory::Class);
    let int = model.get_type("int").unwrap();
    model.add_field(right, "extra", int).unwrap();

    model.merge_type(left, right, MergeStrategy::Keep).unwrap();
    assert!(model.fields(left).is_empty());
}

#[test]
fn merge_adds_absent_members_and_keeps_matches() {
    let mut model = CodeModel::default();
    let int = model.get_type("int").unwrap();
    let long = model.get_type("long").unwrap();

    let left = declare(&mut model, "demo.Left", TypeCategory::Class);
    let shared = model.add_field(left, "shared", int).unwrap();
    let keep = model.add_method(left, "run").unwrap();

    let right = declare(&mut model, "demo.Right", TypeCategory::Class);
    model.add_field(right, "shared", long).unwrap();
    model.add_field(right, "added", long).unwrap();
    model.add_method(right, "run").unwrap();
    let overload = model.add_method(right, "run").unwrap();
    model.add_parameter(overload, "times", int, false).unwrap();
    let ctor = model.add_constructor(right).unwrap();
    model
        .set_operation_modifiers(ctor, Modifiers::PUBLIC)
        .unwrap();

    model.merge_type(left, right, MergeStrategy::Merge).unwrap();

    let fields = model.fields(left);
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0], shared);
    assert_eq!(model.field(shared).ty(), int);
    let added = model.field_by_name(left, "added").unwrap();
    assert_eq!(model.field(added).ty(), long);
    assert_eq!(model.field(added).declaring_type(), left);

    let methods = model.methods(left);
    assert_eq!(methods.len(), 2);
    assert_eq!(methods[0], keep);
    assert_eq!(model.operation_signature(methods[1]), "run(int)");

    let ctors = model.constructors(left);
    assert_eq!(ctors.len(), 1);
    assert_eq!(model.operation(ctors[0]).name(), "Left");
    assert_eq!(model.operation(ctors[0]).modifiers(), Modifiers::PUBLIC);
}

#[test]
fn merge_redirects_self_references_to_the_left_type() {
    let mut model = CodeModel::default();
    let left = declare(&mut model, "demo.Node", TypeCategory::Class);
    let right = declare(&mut model, "demo.NodeTemplate", TypeCategory::Class);
    let next_type = model.create_array(right);
    model.add_field(right, "next", next_type).unwrap();

    model.merge_type(left, right, MergeStrategy::Merge).unwrap();

    let next = model.field_by_name(left, "next").unwrap();
    let ty = model.field(next).ty();
    assert_eq!(model.component_type(ty), Some(left));
}

#[test]
fn type_variables_merge_by_position() {
    let mut model = CodeModel::default();
    let number = declare(&mut model, "demo.Number", TypeCategory::Class);

    let left = declare(&mut model, "demo.Left", TypeCategory::Class);
    let t = model.add_type_var(TypeVarOwner::Type(left), "T").unwrap();
    let right = declare(&mut model, "demo.Right", TypeCategory::Class);
    let u = model.add_type_var(TypeVarOwner::Type(right), "U").unwrap();
    model.set_type_var_bound(u, Some(number)).unwrap();
    let field_type = model.create_array(u);
    model.add_field(right, "items", field_type).unwrap();

    model.merge_type(left, right, MergeStrategy::Merge).unwrap();

    assert_eq!(model.type_variables(TypeVarOwner::Type(left)), vec![t]);
    assert_eq!(model.bound(t), Some(number));
    let items = model.field_by_name(left, "items").unwrap();
    let ty = model.field(items).ty();
    assert_eq!(model.component_type(ty), Some(t));
}

#[test]
fn type_variable_arity_mismatch_is_an_error() {
    let mut model = CodeModel::default();
    let left = declare(&mut model, "demo.Left", TypeCategory::Class);
    model.add_type_var(TypeVarOwner::Type(left), "A").unwrap();
    let right = declare(&mut model, "demo.Right", TypeCategory::Class);
    model.add_type_var(TypeVarOwner::Type(right), "X").unwrap();
    model.add_type_var(TypeVarOwner::Type(right), "Y").unwrap();

    let err = model
        .merge_type(left, right, MergeStrategy::Merge)
        .unwrap_err();
    assert_eq!(
        err,
        ModelError::ArityMismatch {
            what: "type variables",
            left: 1,
            right: 2,
        }
    );
}

#[test]
fn raw_super_type_is_upgraded_by_a_parameterized_match() {
    let mut model = CodeModel::default();
    let list = declare(&mut model, "demo.List", TypeCategory::Interface);
    model.add_type_var(TypeVarOwner::Type(list), "E").unwrap();
    let text = declare(&mut model, "demo.Text", TypeCategory::Class);

    let left = declare(&mut model, "demo.Left", TypeCategory::Class);
    model.add_super_type(left, list).unwrap();
    let right = declare(&mut model, "demo.Right", TypeCategory::Class);
    let list_of_text = model.create_parameterized(list, vec![text]);
    model.add_super_type(right, list_of_text).unwrap();

    model.merge_type(left, right, MergeStrategy::Merge).unwrap();

    let supers = model.declared_super_types(left);
    assert_eq!(supers.len(), 1);
    assert!(matches!(model.kind(supers[0]), TypeKind::Parameterized(_)));
    assert_eq!(model.reference_string(supers[0]), "List<Text>");
}

#[test]
fn nested_types_merge_recursively_or_are_copied() {
    let mut model = CodeModel::default();
    let int = model.get_type("int").unwrap();

    let left = declare(&mut model, "demo.Left", TypeCategory::Class);
    let left_inner = model
        .declare_nested_type(left, "Inner", TypeCategory::Class)
        .unwrap();
    let right = declare(&mut model, "demo.Right", TypeCategory::Class);
    let right_inner = model
        .declare_nested_type(right, "Inner", TypeCategory::Class)
        .unwrap();
    model.add_field(right_inner, "depth", int).unwrap();
    model
        .declare_nested_type(right, "Extra", TypeCategory::Interface)
        .unwrap();

    model.merge_type(left, right, MergeStrategy::Merge).unwrap();

    assert_eq!(model.nested_type(left, "Inner"), Some(left_inner));
    assert!(model.field_by_name(left_inner, "depth").is_some());
    let extra = model.nested_type(left, "Extra").unwrap();
    assert_eq!(model.category(extra), TypeCategory::Interface);
    assert_eq!(model.declaring_type(extra), Some(left));
}

#[test]
fn merging_into_a_frozen_type_fails() {
    let mut model = CodeModel::default();
    let left = declare(&mut model, "demo.Left", TypeCategory::Class);
    let right = declare(&mut model, "demo.Right", TypeCategory::Class);
    model.set_immutable(left.into());

    assert!(matches!(
        model.merge_type(left, right, MergeStrategy::Merge),
        Err(ModelError::ReadOnly { .. })
    ));
}
