use insta::assert_snapshot;
use jmodel_types::{CodeModel, Modifiers, TypeCategory, TypeVarOwner};
use pretty_assertions::assert_eq;

#[test]
fn writes_a_generic_interface() {
    let mut model = CodeModel::default();
    let number = model
        .declare_type("java.lang.Number", TypeCategory::Class, None)
        .unwrap();
    let string = model
        .declare_type("java.lang.String", TypeCategory::Class, None)
        .unwrap();
    let closeable = model
        .declare_type("java.io.Closeable", TypeCategory::Interface, None)
        .unwrap();
    let io_exception = model
        .declare_type("java.io.IOException", TypeCategory::Class, None)
        .unwrap();
    let int = model.get_type("int").unwrap();

    let repo = model
        .declare_type("demo.Repo", TypeCategory::Interface, None)
        .unwrap();
    model.set_modifiers(repo, Modifiers::PUBLIC).unwrap();
    let t = model.add_type_var(TypeVarOwner::Type(repo), "T").unwrap();
    model.set_type_var_bound(t, Some(number)).unwrap();
    model.add_super_type(repo, closeable).unwrap();

    let limit = model.add_field(repo, "LIMIT", int).unwrap();
    model
        .set_field_modifiers(limit, Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL)
        .unwrap();
    model
        .set_field_initializer(limit, Some("10".to_string()))
        .unwrap();

    let map = model.add_method(repo, "map").unwrap();
    let r = model
        .add_type_var(TypeVarOwner::Operation(map), "R")
        .unwrap();
    model.set_return_type(map, Some(r)).unwrap();
    model.add_parameter(map, "item", t, false).unwrap();
    let names = model.create_array(string);
    model.add_parameter(map, "names", names, true).unwrap();
    model.add_thrown_type(map, io_exception).unwrap();
    model.add_method(repo, "close").unwrap();

    model
        .declare_nested_type(repo, "Mode", TypeCategory::Enum)
        .unwrap();

    assert_snapshot!(
        model.declaration_string(repo),
        @r###"
public interface Repo<T extends Number> extends Closeable {
    public static final int LIMIT = 10;

    <R> R map(T item, String... names) throws IOException;
    void close();

    enum Mode {
    }
}
"###
    );
}

#[test]
fn class_header_splits_extends_and_implements() {
    let mut model = CodeModel::default();
    let base = model
        .declare_type("demo.Base", TypeCategory::Class, None)
        .unwrap();
    let repo = model
        .declare_type("demo.Repo", TypeCategory::Interface, None)
        .unwrap();
    model.add_type_var(TypeVarOwner::Type(repo), "T").unwrap();
    let integer = model
        .declare_type("java.lang.Integer", TypeCategory::Class, None)
        .unwrap();

    let imp = model
        .declare_type("demo.Impl", TypeCategory::Class, None)
        .unwrap();
    model.set_modifiers(imp, Modifiers::FINAL).unwrap();
    model.add_super_type(imp, base).unwrap();
    let repo_of_integer = model.create_parameterized(repo, vec![integer]);
    model.add_super_type(imp, repo_of_integer).unwrap();

    assert_eq!(
        model.declaration_string(imp),
        "final class Impl extends Base implements Repo<Integer> {\n}\n"
    );
    // The implicit root superclass is not printed.
    assert_eq!(model.declaration_string(base), "class Base {\n}\n");
}

#[test]
fn nested_type_references_use_the_enclosing_path() {
    let mut model = CodeModel::default();
    let outer = model
        .declare_type("demo.Outer", TypeCategory::Class, None)
        .unwrap();
    let inner = model
        .declare_nested_type(outer, "Inner", TypeCategory::Class)
        .unwrap();

    assert_eq!(model.reference_string(inner), "Outer.Inner");
    assert_eq!(model.qualified_reference_string(inner), "demo.Outer.Inner");
}

#[test]
fn declaration_form_prints_type_variable_bounds() {
    let mut model = CodeModel::default();
    let comparable = model
        .declare_type("demo.Comparable", TypeCategory::Interface, None)
        .unwrap();
    model
        .add_type_var(TypeVarOwner::Type(comparable), "X")
        .unwrap();
    let sorted = model
        .declare_type("demo.Sorted", TypeCategory::Class, None)
        .unwrap();
    let t = model.add_type_var(TypeVarOwner::Type(sorted), "T").unwrap();
    let bound = model.create_parameterized(comparable, vec![t]);
    model.set_type_var_bound(t, Some(bound)).unwrap();

    let mut out = String::new();
    model.write_reference(sorted, &mut out, true, false).unwrap();
    assert_eq!(out, "Sorted<T extends Comparable<T>>");
    assert_eq!(model.reference_string(sorted), "Sorted");
}
