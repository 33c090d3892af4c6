use jmodel_types::{CodeModel, ModelError, TypeCategory, TypeId};

use pretty_assertions::assert_eq;

fn interface(model: &mut CodeModel, name: &str) -> TypeId {
    model
        .declare_type(name, TypeCategory::Interface, None)
        .unwrap()
}

#[test]
fn diamond_yields_shared_ancestor_once_after_both_sides() {
    let mut model = CodeModel::default();
    let a = interface(&mut model, "demo.A");
    let b = interface(&mut model, "demo.B");
    let c = interface(&mut model, "demo.C");
    let d = interface(&mut model, "demo.D");
    model.add_super_type(b, a).unwrap();
    model.add_super_type(c, a).unwrap();
    model.add_super_type(d, b).unwrap();
    model.add_super_type(d, c).unwrap();

    let all: Vec<TypeId> = model.all_super_types(d).collect();
    assert_eq!(all, vec![b, c, a]);
}

#[test]
fn direct_super_types_come_before_their_ancestors() {
    let mut model = CodeModel::default();
    let x = interface(&mut model, "demo.X");
    let y = interface(&mut model, "demo.Y");
    let b = interface(&mut model, "demo.B");
    let c = interface(&mut model, "demo.C");
    let d = interface(&mut model, "demo.D");
    model.add_super_type(b, x).unwrap();
    model.add_super_type(c, y).unwrap();
    model.add_super_type(d, b).unwrap();
    model.add_super_type(d, c).unwrap();

    let all: Vec<TypeId> = model.all_super_types(d).collect();
    assert_eq!(all, vec![b, c, x, y]);
}

#[test]
fn class_closure_ends_at_the_root_type() {
    let mut model = CodeModel::default();
    let named = interface(&mut model, "demo.Named");
    let base = model
        .declare_type("demo.Base", TypeCategory::Class, None)
        .unwrap();
    let leaf = model
        .declare_type("demo.Leaf", TypeCategory::Class, None)
        .unwrap();
    model.add_super_type(leaf, base).unwrap();
    model.add_super_type(leaf, named).unwrap();
    let root = model.root_type();

    let all: Vec<TypeId> = model.all_super_types(leaf).collect();
    assert_eq!(all, vec![base, named, root]);
    assert_eq!(model.superclass(leaf), Some(base));
    assert_eq!(model.interfaces(leaf), vec![named]);
    assert_eq!(model.superclass(base), Some(root));
}

#[test]
fn cycles_terminate() {
    let mut model = CodeModel::default();
    let a = interface(&mut model, "demo.A");
    let b = interface(&mut model, "demo.B");
    model.add_super_type(a, b).unwrap();
    model.add_super_type(b, a).unwrap();

    let all: Vec<TypeId> = model.all_super_types(a).collect();
    assert_eq!(all, vec![b]);
}

#[test]
fn a_type_cannot_extend_itself_but_a_proxy_of_it_can() {
    let mut model = CodeModel::default();
    let ty = model
        .declare_type("demo.Selfish", TypeCategory::Class, None)
        .unwrap();

    let err = model.add_super_type(ty, ty).unwrap_err();
    assert_eq!(
        err,
        ModelError::SelfSupertype {
            ty: "demo.Selfish".to_string()
        }
    );

    let proxy = model.create_proxy(ty, false);
    model.add_super_type(ty, proxy).unwrap();
    assert_eq!(model.declared_super_types(ty), vec![proxy]);
    // The walk never yields the start type.
    assert_eq!(model.all_super_types(ty).count(), 0);
}

#[test]
fn parameterized_super_types_count_once_per_raw_type() {
    let mut model = CodeModel::default();
    let list = interface(&mut model, "demo.List");
    let string = model
        .declare_type("demo.Text", TypeCategory::Class, None)
        .unwrap();
    let sub = interface(&mut model, "demo.Texts");
    let list_of_text = model.create_parameterized(list, vec![string]);
    model.add_super_type(sub, list_of_text).unwrap();
    model.add_super_type(sub, list).unwrap();

    let all: Vec<TypeId> = model.all_super_types(sub).collect();
    assert_eq!(all, vec![list_of_text]);
}

#[test]
fn removing_and_clearing_super_types() {
    let mut model = CodeModel::default();
    let a = interface(&mut model, "demo.A");
    let b = interface(&mut model, "demo.B");
    let sub = interface(&mut model, "demo.Sub");
    model.add_super_type(sub, a).unwrap();
    model.add_super_type(sub, b).unwrap();

    assert!(model.remove_super_type(sub, a).unwrap());
    assert!(!model.remove_super_type(sub, a).unwrap());
    assert_eq!(model.declared_super_types(sub), vec![b]);

    model.clear_super_types(sub).unwrap();
    assert!(model.declared_super_types(sub).is_empty());
}
