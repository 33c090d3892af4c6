//! The mutability kernel shared by every node: lazy one-shot initialization followed by an
//! optional, irreversible freeze.

use std::rc::Rc;

use crate::generic::TypeKind;
use crate::model::CodeModel;
use crate::source_ref::SourceState;
use crate::{ModelError, NodeKey, Result, TypeId};

/// Callback run once, the first time a node is read or written.
pub type LazyInit = Rc<dyn Fn(&mut CodeModel, NodeKey) -> Result<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitState {
    #[default]
    NotStarted,
    Running,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mutability {
    #[default]
    Mutable,
    Immutable,
    /// Internal singletons: read-only to every caller from birth.
    System,
}

#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    pub(crate) init: InitState,
    pub(crate) mutability: Mutability,
    /// Set while the node's children are being frozen.
    pub(crate) freezing: bool,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn system() -> Self {
        Self {
            mutability: Mutability::System,
            ..Self::default()
        }
    }

    pub fn init_state(&self) -> InitState {
        self.init
    }

    pub fn mutability(&self) -> Mutability {
        self.mutability
    }

    pub fn is_immutable(&self) -> bool {
        self.mutability != Mutability::Mutable
    }
}

impl CodeModel {
    pub fn lifecycle(&self, key: NodeKey) -> &Lifecycle {
        match key {
            NodeKey::Type(id) => &self.types[id.idx()].lifecycle,
            NodeKey::TypeVars(id) => &self.type_vars[id.idx()].lifecycle,
            NodeKey::Field(id) => &self.fields[id.idx()].lifecycle,
            NodeKey::Operation(id) => &self.operations[id.idx()].lifecycle,
        }
    }

    fn lifecycle_mut(&mut self, key: NodeKey) -> &mut Lifecycle {
        match key {
            NodeKey::Type(id) => &mut self.types[id.idx()].lifecycle,
            NodeKey::TypeVars(id) => &mut self.type_vars[id.idx()].lifecycle,
            NodeKey::Field(id) => &mut self.fields[id.idx()].lifecycle,
            NodeKey::Operation(id) => &mut self.operations[id.idx()].lifecycle,
        }
    }

    pub fn is_immutable(&self, key: NodeKey) -> bool {
        self.lifecycle(key).is_immutable()
    }

    /// Install the lazy-fill hook for `key`.
    ///
    /// # Panics
    ///
    /// If initialization of `key` already started, or a different hook is installed.
    pub fn set_lazy_init(&mut self, key: NodeKey, hook: LazyInit) {
        if self.lifecycle(key).init != InitState::NotStarted {
            panic!(
                "lazy init installed on {} after initialization started",
                self.describe(key)
            );
        }
        if let Some(existing) = self.lazy_hooks.get(&key) {
            if !Rc::ptr_eq(existing, &hook) {
                panic!("conflicting lazy init hooks for {}", self.describe(key));
            }
            return;
        }
        self.lazy_hooks.insert(key, hook);
    }

    /// Run the lazy fill of `key` if it has not run yet.
    ///
    /// Calling this while the fill of the same node is in progress is an error.
    pub fn initialize(&mut self, key: NodeKey) -> Result<()> {
        match self.lifecycle(key).init {
            InitState::Done => Ok(()),
            InitState::Running => Err(ModelError::ReentrantInitialization {
                node: self.describe(key),
            }),
            InitState::NotStarted => {
                self.lifecycle_mut(key).init = InitState::Running;
                let result = self.do_initialize(key);
                self.lifecycle_mut(key).init = InitState::Done;
                result
            }
        }
    }

    /// Read-path initialization: a node whose fill is already running is read as-is, and fill
    /// failures are logged rather than surfaced.
    pub(crate) fn ensure_initialized(&mut self, key: NodeKey) {
        if self.lifecycle(key).init != InitState::NotStarted {
            return;
        }
        if let Err(err) = self.initialize(key) {
            tracing::warn!(
                target: "jmodel.types",
                node = %self.describe(key),
                error = %err,
                "lazy initialization failed"
            );
        }
    }

    fn do_initialize(&mut self, key: NodeKey) -> Result<()> {
        if let NodeKey::Type(id) = key {
            let origin = self.raw(id).and_then(|raw| raw.origin.clone());
            if let Some(mirror) = origin {
                self.fill_from_mirror(id, &mirror)?;
            }
        }
        if let Some(hook) = self.lazy_hooks.remove(&key) {
            hook(self, key)?;
        }
        Ok(())
    }

    /// Freeze `key` and every child it owns. Shared declarations reached through references
    /// (raw types, type variables, arrays) are left alone.
    pub fn set_immutable(&mut self, key: NodeKey) {
        self.ensure_initialized(key);
        let lifecycle = self.lifecycle(key);
        if lifecycle.mutability != Mutability::Mutable || lifecycle.freezing {
            return;
        }
        self.lifecycle_mut(key).freezing = true;
        for child in self.owned_children(key) {
            self.set_immutable(child);
        }
        let lifecycle = self.lifecycle_mut(key);
        lifecycle.freezing = false;
        lifecycle.mutability = Mutability::Immutable;
    }

    fn owned_children(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut children = Vec::new();
        match key {
            NodeKey::Type(id) => {
                let mut refs = Vec::new();
                match self.kind(id) {
                    TypeKind::Raw(raw) => {
                        children.extend(raw.type_vars.map(NodeKey::TypeVars));
                        children.extend(raw.fields.values().map(|f| NodeKey::Field(*f)));
                        children.extend(raw.methods.iter().map(|m| NodeKey::Operation(*m)));
                        children.extend(raw.constructors.iter().map(|c| NodeKey::Operation(*c)));
                        children.extend(raw.nested.values().map(|n| NodeKey::Type(*n)));
                        refs.extend(raw.super_types.iter().copied());
                    }
                    TypeKind::Array(_) => {}
                    TypeKind::Parameterized(p) => {
                        refs.push(p.base);
                        refs.extend(p.args.iter().copied());
                    }
                    TypeKind::Variable(var) => refs.extend(var.bound),
                    TypeKind::Wildcard(wildcard) => refs.extend(wildcard.bound),
                    TypeKind::Composed(c) => refs.extend(c.parts.iter().copied()),
                    TypeKind::Proxy(proxy) => refs.push(proxy.delegate),
                    TypeKind::Source(source) => match &source.state {
                        SourceState::Unresolved(pending) => {
                            refs.extend(pending.type_args.iter().flatten().copied());
                            refs.extend(pending.composed.iter().copied());
                            refs.extend(pending.extends_bound);
                            refs.extend(pending.super_bound);
                        }
                        SourceState::Resolved(delegate) => refs.push(*delegate),
                        SourceState::Resolving | SourceState::Unresolvable => {}
                    },
                }
                children.extend(self.owned_refs(refs));
            }
            NodeKey::TypeVars(id) => {
                children.extend(self.type_vars[id.idx()].vars.iter().map(|v| NodeKey::Type(*v)));
            }
            NodeKey::Field(id) => {
                let ty = self.fields[id.idx()].ty;
                children.extend(self.owned_refs([ty]));
            }
            NodeKey::Operation(id) => {
                let def = &self.operations[id.idx()];
                children.extend(def.type_vars.map(NodeKey::TypeVars));
                let refs: Vec<TypeId> = def
                    .params
                    .iter()
                    .map(|param| param.ty)
                    .chain(def.return_type)
                    .chain(def.throws.iter().copied())
                    .collect();
                children.extend(self.owned_refs(refs));
            }
        }
        children
    }

    fn owned_refs(&self, refs: impl IntoIterator<Item = TypeId>) -> Vec<NodeKey> {
        refs.into_iter()
            .filter(|ty| !self.is_shared(*ty))
            .map(NodeKey::Type)
            .collect()
    }

    /// Mutator guard: initializes the node, then rejects the write if it is frozen.
    pub(crate) fn guard(&mut self, key: NodeKey, attribute: &'static str) -> Result<()> {
        self.ensure_initialized(key);
        if self.lifecycle(key).is_immutable() {
            return Err(ModelError::ReadOnly {
                kind: self.kind_label(key),
                name: self.describe(key),
                attribute,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{TypeCategory, TypeVarOwner};

    #[test]
    fn lazy_hook_runs_once() {
        let mut model = CodeModel::default();
        let ty = model
            .declare_type("demo.Lazy", TypeCategory::Class, None)
            .unwrap();
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        model.set_lazy_init(
            ty.into(),
            Rc::new(move |model: &mut CodeModel, key| {
                counter.set(counter.get() + 1);
                let NodeKey::Type(ty) = key else { return Ok(()) };
                let int = model.get_type("int").unwrap();
                model.add_field(ty, "filled", int).map(|_| ())
            }),
        );

        assert_eq!(model.fields(ty).len(), 1);
        assert_eq!(model.fields(ty).len(), 1);
        assert_eq!(runs.get(), 1);
        assert_eq!(model.lifecycle(ty.into()).init_state(), InitState::Done);
    }

    #[test]
    fn reentrant_initialize_is_rejected() {
        let mut model = CodeModel::default();
        let ty = model
            .declare_type("demo.Loop", TypeCategory::Class, None)
            .unwrap();
        model.set_lazy_init(
            ty.into(),
            Rc::new(|model: &mut CodeModel, key| model.initialize(key)),
        );

        let err = model.initialize(ty.into()).unwrap_err();
        assert!(matches!(err, ModelError::ReentrantInitialization { .. }));
    }

    #[test]
    #[should_panic(expected = "conflicting lazy init hooks")]
    fn second_hook_panics() {
        let mut model = CodeModel::default();
        let ty = model
            .declare_type("demo.Twice", TypeCategory::Class, None)
            .unwrap();
        model.set_lazy_init(ty.into(), Rc::new(|_: &mut CodeModel, _| Ok(())));
        model.set_lazy_init(ty.into(), Rc::new(|_: &mut CodeModel, _| Ok(())));
    }

    #[test]
    fn same_hook_twice_is_accepted() {
        let mut model = CodeModel::default();
        let ty = model
            .declare_type("demo.Same", TypeCategory::Class, None)
            .unwrap();
        let hook: LazyInit = Rc::new(|_: &mut CodeModel, _| Ok(()));
        model.set_lazy_init(ty.into(), hook.clone());
        model.set_lazy_init(ty.into(), hook);
        model.initialize(ty.into()).unwrap();
    }

    #[test]
    #[should_panic(expected = "after initialization started")]
    fn hook_after_init_panics() {
        let mut model = CodeModel::default();
        let ty = model
            .declare_type("demo.Late", TypeCategory::Class, None)
            .unwrap();
        model.initialize(ty.into()).unwrap();
        model.set_lazy_init(ty.into(), Rc::new(|_: &mut CodeModel, _| Ok(())));
    }

    #[test]
    fn freezing_reaches_owned_children_only() {
        let mut model = CodeModel::default();
        let shared = model
            .declare_type("demo.Shared", TypeCategory::Class, None)
            .unwrap();
        let ty = model
            .declare_type("demo.Owner", TypeCategory::Class, None)
            .unwrap();
        let var = model.add_type_var(TypeVarOwner::Type(ty), "T").unwrap();
        let list = model.create_parameterized(shared, vec![var]);
        let field = model.add_field(ty, "items", list).unwrap();

        model.set_immutable(ty.into());
        model.set_immutable(ty.into());

        assert!(model.is_immutable(field.into()));
        assert!(model.is_immutable(list.into()));
        assert!(model.is_immutable(var.into()));
        assert!(!model.is_immutable(shared.into()));
        assert!(model.add_field(shared, "ok", var).is_ok());
    }

    #[test]
    fn unbounded_wildcard_is_system_immutable() {
        let mut model = CodeModel::default();
        let wildcard = model.unbounded_wildcard();
        assert_eq!(
            model.lifecycle(wildcard.into()).mutability(),
            Mutability::System
        );
        let err = model
            .set_reference_comment(wildcard, Some("nope".into()))
            .unwrap_err();
        assert!(matches!(err, ModelError::ReadOnly { attribute: "comment", .. }));
    }
}
