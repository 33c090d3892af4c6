//! Ordered type-variable containers and their lexical scoping.

use std::sync::Arc;

use crate::generic::{TypeKind, TypeVariable};
use crate::mirror::TypeVarMirror;
use crate::model::CodeModel;
use crate::names::Name;
use crate::{Lifecycle, ModelError, NodeKey, OperationId, Result, TypeId, TypeVarsId};

/// Bounds the outward walk in [`CodeModel::lookup_type_var`].
const MAX_SCOPE_DEPTH: usize = 64;

/// The declaration that owns a type-variable container: a type or a method/constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeVarOwner {
    Type(TypeId),
    Operation(OperationId),
}

impl From<TypeVarOwner> for NodeKey {
    fn from(owner: TypeVarOwner) -> Self {
        match owner {
            TypeVarOwner::Type(id) => NodeKey::Type(id),
            TypeVarOwner::Operation(id) => NodeKey::Operation(id),
        }
    }
}

impl From<OperationId> for TypeVarOwner {
    fn from(id: OperationId) -> Self {
        TypeVarOwner::Operation(id)
    }
}

impl From<TypeId> for TypeVarOwner {
    fn from(id: TypeId) -> Self {
        TypeVarOwner::Type(id)
    }
}

#[derive(Debug, Clone)]
pub struct TypeVarContainer {
    pub(crate) owner: TypeVarOwner,
    pub(crate) vars: Vec<TypeId>,
    pub(crate) lifecycle: Lifecycle,
}

impl TypeVarContainer {
    pub fn owner(&self) -> TypeVarOwner {
        self.owner
    }

    pub fn vars(&self) -> &[TypeId] {
        &self.vars
    }
}

impl CodeModel {
    pub fn type_var_container(&mut self, owner: TypeVarOwner) -> Option<TypeVarsId> {
        self.ensure_initialized(owner.into());
        self.container_of(owner)
    }

    fn container_of(&self, owner: TypeVarOwner) -> Option<TypeVarsId> {
        match owner {
            TypeVarOwner::Type(ty) => self.raw(ty)?.type_vars,
            TypeVarOwner::Operation(op) => self.operations[op.idx()].type_vars,
        }
    }

    fn set_container_of(&mut self, owner: TypeVarOwner, container: Option<TypeVarsId>) {
        match owner {
            TypeVarOwner::Type(ty) => {
                if let Some(raw) = self.raw_mut(ty) {
                    raw.type_vars = container;
                }
            }
            TypeVarOwner::Operation(op) => self.operations[op.idx()].type_vars = container,
        }
    }

    /// The container of `owner`, created on first use.
    fn ensure_container(&mut self, owner: TypeVarOwner) -> TypeVarsId {
        if let Some(existing) = self.container_of(owner) {
            return existing;
        }
        let id = TypeVarsId::from_raw(self.type_vars.len());
        self.type_vars.push(TypeVarContainer {
            owner,
            vars: Vec::new(),
            lifecycle: Lifecycle::new(),
        });
        self.set_container_of(owner, Some(id));
        id
    }

    pub fn type_var_owner(&self, container: TypeVarsId) -> TypeVarOwner {
        self.type_vars[container.idx()].owner
    }

    /// Declared type variables of `owner`, in declaration order. Owners without a container
    /// report none.
    pub fn type_variables(&mut self, owner: TypeVarOwner) -> Vec<TypeId> {
        match self.type_var_container(owner) {
            Some(container) => self.type_vars[container.idx()].vars.clone(),
            None => Vec::new(),
        }
    }

    pub fn type_var(&self, id: TypeId) -> Option<&TypeVariable> {
        match self.kind(id) {
            TypeKind::Variable(var) => Some(var),
            _ => None,
        }
    }

    /// Declare a new type variable named `name` on `owner`.
    pub fn add_type_var(&mut self, owner: TypeVarOwner, name: &str) -> Result<TypeId> {
        self.guard(owner.into(), "type variables")?;
        if let Some(container) = self.container_of(owner) {
            self.guard(container.into(), "type variables")?;
            if self.local_type_var(container, name).is_some() {
                return Err(ModelError::DuplicateMember {
                    owner: self.describe(owner.into()),
                    what: "type variable",
                    name: name.to_string(),
                });
            }
        }
        Ok(self.add_type_var_unchecked(owner, Name::from(name), None))
    }

    pub(crate) fn add_type_var_unchecked(
        &mut self,
        owner: TypeVarOwner,
        name: Name,
        origin: Option<Arc<TypeVarMirror>>,
    ) -> TypeId {
        let container = self.ensure_container(owner);
        let var = self.alloc_type(TypeKind::Variable(TypeVariable {
            name,
            container,
            bound: None,
            origin,
        }));
        self.type_vars[container.idx()].vars.push(var);
        var
    }

    pub fn set_type_var_bound(&mut self, var: TypeId, bound: Option<TypeId>) -> Result<()> {
        self.guard(var.into(), "bound")?;
        match &mut self.node_mut(var).kind {
            TypeKind::Variable(variable) => {
                variable.bound = bound;
                Ok(())
            }
            _ => Err(ModelError::WrongKind {
                name: self.describe(var.into()),
                expected: "type variable",
            }),
        }
    }

    /// Remove every type variable declared by `owner`.
    pub fn clear_type_vars(&mut self, owner: TypeVarOwner) -> Result<()> {
        self.guard(owner.into(), "type variables")?;
        if let Some(container) = self.container_of(owner) {
            self.guard(container.into(), "type variables")?;
            self.type_vars[container.idx()].vars.clear();
        }
        Ok(())
    }

    /// Move `container` to `new_owner`, replacing whatever container the new owner had.
    pub fn reparent_type_vars(&mut self, container: TypeVarsId, new_owner: TypeVarOwner) -> Result<()> {
        self.guard(container.into(), "owner")?;
        self.guard(new_owner.into(), "type variables")?;
        let old_owner = self.type_var_owner(container);
        if old_owner == new_owner {
            return Ok(());
        }
        self.guard(old_owner.into(), "type variables")?;
        if self.container_of(old_owner) == Some(container) {
            self.set_container_of(old_owner, None);
        }
        self.set_container_of(new_owner, Some(container));
        self.type_vars[container.idx()].owner = new_owner;
        tracing::debug!(
            target: "jmodel.types",
            from = %self.describe(old_owner.into()),
            to = %self.describe(new_owner.into()),
            "type variables re-parented"
        );
        Ok(())
    }

    fn local_type_var(&self, container: TypeVarsId, name: &str) -> Option<TypeId> {
        self.type_vars[container.idx()]
            .vars
            .iter()
            .copied()
            .find(|var| self.type_var(*var).is_some_and(|v| v.name == name))
    }

    /// Find the type variable `name` visible from `scope`.
    ///
    /// Local declarations win. With `include_declaring`, the search continues outward: an
    /// instance operation sees its declaring type's variables, and a non-static nested type
    /// sees its enclosing type's. Static members stop the walk.
    pub fn lookup_type_var(
        &mut self,
        scope: TypeVarOwner,
        name: &str,
        include_declaring: bool,
    ) -> Option<TypeId> {
        let mut current = Some(scope);
        let mut depth = 0;
        while let Some(owner) = current {
            if depth > MAX_SCOPE_DEPTH {
                tracing::warn!(target: "jmodel.types", name, "type variable scope chain too deep");
                return None;
            }
            depth += 1;

            if let Some(found) = self
                .type_var_container(owner)
                .and_then(|container| self.local_type_var(container, name))
            {
                return Some(found);
            }
            if !include_declaring {
                return None;
            }
            current = match owner {
                TypeVarOwner::Operation(op) => {
                    let def = &self.operations[op.idx()];
                    (!def.is_static()).then_some(TypeVarOwner::Type(def.declaring_type))
                }
                TypeVarOwner::Type(ty) => {
                    if self.is_static_type(ty) {
                        None
                    } else {
                        self.declaring_type(ty).map(TypeVarOwner::Type)
                    }
                }
            };
        }
        None
    }
}
