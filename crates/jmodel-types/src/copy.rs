//! Deep copies of declarations with remapped ownership.

use std::collections::HashMap;

use crate::generic::{ComposedType, ParameterizedType, TypeKind, TypeProxy, TypeWildcard};
use crate::members::OperationKind;
use crate::model::CodeModel;
use crate::names::Name;
use crate::raw::RawType;
use crate::source_ref::{SourceState, SourceTypeRef};
use crate::type_vars::TypeVarOwner;
use crate::{FieldId, NodeKey, OperationId, Result, TypeId};

/// How a referenced type is carried into a copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemCopy {
    /// Keep pointing at the same node unless something it contains was remapped.
    Reference,
    /// Build fresh nodes for every non-shared part of the reference.
    Deep,
}

/// Old node -> new node, for declarations that were copied (types, type variables) or that a
/// merge identified with an existing counterpart.
#[derive(Debug, Clone, Default)]
pub struct TypeMapper {
    map: HashMap<TypeId, TypeId>,
}

impl TypeMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: TypeId, to: TypeId) {
        self.map.insert(from, to);
    }

    pub fn get(&self, from: TypeId) -> Option<TypeId> {
        self.map.get(&from).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl CodeModel {
    /// Copy `ty` (with members and nested types) under its current enclosing type.
    pub fn copy_type(&mut self, ty: TypeId) -> Result<TypeId> {
        let parent = self.declaring_type(ty);
        self.copy_type_into(ty, parent, &mut TypeMapper::new())
    }

    /// Copy `ty` as a member of `parent` (or as a top-level type).
    ///
    /// The copy is mutable and detached: it is not registered under its name and not added to
    /// `parent`'s nested types. References to `ty`, its type variables and its nested types
    /// inside the copy point at their copies.
    pub fn copy_type_into(
        &mut self,
        ty: TypeId,
        parent: Option<TypeId>,
        mapper: &mut TypeMapper,
    ) -> Result<TypeId> {
        self.expect_raw(ty)?;
        let copy = self.copy_skeleton(ty, parent, mapper);
        self.copy_body(ty, copy, mapper)?;
        tracing::trace!(
            target: "jmodel.types",
            name = %self.describe(ty.into()),
            "copied type"
        );
        Ok(copy)
    }

    /// Declarations first, so the body can refer to any of them.
    fn copy_skeleton(&mut self, ty: TypeId, parent: Option<TypeId>, mapper: &mut TypeMapper) -> TypeId {
        self.ensure_initialized(NodeKey::Type(ty));
        let Some(template) = self.raw(ty) else {
            return ty;
        };
        let mut raw = RawType::new(template.qualified_name.clone(), template.category);
        raw.modifiers = template.modifiers;
        raw.declared = template.declared;
        raw.unit = template.unit;
        raw.declaring_type = parent;
        raw.static_initializer = template.static_initializer.clone();
        raw.instance_initializer = template.instance_initializer.clone();
        let nested: Vec<(Name, TypeId)> = template
            .nested
            .iter()
            .map(|(name, id)| (name.clone(), *id))
            .collect();

        let meta = self.node(ty).meta.clone();
        let copy = self.alloc_type(TypeKind::Raw(raw));
        self.node_mut(copy).meta = meta;
        mapper.insert(ty, copy);

        self.copy_type_var_declarations(TypeVarOwner::Type(ty), TypeVarOwner::Type(copy), mapper);

        for (name, child) in nested {
            let child_copy = self.copy_skeleton(child, Some(copy), mapper);
            if let Some(raw) = self.raw_mut(copy) {
                raw.nested.insert(name, child_copy);
            }
        }
        copy
    }

    fn copy_body(&mut self, ty: TypeId, copy: TypeId, mapper: &mut TypeMapper) -> Result<()> {
        self.copy_type_var_bounds(TypeVarOwner::Type(ty), mapper);

        for super_type in self.declared_super_types(ty) {
            let mapped = self.copy_reference(super_type, ItemCopy::Reference, mapper);
            self.add_super_type_unchecked(copy, mapped);
        }
        for field in self.fields(ty) {
            self.copy_field_unchecked(field, copy, mapper);
        }
        for op in self.constructors(ty).into_iter().chain(self.methods(ty)) {
            self.copy_operation_unchecked(op, copy, mapper);
        }
        for child in self.nested_types(ty) {
            if let Some(child_copy) = mapper.get(child) {
                self.copy_body(child, child_copy, mapper)?;
            }
        }
        Ok(())
    }

    /// Copy the type variables of `from` onto `to`, appending to any `to` already declares.
    pub fn copy_type_vars(
        &mut self,
        from: TypeVarOwner,
        to: TypeVarOwner,
        mapper: &mut TypeMapper,
    ) -> Result<()> {
        self.guard(to.into(), "type variables")?;
        self.copy_type_var_declarations(from, to, mapper);
        self.copy_type_var_bounds(from, mapper);
        Ok(())
    }

    fn copy_type_var_declarations(
        &mut self,
        from: TypeVarOwner,
        to: TypeVarOwner,
        mapper: &mut TypeMapper,
    ) {
        for var in self.type_variables(from) {
            let Some(template) = self.type_var(var) else {
                continue;
            };
            let (name, origin) = (template.name.clone(), template.origin.clone());
            let meta = self.node(var).meta.clone();
            let copy = self.add_type_var_unchecked(to, name, origin);
            self.node_mut(copy).meta = meta;
            mapper.insert(var, copy);
        }
    }

    /// Explicit bounds are copied once every variable of the declaration has a counterpart,
    /// so `T extends Comparable<T>` points at the copied `T`.
    fn copy_type_var_bounds(&mut self, from: TypeVarOwner, mapper: &mut TypeMapper) {
        for var in self.type_variables(from) {
            let Some(copy) = mapper.get(var) else {
                continue;
            };
            let Some(bound) = self.type_var(var).and_then(|v| v.bound) else {
                continue;
            };
            let bound = self.copy_reference(bound, ItemCopy::Deep, mapper);
            if let TypeKind::Variable(variable) = &mut self.node_mut(copy).kind {
                variable.bound = Some(bound);
            }
        }
    }

    /// Replace the declared super-types of `to` by copies of `from`'s.
    pub fn copy_super_types(&mut self, from: TypeId, to: TypeId, mapper: &mut TypeMapper) -> Result<()> {
        self.guard(to.into(), "super types")?;
        let copies: Vec<TypeId> = self
            .declared_super_types(from)
            .into_iter()
            .map(|sup| self.copy_reference(sup, ItemCopy::Reference, mapper))
            .collect();
        if let Some(raw) = self.raw_mut(to) {
            raw.super_types = copies;
        }
        Ok(())
    }

    /// Copy `field` into `target`; a field of the same name there is replaced.
    pub fn copy_field(&mut self, field: FieldId, target: TypeId, mapper: &mut TypeMapper) -> Result<FieldId> {
        self.guard(target.into(), "fields")?;
        self.expect_raw(target)?;
        Ok(self.copy_field_unchecked(field, target, mapper))
    }

    fn copy_field_unchecked(&mut self, field: FieldId, target: TypeId, mapper: &mut TypeMapper) -> FieldId {
        let template = self.field(field).clone();
        let ty = self.copy_reference(template.ty, ItemCopy::Deep, mapper);
        let copy = self.add_field_unchecked(target, template.name, ty, template.modifiers);
        let def = &mut self.fields[copy.idx()];
        def.initializer = template.initializer;
        def.meta = template.meta;
        copy
    }

    pub fn copy_operation(
        &mut self,
        op: OperationId,
        target: TypeId,
        mapper: &mut TypeMapper,
    ) -> Result<OperationId> {
        let attribute = match self.operation(op).kind {
            OperationKind::Method => "methods",
            OperationKind::Constructor => "constructors",
        };
        self.guard(target.into(), attribute)?;
        self.expect_raw(target)?;
        Ok(self.copy_operation_unchecked(op, target, mapper))
    }

    fn copy_operation_unchecked(
        &mut self,
        op: OperationId,
        target: TypeId,
        mapper: &mut TypeMapper,
    ) -> OperationId {
        let template = self.operation(op).clone();
        let name = match template.kind {
            OperationKind::Constructor => self
                .raw(target)
                .map(|raw| raw.name.clone())
                .unwrap_or(template.name),
            OperationKind::Method => template.name,
        };
        let copy = self.add_operation_unchecked(target, name, template.kind);

        let from = TypeVarOwner::Operation(op);
        self.copy_type_var_declarations(from, TypeVarOwner::Operation(copy), mapper);
        self.copy_type_var_bounds(from, mapper);

        let params = template
            .params
            .into_iter()
            .map(|mut param| {
                param.ty = self.copy_reference(param.ty, ItemCopy::Deep, mapper);
                param
            })
            .collect::<Vec<_>>();
        let return_type = template
            .return_type
            .map(|ty| self.copy_reference(ty, ItemCopy::Deep, mapper));
        let throws = template
            .throws
            .into_iter()
            .map(|ty| self.copy_reference(ty, ItemCopy::Deep, mapper))
            .collect::<Vec<_>>();

        let def = &mut self.operations[copy.idx()];
        def.modifiers = template.modifiers;
        def.meta = template.meta;
        def.params = params;
        def.return_type = return_type;
        def.throws = throws;
        copy
    }

    /// Carry the reference `id` into a copy.
    ///
    /// Mapped declarations are replaced by their counterparts. Shared nodes are kept. Other
    /// nodes are rebuilt when `mode` is [`ItemCopy::Deep`] or when something inside them was
    /// remapped; otherwise the original node is returned.
    pub fn copy_reference(&mut self, id: TypeId, mode: ItemCopy, mapper: &mut TypeMapper) -> TypeId {
        if let Some(mapped) = mapper.get(id) {
            return mapped;
        }
        let rebuilt = match self.kind(id).clone() {
            TypeKind::Raw(_) | TypeKind::Variable(_) => return id,
            TypeKind::Array(array) => {
                let component = self.copy_reference(array.component, mode, mapper);
                return if component == array.component {
                    id
                } else {
                    self.create_array(component)
                };
            }
            TypeKind::Wildcard(_) if id == self.unbounded_wildcard => return id,
            TypeKind::Parameterized(p) => {
                let base = self.copy_reference(p.base, mode, mapper);
                let args: Vec<TypeId> = p
                    .args
                    .iter()
                    .map(|arg| self.copy_reference(*arg, mode, mapper))
                    .collect();
                if mode == ItemCopy::Reference && base == p.base && args == p.args {
                    return id;
                }
                TypeKind::Parameterized(ParameterizedType { base, args })
            }
            TypeKind::Composed(c) => {
                let parts: Vec<TypeId> = c
                    .parts
                    .iter()
                    .map(|part| self.copy_reference(*part, mode, mapper))
                    .collect();
                if mode == ItemCopy::Reference && parts == c.parts {
                    return id;
                }
                TypeKind::Composed(ComposedType { parts })
            }
            TypeKind::Wildcard(wildcard) => {
                let bound = wildcard
                    .bound
                    .map(|bound| self.copy_reference(bound, mode, mapper));
                if mode == ItemCopy::Reference && bound == wildcard.bound {
                    return id;
                }
                TypeKind::Wildcard(TypeWildcard { bound, ..wildcard })
            }
            TypeKind::Proxy(proxy) => {
                let delegate = self.copy_reference(proxy.delegate, mode, mapper);
                if mode == ItemCopy::Reference && delegate == proxy.delegate {
                    return id;
                }
                TypeKind::Proxy(TypeProxy { delegate, ..proxy })
            }
            TypeKind::Source(source) => match self.delegate(id) {
                Some(delegate) => {
                    let copied = self.copy_reference(delegate, mode, mapper);
                    return if mode == ItemCopy::Reference && copied == delegate {
                        id
                    } else {
                        copied
                    };
                }
                None if mode == ItemCopy::Reference => return id,
                None => TypeKind::Source(SourceTypeRef {
                    raw_name: source.raw_name,
                    state: SourceState::Unresolvable,
                    array_length: source.array_length,
                }),
            },
        };
        let meta = self.node(id).meta.clone();
        let copy = self.alloc_type(rebuilt);
        self.node_mut(copy).meta = meta;
        copy
    }
}
