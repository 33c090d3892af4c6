//! Type references captured from source text, resolved on first dereference.
//!
//! The parser records what it saw (name, type arguments, bounds, array dimensions, comment and
//! annotations) into a [`PendingRef`] while streaming through a compilation unit. Nothing is
//! looked up until a reader asks for the delegate; by then the rest of the unit has usually
//! been declared, so forward references inside a file just work.

use std::mem;

use crate::generic::{Annotation, ReferenceMeta, TypeKind};
use crate::model::CodeModel;
use crate::names::{is_qualified, Name, WILDCARD_NAME};
use crate::type_vars::TypeVarOwner;
use crate::{ModelError, Result, TypeId, UnitId};

#[derive(Debug, Clone)]
pub struct SourceTypeRef {
    pub(crate) raw_name: Name,
    pub(crate) state: SourceState,
    /// `new int[n]` length expression text.
    pub(crate) array_length: Option<String>,
}

impl SourceTypeRef {
    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    pub fn array_length(&self) -> Option<&str> {
        self.array_length.as_deref()
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.state, SourceState::Resolved(_))
    }
}

#[derive(Debug, Clone)]
pub(crate) enum SourceState {
    Unresolved(Box<PendingRef>),
    Resolving,
    Resolved(TypeId),
    Unresolvable,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PendingRef {
    pub(crate) scope: Option<TypeVarOwner>,
    pub(crate) unit: Option<UnitId>,
    /// `Some(empty)` is the diamond `<>`.
    pub(crate) type_args: Option<Vec<TypeId>>,
    pub(crate) composed: Vec<TypeId>,
    pub(crate) extends_bound: Option<TypeId>,
    pub(crate) super_bound: Option<TypeId>,
    pub(crate) array_count: usize,
    pub(crate) meta: ReferenceMeta,
}

impl CodeModel {
    /// A deferred reference to `raw_name`, looked up from `scope` (for type variables) and
    /// `unit` (for imports and the package) when first dereferenced.
    pub fn create_source_ref(
        &mut self,
        raw_name: &str,
        scope: Option<TypeVarOwner>,
        unit: Option<UnitId>,
    ) -> TypeId {
        self.alloc_type(TypeKind::Source(SourceTypeRef {
            raw_name: Name::from(raw_name),
            state: SourceState::Unresolved(Box::new(PendingRef {
                scope,
                unit,
                ..PendingRef::default()
            })),
            array_length: None,
        }))
    }

    pub fn source_ref(&self, id: TypeId) -> Option<&SourceTypeRef> {
        match self.kind(id) {
            TypeKind::Source(source) => Some(source),
            _ => None,
        }
    }

    /// The node a source reference stands for, computed once and cached.
    ///
    /// Returns `None` for other kinds, for names that resolve to nothing, and when called again
    /// while the same reference is being resolved.
    pub fn delegate(&mut self, id: TypeId) -> Option<TypeId> {
        let TypeKind::Source(source) = &mut self.node_mut(id).kind else {
            return None;
        };
        let pending = match mem::replace(&mut source.state, SourceState::Resolving) {
            SourceState::Unresolved(pending) => pending,
            SourceState::Resolved(delegate) => {
                source.state = SourceState::Resolved(delegate);
                return Some(delegate);
            }
            SourceState::Unresolvable => {
                source.state = SourceState::Unresolvable;
                return None;
            }
            SourceState::Resolving => {
                tracing::warn!(
                    target: "jmodel.types",
                    name = %source.raw_name,
                    "reference depends on itself; leaving it unresolved"
                );
                return None;
            }
        };
        let raw_name = source.raw_name.clone();

        let resolved = self.interpret(&raw_name, *pending);
        if let TypeKind::Source(source) = &mut self.node_mut(id).kind {
            source.state = match resolved {
                Some(delegate) => SourceState::Resolved(delegate),
                None => SourceState::Unresolvable,
            };
        }
        resolved
    }

    fn interpret(&mut self, raw_name: &str, pending: PendingRef) -> Option<TypeId> {
        let PendingRef {
            scope,
            unit,
            type_args,
            composed,
            extends_bound,
            super_bound,
            array_count,
            meta,
        } = pending;

        if raw_name == WILDCARD_NAME {
            let wildcard = match (extends_bound, super_bound) {
                (_, Some(bound)) => self.create_wildcard(Some(bound), true),
                (Some(bound), None) => self.create_wildcard(Some(bound), false),
                (None, None) => self.unbounded_wildcard,
            };
            return Some(self.attach_meta(wildcard, meta));
        }

        let var = match scope {
            Some(scope) if !is_qualified(raw_name) => self.lookup_type_var(scope, raw_name, true),
            _ => None,
        };
        let mut result = match var {
            Some(var) => var,
            None if is_qualified(raw_name) => {
                let Some(raw) = self.resolve_dotted_name(raw_name, unit, scope) else {
                    tracing::warn!(target: "jmodel.types", name = raw_name, "unresolved type reference");
                    return None;
                };
                self.create_proxy(raw, true)
            }
            None => {
                let qualified = self.qualified_name_for(raw_name, unit, scope);
                let allow = self.options.allow_create_missing;
                let Some(raw) = self.get_or_create_type(&qualified, allow) else {
                    tracing::warn!(
                        target: "jmodel.types",
                        name = raw_name,
                        qualified = %qualified,
                        "unresolved type reference"
                    );
                    return None;
                };
                raw
            }
        };

        if !composed.is_empty() {
            let mut parts = Vec::with_capacity(composed.len() + 1);
            parts.push(result);
            parts.extend(composed);
            result = self.create_composed(parts);
        }
        if let Some(args) = type_args {
            result = self.create_parameterized(result, args);
        }
        for _ in 0..array_count {
            result = self.create_array(result);
        }
        Some(self.attach_meta(result, meta))
    }

    /// Shared nodes never carry reference-local metadata; they get a proxy instead.
    fn attach_meta(&mut self, ty: TypeId, meta: ReferenceMeta) -> TypeId {
        if meta.is_empty() {
            return ty;
        }
        let target = if self.is_shared(ty) {
            self.create_proxy(ty, false)
        } else {
            ty
        };
        self.node_mut(target).meta = meta;
        target
    }

    fn with_pending(
        &mut self,
        id: TypeId,
        attribute: &'static str,
        update: impl FnOnce(&mut PendingRef),
    ) -> Result<()> {
        self.guard(id.into(), attribute)?;
        match &mut self.node_mut(id).kind {
            TypeKind::Source(SourceTypeRef {
                state: SourceState::Unresolved(pending),
                ..
            }) => {
                update(&mut **pending);
                Ok(())
            }
            TypeKind::Source(source) => {
                tracing::debug!(
                    target: "jmodel.types",
                    name = %source.raw_name,
                    attribute,
                    "reference already resolved; ignoring update"
                );
                Ok(())
            }
            _ => Err(ModelError::WrongKind {
                name: self.describe(id.into()),
                expected: "source type reference",
            }),
        }
    }

    pub fn source_add_type_argument(&mut self, id: TypeId, arg: TypeId) -> Result<()> {
        self.with_pending(id, "type arguments", |pending| {
            pending.type_args.get_or_insert_with(Vec::new).push(arg);
        })
    }

    /// Record `<>`: parameterized, with the arguments left to inference.
    pub fn source_mark_diamond(&mut self, id: TypeId) -> Result<()> {
        self.with_pending(id, "type arguments", |pending| {
            pending.type_args.get_or_insert_with(Vec::new);
        })
    }

    pub fn source_add_composed_type(&mut self, id: TypeId, part: TypeId) -> Result<()> {
        self.with_pending(id, "composed types", |pending| pending.composed.push(part))
    }

    pub fn source_set_extends_bound(&mut self, id: TypeId, bound: TypeId) -> Result<()> {
        self.with_pending(id, "extends bound", |pending| {
            pending.extends_bound = Some(bound);
        })
    }

    pub fn source_set_super_bound(&mut self, id: TypeId, bound: TypeId) -> Result<()> {
        self.with_pending(id, "super bound", |pending| pending.super_bound = Some(bound))
    }

    pub fn source_inc_array_count(&mut self, id: TypeId) -> Result<()> {
        self.with_pending(id, "array dimensions", |pending| pending.array_count += 1)
    }

    pub fn source_set_comment(&mut self, id: TypeId, comment: Option<String>) -> Result<()> {
        self.with_pending(id, "comment", |pending| pending.meta.comment = comment)
    }

    pub fn source_add_annotation(&mut self, id: TypeId, annotation: Annotation) -> Result<()> {
        self.with_pending(id, "annotations", |pending| {
            pending.meta.annotations.push(annotation);
        })
    }

    pub fn source_set_array_length(&mut self, id: TypeId, expression: &str) -> Result<()> {
        self.with_pending(id, "array length", |_| {})?;
        if let TypeKind::Source(source) = &mut self.node_mut(id).kind {
            if matches!(source.state, SourceState::Unresolved(_)) {
                source.array_length = Some(expression.to_string());
            }
        }
        Ok(())
    }

    /// Dereference every source reference that is still pending. Returns the ones that did not
    /// resolve.
    pub fn resolve_pending_sources(&mut self) -> Vec<TypeId> {
        let pending: Vec<TypeId> = (0..self.types.len())
            .map(TypeId::from_raw)
            .filter(|id| {
                matches!(
                    self.kind(*id),
                    TypeKind::Source(SourceTypeRef {
                        state: SourceState::Unresolved(_),
                        ..
                    })
                )
            })
            .collect();
        let mut unresolved = Vec::new();
        for id in pending {
            if self.delegate(id).is_none() {
                unresolved.push(id);
            }
        }
        if !unresolved.is_empty() {
            tracing::debug!(
                target: "jmodel.types",
                count = unresolved.len(),
                "source references left unresolved"
            );
        }
        unresolved
    }
}
