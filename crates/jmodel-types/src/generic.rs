//! The generic type hierarchy.
//!
//! Every type reference in the model is a [`TypeNode`] stored in the [`CodeModel`] arena and
//! addressed by [`TypeId`]. The variants form a closed set ([`TypeKind`]); "what kind of type is
//! this" is always an exhaustive match.
//!
//! Raw types, type variables and array types are *shared* declarations: many references point
//! at the same node. Everything else (parameterizations, intersections, bounded wildcards,
//! proxies, source references) belongs to the element that wrote the reference.

use std::sync::Arc;

use crate::mirror::{TypeSig, TypeVarMirror};
use crate::model::CodeModel;
use crate::names::{Name, WILDCARD_NAME};
use crate::raw::RawType;
use crate::source_ref::SourceTypeRef;
use crate::type_vars::TypeVarOwner;
use crate::{Lifecycle, ModelError, NodeKey, Result, TypeCategory, TypeId, TypeVarsId};

/// Guards the unwrapping loops against malformed (cyclic) bound graphs.
const MAX_UNWRAP_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub name: Name,
    /// Raw argument text between the parentheses, if any.
    pub arguments: Option<String>,
}

impl Annotation {
    pub fn new(name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            arguments: None,
        }
    }

    pub fn with_arguments(name: impl Into<Name>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Some(arguments.into()),
        }
    }
}

/// Comment and annotations attached to a single reference (or declaration).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceMeta {
    pub comment: Option<String>,
    pub annotations: Vec<Annotation>,
}

impl ReferenceMeta {
    pub fn is_empty(&self) -> bool {
        self.comment.is_none() && self.annotations.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TypeNode {
    pub(crate) kind: TypeKind,
    pub(crate) lifecycle: Lifecycle,
    /// Lazily created `self[]`.
    pub(crate) array: Option<TypeId>,
    pub(crate) meta: ReferenceMeta,
}

impl TypeNode {
    pub(crate) fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            lifecycle: Lifecycle::new(),
            array: None,
            meta: ReferenceMeta::default(),
        }
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn meta(&self) -> &ReferenceMeta {
        &self.meta
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    Raw(RawType),
    Array(ArrayType),
    Parameterized(ParameterizedType),
    Variable(TypeVariable),
    Wildcard(TypeWildcard),
    Composed(ComposedType),
    Proxy(TypeProxy),
    Source(SourceTypeRef),
}

impl TypeKind {
    pub fn label(&self) -> &'static str {
        match self {
            TypeKind::Raw(_) => "type",
            TypeKind::Array(_) => "array type",
            TypeKind::Parameterized(_) => "parameterized type",
            TypeKind::Variable(_) => "type variable",
            TypeKind::Wildcard(_) => "wildcard",
            TypeKind::Composed(_) => "composed type",
            TypeKind::Proxy(_) => "type proxy",
            TypeKind::Source(_) => "source type reference",
        }
    }

    pub fn as_raw(&self) -> Option<&RawType> {
        match self {
            TypeKind::Raw(raw) => Some(raw),
            _ => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, TypeKind::Variable(_) | TypeKind::Wildcard(_))
    }
}

/// One array dimension over `component`.
#[derive(Debug, Clone)]
pub struct ArrayType {
    pub(crate) component: TypeId,
}

impl ArrayType {
    pub fn component(&self) -> TypeId {
        self.component
    }
}

#[derive(Debug, Clone)]
pub struct ParameterizedType {
    /// The parameterized type; its `as_type` is a raw type. May be a qualified proxy.
    pub(crate) base: TypeId,
    pub(crate) args: Vec<TypeId>,
}

impl ParameterizedType {
    pub fn base(&self) -> TypeId {
        self.base
    }

    pub fn args(&self) -> &[TypeId] {
        &self.args
    }

    /// `new Foo<>()`: parameterized with arguments left to inference.
    pub fn is_diamond(&self) -> bool {
        self.args.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TypeVariable {
    pub(crate) name: Name,
    pub(crate) container: TypeVarsId,
    /// Explicit bound, or the bound computed from `origin` on first access.
    pub(crate) bound: Option<TypeId>,
    pub(crate) origin: Option<Arc<TypeVarMirror>>,
}

impl TypeVariable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn container(&self) -> TypeVarsId {
        self.container
    }
}

#[derive(Debug, Clone)]
pub(crate) struct WildcardOrigin {
    pub(crate) sig: TypeSig,
    pub(crate) scope: Option<TypeVarOwner>,
}

#[derive(Debug, Clone)]
pub struct TypeWildcard {
    pub(crate) bound: Option<TypeId>,
    pub(crate) is_super: bool,
    pub(crate) origin: Option<WildcardOrigin>,
}

impl TypeWildcard {
    pub fn is_super(&self) -> bool {
        self.is_super
    }
}

/// An intersection (`A & B`), as used by multi-bounded type variables.
#[derive(Debug, Clone)]
pub struct ComposedType {
    pub(crate) parts: Vec<TypeId>,
}

impl ComposedType {
    pub fn parts(&self) -> &[TypeId] {
        &self.parts
    }
}

/// A reference-local wrapper around a shared delegate.
#[derive(Debug, Clone)]
pub struct TypeProxy {
    pub(crate) delegate: TypeId,
    pub(crate) qualified: bool,
}

impl TypeProxy {
    pub fn delegate(&self) -> TypeId {
        self.delegate
    }

    pub fn is_qualified(&self) -> bool {
        self.qualified
    }
}

impl CodeModel {
    pub fn node(&self, id: TypeId) -> &TypeNode {
        &self.types[id.idx()]
    }

    pub(crate) fn node_mut(&mut self, id: TypeId) -> &mut TypeNode {
        &mut self.types[id.idx()]
    }

    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.types[id.idx()].kind
    }

    pub(crate) fn alloc_type(&mut self, kind: TypeKind) -> TypeId {
        let id = TypeId::from_raw(self.types.len());
        self.types.push(TypeNode::new(kind));
        id
    }

    /// Shared nodes are declarations referenced from many places; they are never deep-copied
    /// and never carry reference-local metadata.
    pub fn is_shared(&self, id: TypeId) -> bool {
        id == self.unbounded_wildcard
            || matches!(
                self.kind(id),
                TypeKind::Raw(_) | TypeKind::Variable(_) | TypeKind::Array(_)
            )
    }

    pub fn has_reflective_origin(&self, id: TypeId) -> bool {
        match self.kind(id) {
            TypeKind::Raw(raw) => raw.origin.is_some(),
            TypeKind::Variable(var) => var.origin.is_some(),
            TypeKind::Wildcard(wildcard) => wildcard.origin.is_some(),
            _ => false,
        }
    }

    pub fn create_proxy(&mut self, delegate: TypeId, qualified: bool) -> TypeId {
        self.alloc_type(TypeKind::Proxy(TypeProxy {
            delegate,
            qualified,
        }))
    }

    pub fn create_parameterized(&mut self, base: TypeId, args: Vec<TypeId>) -> TypeId {
        self.alloc_type(TypeKind::Parameterized(ParameterizedType { base, args }))
    }

    /// Intersection of `parts`; a single part is returned unchanged.
    pub fn create_composed(&mut self, mut parts: Vec<TypeId>) -> TypeId {
        if parts.len() == 1 {
            return parts.remove(0);
        }
        self.alloc_type(TypeKind::Composed(ComposedType { parts }))
    }

    /// `? extends bound` / `? super bound`; `None` yields the shared unbounded wildcard.
    pub fn create_wildcard(&mut self, bound: Option<TypeId>, is_super: bool) -> TypeId {
        match bound {
            None => self.unbounded_wildcard,
            Some(bound) => self.alloc_type(TypeKind::Wildcard(TypeWildcard {
                bound: Some(bound),
                is_super,
                origin: None,
            })),
        }
    }

    pub(crate) fn create_wildcard_from_sig(
        &mut self,
        sig: TypeSig,
        is_super: bool,
        scope: Option<TypeVarOwner>,
    ) -> TypeId {
        self.alloc_type(TypeKind::Wildcard(TypeWildcard {
            bound: None,
            is_super,
            origin: Some(WildcardOrigin { sig, scope }),
        }))
    }

    pub fn add_type_argument(&mut self, parameterized: TypeId, arg: TypeId) -> Result<()> {
        self.guard(parameterized.into(), "type arguments")?;
        match &mut self.node_mut(parameterized).kind {
            TypeKind::Parameterized(p) => {
                p.args.push(arg);
                Ok(())
            }
            _ => Err(ModelError::WrongKind {
                name: self.describe(parameterized.into()),
                expected: "parameterized type",
            }),
        }
    }

    pub fn type_arguments(&mut self, id: TypeId) -> Vec<TypeId> {
        let id = self.unwrap_proxies(id);
        match self.kind(id) {
            TypeKind::Parameterized(p) => p.args.clone(),
            _ => Vec::new(),
        }
    }

    pub fn set_reference_comment(&mut self, id: TypeId, comment: Option<String>) -> Result<()> {
        self.guard(id.into(), "comment")?;
        self.node_mut(id).meta.comment = comment;
        Ok(())
    }

    pub fn add_reference_annotation(&mut self, id: TypeId, annotation: Annotation) -> Result<()> {
        self.guard(id.into(), "annotations")?;
        self.node_mut(id).meta.annotations.push(annotation);
        Ok(())
    }

    /// Strip proxies and dereference source references. Unresolvable source references are
    /// returned as-is.
    pub fn unwrap_proxies(&mut self, id: TypeId) -> TypeId {
        let mut current = id;
        for _ in 0..MAX_UNWRAP_DEPTH {
            let next = match self.kind(current) {
                TypeKind::Proxy(proxy) => proxy.delegate,
                TypeKind::Source(_) => match self.delegate(current) {
                    Some(delegate) => delegate,
                    None => return current,
                },
                _ => return current,
            };
            current = next;
        }
        current
    }

    /// The raw type this type erases to.
    ///
    /// Always yields a [`TypeKind::Raw`] node: arrays and unresolvable references fall back to
    /// the root type.
    pub fn as_type(&mut self, id: TypeId) -> TypeId {
        let mut current = id;
        for _ in 0..MAX_UNWRAP_DEPTH {
            let next = match self.kind(current) {
                TypeKind::Raw(_) => return current,
                TypeKind::Array(_) => return self.root,
                TypeKind::Parameterized(p) => p.base,
                TypeKind::Composed(c) => match c.parts.first() {
                    Some(first) => *first,
                    None => return self.root,
                },
                TypeKind::Proxy(proxy) => proxy.delegate,
                TypeKind::Wildcard(w) if w.is_super => return self.root,
                TypeKind::Variable(_) | TypeKind::Wildcard(_) => match self.bound(current) {
                    Some(bound) => bound,
                    None => return self.root,
                },
                TypeKind::Source(_) => match self.delegate(current) {
                    Some(delegate) => delegate,
                    None => return self.root,
                },
            };
            current = next;
        }
        tracing::warn!(
            target: "jmodel.types",
            ty = %self.describe(id.into()),
            "cyclic type bounds; erasing to the root type"
        );
        self.root
    }

    /// Bound of a type variable or wildcard (through proxies); `None` for other kinds.
    ///
    /// Reflective bounds are computed on first access. Unbounded placeholders report the root
    /// type.
    pub fn bound(&mut self, id: TypeId) -> Option<TypeId> {
        let id = self.unwrap_proxies(id);
        match self.kind(id) {
            TypeKind::Variable(var) => {
                if let Some(bound) = var.bound {
                    return Some(bound);
                }
                let Some(origin) = var.origin.clone() else {
                    return Some(self.root);
                };
                let scope = self.type_var_owner(var.container);
                let parts: Vec<TypeId> = origin
                    .bounds
                    .iter()
                    .map(|sig| self.type_from_sig(sig, Some(scope)))
                    .collect();
                let bound = if parts.is_empty() {
                    self.root
                } else {
                    self.create_composed(parts)
                };
                if let TypeKind::Variable(var) = &mut self.node_mut(id).kind {
                    var.bound = Some(bound);
                }
                Some(bound)
            }
            TypeKind::Wildcard(wildcard) => {
                if let Some(bound) = wildcard.bound {
                    return Some(bound);
                }
                let Some(origin) = wildcard.origin.clone() else {
                    return Some(self.root);
                };
                let bound = self.type_from_sig(&origin.sig, origin.scope);
                if let TypeKind::Wildcard(wildcard) = &mut self.node_mut(id).kind {
                    wildcard.bound = Some(bound);
                }
                Some(bound)
            }
            _ => None,
        }
    }

    /// Replace placeholders one level deep.
    ///
    /// Raw types resolve to themselves. Type variables resolve to the matching argument of
    /// `context` (a parameterization of the declaring type or one of its subtypes) when given,
    /// otherwise to their bound. Wrappers whose contents resolve unchanged return themselves.
    pub fn resolve(&mut self, id: TypeId, context: Option<TypeId>) -> TypeId {
        if matches!(self.kind(id), TypeKind::Raw(_)) {
            return id;
        }
        match self.kind(id).clone() {
            TypeKind::Raw(_) => id,
            TypeKind::Variable(_) => {
                if let Some(arg) = context.and_then(|ctx| self.substitute_from_context(id, ctx, 0))
                {
                    return arg;
                }
                self.bound(id).unwrap_or(self.root)
            }
            TypeKind::Wildcard(_) => self.bound(id).unwrap_or(self.root),
            TypeKind::Array(array) => {
                let resolved = self.resolve(array.component, context);
                if resolved == array.component {
                    id
                } else {
                    self.create_array(resolved)
                }
            }
            TypeKind::Parameterized(p) => {
                if let Err(err) = self.check_arity(id) {
                    tracing::warn!(target: "jmodel.types", error = %err, "arity mismatch");
                }
                let base = self.resolve(p.base, context);
                let args: Vec<TypeId> = p.args.iter().map(|a| self.resolve(*a, context)).collect();
                if base == p.base && args == p.args {
                    id
                } else {
                    self.create_parameterized(base, args)
                }
            }
            TypeKind::Composed(c) => {
                let parts: Vec<TypeId> =
                    c.parts.iter().map(|p| self.resolve(*p, context)).collect();
                if parts == c.parts {
                    id
                } else {
                    self.alloc_type(TypeKind::Composed(ComposedType { parts }))
                }
            }
            TypeKind::Proxy(proxy) => {
                let resolved = self.resolve(proxy.delegate, context);
                if resolved == proxy.delegate {
                    id
                } else {
                    resolved
                }
            }
            TypeKind::Source(_) => match self.delegate(id) {
                Some(delegate) => {
                    let resolved = self.resolve(delegate, context);
                    if resolved == delegate {
                        id
                    } else {
                        resolved
                    }
                }
                None => id,
            },
        }
    }

    /// Find the argument bound to `var` when viewing `context` as its declaring type.
    fn substitute_from_context(
        &mut self,
        var: TypeId,
        context: TypeId,
        depth: usize,
    ) -> Option<TypeId> {
        let TypeKind::Variable(variable) = self.kind(var) else {
            return None;
        };
        let container = variable.container;
        let TypeVarOwner::Type(declaring) = self.type_var_owner(container) else {
            return None;
        };
        let index = self.type_vars[container.idx()]
            .vars
            .iter()
            .position(|v| *v == var)?;

        let context = self.unwrap_proxies(context);
        if let TypeKind::Parameterized(p) = self.kind(context).clone() {
            if self.as_type(p.base) == declaring {
                return p.args.get(index).copied();
            }
        }

        let raw = self.as_type(context);
        let supers: Vec<TypeId> = self.all_super_types(raw).collect();
        for candidate in supers {
            let TypeKind::Parameterized(p) = self.kind(candidate).clone() else {
                continue;
            };
            if self.as_type(p.base) != declaring {
                continue;
            }
            let arg = *p.args.get(index)?;
            let unwrapped = self.unwrap_proxies(arg);
            if unwrapped != var
                && depth < MAX_UNWRAP_DEPTH
                && matches!(self.kind(unwrapped), TypeKind::Variable(_))
            {
                return self
                    .substitute_from_context(unwrapped, context, depth + 1)
                    .or(Some(arg));
            }
            return Some(arg);
        }
        None
    }

    /// The declared type-parameter count must match the argument count once both are known.
    /// Diamonds and raw declarations (no parameters) are exempt.
    pub fn check_arity(&mut self, parameterized: TypeId) -> Result<()> {
        let TypeKind::Parameterized(p) = self.kind(parameterized).clone() else {
            return Ok(());
        };
        if p.args.is_empty() {
            return Ok(());
        }
        let raw = self.as_type(p.base);
        let declared = self.type_variables(raw.into_owner()).len();
        if declared != 0 && declared != p.args.len() {
            return Err(ModelError::ArityMismatch {
                what: "type arguments",
                left: declared,
                right: p.args.len(),
            });
        }
        Ok(())
    }

    /// `self[]`, created once per component and cached.
    pub fn create_array(&mut self, id: TypeId) -> TypeId {
        if let Some(array) = self.node(id).array {
            return array;
        }
        let array = self.alloc_type(TypeKind::Array(ArrayType { component: id }));
        self.node_mut(id).array = Some(array);
        array
    }

    pub fn component_type(&mut self, id: TypeId) -> Option<TypeId> {
        let id = self.unwrap_proxies(id);
        match self.kind(id) {
            TypeKind::Array(array) => Some(array.component),
            _ => None,
        }
    }

    pub fn simple_name(&mut self, id: TypeId) -> String {
        self.name_of(id, false, 0)
    }

    pub fn qualified_name(&mut self, id: TypeId) -> String {
        self.name_of(id, true, 0)
    }

    fn name_of(&mut self, id: TypeId, qualified: bool, depth: usize) -> String {
        if depth > MAX_UNWRAP_DEPTH {
            return String::from("...");
        }
        if let TypeKind::Raw(raw) = self.kind(id) {
            return if qualified {
                raw.qualified_name.to_string()
            } else {
                raw.name.to_string()
            };
        }
        match self.kind(id).clone() {
            TypeKind::Raw(_) => String::new(),
            TypeKind::Array(array) => {
                format!("{}[]", self.name_of(array.component, qualified, depth + 1))
            }
            TypeKind::Parameterized(p) => {
                let base = self.name_of(p.base, qualified, depth + 1);
                let args: Vec<String> = p
                    .args
                    .iter()
                    .map(|arg| self.name_of(*arg, qualified, depth + 1))
                    .collect();
                format!("{base}<{}>", args.join(", "))
            }
            TypeKind::Variable(var) => var.name.to_string(),
            TypeKind::Wildcard(_) => WILDCARD_NAME.to_string(),
            TypeKind::Composed(c) => {
                let parts: Vec<String> = c
                    .parts
                    .iter()
                    .map(|part| self.name_of(*part, qualified, depth + 1))
                    .collect();
                parts.join("&")
            }
            TypeKind::Proxy(proxy) => self.name_of(proxy.delegate, qualified, depth + 1),
            TypeKind::Source(source) => match self.delegate(id) {
                Some(delegate) => self.name_of(delegate, qualified, depth + 1),
                None => source.raw_name().to_string(),
            },
        }
    }

    /// Whether references to `id` print fully qualified.
    pub fn is_qualified(&mut self, id: TypeId) -> bool {
        match self.kind(id) {
            TypeKind::Proxy(proxy) => {
                let (qualified, delegate) = (proxy.qualified, proxy.delegate);
                qualified || self.is_qualified(delegate)
            }
            TypeKind::Source(_) => match self.delegate(id) {
                Some(delegate) => self.is_qualified(delegate),
                None => false,
            },
            _ => false,
        }
    }

    pub fn is_wildcard(&mut self, id: TypeId) -> bool {
        let id = self.unwrap_proxies(id);
        matches!(self.kind(id), TypeKind::Wildcard(_))
    }

    /// `true` for type variables and `? extends` wildcards.
    pub fn is_extends(&mut self, id: TypeId) -> bool {
        let id = self.unwrap_proxies(id);
        match self.kind(id) {
            TypeKind::Variable(_) => true,
            TypeKind::Wildcard(w) => !w.is_super,
            _ => false,
        }
    }

    pub fn is_super(&mut self, id: TypeId) -> bool {
        let id = self.unwrap_proxies(id);
        matches!(self.kind(id), TypeKind::Wildcard(w) if w.is_super)
    }

    pub fn category(&mut self, id: TypeId) -> TypeCategory {
        let raw = self.as_type(id);
        match self.kind(raw) {
            TypeKind::Raw(raw) => raw.category,
            _ => TypeCategory::Class,
        }
    }

    pub(crate) fn not_raw_error(&self, id: TypeId) -> ModelError {
        ModelError::NotARawType {
            name: self.describe(NodeKey::Type(id)),
        }
    }
}

impl TypeId {
    /// View a raw type as a type-variable owner.
    pub fn into_owner(self) -> TypeVarOwner {
        TypeVarOwner::Type(self)
    }
}
