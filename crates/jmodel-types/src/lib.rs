//! In-memory model of Java-like declarations.
//!
//! A [`CodeModel`] owns every node: raw types, generic references (arrays, parameterized types,
//! type variables, wildcards, intersections, proxies), unresolved source references, fields,
//! operations and compilation units. Nodes are addressed by small copyable ids.
//!
//! Types come from two directions. Reflective [`ClassMirror`]s handed out by a [`TypeLoader`]
//! are registered eagerly and filled on first access. Source declarations are built through the
//! mutators, with references to other types recorded as source references that resolve against
//! their imports and scope only when read.
//!
//! Nodes start mutable. [`CodeModel::set_immutable`] (or finishing a unit) freezes a node and
//! everything it owns; mutators on frozen nodes return [`ModelError::ReadOnly`].

mod copy;
mod error;
mod format;
mod generic;
mod ids;
mod lifecycle;
mod members;
mod merge;
mod mirror;
mod model;
mod modifiers;
pub mod names;
mod raw;
mod reflect;
mod source_ref;
mod super_types;
mod type_vars;

pub use copy::{ItemCopy, TypeMapper};
pub use error::{ModelError, Result};
pub use generic::{
    Annotation, ArrayType, ComposedType, ParameterizedType, ReferenceMeta, TypeKind, TypeNode,
    TypeProxy, TypeVariable, TypeWildcard,
};
pub use ids::{FieldId, NodeKey, OperationId, TypeId, TypeVarsId, UnitId};
pub use lifecycle::{InitState, LazyInit, Lifecycle, Mutability};
pub use members::{FieldDef, OperationDef, OperationKind, Parameter};
pub use merge::MergeStrategy;
pub use mirror::{ClassMirror, FieldMirror, MethodMirror, TypeLoader, TypeSig, TypeVarMirror};
pub use model::{CodeModel, CompilationUnit, Import, ResolutionOptions};
pub use modifiers::Modifiers;
pub use names::Name;
pub use raw::{RawType, TypeCategory};
pub use source_ref::SourceTypeRef;
pub use super_types::SuperTypeWalk;
pub use type_vars::{TypeVarContainer, TypeVarOwner};
