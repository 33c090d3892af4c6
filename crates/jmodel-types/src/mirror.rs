//! Reflective metadata ("mirrors") and the loader seam.
//!
//! A mirror is the platform-independent equivalent of a `Class`/`Field`/`Method` handle: plain
//! data describing a compiled type. [`TypeLoader`] implementations hand mirrors to the model on a
//! cache miss; the model turns them into nodes lazily, the first time a type's members,
//! super-types or type variables are read.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Modifiers, TypeCategory};

/// A generic signature as found in reflective metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeSig {
    /// A class, interface or primitive type, optionally parameterized.
    Class {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<TypeSig>,
    },
    Array(Box<TypeSig>),
    TypeVar(String),
    Wildcard {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        extends: Option<Box<TypeSig>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        super_bound: Option<Box<TypeSig>>,
    },
}

impl TypeSig {
    pub fn class(name: impl Into<String>) -> Self {
        TypeSig::Class {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn parameterized(name: impl Into<String>, args: Vec<TypeSig>) -> Self {
        TypeSig::Class {
            name: name.into(),
            args,
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        TypeSig::TypeVar(name.into())
    }

    pub fn array(component: TypeSig) -> Self {
        TypeSig::Array(Box::new(component))
    }

    pub fn unbounded_wildcard() -> Self {
        TypeSig::Wildcard {
            extends: None,
            super_bound: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeVarMirror {
    pub name: String,
    /// Declared bounds. Reflection always reports at least one bound (`Object` when none was
    /// written), so an empty list is malformed input.
    pub bounds: Vec<TypeSig>,
}

impl TypeVarMirror {
    pub fn new(name: impl Into<String>, bounds: Vec<TypeSig>) -> Self {
        Self {
            name: name.into(),
            bounds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMirror {
    pub name: String,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(rename = "type")]
    pub ty: TypeSig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodMirror {
    pub name: String,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub type_params: Vec<TypeVarMirror>,
    #[serde(default)]
    pub params: Vec<TypeSig>,
    /// `None` for constructors.
    #[serde(default)]
    pub return_type: Option<TypeSig>,
    #[serde(default)]
    pub throws: Vec<TypeSig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMirror {
    /// Canonical name, nested types separated by `.` (`java.util.Map.Entry`).
    pub name: String,
    pub category: TypeCategory,
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Canonical name of the enclosing type for nested types.
    #[serde(default)]
    pub declaring_type: Option<String>,
    #[serde(default)]
    pub type_params: Vec<TypeVarMirror>,
    #[serde(default)]
    pub superclass: Option<TypeSig>,
    #[serde(default)]
    pub interfaces: Vec<TypeSig>,
    #[serde(default)]
    pub fields: Vec<FieldMirror>,
    #[serde(default)]
    pub methods: Vec<MethodMirror>,
    #[serde(default)]
    pub constructors: Vec<MethodMirror>,
}

impl ClassMirror {
    pub fn new(name: impl Into<String>, category: TypeCategory) -> Self {
        Self {
            name: name.into(),
            category,
            modifiers: Modifiers::PUBLIC,
            declaring_type: None,
            type_params: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }
}

/// The reflective loader capability consumed by [`crate::CodeModel`].
///
/// Implementations return `None` for unknown names; the model absorbs the miss.
pub trait TypeLoader {
    fn load(&self, qualified_name: &str) -> Option<Arc<ClassMirror>>;
}

impl<F> TypeLoader for F
where
    F: Fn(&str) -> Option<Arc<ClassMirror>>,
{
    fn load(&self, qualified_name: &str) -> Option<Arc<ClassMirror>> {
        self(qualified_name)
    }
}
