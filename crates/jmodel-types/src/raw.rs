use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::generic::TypeKind;
use crate::mirror::ClassMirror;
use crate::model::CodeModel;
use crate::names::{is_primitive, simple_name_of, Name};
use crate::{FieldId, ModelError, Modifiers, NodeKey, OperationId, Result, TypeId, TypeVarsId, UnitId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeCategory {
    Class,
    Interface,
    Enum,
    Annotation,
    Record,
    Primitive,
}

impl TypeCategory {
    pub fn keyword(self) -> &'static str {
        match self {
            TypeCategory::Class => "class",
            TypeCategory::Interface => "interface",
            TypeCategory::Enum => "enum",
            TypeCategory::Annotation => "@interface",
            TypeCategory::Record => "record",
            TypeCategory::Primitive => "",
        }
    }

    pub fn is_interface(self) -> bool {
        matches!(self, TypeCategory::Interface | TypeCategory::Annotation)
    }

    /// Categories that extend a class (explicitly or implicitly the root type).
    pub fn is_class(self) -> bool {
        matches!(
            self,
            TypeCategory::Class | TypeCategory::Enum | TypeCategory::Record
        )
    }
}

/// A declared class, interface, enum, annotation, record or primitive.
#[derive(Debug, Clone)]
pub struct RawType {
    pub(crate) name: Name,
    pub(crate) qualified_name: Name,
    pub(crate) category: TypeCategory,
    pub(crate) modifiers: Modifiers,
    pub(crate) declaring_type: Option<TypeId>,
    pub(crate) unit: Option<UnitId>,
    /// `false` for placeholders created by references to names nobody declared (yet).
    pub(crate) declared: bool,
    pub(crate) type_vars: Option<TypeVarsId>,
    pub(crate) super_types: Vec<TypeId>,
    pub(crate) fields: IndexMap<Name, FieldId>,
    pub(crate) methods: Vec<OperationId>,
    pub(crate) constructors: Vec<OperationId>,
    pub(crate) nested: IndexMap<Name, TypeId>,
    pub(crate) static_initializer: Option<String>,
    pub(crate) instance_initializer: Option<String>,
    pub(crate) origin: Option<Arc<ClassMirror>>,
}

impl RawType {
    pub(crate) fn new(qualified_name: Name, category: TypeCategory) -> Self {
        Self {
            name: Name::from(simple_name_of(&qualified_name)),
            qualified_name,
            category,
            modifiers: Modifiers::empty(),
            declaring_type: None,
            unit: None,
            declared: false,
            type_vars: None,
            super_types: Vec::new(),
            fields: IndexMap::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            nested: IndexMap::new(),
            static_initializer: None,
            instance_initializer: None,
            origin: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn category(&self) -> TypeCategory {
        self.category
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn declaring_type(&self) -> Option<TypeId> {
        self.declaring_type
    }

    pub fn unit(&self) -> Option<UnitId> {
        self.unit
    }

    pub fn is_declared(&self) -> bool {
        self.declared
    }

    /// Nested interfaces, enums, records and annotations are implicitly static.
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
            || (self.declaring_type.is_some() && self.category != TypeCategory::Class)
    }

    pub fn static_initializer(&self) -> Option<&str> {
        self.static_initializer.as_deref()
    }

    pub fn instance_initializer(&self) -> Option<&str> {
        self.instance_initializer.as_deref()
    }
}

impl CodeModel {
    pub fn raw(&self, id: TypeId) -> Option<&RawType> {
        self.kind(id).as_raw()
    }

    pub(crate) fn raw_mut(&mut self, id: TypeId) -> Option<&mut RawType> {
        match &mut self.node_mut(id).kind {
            TypeKind::Raw(raw) => Some(raw),
            _ => None,
        }
    }

    pub(crate) fn expect_raw(&self, id: TypeId) -> Result<&RawType> {
        self.raw(id).ok_or_else(|| self.not_raw_error(id))
    }

    /// Register a raw type under `qualified_name` in the context cache (first writer wins).
    pub(crate) fn register_raw(&mut self, raw: RawType) -> TypeId {
        let qualified = raw.qualified_name.clone();
        let id = self.alloc_type(TypeKind::Raw(raw));
        self.by_name.entry(qualified).or_insert(id);
        id
    }

    pub(crate) fn create_placeholder_type(&mut self, qualified_name: &str) -> TypeId {
        let mut raw = RawType::new(Name::from(qualified_name), TypeCategory::Class);
        if is_primitive(qualified_name) {
            raw.category = TypeCategory::Primitive;
            raw.declared = true;
        }
        self.register_raw(raw)
    }

    /// Declare a top-level type.
    ///
    /// A placeholder previously created by an unresolved reference to the same name is upgraded
    /// in place, so references resolved early keep pointing at the declaration.
    pub fn declare_type(
        &mut self,
        qualified_name: &str,
        category: TypeCategory,
        unit: Option<UnitId>,
    ) -> Result<TypeId> {
        let id = self.claim_declaration(qualified_name, category)?;
        if let Some(raw) = self.raw_mut(id) {
            raw.unit = unit;
        }
        if let Some(unit) = unit {
            self.units[unit.idx()].types.push(id);
        }
        Ok(id)
    }

    /// Declare `simple_name` as a member type of `outer`.
    pub fn declare_nested_type(
        &mut self,
        outer: TypeId,
        simple_name: &str,
        category: TypeCategory,
    ) -> Result<TypeId> {
        self.guard(outer.into(), "nested types")?;
        let outer_raw = self.expect_raw(outer)?;
        if outer_raw.nested.contains_key(simple_name) {
            return Err(ModelError::DuplicateMember {
                owner: outer_raw.qualified_name.to_string(),
                what: "nested type",
                name: simple_name.to_string(),
            });
        }
        let qualified = format!("{}.{simple_name}", outer_raw.qualified_name);
        let unit = outer_raw.unit;
        let id = self.claim_declaration(&qualified, category)?;
        if let Some(raw) = self.raw_mut(id) {
            raw.declaring_type = Some(outer);
            raw.unit = unit;
        }
        if let Some(outer_raw) = self.raw_mut(outer) {
            outer_raw.nested.insert(Name::from(simple_name), id);
        }
        Ok(id)
    }

    fn claim_declaration(&mut self, qualified_name: &str, category: TypeCategory) -> Result<TypeId> {
        if let Some(&existing) = self.by_name.get(qualified_name) {
            let Some(raw) = self.raw_mut(existing) else {
                return Err(ModelError::NotARawType {
                    name: qualified_name.to_string(),
                });
            };
            if raw.declared {
                return Err(ModelError::DuplicateMember {
                    owner: crate::names::qualifier_of(qualified_name)
                        .unwrap_or_default()
                        .to_string(),
                    what: "type",
                    name: qualified_name.to_string(),
                });
            }
            raw.category = category;
            raw.declared = true;
            tracing::debug!(
                target: "jmodel.types",
                name = qualified_name,
                "declaration replaces forward placeholder"
            );
            return Ok(existing);
        }

        let mut raw = RawType::new(Name::from(qualified_name), category);
        raw.declared = true;
        Ok(self.register_raw(raw))
    }

    pub fn set_modifiers(&mut self, id: TypeId, modifiers: Modifiers) -> Result<()> {
        self.guard(id.into(), "modifiers")?;
        match self.raw_mut(id) {
            Some(raw) => {
                raw.modifiers = modifiers;
                Ok(())
            }
            None => Err(self.not_raw_error(id)),
        }
    }

    pub fn set_category(&mut self, id: TypeId, category: TypeCategory) -> Result<()> {
        self.guard(id.into(), "category")?;
        match self.raw_mut(id) {
            Some(raw) => {
                raw.category = category;
                Ok(())
            }
            None => Err(self.not_raw_error(id)),
        }
    }

    pub fn set_static_initializer(&mut self, id: TypeId, body: Option<String>) -> Result<()> {
        self.guard(id.into(), "static initializer")?;
        if let Some(raw) = self.raw_mut(id) {
            raw.static_initializer = body;
        }
        Ok(())
    }

    pub fn set_instance_initializer(&mut self, id: TypeId, body: Option<String>) -> Result<()> {
        self.guard(id.into(), "instance initializer")?;
        if let Some(raw) = self.raw_mut(id) {
            raw.instance_initializer = body;
        }
        Ok(())
    }

    pub fn nested_types(&mut self, id: TypeId) -> Vec<TypeId> {
        self.ensure_initialized(NodeKey::Type(id));
        self.raw(id)
            .map(|raw| raw.nested.values().copied().collect())
            .unwrap_or_default()
    }

    pub fn nested_type(&mut self, id: TypeId, simple_name: &str) -> Option<TypeId> {
        self.ensure_initialized(NodeKey::Type(id));
        self.raw(id)?.nested.get(simple_name).copied()
    }

    pub fn declaring_type(&self, id: TypeId) -> Option<TypeId> {
        self.raw(id)?.declaring_type
    }

    pub fn is_static_type(&self, id: TypeId) -> bool {
        self.raw(id).is_some_and(RawType::is_static)
    }
}
