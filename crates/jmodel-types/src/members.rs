//! Fields, methods and constructors.

use crate::generic::ReferenceMeta;
use crate::model::CodeModel;
use crate::names::Name;
use crate::{
    FieldId, Lifecycle, ModelError, Modifiers, NodeKey, OperationId, Result, TypeId, TypeVarsId,
};

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub(crate) name: Name,
    pub(crate) ty: TypeId,
    pub(crate) modifiers: Modifiers,
    pub(crate) declaring_type: TypeId,
    /// Initializer expression text, if any.
    pub(crate) initializer: Option<String>,
    pub(crate) meta: ReferenceMeta,
    pub(crate) lifecycle: Lifecycle,
}

impl FieldDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> TypeId {
        self.ty
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn declaring_type(&self) -> TypeId {
        self.declaring_type
    }

    pub fn initializer(&self) -> Option<&str> {
        self.initializer.as_deref()
    }

    pub fn meta(&self) -> &ReferenceMeta {
        &self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Method,
    Constructor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: Name,
    pub ty: TypeId,
    pub varargs: bool,
}

#[derive(Debug, Clone)]
pub struct OperationDef {
    pub(crate) name: Name,
    pub(crate) kind: OperationKind,
    pub(crate) modifiers: Modifiers,
    pub(crate) declaring_type: TypeId,
    pub(crate) type_vars: Option<TypeVarsId>,
    pub(crate) params: Vec<Parameter>,
    /// `None` for constructors.
    pub(crate) return_type: Option<TypeId>,
    pub(crate) throws: Vec<TypeId>,
    pub(crate) meta: ReferenceMeta,
    pub(crate) lifecycle: Lifecycle,
}

impl OperationDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn declaring_type(&self) -> TypeId {
        self.declaring_type
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn return_type(&self) -> Option<TypeId> {
        self.return_type
    }

    pub fn throws(&self) -> &[TypeId] {
        &self.throws
    }

    pub fn meta(&self) -> &ReferenceMeta {
        &self.meta
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }
}

impl CodeModel {
    pub fn field(&self, id: FieldId) -> &FieldDef {
        &self.fields[id.idx()]
    }

    pub fn operation(&self, id: OperationId) -> &OperationDef {
        &self.operations[id.idx()]
    }

    pub fn fields(&mut self, ty: TypeId) -> Vec<FieldId> {
        self.ensure_initialized(NodeKey::Type(ty));
        self.raw(ty)
            .map(|raw| raw.fields.values().copied().collect())
            .unwrap_or_default()
    }

    pub fn field_by_name(&mut self, ty: TypeId, name: &str) -> Option<FieldId> {
        self.ensure_initialized(NodeKey::Type(ty));
        self.raw(ty)?.fields.get(name).copied()
    }

    pub fn methods(&mut self, ty: TypeId) -> Vec<OperationId> {
        self.ensure_initialized(NodeKey::Type(ty));
        self.raw(ty).map(|raw| raw.methods.clone()).unwrap_or_default()
    }

    pub fn constructors(&mut self, ty: TypeId) -> Vec<OperationId> {
        self.ensure_initialized(NodeKey::Type(ty));
        self.raw(ty)
            .map(|raw| raw.constructors.clone())
            .unwrap_or_default()
    }

    pub fn add_field(&mut self, ty: TypeId, name: &str, field_type: TypeId) -> Result<FieldId> {
        self.guard(ty.into(), "fields")?;
        let raw = self.expect_raw(ty)?;
        if raw.fields.contains_key(name) {
            return Err(ModelError::DuplicateMember {
                owner: raw.qualified_name.to_string(),
                what: "field",
                name: name.to_string(),
            });
        }
        Ok(self.add_field_unchecked(ty, Name::from(name), field_type, Modifiers::empty()))
    }

    pub(crate) fn add_field_unchecked(
        &mut self,
        ty: TypeId,
        name: Name,
        field_type: TypeId,
        modifiers: Modifiers,
    ) -> FieldId {
        let id = FieldId::from_raw(self.fields.len());
        self.fields.push(FieldDef {
            name: name.clone(),
            ty: field_type,
            modifiers,
            declaring_type: ty,
            initializer: None,
            meta: ReferenceMeta::default(),
            lifecycle: Lifecycle::new(),
        });
        if let Some(raw) = self.raw_mut(ty) {
            raw.fields.insert(name, id);
        }
        id
    }

    pub fn remove_field(&mut self, ty: TypeId, name: &str) -> Result<Option<FieldId>> {
        self.guard(ty.into(), "fields")?;
        Ok(self
            .raw_mut(ty)
            .and_then(|raw| raw.fields.shift_remove(name)))
    }

    pub fn set_field_type(&mut self, field: FieldId, ty: TypeId) -> Result<()> {
        self.guard(field.into(), "type")?;
        self.fields[field.idx()].ty = ty;
        Ok(())
    }

    pub fn set_field_modifiers(&mut self, field: FieldId, modifiers: Modifiers) -> Result<()> {
        self.guard(field.into(), "modifiers")?;
        self.fields[field.idx()].modifiers = modifiers;
        Ok(())
    }

    pub fn set_field_initializer(&mut self, field: FieldId, text: Option<String>) -> Result<()> {
        self.guard(field.into(), "initializer")?;
        self.fields[field.idx()].initializer = text;
        Ok(())
    }

    pub fn set_field_comment(&mut self, field: FieldId, comment: Option<String>) -> Result<()> {
        self.guard(field.into(), "comment")?;
        self.fields[field.idx()].meta.comment = comment;
        Ok(())
    }

    pub fn add_method(&mut self, ty: TypeId, name: &str) -> Result<OperationId> {
        self.guard(ty.into(), "methods")?;
        self.expect_raw(ty)?;
        Ok(self.add_operation_unchecked(ty, Name::from(name), OperationKind::Method))
    }

    pub fn add_constructor(&mut self, ty: TypeId) -> Result<OperationId> {
        self.guard(ty.into(), "constructors")?;
        let name = self.expect_raw(ty)?.name.clone();
        Ok(self.add_operation_unchecked(ty, name, OperationKind::Constructor))
    }

    pub(crate) fn add_operation_unchecked(
        &mut self,
        ty: TypeId,
        name: Name,
        kind: OperationKind,
    ) -> OperationId {
        let id = OperationId::from_raw(self.operations.len());
        self.operations.push(OperationDef {
            name,
            kind,
            modifiers: Modifiers::empty(),
            declaring_type: ty,
            type_vars: None,
            params: Vec::new(),
            return_type: None,
            throws: Vec::new(),
            meta: ReferenceMeta::default(),
            lifecycle: Lifecycle::new(),
        });
        if let Some(raw) = self.raw_mut(ty) {
            match kind {
                OperationKind::Method => raw.methods.push(id),
                OperationKind::Constructor => raw.constructors.push(id),
            }
        }
        id
    }

    pub fn set_operation_name(&mut self, op: OperationId, name: &str) -> Result<()> {
        self.guard(op.into(), "name")?;
        self.operations[op.idx()].name = Name::from(name);
        Ok(())
    }

    /// Switch an operation between method and constructor, moving it to the matching list of
    /// its declaring type. Constructors drop their return type.
    pub fn set_operation_kind(&mut self, op: OperationId, kind: OperationKind) -> Result<()> {
        self.guard(op.into(), "kind")?;
        if self.operations[op.idx()].kind == kind {
            return Ok(());
        }
        let ty = self.operations[op.idx()].declaring_type;
        self.guard(ty.into(), "operations")?;
        let def = &mut self.operations[op.idx()];
        def.kind = kind;
        if kind == OperationKind::Constructor {
            def.return_type = None;
        }
        if let Some(raw) = self.raw_mut(ty) {
            raw.methods.retain(|m| *m != op);
            raw.constructors.retain(|c| *c != op);
            match kind {
                OperationKind::Method => raw.methods.push(op),
                OperationKind::Constructor => raw.constructors.push(op),
            }
        }
        Ok(())
    }

    pub fn set_operation_modifiers(&mut self, op: OperationId, modifiers: Modifiers) -> Result<()> {
        self.guard(op.into(), "modifiers")?;
        self.operations[op.idx()].modifiers = modifiers;
        Ok(())
    }

    pub fn set_operation_comment(&mut self, op: OperationId, comment: Option<String>) -> Result<()> {
        self.guard(op.into(), "comment")?;
        self.operations[op.idx()].meta.comment = comment;
        Ok(())
    }

    pub fn set_return_type(&mut self, op: OperationId, ty: Option<TypeId>) -> Result<()> {
        self.guard(op.into(), "return type")?;
        self.operations[op.idx()].return_type = ty;
        Ok(())
    }

    pub fn add_parameter(
        &mut self,
        op: OperationId,
        name: &str,
        ty: TypeId,
        varargs: bool,
    ) -> Result<()> {
        self.guard(op.into(), "parameters")?;
        self.operations[op.idx()].params.push(Parameter {
            name: Name::from(name),
            ty,
            varargs,
        });
        Ok(())
    }

    pub fn add_thrown_type(&mut self, op: OperationId, ty: TypeId) -> Result<()> {
        self.guard(op.into(), "exceptions")?;
        self.operations[op.idx()].throws.push(ty);
        Ok(())
    }

    /// `name(erased parameter types)`; the key used to match operations when merging.
    pub fn operation_signature(&mut self, op: OperationId) -> String {
        let def = self.operation(op).clone();
        let params: Vec<String> = def
            .params
            .iter()
            .map(|param| {
                let mut name = self.erased_name(param.ty);
                if param.varargs && self.component_type(param.ty).is_none() {
                    name.push_str("[]");
                }
                name
            })
            .collect();
        format!("{}({})", def.name, params.join(","))
    }

    fn erased_name(&mut self, ty: TypeId) -> String {
        match self.component_type(ty) {
            Some(component) => format!("{}[]", self.erased_name(component)),
            None => {
                let raw = self.as_type(ty);
                self.qualified_name(raw)
            }
        }
    }
}
