//! Building nodes from reflective mirrors.
//!
//! A mirrored type is registered eagerly (name, category, modifiers, enclosing type) and filled
//! lazily: type parameters, super-types and members are materialized by the lifecycle kernel the
//! first time anything reads or writes the type.

use std::sync::Arc;

use crate::members::{OperationKind, Parameter};
use crate::mirror::{ClassMirror, MethodMirror, TypeSig, TypeVarMirror};
use crate::model::CodeModel;
use crate::names::{simple_name_of, Name};
use crate::raw::RawType;
use crate::type_vars::TypeVarOwner;
use crate::{ModelError, Result, TypeId};

impl CodeModel {
    pub(crate) fn create_type_from_mirror(&mut self, mirror: Arc<ClassMirror>) -> TypeId {
        let mut raw = RawType::new(Name::from(mirror.name.as_str()), mirror.category);
        raw.modifiers = mirror.modifiers;
        raw.declared = true;
        raw.origin = Some(mirror.clone());
        let id = self.register_raw(raw);
        tracing::trace!(target: "jmodel.types", name = %mirror.name, "registered mirrored type");

        if let Some(outer_name) = &mirror.declaring_type {
            match self.get_type(outer_name) {
                Some(outer) => {
                    if let Some(raw) = self.raw_mut(id) {
                        raw.declaring_type = Some(outer);
                    }
                    if let Some(outer_raw) = self.raw_mut(outer) {
                        outer_raw
                            .nested
                            .entry(Name::from(simple_name_of(&mirror.name)))
                            .or_insert(id);
                    }
                }
                None => tracing::debug!(
                    target: "jmodel.types",
                    name = %mirror.name,
                    outer = %outer_name,
                    "enclosing type of mirrored type not found"
                ),
            }
        }
        id
    }

    pub(crate) fn fill_from_mirror(&mut self, id: TypeId, mirror: &ClassMirror) -> Result<()> {
        check_bounds(&mirror.type_params)?;
        for method in mirror.methods.iter().chain(&mirror.constructors) {
            check_bounds(&method.type_params)?;
        }

        let owner = TypeVarOwner::Type(id);
        for param in &mirror.type_params {
            self.add_type_var_unchecked(
                owner,
                Name::from(param.name.as_str()),
                Some(Arc::new(param.clone())),
            );
        }

        let scope = Some(owner);
        for sig in mirror.superclass.iter().chain(&mirror.interfaces) {
            let super_type = self.type_from_sig(sig, scope);
            self.add_super_type_unchecked(id, super_type);
        }

        for field in &mirror.fields {
            let ty = self.type_from_sig(&field.ty, scope);
            self.add_field_unchecked(id, Name::from(field.name.as_str()), ty, field.modifiers);
        }

        for method in &mirror.methods {
            self.fill_operation(id, method, OperationKind::Method);
        }
        for constructor in &mirror.constructors {
            self.fill_operation(id, constructor, OperationKind::Constructor);
        }

        tracing::debug!(
            target: "jmodel.types",
            name = %mirror.name,
            fields = mirror.fields.len(),
            methods = mirror.methods.len(),
            "filled type from mirror"
        );
        Ok(())
    }

    fn fill_operation(&mut self, ty: TypeId, mirror: &MethodMirror, kind: OperationKind) {
        let name = match kind {
            OperationKind::Method => Name::from(mirror.name.as_str()),
            OperationKind::Constructor => self
                .raw(ty)
                .map(|raw| raw.name.clone())
                .unwrap_or_else(|| Name::from(mirror.name.as_str())),
        };
        let op = self.add_operation_unchecked(ty, name, kind);
        self.operations[op.idx()].modifiers = mirror.modifiers;

        let owner = TypeVarOwner::Operation(op);
        for param in &mirror.type_params {
            self.add_type_var_unchecked(
                owner,
                Name::from(param.name.as_str()),
                Some(Arc::new(param.clone())),
            );
        }

        let scope = Some(owner);
        let params: Vec<Parameter> = mirror
            .params
            .iter()
            .enumerate()
            .map(|(index, sig)| Parameter {
                name: Name::from(format!("arg{index}")),
                ty: self.type_from_sig(sig, scope),
                varargs: false,
            })
            .collect();
        let return_type = mirror
            .return_type
            .as_ref()
            .filter(|_| kind == OperationKind::Method)
            .map(|sig| self.type_from_sig(sig, scope));
        let throws: Vec<TypeId> = mirror
            .throws
            .iter()
            .map(|sig| self.type_from_sig(sig, scope))
            .collect();

        let def = &mut self.operations[op.idx()];
        def.params = params;
        def.return_type = return_type;
        def.throws = throws;
    }

    /// Turn a reflective signature into a type node, looking type variables up from `scope`.
    pub fn type_from_sig(&mut self, sig: &TypeSig, scope: Option<TypeVarOwner>) -> TypeId {
        match sig {
            TypeSig::Class { name, args } => {
                let raw = self
                    .get_type(name)
                    .unwrap_or_else(|| self.create_placeholder_type(name));
                if args.is_empty() {
                    return raw;
                }
                let args: Vec<TypeId> = args
                    .iter()
                    .map(|arg| self.type_from_sig(arg, scope))
                    .collect();
                self.create_parameterized(raw, args)
            }
            TypeSig::Array(component) => {
                let component = self.type_from_sig(component, scope);
                self.create_array(component)
            }
            TypeSig::TypeVar(name) => {
                let var = scope.and_then(|scope| self.lookup_type_var(scope, name, true));
                var.unwrap_or_else(|| {
                    tracing::warn!(
                        target: "jmodel.types",
                        name = %name,
                        "type variable not in scope; erasing to the root type"
                    );
                    self.root
                })
            }
            TypeSig::Wildcard {
                extends,
                super_bound,
            } => match (extends, super_bound) {
                (_, Some(bound)) => self.create_wildcard_from_sig((**bound).clone(), true, scope),
                (Some(bound), None) => {
                    self.create_wildcard_from_sig((**bound).clone(), false, scope)
                }
                (None, None) => self.unbounded_wildcard,
            },
        }
    }
}

fn check_bounds(params: &[TypeVarMirror]) -> Result<()> {
    match params.iter().find(|param| param.bounds.is_empty()) {
        Some(param) => Err(ModelError::EmptyBounds {
            name: param.name.clone(),
        }),
        None => Ok(()),
    }
}
