//! Overlaying one declaration onto another.
//!
//! The left operand is modified in place; the right operand is only read. Anything taken over
//! from the right is copied, with references to the right type (and its type variables and
//! nested types) redirected to their left counterparts.

use crate::copy::{ItemCopy, TypeMapper};
use crate::generic::TypeKind;
use crate::members::OperationKind;
use crate::model::CodeModel;
use crate::names::simple_name_of;
use crate::type_vars::TypeVarOwner;
use crate::{ModelError, OperationId, Result, TypeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    /// The left side wins; nothing changes.
    Keep,
    /// The right side replaces the left side's declarations.
    Override,
    /// Add what the left side lacks, matching by name (or position for type variables).
    #[default]
    Merge,
}

impl CodeModel {
    /// Merge type `right` into `left`.
    pub fn merge_type(&mut self, left: TypeId, right: TypeId, strategy: MergeStrategy) -> Result<()> {
        let mut mapper = TypeMapper::new();
        self.merge_type_with(left, right, strategy, &mut mapper)
    }

    fn merge_type_with(
        &mut self,
        left: TypeId,
        right: TypeId,
        strategy: MergeStrategy,
        mapper: &mut TypeMapper,
    ) -> Result<()> {
        if strategy == MergeStrategy::Keep || left == right {
            return Ok(());
        }
        self.expect_raw(left)?;
        self.expect_raw(right)?;
        self.guard(left.into(), "members")?;
        mapper.insert(right, left);
        if strategy == MergeStrategy::Merge {
            self.map_nested_types(left, right, mapper);
        }

        self.merge_type_vars(left.into(), right.into(), strategy, mapper)?;
        self.merge_super_types(left, right, strategy, mapper)?;
        self.merge_fields(left, right, strategy, mapper)?;
        self.merge_operations(left, right, strategy, mapper)?;
        self.merge_nested_types(left, right, strategy, mapper)?;
        tracing::debug!(
            target: "jmodel.types",
            left = %self.describe(left.into()),
            ?strategy,
            "merged type"
        );
        Ok(())
    }

    /// Pair up nested types present on both sides before anything is copied.
    fn map_nested_types(&mut self, left: TypeId, right: TypeId, mapper: &mut TypeMapper) {
        for right_nested in self.nested_types(right) {
            let name = self.describe(right_nested.into());
            let simple = simple_name_of(&name).to_string();
            if let Some(left_nested) = self.nested_type(left, &simple) {
                mapper.insert(right_nested, left_nested);
                self.map_nested_types(left_nested, right_nested, mapper);
            }
        }
    }

    /// Merge the declared super-types of `right` into `left`.
    ///
    /// Under [`MergeStrategy::Merge`], entries are matched by the qualified name of their raw
    /// type. A raw left entry matched by a parameterized right entry takes the right entry.
    pub fn merge_super_types(
        &mut self,
        left: TypeId,
        right: TypeId,
        strategy: MergeStrategy,
        mapper: &mut TypeMapper,
    ) -> Result<()> {
        match strategy {
            MergeStrategy::Keep => Ok(()),
            MergeStrategy::Override => self.copy_super_types(right, left, mapper),
            MergeStrategy::Merge => {
                self.guard(left.into(), "super types")?;
                let mut left_keys = Vec::new();
                for sup in self.declared_super_types(left) {
                    let raw = self.as_type(sup);
                    left_keys.push(self.qualified_name(raw));
                }
                for sup in self.declared_super_types(right) {
                    let raw = self.as_type(sup);
                    let key = self.qualified_name(raw);
                    match left_keys.iter().position(|k| *k == key) {
                        None => {
                            let copy = self.copy_reference(sup, ItemCopy::Reference, mapper);
                            self.add_super_type_unchecked(left, copy);
                            left_keys.push(key);
                        }
                        Some(index) => {
                            let existing = self.declared_super_types(left)[index];
                            let existing = self.unwrap_proxies(existing);
                            let incoming = self.unwrap_proxies(sup);
                            if matches!(self.kind(existing), TypeKind::Raw(_))
                                && matches!(self.kind(incoming), TypeKind::Parameterized(_))
                            {
                                let copy = self.copy_reference(sup, ItemCopy::Reference, mapper);
                                self.replace_super_type(left, index, copy);
                            }
                        }
                    }
                }
                Ok(())
            }
        }
    }

    /// Merge type variables positionally.
    ///
    /// An empty side adopts the other; otherwise both sides must declare the same number of
    /// variables, and a left variable without an explicit bound takes the right one's.
    pub fn merge_type_vars(
        &mut self,
        left: TypeVarOwner,
        right: TypeVarOwner,
        strategy: MergeStrategy,
        mapper: &mut TypeMapper,
    ) -> Result<()> {
        match strategy {
            MergeStrategy::Keep => Ok(()),
            MergeStrategy::Override => {
                self.clear_type_vars(left)?;
                self.copy_type_vars(right, left, mapper)
            }
            MergeStrategy::Merge => {
                let left_vars = self.type_variables(left);
                let right_vars = self.type_variables(right);
                if right_vars.is_empty() {
                    return Ok(());
                }
                if left_vars.is_empty() {
                    return self.copy_type_vars(right, left, mapper);
                }
                if left_vars.len() != right_vars.len() {
                    return Err(ModelError::ArityMismatch {
                        what: "type variables",
                        left: left_vars.len(),
                        right: right_vars.len(),
                    });
                }
                for (l, r) in left_vars.iter().zip(&right_vars) {
                    mapper.insert(*r, *l);
                }
                for (l, r) in left_vars.into_iter().zip(right_vars) {
                    let unbounded = self
                        .type_var(l)
                        .is_some_and(|var| var.bound.is_none() && var.origin.is_none());
                    if !unbounded {
                        continue;
                    }
                    let Some(bound) = self.bound(r).filter(|b| *b != self.root) else {
                        continue;
                    };
                    let bound = self.copy_reference(bound, ItemCopy::Deep, mapper);
                    self.set_type_var_bound(l, Some(bound))?;
                }
                Ok(())
            }
        }
    }

    /// Fields are matched by name; the left field wins a match.
    pub fn merge_fields(
        &mut self,
        left: TypeId,
        right: TypeId,
        strategy: MergeStrategy,
        mapper: &mut TypeMapper,
    ) -> Result<()> {
        if strategy == MergeStrategy::Keep {
            return Ok(());
        }
        if strategy == MergeStrategy::Override {
            self.guard(left.into(), "fields")?;
            if let Some(raw) = self.raw_mut(left) {
                raw.fields.clear();
            }
        }
        for field in self.fields(right) {
            let name = self.field(field).name.clone();
            if self.field_by_name(left, &name).is_none() {
                self.copy_field(field, left, mapper)?;
            }
        }
        Ok(())
    }

    /// Methods and constructors are matched by signature (name and erased parameter types);
    /// the left operation wins a match.
    pub fn merge_operations(
        &mut self,
        left: TypeId,
        right: TypeId,
        strategy: MergeStrategy,
        mapper: &mut TypeMapper,
    ) -> Result<()> {
        if strategy == MergeStrategy::Keep {
            return Ok(());
        }
        if strategy == MergeStrategy::Override {
            self.guard(left.into(), "operations")?;
            if let Some(raw) = self.raw_mut(left) {
                raw.methods.clear();
                raw.constructors.clear();
            }
        }
        let mut existing = Vec::new();
        for op in self.constructors(left).into_iter().chain(self.methods(left)) {
            existing.push(self.merge_key(op, left));
        }
        for op in self.constructors(right).into_iter().chain(self.methods(right)) {
            let signature = self.merge_key(op, left);
            if !existing.contains(&signature) {
                self.copy_operation(op, left, mapper)?;
                existing.push(signature);
            }
        }
        Ok(())
    }

    /// Constructors are keyed under the left type's name so both sides compare equal.
    fn merge_key(&mut self, op: OperationId, left: TypeId) -> String {
        let signature = self.operation_signature(op);
        if self.operation(op).kind() == OperationKind::Constructor {
            let name = self.raw(left).map(|raw| raw.name.to_string()).unwrap_or_default();
            let params = signature.find('(').map(|i| &signature[i..]).unwrap_or("()");
            return format!("<init>{name}{params}");
        }
        signature
    }

    /// Nested types are matched by simple name and merged recursively; unmatched right types
    /// are copied in.
    pub fn merge_nested_types(
        &mut self,
        left: TypeId,
        right: TypeId,
        strategy: MergeStrategy,
        mapper: &mut TypeMapper,
    ) -> Result<()> {
        if strategy == MergeStrategy::Keep {
            return Ok(());
        }
        self.guard(left.into(), "nested types")?;
        if strategy == MergeStrategy::Override {
            if let Some(raw) = self.raw_mut(left) {
                raw.nested.clear();
            }
        }
        for right_nested in self.nested_types(right) {
            let name = self.describe(right_nested.into());
            let simple = simple_name_of(&name).to_string();
            match self.nested_type(left, &simple) {
                Some(left_nested) => {
                    self.merge_type_with(left_nested, right_nested, MergeStrategy::Merge, mapper)?;
                }
                None => {
                    let copy = self.copy_type_into(right_nested, Some(left), mapper)?;
                    if let Some(raw) = self.raw_mut(left) {
                        raw.nested.insert(simple.into(), copy);
                    }
                }
            }
        }
        Ok(())
    }
}
