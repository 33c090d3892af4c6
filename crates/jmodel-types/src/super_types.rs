//! Declared super-types and the transitive super-type walk.

use std::collections::{HashSet, VecDeque};

use crate::generic::TypeKind;
use crate::model::CodeModel;
use crate::{ModelError, NodeKey, Result, TypeCategory, TypeId};

impl CodeModel {
    /// Direct super-types of `ty` as declared, without the implicit root superclass.
    pub fn declared_super_types(&mut self, ty: TypeId) -> Vec<TypeId> {
        self.ensure_initialized(NodeKey::Type(ty));
        self.raw(ty)
            .map(|raw| raw.super_types.clone())
            .unwrap_or_default()
    }

    /// Direct super-types of `ty`. A class-like type that declares no superclass extends the
    /// root type (unless it is the root type), listed first.
    pub fn super_types(&mut self, ty: TypeId) -> Vec<TypeId> {
        let mut supers = self.declared_super_types(ty);
        let class_like = self.raw(ty).is_some_and(|raw| raw.category.is_class());
        if !class_like || ty == self.root {
            return supers;
        }
        let mut has_superclass = false;
        for sup in &supers {
            if !self.category(*sup).is_interface() {
                has_superclass = true;
                break;
            }
        }
        if !has_superclass {
            supers.insert(0, self.root);
        }
        supers
    }

    /// Append `super_type` to the declared super-types of `ty`.
    ///
    /// A raw type cannot extend itself (a proxy wrapping it can), and at most one of the
    /// declared super-types may be a class. Source references are checked once resolved only.
    pub fn add_super_type(&mut self, ty: TypeId, super_type: TypeId) -> Result<()> {
        self.guard(ty.into(), "super types")?;
        let category = self.expect_raw(ty)?.category;
        if super_type == ty {
            return Err(ModelError::SelfSupertype {
                ty: self.describe(ty.into()),
            });
        }
        if category.is_class() && !matches!(self.kind(super_type), TypeKind::Source(_)) {
            let added = self.as_type(super_type);
            if self.is_concrete_class(added) {
                if let Some(existing) = self.declared_superclass(ty, added) {
                    return Err(ModelError::MultipleSuperclasses {
                        ty: self.describe(ty.into()),
                        existing: self.describe(existing.into()),
                        added: self.describe(added.into()),
                    });
                }
            }
        }
        self.add_super_type_unchecked(ty, super_type);
        Ok(())
    }

    /// A declared (non-source) super-type of `ty` erasing to a concrete class other than
    /// `except`.
    fn declared_superclass(&mut self, ty: TypeId, except: TypeId) -> Option<TypeId> {
        for sup in self.declared_super_types(ty) {
            if matches!(self.kind(sup), TypeKind::Source(_)) {
                continue;
            }
            let raw = self.as_type(sup);
            if raw != except && self.is_concrete_class(raw) {
                return Some(raw);
            }
        }
        None
    }

    fn is_concrete_class(&self, raw: TypeId) -> bool {
        self.raw(raw)
            .is_some_and(|raw| raw.declared && raw.category == TypeCategory::Class)
    }

    pub(crate) fn add_super_type_unchecked(&mut self, ty: TypeId, super_type: TypeId) {
        if let Some(raw) = self.raw_mut(ty) {
            raw.super_types.push(super_type);
        }
    }

    pub fn remove_super_type(&mut self, ty: TypeId, super_type: TypeId) -> Result<bool> {
        self.guard(ty.into(), "super types")?;
        let Some(raw) = self.raw_mut(ty) else {
            return Ok(false);
        };
        let before = raw.super_types.len();
        raw.super_types.retain(|sup| *sup != super_type);
        Ok(raw.super_types.len() != before)
    }

    pub fn clear_super_types(&mut self, ty: TypeId) -> Result<()> {
        self.guard(ty.into(), "super types")?;
        if let Some(raw) = self.raw_mut(ty) {
            raw.super_types.clear();
        }
        Ok(())
    }

    pub(crate) fn replace_super_type(&mut self, ty: TypeId, index: usize, super_type: TypeId) {
        if let Some(slot) = self
            .raw_mut(ty)
            .and_then(|raw| raw.super_types.get_mut(index))
        {
            *slot = super_type;
        }
    }

    /// The single class among the super-types (the root type for classes declaring none).
    pub fn superclass(&mut self, ty: TypeId) -> Option<TypeId> {
        if self.category(ty).is_interface() {
            return None;
        }
        self.super_types(ty)
            .into_iter()
            .find(|sup| !self.category(*sup).is_interface())
    }

    pub fn interfaces(&mut self, ty: TypeId) -> Vec<TypeId> {
        self.super_types(ty)
            .into_iter()
            .filter(|sup| self.category(*sup).is_interface())
            .collect()
    }

    /// Every super-type reachable from `ty`, each exactly once.
    ///
    /// Deduplication is by node identity and by raw type: once a parameterization such as
    /// `List<Text>` has been yielded, a later `List<Other>` or raw `List` is skipped along with
    /// its ancestors. Callers comparing erasures see every raw ancestor once.
    pub fn all_super_types(&mut self, ty: TypeId) -> SuperTypeWalk<'_> {
        let start = self.unwrap_proxies(ty);
        let raw = self.as_type(start);
        let first = self.super_types(raw);
        let mut visited = HashSet::new();
        visited.insert(start);
        visited.insert(raw);
        SuperTypeWalk {
            model: self,
            frames: VecDeque::from([first.into_iter()]),
            visited,
        }
    }

    /// Whether a value of `source` can be assigned to `target`, by raw type only: generic
    /// arguments are not compared.
    pub fn is_assignable_from(&mut self, target: TypeId, source: TypeId) -> bool {
        let target = self.unwrap_proxies(target);
        let source = self.unwrap_proxies(source);
        if target == source {
            return true;
        }
        let target_raw = self.as_type(target);
        let source_raw = self.as_type(source);
        if target_raw == source_raw {
            return true;
        }
        if target_raw == self.root {
            return self.category(source_raw) != TypeCategory::Primitive;
        }
        let supers: Vec<TypeId> = self.all_super_types(source_raw).collect();
        supers.into_iter().any(|sup| self.as_type(sup) == target_raw)
    }
}

/// Breadth-ordered walk over the super-type graph.
///
/// This is not a stack of per-type iterators: a depth-first walk would yield a diamond's shared
/// ancestor before the second side. For `D: B, C; B: X; C: Y` the order is `B, C, X, Y`.
///
/// Each visited type queues one frame over its own direct super-types; frames are drained
/// front to back. A type seen anywhere in the walk is never yielded again, so diamonds yield
/// the shared ancestor once (after both sides) and cycles terminate. Yielded ids have proxies
/// and source references stripped.
pub struct SuperTypeWalk<'a> {
    model: &'a mut CodeModel,
    frames: VecDeque<std::vec::IntoIter<TypeId>>,
    visited: HashSet<TypeId>,
}

impl Iterator for SuperTypeWalk<'_> {
    type Item = TypeId;

    fn next(&mut self) -> Option<TypeId> {
        loop {
            let candidate = match self.frames.front_mut()?.next() {
                Some(candidate) => candidate,
                None => {
                    self.frames.pop_front();
                    continue;
                }
            };
            let ty = self.model.unwrap_proxies(candidate);
            if !self.visited.insert(ty) {
                continue;
            }
            let raw = self.model.as_type(ty);
            let supers = if raw != ty && !self.visited.insert(raw) {
                // The raw type was already expanded through another parameterization.
                Vec::new()
            } else {
                self.model.super_types(raw)
            };
            self.frames.push_back(supers.into_iter());
            return Some(ty);
        }
    }
}
