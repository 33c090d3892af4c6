//! Reflective type metadata for the code model.
//!
//! [`MirrorIndex`] is a name-keyed set of [`ClassMirror`]s that implements the model's
//! [`TypeLoader`] seam. Mirrors come from the built-in [`MirrorIndex::minimal_jdk`] set or
//! from JSON documents (one mirror, or an array of mirrors, per document), so reflective data
//! can be supplied without a JVM.

mod jdk;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use jmodel_types::{ClassMirror, TypeLoader, TypeSig};

#[derive(Debug, Error)]
pub enum ClasspathError {
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid mirror `{name}`: {reason}")]
    InvalidMirror { name: String, reason: String },
}

pub type Result<T, E = ClasspathError> = std::result::Result<T, E>;

#[derive(Deserialize)]
#[serde(untagged)]
enum MirrorDocument {
    Many(Vec<ClassMirror>),
    One(Box<ClassMirror>),
}

#[derive(Clone, Debug, Default)]
pub struct MirrorIndex {
    mirrors: BTreeMap<String, Arc<ClassMirror>>,
}

impl MirrorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// A small built-in slice of `java.lang`, `java.util` and `java.io`; enough to resolve
    /// everyday declarations without any external metadata.
    pub fn minimal_jdk() -> Self {
        let mut index = Self::new();
        for mirror in jdk::builtin_mirrors() {
            index.mirrors.insert(mirror.name.clone(), Arc::new(mirror));
        }
        index
    }

    /// Add `mirror` after validating it. A mirror with the same name is replaced.
    pub fn insert(&mut self, mirror: ClassMirror) -> Result<()> {
        validate(&mirror)?;
        if self.mirrors.contains_key(&mirror.name) {
            tracing::debug!(target: "jmodel.classpath", name = %mirror.name, "replacing mirror");
        }
        self.mirrors.insert(mirror.name.clone(), Arc::new(mirror));
        Ok(())
    }

    /// Parse a JSON document holding one mirror or an array of mirrors. Returns how many were
    /// added.
    pub fn extend_from_json_str(&mut self, json: &str) -> Result<usize> {
        let mirrors = match serde_json::from_str::<MirrorDocument>(json)? {
            MirrorDocument::Many(mirrors) => mirrors,
            MirrorDocument::One(mirror) => vec![*mirror],
        };
        let count = mirrors.len();
        for mirror in mirrors {
            self.insert(mirror)?;
        }
        Ok(count)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut index = Self::new();
        index.extend_from_json_str(json)?;
        Ok(index)
    }

    /// Read mirrors from a JSON file into this index.
    pub fn load_json_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ClasspathError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let count = self.extend_from_json_str(&text)?;
        tracing::debug!(
            target: "jmodel.classpath",
            path = %path.display(),
            count,
            "loaded mirrors"
        );
        Ok(count)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ClassMirror>> {
        self.mirrors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.mirrors.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.mirrors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mirrors.is_empty()
    }

    /// Sorted names starting with `prefix`.
    pub fn class_names_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.mirrors
            .range(prefix.to_string()..)
            .map(|(name, _)| name)
            .take_while(|name| name.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Sorted packages of the indexed top-level types.
    pub fn packages(&self) -> Vec<String> {
        let packages: BTreeSet<&str> = self
            .mirrors
            .values()
            .filter(|mirror| mirror.declaring_type.is_none())
            .filter_map(|mirror| mirror.name.rsplit_once('.').map(|(package, _)| package))
            .collect();
        packages.into_iter().map(str::to_string).collect()
    }

    /// Box this index for [`jmodel_types::CodeModel::new`].
    pub fn into_loader(self) -> Box<dyn TypeLoader> {
        Box::new(self)
    }
}

impl TypeLoader for MirrorIndex {
    fn load(&self, qualified_name: &str) -> Option<Arc<ClassMirror>> {
        let found = self.mirrors.get(qualified_name).cloned();
        if found.is_none() {
            tracing::trace!(target: "jmodel.classpath", name = qualified_name, "no mirror");
        }
        found
    }
}

/// Consult several indexes in order; the first hit wins.
#[derive(Clone, Debug, Default)]
pub struct ChainLoader {
    indexes: Vec<Arc<MirrorIndex>>,
}

impl ChainLoader {
    pub fn new(indexes: Vec<Arc<MirrorIndex>>) -> Self {
        Self { indexes }
    }

    pub fn push(&mut self, index: Arc<MirrorIndex>) {
        self.indexes.push(index);
    }
}

impl TypeLoader for ChainLoader {
    fn load(&self, qualified_name: &str) -> Option<Arc<ClassMirror>> {
        self.indexes
            .iter()
            .find_map(|index| index.load(qualified_name))
    }
}

fn validate(mirror: &ClassMirror) -> Result<()> {
    let invalid = |reason: String| ClasspathError::InvalidMirror {
        name: mirror.name.clone(),
        reason,
    };
    if mirror.name.is_empty() || mirror.name.split('.').any(str::is_empty) {
        return Err(invalid("malformed qualified name".to_string()));
    }
    if let Some(outer) = &mirror.declaring_type {
        let nested_in_outer = mirror
            .name
            .strip_prefix(outer.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .is_some_and(|simple| !simple.is_empty() && !simple.contains('.'));
        if !nested_in_outer {
            return Err(invalid(format!("not a member type of `{outer}`")));
        }
    }
    let type_params = mirror
        .type_params
        .iter()
        .chain(mirror.methods.iter().flat_map(|m| &m.type_params))
        .chain(mirror.constructors.iter().flat_map(|c| &c.type_params));
    for param in type_params {
        if param.bounds.is_empty() {
            return Err(invalid(format!(
                "type parameter `{}` has no bounds",
                param.name
            )));
        }
    }
    if let Some(TypeSig::Class { name, .. }) = &mirror.superclass {
        if *name == mirror.name {
            return Err(invalid("extends itself".to_string()));
        }
    }
    Ok(())
}
