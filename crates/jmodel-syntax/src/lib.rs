//! Declaration-level Java source parsing into a [`CodeModel`].
//!
//! [`parse_source`] reads the shape of one compilation unit: package, imports, type
//! declarations with their type parameters and super-types, fields, methods, constructors and
//! nested types. Method bodies are skipped; initializer blocks and field initializers are kept as
//! text.
//!
//! Every type written in the source becomes a forward reference that resolves on first use, so a
//! declaration may mention types, type variables and member types declared further down the same
//! file. Malformed input produces diagnostics and a best-effort partial model instead of an
//! error.

mod lexer;
mod parser;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use jmodel_types::{CodeModel, TypeId, UnitId};

/// Half-open byte range into the parsed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextRange {
    pub start: u32,
    pub end: u32,
}

impl TextRange {
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self {
            start: start as u32,
            end: end as u32,
        }
    }

    #[inline]
    pub fn len(self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }
}

/// A syntax problem, or a model mutation the source asked for and the model refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {}..{}", range.start, range.end)]
pub struct ParseError {
    pub message: String,
    pub range: TextRange,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{count} syntax error(s), first: {first}")]
    Syntax { count: usize, first: ParseError },
}

pub type Result<T, E = SourceError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Freeze the unit's types once parsing finishes.
    pub freeze_after_parse: bool,
}

/// What a parse added to the model.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub unit: UnitId,
    /// Top-level types, in declaration order.
    pub types: Vec<TypeId>,
    pub diagnostics: Vec<ParseError>,
}

impl SourceFile {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// `Err` when the parse produced any diagnostic.
    pub fn into_result(self) -> Result<Self> {
        match self.diagnostics.first() {
            Some(first) => Err(SourceError::Syntax {
                count: self.diagnostics.len(),
                first: first.clone(),
            }),
            None => Ok(self),
        }
    }
}

/// Parse one compilation unit into `model`.
pub fn parse_source(model: &mut CodeModel, text: &str, options: &ParseOptions) -> SourceFile {
    let (tokens, mut diagnostics) = lexer::Lexer::new(text).tokenize();
    let parsed = parser::Parser::new(text, tokens, model).parse_compilation_unit();
    diagnostics.extend(parsed.errors);
    diagnostics.sort_by_key(|d| (d.range.start, d.range.end));

    for diagnostic in &diagnostics {
        tracing::warn!(
            target: "jmodel.syntax",
            start = diagnostic.range.start,
            end = diagnostic.range.end,
            "{}",
            diagnostic.message
        );
    }

    model.finish_unit(parsed.unit, options.freeze_after_parse);
    tracing::debug!(
        target: "jmodel.syntax",
        package = model.unit(parsed.unit).package().unwrap_or_default(),
        types = parsed.types.len(),
        diagnostics = diagnostics.len(),
        "parsed compilation unit"
    );

    SourceFile {
        unit: parsed.unit,
        types: parsed.types,
        diagnostics,
    }
}

/// Read `path` and parse it with [`parse_source`].
pub fn parse_file(
    model: &mut CodeModel,
    path: impl AsRef<Path>,
    options: &ParseOptions,
) -> Result<SourceFile> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_source(model, &text, options))
}
