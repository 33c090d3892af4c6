use thiserror::Error;

/// Errors raised by model mutators.
///
/// All of these indicate a bug in whatever feeds the model (loader, parser, generator).
/// Resolution misses are not errors: lookups return `None` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("{kind} `{name}` is read-only: cannot modify {attribute}")]
    ReadOnly {
        kind: &'static str,
        name: String,
        attribute: &'static str,
    },
    #[error("type `{ty}` cannot declare itself as a super-type")]
    SelfSupertype { ty: String },
    #[error("type `{ty}` already extends class `{existing}`; cannot also extend `{added}`")]
    MultipleSuperclasses {
        ty: String,
        existing: String,
        added: String,
    },
    #[error("type variable `{name}` has an empty bounds list")]
    EmptyBounds { name: String },
    #[error("cannot merge {what}: left has {left} entries, right has {right}")]
    ArityMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },
    #[error("re-entrant initialization of {node}")]
    ReentrantInitialization { node: String },
    #[error("`{owner}` already declares {what} `{name}`")]
    DuplicateMember {
        owner: String,
        what: &'static str,
        name: String,
    },
    #[error("unknown type `{name}`")]
    UnknownType { name: String },
    #[error("`{name}` is not a declared type")]
    NotARawType { name: String },
    #[error("`{name}` is not a {expected}")]
    WrongKind {
        name: String,
        expected: &'static str,
    },
}

pub type Result<T, E = ModelError> = std::result::Result<T, E>;
