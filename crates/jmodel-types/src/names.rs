//! Name helpers shared by the model, the loader and the parser.

use smol_str::SmolStr;

/// An interned-ish identifier or dotted name.
pub type Name = SmolStr;

/// Name of the implicitly imported package.
pub const JAVA_LANG: &str = "java.lang";

/// The sentinel raw name of a wildcard reference (`?`).
pub const WILDCARD_NAME: &str = "?";

/// Printed in place of a reference that could not be resolved.
pub const UNDEFINED_MARKER: &str = "Undefined";

pub const PRIMITIVES: [&str; 9] = [
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

pub fn is_qualified(name: &str) -> bool {
    name.contains('.')
}

/// `java.util.Map.Entry` -> `Entry`
pub fn simple_name_of(qualified: &str) -> &str {
    qualified
        .rsplit_once('.')
        .map(|(_, simple)| simple)
        .unwrap_or(qualified)
}

/// `java.util.List` -> `java.util`
///
/// Nested types return their owner's name (`java.util.Map.Entry` -> `java.util.Map`); callers
/// that need the package must walk the declaring types first.
pub fn qualifier_of(qualified: &str) -> Option<&str> {
    qualified.rsplit_once('.').map(|(qualifier, _)| qualifier)
}

pub fn join_qualified(qualifier: Option<&str>, simple: &str) -> Name {
    match qualifier {
        Some(q) if !q.is_empty() => Name::from(format!("{q}.{simple}")),
        _ => Name::from(simple),
    }
}

/// Whether `qualified` lives directly in a package that callers may print unqualified.
pub fn is_standard_package_member(qualified: &str) -> bool {
    qualifier_of(qualified) == Some(JAVA_LANG)
}
