use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub(crate) fn from_raw(raw: usize) -> Self {
                $name(u32::try_from(raw).unwrap_or(u32::MAX))
            }

            #[must_use]
            pub fn idx(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

arena_id!(
    /// Any node of the generic type hierarchy.
    TypeId
);
arena_id!(
    /// An ordered type-variable container.
    TypeVarsId
);
arena_id!(FieldId);
arena_id!(
    /// A method or constructor.
    OperationId
);
arena_id!(UnitId);

/// Identifies any node that carries a [`crate::Lifecycle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Type(TypeId),
    TypeVars(TypeVarsId),
    Field(FieldId),
    Operation(OperationId),
}

impl From<TypeId> for NodeKey {
    fn from(id: TypeId) -> Self {
        NodeKey::Type(id)
    }
}

impl From<TypeVarsId> for NodeKey {
    fn from(id: TypeVarsId) -> Self {
        NodeKey::TypeVars(id)
    }
}

impl From<FieldId> for NodeKey {
    fn from(id: FieldId) -> Self {
        NodeKey::Field(id)
    }
}

impl From<OperationId> for NodeKey {
    fn from(id: OperationId) -> Self {
        NodeKey::Operation(id)
    }
}
