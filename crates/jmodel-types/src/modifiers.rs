use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Declaration modifiers, in source order of [`Modifiers::KEYWORDS`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Modifiers: u16 {
        const PUBLIC = 1 << 0;
        const PROTECTED = 1 << 1;
        const PRIVATE = 1 << 2;
        const ABSTRACT = 1 << 3;
        const STATIC = 1 << 4;
        const FINAL = 1 << 5;
        const SEALED = 1 << 6;
        const NON_SEALED = 1 << 7;
        const DEFAULT = 1 << 8;
        const SYNCHRONIZED = 1 << 9;
        const NATIVE = 1 << 10;
        const TRANSIENT = 1 << 11;
        const VOLATILE = 1 << 12;
        const STRICTFP = 1 << 13;
    }
}

impl Modifiers {
    pub const KEYWORDS: [(Modifiers, &'static str); 14] = [
        (Modifiers::PUBLIC, "public"),
        (Modifiers::PROTECTED, "protected"),
        (Modifiers::PRIVATE, "private"),
        (Modifiers::ABSTRACT, "abstract"),
        (Modifiers::STATIC, "static"),
        (Modifiers::FINAL, "final"),
        (Modifiers::SEALED, "sealed"),
        (Modifiers::NON_SEALED, "non-sealed"),
        (Modifiers::DEFAULT, "default"),
        (Modifiers::SYNCHRONIZED, "synchronized"),
        (Modifiers::NATIVE, "native"),
        (Modifiers::TRANSIENT, "transient"),
        (Modifiers::VOLATILE, "volatile"),
        (Modifiers::STRICTFP, "strictfp"),
    ];

    pub fn from_keyword(keyword: &str) -> Option<Modifiers> {
        Self::KEYWORDS
            .iter()
            .find(|(_, kw)| *kw == keyword)
            .map(|(flag, _)| *flag)
    }

    pub fn keywords(self) -> impl Iterator<Item = &'static str> {
        Self::KEYWORDS
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, kw)| kw)
    }

    pub fn is_static(self) -> bool {
        self.contains(Modifiers::STATIC)
    }
}
