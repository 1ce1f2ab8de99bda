//! String interning for GraphQL names.

use rustc_hash::FxHashMap;
use std::cell::RefCell;

/// An interned name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Text(u32);

impl Text {
    /// Creates a text from a raw index.
    #[must_use]
    pub const fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }
}

/// Names that show up in nearly every document.
const PRELUDE: &[&str] = &[
    "Int",
    "Float",
    "String",
    "Boolean",
    "ID",
    "Query",
    "Mutation",
    "Subscription",
    "__typename",
    "skip",
    "include",
    "if",
    "deprecated",
    "reason",
];

/// Deduplicates names seen by the lexer.
///
/// Interners are per document and single-threaded; executors lower the
/// parsed document into owned strings before any async work.
#[derive(Debug)]
pub struct Interner {
    map: RefCell<FxHashMap<String, Text>>,
    strings: RefCell<Vec<String>>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    /// Creates an interner with the common GraphQL names pre-registered.
    #[must_use]
    pub fn new() -> Self {
        let interner = Self {
            map: RefCell::new(FxHashMap::default()),
            strings: RefCell::new(Vec::with_capacity(PRELUDE.len() * 4)),
        };
        for name in PRELUDE {
            interner.intern(name);
        }
        interner
    }

    /// Interns a string, returning its identifier.
    pub fn intern(&self, s: &str) -> Text {
        if let Some(&id) = self.map.borrow().get(s) {
            return id;
        }

        let mut strings = self.strings.borrow_mut();
        let id = Text(u32::try_from(strings.len()).unwrap_or(u32::MAX));
        strings.push(s.to_string());
        self.map.borrow_mut().insert(s.to_string(), id);
        id
    }

    /// Looks up an already interned string without inserting it.
    #[must_use]
    pub fn lookup(&self, s: &str) -> Option<Text> {
        self.map.borrow().get(s).copied()
    }

    /// Gets the string for an identifier.
    #[must_use]
    pub fn get(&self, id: Text) -> String {
        self.strings
            .borrow()
            .get(id.0 as usize)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns true if the identifier's string equals `s`.
    #[must_use]
    pub fn is(&self, id: Text, s: &str) -> bool {
        self.strings
            .borrow()
            .get(id.0 as usize)
            .is_some_and(|stored| stored == s)
    }

    /// Returns the number of interned strings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.borrow().len()
    }

    /// Returns true if no strings are interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedupes() {
        let interner = Interner::new();
        let a = interner.intern("user");
        let b = interner.intern("user");
        let c = interner.intern("pets");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.get(c), "pets");
    }

    #[test]
    fn test_prelude_is_registered() {
        let interner = Interner::new();
        let before = interner.len();
        let typename = interner.intern("__typename");

        assert_eq!(interner.len(), before);
        assert!(interner.is(typename, "__typename"));
        assert_eq!(interner.lookup("Query"), Some(interner.intern("Query")));
        assert_eq!(interner.lookup("Nope"), None);
    }
}
