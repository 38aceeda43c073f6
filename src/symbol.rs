use lasso::{Spur, ThreadedRodeo};

/// Interned identifier for a name: a predicate, a string constant,
/// or a variable name. Comparing two `SymId`s compares the names.
pub type SymId = Spur;

/// Thread-safe store interning every name the engine touches.
///
/// Guarantees:
/// - Same string always produces the same SymId
/// - Different strings always produce different SymIds
/// - A SymId can be resolved back to its string
pub struct SymbolStore {
    rodeo: ThreadedRodeo,
}

impl SymbolStore {
    /// Create a new empty symbol store.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Intern a name, returning its unique SymId.
    /// If the name was already interned, returns the existing SymId.
    pub fn intern(&self, name: &str) -> SymId {
        self.rodeo.get_or_intern(name)
    }

    /// Resolve a SymId back to its string representation.
    /// Returns None if the SymId was not created by this store.
    pub fn resolve(&self, id: SymId) -> Option<&str> {
        self.rodeo.try_resolve(&id)
    }

    /// Get the SymId for a name if it exists, without interning.
    pub fn get(&self, name: &str) -> Option<SymId> {
        self.rodeo.get(name)
    }
}

impl Default for SymbolStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SymbolStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolStore")
            .field("len", &self.rodeo.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_same_name_returns_same_id() {
        let store = SymbolStore::new();
        let id1 = store.intern("parent");
        let id2 = store.intern("parent");
        assert_eq!(id1, id2);
    }

    #[test]
    fn intern_different_names_returns_different_ids() {
        let store = SymbolStore::new();
        let id1 = store.intern("parent");
        let id2 = store.intern("ancestor");
        assert_ne!(id1, id2);
    }

    #[test]
    fn resolve_returns_original_name() {
        let store = SymbolStore::new();
        let id = store.intern("socrates");
        assert_eq!(store.resolve(id), Some("socrates"));
    }

    #[test]
    fn get_without_interning() {
        let store = SymbolStore::new();
        let id = store.intern("foo");
        assert_eq!(store.get("foo"), Some(id));
        assert_eq!(store.get("bar"), None);
    }

    #[test]
    fn names_are_case_sensitive() {
        let store = SymbolStore::new();
        // "x" the constant and "X" the variable name must not collide
        assert_ne!(store.intern("x"), store.intern("X"));
    }

    #[test]
    fn empty_and_non_alphanumeric_names() {
        let store = SymbolStore::new();
        let empty = store.intern("");
        let spaced = store.intern("hello world");
        assert_eq!(store.resolve(empty), Some(""));
        assert_eq!(store.resolve(spaced), Some("hello world"));
    }

    #[test]
    fn concurrent_intern_same_name() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(SymbolStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.intern("shared"))
            })
            .collect();

        let ids: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for id in &ids {
            assert_eq!(*id, ids[0]);
        }
    }
}
