use lasso::{Spur, ThreadedRodeo};

/// Interned string handle.
///
/// Identifiers (category and function names) and tokens share one
/// interner, so equality of either is a handle comparison.
pub type Sym = Spur;

/// An abstract or concrete identifier (category, function, language).
pub type CId = Sym;

/// A surface token as it appears in grammar sequences.
pub type Token = Sym;

/// Symbol store for interning identifiers and tokens.
///
/// Guarantees:
/// - Same string always produces same handle
/// - Different strings always produce different handles
/// - A handle can be resolved back to the original string
pub struct SymbolStore {
    rodeo: ThreadedRodeo,
}

impl SymbolStore {
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Intern a string, returning its handle.
    pub fn intern(&self, name: &str) -> Sym {
        self.rodeo.get_or_intern(name)
    }

    /// Resolve a handle back to its string.
    /// Returns None if the handle was not created by this store.
    pub fn resolve(&self, id: Sym) -> Option<&str> {
        self.rodeo.try_resolve(&id)
    }

    /// Resolve a handle, falling back to a placeholder for foreign handles.
    pub fn name(&self, id: Sym) -> &str {
        self.resolve(id).unwrap_or("<unknown>")
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rodeo.contains(name)
    }

    /// Look up a handle without interning.
    ///
    /// The parser uses this for input tokens: a string the grammar never
    /// interned cannot match any transition.
    pub fn get(&self, name: &str) -> Option<Sym> {
        self.rodeo.get(name)
    }

    /// Number of distinct strings interned so far.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
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
            .field("len", &self.len())
            .finish()
    }
}
