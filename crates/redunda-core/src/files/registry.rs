// ── Tracked file registry ──
//
// Insertion-ordered, duplicate-free set of identifiers. Internally locked
// so files can be tracked from any thread while a pass is running.

use std::sync::{PoisonError, RwLock};

use indexmap::IndexSet;

#[derive(Debug, Default)]
pub struct FileRegistry {
    files: RwLock<IndexSet<String>>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an identifier. Returns `false` if it was already tracked.
    pub fn insert(&self, identifier: impl Into<String>) -> bool {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identifier.into())
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(identifier)
    }

    /// All identifiers in the order they were first tracked.
    pub fn snapshot(&self) -> Vec<String> {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.files.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: Into<String>> FromIterator<S> for FileRegistry {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            files: RwLock::new(iter.into_iter().map(Into::into).collect()),
        }
    }
}
