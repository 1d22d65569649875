//! Grammars and the registry that resolves them by name.
//!
//! There is no process-wide language table: build a [`GrammarRegistry`]
//! once and pass it to whatever needs to resolve a grammar by name or by
//! file extension.

pub mod builtin;
pub mod registry;

pub use registry::{GrammarRegistry, RegistryError};

use std::fmt;
use std::sync::Arc;
use tree_sitter::Language;

/// A named tree-sitter language plus the file extensions it claims.
///
/// Cloning is cheap; the language handle is shared.
#[derive(Clone)]
pub struct Grammar {
    name: Arc<str>,
    language: Language,
    extensions: Arc<[String]>,
}

impl Grammar {
    pub fn new(name: &str, language: Language, extensions: &[&str]) -> Self {
        Self {
            name: Arc::from(name),
            language,
            extensions: extensions.iter().map(|ext| ext.to_string()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Number of distinct node kinds the grammar defines.
    pub fn node_kind_count(&self) -> usize {
        self.language.node_kind_count()
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("name", &self.name)
            .field("extensions", &self.extensions)
            .finish()
    }
}

impl PartialEq for Grammar {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Grammar {}
