use crate::grammar::{builtin, Grammar};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Minimum normalized similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.6;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("grammar '{name}' is already registered")]
    Duplicate { name: String },

    #[error("extension '.{extension}' is already claimed by grammar '{owner}'")]
    ExtensionConflict { extension: String, owner: String },

    #[error("unknown grammar '{name}'{}", suggestion_suffix(.suggestion))]
    Unknown {
        name: String,
        suggestion: Option<String>,
    },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!("; did you mean '{name}'?"),
        None => String::new(),
    }
}

/// Name → grammar table, built once and passed by reference.
#[derive(Debug, Default, Clone)]
pub struct GrammarRegistry {
    grammars: BTreeMap<String, Grammar>,
    extensions: HashMap<String, String>,
}

impl GrammarRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every bundled grammar.
    pub fn with_builtins() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for grammar in builtin::all() {
            registry.register(grammar)?;
        }
        Ok(registry)
    }

    /// Add a grammar. Names and extensions must not already be taken.
    pub fn register(&mut self, grammar: Grammar) -> Result<(), RegistryError> {
        if self.grammars.contains_key(grammar.name()) {
            return Err(RegistryError::Duplicate {
                name: grammar.name().to_string(),
            });
        }
        for ext in grammar.extensions() {
            if let Some(owner) = self.extensions.get(&normalize_extension(ext)) {
                return Err(RegistryError::ExtensionConflict {
                    extension: ext.clone(),
                    owner: owner.clone(),
                });
            }
        }

        for ext in grammar.extensions() {
            self.extensions
                .insert(normalize_extension(ext), grammar.name().to_string());
        }
        debug!(grammar = grammar.name(), "registered grammar");
        self.grammars.insert(grammar.name().to_string(), grammar);
        Ok(())
    }

    /// Route an extra extension to an existing grammar, replacing any
    /// previous mapping for that extension.
    pub fn map_extension(&mut self, extension: &str, name: &str) -> Result<(), RegistryError> {
        self.get(name)?;
        self.extensions
            .insert(normalize_extension(extension), name.to_string());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Grammar, RegistryError> {
        self.grammars
            .get(name)
            .ok_or_else(|| RegistryError::Unknown {
                name: name.to_string(),
                suggestion: self.closest_name(name),
            })
    }

    pub fn for_extension(&self, extension: &str) -> Option<&Grammar> {
        self.extensions
            .get(&normalize_extension(extension))
            .and_then(|name| self.grammars.get(name))
    }

    pub fn for_path(&self, path: &Path) -> Option<&Grammar> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.for_extension(ext))
    }

    /// Grammars in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Grammar> {
        self.grammars.values()
    }

    pub fn len(&self) -> usize {
        self.grammars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grammars.is_empty()
    }

    fn closest_name(&self, name: &str) -> Option<String> {
        self.grammars
            .keys()
            .map(|candidate| (candidate, strsim::normalized_levenshtein(name, candidate)))
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(candidate, _)| candidate.clone())
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_resolve_by_name_and_extension() {
        let registry = GrammarRegistry::with_builtins().unwrap();
        assert_eq!(registry.get("css").unwrap().name(), "css");
        assert_eq!(registry.for_extension("RS").unwrap().name(), "rust");
        assert_eq!(
            registry.for_path(Path::new("notes/README.md")).unwrap().name(),
            "markdown"
        );
        assert!(registry.for_path(Path::new("Makefile")).is_none());
    }

    #[test]
    fn duplicate_registration_is_an_error() {
        let mut registry = GrammarRegistry::new();
        registry.register(builtin::go()).unwrap();

        let err = registry.register(builtin::go()).unwrap_err();
        assert_eq!(
            err,
            RegistryError::Duplicate {
                name: "go".to_string()
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn extension_conflicts_are_rejected() {
        let mut registry = GrammarRegistry::new();
        registry.register(builtin::css()).unwrap();
        let impostor = Grammar::new("css2", tree_sitter_css::LANGUAGE.into(), &[".CSS"]);

        let err = registry.register(impostor).unwrap_err();
        assert!(matches!(err, RegistryError::ExtensionConflict { owner, .. } if owner == "css"));
        assert!(registry.get("css2").is_err());
    }

    #[test]
    fn unknown_name_suggests_closest() {
        let registry = GrammarRegistry::with_builtins().unwrap();
        let err = registry.get("pyton").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown grammar 'pyton'; did you mean 'python'?"
        );

        let err = registry.get("zzzzzzzz").unwrap_err();
        assert_eq!(err.to_string(), "unknown grammar 'zzzzzzzz'");
    }

    #[test]
    fn map_extension_overrides() {
        let mut registry = GrammarRegistry::with_builtins().unwrap();
        registry.map_extension(".scss", "css").unwrap();
        assert_eq!(registry.for_extension("scss").unwrap().name(), "css");
        assert!(registry.map_extension("foo", "nope").is_err());
    }
}
