use crate::grammar::{GrammarRegistry, RegistryError};
use crate::query::regex_cache;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CanopyConfig {
    #[serde(default)]
    pub parser: ParserSettings,
    #[serde(default)]
    pub query: QuerySettings,
    #[serde(default)]
    pub languages: LanguageSettings,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ParserSettings {
    /// Wall-clock budget per parse, in milliseconds.
    #[serde(default)]
    pub operation_limit_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct QuerySettings {
    #[serde(default)]
    pub regex_cache_capacity: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LanguageSettings {
    /// Extra file extension → grammar name mappings.
    #[serde(default)]
    pub extensions: BTreeMap<String, String>,
}

impl CanopyConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.parser.operation_limit_ms == Some(0) {
            issues.push(ValidationIssue::ZeroValue {
                field: "parser.operation_limit_ms",
            });
        }
        if self.query.regex_cache_capacity == Some(0) {
            issues.push(ValidationIssue::ZeroValue {
                field: "query.regex_cache_capacity",
            });
        }

        for (extension, grammar) in &self.languages.extensions {
            if extension.trim_start_matches('.').trim().is_empty() || grammar.trim().is_empty() {
                issues.push(ValidationIssue::EmptyName {
                    field: "languages.extensions",
                    entry: extension.clone(),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    pub fn operation_limit(&self) -> Option<Duration> {
        self.parser.operation_limit_ms.map(Duration::from_millis)
    }

    pub fn regex_cache_capacity(&self) -> usize {
        self.query
            .regex_cache_capacity
            .unwrap_or(regex_cache::DEFAULT_CAPACITY)
    }

    /// Route the configured extensions in `registry` and size this
    /// thread's regex cache.
    pub fn apply(&self, registry: &mut GrammarRegistry) -> Result<(), RegistryError> {
        for (extension, grammar) in &self.languages.extensions {
            registry.map_extension(extension, grammar)?;
        }
        regex_cache::set_capacity(self.regex_cache_capacity());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    ZeroValue { field: &'static str },
    EmptyName { field: &'static str, entry: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::ZeroValue { field } => write!(f, "'{field}' must be greater than zero"),
            ValidationIssue::EmptyName { field, entry } => {
                write!(f, "'{field}' entry '{entry}' has an empty extension or grammar name")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_maps_extensions() {
        let mut config = CanopyConfig::default();
        config
            .languages
            .extensions
            .insert("scss".to_string(), "css".to_string());

        let mut registry = GrammarRegistry::with_builtins().unwrap();
        config.apply(&mut registry).unwrap();
        assert_eq!(registry.for_extension("scss").unwrap().name(), "css");
    }

    #[test]
    fn apply_reports_unknown_grammar() {
        let mut config = CanopyConfig::default();
        config
            .languages
            .extensions
            .insert("x".to_string(), "cs".to_string());

        let mut registry = GrammarRegistry::with_builtins().unwrap();
        let err = config.apply(&mut registry).unwrap_err();
        assert!(matches!(err, RegistryError::Unknown { .. }));
    }
}
