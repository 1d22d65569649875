pub mod loader;
pub mod schema;

pub use loader::{discover, load_from_path, load_from_str, ConfigError, DEFAULT_FILE_NAME};
pub use schema::{
    CanopyConfig, LanguageSettings, ParserSettings, QuerySettings, ValidationError,
    ValidationIssue,
};
