//! Per-scope settings for store discovery.
/// Config file loader
mod loader;
/// Translation file pattern matcher
mod matcher;
/// Configuration types and settings
mod types;

pub use loader::{
    CONFIG_FILE_NAME,
    load_settings,
};
pub use matcher::{
    FileMatcher,
    MatcherError,
};
pub use types::{
    ConfigError,
    StackSettings,
    TranslationFilesConfig,
    ValidationError,
};
