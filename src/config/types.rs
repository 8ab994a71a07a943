use std::collections::BTreeMap;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "readOnlyPatterns[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Numbered list, one error per line.
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Settings of one discovery scope.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StackSettings {
    pub translation_files: TranslationFilesConfig,

    /// Paths never searched, relative to the scope root.
    pub exclude_patterns: Vec<String>,

    /// Stores whose default-language file matches are loaded read-only.
    pub read_only_patterns: Vec<String>,

    /// Priority of discovered stores without an entry in `store_orders`.
    pub default_order: f64,

    /// Priority per service name.
    pub store_orders: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslationFilesConfig {
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl StackSettings {
    /// Priority of the store of `service`.
    #[must_use]
    pub fn order_for(&self, service: &str) -> f64 {
        self.store_orders.get(service).copied().unwrap_or(self.default_order)
    }

    /// # Errors
    /// - Required field is empty
    /// - Invalid glob pattern
    /// - Non-finite order
    /// - Blank service name
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.translation_files.include_patterns.is_empty() {
            errors.push(ValidationError::new(
                "translationFiles.includePatterns",
                "At least one pattern is required. Example: [\"**/texts/**/*.properties\"]",
            ));
        }

        let pattern_lists = [
            ("translationFiles.includePatterns", &self.translation_files.include_patterns),
            ("translationFiles.excludePatterns", &self.translation_files.exclude_patterns),
            ("excludePatterns", &self.exclude_patterns),
            ("readOnlyPatterns", &self.read_only_patterns),
        ];
        for (field, patterns) in pattern_lists {
            for (index, pattern) in patterns.iter().enumerate() {
                if let Err(e) = globset::Glob::new(pattern) {
                    errors.push(ValidationError::new(
                        format!("{field}[{index}]"),
                        format!("Invalid glob pattern '{pattern}': {e}"),
                    ));
                }
            }
        }

        if !self.default_order.is_finite() {
            errors.push(ValidationError::new("defaultOrder", "The order must be a finite number"));
        }

        for (service, order) in &self.store_orders {
            if service.trim().is_empty() {
                errors.push(ValidationError::new(
                    "storeOrders",
                    "Service names cannot be blank",
                ));
            }
            if !order.is_finite() {
                errors.push(ValidationError::new(
                    format!("storeOrders.{service}"),
                    "The order must be a finite number",
                ));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl Default for TranslationFilesConfig {
    fn default() -> Self {
        Self {
            include_patterns: vec![
                "**/{texts,i18n,translations}/**/*.{properties,json}".to_string(),
            ],
            exclude_patterns: Vec::new(),
        }
    }
}

impl Default for StackSettings {
    fn default() -> Self {
        Self {
            translation_files: TranslationFilesConfig::default(),
            exclude_patterns: vec!["target/**".to_string(), "node_modules/**".to_string()],
            read_only_patterns: Vec::new(),
            default_order: 0.0,
            store_orders: BTreeMap::new(),
        }
    }
}
