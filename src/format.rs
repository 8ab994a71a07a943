//! Text formats of translation files.

/// Locale-suffixed sibling files backing one store
pub mod file_set;
/// JSON translation files
pub mod json;
/// Java-style `.properties` files
pub mod properties;

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Invalid unicode escape on line {line}")]
    InvalidEscape { line: usize },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("The top-level JSON value must be an object")]
    NotAnObject,
}

/// Supported translation file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Properties,
    Json,
}

impl FileFormat {
    pub const ALL: [Self; 2] = [Self::Properties, Self::Json];

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Properties => "properties",
            Self::Json => "json",
        }
    }

    /// Infers the format from the file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        Self::ALL.into_iter().find(|format| format.extension() == extension)
    }

    /// Parses file content into key → text pairs.
    pub fn parse(self, content: &str) -> Result<BTreeMap<String, String>, FormatError> {
        match self {
            Self::Properties => properties::parse(content),
            Self::Json => json::parse(content),
        }
    }

    /// Renders key → text pairs, sorted by key.
    pub fn render(self, texts: &BTreeMap<&str, &str>) -> Result<String, FormatError> {
        match self {
            Self::Properties => Ok(properties::render(texts)),
            Self::Json => json::render(texts),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("texts/Texts.properties", Some(FileFormat::Properties))]
    #[case("texts/Texts_de.json", Some(FileFormat::Json))]
    #[case("texts/Texts.txt", None)]
    #[case("texts/Texts", None)]
    fn from_path(#[case] path: &str, #[case] expected: Option<FileFormat>) {
        assert_eq!(FileFormat::from_path(Path::new(path)), expected);
    }
}
