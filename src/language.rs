//! Locale tags used to address the text of a translation.

/// Display names for language and region codes
mod names;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Literal that parses to [`Language::Default`].
pub const DEFAULT_MARKER: &str = "default";

/// Errors raised by [`Language::parse_strict`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LanguageError {
    #[error("Language tag must not be blank")]
    Blank,

    #[error("Invalid language tag '{0}'. Expected language[_REGION[_VARIANT]], e.g. \"de_CH\"")]
    Invalid(String),
}

/// A language tag.
///
/// `Default` stands for "no specific locale" and is the text every other
/// language falls back to. All other tags wrap a [`Locale`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Language {
    Default,
    Locale(Locale),
}

/// Language, region and variant parts of a non-default [`Language`].
///
/// The language is stored lowercase and the region uppercase, so two locales
/// are equal iff their identifiers are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    language: String,
    region: Option<String>,
    variant: Option<String>,
}

impl Locale {
    /// Parses `language[_REGION[_VARIANT]]`; `-` is accepted as separator.
    fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split(['_', '-']);

        let language = parts.next().filter(|part| is_language_code(part))?.to_ascii_lowercase();

        let region = match parts.next() {
            None => None,
            Some(part) if is_region_code(part) => Some(part.to_ascii_uppercase()),
            Some(_) => return None,
        };

        let variant = match parts.next() {
            None => None,
            Some(part) if is_variant(part) => Some(part.to_string()),
            Some(_) => return None,
        };

        if parts.next().is_some() {
            return None;
        }

        Some(Self { language, region, variant })
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    #[must_use]
    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    /// English display name, e.g. `German (Switzerland)`.
    #[must_use]
    pub fn display_name(&self) -> String {
        let base = names::language_name(&self.language).unwrap_or(&self.language);

        let qualifiers: Vec<&str> = self
            .region
            .as_deref()
            .map(|region| names::region_name(region).unwrap_or(region))
            .into_iter()
            .chain(self.variant.as_deref())
            .collect();

        if qualifiers.is_empty() {
            base.to_string()
        } else {
            format!("{base} ({})", qualifiers.join(", "))
        }
    }

    /// Identifier parts used to break ties between equal display names.
    fn identifier(&self) -> (&str, Option<&str>, Option<&str>) {
        (&self.language, self.region.as_deref(), self.variant.as_deref())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.language)?;
        if let Some(region) = &self.region {
            write!(f, "_{region}")?;
        }
        if let Some(variant) = &self.variant {
            write!(f, "_{variant}")?;
        }
        Ok(())
    }
}

/// 2-8 ASCII letters.
fn is_language_code(part: &str) -> bool {
    (2..=8).contains(&part.len()) && part.chars().all(|c| c.is_ascii_alphabetic())
}

/// 2 ASCII letters or a 3 digit UN M.49 area code.
fn is_region_code(part: &str) -> bool {
    (part.len() == 2 && part.chars().all(|c| c.is_ascii_alphabetic()))
        || (part.len() == 3 && part.chars().all(|c| c.is_ascii_digit()))
}

fn is_variant(part: &str) -> bool {
    (1..=8).contains(&part.len()) && part.chars().all(|c| c.is_ascii_alphanumeric())
}

impl Language {
    /// Tolerant parse.
    ///
    /// Returns `None` for blank or malformed input, [`Language::Default`] for
    /// the `default` marker and a locale tag otherwise.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        Self::parse_strict(text).ok()
    }

    /// Strict parse.
    ///
    /// # Errors
    /// - [`LanguageError::Blank`] for blank input
    /// - [`LanguageError::Invalid`] when the text is not `language[_REGION[_VARIANT]]`
    pub fn parse_strict(text: &str) -> Result<Self, LanguageError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(LanguageError::Blank);
        }
        if trimmed.eq_ignore_ascii_case(DEFAULT_MARKER) {
            return Ok(Self::Default);
        }
        Locale::parse(trimmed)
            .map(Self::Locale)
            .ok_or_else(|| LanguageError::Invalid(trimmed.to_string()))
    }

    /// Parses the locale suffix of a translation file name (`de`, `de_CH`).
    ///
    /// Only known language codes are accepted so that file names such as
    /// `Shared_texts` are not mistaken for a locale sibling.
    #[must_use]
    pub fn from_file_suffix(suffix: &str) -> Option<Self> {
        let locale = Locale::parse(suffix)?;
        if locale.variant.is_some() || !names::is_known_language(&locale.language) {
            return None;
        }
        Some(Self::Locale(locale))
    }

    #[must_use]
    pub const fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    #[must_use]
    pub const fn locale(&self) -> Option<&Locale> {
        match self {
            Self::Default => None,
            Self::Locale(locale) => Some(locale),
        }
    }

    /// Human readable name used for sorting.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            Self::Default => "Default".to_string(),
            Self::Locale(locale) => locale.display_name(),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str(DEFAULT_MARKER),
            Self::Locale(locale) => locale.fmt(f),
        }
    }
}

impl FromStr for Language {
    type Err = LanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_strict(s)
    }
}

impl Ord for Language {
    /// `Default` first, then by display name ignoring case.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Default, Self::Default) => Ordering::Equal,
            (Self::Default, Self::Locale(_)) => Ordering::Less,
            (Self::Locale(_), Self::Default) => Ordering::Greater,
            (Self::Locale(a), Self::Locale(b)) => a
                .display_name()
                .to_lowercase()
                .cmp(&b.display_name().to_lowercase())
                .then_with(|| a.identifier().cmp(&b.identifier())),
        }
    }
}

impl PartialOrd for Language {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
