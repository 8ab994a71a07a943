//! Translation units: a key with one text per language.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{
    Hash,
    Hasher,
};

use thiserror::Error;

use crate::language::Language;
use crate::store::StoreId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    #[error("Translation key must not be blank")]
    BlankKey,
}

/// Returns `Err(BlankKey)` if `key` is empty or whitespace only.
pub(crate) fn ensure_key(key: &str) -> Result<(), TranslationError> {
    if key.trim().is_empty() { Err(TranslationError::BlankKey) } else { Ok(()) }
}

/// A key and its texts.
///
/// A language missing from the text map means "not defined for that
/// language". Texts are never empty: storing an empty text removes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    key: String,
    texts: BTreeMap<Language, String>,
}

impl Translation {
    /// Creates a translation without texts.
    ///
    /// # Errors
    /// [`TranslationError::BlankKey`] if `key` is blank.
    pub fn new(key: impl Into<String>) -> Result<Self, TranslationError> {
        let key = key.into();
        ensure_key(&key)?;
        Ok(Self { key, texts: BTreeMap::new() })
    }

    /// Builder variant of [`Translation::put_text`].
    #[must_use]
    pub fn with_text(mut self, language: Language, text: impl Into<String>) -> Self {
        self.put_text(language, text);
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Renames the translation.
    ///
    /// # Errors
    /// [`TranslationError::BlankKey`] if `key` is blank; the key is left unchanged.
    pub fn set_key(&mut self, key: impl Into<String>) -> Result<(), TranslationError> {
        let key = key.into();
        ensure_key(&key)?;
        self.key = key;
        Ok(())
    }

    #[must_use]
    pub fn text(&self, language: &Language) -> Option<&str> {
        self.texts.get(language).map(String::as_str)
    }

    #[must_use]
    pub const fn texts(&self) -> &BTreeMap<Language, String> {
        &self.texts
    }

    /// Languages this translation has text for, in language order.
    pub fn languages(&self) -> impl Iterator<Item = &Language> {
        self.texts.keys()
    }

    #[must_use]
    pub fn has_texts(&self) -> bool {
        !self.texts.is_empty()
    }

    /// Sets the text of `language` and returns the previous one.
    ///
    /// An empty `text` removes the language instead.
    pub fn put_text(&mut self, language: Language, text: impl Into<String>) -> Option<String> {
        let text = text.into();
        if text.is_empty() { self.texts.remove(&language) } else { self.texts.insert(language, text) }
    }

    pub fn remove_text(&mut self, language: &Language) -> Option<String> {
        self.texts.remove(language)
    }

    /// Replaces all texts with the texts of `other`. The key is kept.
    pub(crate) fn replace_texts(&mut self, other: &Self) {
        self.texts.clone_from(&other.texts);
    }
}

/// A translation owned by a store.
///
/// Entries are identified by key and owning store: two entries with the same
/// key from different stores are different entries, and an entry keeps its
/// identity when its texts change.
#[derive(Debug, Clone)]
pub struct TranslationEntry {
    translation: Translation,
    store: StoreId,
}

impl TranslationEntry {
    #[must_use]
    pub const fn new(translation: Translation, store: StoreId) -> Self {
        Self { translation, store }
    }

    #[must_use]
    pub const fn translation(&self) -> &Translation {
        &self.translation
    }

    pub(crate) const fn translation_mut(&mut self) -> &mut Translation {
        &mut self.translation
    }

    #[must_use]
    pub fn into_translation(self) -> Translation {
        self.translation
    }

    /// The service identity of the owning store.
    #[must_use]
    pub const fn store(&self) -> &StoreId {
        &self.store
    }

    #[must_use]
    pub fn key(&self) -> &str {
        self.translation.key()
    }

    #[must_use]
    pub fn text(&self, language: &Language) -> Option<&str> {
        self.translation.text(language)
    }

    #[must_use]
    pub const fn texts(&self) -> &BTreeMap<Language, String> {
        self.translation.texts()
    }
}

impl PartialEq for TranslationEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key() && self.store == other.store
    }
}

impl Eq for TranslationEntry {}

impl Hash for TranslationEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
        self.store.hash(state);
    }
}

impl fmt::Display for TranslationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
