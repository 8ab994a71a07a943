//! Translation store contracts.
//!
//! A store is a prioritized, named collection of translations. Every store
//! can be read through [`TranslationStore`]; stores that accept writes also
//! implement [`EditableTranslationStore`] and hand themselves out through
//! [`TranslationStore::as_editable_mut`].

/// Store backed by a [`backed::StoreBacking`]
pub mod backed;
/// Allow-list decorator
pub mod filtered;
/// Store priority ordering
pub mod order;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{
    ConfigError,
    MatcherError,
};
use crate::format::FormatError;
use crate::language::Language;
use crate::progress::CancellationToken;
use crate::translation::{
    Translation,
    TranslationEntry,
    TranslationError,
};

pub use backed::{
    BackedTranslationStore,
    FileTranslationStore,
    MemoryBacking,
    MemoryTranslationStore,
    StoreBacking,
    StoreContent,
};
pub use filtered::FilteredTranslationStore;
pub use order::compare_stores;

/// Identity of the service owning a store.
///
/// Cheap to clone; entries carry it as back-reference to their store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(Arc<str>);

impl StoreId {
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StoreId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Errors raised by stores, their backings and store suppliers.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Translation store '{0}' is read-only")]
    ReadOnly(StoreId),

    #[error("Key '{key}' already exists in translation store '{store}'")]
    DuplicateKey { key: String, store: StoreId },

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Failed to access translation file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse translation file '{}': {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Matcher(#[from] MatcherError),
}

/// Read access to a store.
///
/// `keys`, `entries` and `languages` are computed from the current state on
/// every call. `contains_key(k)` is always `get(k).is_some()`.
pub trait TranslationStore: fmt::Debug + Send {
    /// The owning service.
    fn service(&self) -> &StoreId;

    /// Priority. Higher orders override lower ones.
    fn order(&self) -> f64;

    fn is_editable(&self) -> bool {
        false
    }

    /// True if there are changes not yet flushed to the backing source.
    fn is_dirty(&self) -> bool {
        false
    }

    fn keys(&self) -> Box<dyn Iterator<Item = &str> + '_>;

    fn entries(&self) -> Box<dyn Iterator<Item = &TranslationEntry> + '_>;

    /// Languages this store defines texts for.
    fn languages(&self) -> Box<dyn Iterator<Item = &Language> + '_>;

    fn get(&self, key: &str) -> Option<&TranslationEntry>;

    fn text(&self, key: &str, language: &Language) -> Option<&str> {
        self.get(key).and_then(|entry| entry.text(language))
    }

    fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn contains_language(&self, language: &Language) -> bool {
        self.languages().any(|l| l == language)
    }

    fn size(&self) -> usize {
        self.keys().count()
    }

    /// Write access, if this store accepts writes.
    fn as_editable_mut(&mut self) -> Option<&mut dyn EditableTranslationStore> {
        None
    }
}

/// Write access to a store.
pub trait EditableTranslationStore: TranslationStore {
    /// Inserts the translation or replaces the texts of the existing entry.
    fn set_translation(&mut self, translation: &Translation)
    -> Result<TranslationEntry, StoreError>;

    /// Removes the entry of `key`. Absent keys are a no-op.
    fn remove_translation(&mut self, key: &str) -> Result<Option<TranslationEntry>, StoreError>;

    /// Renames an entry in place. Returns `None` if `old_key` is absent.
    fn change_key(
        &mut self,
        old_key: &str,
        new_key: &str,
    ) -> Result<Option<TranslationEntry>, StoreError>;

    /// Registers a language without any texts. Returns `false` if the
    /// language was already known.
    fn add_new_language(&mut self, language: Language) -> Result<bool, StoreError>;

    /// Persists pending changes to the backing source.
    fn flush(&mut self, token: &CancellationToken) -> Result<(), StoreError>;

    /// Discards in-memory state and re-reads the backing source.
    fn reload(&mut self, token: &CancellationToken) -> Result<(), StoreError>;
}
