//! Stores whose content is loaded from and flushed to a backing source.

use std::collections::{
    BTreeMap,
    BTreeSet,
};
use std::fmt;

use super::{
    EditableTranslationStore,
    StoreError,
    StoreId,
    TranslationStore,
};
use crate::format::file_set::FileSetBacking;
use crate::language::Language;
use crate::progress::CancellationToken;
use crate::translation::{
    Translation,
    TranslationEntry,
    ensure_key,
};

/// Content exchanged between a store and its backing source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreContent {
    /// Declared languages. Always contains the languages of all translations.
    pub languages: BTreeSet<Language>,
    /// Translations by key.
    pub translations: BTreeMap<String, Translation>,
}

impl StoreContent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a translation and declares its languages.
    pub fn insert(&mut self, translation: Translation) {
        self.languages.extend(translation.languages().cloned());
        self.translations.insert(translation.key().to_string(), translation);
    }

    /// Key → text pairs of one language, omitting keys without text.
    #[must_use]
    pub fn texts_of(&self, language: &Language) -> BTreeMap<&str, &str> {
        self.translations
            .values()
            .filter_map(|t| t.text(language).map(|text| (t.key(), text)))
            .collect()
    }

    /// Keys of translations without any text.
    pub fn untranslated_keys(&self) -> impl Iterator<Item = &str> {
        self.translations.values().filter(|t| !t.has_texts()).map(Translation::key)
    }
}

impl FromIterator<Translation> for StoreContent {
    fn from_iter<T: IntoIterator<Item = Translation>>(iter: T) -> Self {
        let mut content = Self::new();
        for translation in iter {
            content.insert(translation);
        }
        content
    }
}

/// External source a [`BackedTranslationStore`] is loaded from and flushed to.
pub trait StoreBacking: fmt::Debug + Send {
    fn load(&self, token: &CancellationToken) -> Result<StoreContent, StoreError>;

    fn persist(&mut self, content: &StoreContent, token: &CancellationToken)
    -> Result<(), StoreError>;
}

/// Backing that keeps the last persisted content in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryBacking {
    content: StoreContent,
    persist_count: usize,
}

impl MemoryBacking {
    #[must_use]
    pub const fn new(content: StoreContent) -> Self {
        Self { content, persist_count: 0 }
    }

    /// Content as of the last persist.
    #[must_use]
    pub const fn content(&self) -> &StoreContent {
        &self.content
    }

    #[must_use]
    pub const fn persist_count(&self) -> usize {
        self.persist_count
    }
}

impl StoreBacking for MemoryBacking {
    fn load(&self, token: &CancellationToken) -> Result<StoreContent, StoreError> {
        token.check()?;
        Ok(self.content.clone())
    }

    fn persist(
        &mut self,
        content: &StoreContent,
        token: &CancellationToken,
    ) -> Result<(), StoreError> {
        token.check()?;
        self.content.clone_from(content);
        self.persist_count += 1;
        Ok(())
    }
}

/// In-memory translation table kept in sync with a [`StoreBacking`].
#[derive(Debug)]
pub struct BackedTranslationStore<B> {
    service: StoreId,
    order: f64,
    editable: bool,
    backing: B,
    entries: BTreeMap<String, TranslationEntry>,
    languages: BTreeSet<Language>,
    dirty: bool,
}

pub type MemoryTranslationStore = BackedTranslationStore<MemoryBacking>;

pub type FileTranslationStore = BackedTranslationStore<FileSetBacking>;

impl<B: StoreBacking> BackedTranslationStore<B> {
    /// Loads a store from `backing`.
    ///
    /// # Errors
    /// Whatever [`StoreBacking::load`] reports.
    pub fn open(
        service: StoreId,
        order: f64,
        editable: bool,
        backing: B,
        token: &CancellationToken,
    ) -> Result<Self, StoreError> {
        let content = backing.load(token)?;
        let mut store = Self {
            service,
            order,
            editable,
            backing,
            entries: BTreeMap::new(),
            languages: BTreeSet::new(),
            dirty: false,
        };
        store.apply(content);
        tracing::debug!(service = %store.service, size = store.entries.len(), "Opened translation store");
        Ok(store)
    }

    #[must_use]
    pub const fn backing(&self) -> &B {
        &self.backing
    }

    /// Replaces the in-memory state with `content` and clears dirtiness.
    fn apply(&mut self, content: StoreContent) {
        self.languages = content.languages;
        self.entries = content
            .translations
            .into_values()
            .map(|translation| {
                self.languages.extend(translation.languages().cloned());
                (translation.key().to_string(), TranslationEntry::new(translation, self.service.clone()))
            })
            .collect();
        self.dirty = false;
    }

    fn snapshot(&self) -> StoreContent {
        StoreContent {
            languages: self.languages.clone(),
            translations: self
                .entries
                .iter()
                .map(|(key, entry)| (key.clone(), entry.translation().clone()))
                .collect(),
        }
    }

    fn ensure_editable(&self) -> Result<(), StoreError> {
        if self.editable { Ok(()) } else { Err(StoreError::ReadOnly(self.service.clone())) }
    }
}

impl MemoryTranslationStore {
    /// Store over a [`MemoryBacking`] holding `content`.
    #[must_use]
    pub fn in_memory(
        service: impl Into<StoreId>,
        order: f64,
        editable: bool,
        content: StoreContent,
    ) -> Self {
        let service = service.into();
        let mut store = Self {
            service,
            order,
            editable,
            backing: MemoryBacking::new(content.clone()),
            entries: BTreeMap::new(),
            languages: BTreeSet::new(),
            dirty: false,
        };
        store.apply(content);
        store
    }
}

impl<B: StoreBacking> TranslationStore for BackedTranslationStore<B> {
    fn service(&self) -> &StoreId {
        &self.service
    }

    fn order(&self) -> f64 {
        self.order
    }

    fn is_editable(&self) -> bool {
        self.editable
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn keys(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.entries.keys().map(String::as_str))
    }

    fn entries(&self) -> Box<dyn Iterator<Item = &TranslationEntry> + '_> {
        Box::new(self.entries.values())
    }

    fn languages(&self) -> Box<dyn Iterator<Item = &Language> + '_> {
        Box::new(self.languages.iter())
    }

    fn get(&self, key: &str) -> Option<&TranslationEntry> {
        self.entries.get(key)
    }

    fn contains_language(&self, language: &Language) -> bool {
        self.languages.contains(language)
    }

    fn size(&self) -> usize {
        self.entries.len()
    }

    fn as_editable_mut(&mut self) -> Option<&mut dyn EditableTranslationStore> {
        if self.editable { Some(self) } else { None }
    }
}

impl<B: StoreBacking> EditableTranslationStore for BackedTranslationStore<B> {
    fn set_translation(
        &mut self,
        translation: &Translation,
    ) -> Result<TranslationEntry, StoreError> {
        self.ensure_editable()?;

        let entry = if let Some(entry) = self.entries.get_mut(translation.key()) {
            if entry.texts() != translation.texts() {
                entry.translation_mut().replace_texts(translation);
                self.dirty = true;
            }
            entry.clone()
        } else {
            let entry = TranslationEntry::new(translation.clone(), self.service.clone());
            self.entries.insert(translation.key().to_string(), entry.clone());
            self.dirty = true;
            entry
        };

        self.languages.extend(translation.languages().cloned());
        Ok(entry)
    }

    fn remove_translation(&mut self, key: &str) -> Result<Option<TranslationEntry>, StoreError> {
        self.ensure_editable()?;

        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.dirty = true;
        }
        Ok(removed)
    }

    fn change_key(
        &mut self,
        old_key: &str,
        new_key: &str,
    ) -> Result<Option<TranslationEntry>, StoreError> {
        self.ensure_editable()?;
        ensure_key(new_key)?;

        if old_key == new_key {
            return Ok(self.entries.get(old_key).cloned());
        }
        if self.entries.contains_key(new_key) {
            return Err(StoreError::DuplicateKey {
                key: new_key.to_string(),
                store: self.service.clone(),
            });
        }

        let Some(mut entry) = self.entries.remove(old_key) else {
            return Ok(None);
        };
        entry.translation_mut().set_key(new_key)?;
        self.entries.insert(new_key.to_string(), entry.clone());
        self.dirty = true;
        Ok(Some(entry))
    }

    fn add_new_language(&mut self, language: Language) -> Result<bool, StoreError> {
        self.ensure_editable()?;

        let added = self.languages.insert(language);
        if added {
            self.dirty = true;
        }
        Ok(added)
    }

    fn flush(&mut self, token: &CancellationToken) -> Result<(), StoreError> {
        self.ensure_editable()?;
        if !self.dirty {
            return Ok(());
        }

        let content = self.snapshot();
        self.backing.persist(&content, token)?;
        self.dirty = false;
        tracing::debug!(service = %self.service, "Flushed translation store");
        Ok(())
    }

    fn reload(&mut self, token: &CancellationToken) -> Result<(), StoreError> {
        let content = self.backing.load(token)?;
        self.apply(content);
        tracing::debug!(service = %self.service, "Reloaded translation store");
        Ok(())
    }
}
