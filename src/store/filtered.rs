//! Store decorator restricting the visible keys to an allow-list.

use std::collections::HashSet;

use super::{
    EditableTranslationStore,
    StoreError,
    StoreId,
    TranslationStore,
};
use crate::language::Language;
use crate::progress::CancellationToken;
use crate::translation::{
    Translation,
    TranslationEntry,
};

/// Exposes only the keys of the wrapped store that are in a fixed allow-list.
///
/// Reads see `allowed ∩ inner.keys()`. Writes go to the wrapped store
/// unchanged, so adding a key outside the allow-list succeeds but the key
/// stays invisible through this decorator.
#[derive(Debug)]
pub struct FilteredTranslationStore {
    inner: Box<dyn TranslationStore>,
    allowed_keys: HashSet<String>,
}

impl FilteredTranslationStore {
    pub fn new<I, S>(inner: Box<dyn TranslationStore>, allowed_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { inner, allowed_keys: allowed_keys.into_iter().map(Into::into).collect() }
    }

    #[must_use]
    pub const fn allowed_keys(&self) -> &HashSet<String> {
        &self.allowed_keys
    }

    #[must_use]
    pub fn inner(&self) -> &dyn TranslationStore {
        self.inner.as_ref()
    }

    #[must_use]
    pub fn into_inner(self) -> Box<dyn TranslationStore> {
        self.inner
    }

    fn is_allowed(&self, key: &str) -> bool {
        self.allowed_keys.contains(key)
    }

    fn inner_editable(&mut self) -> Result<&mut dyn EditableTranslationStore, StoreError> {
        let service = self.inner.service().clone();
        self.inner.as_editable_mut().ok_or(StoreError::ReadOnly(service))
    }
}

impl TranslationStore for FilteredTranslationStore {
    fn service(&self) -> &StoreId {
        self.inner.service()
    }

    fn order(&self) -> f64 {
        self.inner.order()
    }

    fn is_editable(&self) -> bool {
        self.inner.is_editable()
    }

    fn is_dirty(&self) -> bool {
        self.inner.is_dirty()
    }

    fn keys(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.inner.keys().filter(|key| self.is_allowed(key)))
    }

    fn entries(&self) -> Box<dyn Iterator<Item = &TranslationEntry> + '_> {
        Box::new(self.inner.entries().filter(|entry| self.is_allowed(entry.key())))
    }

    /// Languages with text in at least one visible entry, plus declared
    /// languages no entry of the wrapped store has text for yet.
    fn languages(&self) -> Box<dyn Iterator<Item = &Language> + '_> {
        Box::new(self.inner.languages().filter(|language| {
            self.entries().any(|entry| entry.text(language).is_some())
                || !self.inner.entries().any(|entry| entry.text(language).is_some())
        }))
    }

    fn get(&self, key: &str) -> Option<&TranslationEntry> {
        if self.is_allowed(key) { self.inner.get(key) } else { None }
    }

    fn as_editable_mut(&mut self) -> Option<&mut dyn EditableTranslationStore> {
        if self.inner.as_editable_mut().is_some() { Some(self) } else { None }
    }
}

impl EditableTranslationStore for FilteredTranslationStore {
    fn set_translation(
        &mut self,
        translation: &Translation,
    ) -> Result<TranslationEntry, StoreError> {
        self.inner_editable()?.set_translation(translation)
    }

    fn remove_translation(&mut self, key: &str) -> Result<Option<TranslationEntry>, StoreError> {
        self.inner_editable()?.remove_translation(key)
    }

    fn change_key(
        &mut self,
        old_key: &str,
        new_key: &str,
    ) -> Result<Option<TranslationEntry>, StoreError> {
        self.inner_editable()?.change_key(old_key, new_key)
    }

    fn add_new_language(&mut self, language: Language) -> Result<bool, StoreError> {
        self.inner_editable()?.add_new_language(language)
    }

    fn flush(&mut self, token: &CancellationToken) -> Result<(), StoreError> {
        self.inner_editable()?.flush(token)
    }

    fn reload(&mut self, token: &CancellationToken) -> Result<(), StoreError> {
        self.inner_editable()?.reload(token)
    }
}
