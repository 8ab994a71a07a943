//! Merged, override-resolved view over several translation stores.
//!
//! Stores are kept highest priority first. For every key the first store
//! that contains it owns the visible entry; entries of the same key in lower
//! stores are shadowed until the winner is removed or renamed.

/// Change events and listeners
pub mod event;
/// Key sanitizing and generation
pub mod key;

use std::collections::{
    BTreeMap,
    BTreeSet,
    HashSet,
};
use std::fmt;
use std::ops::Bound;
use std::sync::Arc;

use thiserror::Error;

use crate::language::Language;
use crate::progress::CancellationToken;
use crate::store::{
    EditableTranslationStore,
    StoreError,
    StoreId,
    TranslationStore,
    compare_stores,
};
use crate::translation::{
    Translation,
    TranslationEntry,
};

pub use event::{
    StackEvent,
    StackEventKind,
    StackListener,
};

/// Errors of stack operations.
///
/// All variants except [`StackError::Store`] are raised before any state is
/// touched.
#[derive(Error, Debug)]
pub enum StackError {
    #[error("Translation key must not be blank")]
    BlankKey,

    #[error("Translation key '{0}' already exists")]
    DuplicateKey(String),

    #[error("Translation key '{0}' does not exist")]
    UnknownKey(String),

    #[error("Translation store '{0}' is not part of this stack")]
    UnknownStore(StoreId),

    #[error("Translation store '{0}' is read-only")]
    ReadOnlyStore(StoreId),

    #[error("The stack contains no editable translation store")]
    NoEditableStore,

    #[error("Translation store '{0}' was supplied more than once")]
    DuplicateStore(StoreId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl StackError {
    /// True if the caller passed an argument the stack rejected.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

/// Re-creates the stores of a stack on [`TranslationStoreStack::reload`].
pub trait StoreSource: Send {
    fn fetch(&self, token: &CancellationToken)
    -> Result<Vec<Box<dyn TranslationStore>>, StoreError>;
}

impl<F> StoreSource for F
where
    F: Fn(&CancellationToken) -> Result<Vec<Box<dyn TranslationStore>>, StoreError> + Send,
{
    fn fetch(
        &self,
        token: &CancellationToken,
    ) -> Result<Vec<Box<dyn TranslationStore>>, StoreError> {
        self(token)
    }
}

/// Single logical view over prioritized stores.
pub struct TranslationStoreStack {
    /// Stores, highest priority first
    stores: Vec<Box<dyn TranslationStore>>,
    /// Key → position of the store owning the visible entry
    index: BTreeMap<String, usize>,
    /// Registered listeners
    listeners: Vec<Arc<dyn StackListener>>,
    /// Nesting depth of `set_changing(true)`
    changing: usize,
    /// Events buffered while changing
    pending: Vec<StackEvent>,
    /// Source used to re-create the stores on reload
    source: Option<Box<dyn StoreSource>>,
}

impl fmt::Debug for TranslationStoreStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stores: Vec<&StoreId> = self.stores.iter().map(|s| s.service()).collect();
        f.debug_struct("TranslationStoreStack")
            .field("stores", &stores)
            .field("size", &self.index.len())
            .field("listeners", &self.listeners.len())
            .field("changing", &self.changing)
            .field("pending", &self.pending.len())
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

/// Sorts stores by priority and rejects duplicate services.
fn sort_stores(
    mut stores: Vec<Box<dyn TranslationStore>>,
) -> Result<Vec<Box<dyn TranslationStore>>, StackError> {
    let mut seen = HashSet::new();
    for store in &stores {
        if !seen.insert(store.service().clone()) {
            return Err(StackError::DuplicateStore(store.service().clone()));
        }
    }
    stores.sort_by(|a, b| compare_stores(Some(a.as_ref()), Some(b.as_ref())));
    Ok(stores)
}

/// Maps every key to the first (highest priority) store containing it.
fn build_index(stores: &[Box<dyn TranslationStore>]) -> BTreeMap<String, usize> {
    let mut index = BTreeMap::new();
    for (position, store) in stores.iter().enumerate() {
        for key in store.keys() {
            if !index.contains_key(key) {
                index.insert(key.to_string(), position);
            }
        }
    }
    index
}

/// Rejects blank keys.
fn ensure_key(key: &str) -> Result<(), StackError> {
    if key.trim().is_empty() { Err(StackError::BlankKey) } else { Ok(()) }
}

impl TranslationStoreStack {
    /// Creates a stack over `stores`.
    ///
    /// # Errors
    /// [`StackError::DuplicateStore`] if two stores share a service.
    pub fn new(stores: Vec<Box<dyn TranslationStore>>) -> Result<Self, StackError> {
        let stores = sort_stores(stores)?;
        let index = build_index(&stores);
        tracing::debug!(stores = stores.len(), keys = index.len(), "Created translation stack");
        Ok(Self {
            stores,
            index,
            listeners: Vec::new(),
            changing: 0,
            pending: Vec::new(),
            source: None,
        })
    }

    /// Creates a stack over the stores of `source`, which is asked again on
    /// every [`Self::reload`].
    pub fn with_source(
        source: impl StoreSource + 'static,
        token: &CancellationToken,
    ) -> Result<Self, StackError> {
        let stores = source.fetch(token)?;
        let mut stack = Self::new(stores)?;
        stack.source = Some(Box::new(source));
        Ok(stack)
    }

    // ---- queries ----

    /// Visible entry of `key`.
    #[must_use]
    pub fn translation(&self, key: &str) -> Option<&TranslationEntry> {
        let position = *self.index.get(key)?;
        self.stores.get(position)?.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Number of distinct visible keys.
    #[must_use]
    pub fn size(&self) -> usize {
        self.index.len()
    }

    /// Visible keys in ascending order.
    pub fn all_keys(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// Visible entries in key order.
    pub fn all_entries(&self) -> impl Iterator<Item = &TranslationEntry> {
        self.index.iter().filter_map(|(key, position)| self.stores.get(*position)?.get(key))
    }

    /// Visible entries whose key starts with `prefix`, in key order.
    pub fn all_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = &'a TranslationEntry> + 'a {
        self.index
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(key, _)| key.starts_with(prefix))
            .filter_map(|(key, position)| self.stores.get(*position)?.get(key))
    }

    /// Stores, highest priority first.
    pub fn all_stores(&self) -> impl Iterator<Item = &dyn TranslationStore> {
        self.stores.iter().map(|store| store.as_ref())
    }

    pub fn all_editable_stores(&self) -> impl Iterator<Item = &dyn TranslationStore> {
        self.all_stores().filter(|store| store.is_editable())
    }

    /// Highest priority editable store, the default target of writes.
    #[must_use]
    pub fn primary_editable_store(&self) -> Option<&dyn TranslationStore> {
        self.all_editable_stores().next()
    }

    #[must_use]
    pub fn store(&self, service: &StoreId) -> Option<&dyn TranslationStore> {
        self.all_stores().find(|store| store.service() == service)
    }

    /// Union of the languages of all stores.
    #[must_use]
    pub fn all_languages(&self) -> BTreeSet<Language> {
        self.all_stores().flat_map(|store| store.languages().cloned()).collect()
    }

    /// Union of the languages of all editable stores.
    #[must_use]
    pub fn all_editable_languages(&self) -> BTreeSet<Language> {
        self.all_editable_stores().flat_map(|store| store.languages().cloned()).collect()
    }

    /// True if any store accepts writes.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        self.primary_editable_store().is_some()
    }

    /// True if any editable store has unflushed changes.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.all_editable_stores().any(|store| store.is_dirty())
    }

    /// Derives a key from `seed` that is not visible in this stack.
    ///
    /// Returns `None` if `seed` has no usable characters.
    #[must_use]
    pub fn generate_new_key(&self, seed: &str) -> Option<String> {
        let candidate = key::sanitize_key(seed)?;
        Some(key::next_free_key(&candidate, |k| self.index.contains_key(k)))
    }

    // ---- mutations ----

    /// Adds a translation whose key is not yet visible.
    ///
    /// Written to `target`, or to the primary editable store if `None`.
    pub fn add_new_translation(
        &mut self,
        translation: &Translation,
        target: Option<&StoreId>,
    ) -> Result<TranslationEntry, StackError> {
        let key = translation.key();
        ensure_key(key)?;
        if self.index.contains_key(key) {
            return Err(StackError::DuplicateKey(key.to_string()));
        }
        let position = self.resolve_target(target)?;

        let entry = self.editable_at(position)?.set_translation(translation)?;
        // Filtered stores accept keys outside their allow-list without showing them
        if self.stores.get(position).is_some_and(|store| store.contains_key(key)) {
            self.index.insert(key.to_string(), position);
            self.fire(StackEvent::NewTranslation(entry.clone()));
        }
        Ok(entry)
    }

    /// Replaces the texts of the visible entry of `translation`'s key.
    pub fn update_translation(
        &mut self,
        translation: &Translation,
    ) -> Result<TranslationEntry, StackError> {
        let key = translation.key();
        let position = *self
            .index
            .get(key)
            .ok_or_else(|| StackError::UnknownKey(key.to_string()))?;
        let before = self.translation(key).map(|entry| entry.texts().clone());

        let entry = self.editable_at(position)?.set_translation(translation)?;
        if before.as_ref() != Some(entry.texts()) {
            self.fire(StackEvent::UpdateTranslation(entry.clone()));
        }
        Ok(entry)
    }

    /// Removes the visible entries of `keys` and returns how many were removed.
    ///
    /// Blank and unknown keys are skipped. A shadowed entry of a removed key
    /// becomes visible again. Fails without removing anything if one of the
    /// owning stores is read-only.
    pub fn remove_translations<I, S>(&mut self, keys: I) -> Result<usize, StackError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys: BTreeSet<String> = keys
            .into_iter()
            .filter(|key| self.index.contains_key(key.as_ref()))
            .map(|key| key.as_ref().to_string())
            .collect();

        for key in &keys {
            if let Some(store) = self.index.get(key).and_then(|p| self.stores.get(*p))
                && !store.is_editable()
            {
                return Err(StackError::ReadOnlyStore(store.service().clone()));
            }
        }

        self.batch(|stack| {
            let mut removed = 0;
            for key in &keys {
                if stack.remove_visible(key)? {
                    removed += 1;
                }
            }
            Ok(removed)
        })
    }

    /// Renames the visible entry of `old_key`.
    ///
    /// Returns `None` if `old_key` is not visible. If a lower store also
    /// defines `old_key`, its entry becomes visible in the same batch.
    pub fn change_key(
        &mut self,
        old_key: &str,
        new_key: &str,
    ) -> Result<Option<TranslationEntry>, StackError> {
        ensure_key(old_key)?;
        ensure_key(new_key)?;
        if self.index.contains_key(new_key) {
            return Err(StackError::DuplicateKey(new_key.to_string()));
        }
        let Some(&position) = self.index.get(old_key) else {
            return Ok(None);
        };
        let previous = self.translation(old_key).cloned();

        let Some(entry) = self.editable_at(position)?.change_key(old_key, new_key)? else {
            return Ok(None);
        };
        self.index.remove(old_key);
        let visible = self.stores.get(position).is_some_and(|store| store.contains_key(new_key));

        self.batch(|stack| {
            if visible {
                stack.index.insert(new_key.to_string(), position);
                stack.fire(StackEvent::KeyChange {
                    old_key: old_key.to_string(),
                    entry: entry.clone(),
                });
            } else if let Some(previous) = previous {
                stack.fire(StackEvent::RemoveTranslation(previous));
            }
            stack.resurface(old_key);
        });
        Ok(Some(entry))
    }

    /// Declares `language` in `target`, or in the primary editable store.
    ///
    /// Returns `false` if the store already knew the language.
    pub fn add_new_language(
        &mut self,
        language: Language,
        target: Option<&StoreId>,
    ) -> Result<bool, StackError> {
        let position = self.resolve_target(target)?;
        let added = self.editable_at(position)?.add_new_language(language.clone())?;
        if added {
            self.fire(StackEvent::NewLanguage(language));
        }
        Ok(added)
    }

    /// Flushes every dirty editable store.
    ///
    /// Stops at the first failing store; later stores stay dirty.
    pub fn flush(&mut self, token: &CancellationToken) -> Result<(), StackError> {
        for store in &mut self.stores {
            if !store.is_dirty() {
                continue;
            }
            if let Some(editable) = store.as_editable_mut() {
                editable.flush(token)?;
            }
        }
        tracing::debug!("Flushed translation stack");
        self.fire(StackEvent::Flush);
        Ok(())
    }

    /// Discards unflushed changes and re-reads all stores.
    ///
    /// With a [`StoreSource`] the stores are re-created and replaced only
    /// once all of them were fetched. Otherwise editable stores reload in
    /// place.
    pub fn reload(&mut self, token: &CancellationToken) -> Result<(), StackError> {
        if let Some(source) = &self.source {
            let stores = sort_stores(source.fetch(token)?)?;
            self.index = build_index(&stores);
            self.stores = stores;
        } else {
            let result = self
                .stores
                .iter_mut()
                .filter_map(|store| store.as_editable_mut())
                .try_for_each(|store| store.reload(token));
            self.index = build_index(&self.stores);
            result?;
        }
        tracing::debug!(keys = self.index.len(), "Reloaded translation stack");
        self.fire(StackEvent::Reload);
        Ok(())
    }

    // ---- batching and listeners ----

    /// Opens (`true`) or closes (`false`) a batch.
    ///
    /// Events of mutations inside a batch are delivered as one notification
    /// when the outermost batch closes.
    pub fn set_changing(&mut self, changing: bool) {
        if changing {
            self.changing += 1;
            return;
        }
        if self.changing == 0 {
            tracing::warn!("set_changing(false) without open batch");
            return;
        }
        self.changing -= 1;
        if self.changing == 0 {
            let events = std::mem::take(&mut self.pending);
            self.dispatch(&events);
        }
    }

    #[must_use]
    pub const fn is_changing(&self) -> bool {
        self.changing > 0
    }

    /// Runs `f` inside a batch.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.set_changing(true);
        let result = f(self);
        self.set_changing(false);
        result
    }

    /// Registers a listener. Returns `false` if it was already registered.
    pub fn add_listener(&mut self, listener: Arc<dyn StackListener>) -> bool {
        if self.listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            return false;
        }
        self.listeners.push(listener);
        true
    }

    pub fn remove_listener(&mut self, listener: &Arc<dyn StackListener>) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| !Arc::ptr_eq(l, listener));
        self.listeners.len() != before
    }

    // ---- internals ----

    /// Position of the store a write goes to.
    fn resolve_target(&self, target: Option<&StoreId>) -> Result<usize, StackError> {
        let Some(service) = target else {
            return self
                .stores
                .iter()
                .position(|store| store.is_editable())
                .ok_or(StackError::NoEditableStore);
        };

        let position = self
            .stores
            .iter()
            .position(|store| store.service() == service)
            .ok_or_else(|| StackError::UnknownStore(service.clone()))?;
        if self.stores.get(position).is_some_and(|store| store.is_editable()) {
            Ok(position)
        } else {
            Err(StackError::ReadOnlyStore(service.clone()))
        }
    }

    /// Write access to the store at `position`.
    fn editable_at(
        &mut self,
        position: usize,
    ) -> Result<&mut dyn EditableTranslationStore, StackError> {
        let service = self.stores.get(position).map(|store| store.service().clone());
        self.stores
            .get_mut(position)
            .and_then(|store| store.as_editable_mut())
            .ok_or_else(|| service.map_or(StackError::NoEditableStore, StackError::ReadOnlyStore))
    }

    /// Removes the visible entry of `key` and surfaces a shadowed one.
    fn remove_visible(&mut self, key: &str) -> Result<bool, StackError> {
        let Some(&position) = self.index.get(key) else {
            return Ok(false);
        };
        let removed = self.editable_at(position)?.remove_translation(key)?;
        self.index.remove(key);
        if let Some(entry) = &removed {
            self.fire(StackEvent::RemoveTranslation(entry.clone()));
        }
        self.resurface(key);
        Ok(removed.is_some())
    }

    /// Makes the highest priority remaining entry of `key` visible.
    fn resurface(&mut self, key: &str) {
        let found = self
            .stores
            .iter()
            .enumerate()
            .find_map(|(position, store)| store.get(key).map(|entry| (position, entry.clone())));
        if let Some((position, entry)) = found {
            tracing::trace!(key, store = %entry.store(), "Shadowed translation became visible");
            self.index.insert(key.to_string(), position);
            self.fire(StackEvent::NewTranslation(entry));
        }
    }

    /// Delivers `event` now, or buffers it while a batch is open.
    fn fire(&mut self, event: StackEvent) {
        if self.is_changing() {
            self.pending.push(event);
        } else {
            self.dispatch(&[event]);
        }
    }

    /// Notifies a snapshot of the listeners.
    fn dispatch(&self, events: &[StackEvent]) {
        if events.is_empty() {
            return;
        }
        let listeners = self.listeners.clone();
        tracing::trace!(events = events.len(), listeners = listeners.len(), "Dispatching stack events");
        for listener in &listeners {
            listener.stack_changed(events);
        }
    }
}
