//! Change events emitted by a [`super::TranslationStoreStack`].

use std::fmt;

use crate::language::Language;
use crate::translation::TranslationEntry;

/// Closed set of event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackEventKind {
    NewTranslation,
    RemoveTranslation,
    KeyChange,
    UpdateTranslation,
    NewLanguage,
    Flush,
    Reload,
}

impl StackEventKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NewTranslation => "NewTranslation",
            Self::RemoveTranslation => "RemoveTranslation",
            Self::KeyChange => "KeyChange",
            Self::UpdateTranslation => "UpdateTranslation",
            Self::NewLanguage => "NewLanguage",
            Self::Flush => "Flush",
            Self::Reload => "Reload",
        }
    }
}

impl fmt::Display for StackEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A change of the merged view.
///
/// Two events are equal iff they have the same type and the same key, new
/// key and language. The owning store of an entry payload is not compared.
#[derive(Debug, Clone)]
pub enum StackEvent {
    /// A key became visible, either added or no longer shadowed.
    NewTranslation(TranslationEntry),
    /// The winning entry of a key was removed.
    RemoveTranslation(TranslationEntry),
    /// The winning entry of `old_key` was renamed; `entry` carries the new key.
    KeyChange { old_key: String, entry: TranslationEntry },
    /// The texts of a winning entry changed.
    UpdateTranslation(TranslationEntry),
    NewLanguage(Language),
    Flush,
    /// Stores were reloaded. Listeners should re-query everything.
    Reload,
}

impl StackEvent {
    #[must_use]
    pub const fn kind(&self) -> StackEventKind {
        match self {
            Self::NewTranslation(_) => StackEventKind::NewTranslation,
            Self::RemoveTranslation(_) => StackEventKind::RemoveTranslation,
            Self::KeyChange { .. } => StackEventKind::KeyChange,
            Self::UpdateTranslation(_) => StackEventKind::UpdateTranslation,
            Self::NewLanguage(_) => StackEventKind::NewLanguage,
            Self::Flush => StackEventKind::Flush,
            Self::Reload => StackEventKind::Reload,
        }
    }

    /// The affected key. For [`StackEvent::KeyChange`] this is the old key.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::NewTranslation(entry)
            | Self::RemoveTranslation(entry)
            | Self::UpdateTranslation(entry) => Some(entry.key()),
            Self::KeyChange { old_key, .. } => Some(old_key),
            Self::NewLanguage(_) | Self::Flush | Self::Reload => None,
        }
    }

    #[must_use]
    pub fn new_key(&self) -> Option<&str> {
        match self {
            Self::KeyChange { entry, .. } => Some(entry.key()),
            _ => None,
        }
    }

    #[must_use]
    pub const fn language(&self) -> Option<&Language> {
        match self {
            Self::NewLanguage(language) => Some(language),
            _ => None,
        }
    }

    #[must_use]
    pub const fn entry(&self) -> Option<&TranslationEntry> {
        match self {
            Self::NewTranslation(entry)
            | Self::RemoveTranslation(entry)
            | Self::UpdateTranslation(entry)
            | Self::KeyChange { entry, .. } => Some(entry),
            Self::NewLanguage(_) | Self::Flush | Self::Reload => None,
        }
    }
}

impl PartialEq for StackEvent {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind()
            && self.key() == other.key()
            && self.new_key() == other.new_key()
            && self.language() == other.language()
    }
}

impl Eq for StackEvent {}

impl fmt::Display for StackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StackEvent [type={}", self.kind())?;
        if let Some(key) = self.key() {
            write!(f, ", key={key}")?;
        }
        if let Some(new_key) = self.new_key() {
            write!(f, ", newKey={new_key}")?;
        }
        if let Some(language) = self.language() {
            write!(f, ", language={language}")?;
        }
        f.write_str("]")
    }
}

/// Receives event batches from a stack.
///
/// Called synchronously with the ordered events of one mutation, or of all
/// mutations of one `set_changing(true)` / `set_changing(false)` bracket.
pub trait StackListener: Send + Sync {
    fn stack_changed(&self, events: &[StackEvent]);
}

impl<F> StackListener for F
where
    F: Fn(&[StackEvent]) + Send + Sync,
{
    fn stack_changed(&self, events: &[StackEvent]) {
        self(events);
    }
}
