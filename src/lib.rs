//! translation-stack
//!
//! 優先度付きの翻訳ストアを 1 つの編集可能なビューにまとめるライブラリ
//!
//! ```
//! use translation_stack::language::Language;
//! use translation_stack::stack::TranslationStoreStack;
//! use translation_stack::store::{MemoryTranslationStore, StoreContent};
//! use translation_stack::translation::Translation;
//!
//! let base = MemoryTranslationStore::in_memory(
//!     "base",
//!     0.0,
//!     false,
//!     [Translation::new("title").unwrap().with_text(Language::Default, "Base")]
//!         .into_iter()
//!         .collect::<StoreContent>(),
//! );
//! let project = MemoryTranslationStore::in_memory(
//!     "project",
//!     10.0,
//!     true,
//!     [Translation::new("title").unwrap().with_text(Language::Default, "Project")]
//!         .into_iter()
//!         .collect::<StoreContent>(),
//! );
//!
//! let stack = TranslationStoreStack::new(vec![Box::new(base), Box::new(project)]).unwrap();
//! let title = stack.translation("title").unwrap();
//! assert_eq!(title.store().name(), "project");
//! assert_eq!(title.text(&Language::Default), Some("Project"));
//! ```

pub mod config;
pub mod format;
pub mod language;
pub mod progress;
pub mod registry;
pub mod stack;
pub mod store;
pub mod translation;

#[cfg(test)]
mod test_utils;

pub use language::Language;
pub use progress::CancellationToken;
pub use registry::{
    FileStoreSupplier,
    TranslationStoreSupplier,
    TranslationStores,
};
pub use stack::{
    StackError,
    StackEvent,
    StackListener,
    TranslationStoreStack,
};
pub use store::{
    StoreError,
    StoreId,
    TranslationStore,
};
pub use translation::{
    Translation,
    TranslationEntry,
};
