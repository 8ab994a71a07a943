//! テスト用ユーティリティ関数
//!
//! 複数のテストモジュールで使用される共通のヘルパー関数を提供します。
#![cfg(test)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{
    Arc,
    Mutex,
};

use crate::language::Language;
use crate::progress::CancellationToken;
use crate::stack::{
    StackEvent,
    StackListener,
};
use crate::store::{
    MemoryTranslationStore,
    StoreBacking,
    StoreContent,
    StoreError,
};
use crate::translation::Translation;

/// 言語タグを作成する（例: "de", "de_CH", "default"）
pub(crate) fn lang(tag: &str) -> Language {
    Language::parse_strict(tag).unwrap()
}

/// テスト用の Translation を作成する
///
/// # Arguments
/// * `key` - 翻訳キー
/// * `texts` - 言語タグとテキストの組
pub(crate) fn translation(key: &str, texts: &[(&str, &str)]) -> Translation {
    texts
        .iter()
        .fold(Translation::new(key).unwrap(), |t, (tag, text)| t.with_text(lang(tag), *text))
}

/// メモリ上のストアを作成する
pub(crate) fn memory_store(
    name: &str,
    order: f64,
    editable: bool,
    translations: &[Translation],
) -> MemoryTranslationStore {
    let content: StoreContent = translations.iter().cloned().collect();
    MemoryTranslationStore::in_memory(name, order, editable, content)
}

/// 受信したイベントのバッチを記録するリスナー
#[derive(Debug, Clone, Default)]
pub(crate) struct EventRecorder {
    /// 通知ごとのイベント列
    batches: Arc<Mutex<Vec<Vec<StackEvent>>>>,
}

impl EventRecorder {
    pub(crate) fn listener(&self) -> Arc<dyn StackListener> {
        let batches = Arc::clone(&self.batches);
        Arc::new(move |events: &[StackEvent]| {
            batches.lock().expect("recorder lock").push(events.to_vec());
        })
    }

    /// 受信したバッチの一覧
    pub(crate) fn batches(&self) -> Vec<Vec<StackEvent>> {
        self.batches.lock().expect("recorder lock").clone()
    }

    /// 全バッチのイベントを連結したもの
    pub(crate) fn events(&self) -> Vec<StackEvent> {
        self.batches().into_iter().flatten().collect()
    }
}

/// 常に I/O エラーを返すバッキング
#[derive(Debug, Default)]
pub(crate) struct FailingBacking {
    /// load 時に返す内容
    content: StoreContent,
}

impl FailingBacking {
    pub(crate) const fn new(content: StoreContent) -> Self {
        Self { content }
    }
}

impl StoreBacking for FailingBacking {
    fn load(&self, _token: &CancellationToken) -> Result<StoreContent, StoreError> {
        Ok(self.content.clone())
    }

    fn persist(
        &mut self,
        _content: &StoreContent,
        _token: &CancellationToken,
    ) -> Result<(), StoreError> {
        Err(StoreError::Io {
            path: "/readonly/texts.properties".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        })
    }
}
