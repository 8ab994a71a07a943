//! ファイル探索からスタックの編集・保存・再読み込みまでの結合テスト

#![allow(clippy::unwrap_used)]
#![allow(missing_docs)]

use std::fs;
use std::path::Path;
use std::sync::{
    Arc,
    Mutex,
    Once,
};

use googletest::prelude::*;
use rstest::{
    fixture,
    rstest,
};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;
use translation_stack::registry::stores_having_implicit_overrides;
use translation_stack::stack::StackEventKind;
use translation_stack::{
    CancellationToken,
    FileStoreSupplier,
    Language,
    StackEvent,
    StackListener,
    Translation,
    TranslationStoreStack,
    TranslationStores,
};

/// テスト用のログ出力を一度だけ初期化する
fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn write(root: &Path, path: &str, content: &str) {
    let file = root.join(path);
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, content).unwrap();
}

fn read(root: &Path, path: &str) -> String {
    fs::read_to_string(root.join(path)).unwrap()
}

fn lang(tag: &str) -> Language {
    Language::parse_strict(tag).unwrap()
}

/// アプリ用ストア（編集可能）とベースストア（読み取り専用）を持つワークスペース
#[fixture]
fn workspace() -> TempDir {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(
        root,
        ".translation-stack.json",
        r#"{
            "readOnlyPatterns": ["base/**"],
            "storeOrders": {"app/texts/Texts": 10}
        }"#,
    );
    write(root, "app/texts/Texts.properties", "greeting=Hello\nshared=App\n");
    write(root, "app/texts/Texts_de.properties", "greeting=Hallo\n");
    write(root, "base/texts/Base.properties", "# base texts\nshared=Base\nbase_only=B\n");
    temp_dir
}

fn create_stack(root: &Path) -> TranslationStoreStack {
    let mut registry = TranslationStores::new();
    registry.register(Arc::new(FileStoreSupplier::new("files", root)));
    registry.create_full_stack(root, &CancellationToken::new()).unwrap().unwrap()
}

/// 受信したイベント種別を記録する
fn record_kinds(stack: &mut TranslationStoreStack) -> Arc<Mutex<Vec<StackEventKind>>> {
    let kinds = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&kinds);
    let listener: Arc<dyn StackListener> = Arc::new(move |events: &[StackEvent]| {
        sink.lock().unwrap().extend(events.iter().map(StackEvent::kind));
    });
    stack.add_listener(listener);
    kinds
}

#[rstest]
fn discovered_stores_follow_settings(workspace: TempDir) {
    let stack = create_stack(workspace.path());

    let stores: Vec<&str> = stack.all_stores().map(|s| s.service().name()).collect();
    assert_eq!(stores, ["app/texts/Texts", "base/texts/Base"]);
    assert_that!(
        stack.primary_editable_store().map(|s| s.service().name()),
        some(eq("app/texts/Texts"))
    );
    assert_that!(stack.translation("shared").unwrap().store().name(), eq("app/texts/Texts"));
    assert_that!(stack.translation("base_only").unwrap().store().name(), eq("base/texts/Base"));
    assert_that!(stack.size(), eq(3));
}

#[rstest]
fn edits_are_flushed_to_locale_files(workspace: TempDir) {
    let root = workspace.path();
    let mut stack = create_stack(root);
    let kinds = record_kinds(&mut stack);

    stack.batch(|stack| {
        let farewell = Translation::new("farewell")
            .unwrap()
            .with_text(Language::Default, "Bye")
            .with_text(lang("de"), "Tschüss");
        stack.add_new_translation(&farewell, None).unwrap();
        stack.change_key("greeting", "welcome").unwrap();
        stack.add_new_language(lang("fr"), None).unwrap();
    });
    assert_that!(stack.is_dirty(), eq(true));

    stack.flush(&CancellationToken::new()).unwrap();

    assert_that!(stack.is_dirty(), eq(false));
    assert_that!(
        read(root, "app/texts/Texts.properties"),
        eq("farewell=Bye\nshared=App\nwelcome=Hello\n")
    );
    assert_that!(read(root, "app/texts/Texts_de.properties"), eq("farewell=Tschüss\nwelcome=Hallo\n"));
    assert_that!(read(root, "app/texts/Texts_fr.properties"), eq(""));
    assert_that!(
        read(root, "base/texts/Base.properties"),
        eq("# base texts\nshared=Base\nbase_only=B\n")
    );
    assert_eq!(*kinds.lock().unwrap(), [
        StackEventKind::NewTranslation,
        StackEventKind::KeyChange,
        StackEventKind::NewLanguage,
        StackEventKind::Flush,
    ]);
}

#[rstest]
fn reload_reads_external_changes(workspace: TempDir) {
    let root = workspace.path();
    let mut stack = create_stack(root);
    let kinds = record_kinds(&mut stack);
    stack.remove_translations(["greeting"]).unwrap();

    write(root, "app/texts/Texts_it.properties", "greeting=Ciao\n");
    write(root, "extra/i18n/Extra.json", "{\"extra\": {\"key\": \"Extra\"}}");
    stack.reload(&CancellationToken::new()).unwrap();

    let greeting = stack.translation("greeting").unwrap();
    assert_that!(greeting.text(&lang("it")), some(eq("Ciao")));
    assert_that!(stack.translation("extra.key").unwrap().store().name(), eq("extra/i18n/Extra"));
    assert!(stack.all_languages().contains(&lang("it")));
    assert_that!(stack.is_dirty(), eq(false));
    assert_that!(kinds.lock().unwrap().last().copied(), some(eq(StackEventKind::Reload)));
}

#[rstest]
fn removing_override_surfaces_base_text(workspace: TempDir) {
    let root = workspace.path();
    let mut stack = create_stack(root);

    stack.remove_translations(["shared"]).unwrap();
    stack.flush(&CancellationToken::new()).unwrap();

    let shared = stack.translation("shared").unwrap();
    assert_that!(shared.store().name(), eq("base/texts/Base"));
    assert_that!(shared.text(&Language::Default), some(eq("Base")));
    assert_that!(read(root, "app/texts/Texts.properties"), eq("greeting=Hello\n"));
    assert!(stack.remove_translations(["shared"]).is_err());
}

#[rstest]
fn equal_order_stores_sharing_keys_are_reported() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "one/texts/A.properties", "common=A\n");
    write(root, "two/texts/B.properties", "common=B\n");
    write(root, "three/texts/C.properties", "own=C\n");
    let mut registry = TranslationStores::new();
    registry.register(Arc::new(FileStoreSupplier::new("files", root)));

    let stores = registry.all_stores(root, &CancellationToken::new()).unwrap();
    let groups = stores_having_implicit_overrides(&stores);

    let names: Vec<Vec<&str>> =
        groups.iter().map(|group| group.iter().map(|id| id.name()).collect()).collect();
    assert_eq!(names, vec![vec!["one/texts/A", "two/texts/B"]]);
}
