//! ファイルベースのストアを探索するサプライヤー
//!
//! スコープ配下の翻訳ファイルを走査し、ロケール付きの兄弟ファイルを
//! 1 つのストアにまとめる。

use std::collections::BTreeMap;
use std::path::{
    Path,
    PathBuf,
};

use ignore::WalkBuilder;

use super::TranslationStoreSupplier;
use crate::config::{
    FileMatcher,
    StackSettings,
    load_settings,
};
use crate::format::FileFormat;
use crate::format::file_set::FileSetBacking;
use crate::progress::CancellationToken;
use crate::store::{
    FileTranslationStore,
    StoreError,
    StoreId,
    TranslationStore,
};

/// ファイルセットごとにストアを作るサプライヤー
#[derive(Debug, Clone)]
pub struct FileStoreSupplier {
    /// サプライヤー ID
    id: String,
    /// サービス名の基準となるルート
    root: PathBuf,
}

impl FileStoreSupplier {
    /// 新しいサプライヤーを作成
    ///
    /// # Arguments
    /// * `id` - サプライヤー ID
    /// * `root` - サービス名を決めるルートディレクトリ
    #[must_use]
    pub fn new(id: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self { id: id.into(), root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// サービス名を求める
    ///
    /// ルートからの相対パスから拡張子を除いたもの（区切りは `/`）
    fn service_of(&self, backing: &FileSetBacking) -> StoreId {
        let base = backing.directory().join(backing.base_name());
        let relative = base.strip_prefix(&self.root).unwrap_or(base.as_path());
        let name: Vec<String> =
            relative.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
        StoreId::new(name.join("/"))
    }

    /// スコープの設定とマッチャーを読み込む
    fn scope_config(scope: &Path) -> Result<(StackSettings, FileMatcher), StoreError> {
        let settings = load_settings(scope)?;
        let matcher = FileMatcher::new(scope.to_path_buf(), &settings)?;
        Ok((settings, matcher))
    }

    /// スコープ配下の翻訳ファイルを走査する
    ///
    /// # Returns
    /// 既定言語ファイルのパスをキーとしたファイルセット
    fn discover(
        scope: &Path,
        matcher: &FileMatcher,
        token: &CancellationToken,
    ) -> Result<BTreeMap<PathBuf, FileSetBacking>, StoreError> {
        let mut file_sets = BTreeMap::new();

        // ignore クレートでファイルを走査
        for result in WalkBuilder::new(scope)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false)
            .build()
        {
            token.check()?;

            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(?err, "Failed to read directory entry");
                    continue;
                }
            };

            // ファイルのみを対象
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            if !matcher.is_translation_file(path) {
                continue;
            }

            let Some((backing, _language)) = FileSetBacking::from_file(path) else {
                continue;
            };
            file_sets.entry(backing.base_file()).or_insert(backing);
        }

        // `Texts_tlh` is a sibling of `Texts`, not a set of its own
        let claimed: Vec<PathBuf> = file_sets
            .keys()
            .filter(|file| {
                file_sets.values().any(|owner| {
                    owner.language_of(file).is_some_and(|language| !language.is_default())
                })
            })
            .cloned()
            .collect();
        for file in claimed {
            file_sets.remove(&file);
        }

        Ok(file_sets)
    }

    /// ファイルセットからストアを開く
    fn open_store(
        &self,
        backing: FileSetBacking,
        settings: &StackSettings,
        matcher: &FileMatcher,
        token: &CancellationToken,
    ) -> Result<FileTranslationStore, StoreError> {
        let service = self.service_of(&backing);
        let order = settings.order_for(service.name());
        let editable = !matcher.is_read_only(&backing.base_file());
        FileTranslationStore::open(service, order, editable, backing, token)
    }
}

impl TranslationStoreSupplier for FileStoreSupplier {
    fn id(&self) -> &str {
        &self.id
    }

    fn stores(
        &self,
        scope: &Path,
        token: &CancellationToken,
    ) -> Result<Vec<Box<dyn TranslationStore>>, StoreError> {
        let (settings, matcher) = Self::scope_config(scope)?;

        let file_sets = Self::discover(scope, &matcher, token)?;
        tracing::debug!(scope = %scope.display(), count = file_sets.len(), "Discovered translation file sets");

        let mut stores: Vec<Box<dyn TranslationStore>> = Vec::with_capacity(file_sets.len());
        for backing in file_sets.into_values() {
            let store = self.open_store(backing, &settings, &matcher, token)?;
            stores.push(Box::new(store));
        }
        Ok(stores)
    }

    fn store_for_service(
        &self,
        service: &StoreId,
        token: &CancellationToken,
    ) -> Result<Option<Box<dyn TranslationStore>>, StoreError> {
        let (settings, matcher) = Self::scope_config(&self.root)?;

        for format in FileFormat::ALL {
            let base_file = self.root.join(format!("{}.{}", service.name(), format.extension()));
            let Some((backing, _language)) = FileSetBacking::from_file(&base_file) else {
                continue;
            };
            if backing.base_file() != base_file || !backing.directory().is_dir() {
                continue;
            }
            let store = self.open_store(backing, &settings, &matcher, token)?;
            if store.size() > 0 || base_file.is_file() {
                return Ok(Some(Box::new(store)));
            }
        }
        Ok(None)
    }
}
