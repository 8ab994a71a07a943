//! 設定ファイルの読み込み

use std::path::Path;

use super::{
    ConfigError,
    StackSettings,
};

/// スコープのルートに置く設定ファイル名
pub const CONFIG_FILE_NAME: &str = ".translation-stack.json";

/// スコープの設定を読み込んで検証する
///
/// 設定ファイルが無いスコープはデフォルト設定になる
///
/// # Arguments
/// * `scope_root` - 探索スコープのルートパス
///
/// # Errors
/// - [`ConfigError::IoError`]: ファイル読み込みエラー
/// - [`ConfigError::ParseError`]: JSON パースエラー
/// - [`ConfigError::ValidationErrors`]: 不正なパターンや並び順
pub fn load_settings(scope_root: &Path) -> Result<StackSettings, ConfigError> {
    let config_path = scope_root.join(CONFIG_FILE_NAME);

    let settings = if config_path.is_file() {
        tracing::debug!(path = %config_path.display(), "Loading scope settings");
        let content = std::fs::read_to_string(&config_path)?;
        serde_json::from_str(&content)?
    } else {
        tracing::debug!(scope = %scope_root.display(), "No settings file, using defaults");
        StackSettings::default()
    };

    settings.validate().map_err(ConfigError::ValidationErrors)?;
    Ok(settings)
}
