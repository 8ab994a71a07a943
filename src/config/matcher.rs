//! File pattern matcher for translation files.

use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};

use super::StackSettings;

#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidExcludePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Invalid translation file pattern '{pattern}': {source}")]
    InvalidTranslationPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Invalid read-only pattern '{pattern}': {source}")]
    InvalidReadOnlyPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to build glob set: {0}")]
    GlobSetBuild(#[from] globset::Error),
}

/// Matches files against configured glob patterns.
#[derive(Debug, Clone)]
pub struct FileMatcher {
    scope_root: PathBuf,
    exclude_set: GlobSet,
    translation_set: GlobSet,
    translation_exclude_set: GlobSet,
    read_only_set: GlobSet,
}

impl FileMatcher {
    /// Creates a new matcher from settings.
    pub fn new(scope_root: PathBuf, settings: &StackSettings) -> Result<Self, MatcherError> {
        let exclude_set = Self::build_glob_set(&settings.exclude_patterns, |pattern, source| {
            MatcherError::InvalidExcludePattern { pattern, source }
        })?;

        let translation_set = Self::build_glob_set(
            &settings.translation_files.include_patterns,
            |pattern, source| MatcherError::InvalidTranslationPattern { pattern, source },
        )?;

        let translation_exclude_set = Self::build_glob_set(
            &settings.translation_files.exclude_patterns,
            |pattern, source| MatcherError::InvalidExcludePattern { pattern, source },
        )?;

        let read_only_set = Self::build_glob_set(&settings.read_only_patterns, |pattern, source| {
            MatcherError::InvalidReadOnlyPattern { pattern, source }
        })?;

        Ok(Self { scope_root, exclude_set, translation_set, translation_exclude_set, read_only_set })
    }

    /// Compiles `patterns`, naming the first invalid one.
    fn build_glob_set<F>(patterns: &[String], make_error: F) -> Result<GlobSet, MatcherError>
    where
        F: Fn(String, globset::Error) -> MatcherError,
    {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| make_error(pattern.clone(), e))?;
            builder.add(glob);
        }
        Ok(builder.build()?)
    }

    #[must_use]
    pub fn scope_root(&self) -> &Path {
        &self.scope_root
    }

    /// Returns true if the path matches `excludePatterns`.
    ///
    /// The path must be relative to the scope root.
    #[must_use]
    pub fn is_excluded_relative(&self, relative_path: &Path) -> bool {
        self.exclude_set.is_match(relative_path)
    }

    /// Returns true if the path matches `translationFiles.includePatterns`
    /// but not `excludePatterns` or `translationFiles.excludePatterns`.
    ///
    /// The path must be absolute and under the scope root.
    #[must_use]
    pub fn is_translation_file(&self, absolute_path: &Path) -> bool {
        let Some(relative_path) = absolute_path.strip_prefix(&self.scope_root).ok() else {
            return false;
        };

        self.is_translation_file_relative(relative_path)
    }

    /// Returns true if the path matches `translationFiles.includePatterns`
    /// but not `excludePatterns` or `translationFiles.excludePatterns`.
    ///
    /// The path must be relative to the scope root.
    #[must_use]
    pub fn is_translation_file_relative(&self, relative_path: &Path) -> bool {
        self.translation_set.is_match(relative_path)
            && !self.exclude_set.is_match(relative_path)
            && !self.translation_exclude_set.is_match(relative_path)
    }

    /// Returns true if the path matches `readOnlyPatterns`.
    ///
    /// The path must be absolute and under the scope root.
    #[must_use]
    pub fn is_read_only(&self, absolute_path: &Path) -> bool {
        absolute_path
            .strip_prefix(&self.scope_root)
            .is_ok_and(|relative_path| self.is_read_only_relative(relative_path))
    }

    /// Returns true if the path matches `readOnlyPatterns`.
    ///
    /// The path must be relative to the scope root.
    #[must_use]
    pub fn is_read_only_relative(&self, relative_path: &Path) -> bool {
        self.read_only_set.is_match(relative_path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::path::PathBuf;

    use rstest::rstest;

    use super::*;
    use crate::config::TranslationFilesConfig;

    fn create_settings(
        translation_patterns: &[&str],
        exclude: &[&str],
        read_only: &[&str],
    ) -> StackSettings {
        StackSettings {
            exclude_patterns: exclude.iter().copied().map(String::from).collect(),
            read_only_patterns: read_only.iter().copied().map(String::from).collect(),
            translation_files: TranslationFilesConfig {
                include_patterns: translation_patterns.iter().copied().map(String::from).collect(),
                ..TranslationFilesConfig::default()
            },
            ..StackSettings::default()
        }
    }

    #[rstest]
    #[case("/workspace/app/texts/Texts.properties", true)]
    #[case("/workspace/app/src/main/resources/i18n/Messages_de.properties", true)]
    #[case("/workspace/translations/labels.json", true)]
    #[case("/workspace/app/texts/readme.md", false)]
    #[case("/workspace/config/app.properties", false)]
    #[case("/workspace/target/classes/texts/Texts.properties", false)]
    #[case("/workspace/node_modules/lib/i18n/en.json", false)]
    #[case("/other/texts/Texts.properties", false)]
    fn is_translation_file_with_default_patterns(#[case] path: &str, #[case] expected: bool) {
        let settings = StackSettings::default();
        let matcher =
            FileMatcher::new(PathBuf::from("/workspace"), &settings).expect("valid patterns");

        assert_eq!(matcher.is_translation_file(Path::new(path)), expected);
    }

    #[rstest]
    fn is_translation_file_with_exclude() {
        let mut settings = create_settings(&["**/i18n/**/*.json"], &["**/build/**"], &[]);
        settings.translation_files.exclude_patterns = vec!["**/*.test.json".to_string()];
        let matcher =
            FileMatcher::new(PathBuf::from("/workspace"), &settings).expect("valid patterns");

        assert!(matcher.is_translation_file(Path::new("/workspace/i18n/en.json")));
        assert!(!matcher.is_translation_file(Path::new("/workspace/build/i18n/en.json")));
        assert!(!matcher.is_translation_file(Path::new("/workspace/i18n/en.test.json")));
    }

    #[rstest]
    fn is_translation_file_relative_works() {
        let settings = create_settings(&["**/texts/*.properties"], &[], &[]);
        let matcher =
            FileMatcher::new(PathBuf::from("/workspace"), &settings).expect("valid patterns");

        assert!(matcher.is_translation_file_relative(Path::new("texts/Texts.properties")));
        assert!(!matcher.is_translation_file_relative(Path::new("src/Texts.properties")));
    }

    #[rstest]
    fn is_read_only_matches_scope_relative_paths() {
        let settings = create_settings(&["**/*.properties"], &[], &["vendor/**"]);
        let matcher =
            FileMatcher::new(PathBuf::from("/workspace"), &settings).expect("valid patterns");

        assert!(matcher.is_read_only(Path::new("/workspace/vendor/texts/Texts.properties")));
        assert!(!matcher.is_read_only(Path::new("/workspace/app/texts/Texts.properties")));
        assert!(!matcher.is_read_only(Path::new("/elsewhere/vendor/Texts.properties")));
        assert!(matcher.is_read_only_relative(Path::new("vendor/Texts.properties")));
    }

    #[rstest]
    fn is_excluded_relative_works() {
        let settings = StackSettings::default();
        let matcher =
            FileMatcher::new(PathBuf::from("/workspace"), &settings).expect("valid patterns");

        assert!(matcher.is_excluded_relative(Path::new("target/debug")));
        assert!(!matcher.is_excluded_relative(Path::new("app/texts")));
    }

    #[rstest]
    fn new_with_invalid_exclude_pattern() {
        let settings = create_settings(&["**/*.json"], &["[invalid"], &[]);

        let result = FileMatcher::new(PathBuf::from("/workspace"), &settings);

        assert!(matches!(result, Err(MatcherError::InvalidExcludePattern { .. })));
    }

    #[rstest]
    fn new_with_invalid_translation_pattern() {
        let settings = create_settings(&["**/*.{json"], &[], &[]);

        let result = FileMatcher::new(PathBuf::from("/workspace"), &settings);

        assert!(matches!(result, Err(MatcherError::InvalidTranslationPattern { .. })));
    }

    #[rstest]
    fn new_with_invalid_read_only_pattern() {
        let settings = create_settings(&["**/*.json"], &[], &["lib/{a"]);

        let result = FileMatcher::new(PathBuf::from("/workspace"), &settings);

        assert!(matches!(result, Err(MatcherError::InvalidReadOnlyPattern { .. })));
    }

    #[rstest]
    fn scope_root_accessor() {
        let settings = StackSettings::default();
        let matcher =
            FileMatcher::new(PathBuf::from("/workspace"), &settings).expect("valid patterns");

        assert_eq!(matcher.scope_root(), Path::new("/workspace"));
    }
}
