//! A default-language file plus its locale-suffixed siblings.
//!
//! `texts/Texts.properties` holds the default texts, `Texts_de.properties`
//! and `Texts_de_CH.properties` the German and Swiss German ones. Together
//! they back one store.

use std::collections::{
    BTreeMap,
    BTreeSet,
};
use std::fs;
use std::io;
use std::path::{
    Path,
    PathBuf,
};

use super::FileFormat;
use crate::language::Language;
use crate::progress::CancellationToken;
use crate::store::{
    StoreBacking,
    StoreContent,
    StoreError,
};
use crate::translation::Translation;

/// Splits a file stem into base name and language.
///
/// # Examples
/// - `Texts` → (`Texts`, default)
/// - `Texts_de` → (`Texts`, `de`)
/// - `Texts_de_CH` → (`Texts`, `de_CH`)
/// - `Shared_Texts` → (`Shared_Texts`, default)
#[must_use]
pub fn split_file_stem(stem: &str) -> (&str, Language) {
    let separators: Vec<usize> = stem.rmatch_indices('_').take(2).map(|(index, _)| index).collect();

    // Longest suffix first: `_de_CH` before `_CH`
    for index in separators.into_iter().rev() {
        let (base, suffix) = stem.split_at(index);
        if base.is_empty() {
            continue;
        }
        if let Some(language) =
            suffix.strip_prefix('_').and_then(Language::from_file_suffix)
        {
            return (base, language);
        }
    }

    (stem, Language::Default)
}

/// File set backing a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSetBacking {
    directory: PathBuf,
    base_name: String,
    format: FileFormat,
}

impl FileSetBacking {
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>, base_name: impl Into<String>, format: FileFormat) -> Self {
        Self { directory: directory.into(), base_name: base_name.into(), format }
    }

    /// Backing of the set `path` belongs to, and the language of `path`.
    #[must_use]
    pub fn from_file(path: &Path) -> Option<(Self, Language)> {
        let format = FileFormat::from_path(path)?;
        let stem = path.file_stem()?.to_str()?;
        let directory = path.parent()?;
        let (base_name, language) = split_file_stem(stem);
        Some((Self::new(directory, base_name, format), language))
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    #[must_use]
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    #[must_use]
    pub const fn format(&self) -> FileFormat {
        self.format
    }

    /// Path of the default-language file.
    #[must_use]
    pub fn base_file(&self) -> PathBuf {
        self.file_for(&Language::Default)
    }

    #[must_use]
    pub fn file_for(&self, language: &Language) -> PathBuf {
        let extension = self.format.extension();
        let file_name = match language {
            Language::Default => format!("{}.{extension}", self.base_name),
            Language::Locale(locale) => format!("{}_{locale}.{extension}", self.base_name),
        };
        self.directory.join(file_name)
    }

    /// Language of `path` if it is a file of this set.
    ///
    /// Suffixes with a known language code are matched first, so
    /// `Texts_Extra_de` belongs to `Texts_Extra`. Any other suffix written
    /// the way [`FileSetBacking::file_for`] writes it (`tlh`, `de_CH_POSIX`)
    /// is accepted as well.
    #[must_use]
    pub fn language_of(&self, path: &Path) -> Option<Language> {
        if path.parent()? != self.directory || FileFormat::from_path(path)? != self.format {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let (base, language) = split_file_stem(stem);
        if base == self.base_name {
            return Some(language);
        }
        if !language.is_default() {
            return None;
        }

        let suffix = stem.strip_prefix(self.base_name.as_str())?.strip_prefix('_')?;
        Language::parse(suffix)
            .filter(|language| !language.is_default() && language.to_string() == suffix)
    }

    /// Existing files of this set, by language.
    fn files(&self) -> Result<BTreeMap<Language, PathBuf>, StoreError> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => return Err(StoreError::Io { path: self.directory.clone(), source }),
        };

        let mut files = BTreeMap::new();
        for entry in entries {
            let entry =
                entry.map_err(|source| StoreError::Io { path: self.directory.clone(), source })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(language) = self.language_of(&path) {
                files.insert(language, path);
            }
        }
        Ok(files)
    }
}

impl StoreBacking for FileSetBacking {
    fn load(&self, token: &CancellationToken) -> Result<StoreContent, StoreError> {
        let mut content = StoreContent::new();

        for (language, path) in self.files()? {
            token.check()?;
            tracing::debug!(path = %path.display(), %language, "Reading translation file");

            let text = fs::read_to_string(&path)
                .map_err(|source| StoreError::Io { path: path.clone(), source })?;
            let texts = self
                .format
                .parse(&text)
                .map_err(|source| StoreError::Format { path: path.clone(), source })?;

            for (key, text) in texts {
                if let Some(translation) = content.translations.get_mut(&key) {
                    translation.put_text(language.clone(), text);
                    continue;
                }
                match Translation::new(key.clone()) {
                    Ok(translation) => {
                        content.translations.insert(key, translation.with_text(language.clone(), text));
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), "Skipping entry: {e}");
                    }
                }
            }
            content.languages.insert(language);
        }

        Ok(content)
    }

    fn persist(
        &mut self,
        content: &StoreContent,
        token: &CancellationToken,
    ) -> Result<(), StoreError> {
        fs::create_dir_all(&self.directory)
            .map_err(|source| StoreError::Io { path: self.directory.clone(), source })?;

        // Keys without any text go to the default file with an empty value
        let default = Language::Default;
        let untranslated: Vec<&str> = content.untranslated_keys().collect();
        let mut languages: BTreeSet<&Language> = content.languages.iter().collect();
        if !untranslated.is_empty() {
            languages.insert(&default);
        }

        for language in languages {
            token.check()?;
            let path = self.file_for(language);
            let mut texts = content.texts_of(language);
            if language.is_default() {
                texts.extend(untranslated.iter().map(|key| (*key, "")));
            }
            let rendered = self
                .format
                .render(&texts)
                .map_err(|source| StoreError::Format { path: path.clone(), source })?;

            tracing::debug!(path = %path.display(), %language, "Writing translation file");
            fs::write(&path, rendered).map_err(|source| StoreError::Io { path, source })?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;
    use crate::store::{
        EditableTranslationStore,
        FileTranslationStore,
        TranslationStore,
    };
    use crate::test_utils::{
        lang,
        translation,
    };

    fn keys_of(store: &FileTranslationStore) -> Vec<String> {
        store.keys().map(str::to_string).collect()
    }

    #[rstest]
    #[case("Texts", "Texts", "default")]
    #[case("Texts_de", "Texts", "de")]
    #[case("Texts_de_CH", "Texts", "de_CH")]
    #[case("Shared_Texts", "Shared_Texts", "default")]
    #[case("Shared_Texts_fr", "Shared_Texts", "fr")]
    #[case("my_texts", "my_texts", "default")]
    #[case::leading_underscore("_de", "_de", "default")]
    fn test_split_file_stem(#[case] stem: &str, #[case] base: &str, #[case] language: &str) {
        let (actual_base, actual_language) = split_file_stem(stem);

        assert_that!(actual_base, eq(base));
        assert_that!(actual_language.to_string(), eq(language));
    }

    #[rstest]
    fn test_file_for_language() {
        let backing = FileSetBacking::new("/p/texts", "Texts", FileFormat::Properties);

        assert_eq!(backing.base_file(), PathBuf::from("/p/texts/Texts.properties"));
        assert_eq!(backing.file_for(&lang("de_CH")), PathBuf::from("/p/texts/Texts_de_CH.properties"));
    }

    #[rstest]
    fn test_load_merges_sibling_files() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("Texts.properties"), "greeting=Hello\nfarewell=Bye\n").unwrap();
        fs::write(dir.join("Texts_de.properties"), "greeting=Hallo\n").unwrap();
        fs::write(dir.join("Other.properties"), "other=x\n").unwrap();
        fs::write(dir.join("Texts.json"), "{\"json\": \"ignored\"}").unwrap();

        let backing = FileSetBacking::new(dir, "Texts", FileFormat::Properties);
        let content = backing.load(&CancellationToken::new()).unwrap();

        assert_that!(content.translations.len(), eq(2));
        assert_that!(content.languages.len(), eq(2));
        let greeting = content.translations.get("greeting").unwrap();
        assert_that!(greeting.text(&Language::Default), some(eq("Hello")));
        assert_that!(greeting.text(&lang("de")), some(eq("Hallo")));
        assert_that!(content.translations.get("farewell").unwrap().text(&lang("de")), none());
    }

    #[rstest]
    fn test_load_missing_directory_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let backing = FileSetBacking::new(temp_dir.path().join("missing"), "Texts", FileFormat::Json);

        let content = backing.load(&CancellationToken::new()).unwrap();

        assert_that!(content.translations.len(), eq(0));
    }

    #[rstest]
    fn test_load_reports_parse_errors_with_path() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("Texts.json"), "{ invalid").unwrap();
        let backing = FileSetBacking::new(temp_dir.path(), "Texts", FileFormat::Json);

        let result = backing.load(&CancellationToken::new());

        assert!(matches!(result, Err(StoreError::Format { path, .. }) if path.ends_with("Texts.json")));
    }

    #[rstest]
    fn test_persist_writes_one_file_per_language() {
        let temp_dir = TempDir::new().unwrap();
        let mut backing = FileSetBacking::new(temp_dir.path(), "Texts", FileFormat::Properties);
        let mut content: StoreContent = [
            translation("greeting", &[("default", "Hello"), ("de", "Hallo")]),
            translation("farewell", &[("default", "Bye")]),
        ]
        .into_iter()
        .collect();
        content.languages.insert(lang("fr"));

        backing.persist(&content, &CancellationToken::new()).unwrap();

        let default_file = fs::read_to_string(temp_dir.path().join("Texts.properties")).unwrap();
        let de_file = fs::read_to_string(temp_dir.path().join("Texts_de.properties")).unwrap();
        let fr_file = fs::read_to_string(temp_dir.path().join("Texts_fr.properties")).unwrap();
        assert_that!(default_file, eq("farewell=Bye\ngreeting=Hello\n"));
        assert_that!(de_file, eq("greeting=Hallo\n"));
        assert_that!(fr_file, eq(""));

        let reloaded = backing.load(&CancellationToken::new()).unwrap();
        assert_eq!(reloaded, content);
    }

    #[rstest]
    #[case("/p/texts/Texts.properties", Some("default"))]
    #[case("/p/texts/Texts_de_CH.properties", Some("de_CH"))]
    #[case::unknown_code("/p/texts/Texts_tlh.properties", Some("tlh"))]
    #[case::variant("/p/texts/Texts_de_CH_POSIX.properties", Some("de_CH_POSIX"))]
    #[case::other_set("/p/texts/Texts_Extra.properties", None)]
    #[case::other_set_sibling("/p/texts/Texts_Extra_de.properties", None)]
    #[case::other_format("/p/texts/Texts_de.json", None)]
    #[case::other_directory("/p/other/Texts_de.properties", None)]
    #[case::default_marker("/p/texts/Texts_default.properties", None)]
    fn test_language_of(#[case] path: &str, #[case] expected: Option<&str>) {
        let backing = FileSetBacking::new("/p/texts", "Texts", FileFormat::Properties);

        let language = backing.language_of(Path::new(path));

        assert_eq!(language.map(|l| l.to_string()).as_deref(), expected);
    }

    #[rstest]
    fn test_untranslated_key_survives_flush_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("Texts.properties"), "a=A\n").unwrap();
        let backing = FileSetBacking::new(temp_dir.path(), "Texts", FileFormat::Properties);
        let token = CancellationToken::new();
        let mut store = FileTranslationStore::open("texts".into(), 0.0, true, backing, &token).unwrap();

        store.set_translation(&Translation::new("empty").unwrap()).unwrap();
        let before = keys_of(&store);
        store.flush(&token).unwrap();
        store.reload(&token).unwrap();

        assert_eq!(keys_of(&store), before);
        assert_that!(store.get("empty").map(|e| e.texts().is_empty()), some(eq(true)));
        assert_that!(store.is_dirty(), eq(false));
        let default_file = fs::read_to_string(temp_dir.path().join("Texts.properties")).unwrap();
        assert_that!(default_file, eq("a=A\nempty=\n"));
    }

    #[rstest]
    fn test_untranslated_key_in_json_set() {
        let temp_dir = TempDir::new().unwrap();
        let mut backing = FileSetBacking::new(temp_dir.path(), "labels", FileFormat::Json);
        let content: StoreContent = [
            translation("title", &[("de", "Titel")]),
            Translation::new("todo").unwrap(),
        ]
        .into_iter()
        .collect();

        backing.persist(&content, &CancellationToken::new()).unwrap();
        let reloaded = backing.load(&CancellationToken::new()).unwrap();

        assert_that!(reloaded.translations.get("todo").map(Translation::has_texts), some(eq(false)));
        assert_that!(reloaded.translations.get("title").unwrap().text(&lang("de")), some(eq("Titel")));
    }

    #[rstest]
    fn test_languages_outside_the_names_table_survive_reload() {
        let temp_dir = TempDir::new().unwrap();
        let backing = FileSetBacking::new(temp_dir.path(), "Texts", FileFormat::Properties);
        let token = CancellationToken::new();
        let mut store = FileTranslationStore::open("texts".into(), 0.0, true, backing, &token).unwrap();

        store
            .set_translation(&translation(
                "greeting",
                &[("default", "Hello"), ("tlh", "nuqneH"), ("de_CH_POSIX", "Grüezi")],
            ))
            .unwrap();
        store.flush(&token).unwrap();
        store.reload(&token).unwrap();

        let greeting = store.get("greeting").unwrap();
        assert_that!(greeting.text(&lang("tlh")), some(eq("nuqneH")));
        assert_that!(greeting.text(&lang("de_CH_POSIX")), some(eq("Grüezi")));
        assert!(temp_dir.path().join("Texts_tlh.properties").is_file());
    }
}
