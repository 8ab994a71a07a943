//! Key generation.

/// Generated keys are cut to this many characters.
pub const MAX_KEY_LENGTH: usize = 200;

/// ASCII letters, digits, `_`, `-` and `.`.
#[must_use]
pub fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Turns free text into a key candidate.
///
/// Runs of illegal characters split the text into words, which are joined in
/// camel case. Leading non-letters are dropped. Returns `None` if nothing
/// usable is left.
///
/// # Examples
/// - `"something,New "` → `somethingNew`
/// - `"Save changes?"` → `SaveChanges`
/// - `"  42 items"` → `items`
#[must_use]
pub fn sanitize_key(seed: &str) -> Option<String> {
    let mut words = seed.split(|c: char| !is_key_char(c)).filter(|w| !w.is_empty());

    // The first word keeps its case once leading non-letters are gone
    let first = words.by_ref().find_map(|word| {
        let trimmed = word.trim_start_matches(|c: char| !c.is_ascii_alphabetic());
        (!trimmed.is_empty()).then_some(trimmed)
    })?;

    let mut key = first.to_string();
    for word in words {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            key.push(first.to_ascii_uppercase());
            key.push_str(chars.as_str());
        }
    }

    key.truncate(MAX_KEY_LENGTH);
    Some(key)
}

/// Returns `candidate` if it is free, otherwise the first free
/// `<stem><n>`.
///
/// If `candidate` ends with a number, `stem` is the part before the number
/// and the search starts at that number + 1; otherwise `stem` is the whole
/// candidate and the search starts at 1.
pub fn next_free_key(candidate: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(candidate) {
        return candidate.to_string();
    }

    let stem = candidate.trim_end_matches(|c: char| c.is_ascii_digit());
    let numbered = candidate
        .strip_prefix(stem)
        .and_then(|digits| digits.parse::<u64>().ok())
        .and_then(|n| n.checked_add(1))
        .filter(|_| !stem.is_empty());
    let (stem, mut suffix) = numbered.map_or((candidate, 1), |start| (stem, start));

    loop {
        let key = format!("{stem}{suffix}");
        if !is_taken(&key) {
            return key;
        }
        suffix = suffix.saturating_add(1);
    }
}
