//! `.properties` reader and writer.
//!
//! Supports `key=value`, `key: value` and `key value` pairs, `#`/`!`
//! comments, backslash line continuations and the escapes `\t \n \r \f \\`
//! and `\uXXXX` (including surrogate pairs). Files are read and written as
//! UTF-8.

use std::collections::BTreeMap;
use std::str::Chars;

use super::FormatError;

/// Characters separating a key from its value
const SEPARATORS: [char; 2] = ['=', ':'];

/// Whitespace allowed around keys and separators
const WHITESPACE: [char; 3] = [' ', '\t', '\x0c'];

/// Parses properties text into key → value pairs. Later duplicates win.
pub fn parse(content: &str) -> Result<BTreeMap<String, String>, FormatError> {
    let mut result = BTreeMap::new();
    let mut lines = content.lines().enumerate();

    while let Some((index, line)) = lines.next() {
        let line_number = index + 1;
        let trimmed = line.trim_start_matches(WHITESPACE);
        if trimmed.is_empty() || trimmed.starts_with(['#', '!']) {
            continue;
        }

        let mut logical = trimmed.to_string();
        while has_continuation(&logical) {
            logical.pop();
            let Some((_, next)) = lines.next() else {
                break;
            };
            logical.push_str(next.trim_start_matches(WHITESPACE));
        }

        let (key, value) = split_key_value(&logical);
        result.insert(unescape(key, line_number)?, unescape(value, line_number)?);
    }

    Ok(result)
}

/// Renders key → value pairs in key order, one `key=value` per line.
#[must_use]
pub fn render(texts: &BTreeMap<&str, &str>) -> String {
    let mut out = String::new();
    for (key, value) in texts {
        escape_into(&mut out, key, true);
        out.push('=');
        escape_into(&mut out, value, false);
        out.push('\n');
    }
    out
}

/// An odd number of trailing backslashes continues the line.
fn has_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Splits a logical line at the first unescaped separator or whitespace.
fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (index, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if SEPARATORS.contains(&c) || WHITESPACE.contains(&c) {
            key_end = index;
            break;
        }
    }

    let (key, rest) = line.split_at(key_end);
    let rest = rest.trim_start_matches(WHITESPACE);
    let rest = rest.strip_prefix(SEPARATORS).unwrap_or(rest);
    (key, rest.trim_start_matches(WHITESPACE))
}

fn unescape(text: &str, line: usize) -> Result<String, FormatError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => out.push(unicode_escape(&mut chars, line)?),
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

/// Decodes the hex digits after `\u`, joining UTF-16 surrogate pairs.
fn unicode_escape(chars: &mut Chars<'_>, line: usize) -> Result<char, FormatError> {
    let high = hex4(chars, line)?;
    if !(0xD800..=0xDBFF).contains(&high) {
        return char::from_u32(high).ok_or(FormatError::InvalidEscape { line });
    }

    if chars.next() != Some('\\') || chars.next() != Some('u') {
        return Err(FormatError::InvalidEscape { line });
    }
    let low = hex4(chars, line)?;
    if !(0xDC00..=0xDFFF).contains(&low) {
        return Err(FormatError::InvalidEscape { line });
    }

    char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
        .ok_or(FormatError::InvalidEscape { line })
}

fn hex4(chars: &mut Chars<'_>, line: usize) -> Result<u32, FormatError> {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.len() != 4 {
        return Err(FormatError::InvalidEscape { line });
    }
    u32::from_str_radix(&hex, 16).map_err(|_| FormatError::InvalidEscape { line })
}

fn escape_into(out: &mut String, text: &str, is_key: bool) {
    for (index, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0c' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            ' ' if is_key || index == 0 => out.push_str("\\ "),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", u32::from(c))),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::equals("key=value", "key", "value")]
    #[case::colon("key: value", "key", "value")]
    #[case::whitespace("key value", "key", "value")]
    #[case::spaces_around("  key  =  value", "key", "value")]
    #[case::empty_value("key=", "key", "")]
    #[case::key_only("key", "key", "")]
    #[case::escaped_separator_in_key("a\\=b=c", "a=b", "c")]
    #[case::escaped_space_in_key("a\\ b=c", "a b", "c")]
    #[case::separator_in_value("key=a=b:c", "key", "a=b:c")]
    #[case::escapes("key=line1\\nline2\\ttab", "key", "line1\nline2\ttab")]
    #[case::unicode("key=gr\\u00FCn", "key", "grün")]
    #[case::surrogate_pair("key=\\uD83D\\uDE00", "key", "😀")]
    #[case::utf8("key=grün", "key", "grün")]
    #[case::trailing_spaces_kept("key=value  ", "key", "value  ")]
    fn parse_single_pair(#[case] input: &str, #[case] key: &str, #[case] value: &str) {
        let result = parse(input).unwrap();

        assert_that!(result.len(), eq(1));
        assert_that!(result.get(key), some(eq(&value.to_string())));
    }

    #[rstest]
    fn parse_skips_comments_and_blank_lines() {
        let input = "# comment\n! other comment\n\n   \nkey=value\n";

        let result = parse(input).unwrap();

        assert_that!(result.len(), eq(1));
    }

    #[rstest]
    fn parse_joins_continuation_lines() {
        let input = "key=first \\\n    second\nother=x";

        let result = parse(input).unwrap();

        assert_that!(result.get("key"), some(eq(&"first second".to_string())));
        assert_that!(result.get("other"), some(eq(&"x".to_string())));
    }

    #[rstest]
    fn parse_even_backslashes_do_not_continue() {
        let input = "key=ends with \\\\\nother=x";

        let result = parse(input).unwrap();

        assert_that!(result.get("key"), some(eq(&"ends with \\".to_string())));
        assert_that!(result.len(), eq(2));
    }

    #[rstest]
    #[case::short("key=\\u12")]
    #[case::not_hex("key=\\uZZZZ")]
    #[case::lone_high_surrogate("key=\\uD83Dx")]
    fn parse_rejects_bad_unicode_escape(#[case] input: &str) {
        assert!(matches!(parse(input), Err(FormatError::InvalidEscape { line: 1 })));
    }

    #[rstest]
    fn render_escapes_and_sorts() {
        let texts: BTreeMap<&str, &str> =
            [("b key", " leading"), ("a", "x=y\nz")].into_iter().collect();

        let rendered = render(&texts);

        assert_that!(rendered, eq("a=x\\=y\\nz\nb\\ key=\\ leading\n"));
    }

    #[rstest]
    fn render_then_parse_keeps_tricky_texts() {
        let texts: BTreeMap<&str, &str> = [
            ("path", "C:\\temp\\"),
            ("hash", "#not a comment"),
            ("spaces", "  two leading, trailing  "),
            ("multi", "a\nb\r\nc"),
            ("unicode", "日本語 😀"),
        ]
        .into_iter()
        .collect();

        let parsed = parse(&render(&texts)).unwrap();

        for (key, value) in &texts {
            assert_that!(parsed.get(*key), some(eq(&(*value).to_string())));
        }
    }
}
