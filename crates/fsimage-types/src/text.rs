//! Conversion of raw names to tab-separated-safe text.

use std::borrow::Cow;

/// Escape `\0`, tab, newline and carriage return as `\x00`, `\t`, `\n`, `\r`.
///
/// Borrows the input when nothing needs escaping.
#[must_use]
pub fn escape_control(input: &str) -> Cow<'_, str> {
    if !input.contains(['\0', '\t', '\n', '\r']) {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len() + 8);
    for ch in input.chars() {
        match ch {
            '\0' => out.push_str("\\x00"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

/// Decode a raw inode name (lossy UTF-8) and escape control characters.
#[must_use]
pub fn name_to_text(name: &[u8]) -> String {
    escape_control(&String::from_utf8_lossy(name)).into_owned()
}
