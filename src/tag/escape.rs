//! Escaping of tag property keys, values and text.
//!
//! The grammar reserves `[`, `]`, `"` and `\`. Each is written with a
//! leading backslash; the reader drops the backslash and keeps the next
//! byte verbatim.

/// Characters that must be escaped on write.
pub const RESERVED: [char; 4] = ['[', ']', '"', '\\'];

/// Escape `raw` for embedding in a tag.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Undo [`escape`]. A trailing lone backslash is kept as-is.
///
/// The parser decodes escapes inline as bytes arrive; this is the
/// whole-string form its tests compare against.
#[cfg(test)]
pub(crate) fn unescape(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
