//! Multipart boundary detection.
//!
//! The envelope headers declare the delimiter as `boundary="…"` or
//! `boundary=…` inside the Content-Type value. Detection runs against
//! whatever header text has been read so far, so it must behave on a
//! truncated buffer: return `None` until the declaration is complete.

/// Scan accumulated header text for the multipart boundary declaration.
///
/// Tries the quoted form first, then the unquoted form, case-insensitively.
/// Returns the first non-empty match trimmed of surrounding whitespace.
/// Safe to call repeatedly on a growing buffer.
pub fn detect_boundary(header_text: &str) -> Option<String> {
    quoted_boundary(header_text).or_else(|| unquoted_boundary(header_text))
}

const DECLARATION: &str = "boundary=";

/// `boundary="value"` — the value runs to the closing quote.
fn quoted_boundary(text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    let mut from = 0;
    while let Some(rel) = lower[from..].find(DECLARATION) {
        let after = from + rel + DECLARATION.len();
        if let Some(inner) = text[after..].strip_prefix('"') {
            // No closing quote yet means the declaration is still being
            // buffered; a later call will see the rest.
            if let Some(end) = inner.find('"') {
                let value = inner[..end].trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
        from = after;
    }
    None
}

/// `boundary=value` — the value runs to the next `;` or line terminator.
///
/// The terminator must already be in the buffer; otherwise the value could
/// be truncated mid-token and a shorter boundary cached for the whole run.
fn unquoted_boundary(text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    let mut from = 0;
    while let Some(rel) = lower[from..].find(DECLARATION) {
        let after = from + rel + DECLARATION.len();
        let rest = &text[after..];
        if !rest.starts_with('"') {
            if let Some(end) = rest.find(|c: char| c == ';' || c == '\r' || c == '\n') {
                let value = rest[..end].trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
        from = after;
    }
    None
}
