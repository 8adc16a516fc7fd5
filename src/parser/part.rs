//! Per-part decoding: header extraction, content filtering, body transforms.
//!
//! Every failure mode here is local to the part being processed. A malformed
//! part is skipped (with a reason) or falls back to its raw body; it never
//! aborts the run.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::warn;

use crate::model::part::{
    DecodedPart, PartBody, PartCategory, PartHeaders, PartOutcome, SkipReason,
};

/// Which categories an extraction run accepts.
///
/// The allow-list admits only the listed categories; the suppress flags
/// reject CSS/image parts even when the allow-list names them. HTML-only
/// mode admits HTML and nothing else.
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    pub allow: Option<Vec<PartCategory>>,
    pub no_css: bool,
    pub no_images: bool,
    pub html_only: bool,
}

impl ContentFilter {
    /// Whether a part of this category should be decoded and extracted.
    pub fn accepts(&self, category: PartCategory) -> bool {
        if self.html_only && category != PartCategory::Html {
            return false;
        }
        // Suppress flags win over an explicit allow-list entry.
        if self.no_css && category == PartCategory::Css {
            return false;
        }
        if self.no_images && category == PartCategory::Image {
            return false;
        }
        match &self.allow {
            Some(allow) => allow.contains(&category),
            None => true,
        }
    }
}

/// Process one raw part (header block + body block).
///
/// Returns the decoded payload, or the reason the part was skipped.
pub fn decode_part(raw: &str, filter: &ContentFilter) -> PartOutcome {
    let Some((header_block, raw_body)) = split_header_body(raw) else {
        return PartOutcome::Skipped(SkipReason::MissingSeparator);
    };

    let headers = parse_part_headers(header_block);
    let Some(content_type) = headers.content_type else {
        return PartOutcome::Skipped(SkipReason::MissingContentType);
    };

    let category = PartCategory::classify(&content_type);
    if !filter.accepts(category) {
        return PartOutcome::Skipped(SkipReason::Filtered);
    }

    let body = decode_body(headers.transfer_encoding.as_deref(), raw_body);

    PartOutcome::Decoded(DecodedPart {
        content_type,
        category,
        content_location: headers.content_location,
        content_id: headers.content_id,
        body,
    })
}

/// Split a raw part into header block and body block on the first blank line.
///
/// Accepts both bare (`\n\n`) and carriage-return-qualified (`\r\n\r\n`)
/// separators; whichever occurs first wins.
fn split_header_body(raw: &str) -> Option<(&str, &str)> {
    let bare = raw.find("\n\n");
    let qualified = raw.find("\r\n\r\n");
    match (bare, qualified) {
        (Some(b), Some(q)) if q < b => Some((&raw[..q], &raw[q + 4..])),
        (Some(b), _) => Some((&raw[..b], &raw[b + 2..])),
        (None, Some(q)) => Some((&raw[..q], &raw[q + 4..])),
        (None, None) => None,
    }
}

/// Extract the recognized fields from a header block.
///
/// Each field is located by a case-insensitive prefix match on its line;
/// the first occurrence wins. Unrecognized lines are ignored.
fn parse_part_headers(block: &str) -> PartHeaders {
    let mut headers = PartHeaders::default();
    for line in block.lines() {
        if let Some(value) = header_value(line, "content-type:") {
            if headers.content_type.is_none() {
                let media = value.split(';').next().unwrap_or("").trim();
                if !media.is_empty() {
                    headers.content_type = Some(media.to_string());
                }
            }
        } else if let Some(value) = header_value(line, "content-transfer-encoding:") {
            if headers.transfer_encoding.is_none() && !value.is_empty() {
                headers.transfer_encoding = Some(value.to_string());
            }
        } else if let Some(value) = header_value(line, "content-location:") {
            if headers.content_location.is_none() && !value.is_empty() {
                headers.content_location = Some(value.to_string());
            }
        } else if let Some(value) = header_value(line, "content-id:") {
            if headers.content_id.is_none() {
                let id = value.trim_start_matches('<').trim_end_matches('>').trim();
                if !id.is_empty() {
                    headers.content_id = Some(id.to_string());
                }
            }
        }
    }
    headers
}

/// The trimmed value of `line` if it starts with `prefix` (ASCII
/// case-insensitive), else `None`.
fn header_value<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(line[prefix.len()..].trim())
    } else {
        None
    }
}

/// Apply the Content-Transfer-Encoding transform to a raw body.
///
/// base64 bodies are whitespace-stripped and decoded to bytes;
/// quoted-printable bodies are decoded and reinterpreted as UTF-8 text with
/// replacement characters; identity encodings pass through. Any decode
/// failure falls back to the raw body.
fn decode_body(encoding: Option<&str>, raw_body: &str) -> PartBody {
    let Some(encoding) = encoding else {
        return PartBody::Text(raw_body.to_string());
    };

    match encoding.trim().to_ascii_lowercase().as_str() {
        "base64" => {
            let compact: String = raw_body.chars().filter(|c| !c.is_whitespace()).collect();
            match BASE64.decode(compact.as_bytes()) {
                Ok(bytes) => PartBody::Binary(bytes),
                Err(e) => {
                    warn!(error = %e, "Malformed base64 body, keeping raw content");
                    PartBody::Text(raw_body.to_string())
                }
            }
        }
        "quoted-printable" => {
            match quoted_printable::decode(raw_body.as_bytes(), quoted_printable::ParseMode::Robust)
            {
                Ok(bytes) => PartBody::Text(String::from_utf8_lossy(&bytes).into_owned()),
                Err(e) => {
                    warn!(error = %e, "Malformed quoted-printable body, keeping raw content");
                    PartBody::Text(raw_body.to_string())
                }
            }
        }
        "7bit" | "8bit" | "binary" => PartBody::Text(raw_body.to_string()),
        other => {
            warn!(encoding = other, "Unrecognized transfer encoding, passing body through");
            PartBody::Text(raw_body.to_string())
        }
    }
}
