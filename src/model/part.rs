//! Archive part types: headers, category, decoded body, and the per-part outcome.

/// Coarse content category of a part, derived from its media type by
/// substring match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartCategory {
    Html,
    Css,
    Image,
    JavaScript,
    Other,
}

impl PartCategory {
    /// Classify a media type (e.g. `"text/html"`).
    ///
    /// Anything not matching html/css/image/javascript is `Other`.
    pub fn classify(content_type: &str) -> Self {
        let ct = content_type.to_ascii_lowercase();
        if ct.contains("html") {
            Self::Html
        } else if ct.contains("css") {
            Self::Css
        } else if ct.contains("image") || ct.contains("img") {
            Self::Image
        } else if ct.contains("javascript") {
            Self::JavaScript
        } else {
            Self::Other
        }
    }

    /// Parse a category name as given on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "html" => Some(Self::Html),
            "css" => Some(Self::Css),
            "image" | "images" | "img" => Some(Self::Image),
            "javascript" | "js" => Some(Self::JavaScript),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Css => "css",
            Self::Image => "image",
            Self::JavaScript => "javascript",
            Self::Other => "other",
        }
    }
}

/// The header fields recognized inside a part's header block.
///
/// Everything else in the block is ignored.
#[derive(Debug, Clone, Default)]
pub struct PartHeaders {
    /// Media type, already trimmed to the text before the first `;`.
    pub content_type: Option<String>,
    /// Content-Transfer-Encoding value, verbatim.
    pub transfer_encoding: Option<String>,
    /// Content-Location value as given in the archive.
    pub content_location: Option<String>,
    /// Content-ID with the surrounding `<…>` removed.
    pub content_id: Option<String>,
}

/// A decoded part body.
///
/// Textual bodies keep their string form until write time; binary bodies
/// (successfully base64-decoded) are raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum PartBody {
    Text(String),
    Binary(Vec<u8>),
}

impl PartBody {
    /// The body as bytes — UTF-8 encoding for textual content.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(s) => s.as_bytes(),
            Self::Binary(b) => b,
        }
    }

    /// Decoded size in bytes (UTF-8 length for textual content).
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

/// A part that passed header extraction, filtering, and decoding.
#[derive(Debug, Clone)]
pub struct DecodedPart {
    pub content_type: String,
    pub category: PartCategory,
    pub content_location: Option<String>,
    pub content_id: Option<String>,
    pub body: PartBody,
}

/// Why a part was skipped instead of decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No blank line between header block and body block.
    MissingSeparator,
    /// No Content-Type header.
    MissingContentType,
    /// Rejected by the allow-list or a suppress flag.
    Filtered,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingSeparator => "missing header/body separator",
            Self::MissingContentType => "missing content type",
            Self::Filtered => "filtered out",
        }
    }
}

/// Result of processing one raw part: payload or skip-with-reason.
///
/// Skips are aggregated into statistics by the orchestrator; they are never
/// errors and never abort a run.
#[derive(Debug, Clone)]
pub enum PartOutcome {
    Decoded(DecodedPart),
    Skipped(SkipReason),
}
