//! Deterministic, collision-safe output filenames.
//!
//! A part with a Content-Location gets a name derived from its locator plus
//! a digest of the full locator string, so distinct resources that share a
//! final path segment still get distinct names. Parts without a locator get
//! a random identifier. Resolution never fails; every fallback path yields
//! a usable name.

use std::path::PathBuf;

use md5::{Digest, Md5};
use percent_encoding::percent_decode_str;
use uuid::Uuid;

/// Base name used when a locator yields nothing usable.
const UNNAMED: &str = "unnamed";

/// Longest sanitized base name kept before the digest suffix.
const MAX_BASE_LEN: usize = 100;

/// Existence oracle for the destination directory.
///
/// Injected into filename resolution so collision handling can be tested
/// against an in-memory fake instead of real disk I/O.
pub trait Destination {
    /// Whether a file of this name already exists in the destination.
    fn exists(&self, name: &str) -> bool;
}

/// Directory-backed destination.
pub struct DirDestination {
    dir: PathBuf,
}

impl DirDestination {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Destination for DirDestination {
    fn exists(&self, name: &str) -> bool {
        self.dir.join(name).exists()
    }
}

/// Compute the output filename for a part.
///
/// With a Content-Location: `<base>_<md5-of-locator><ext>`, where `<base>`
/// is the percent-decoded final path segment (or the host when the path is
/// empty) sanitized for the filesystem. Without one: a random v4 UUID plus
/// the inferred extension. When a destination oracle is supplied (i.e. not
/// in dry-run mode) and the name is taken, a numeric suffix is inserted
/// before the extension and incremented until the name is free.
pub fn resolve_filename(
    content_location: Option<&str>,
    content_type: &str,
    destination: Option<&dyn Destination>,
) -> String {
    let extension = extension_for(content_type);

    let Some(location) = content_location else {
        return format!("{}{extension}", Uuid::new_v4());
    };

    let base = sanitize_base_name(&locator_base_name(location));

    // The digest covers the original, un-decoded locator string, so
    // `a/b.png` and `a/b.png?x=1` resolve to different names.
    let mut hasher = Md5::new();
    hasher.update(location.as_bytes());
    let digest = format!("{:x}", hasher.finalize());

    let filename = format!("{base}_{digest}{extension}");
    match destination {
        Some(dest) => unique_name(&filename, extension, dest),
        None => filename,
    }
}

/// Final path segment of a locator (percent-decoded), or the host component
/// when the path has no usable segment.
fn locator_base_name(location: &str) -> String {
    let location = location.trim();

    // Query and fragment never contribute to the base name.
    let stripped = location
        .split('#')
        .next()
        .and_then(|s| s.split('?').next())
        .unwrap_or("");

    let after_scheme = match stripped.find("://") {
        Some(pos) => &stripped[pos + 3..],
        None => stripped.strip_prefix("cid:").unwrap_or(stripped),
    };

    let (host, path) = match after_scheme.find('/') {
        Some(pos) => (&after_scheme[..pos], &after_scheme[pos..]),
        None => (after_scheme, ""),
    };

    let segment = path.rsplit('/').next().unwrap_or("");
    let decoded = percent_decode_str(segment).decode_utf8_lossy();
    if decoded.trim().is_empty() {
        host.to_string()
    } else {
        decoded.into_owned()
    }
}

/// Replace characters illegal in filenames with `_`; never returns empty.
fn sanitize_base_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '.' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_BASE_LEN)
        .collect();

    if sanitized.is_empty() {
        UNNAMED.to_string()
    } else {
        sanitized
    }
}

/// If `filename` is taken, insert a counter before the extension until free.
fn unique_name(filename: &str, extension: &str, dest: &dyn Destination) -> String {
    if !dest.exists(filename) {
        return filename.to_string();
    }

    let stem = filename.strip_suffix(extension).unwrap_or(filename);
    for counter in 1..10_000u32 {
        let candidate = format!("{stem}_{counter}{extension}");
        if !dest.exists(&candidate) {
            return candidate;
        }
    }

    // Practically unreachable; still guaranteed unique.
    format!("{stem}_{}{extension}", Uuid::new_v4())
}

/// File extension implied by a media type. Unknown types get none.
fn extension_for(content_type: &str) -> &'static str {
    match content_type.to_ascii_lowercase().as_str() {
        "text/html" | "application/xhtml+xml" => ".html",
        "text/css" => ".css",
        "text/javascript" | "application/javascript" | "application/x-javascript" => ".js",
        "application/json" => ".json",
        "text/plain" => ".txt",
        "text/xml" | "application/xml" => ".xml",
        "image/png" => ".png",
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "image/svg+xml" => ".svg",
        "image/bmp" => ".bmp",
        "image/x-icon" | "image/vnd.microsoft.icon" => ".ico",
        "font/woff" | "application/font-woff" => ".woff",
        "font/woff2" => ".woff2",
        "application/octet-stream" => ".bin",
        _ => "",
    }
}
