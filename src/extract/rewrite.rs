//! Post-pass link rewriting inside extracted HTML files.
//!
//! Runs once after the whole archive has been consumed, because the resolved
//! filenames for later parts are not known while earlier HTML parts are
//! being written.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

/// Extensions treated as images by the suppress-images flag.
const IMAGE_EXTENSIONS: [&str; 8] =
    [".png", ".jpg", ".jpeg", ".gif", ".bmp", ".webp", ".svg", ".ico"];

/// Replace every occurrence of each mapped locator with its resolved
/// filename, in every saved HTML file.
///
/// Keys are consumed longest first: locators frequently share prefixes, and
/// replacing a shorter key first would corrupt occurrences of a longer key
/// it is a substring of. Files are written back only when their content
/// actually changed. A failure on one file never prevents rewriting the
/// others.
pub fn rewrite_links(
    output_dir: &Path,
    url_mapping: &HashMap<String, String>,
    saved_html: &[String],
    no_css: bool,
    no_images: bool,
) {
    let mut keys: Vec<&String> = url_mapping.keys().collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    for filename in saved_html {
        let path = output_dir.join(filename);
        let mut content = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read HTML file for rewriting");
                continue;
            }
        };

        let mut changed = false;
        for key in &keys {
            let replacement = &url_mapping[*key];
            if no_css && replacement.ends_with(".css") {
                continue;
            }
            if no_images && IMAGE_EXTENSIONS.iter().any(|ext| replacement.ends_with(ext)) {
                continue;
            }
            if content.contains(key.as_str()) {
                content = content.replace(key.as_str(), replacement);
                changed = true;
            }
        }

        if changed {
            if let Err(e) = std::fs::write(&path, &content) {
                warn!(path = %path.display(), error = %e, "Failed to rewrite links");
            } else {
                debug!(file = %filename, "Rewrote resource links");
            }
        }
    }
}
