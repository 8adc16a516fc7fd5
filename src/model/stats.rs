//! Counters accumulated over one extraction run.

use std::time::Duration;

use serde::Serialize;

use super::part::PartCategory;

/// Statistics for a completed extraction run.
///
/// Updated monotonically while the run is in progress; the orchestrator hands
/// out an immutable copy once the run finishes. The identity
/// `html + css + image + other == parts_seen - skipped` holds at all times
/// (the index-0 envelope segment is never counted).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionStats {
    /// Content parts encountered, accepted or not. Excludes the envelope.
    pub parts_seen: u64,
    pub html_count: u64,
    pub css_count: u64,
    pub image_count: u64,
    /// Everything not classified as html/css/image, including javascript.
    pub other_count: u64,
    /// Parts rejected before decoding (no separator, no content type, filtered).
    pub skipped_count: u64,
    /// Cumulative decoded size in bytes (UTF-8 length for textual bodies).
    pub total_bytes: u64,
    /// Wall time of the run.
    pub elapsed: Duration,
}

impl ExtractionStats {
    /// Record one accepted, decoded part.
    pub fn record_part(&mut self, category: PartCategory, decoded_bytes: usize) {
        match category {
            PartCategory::Html => self.html_count += 1,
            PartCategory::Css => self.css_count += 1,
            PartCategory::Image => self.image_count += 1,
            PartCategory::JavaScript | PartCategory::Other => self.other_count += 1,
        }
        self.total_bytes += decoded_bytes as u64;
    }

    /// Record one skipped part.
    pub fn record_skip(&mut self) {
        self.skipped_count += 1;
    }

    /// Number of parts that were actually decoded and reported.
    pub fn extracted_count(&self) -> u64 {
        self.parts_seen - self.skipped_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_counters() {
        let mut stats = ExtractionStats::default();
        stats.parts_seen = 5;
        stats.record_part(PartCategory::Html, 10);
        stats.record_part(PartCategory::Css, 20);
        stats.record_part(PartCategory::Image, 30);
        stats.record_part(PartCategory::JavaScript, 5);
        stats.record_skip();

        assert_eq!(stats.html_count, 1);
        assert_eq!(stats.css_count, 1);
        assert_eq!(stats.image_count, 1);
        // javascript lands in the "other" bucket
        assert_eq!(stats.other_count, 1);
        assert_eq!(stats.total_bytes, 65);
        assert_eq!(stats.extracted_count(), 4);
        assert_eq!(
            stats.html_count
                + stats.css_count
                + stats.image_count
                + stats.other_count
                + stats.skipped_count,
            stats.parts_seen
        );
    }
}
