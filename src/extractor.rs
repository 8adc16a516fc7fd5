//! One extraction run: split → decode → name → write → rewrite.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info};

use crate::error::Result;
use crate::extract::filename::{resolve_filename, Destination, DirDestination};
use crate::extract::rewrite::rewrite_links;
use crate::extract::writer::{check_writable, ensure_output_dir, write_part};
use crate::model::part::{PartCategory, PartOutcome};
use crate::model::stats::ExtractionStats;
use crate::parser::part::{decode_part, ContentFilter};
use crate::parser::splitter::StreamSplitter;

/// Options for one extraction run.
///
/// All values are assumed validated by the caller except the chunk size,
/// which is clamped into the supported range.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Destination directory for extracted files.
    pub output_dir: PathBuf,
    /// Read chunk size override; `None` auto-tunes from the source size.
    pub chunk_size: Option<usize>,
    /// Clear the destination directory before extraction.
    pub clear_output_dir: bool,
    /// Skip CSS parts and leave their references untouched.
    pub no_css: bool,
    /// Skip image parts and leave their references untouched.
    pub no_images: bool,
    /// Extract only HTML parts and skip the link-rewrite pass.
    pub html_only: bool,
    /// Parse, decode and classify, but write nothing.
    pub dry_run: bool,
    /// Restrict extraction to these categories.
    pub allow: Option<Vec<PartCategory>>,
}

/// Drives a full extraction of one MHTML archive.
///
/// Construction performs all fatal validation (source path, destination
/// writability); after that a run makes forward progress no matter how
/// malformed individual parts are.
pub struct Extractor {
    splitter: StreamSplitter,
    options: ExtractOptions,
    filter: ContentFilter,
}

impl Extractor {
    pub fn new(source: impl AsRef<Path>, options: ExtractOptions) -> Result<Self> {
        let splitter = StreamSplitter::new(source, options.chunk_size)?;
        if !options.dry_run {
            ensure_output_dir(&options.output_dir, options.clear_output_dir)?;
            check_writable(&options.output_dir)?;
        }
        let filter = ContentFilter {
            allow: options.allow.clone(),
            no_css: options.no_css,
            no_images: options.no_images,
            html_only: options.html_only,
        };
        Ok(Self {
            splitter,
            options,
            filter,
        })
    }

    /// Total size of the source archive in bytes.
    pub fn file_size(&self) -> u64 {
        self.splitter.file_size()
    }

    /// Run the extraction to completion.
    ///
    /// The optional progress callback receives `(bytes_read, file_size)`.
    pub fn run(&self, progress: Option<&dyn Fn(u64, u64)>) -> Result<ExtractionStats> {
        let started = Instant::now();
        let mut stats = ExtractionStats::default();
        let mut url_mapping: HashMap<String, String> = HashMap::new();
        let mut saved_html: Vec<String> = Vec::new();
        let destination = DirDestination::new(&self.options.output_dir);

        self.splitter.split(
            &mut |index, raw| {
                if index == 0 {
                    // The envelope header segment is never decoded as content.
                    return true;
                }
                stats.parts_seen += 1;

                match decode_part(raw, &self.filter) {
                    PartOutcome::Skipped(reason) => {
                        debug!(index, reason = reason.as_str(), "Skipped part");
                        stats.record_skip();
                    }
                    PartOutcome::Decoded(part) => {
                        // Collision checks need the real directory; in dry-run
                        // mode nothing is written, so no oracle is supplied.
                        let oracle: Option<&dyn Destination> = if self.options.dry_run {
                            None
                        } else {
                            Some(&destination)
                        };
                        let filename =
                            resolve_filename(part.content_location.as_deref(), &part.content_type, oracle);

                        if let Some(location) = &part.content_location {
                            url_mapping.insert(location.clone(), filename.clone());
                        }
                        if let Some(cid) = &part.content_id {
                            url_mapping.insert(format!("cid:{cid}"), filename.clone());
                        }

                        stats.record_part(part.category, part.body.len());

                        if self.options.dry_run {
                            info!(
                                filename = %filename,
                                content_type = %part.content_type,
                                category = part.category.as_str(),
                                "Dry run: would extract"
                            );
                        } else if write_part(&self.options.output_dir, &filename, &part.body)
                            && part.category == PartCategory::Html
                        {
                            saved_html.push(filename);
                        }
                    }
                }
                true
            },
            progress,
        )?;

        if !self.options.html_only && !saved_html.is_empty() {
            rewrite_links(
                &self.options.output_dir,
                &url_mapping,
                &saved_html,
                self.options.no_css,
                self.options.no_images,
            );
        }

        stats.elapsed = started.elapsed();
        info!(
            extracted = stats.extracted_count(),
            skipped = stats.skipped_count,
            bytes = stats.total_bytes,
            "Extraction finished"
        );
        Ok(stats)
    }
}
