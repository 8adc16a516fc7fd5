//! Streaming archive splitter.
//!
//! Reads the source in bounded chunks and incrementally splits the
//! accumulated bytes on the multipart marker. Never loads the entire
//! archive into memory beyond the largest single part. Tolerant of
//! malformed input; a missing terminal marker only means the trailing
//! fragment is treated as a final part.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{ExtractError, Result};
use crate::parser::boundary::detect_boundary;

/// Smallest accepted read chunk (4 KiB).
pub const MIN_CHUNK_SIZE: usize = 4 * 1024;

/// Largest accepted read chunk (1 MiB).
pub const MAX_CHUNK_SIZE: usize = 1024 * 1024;

/// Pick the effective chunk size for a source of the given length.
///
/// An explicit request is silently clamped into the supported range. With no
/// request the size is tuned to roughly 1% of the source, clamped the same
/// way, balancing memory use against read-call overhead.
pub fn clamp_chunk_size(requested: Option<usize>, file_size: u64) -> usize {
    match requested {
        Some(size) => {
            let clamped = size.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE);
            if clamped != size {
                debug!(requested = size, effective = clamped, "Clamped chunk size");
            }
            clamped
        }
        None => (file_size / 100).clamp(MIN_CHUNK_SIZE as u64, MAX_CHUNK_SIZE as u64) as usize,
    }
}

/// Streaming splitter over one MHTML archive.
///
/// Walks the file sequentially, invoking a caller-supplied callback for every
/// boundary-delimited segment. Segment 0 is the envelope header block; the
/// caller is expected to skip it.
#[derive(Debug)]
pub struct StreamSplitter {
    path: PathBuf,
    file_size: u64,
    chunk_size: usize,
}

impl StreamSplitter {
    /// Create a splitter for the given archive.
    ///
    /// Verifies that the path exists and is a regular file, but does NOT
    /// validate that it is actually an MHTML document.
    pub fn new(path: impl AsRef<Path>, chunk_size: Option<usize>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = std::fs::metadata(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ExtractError::SourceNotFound(path.clone())
            } else {
                ExtractError::io(&path, e)
            }
        })?;
        if !metadata.is_file() {
            return Err(ExtractError::SourceNotAFile(path));
        }
        let file_size = metadata.len();
        Ok(Self {
            path,
            file_size,
            chunk_size: clamp_chunk_size(chunk_size, file_size),
        })
    }

    /// Total size of the underlying file in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Effective read chunk size in bytes.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Path to the archive.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Split the archive, calling `segment_callback` for every segment found.
    ///
    /// The callback receives `(index, raw_text)` and returns `true` to
    /// continue or `false` to abort early. Index 0 is the envelope. The
    /// optional progress callback receives `(bytes_read, file_size)` after
    /// each read.
    ///
    /// Until the boundary declaration has been discovered, everything read
    /// stays buffered. Once known, the boundary never changes for the rest
    /// of the run. On end-of-stream any remaining fragment other than the
    /// bare terminal `--` marker is forwarded as a final segment.
    ///
    /// Returns the number of segments forwarded.
    pub fn split(
        &self,
        segment_callback: &mut dyn FnMut(u64, &str) -> bool,
        progress_callback: Option<&dyn Fn(u64, u64)>,
    ) -> Result<u64> {
        let mut file = File::open(&self.path).map_err(|e| ExtractError::io(&self.path, e))?;

        // Owned accumulation buffer: extended per read, drained past each
        // forwarded segment. Never rebuilt from scratch.
        let mut buffer: Vec<u8> = Vec::with_capacity(self.chunk_size * 2);
        let mut chunk = vec![0u8; self.chunk_size];
        let mut marker: Vec<u8> = Vec::new();
        let mut index: u64 = 0;
        let mut bytes_read: u64 = 0;

        loop {
            let n = file
                .read(&mut chunk)
                .map_err(|e| ExtractError::io(&self.path, e))?;
            if n == 0 {
                break; // EOF
            }
            bytes_read += n as u64;
            buffer.extend_from_slice(&chunk[..n]);

            // The boundary is cached for the rest of the run once found.
            if marker.is_empty() {
                if let Some(boundary) = detect_boundary(&String::from_utf8_lossy(&buffer)) {
                    debug!(boundary = %boundary, "Discovered multipart boundary");
                    marker = format!("--{boundary}").into_bytes();
                }
            }

            if !marker.is_empty() {
                let mut start = 0;
                while let Some(pos) = find_subslice(&buffer[start..], &marker) {
                    let fragment = &buffer[start..start + pos];
                    if !segment_callback(index, &String::from_utf8_lossy(fragment)) {
                        return Ok(index + 1);
                    }
                    index += 1;
                    start += pos + marker.len();
                }
                // Retain the (possibly incomplete) trailing fragment.
                buffer.drain(..start);
            }

            if let Some(cb) = progress_callback {
                cb(bytes_read, self.file_size);
            }
        }

        if marker.is_empty() && !buffer.is_empty() {
            warn!(
                path = %self.path.display(),
                "No multipart boundary declaration found; nothing extracted"
            );
            return Ok(0);
        }

        // Flush the final fragment unless it is the bare terminal marker.
        let tail = String::from_utf8_lossy(&buffer);
        let trimmed = tail.trim();
        if !trimmed.is_empty() && trimmed != "--" && segment_callback(index, &tail) {
            index += 1;
        }

        if let Some(cb) = progress_callback {
            cb(self.file_size, self.file_size);
        }

        Ok(index)
    }
}

/// First occurrence of `needle` inside `haystack`.
#[inline]
fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
