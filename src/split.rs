use crate::constants::{BYTES_PER_MB, DEFAULT_SEG_SIZE_MB};
use crate::naming::part_path;
use std::fs::{self, File, Metadata};
use std::io::{self, BufRead, BufReader, Read};
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Number of bytes copied into each part (the last part may be shorter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentSize(NonZeroU64);

impl SegmentSize {
    /// Segment of `mb` units of [`BYTES_PER_MB`]. Zero is rejected.
    pub fn from_megabytes(mb: u32) -> Option<Self> {
        NonZeroU64::new(u64::from(mb) * BYTES_PER_MB).map(SegmentSize)
    }

    pub fn from_bytes(bytes: u64) -> Option<Self> {
        NonZeroU64::new(bytes).map(SegmentSize)
    }

    pub fn bytes(self) -> u64 {
        self.0.get()
    }
}

impl Default for SegmentSize {
    fn default() -> Self {
        SegmentSize(
            NonZeroU64::new(u64::from(DEFAULT_SEG_SIZE_MB) * BYTES_PER_MB)
                .unwrap_or(NonZeroU64::MIN),
        )
    }
}

#[derive(Debug, Clone)]
pub struct SplitRequest {
    pub source: PathBuf,
    pub segment: SegmentSize,
}

#[derive(Debug)]
pub struct SplitOutcome {
    pub parts: Vec<PathBuf>,
    pub bytes_read: u64,
    pub elapsed: Duration,
}

impl SplitOutcome {
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn summary(&self) -> String {
        format!(
            "Split into {} parts in {:.4} seconds",
            self.part_count(),
            self.elapsed.as_secs_f64()
        )
    }
}

/// Reported once per part, right after it has been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartWritten {
    pub index: u64,
    pub path: PathBuf,
    pub bytes: u64,
}

/// What a split would produce, computed from metadata only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPlan {
    pub file_len: u64,
    pub segment_bytes: u64,
    pub part_count: u64,
}

impl SplitPlan {
    /// True when the whole file fits in a single segment.
    pub fn smaller_than_segment(&self) -> bool {
        self.file_len < self.segment_bytes
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Not a regular file: {0}")]
    NotAFile(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Inspect `source` and report how many parts a split would create.
pub fn plan(source: &Path, segment: SegmentSize) -> Result<SplitPlan, SplitError> {
    let metadata = source_metadata(source)?;
    let segment_bytes = segment.bytes();
    Ok(SplitPlan {
        file_len: metadata.len(),
        segment_bytes,
        part_count: metadata.len().div_ceil(segment_bytes),
    })
}

/// Split the source file into `<source>.part1`, `<source>.part2`, ...
pub fn execute(request: &SplitRequest) -> Result<SplitOutcome, SplitError> {
    execute_with_progress(request, |_| {})
}

/// Like [`execute`], calling `on_part` after every part is written.
///
/// Parts already written stay on disk if a later read or write fails.
pub fn execute_with_progress<F>(
    request: &SplitRequest,
    mut on_part: F,
) -> Result<SplitOutcome, SplitError>
where
    F: FnMut(&PartWritten),
{
    let started = Instant::now();
    source_metadata(&request.source)?;
    let mut reader = BufReader::new(File::open(&request.source)?);
    let segment = request.segment.bytes();

    let mut parts = Vec::new();
    let mut bytes_read = 0u64;
    // An empty read ends the loop, so a length that is a multiple of the
    // segment never produces a trailing empty part.
    while !reader.fill_buf()?.is_empty() {
        let index = parts.len() as u64 + 1;
        let path = part_path(&request.source, index);
        let mut part = File::create(&path)?;
        let bytes = io::copy(&mut (&mut reader).take(segment), &mut part)?;
        bytes_read += bytes;
        debug!(index, bytes, path = %path.display(), "wrote part");

        let event = PartWritten { index, path, bytes };
        on_part(&event);
        parts.push(event.path);
    }

    let outcome = SplitOutcome {
        parts,
        bytes_read,
        elapsed: started.elapsed(),
    };
    info!(source = %request.source.display(), "{}", outcome.summary());
    Ok(outcome)
}

fn source_metadata(path: &Path) -> Result<Metadata, SplitError> {
    let metadata = fs::metadata(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => SplitError::NotFound(path.display().to_string()),
        _ => SplitError::Io(err),
    })?;
    if !metadata.is_file() {
        return Err(SplitError::NotAFile(path.display().to_string()));
    }
    Ok(metadata)
}
