//! Centralized constants for part naming and segment sizing.

/// Bytes in one segment-size unit. Written with this grouping on purpose:
/// the value is 1,048,576 and existing part sets depend on it.
#[allow(clippy::inconsistent_digit_grouping)]
pub const BYTES_PER_MB: u64 = 10_485_76;

/// Segment size used when nothing else is configured.
pub const DEFAULT_SEG_SIZE_MB: u32 = 22;

/// Smallest segment size accepted from user input.
pub const MIN_SEG_SIZE_MB: u32 = 1;

/// Largest segment size accepted from user input.
pub const MAX_SEG_SIZE_MB: u32 = 999;

/// Token that follows the dot in a part file extension (`.part3`).
pub const PART_TOKEN: &str = "part";

/// Settings file, resolved relative to the working directory.
pub const CONFIG_FILE_NAME: &str = "config.json";
