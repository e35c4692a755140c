/// Scan and materialization configuration.
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Files strictly below this size are grouped into the small-files bucket.
pub const SMALL_FILE_THRESHOLD: u64 = 1024 * 1024;

/// Maximum number of progress messages that may queue up in the channel.
///
/// Per-directory status updates are dropped rather than queued once the
/// channel is full, so a slow consumer never stalls the scanner.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 4_096;

/// Configuration for a single scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Directory to scan.
    pub root: PathBuf,

    /// Capacity of the progress channel.
    #[serde(default = "default_channel_capacity")]
    pub progress_channel_capacity: usize,

    /// Rough number of entries to pre-allocate in the arena.
    #[serde(default = "default_estimated_entries")]
    pub estimated_entries: usize,
}

fn default_channel_capacity() -> usize {
    PROGRESS_CHANNEL_CAPACITY
}

fn default_estimated_entries() -> usize {
    16_384
}

impl ScanConfig {
    /// Create a config for scanning `root` with default tuning.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            progress_channel_capacity: default_channel_capacity(),
            estimated_entries: default_estimated_entries(),
        }
    }
}

/// How directory contents are grouped for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializeConfig {
    /// Files below this many bytes are candidates for bucketing.
    #[serde(default = "default_threshold")]
    pub small_file_threshold: u64,

    /// Group small files under a synthetic node.
    #[serde(default = "default_true")]
    pub bucket_small_files: bool,
}

fn default_threshold() -> u64 {
    SMALL_FILE_THRESHOLD
}

fn default_true() -> bool {
    true
}

impl Default for MaterializeConfig {
    fn default() -> Self {
        Self {
            small_file_threshold: SMALL_FILE_THRESHOLD,
            bucket_small_files: true,
        }
    }
}
