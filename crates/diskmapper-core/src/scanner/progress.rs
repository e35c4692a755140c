/// Scan progress reporting — lightweight messages sent from the scan
/// thread to the consumer via a crossbeam channel.
use std::time::Duration;

/// Running totals of what the scanner has committed to the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Files committed so far.
    pub files_found: u64,
    /// Directories committed so far, root included.
    pub dirs_found: u64,
    /// Bytes propagated to the root so far.
    pub total_size: u64,
    /// Directories that could not be listed and were left empty.
    pub skipped: u64,
}

/// Progress updates sent from the scan thread.
///
/// The actual tree data is in the shared `LiveTree`; these messages
/// carry only counters and status.
#[derive(Debug, Clone)]
pub enum ScanProgress {
    /// The root's immediate children are in the tree and can be shown.
    RootListed,
    /// Sent once per directory visited. May be dropped if the consumer lags.
    Update {
        stats: ScanStats,
        current_path: String,
    },
    /// A directory could not be listed and was committed as empty.
    Skipped { path: String, message: String },
    /// Every reachable directory has been listed.
    Complete { duration: Duration, stats: ScanStats },
    /// The scan stopped early on request. The partial tree stays consistent.
    Cancelled { duration: Duration, stats: ScanStats },
}

impl ScanProgress {
    /// `true` for the last message a scan will ever send.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScanProgress::Complete { .. } | ScanProgress::Cancelled { .. }
        )
    }
}
