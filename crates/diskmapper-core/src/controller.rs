/// Scan controller — owns at most one background scan and turns its
/// progress messages into status a front-end can show.
///
/// Front-ends call [`ScanController::poll`] from their own loop (once per
/// frame, once per tick); it never blocks. The entry tree itself is read
/// through the [`LiveTree`] returned by `start`.
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::scanner::listing::{FsLister, Lister};
use crate::scanner::progress::{ScanProgress, ScanStats};
use crate::scanner::{self, LiveTree, ScanHandle};
use crossbeam_channel::{RecvError, TryRecvError};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Maximum number of progress messages drained per `poll` call.
///
/// Prevents a backlog from blocking the caller's loop for a perceptible
/// duration.
const MAX_MESSAGES_PER_POLL: usize = 300;

const STATUS_IDLE: &str = "Idle";
const STATUS_COMPLETE: &str = "Scan complete";
const STATUS_CANCELLED: &str = "Scan cancelled";
const STATUS_ABORTED: &str = "Scan stopped unexpectedly";

/// How the last scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed,
    Cancelled,
    /// The scanner thread went away without a final message.
    Aborted,
}

/// Runs one scan at a time and tracks its status.
pub struct ScanController {
    handle: Option<ScanHandle>,
    live_tree: Option<LiveTree>,
    status: String,
    stats: ScanStats,
    root_listed: bool,
    outcome: Option<ScanOutcome>,
    duration: Option<Duration>,
}

impl Default for ScanController {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanController {
    pub fn new() -> Self {
        Self {
            handle: None,
            live_tree: None,
            status: STATUS_IDLE.to_string(),
            stats: ScanStats::default(),
            root_listed: false,
            outcome: None,
            duration: None,
        }
    }

    /// Start scanning `root` on the real filesystem.
    pub fn start(&mut self, root: impl Into<PathBuf>) -> Result<LiveTree, ScanError> {
        self.start_with(ScanConfig::new(root), FsLister)
    }

    /// Start a scan with explicit configuration and listing source.
    ///
    /// Rejected with [`ScanError::AlreadyRunning`] while a scan is active.
    /// An invalid root is rejected without touching the previous results.
    pub fn start_with<L>(&mut self, config: ScanConfig, lister: L) -> Result<LiveTree, ScanError>
    where
        L: Lister + 'static,
    {
        if self.is_running() {
            return Err(ScanError::AlreadyRunning);
        }

        let handle = scanner::start_scan_with(config, lister)?;
        let live_tree = handle.live_tree.clone();
        self.status = format!("Scanning: {}", live_tree.read().root_path().display());
        self.stats = ScanStats::default();
        self.root_listed = false;
        self.outcome = None;
        self.duration = None;
        self.live_tree = Some(live_tree.clone());
        self.handle = Some(handle);
        Ok(live_tree)
    }

    /// Ask the running scan to stop at its next directory boundary.
    ///
    /// Advisory only; the scan reports `Cancelled` once it has stopped.
    pub fn cancel(&self) {
        if let Some(ref handle) = self.handle {
            handle.cancel();
        }
    }

    /// Drain pending progress messages without blocking.
    ///
    /// Returns `true` if anything changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        for _ in 0..MAX_MESSAGES_PER_POLL {
            let received = match self.handle.as_ref() {
                Some(handle) => handle.progress_rx.try_recv(),
                None => break,
            };
            match received {
                Ok(msg) => {
                    changed = true;
                    self.apply(msg);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.finish_aborted();
                    changed = true;
                    break;
                }
            }
        }
        changed
    }

    /// Block until the running scan finishes, then return how it ended.
    pub fn wait(&mut self) -> Option<ScanOutcome> {
        loop {
            let received = match self.handle.as_ref() {
                Some(handle) => handle.progress_rx.recv(),
                None => return self.outcome,
            };
            match received {
                Ok(msg) => self.apply(msg),
                Err(RecvError) => self.finish_aborted(),
            }
        }
    }

    fn apply(&mut self, msg: ScanProgress) {
        match msg {
            ScanProgress::RootListed => self.root_listed = true,
            ScanProgress::Update {
                stats,
                current_path,
            } => {
                self.stats = stats;
                self.status = format!("Scanning: {current_path}");
            }
            ScanProgress::Skipped { path, .. } => {
                self.stats.skipped += 1;
                self.status = format!("Scanning: {path}");
            }
            ScanProgress::Complete { duration, stats } => {
                self.finish(ScanOutcome::Completed, STATUS_COMPLETE, stats, duration);
            }
            ScanProgress::Cancelled { duration, stats } => {
                self.finish(ScanOutcome::Cancelled, STATUS_CANCELLED, stats, duration);
            }
        }
    }

    fn finish(&mut self, outcome: ScanOutcome, status: &str, stats: ScanStats, duration: Duration) {
        self.stats = stats;
        self.duration = Some(duration);
        self.outcome = Some(outcome);
        self.status = status.to_string();
        self.handle = None;
    }

    fn finish_aborted(&mut self) {
        warn!("Scanner channel closed before the scan reported completion");
        self.outcome = Some(ScanOutcome::Aborted);
        self.status = STATUS_ABORTED.to_string();
        self.handle = None;
    }

    /// `true` while a scan is in progress.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Human-readable status, e.g. `"Scanning: /home/user/src"`.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Latest counters reported by the scanner.
    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    /// `true` once the root's immediate children are available.
    pub fn root_listed(&self) -> bool {
        self.root_listed
    }

    /// How the last scan ended, or `None` while running / before any scan.
    pub fn outcome(&self) -> Option<ScanOutcome> {
        self.outcome
    }

    /// Wall-clock duration of the last finished scan.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// The tree of the current or most recent scan.
    pub fn live_tree(&self) -> Option<&LiveTree> {
        self.live_tree.as_ref()
    }
}
