/// Scanner module — runs the walker on a background thread.
///
/// The walker writes into a **shared `LiveTree`** (`Arc<RwLock<EntryTree>>`)
/// so a consumer can present the tree while it is still growing. The scanner
/// thread is the only writer; it holds the write lock once per directory.
pub mod listing;
pub mod progress;
pub mod walker;

use crate::aggregate;
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::model::EntryTree;
use listing::{FsLister, Lister};
use progress::ScanProgress;
use walker::{WalkOutcome, Walker};

use crossbeam_channel::Receiver;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{info, warn};

pub use crate::config::PROGRESS_CHANNEL_CAPACITY;

/// A shared, concurrently-readable entry tree.
///
/// The scanner holds a write lock briefly per committed directory.
/// Readers take short read locks; sizes only grow between two reads.
pub type LiveTree = Arc<RwLock<EntryTree>>;

/// Handle to a running or completed scan. Allows cancellation and
/// receiving progress updates.
pub struct ScanHandle {
    /// Receiver for progress updates from the scan thread.
    pub progress_rx: Receiver<ScanProgress>,
    /// Shared tree that is populated incrementally during scanning.
    pub live_tree: LiveTree,
    /// Flag to request cancellation.
    cancel_flag: Arc<AtomicBool>,
    /// Join handle for the scan thread.
    thread: Option<thread::JoinHandle<()>>,
}

impl ScanHandle {
    /// Request the scan to stop at its next directory boundary.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }

    /// `true` once the scan thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }
}

/// A dropped handle stops its scan; nobody is left to read the results.
impl Drop for ScanHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Start scanning the real filesystem on a background thread.
pub fn start_scan(config: ScanConfig) -> Result<ScanHandle, ScanError> {
    start_scan_with(config, FsLister)
}

/// Start a scan that reads directories through `lister`.
///
/// The root is validated and its entry created before this returns, so the
/// returned tree can be shown immediately. An invalid root is reported here
/// and no thread is spawned.
pub fn start_scan_with<L>(config: ScanConfig, lister: L) -> Result<ScanHandle, ScanError>
where
    L: Lister + 'static,
{
    let root_path =
        std::path::absolute(&config.root).map_err(|err| ScanError::io(&config.root, err))?;
    match lister.is_dir(&root_path) {
        Ok(true) => {}
        Ok(false) => return Err(ScanError::NotADirectory { path: root_path }),
        Err(err) => return Err(ScanError::io(root_path, err)),
    }

    let (progress_tx, progress_rx) =
        crossbeam_channel::bounded::<ScanProgress>(config.progress_channel_capacity.max(1));
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let cancel_clone = cancel_flag.clone();

    let live_tree: LiveTree = Arc::new(RwLock::new(EntryTree::with_capacity(
        root_path.clone(),
        config.estimated_entries,
    )));
    let tree_clone = live_tree.clone();

    let thread = thread::Builder::new()
        .name("diskmapper-scanner".into())
        .spawn(move || {
            info!("Starting scan of {}", root_path.display());
            let start = Instant::now();

            let mut walker = Walker::new(&lister, &tree_clone, &progress_tx, &cancel_clone);
            let outcome = walker.run();
            let stats = walker.stats();
            let duration = start.elapsed();

            match outcome {
                WalkOutcome::Completed => {
                    if cfg!(debug_assertions) {
                        if let Err(err) = aggregate::verify(&tree_clone.read()) {
                            warn!("Aggregation check failed: {err}");
                        }
                    }
                    info!(
                        "Scan complete: {} files, {} dirs, {} bytes in {duration:?} ({} skipped)",
                        stats.files_found, stats.dirs_found, stats.total_size, stats.skipped
                    );
                    let _ = progress_tx.send(ScanProgress::Complete { duration, stats });
                }
                WalkOutcome::Cancelled => {
                    info!(
                        "Scan cancelled after {duration:?}: {} files, {} dirs committed",
                        stats.files_found, stats.dirs_found
                    );
                    let _ = progress_tx.send(ScanProgress::Cancelled { duration, stats });
                }
            }
        })
        .map_err(ScanError::Spawn)?;

    Ok(ScanHandle {
        progress_rx,
        live_tree,
        cancel_flag,
        thread: Some(thread),
    })
}
