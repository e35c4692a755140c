/// Single-threaded, cancellable directory walker.
///
/// Directories are expanded depth-first in listing order. For each one the
/// walker:
///
/// 1. checks the cancellation flag,
/// 2. lists the directory *outside* the tree lock (the slow syscall),
/// 3. takes the write lock once to install the children and propagate the
///    bytes of the files found at this level to every ancestor,
/// 4. queues the child directories.
///
/// Because a level's file bytes are committed together with its listing,
/// every listed directory's size always equals the files committed below it,
/// whether the walk finishes or is cancelled halfway.
///
/// The work stack replaces call-stack recursion, so deep trees cannot
/// overflow the scanner thread's stack.
use super::listing::Lister;
use super::progress::{ScanProgress, ScanStats};
use super::LiveTree;
use crate::aggregate;
use crate::model::{Entry, EntryTree, NodeIndex};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// How a walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    Completed,
    Cancelled,
}

/// State for one walk over a live tree.
pub struct Walker<'a, L: Lister + ?Sized> {
    lister: &'a L,
    live_tree: &'a LiveTree,
    progress_tx: &'a Sender<ScanProgress>,
    cancel_flag: &'a AtomicBool,
    stats: ScanStats,
}

impl<'a, L: Lister + ?Sized> Walker<'a, L> {
    pub fn new(
        lister: &'a L,
        live_tree: &'a LiveTree,
        progress_tx: &'a Sender<ScanProgress>,
        cancel_flag: &'a AtomicBool,
    ) -> Self {
        Self {
            lister,
            live_tree,
            progress_tx,
            cancel_flag,
            stats: ScanStats {
                dirs_found: 1, // count the root
                ..ScanStats::default()
            },
        }
    }

    /// Totals committed so far.
    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    /// Walk everything below the tree's root.
    pub fn run(&mut self) -> WalkOutcome {
        let root = EntryTree::ROOT;
        let mut pending: Vec<NodeIndex> = vec![root];

        while let Some(dir) = pending.pop() {
            if self.cancel_flag.load(Ordering::Relaxed) {
                debug!("Walk cancelled with {} directories pending", pending.len() + 1);
                return WalkOutcome::Cancelled;
            }

            let path = self.live_tree.read().path(dir);
            let current_path = path.to_string_lossy().into_owned();

            let listing = match self.lister.list(&path) {
                Ok(listing) => listing,
                Err(err) => {
                    debug!("Cannot list {current_path}: {err}");
                    if let Err(err) = self.live_tree.write().mark_unreadable(dir) {
                        warn!("{err}");
                    }
                    self.stats.skipped += 1;
                    let _ = self.progress_tx.try_send(ScanProgress::Skipped {
                        path: current_path,
                        message: err.to_string(),
                    });
                    if dir == root {
                        let _ = self.progress_tx.send(ScanProgress::RootListed);
                    }
                    continue;
                }
            };

            // Build entries before taking the lock.
            let mut direct_bytes: u64 = 0;
            let mut files: u64 = 0;
            let mut dirs: u64 = 0;
            let entries: Vec<Entry> = listing
                .into_iter()
                .map(|listed| {
                    if listed.is_dir {
                        dirs += 1;
                        Entry::new_dir("", Some(dir)).with_os_name(&listed.name)
                    } else {
                        files += 1;
                        direct_bytes = direct_bytes.saturating_add(listed.len);
                        Entry::new_file("", listed.len, Some(dir)).with_os_name(&listed.name)
                    }
                })
                .collect();

            {
                let mut tree = self.live_tree.write();
                if let Err(err) = tree.set_children(dir, entries) {
                    warn!("{err}");
                    continue;
                }
                aggregate::propagate(&mut tree, dir, direct_bytes);

                // Reverse so the first listed subdirectory is popped first.
                let children = tree.children(dir);
                pending.extend(
                    children
                        .iter()
                        .rev()
                        .copied()
                        .filter(|&child| tree.node(child).is_dir),
                );
            }

            self.stats.files_found += files;
            self.stats.dirs_found += dirs;
            self.stats.total_size = self.stats.total_size.saturating_add(direct_bytes);

            if dir == root {
                let _ = self.progress_tx.send(ScanProgress::RootListed);
            }
            // Status updates are lossy: a full channel must not stall the walk.
            let _ = self.progress_tx.try_send(ScanProgress::Update {
                stats: self.stats,
                current_path,
            });
        }

        WalkOutcome::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::listing::Listed;
    use parking_lot::RwLock;
    use std::collections::HashMap;
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    /// In-memory filesystem keyed by absolute directory path.
    struct MapLister(HashMap<PathBuf, Vec<Listed>>);

    impl Lister for MapLister {
        fn list(&self, path: &Path) -> io::Result<Vec<Listed>> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }

        fn is_dir(&self, path: &Path) -> io::Result<bool> {
            Ok(self.0.contains_key(path))
        }
    }

    fn live(root: &str) -> LiveTree {
        Arc::new(RwLock::new(EntryTree::new(root)))
    }

    #[test]
    fn end_to_end_sizes() {
        let lister = MapLister(HashMap::from([
            (
                PathBuf::from("/r"),
                vec![Listed::file("a", 10), Listed::dir("d")],
            ),
            (PathBuf::from("/r/d"), vec![Listed::file("b", 20)]),
        ]));
        let tree = live("/r");
        let (tx, rx) = crossbeam_channel::unbounded();
        let cancel = AtomicBool::new(false);

        let mut walker = Walker::new(&lister, &tree, &tx, &cancel);
        assert_eq!(walker.run(), WalkOutcome::Completed);

        let tree = tree.read();
        let root = tree.root();
        let a = tree.children(root)[0];
        let d = tree.children(root)[1];
        assert_eq!(tree.node(root).size, 30);
        assert_eq!(tree.node(d).size, 20);
        assert_eq!(tree.node(a).size, 10);
        assert!(aggregate::verify(&tree).is_ok());

        let stats = walker.stats();
        assert_eq!(stats.files_found, 2);
        assert_eq!(stats.dirs_found, 2);
        assert_eq!(stats.total_size, 30);

        let messages: Vec<_> = rx.try_iter().collect();
        assert!(matches!(messages[0], ScanProgress::RootListed));
        assert_eq!(
            messages
                .iter()
                .filter(|m| matches!(m, ScanProgress::Update { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn unreadable_directory_becomes_empty_and_walk_continues() {
        let lister = MapLister(HashMap::from([
            (
                PathBuf::from("/r"),
                vec![Listed::dir("locked"), Listed::dir("open")],
            ),
            (PathBuf::from("/r/open"), vec![Listed::file("x", 5)]),
        ]));
        let tree = live("/r");
        let (tx, rx) = crossbeam_channel::unbounded();
        let cancel = AtomicBool::new(false);

        let mut walker = Walker::new(&lister, &tree, &tx, &cancel);
        assert_eq!(walker.run(), WalkOutcome::Completed);
        assert_eq!(walker.stats().skipped, 1);

        let tree = tree.read();
        let locked = tree.children(tree.root())[0];
        assert!(tree.is_loaded(locked));
        assert!(tree.node(locked).is_error);
        assert_eq!(tree.node(tree.root()).size, 5);
        assert!(rx
            .try_iter()
            .any(|m| matches!(m, ScanProgress::Skipped { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn lists_directories_by_their_exact_bytes() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let odd = OsStr::from_bytes(b"caf\xE9");
        let lister = MapLister(HashMap::from([
            (PathBuf::from("/r"), vec![Listed::dir(odd)]),
            (Path::new("/r").join(odd), vec![Listed::file("b", 20)]),
        ]));
        let tree = live("/r");
        let (tx, _rx) = crossbeam_channel::unbounded();
        let cancel = AtomicBool::new(false);

        let mut walker = Walker::new(&lister, &tree, &tx, &cancel);
        assert_eq!(walker.run(), WalkOutcome::Completed);
        assert_eq!(walker.stats().skipped, 0);

        let tree = tree.read();
        let dir = tree.children(tree.root())[0];
        assert_eq!(tree.path(dir), Path::new("/r").join(odd));
        assert_eq!(tree.node(dir).size, 20);
        assert_eq!(tree.node(tree.root()).size, 20);
    }

    #[test]
    fn preset_cancel_flag_touches_nothing() {
        let lister = MapLister(HashMap::from([(
            PathBuf::from("/r"),
            vec![Listed::file("a", 10)],
        )]));
        let tree = live("/r");
        let (tx, _rx) = crossbeam_channel::unbounded();
        let cancel = AtomicBool::new(true);

        let mut walker = Walker::new(&lister, &tree, &tx, &cancel);
        assert_eq!(walker.run(), WalkOutcome::Cancelled);
        let tree = tree.read();
        assert_eq!(tree.len(), 1);
        assert!(!tree.is_loaded(tree.root()));
    }

    #[test]
    fn visits_subdirectories_in_listing_order() {
        let lister = MapLister(HashMap::from([
            (
                PathBuf::from("/r"),
                vec![Listed::dir("first"), Listed::dir("second")],
            ),
            (PathBuf::from("/r/first"), vec![Listed::dir("inner")]),
            (PathBuf::from("/r/first/inner"), vec![]),
            (PathBuf::from("/r/second"), vec![]),
        ]));
        let tree = live("/r");
        let (tx, rx) = crossbeam_channel::unbounded();
        let cancel = AtomicBool::new(false);
        Walker::new(&lister, &tree, &tx, &cancel).run();

        let visited: Vec<String> = rx
            .try_iter()
            .filter_map(|m| match m {
                ScanProgress::Update { current_path, .. } => Some(current_path),
                _ => None,
            })
            .collect();
        let expected: Vec<String> = ["/r", "/r/first", "/r/first/inner", "/r/second"]
            .iter()
            .map(|p| PathBuf::from(p).to_string_lossy().into_owned())
            .collect();
        assert_eq!(visited, expected);
    }
}
