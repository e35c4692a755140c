/// Lazy, memoized presentation view over the entry tree.
///
/// A front-end never walks the arena directly. It asks the [`Materializer`]
/// for the children of one [`DisplayNode`] at a time, so only the levels a
/// user actually opens are ever built. While building a level, files below
/// the small-file threshold are folded into one synthetic bucket node to
/// keep very wide directories manageable.
///
/// Each level is built at most once. A directory whose listing has not been
/// committed yet yields an empty slice and is *not* memoized, so it is built
/// as soon as the scanner gets to it.
use crate::config::MaterializeConfig;
use crate::model::size::format_threshold;
use crate::model::{EntryTree, NodeIndex};
use compact_str::{format_compact, CompactString};
use std::collections::HashMap;
use std::path::PathBuf;

/// Path reported for the synthetic small-files node.
///
/// Consumers that act on real paths (open, reveal) must ignore it.
pub const SMALL_FILES_PATH: &str = "@@smallfiles@@";

/// Synthetic pseudo-directory grouping a directory's small files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmallFiles {
    /// Directory whose files were grouped.
    pub parent: NodeIndex,
    /// Display name, e.g. `"Small files (<1 MiB)"`.
    pub name: CompactString,
    /// Sum of the grouped files' sizes.
    pub size: u64,
    /// The grouped files, in listing order.
    pub files: Box<[NodeIndex]>,
}

/// A node as presented to a front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayNode {
    /// A real file or directory from the entry tree.
    Entry(NodeIndex),
    /// Presentation-only bucket; has no counterpart in the entry tree.
    SmallFiles(SmallFiles),
}

impl DisplayNode {
    /// The display node for the scan root.
    pub fn root(tree: &EntryTree) -> Self {
        DisplayNode::Entry(tree.root())
    }

    pub fn name<'a>(&'a self, tree: &'a EntryTree) -> &'a str {
        match self {
            DisplayNode::Entry(idx) => tree.node(*idx).name.as_str(),
            DisplayNode::SmallFiles(bucket) => bucket.name.as_str(),
        }
    }

    /// Current size. Live for real entries while a scan is running.
    pub fn size(&self, tree: &EntryTree) -> u64 {
        match self {
            DisplayNode::Entry(idx) => tree.node(*idx).size,
            DisplayNode::SmallFiles(bucket) => bucket.size,
        }
    }

    /// Buckets behave as directories.
    pub fn is_dir(&self, tree: &EntryTree) -> bool {
        match self {
            DisplayNode::Entry(idx) => tree.node(*idx).is_dir,
            DisplayNode::SmallFiles(_) => true,
        }
    }

    /// `true` if the directory behind this node could not be listed.
    pub fn is_error(&self, tree: &EntryTree) -> bool {
        match self {
            DisplayNode::Entry(idx) => tree.node(*idx).is_error,
            DisplayNode::SmallFiles(_) => false,
        }
    }

    /// `true` for presentation-only nodes.
    pub fn is_synthetic(&self) -> bool {
        matches!(self, DisplayNode::SmallFiles(_))
    }

    /// The entry behind this node, if it is a real one.
    pub fn index(&self) -> Option<NodeIndex> {
        match self {
            DisplayNode::Entry(idx) => Some(*idx),
            DisplayNode::SmallFiles(_) => None,
        }
    }

    /// Path for display; the bucket reports [`SMALL_FILES_PATH`].
    pub fn path(&self, tree: &EntryTree) -> PathBuf {
        self.real_path(tree)
            .unwrap_or_else(|| PathBuf::from(SMALL_FILES_PATH))
    }

    /// Filesystem path, or `None` for the synthetic bucket.
    pub fn real_path(&self, tree: &EntryTree) -> Option<PathBuf> {
        self.index().map(|idx| tree.path(idx))
    }

    /// Share of the enclosing directory's size (0.0–1.0).
    pub fn fraction_of_parent(&self, tree: &EntryTree) -> f32 {
        match self {
            DisplayNode::Entry(idx) => tree.fraction_of_parent(*idx),
            DisplayNode::SmallFiles(bucket) => {
                let parent_size = tree.node(bucket.parent).size;
                if parent_size > 0 {
                    (bucket.size as f64 / parent_size as f64) as f32
                } else {
                    0.0
                }
            }
        }
    }
}

/// Materialization state of one node.
///
/// Transitions only forward: `NotLoaded → Loading → Loaded`. `Loading` is
/// visible only while a level is being built and guards against re-entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializeState {
    NotLoaded,
    Loading,
    Loaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum MemoKey {
    Dir(NodeIndex),
    Bucket(NodeIndex),
}

impl MemoKey {
    fn of(node: &DisplayNode) -> Self {
        match node {
            DisplayNode::Entry(idx) => MemoKey::Dir(*idx),
            DisplayNode::SmallFiles(bucket) => MemoKey::Bucket(bucket.parent),
        }
    }
}

#[derive(Debug)]
enum Slot {
    Loading,
    Loaded(Box<[DisplayNode]>),
}

/// Builds and caches child lists for display nodes.
///
/// One materializer belongs to one tree; start a new one (or call
/// [`Materializer::clear`]) when a new scan replaces the tree.
#[derive(Debug)]
pub struct Materializer {
    config: MaterializeConfig,
    bucket_name: CompactString,
    memo: HashMap<MemoKey, Slot>,
}

impl Default for Materializer {
    fn default() -> Self {
        Self::new(MaterializeConfig::default())
    }
}

impl Materializer {
    pub fn new(config: MaterializeConfig) -> Self {
        Self {
            bucket_name: format_compact!(
                "Small files (<{})",
                format_threshold(config.small_file_threshold)
            ),
            config,
            memo: HashMap::new(),
        }
    }

    pub fn config(&self) -> &MaterializeConfig {
        &self.config
    }

    /// Children of `node`, building and memoizing them on first use.
    ///
    /// Never scans and never blocks: a directory whose listing has not been
    /// committed yet returns an empty slice, as do files.
    pub fn children(&mut self, tree: &EntryTree, node: &DisplayNode) -> &[DisplayNode] {
        if let DisplayNode::Entry(idx) = node {
            let entry = tree.node(*idx);
            if !entry.is_dir || !entry.is_loaded() {
                return &[];
            }
        }

        let key = MemoKey::of(node);
        match self.state_of(key) {
            MaterializeState::Loaded => {}
            MaterializeState::Loading => return &[],
            MaterializeState::NotLoaded => {
                self.memo.insert(key, Slot::Loading);
                let built = self.build(tree, node);
                self.memo.insert(key, Slot::Loaded(built));
            }
        }

        match self.memo.get(&key) {
            Some(Slot::Loaded(children)) => children,
            _ => &[],
        }
    }

    /// Materialization state of `node`.
    pub fn state(&self, node: &DisplayNode) -> MaterializeState {
        self.state_of(MemoKey::of(node))
    }

    /// Number of memoized levels.
    pub fn cached_levels(&self) -> usize {
        self.memo.len()
    }

    /// Forget every memoized level.
    pub fn clear(&mut self) {
        self.memo.clear();
    }

    fn state_of(&self, key: MemoKey) -> MaterializeState {
        match self.memo.get(&key) {
            None => MaterializeState::NotLoaded,
            Some(Slot::Loading) => MaterializeState::Loading,
            Some(Slot::Loaded(_)) => MaterializeState::Loaded,
        }
    }

    fn build(&self, tree: &EntryTree, node: &DisplayNode) -> Box<[DisplayNode]> {
        let dir = match node {
            // A bucket's children are its files, never bucketed again.
            DisplayNode::SmallFiles(bucket) => {
                return bucket.files.iter().copied().map(DisplayNode::Entry).collect();
            }
            DisplayNode::Entry(idx) => *idx,
        };

        let children = tree.children(dir);
        if !self.config.bucket_small_files {
            return children.iter().copied().map(DisplayNode::Entry).collect();
        }

        let mut shown = Vec::with_capacity(children.len());
        let mut small = Vec::new();
        let mut small_size: u64 = 0;
        for &child in children {
            let entry = tree.node(child);
            if !entry.is_dir && entry.size < self.config.small_file_threshold {
                small.push(child);
                small_size = small_size.saturating_add(entry.size);
            } else {
                shown.push(DisplayNode::Entry(child));
            }
        }

        if !small.is_empty() {
            shown.push(DisplayNode::SmallFiles(SmallFiles {
                parent: dir,
                name: self.bucket_name.clone(),
                size: small_size,
                files: small.into_boxed_slice(),
            }));
        }
        shown.into_boxed_slice()
    }
}

/// Sort display nodes by current size, largest first (ties by name).
pub fn sort_by_size(tree: &EntryTree, nodes: &mut [DisplayNode]) {
    nodes.sort_by(|a, b| {
        b.size(tree)
            .cmp(&a.size(tree))
            .then_with(|| a.name(tree).cmp(b.name(tree)))
    });
}
