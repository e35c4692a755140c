/// Arena-backed entry tree with a single scan root.
///
/// All entries live in a single `Vec<Entry>`. Relationships between entries
/// use `NodeIndex` (a thin `u32` wrapper) rather than heap pointers. The
/// root is always at index 0 and is the only entry that stores a path; every
/// other path is rebuilt by joining ancestor names onto it.
use super::entry::{Children, Entry, NodeIndex};
use crate::error::TreeError;
use compact_str::CompactString;
use std::path::{Path, PathBuf};

/// The complete entry tree produced by a scan.
#[derive(Debug, Clone)]
pub struct EntryTree {
    /// Arena: every entry in a flat vector. Index 0 is the root.
    pub(crate) nodes: Vec<Entry>,

    /// Absolute path of the scan root.
    root_path: PathBuf,
}

impl EntryTree {
    /// Index of the scan root.
    pub const ROOT: NodeIndex = NodeIndex(0);

    /// Create a tree containing only the (not yet listed) root directory.
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self::with_capacity(root_path, 1)
    }

    /// Create a tree with pre-allocated capacity.
    ///
    /// The arena grows if needed; pre-allocation only avoids repeated
    /// re-allocation early in a large scan.
    pub fn with_capacity(root_path: impl Into<PathBuf>, estimated_nodes: usize) -> Self {
        let root_path = root_path.into();
        let mut nodes = Vec::with_capacity(estimated_nodes.max(1));
        nodes.push(Entry::new_dir(root_display_name(&root_path), None));
        Self { nodes, root_path }
    }

    /// Index of the scan root.
    #[inline]
    pub fn root(&self) -> NodeIndex {
        Self::ROOT
    }

    /// Absolute path the scan started from.
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Install the complete listing of `dir` in one step.
    ///
    /// This is the only way children enter the tree and it may succeed at
    /// most once per directory: a second call fails with
    /// [`TreeError::ChildrenAlreadyLoaded`] and leaves the tree untouched.
    /// Every entry must name `dir` as its parent. Sizes are *not*
    /// propagated here; that is the aggregator's job.
    pub fn set_children(&mut self, dir: NodeIndex, entries: Vec<Entry>) -> Result<(), TreeError> {
        let target = &self.nodes[dir.idx()];
        if !target.is_dir {
            return Err(TreeError::NotADirectory {
                path: self.path(dir),
            });
        }
        if target.is_loaded() {
            return Err(TreeError::ChildrenAlreadyLoaded {
                path: self.path(dir),
            });
        }
        if let Some(stray) = entries.iter().find(|e| e.parent != Some(dir)) {
            return Err(TreeError::ParentMismatch {
                path: self.path(dir),
                name: stray.name.to_string(),
            });
        }

        let base = self.nodes.len();
        let indices: Box<[NodeIndex]> = (base..base + entries.len()).map(NodeIndex::new).collect();
        self.nodes.extend(entries.into_iter().map(|mut entry| {
            if entry.is_dir {
                // Directory sizes only grow through propagation.
                entry.size = 0;
                entry.children = Children::NotLoaded;
            }
            entry
        }));
        self.nodes[dir.idx()].children = Children::Loaded(indices);
        Ok(())
    }

    /// Commit an empty listing for a directory that could not be read.
    pub fn mark_unreadable(&mut self, dir: NodeIndex) -> Result<(), TreeError> {
        self.set_children(dir, Vec::new())?;
        self.nodes[dir.idx()].is_error = true;
        Ok(())
    }

    /// Reconstruct the full path for an entry by walking up to the root.
    pub fn path(&self, index: NodeIndex) -> PathBuf {
        let mut segments = Vec::new();
        let mut current = index;
        while let Some(parent) = self.nodes[current.idx()].parent {
            segments.push(self.nodes[current.idx()].os_name());
            current = parent;
        }
        let mut path = self.root_path.clone();
        for segment in segments.iter().rev() {
            path.push(segment);
        }
        path
    }

    /// Direct children in listing order.
    #[inline]
    pub fn children(&self, parent: NodeIndex) -> &[NodeIndex] {
        self.nodes[parent.idx()].children()
    }

    /// Direct children sorted by size, largest first (ties by name).
    pub fn children_sorted_by_size(&self, parent: NodeIndex) -> Vec<NodeIndex> {
        let mut children = self.children(parent).to_vec();
        self.sort_by_size(&mut children);
        children
    }

    /// Sort a list of entries by size descending, then by name.
    pub fn sort_by_size(&self, indices: &mut [NodeIndex]) {
        indices.sort_unstable_by(|a, b| {
            let a_node = &self.nodes[a.idx()];
            let b_node = &self.nodes[b.idx()];
            b_node
                .size
                .cmp(&a_node.size)
                .then_with(|| a_node.name.cmp(&b_node.name))
        });
    }

    /// `true` once the listing of `index` has been committed.
    #[inline]
    pub fn is_loaded(&self, index: NodeIndex) -> bool {
        self.nodes[index.idx()].is_loaded()
    }

    /// Share of the parent's size taken by this entry (0.0–1.0).
    ///
    /// The root is measured against itself. Computed on demand, so the value
    /// follows the live sizes while a scan is running.
    pub fn fraction_of_parent(&self, index: NodeIndex) -> f32 {
        let node = &self.nodes[index.idx()];
        let parent_size = node
            .parent
            .map(|p| self.nodes[p.idx()].size)
            .unwrap_or(node.size);
        if parent_size > 0 {
            (node.size as f64 / parent_size as f64) as f32
        } else {
            0.0
        }
    }

    /// Get the entry at the given index.
    #[inline]
    pub fn node(&self, index: NodeIndex) -> &Entry {
        &self.nodes[index.idx()]
    }

    /// Iterate over every entry with its index, in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &Entry)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeIndex::new(i), node))
    }

    /// Total number of entries in the tree, root included.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: the root exists from construction.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Derive a display name for the scan root.
///
/// Filesystem roots (`/`, `C:\`) have no final component, so the whole path
/// text is used instead.
fn root_display_name(path: &Path) -> CompactString {
    match path.file_name() {
        Some(name) => CompactString::new(name.to_string_lossy()),
        None => CompactString::new(path.to_string_lossy()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> (EntryTree, NodeIndex, NodeIndex) {
        let mut tree = EntryTree::new("/data");
        let root = tree.root();
        tree.set_children(
            root,
            vec![
                Entry::new_dir("users", Some(root)),
                Entry::new_file("notes.txt", 50, Some(root)),
            ],
        )
        .unwrap();
        let users = tree.children(root)[0];
        tree.set_children(users, vec![Entry::new_file("test.txt", 50, Some(users))])
            .unwrap();
        let file = tree.children(users)[0];
        (tree, users, file)
    }

    #[test]
    fn root_holds_absolute_path_and_name() {
        let tree = EntryTree::new("/data/projects");
        assert_eq!(tree.root_path(), Path::new("/data/projects"));
        assert_eq!(tree.node(tree.root()).name, "projects");
        assert_eq!(tree.path(tree.root()), PathBuf::from("/data/projects"));
    }

    #[test]
    fn filesystem_root_is_named_after_its_path() {
        let tree = EntryTree::new("/");
        assert_eq!(tree.node(tree.root()).name, "/");
    }

    #[test]
    fn full_path_joins_ancestor_names() {
        let (tree, users, file) = sample_tree();
        assert_eq!(tree.path(users), Path::new("/data").join("users"));
        assert_eq!(
            tree.path(file),
            Path::new("/data").join("users").join("test.txt")
        );
    }

    #[test]
    fn children_keep_listing_order() {
        let (tree, users, _) = sample_tree();
        let names: Vec<_> = tree
            .children(tree.root())
            .iter()
            .map(|&c| tree.node(c).name.as_str())
            .collect();
        assert_eq!(names, ["users", "notes.txt"]);
        assert_eq!(tree.node(users).parent, Some(tree.root()));
    }

    #[test]
    fn second_set_children_fails_and_changes_nothing() {
        let (mut tree, users, _) = sample_tree();
        let before = tree.len();
        let err = tree
            .set_children(users, vec![Entry::new_file("again.txt", 10, Some(users))])
            .unwrap_err();
        assert!(matches!(err, TreeError::ChildrenAlreadyLoaded { .. }));
        assert_eq!(tree.len(), before);
        assert_eq!(tree.children(users).len(), 1);
    }

    #[test]
    fn set_children_rejects_foreign_entries() {
        let mut tree = EntryTree::new("/data");
        let root = tree.root();
        let err = tree
            .set_children(root, vec![Entry::new_file("x", 1, Some(NodeIndex(7)))])
            .unwrap_err();
        assert!(matches!(err, TreeError::ParentMismatch { .. }));
        assert!(!tree.is_loaded(root));
    }

    #[test]
    fn set_children_rejects_files() {
        let (mut tree, _, file) = sample_tree();
        let err = tree.set_children(file, Vec::new()).unwrap_err();
        assert!(matches!(err, TreeError::NotADirectory { .. }));
    }

    #[test]
    fn unreadable_directory_is_loaded_and_empty() {
        let mut tree = EntryTree::new("/data");
        let root = tree.root();
        tree.mark_unreadable(root).unwrap();
        assert!(tree.is_loaded(root));
        assert!(tree.children(root).is_empty());
        assert!(tree.node(root).is_error);
    }

    #[test]
    fn children_sorted_by_size_descending() {
        let mut tree = EntryTree::new("/data");
        let root = tree.root();
        tree.set_children(
            root,
            vec![
                Entry::new_file("small.txt", 10, Some(root)),
                Entry::new_file("big.bin", 1000, Some(root)),
                Entry::new_file("mid.log", 100, Some(root)),
            ],
        )
        .unwrap();
        let sorted: Vec<_> = tree
            .children_sorted_by_size(root)
            .into_iter()
            .map(|c| tree.node(c).name.to_string())
            .collect();
        assert_eq!(sorted, ["big.bin", "mid.log", "small.txt"]);
    }

    #[test]
    fn fraction_of_parent_handles_zero_sizes() {
        let (tree, users, _) = sample_tree();
        // Nothing propagated yet: directories are still 0 bytes.
        assert_eq!(tree.fraction_of_parent(users), 0.0);
        assert_eq!(tree.fraction_of_parent(tree.root()), 0.0);
    }
}
