/// A single node in the arena-allocated entry tree.
///
/// Entries are stored in a flat `Vec<Entry>` owned by [`EntryTree`]. A child
/// refers to its parent by index only, so ownership runs one way: the
/// directory owns its children list, the child just remembers where it lives.
///
/// [`EntryTree`]: super::EntryTree
use compact_str::CompactString;
use std::ffi::OsStr;

/// Lightweight index into the arena `Vec<Entry>`.
///
/// Uses `u32` to keep entries small — supports up to ~4 billion entries,
/// which is more than enough for any real filesystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    /// Create a new `NodeIndex` from a `usize`, panicking if it exceeds `u32::MAX`.
    #[inline]
    pub fn new(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize, "NodeIndex overflow");
        Self(index as u32)
    }

    /// Return the index as a `usize` for Vec indexing.
    #[inline]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Load state of a directory's children.
///
/// `NotLoaded` and `Loaded(empty)` are different states: the
/// first means "not scanned yet", the second "scanned and genuinely empty".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Children {
    #[default]
    NotLoaded,
    Loaded(Box<[NodeIndex]>),
}

impl Children {
    /// Loaded children, or an empty slice if the listing has not happened yet.
    pub fn as_slice(&self) -> &[NodeIndex] {
        match self {
            Children::NotLoaded => &[],
            Children::Loaded(children) => children,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Children::Loaded(_))
    }
}

/// A single file or directory in the tree.
#[derive(Debug, Clone)]
pub struct Entry {
    /// File or directory name only (NOT the full path).
    /// Full paths are reconstructed on demand by walking up via `parent`.
    pub name: CompactString,

    /// Logical size in bytes.
    /// For files this is the length captured at listing time and never
    /// changes. For directories it is the running total of every descendant
    /// file committed so far, grown only through [`crate::aggregate::propagate`].
    pub size: u64,

    /// `true` if this entry represents a directory.
    pub is_dir: bool,

    /// Index of the parent directory. `None` only for the scan root.
    pub parent: Option<NodeIndex>,

    /// Children of a directory, in listing order. Always `NotLoaded` for files.
    pub(crate) children: Children,

    /// `true` if this directory could not be listed (e.g. access denied).
    /// The entry stays in the tree, loaded with zero children.
    pub is_error: bool,

    /// On-disk name, kept only when it is not valid UTF-8 and `name` is
    /// therefore a lossy rendering.
    raw_name: Option<Box<OsStr>>,
}

impl Entry {
    /// Create a new file entry with the given name and size.
    pub fn new_file(name: impl Into<CompactString>, size: u64, parent: Option<NodeIndex>) -> Self {
        Self {
            name: name.into(),
            size,
            is_dir: false,
            parent,
            children: Children::NotLoaded,
            is_error: false,
            raw_name: None,
        }
    }

    /// Create a new, not yet listed directory entry.
    pub fn new_dir(name: impl Into<CompactString>, parent: Option<NodeIndex>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            is_dir: true,
            parent,
            children: Children::NotLoaded,
            is_error: false,
            raw_name: None,
        }
    }

    /// Entry named by an on-disk name that may not be valid UTF-8.
    ///
    /// `name` becomes the lossy display form; the exact bytes are kept for
    /// path reconstruction.
    pub fn with_os_name(mut self, os_name: &OsStr) -> Self {
        match os_name.to_str() {
            Some(valid) => self.name = CompactString::new(valid),
            None => {
                self.name = CompactString::new(os_name.to_string_lossy());
                self.raw_name = Some(os_name.into());
            }
        }
        self
    }

    /// The exact on-disk name.
    pub fn os_name(&self) -> &OsStr {
        match self.raw_name.as_deref() {
            Some(raw) => raw,
            None => OsStr::new(self.name.as_str()),
        }
    }

    /// Direct children in listing order (empty for files and unlisted directories).
    #[inline]
    pub fn children(&self) -> &[NodeIndex] {
        self.children.as_slice()
    }

    /// `true` once the directory listing has been committed.
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.children.is_loaded()
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_dir_starts_empty_and_unloaded() {
        let dir = Entry::new_dir("photos", None);
        assert!(dir.is_dir);
        assert_eq!(dir.size, 0);
        assert!(!dir.is_loaded());
        assert!(dir.children().is_empty());
        assert!(dir.is_root());
    }

    #[test]
    fn loaded_empty_differs_from_not_loaded() {
        let empty = Children::Loaded(Box::new([]));
        assert!(empty.is_loaded());
        assert!(!Children::NotLoaded.is_loaded());
        assert_eq!(empty.as_slice(), Children::NotLoaded.as_slice());
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_name_keeps_its_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"caf\xE9");
        let dir = Entry::new_dir("", None).with_os_name(raw);
        assert_eq!(dir.name, "caf\u{FFFD}");
        assert_eq!(dir.os_name().as_bytes(), b"caf\xE9");

        let plain = Entry::new_file("", 1, None).with_os_name(OsStr::new("plain.txt"));
        assert_eq!(plain.name, "plain.txt");
        assert_eq!(plain.os_name(), OsStr::new("plain.txt"));
    }

    #[test]
    fn file_keeps_its_size() {
        let file = Entry::new_file("a.bin", 42, Some(NodeIndex(0)));
        assert!(!file.is_dir);
        assert_eq!(file.size, 42);
        assert_eq!(file.parent, Some(NodeIndex(0)));
    }
}
