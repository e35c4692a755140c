/// Directory listing primitive used by the walker.
///
/// The walker never touches the filesystem directly; it asks a [`Lister`]
/// for the immediate contents of one directory at a time. [`FsLister`] is
/// the real implementation. Tests substitute an in-memory one.
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// One immediate entry of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listed {
    /// Name exactly as the filesystem returned it.
    pub name: OsString,
    pub is_dir: bool,
    /// Byte length for files; ignored for directories.
    pub len: u64,
}

impl Listed {
    pub fn file(name: impl Into<OsString>, len: u64) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            len,
        }
    }

    pub fn dir(name: impl Into<OsString>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            len: 0,
        }
    }
}

/// Source of directory listings.
pub trait Lister: Send {
    /// Immediate contents of the directory at `path`.
    ///
    /// Any error means the directory is treated as having no children.
    fn list(&self, path: &Path) -> io::Result<Vec<Listed>>;

    /// Whether `path` exists and is a directory. Used to validate a scan root.
    fn is_dir(&self, path: &Path) -> io::Result<bool>;
}

/// Lists real directories with `std::fs::read_dir`.
///
/// Symbolic links are not followed: a link is reported as a file whose
/// length is that of the link itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister;

impl Lister for FsLister {
    fn list(&self, path: &Path) -> io::Result<Vec<Listed>> {
        let mut listed = Vec::new();
        for entry in fs::read_dir(path)? {
            // An entry that vanishes between readdir and stat is simply left out.
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!("Skipping unreadable entry in {}: {err}", path.display());
                    continue;
                }
            };
            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(err) => {
                    debug!("Skipping {}: {err}", entry.path().display());
                    continue;
                }
            };
            let name = entry.file_name();
            if file_type.is_dir() {
                listed.push(Listed::dir(name));
            } else {
                match entry.metadata() {
                    Ok(meta) => listed.push(Listed::file(name, meta.len())),
                    Err(err) => debug!("Skipping {}: {err}", entry.path().display()),
                }
            }
        }
        Ok(listed)
    }

    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        fs::metadata(path).map(|meta| meta.is_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn lists_files_and_directories() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        let mut f = fs::File::create(tmp.path().join("a.bin")).unwrap();
        f.write_all(&[0u8; 64]).unwrap();

        let mut listed = FsLister.list(tmp.path()).unwrap();
        listed.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(listed, vec![Listed::file("a.bin", 64), Listed::dir("sub")]);
    }

    #[test]
    fn listing_a_file_fails() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("plain.txt");
        fs::write(&file, b"hello").unwrap();
        assert!(FsLister.list(&file).is_err());
        assert!(!FsLister.is_dir(&file).unwrap());
    }

    #[test]
    fn missing_path_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let gone = tmp.path().join("gone");
        assert!(FsLister.list(&gone).is_err());
        assert!(FsLister.is_dir(&gone).is_err());
    }
}
