//! FileSystem trait definition

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Type of file system entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
    Symlink,
}

/// A directory entry returned by read_dir
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub path: PathBuf,
    pub name: String,
    pub file_type: FileType,
}

impl DirEntry {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.name
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }
}

/// Abstraction over file system operations so detection can run against fixtures
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool;

    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// List directory contents. Symlinks are reported as [`FileType::Symlink`]
    /// and never resolved.
    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_entry() {
        let entry = DirEntry {
            path: PathBuf::from("/test/go.mod"),
            name: "go.mod".to_string(),
            file_type: FileType::File,
        };
        assert_eq!(entry.path(), Path::new("/test/go.mod"));
        assert_eq!(entry.file_name(), "go.mod");
        assert_eq!(entry.file_type(), FileType::File);
        assert!(!entry.is_dir());
    }
}
