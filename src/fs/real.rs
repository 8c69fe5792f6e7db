use super::{DirEntry, FileSystem, FileType};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).context(format!("Failed to read file {:?}", path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let entries = fs::read_dir(path).context(format!("Failed to read directory {:?}", path))?;

        let mut result = Vec::new();
        for entry in entries {
            let entry = entry.context("Failed to read directory entry")?;
            let raw_type = entry
                .file_type()
                .context(format!("Failed to read file type of {:?}", entry.path()))?;
            let file_type = if raw_type.is_symlink() {
                FileType::Symlink
            } else if raw_type.is_dir() {
                FileType::Directory
            } else {
                FileType::File
            };

            result.push(DirEntry {
                path: entry.path(),
                name: entry.file_name().to_string_lossy().to_string(),
                file_type,
            });
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        let base = dir.path();

        fs::create_dir(base.join("subdir")).unwrap();
        fs::File::create(base.join("go.mod"))
            .unwrap()
            .write_all(b"module example.com/app")
            .unwrap();
        fs::File::create(base.join("subdir/build.gradle"))
            .unwrap()
            .write_all(b"plugins {}")
            .unwrap();

        dir
    }

    #[test]
    fn test_exists_and_kinds() {
        let temp = create_test_dir();
        let fs = RealFileSystem::new();

        assert!(fs.exists(temp.path()));
        assert!(fs.is_dir(&temp.path().join("subdir")));
        assert!(fs.is_file(&temp.path().join("go.mod")));
        assert!(!fs.exists(&temp.path().join("nonexistent")));
    }

    #[test]
    fn test_read_to_string() {
        let temp = create_test_dir();
        let fs = RealFileSystem::new();

        let content = fs.read_to_string(&temp.path().join("go.mod")).unwrap();
        assert_eq!(content, "module example.com/app");
        assert!(fs.read_to_string(&temp.path().join("missing")).is_err());
    }

    #[test]
    fn test_read_dir() {
        let temp = create_test_dir();
        let fs = RealFileSystem::new();

        let entries = fs.read_dir(temp.path()).unwrap();
        let subdir = entries.iter().find(|e| e.file_name() == "subdir").unwrap();
        let gomod = entries.iter().find(|e| e.file_name() == "go.mod").unwrap();

        assert_eq!(subdir.file_type(), FileType::Directory);
        assert_eq!(gomod.file_type(), FileType::File);
    }

    #[cfg(unix)]
    #[test]
    fn test_read_dir_reports_symlinks() {
        let temp = create_test_dir();
        std::os::unix::fs::symlink(temp.path().join("subdir"), temp.path().join("link")).unwrap();
        let fs = RealFileSystem::new();

        let entries = fs.read_dir(temp.path()).unwrap();
        let link = entries.iter().find(|e| e.file_name() == "link").unwrap();
        assert_eq!(link.file_type(), FileType::Symlink);
    }
}
