use super::FileSystem;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Locates well-known files inside a single directory (non-recursive)
#[derive(Clone)]
pub struct FileFinder {
    fs: Arc<dyn FileSystem>,
}

impl FileFinder {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    pub fn file_system(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn find_file(&self, directory: &Path, filename: &str) -> Option<PathBuf> {
        let candidate = directory.join(filename);
        if self.fs.is_file(&candidate) {
            Some(candidate)
        } else {
            None
        }
    }

    /// First match in `filenames` order
    pub fn find_first(&self, directory: &Path, filenames: &[&str]) -> Option<PathBuf> {
        filenames
            .iter()
            .find_map(|name| self.find_file(directory, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    #[test]
    fn test_find_file() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("go.mod", "module x");
        fs.add_dir("build.gradle");
        let finder = FileFinder::new(fs);

        assert_eq!(
            finder.find_file(Path::new("/mock"), "go.mod"),
            Some(PathBuf::from("/mock/go.mod"))
        );
        assert_eq!(finder.find_file(Path::new("/mock"), "build.gradle"), None);
        assert_eq!(finder.find_file(Path::new("/mock"), "Gopkg.lock"), None);
    }

    #[test]
    fn test_find_first_respects_order() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("build.gradle", "");
        fs.add_file("build.gradle.kts", "");
        let finder = FileFinder::new(fs);

        let found = finder.find_first(Path::new("/mock"), &["build.gradle.kts", "build.gradle"]);
        assert_eq!(found, Some(PathBuf::from("/mock/build.gradle.kts")));
    }
}
