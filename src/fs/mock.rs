use super::{DirEntry, FileSystem, FileType};
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

#[derive(Debug, Clone)]
pub struct MockEntry {
    pub content: Option<String>,
    pub file_type: FileType,
}

/// In-memory file system.
///
/// Every lookup made through `exists`, `is_file`, `is_dir` and
/// `read_to_string` is recorded so tests can assert which paths a plugin
/// touched.
pub struct MockFileSystem {
    files: RwLock<BTreeMap<PathBuf, MockEntry>>,
    accessed: Mutex<Vec<PathBuf>>,
    root: PathBuf,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::with_root(PathBuf::from("/mock"))
    }

    pub fn with_root(root: PathBuf) -> Self {
        let fs = Self {
            files: RwLock::new(BTreeMap::new()),
            accessed: Mutex::new(Vec::new()),
            root: root.clone(),
        };
        fs.add_dir(root);
        fs
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: &str) {
        let path = self.normalize_path(path.as_ref());
        self.insert(
            path,
            MockEntry {
                content: Some(content.to_string()),
                file_type: FileType::File,
            },
        );
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = self.normalize_path(path.as_ref());
        self.insert(
            path,
            MockEntry {
                content: None,
                file_type: FileType::Directory,
            },
        );
    }

    pub fn add_symlink(&self, path: impl AsRef<Path>) {
        let path = self.normalize_path(path.as_ref());
        self.insert(
            path,
            MockEntry {
                content: None,
                file_type: FileType::Symlink,
            },
        );
    }

    /// Paths looked up since creation or the last [`Self::clear_accessed`]
    pub fn accessed_paths(&self) -> Vec<PathBuf> {
        self.accessed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn was_accessed_under(&self, dir: impl AsRef<Path>) -> bool {
        let dir = self.normalize_path(dir.as_ref());
        self.accessed_paths().iter().any(|p| p.starts_with(&dir))
    }

    pub fn clear_accessed(&self) {
        self.accessed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn insert(&self, path: PathBuf, entry: MockEntry) {
        let mut files = self.files.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(parent) = path.parent() {
            Self::ensure_parents(&mut files, parent);
        }
        files.insert(path, entry);
    }

    fn normalize_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn ensure_parents(files: &mut BTreeMap<PathBuf, MockEntry>, path: &Path) {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            files.entry(current.clone()).or_insert(MockEntry {
                content: None,
                file_type: FileType::Directory,
            });
        }
    }

    fn lookup(&self, path: &Path) -> Option<MockEntry> {
        let path = self.normalize_path(path);
        self.accessed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.clone());
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&path)
            .cloned()
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.lookup(path).is_some()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.lookup(path)
            .map(|e| e.file_type == FileType::Directory)
            .unwrap_or(false)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.lookup(path)
            .map(|e| e.file_type == FileType::File)
            .unwrap_or(false)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let entry = self
            .lookup(path)
            .ok_or_else(|| anyhow!("File not found: {:?}", path))?;

        entry
            .content
            .ok_or_else(|| anyhow!("Not a file: {:?}", path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let path = self.normalize_path(path);
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);

        match files.get(&path) {
            Some(entry) if entry.file_type == FileType::Directory => {}
            Some(_) => return Err(anyhow!("Not a directory: {:?}", path)),
            None => return Err(anyhow!("Directory not found: {:?}", path)),
        }

        let entries = files
            .iter()
            .filter(|(file_path, _)| file_path.parent() == Some(path.as_path()))
            .map(|(file_path, entry)| DirEntry {
                path: file_path.clone(),
                name: file_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
                file_type: entry.file_type,
            })
            .collect();

        Ok(entries)
    }
}
