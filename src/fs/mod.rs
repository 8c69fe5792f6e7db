//! FileSystem abstraction for testable file operations

mod finder;
mod mock;
mod real;
mod r#trait;

pub use finder::FileFinder;
pub use mock::MockFileSystem;
pub use r#trait::{DirEntry, FileSystem, FileType};
pub use real::RealFileSystem;
