use std::io::Read;

use thiserror::Error;

mod dir;
mod zipped;

pub use dir::DirTree;
pub use zipped::ZipTree;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("{path} not found")]
    NotFound { path: String },
    #[error("Zip error: {0}")]
    Zip(#[from] ::zip::result::ZipError),
    #[error("Error while walking directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

impl TreeError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TreeError::NotFound { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Relative to the tree root, `/`-separated.
    pub path: String,
    pub kind: EntryKind,
    pub size: u64,
}

/// A browsable tree of module sources, backed by a directory or a zip archive.
pub trait SourceTree {
    /// Every entry below the root in a stable order, parents before children.
    fn entries(&self) -> Result<Vec<TreeEntry>, TreeError>;

    fn open(&self, path: &str) -> Result<Box<dyn Read + '_>, TreeError>;

    fn stat(&self, path: &str) -> Result<TreeEntry, TreeError>;
}
