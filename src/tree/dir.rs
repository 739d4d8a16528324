use std::{
    fs::{self, File, Metadata},
    io::{self, Read},
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use super::{EntryKind, SourceTree, TreeEntry, TreeError};

const GIT_DIRECTORY: &str = ".git";

/// Module sources in a directory: a Go module cache entry or a local checkout.
#[derive(Debug, Clone)]
pub struct DirTree {
    root: PathBuf,
}

impl DirTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirTree { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn relative_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let components = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>();
        Some(components.join("/"))
    }
}

fn entry_kind(file_type: fs::FileType) -> EntryKind {
    if file_type.is_symlink() {
        EntryKind::Symlink
    } else if file_type.is_dir() {
        EntryKind::Dir
    } else {
        EntryKind::File
    }
}

fn to_entry(path: &str, metadata: &Metadata) -> TreeEntry {
    let kind = entry_kind(metadata.file_type());
    TreeEntry {
        path: path.to_string(),
        kind,
        size: if kind == EntryKind::File {
            metadata.len()
        } else {
            0
        },
    }
}

fn io_error(path: &str, error: io::Error) -> TreeError {
    if error.kind() == io::ErrorKind::NotFound {
        TreeError::NotFound {
            path: path.to_string(),
        }
    } else {
        TreeError::IO(error)
    }
}

impl SourceTree for DirTree {
    fn entries(&self) -> Result<Vec<TreeEntry>, TreeError> {
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !(entry.depth() == 1 && entry.file_name() == GIT_DIRECTORY));

        let mut entries = Vec::new();
        for entry in walker {
            let entry = entry?;
            let Some(path) = self.relative_path(entry.path()) else {
                continue;
            };
            entries.push(to_entry(&path, &entry.metadata()?));
        }
        Ok(entries)
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + '_>, TreeError> {
        let file = File::open(self.root.join(path)).map_err(|e| io_error(path, e))?;
        Ok(Box::new(file))
    }

    fn stat(&self, path: &str) -> Result<TreeEntry, TreeError> {
        let metadata = fs::symlink_metadata(self.root.join(path)).map_err(|e| io_error(path, e))?;
        Ok(to_entry(path, &metadata))
    }
}
