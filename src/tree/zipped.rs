use std::{
    cell::RefCell,
    fs,
    io::{Cursor, Read},
    path::Path,
};

use zip::{result::ZipError, ZipArchive};

use super::{EntryKind, SourceTree, TreeEntry, TreeError};

const UNIX_FILE_TYPE_MASK: u32 = 0o170000;
const UNIX_SYMLINK: u32 = 0o120000;

/// Module sources held in a zip archive in memory.
///
/// Archives served by a module proxy put every entry below a
/// `<module>@<version>/` directory; that prefix is hidden so paths look the
/// same as in a [`super::DirTree`].
pub struct ZipTree {
    archive: RefCell<ZipArchive<Cursor<Vec<u8>>>>,
    prefix: String,
}

impl ZipTree {
    pub fn new(bytes: Vec<u8>) -> Result<Self, TreeError> {
        Self::with_prefix(bytes, "")
    }

    pub fn with_prefix(bytes: Vec<u8>, prefix: impl Into<String>) -> Result<Self, TreeError> {
        Ok(ZipTree {
            archive: RefCell::new(ZipArchive::new(Cursor::new(bytes))?),
            prefix: prefix.into(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, TreeError> {
        Self::new(fs::read(path)?)
    }

    fn full_name(&self, path: &str) -> String {
        format!("{}{}", self.prefix, path)
    }
}

impl SourceTree for ZipTree {
    fn entries(&self) -> Result<Vec<TreeEntry>, TreeError> {
        let mut archive = self.archive.borrow_mut();
        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let file = archive.by_index(index)?;
            let Some(path) = file.name().strip_prefix(self.prefix.as_str()) else {
                continue;
            };
            let path = path.trim_end_matches('/');
            if path.is_empty() {
                continue;
            }
            let kind = if file.is_dir() {
                EntryKind::Dir
            } else if file
                .unix_mode()
                .is_some_and(|mode| mode & UNIX_FILE_TYPE_MASK == UNIX_SYMLINK)
            {
                EntryKind::Symlink
            } else {
                EntryKind::File
            };
            entries.push(TreeEntry {
                path: path.to_string(),
                kind,
                size: file.size(),
            });
        }
        Ok(entries)
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + '_>, TreeError> {
        let mut archive = self.archive.borrow_mut();
        let mut file = archive
            .by_name(&self.full_name(path))
            .map_err(|error| match error {
                ZipError::FileNotFound => TreeError::NotFound {
                    path: path.to_string(),
                },
                error => TreeError::Zip(error),
            })?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        Ok(Box::new(Cursor::new(contents)))
    }

    fn stat(&self, path: &str) -> Result<TreeEntry, TreeError> {
        let full_name = self.full_name(path);
        let mut archive = self.archive.borrow_mut();
        let size = match archive.by_name(&full_name) {
            Ok(file) => Some(file.size()),
            Err(ZipError::FileNotFound) => None,
            Err(error) => return Err(error.into()),
        };
        if let Some(size) = size {
            return Ok(TreeEntry {
                path: path.to_string(),
                kind: EntryKind::File,
                size,
            });
        }

        let directory = format!("{}/", full_name.trim_end_matches('/'));
        if archive.file_names().any(|name| name.starts_with(&directory)) {
            Ok(TreeEntry {
                path: path.to_string(),
                kind: EntryKind::Dir,
                size: 0,
            })
        } else {
            Err(TreeError::NotFound {
                path: path.to_string(),
            })
        }
    }
}
