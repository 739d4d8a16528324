use std::{
    fs::{self, File},
    io::{self, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use log::{debug, info};
use thiserror::Error;
use zip::{result::ZipError, write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::{
    license::{LicenseOracle, LicenseTee},
    model::Coordinate,
    tree::{EntryKind, SourceTree, TreeError},
};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Symbolic links are not supported: {path}")]
    Symlink { path: String },
    #[error("Error while reading sources: {0}")]
    Tree(#[from] TreeError),
    #[error("Zip error: {0}")]
    Zip(#[from] ZipError),
    #[error("IO error: {0}")]
    IO(#[from] io::Error),
}

#[derive(Debug)]
pub struct ArchivedModule {
    /// Relative to the output directory.
    pub path: PathBuf,
    pub licenses: Vec<String>,
}

/// Where module source archives are written: one zip per coordinate,
/// optionally below a prefix directory.
#[derive(Debug, Clone)]
pub struct OutputDirectory {
    location: PathBuf,
    prefix: Option<PathBuf>,
}

impl OutputDirectory {
    pub fn new(location: PathBuf, prefix: Option<PathBuf>) -> Self {
        OutputDirectory { location, prefix }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn relative_path(&self, coordinate: &Coordinate) -> PathBuf {
        let file_name = archive_file_name(coordinate);
        match &self.prefix {
            Some(prefix) => prefix.join(file_name),
            None => PathBuf::from(file_name),
        }
    }

    /// The archive already written for a coordinate by an earlier run.
    /// Empty files left behind by an interrupted run do not count.
    pub fn existing(&self, coordinate: &Coordinate) -> Option<PathBuf> {
        let path = self.location.join(self.relative_path(coordinate));
        match fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() && metadata.len() > 0 => Some(path),
            _ => None,
        }
    }

    /// Copies a source tree into the archive of its coordinate, classifying
    /// license files on the way through.
    pub fn write(
        &self,
        coordinate: &Coordinate,
        tree: &dyn SourceTree,
        oracle: &dyn LicenseOracle,
    ) -> Result<ArchivedModule, ArchiveError> {
        let relative = self.relative_path(coordinate);
        let path = self.location.join(&relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ArchiveError::CreateDir {
                path: parent.to_string_lossy().to_string(),
                source,
            })?;
        }
        info!("Writing {} to {}", coordinate, path.display());
        let licenses = write_archive(LazyFile::new(path), tree, oracle)?;
        Ok(ArchivedModule {
            path: relative,
            licenses,
        })
    }
}

/// `<name with / replaced by _>[@<version>].zip`
pub fn archive_file_name(coordinate: &Coordinate) -> String {
    let name = coordinate.name.replace('/', "_");
    if coordinate.is_versioned() {
        format!("{}@{}.zip", name, coordinate.version)
    } else {
        format!("{}.zip", name)
    }
}

fn file_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Writes every entry of a tree to a zip and returns the licenses found.
pub fn write_archive<W: Write + Seek>(
    writer: W,
    tree: &dyn SourceTree,
    oracle: &dyn LicenseOracle,
) -> Result<Vec<String>, ArchiveError> {
    let mut zip = ZipWriter::new(writer);
    let mut licenses = Vec::new();
    for entry in tree.entries()? {
        match entry.kind {
            EntryKind::Symlink => return Err(ArchiveError::Symlink { path: entry.path }),
            EntryKind::Dir => zip.add_directory(entry.path.as_str(), file_options())?,
            EntryKind::File => {
                zip.start_file(entry.path.as_str(), file_options())?;
                let reader = tree.open(&entry.path)?;
                let mut tee = LicenseTee::new(reader, &entry.path, oracle, &mut licenses);
                io::copy(&mut tee, &mut zip)?;
            }
        }
    }
    zip.finish()?;
    Ok(licenses)
}

/// A file that is only created once something is written to it or the
/// writer seeks in it.
pub struct LazyFile {
    path: PathBuf,
    file: Option<File>,
}

impl LazyFile {
    pub fn new(path: PathBuf) -> Self {
        LazyFile { path, file: None }
    }

    fn file(&mut self) -> io::Result<&mut File> {
        if self.file.is_none() {
            debug!("Creating {}", self.path.display());
            self.file = Some(File::create(&self.path)?);
        }
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("output file was not created"))
    }
}

impl Write for LazyFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.file {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl Seek for LazyFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file()?.seek(pos)
    }
}
