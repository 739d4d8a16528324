use log::{debug, info, trace};
use walkdir::WalkDir;

use crate::{
    api::Root,
    archive::OutputDirectory,
    buildinfo::BuildInfoReader,
    fetch::ModuleFetcher,
    license::LicenseOracle,
    model::{gomod::GO_MOD, gosum, resolved::ResolvedModule, Coordinate},
    proxy::ContentIndex,
    version,
    walk::{WalkError, Walker},
};
use std::{
    error::Error,
    path::{Path, PathBuf},
};

const GIT_DIRECTORY_NAME: &str = ".git";

/// Handler to the licenses and sources commands.
/// Walks the dependency graph of a root and returns every module found,
/// in discovery order.
pub fn do_scan<I: ContentIndex>(
    fetcher: &ModuleFetcher<I>,
    oracle: &dyn LicenseOracle,
    output: Option<&OutputDirectory>,
    recursive: bool,
    build_info_reader: &dyn BuildInfoReader,
    root: &Root,
) -> Result<Vec<ResolvedModule>, Box<dyn Error>> {
    let mut walker = Walker::new(fetcher, oracle)
        .output(output)
        .recursive(recursive);

    match root {
        Root::Module { name, version } => {
            let coordinate = Coordinate::new(name.as_str(), version.clone().unwrap_or_default());
            walker.walk_module(&coordinate)?;
        }

        Root::Source {
            path,
            version,
            find: false,
        } => {
            walker.walk_source(path, &source_version(path, version.as_deref()))?;
        }

        Root::Source {
            path,
            version,
            find: true,
        } => {
            for dir in find_modules(path)? {
                walker.walk_source(&dir, &source_version(&dir, version.as_deref()))?;
            }
        }

        Root::Binary { path, find: false } => {
            let info = build_info_reader
                .read(path)
                .map_err(|source| WalkError::BuildInfo {
                    path: path.display().to_string(),
                    source,
                })?;
            walker.walk_build_info(&info)?;
        }

        Root::Binary { path, find: true } => {
            for file in find_files(path)? {
                match build_info_reader.read(&file) {
                    Ok(info) => {
                        info!("Processing binary {}", file.display());
                        walker.walk_build_info(&info)?;
                    }
                    Err(error) => trace!("Skipping {}: {}", file.display(), error),
                }
            }
        }

        Root::Sum { path } => {
            let entries = gosum::from_file(path)
                .map_err(|error| format!("Failed to read {}: {}", path.display(), error))?;
            debug!("Read {} entries from {}", entries.len(), path.display());
            walker.walk_sum(&entries)?;
        }
    }

    Ok(walker.into_resolved())
}

fn source_version(dir: &Path, version: Option<&str>) -> String {
    match version {
        Some(version) => version.to_string(),
        None => version::source_version(dir).unwrap_or_default(),
    }
}

/// Directories below `root` that contain a go.mod, skipping git metadata.
fn find_modules(root: &Path) -> Result<Vec<PathBuf>, WalkError> {
    let mut dirs = Vec::new();
    let walk = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != GIT_DIRECTORY_NAME);
    for entry in walk {
        let entry = entry.map_err(|source| WalkError::Directory {
            path: root.display().to_string(),
            source,
        })?;
        if entry.file_type().is_file() && entry.file_name() == GO_MOD {
            if let Some(dir) = entry.path().parent() {
                debug!("Found module in {}", dir.display());
                dirs.push(dir.to_path_buf());
            }
        }
    }
    Ok(dirs)
}

fn find_files(root: &Path) -> Result<Vec<PathBuf>, WalkError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| WalkError::Directory {
            path: root.display().to_string(),
            source,
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
