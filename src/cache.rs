use std::path::{Path, PathBuf};

use log::{debug, trace};
use thiserror::Error;

use crate::{
    model::{gomod::GO_MOD, Coordinate},
    tree::DirTree,
};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache location {location} is not a directory")]
    BadLocation { location: String },
}

/// Read-only view of a Go module cache (`GOMODCACHE`), where every module
/// version is extracted to `<escaped name>@<escaped version>/`.
#[derive(Debug, Clone)]
pub struct GoModuleCache {
    location: PathBuf,
}

impl GoModuleCache {
    pub fn new(location: PathBuf) -> Result<GoModuleCache, CacheError> {
        if location.exists() && !location.is_dir() {
            return Err(CacheError::BadLocation {
                location: location.to_string_lossy().to_string(),
            });
        }
        if !location.exists() {
            debug!(
                "Module cache {} does not exist, every module will be downloaded",
                location.display()
            );
        }
        Ok(GoModuleCache { location })
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// The extracted sources of a module version, if the cache holds a
    /// complete copy of it.
    pub fn lookup(&self, coordinate: &Coordinate) -> Option<DirTree> {
        let path = self.location.join(coordinate.cache_path());
        if path.is_dir() && path.join(GO_MOD).is_file() {
            debug!("Found {} in module cache at {}", coordinate, path.display());
            Some(DirTree::new(path))
        } else {
            trace!("{} is not in the module cache", coordinate);
            None
        }
    }
}
