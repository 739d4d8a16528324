use std::path::PathBuf;

use super::Coordinate;

/// One module the walker fetched (or found already downloaded) and scanned.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResolvedModule {
    pub coordinate: Coordinate,
    /// One entry per classified license file, in scan order. Duplicates are kept.
    pub licenses: Vec<String>,
    /// Location of the sources archive relative to the output directory.
    pub path: Option<PathBuf>,
}

impl ResolvedModule {
    pub fn new(coordinate: Coordinate, licenses: Vec<String>, path: Option<PathBuf>) -> Self {
        ResolvedModule {
            coordinate,
            licenses,
            path,
        }
    }
}
