use log::{debug, info};
use thiserror::Error;

use crate::{
    cache::GoModuleCache,
    model::Coordinate,
    proxy::ContentIndex,
    tree::{SourceTree, TreeError, ZipTree},
};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{name} is not a remote module path and was not found in the module cache")]
    InvalidCoordinate { name: String },
    #[error("Request to {url} failed with status {status}")]
    Status { url: String, status: u16 },
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("The module proxy knows no versions of {name}")]
    NoVersions { name: String },
    #[error("Invalid module archive for {coordinate}: {source}")]
    Zip {
        coordinate: String,
        #[source]
        source: TreeError,
    },
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

pub struct FetchedModule {
    /// The requested coordinate, with the version filled in when it was
    /// resolved to the latest one.
    pub coordinate: Coordinate,
    pub tree: Box<dyn SourceTree>,
}

/// Turns coordinates into source trees, from the local module cache when it
/// has them and from the module proxy otherwise.
pub struct ModuleFetcher<I> {
    index: I,
    cache: Option<GoModuleCache>,
    refresh: bool,
}

impl<I: ContentIndex> ModuleFetcher<I> {
    pub fn new(index: I, cache: Option<GoModuleCache>) -> Self {
        ModuleFetcher {
            index,
            cache,
            refresh: false,
        }
    }

    /// Always download from the proxy, even when the module cache has a copy.
    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn fetch(&self, coordinate: &Coordinate) -> Result<FetchedModule, FetchError> {
        let coordinate = if coordinate.is_versioned() {
            coordinate.clone()
        } else {
            self.latest(&coordinate.name)?
        };

        if !self.refresh {
            if let Some(tree) = self.cache.as_ref().and_then(|cache| cache.lookup(&coordinate)) {
                return Ok(FetchedModule {
                    coordinate,
                    tree: Box::new(tree),
                });
            }
        }

        if !coordinate.is_remote() {
            return Err(FetchError::InvalidCoordinate {
                name: coordinate.name,
            });
        }

        debug!("Downloading {} from the module proxy", coordinate);
        let bytes = self.index.archive(&coordinate)?;
        info!("Downloaded {} ({} bytes)", coordinate, bytes.len());

        let prefix = format!("{}@{}/", coordinate.name, coordinate.version);
        let tree = ZipTree::with_prefix(bytes, prefix).map_err(|source| FetchError::Zip {
            coordinate: coordinate.to_string(),
            source,
        })?;
        Ok(FetchedModule {
            coordinate,
            tree: Box::new(tree),
        })
    }

    /// The last version the module proxy lists for a module.
    pub fn latest(&self, name: &str) -> Result<Coordinate, FetchError> {
        let unversioned = Coordinate::unversioned(name);
        if !unversioned.is_remote() {
            return Err(FetchError::InvalidCoordinate {
                name: name.to_string(),
            });
        }
        info!("Getting latest version of {}", name);
        let version = self
            .index
            .versions(name)?
            .pop()
            .ok_or_else(|| FetchError::NoVersions {
                name: name.to_string(),
            })?;
        info!("Latest version of {} is {}", name, version);
        Ok(Coordinate::new(name, version))
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, io::Read};

    use super::*;
    use crate::testing::FakeIndex;

    use pretty_assertions::assert_eq;

    fn read_go_mod(fetched: &FetchedModule) -> String {
        let mut contents = String::new();
        fetched
            .tree
            .open("go.mod")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        contents
    }

    #[test]
    fn fetch_from_proxy() {
        let index = FakeIndex::new().with_module("github.com/x/y", "v1.2.3", &[]);
        let fetcher = ModuleFetcher::new(&index, None);
        let fetched = fetcher
            .fetch(&Coordinate::new("github.com/x/y", "v1.2.3"))
            .unwrap();
        assert_eq!(fetched.coordinate, Coordinate::new("github.com/x/y", "v1.2.3"));
        assert_eq!(read_go_mod(&fetched), "module github.com/x/y\n");
        assert_eq!(
            index.requests(),
            vec![Coordinate::new("github.com/x/y", "v1.2.3")]
        );
    }

    #[test]
    fn empty_version_resolves_latest() {
        let index = FakeIndex::new()
            .with_module("github.com/x/y", "v1.0.0", &[])
            .with_module("github.com/x/y", "v1.1.0", &[]);
        let fetcher = ModuleFetcher::new(&index, None);
        let fetched = fetcher
            .fetch(&Coordinate::unversioned("github.com/x/y"))
            .unwrap();
        assert_eq!(fetched.coordinate, Coordinate::new("github.com/x/y", "v1.1.0"));
    }

    #[test]
    fn no_versions() {
        let index = FakeIndex::new().with_versions("github.com/x/y", &[]);
        let fetcher = ModuleFetcher::new(&index, None);
        assert!(matches!(
            fetcher.fetch(&Coordinate::unversioned("github.com/x/y")),
            Err(FetchError::NoVersions { .. })
        ));
    }

    #[test]
    fn local_name_is_invalid() {
        let index = FakeIndex::new();
        let fetcher = ModuleFetcher::new(&index, None);
        assert!(matches!(
            fetcher.fetch(&Coordinate::new("internal/thing", "v1.0.0")),
            Err(FetchError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            fetcher.latest("internal/thing"),
            Err(FetchError::InvalidCoordinate { .. })
        ));
        assert_eq!(index.requests(), vec![]);
    }

    #[test]
    fn missing_module_is_status_error() {
        let index = FakeIndex::new();
        let fetcher = ModuleFetcher::new(&index, None);
        assert!(matches!(
            fetcher.fetch(&Coordinate::new("github.com/x/y", "v1.0.0")),
            Err(FetchError::Status { status: 404, .. })
        ));
    }

    fn cache_with_module() -> (tempfile::TempDir, GoModuleCache) {
        let dir = tempfile::tempdir().unwrap();
        let module = dir.path().join("github.com/x/y@v1.2.3");
        fs::create_dir_all(&module).unwrap();
        fs::write(module.join("go.mod"), "module github.com/x/y // cached\n").unwrap();
        let cache = GoModuleCache::new(dir.path().to_path_buf()).unwrap();
        (dir, cache)
    }

    #[test]
    fn cache_is_preferred() {
        let (_dir, cache) = cache_with_module();
        let index = FakeIndex::new().with_module("github.com/x/y", "v1.2.3", &[]);
        let fetcher = ModuleFetcher::new(&index, Some(cache));
        let fetched = fetcher
            .fetch(&Coordinate::new("github.com/x/y", "v1.2.3"))
            .unwrap();
        assert_eq!(read_go_mod(&fetched), "module github.com/x/y // cached\n");
        assert_eq!(index.requests(), vec![]);
    }

    #[test]
    fn refresh_skips_cache() {
        let (_dir, cache) = cache_with_module();
        let index = FakeIndex::new().with_module("github.com/x/y", "v1.2.3", &[]);
        let fetcher = ModuleFetcher::new(&index, Some(cache)).refresh(true);
        let fetched = fetcher
            .fetch(&Coordinate::new("github.com/x/y", "v1.2.3"))
            .unwrap();
        assert_eq!(read_go_mod(&fetched), "module github.com/x/y\n");
        assert_eq!(index.requests().len(), 1);
    }
}
