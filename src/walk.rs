use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use log::{debug, info, trace, warn};
use thiserror::Error;

use crate::{
    archive::{ArchiveError, OutputDirectory},
    buildinfo::{BuildInfo, BuildInfoError, Module},
    fetch::{FetchError, ModuleFetcher},
    license::{self, LicenseOracle},
    model::{
        gomod::{find_replacement, GoMod, Replace, Requirement, GO_MOD},
        gosum::SumEntry,
        resolved::ResolvedModule,
        Coordinate, ParseError,
    },
    proxy::ContentIndex,
    tree::{DirTree, SourceTree, TreeError, ZipTree},
};

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("{module} has no go.mod")]
    NoManifest { module: String },
    #[error("Invalid go.mod in {module}: {source}")]
    Manifest {
        module: String,
        #[source]
        source: ParseError,
    },
    #[error("Failed to get {module}: {source}")]
    Fetch {
        module: String,
        #[source]
        source: FetchError,
    },
    #[error("Failed to write sources of {module}: {source}")]
    Archive {
        module: String,
        #[source]
        source: ArchiveError,
    },
    #[error("Failed to read sources of {module}: {source}")]
    Tree {
        module: String,
        #[source]
        source: TreeError,
    },
    #[error("Failed to read build info from {path}: {source}")]
    BuildInfo {
        path: String,
        #[source]
        source: BuildInfoError,
    },
    #[error("Failed to search {path}: {source}")]
    Directory {
        path: String,
        #[source]
        source: walkdir::Error,
    },
}

/// Walks dependency graphs, fetching and scanning every module at most once.
///
/// One walker can be fed several roots; the visited set and the results
/// are shared between them.
pub struct Walker<'a, I> {
    fetcher: &'a ModuleFetcher<I>,
    oracle: &'a dyn LicenseOracle,
    output: Option<&'a OutputDirectory>,
    recursive: bool,
    visited: HashSet<Coordinate>,
    resolved: Vec<ResolvedModule>,
}

impl<'a, I: ContentIndex> Walker<'a, I> {
    pub fn new(fetcher: &'a ModuleFetcher<I>, oracle: &'a dyn LicenseOracle) -> Self {
        Walker {
            fetcher,
            oracle,
            output: None,
            recursive: false,
            visited: HashSet::new(),
            resolved: Vec::new(),
        }
    }

    /// Write the sources of every module to this directory.
    pub fn output(mut self, output: Option<&'a OutputDirectory>) -> Self {
        self.output = output;
        self
    }

    /// Follow the requirements of requirements, not only those of the root.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn resolved(&self) -> &[ResolvedModule] {
        &self.resolved
    }

    pub fn into_resolved(self) -> Vec<ResolvedModule> {
        self.resolved
    }

    /// Walks from a module fetched by name. An empty version means the
    /// latest one.
    pub fn walk_module(&mut self, coordinate: &Coordinate) -> Result<(), WalkError> {
        let coordinate = self.resolve_version(coordinate)?;
        if self.visited.contains(&coordinate) {
            debug!("{} was already processed", coordinate);
            return Ok(());
        }
        let go_mod = self
            .visit(&coordinate, true)?
            .ok_or_else(|| WalkError::NoManifest {
                module: coordinate.to_string(),
            })?;
        self.process_requirements(&go_mod.requires, &go_mod.replaces)
    }

    /// Walks from sources in a local directory, which must contain a go.mod.
    pub fn walk_source(&mut self, dir: &Path, version: &str) -> Result<(), WalkError> {
        let tree = DirTree::new(dir);
        let go_mod = read_manifest(&dir.display().to_string(), &tree)?;
        let coordinate = Coordinate::new(go_mod.module.clone(), version);
        if self.visited.contains(&coordinate) {
            debug!("{} was already processed", coordinate);
            return Ok(());
        }
        info!("Processing {} from {}", coordinate, dir.display());
        if self.record_existing(&coordinate).is_none() {
            self.record(&coordinate, &tree)?;
        }
        self.process_requirements(&go_mod.requires, &go_mod.replaces)
    }

    /// Walks the modules a Go binary was built from. Only the main module
    /// and the dependencies listed in the build info are processed.
    pub fn walk_build_info(&mut self, info: &BuildInfo) -> Result<(), WalkError> {
        let main = &info.main;
        let (version, derived) = if main.has_version() {
            (Some(main.version.clone()), false)
        } else {
            (info.version_from_build_flags(), true)
        };
        match version {
            Some(version) if !main.path.is_empty() => {
                let coordinate = Coordinate::new(main.path.clone(), version);
                if !self.visited.contains(&coordinate) {
                    match self.visit(&coordinate, false) {
                        Ok(_) => {}
                        Err(error) if derived => warn!(
                            "Skipping main module {}, version taken from build flags: {}",
                            coordinate, error
                        ),
                        Err(error) => return Err(error),
                    }
                }
            }
            _ => debug!(
                "No version recorded for main module {}, skipping it",
                main.path
            ),
        }

        for dependency in &info.deps {
            let Some(coordinate) = build_dependency(dependency) else {
                continue;
            };
            if self.visited.contains(&coordinate) {
                continue;
            }
            self.visit(&coordinate, false)?;
        }
        Ok(())
    }

    /// Walks every module listed in a go.sum.
    pub fn walk_sum(&mut self, entries: &[SumEntry]) -> Result<(), WalkError> {
        for entry in entries {
            if self.visited.contains(&entry.coordinate) {
                continue;
            }
            self.visit(&entry.coordinate, false)?;
        }
        Ok(())
    }

    fn process_requirements(
        &mut self,
        requirements: &[Requirement],
        replaces: &[Replace],
    ) -> Result<(), WalkError> {
        for requirement in requirements {
            self.process_requirement(&requirement.coordinate, replaces)?;
        }
        Ok(())
    }

    fn process_requirement(
        &mut self,
        requirement: &Coordinate,
        replaces: &[Replace],
    ) -> Result<(), WalkError> {
        if self.visited.contains(requirement) {
            trace!("{} was already processed", requirement);
            return Ok(());
        }
        let coordinate = match find_replacement(replaces, requirement) {
            Some(replacement) if !replacement.is_versioned() => {
                debug!(
                    "Skipping {}, replaced by local directory {}",
                    requirement, replacement.name
                );
                return Ok(());
            }
            Some(replacement) => {
                debug!("{} is replaced by {}", requirement, replacement);
                if self.visited.contains(replacement) {
                    return Ok(());
                }
                replacement.clone()
            }
            None => requirement.clone(),
        };

        let go_mod = self.visit(&coordinate, self.recursive)?;
        if let Some(go_mod) = go_mod {
            self.process_requirements(&go_mod.requires, replaces)?;
        }
        Ok(())
    }

    /// Fetches, scans and records one module, returning its go.mod when
    /// asked to and the module has one.
    fn visit(
        &mut self,
        coordinate: &Coordinate,
        with_manifest: bool,
    ) -> Result<Option<GoMod>, WalkError> {
        let coordinate = &self.resolve_version(coordinate)?;
        if let Some(archive) = self.record_existing(coordinate) {
            if !with_manifest {
                return Ok(None);
            }
            let tree = ZipTree::from_file(&archive).map_err(|source| WalkError::Tree {
                module: coordinate.to_string(),
                source,
            })?;
            return optional_manifest(coordinate, &tree);
        }

        let fetched = self
            .fetcher
            .fetch(coordinate)
            .map_err(|source| WalkError::Fetch {
                module: coordinate.to_string(),
                source,
            })?;
        self.visited.insert(coordinate.clone());
        self.record(&fetched.coordinate, fetched.tree.as_ref())?;
        if with_manifest {
            optional_manifest(&fetched.coordinate, fetched.tree.as_ref())
        } else {
            Ok(None)
        }
    }

    /// The coordinate itself, or its latest version when it has none. Output
    /// archives are named after the version, so it must be known before
    /// looking for one.
    fn resolve_version(&self, coordinate: &Coordinate) -> Result<Coordinate, WalkError> {
        if coordinate.is_versioned() {
            return Ok(coordinate.clone());
        }
        self.fetcher
            .latest(&coordinate.name)
            .map_err(|source| WalkError::Fetch {
                module: coordinate.to_string(),
                source,
            })
    }

    /// Records a module whose archive an earlier run already wrote, without
    /// scanning it again.
    fn record_existing(&mut self, coordinate: &Coordinate) -> Option<PathBuf> {
        let output = self.output?;
        let archive = output.existing(coordinate)?;
        info!(
            "{} already downloaded to {}, skipping",
            coordinate,
            archive.display()
        );
        self.visited.insert(coordinate.clone());
        self.resolved.push(ResolvedModule::new(
            coordinate.clone(),
            Vec::new(),
            Some(output.relative_path(coordinate)),
        ));
        Some(archive)
    }

    fn record(&mut self, coordinate: &Coordinate, tree: &dyn SourceTree) -> Result<(), WalkError> {
        let module = ResolvedModule::new(coordinate.clone(), Vec::new(), None);
        let module = match self.output {
            Some(output) => {
                let archived = output
                    .write(coordinate, tree, self.oracle)
                    .map_err(|source| WalkError::Archive {
                        module: coordinate.to_string(),
                        source,
                    })?;
                ResolvedModule {
                    licenses: archived.licenses,
                    path: Some(archived.path),
                    ..module
                }
            }
            None => ResolvedModule {
                licenses: license::scan_tree(tree, self.oracle).map_err(|source| {
                    WalkError::Tree {
                        module: coordinate.to_string(),
                        source,
                    }
                })?,
                ..module
            },
        };
        debug!("{} licenses: {:?}", coordinate, module.licenses);
        self.visited.insert(coordinate.clone());
        self.resolved.push(module);
        Ok(())
    }
}

/// The coordinate to fetch for a dependency recorded in build info, if any.
fn build_dependency(dependency: &Module) -> Option<Coordinate> {
    if !dependency.has_version() {
        return None;
    }
    match &dependency.replace {
        Some(replacement) if !replacement.has_version() => {
            debug!(
                "Skipping {}, replaced by local directory {}",
                dependency.path, replacement.path
            );
            None
        }
        Some(replacement) => Some(Coordinate::new(
            replacement.path.clone(),
            replacement.version.clone(),
        )),
        None => Some(Coordinate::new(
            dependency.path.clone(),
            dependency.version.clone(),
        )),
    }
}

fn read_manifest(module: &str, tree: &dyn SourceTree) -> Result<GoMod, WalkError> {
    let reader = tree.open(GO_MOD).map_err(|source| {
        if source.is_not_found() {
            WalkError::NoManifest {
                module: module.to_string(),
            }
        } else {
            WalkError::Tree {
                module: module.to_string(),
                source,
            }
        }
    })?;
    GoMod::from_reader(reader).map_err(|source| WalkError::Manifest {
        module: module.to_string(),
        source,
    })
}

fn optional_manifest(
    coordinate: &Coordinate,
    tree: &dyn SourceTree,
) -> Result<Option<GoMod>, WalkError> {
    match read_manifest(&coordinate.to_string(), tree) {
        Ok(go_mod) => Ok(Some(go_mod)),
        Err(WalkError::NoManifest { .. }) => {
            debug!("{} has no go.mod, not following its requirements", coordinate);
            Ok(None)
        }
        Err(error) => Err(error),
    }
}
