use std::{error::Error, path::PathBuf};

use crate::{
    archive::OutputDirectory,
    buildinfo::GoBuildInfoReader,
    cli::command_handlers::do_scan,
    fetch::ModuleFetcher,
    license::LicenseOracle,
    model::resolved::ResolvedModule,
    proxy::ProxyClient,
};

mod builder;

pub use builder::SourceScannerBuilder;

/// Where a scan starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Root {
    /// A module fetched by name. Without a version the latest one is used.
    Module {
        name: String,
        version: Option<String>,
    },
    /// Module sources on disk. Without a version one is derived from git.
    /// With `find`, every directory below `path` containing a go.mod.
    Source {
        path: PathBuf,
        version: Option<String>,
        find: bool,
    },
    /// A Go executable, or with `find` every Go executable below `path`.
    Binary { path: PathBuf, find: bool },
    /// Every module listed in a go.sum file.
    Sum { path: PathBuf },
}

pub struct SourceScanner {
    fetcher: ModuleFetcher<ProxyClient>,
    oracle: Box<dyn LicenseOracle>,
    output: Option<OutputDirectory>,
    recursive: bool,
    build_info_reader: GoBuildInfoReader,
}

impl SourceScanner {
    pub fn builder() -> SourceScannerBuilder {
        SourceScannerBuilder::default()
    }

    /// Resolves the modules reachable from a root and their licenses,
    /// writing their sources to the output directory when there is one.
    pub fn scan(&self, root: &Root) -> Result<Vec<ResolvedModule>, Box<dyn Error>> {
        do_scan(
            &self.fetcher,
            self.oracle.as_ref(),
            self.output.as_ref(),
            self.recursive,
            &self.build_info_reader,
            root,
        )
    }
}
