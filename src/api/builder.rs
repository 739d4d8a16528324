use std::{error::Error, path::PathBuf};

use home::home_dir;
use log::debug;

use crate::{
    archive::OutputDirectory,
    buildinfo::GoBuildInfoReader,
    cache::GoModuleCache,
    config::ScannerConfig,
    fetch::ModuleFetcher,
    license::{LicenseOracle, TemplateOracle},
    proxy::{ProxyClient, DEFAULT_PROXY_URL},
    SourceScanner,
};

#[derive(Default)]
pub struct SourceScannerBuilder {
    proxy_url: Option<String>,
    cache_directory_path: Option<PathBuf>,
    output_directory_path: Option<PathBuf>,
    prefix: Option<PathBuf>,
    recursive: bool,
    refresh: bool,
    oracle: Option<Box<dyn LicenseOracle>>,
}

impl SourceScannerBuilder {
    /// Base URL of the Go module proxy.
    ///
    /// Defaults to `$GOSL_PROXY_URL`, then `https://proxy.golang.org`.
    pub fn proxy_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }

    /// Location of the Go module cache, read before the proxy is asked.
    ///
    /// Defaults to `$GOSL_CACHE_DIR`, `$GOMODCACHE`, `$GOPATH/pkg/mod`
    /// and finally `$HOME/go/pkg/mod`.
    pub fn cache_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_directory_path = Some(path.into());
        self
    }

    /// Directory to write one source zip per module to. Nothing is written
    /// when unset.
    pub fn output_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_directory_path = Some(path.into());
        self
    }

    /// Subdirectory of the output directory the archives go to.
    pub fn prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Follow the requirements of every dependency, not only of the root.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Download from the proxy even when the module cache has a module.
    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    /// License classifier. Defaults to the built-in template matcher.
    pub fn oracle(mut self, oracle: Box<dyn LicenseOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn try_build(self) -> Result<SourceScanner, Box<dyn Error>> {
        let Self {
            proxy_url,
            cache_directory_path,
            output_directory_path,
            prefix,
            recursive,
            refresh,
            oracle,
        } = self;
        let config = ScannerConfig::load()?;

        let proxy_url = proxy_url
            .or(config.proxy_url)
            .unwrap_or_else(|| DEFAULT_PROXY_URL.to_string());

        let cache_directory = match cache_directory_path.or(config.cache_dir) {
            Some(path) => path,
            None => default_module_cache()?,
        };
        debug!("Using module cache {}", cache_directory.display());
        debug!("Using module proxy {}", proxy_url);

        let cache = GoModuleCache::new(cache_directory)?;
        let index = ProxyClient::new(proxy_url)?;
        let fetcher = ModuleFetcher::new(index, Some(cache)).refresh(refresh);

        let output =
            output_directory_path.map(|location| OutputDirectory::new(location, prefix));

        Ok(SourceScanner {
            fetcher,
            oracle: oracle.unwrap_or_else(|| Box::new(TemplateOracle::default())),
            output,
            recursive,
            build_info_reader: GoBuildInfoReader,
        })
    }
}

fn default_module_cache() -> Result<PathBuf, Box<dyn Error>> {
    let mut cache_directory =
        home_dir().ok_or("Could not find home dir. Please define $HOME env variable.")?;
    cache_directory.push("go/pkg/mod");
    Ok(cache_directory)
}
