use std::{collections::HashMap, path::PathBuf};

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

pub struct ScannerConfig {
    pub proxy_url: Option<String>,
    pub cache_dir: Option<PathBuf>,
}

impl ScannerConfig {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_env(None)
    }

    fn from_env(env: Option<HashMap<String, String>>) -> anyhow::Result<Self> {
        let raw_config = RawConfig::load(env.clone())?;
        let go_environment = GoEnvironment::load(env)?;

        Ok(Self {
            proxy_url: raw_config.proxy.url,
            cache_dir: raw_config
                .cache
                .dir
                .or_else(|| go_environment.module_cache()),
        })
    }
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct RawConfig {
    #[serde(default)]
    proxy: ProxyConfig,
    #[serde(default)]
    cache: CacheConfig,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct ProxyConfig {
    url: Option<String>,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct CacheConfig {
    dir: Option<PathBuf>,
}

impl RawConfig {
    fn load(env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("GOSL").separator("_").source(env))
            .build()?
            .try_deserialize()
    }
}

/// The variables the go command itself uses to locate the module cache.
#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct GoEnvironment {
    gomodcache: Option<PathBuf>,
    gopath: Option<String>,
}

impl GoEnvironment {
    fn load(env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::default().source(env))
            .build()?
            .try_deserialize()
    }

    /// `$GOMODCACHE`, else `pkg/mod` below the first `$GOPATH` entry.
    fn module_cache(self) -> Option<PathBuf> {
        if let Some(dir) = self.gomodcache.filter(|dir| !dir.as_os_str().is_empty()) {
            return Some(dir);
        }
        let gopath = self.gopath?;
        let first = std::env::split_paths(&gopath).next()?;
        if first.as_os_str().is_empty() {
            return None;
        }
        Some(first.join("pkg").join("mod"))
    }
}
