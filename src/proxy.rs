use log::trace;
use reqwest::blocking::Client;

use crate::{
    fetch::FetchError,
    model::{escape, Coordinate},
};

pub const DEFAULT_PROXY_URL: &str = "https://proxy.golang.org";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// The remote side of module resolution: a GOPROXY-style index of versions
/// and source archives.
pub trait ContentIndex {
    /// Known versions of a module, oldest first.
    fn versions(&self, name: &str) -> Result<Vec<String>, FetchError>;

    /// The raw zip archive of a module version.
    fn archive(&self, coordinate: &Coordinate) -> Result<Vec<u8>, FetchError>;
}

impl<T: ContentIndex + ?Sized> ContentIndex for &T {
    fn versions(&self, name: &str) -> Result<Vec<String>, FetchError> {
        (**self).versions(name)
    }

    fn archive(&self, coordinate: &Coordinate) -> Result<Vec<u8>, FetchError> {
        (**self).archive(coordinate)
    }
}

pub struct ProxyClient {
    base_url: String,
    client: Client,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| FetchError::Transport {
                url: base_url.clone(),
                source,
            })?;
        Ok(ProxyClient { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn list_url(&self, name: &str) -> String {
        format!("{}/{}/@v/list", self.base_url, escape(name))
    }

    fn archive_url(&self, coordinate: &Coordinate) -> String {
        format!(
            "{}/{}/@v/{}.zip",
            self.base_url,
            coordinate.escaped_name(),
            coordinate.escaped_version()
        )
    }

    fn get(&self, url: String) -> Result<Vec<u8>, FetchError> {
        trace!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let body = response
            .bytes()
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;
        Ok(body.to_vec())
    }
}

impl ContentIndex for ProxyClient {
    fn versions(&self, name: &str) -> Result<Vec<String>, FetchError> {
        let body = self.get(self.list_url(name))?;
        Ok(parse_version_list(&String::from_utf8_lossy(&body)))
    }

    fn archive(&self, coordinate: &Coordinate) -> Result<Vec<u8>, FetchError> {
        self.get(self.archive_url(coordinate))
    }
}

fn parse_version_list(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
