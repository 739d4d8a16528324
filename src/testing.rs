//! In-memory stand-ins for the module proxy and the license classifier.

use std::{
    cell::RefCell,
    collections::HashMap,
    io::{Cursor, Write},
};

use zip::{write::SimpleFileOptions, ZipWriter};

use crate::{
    fetch::FetchError,
    license::{Coverage, LicenseMatch, LicenseOracle},
    model::Coordinate,
    proxy::ContentIndex,
};

/// A module proxy serving zip archives built in memory. Every archive
/// request is recorded.
#[derive(Default)]
pub struct FakeIndex {
    versions: HashMap<String, Vec<String>>,
    archives: HashMap<Coordinate, Vec<u8>>,
    requests: RefCell<Vec<Coordinate>>,
}

impl FakeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// A module whose go.mod requires the given modules.
    pub fn with_module(self, name: &str, version: &str, requires: &[(&str, &str)]) -> Self {
        let mut go_mod = format!("module {name}\n");
        for (required, required_version) in requires {
            go_mod.push_str(&format!("require {required} {required_version}\n"));
        }
        self.with_files(name, version, &[("go.mod", go_mod.as_str())])
    }

    pub fn with_files(mut self, name: &str, version: &str, files: &[(&str, &str)]) -> Self {
        let coordinate = Coordinate::new(name, version);
        let prefix = format!("{coordinate}/");
        let prefixed = files
            .iter()
            .map(|(path, contents)| (format!("{prefix}{path}"), *contents))
            .collect::<Vec<_>>();
        self.archives.insert(
            coordinate,
            zip_archive(
                &prefixed
                    .iter()
                    .map(|(path, contents)| (path.as_str(), *contents))
                    .collect::<Vec<_>>(),
            ),
        );
        self.versions
            .entry(name.to_string())
            .or_default()
            .push(version.to_string());
        self
    }

    pub fn with_versions(mut self, name: &str, versions: &[&str]) -> Self {
        self.versions.insert(
            name.to_string(),
            versions.iter().map(|version| version.to_string()).collect(),
        );
        self
    }

    pub fn requests(&self) -> Vec<Coordinate> {
        self.requests.borrow().clone()
    }
}

impl ContentIndex for FakeIndex {
    fn versions(&self, name: &str) -> Result<Vec<String>, FetchError> {
        self.versions
            .get(name)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: format!("fake://{name}/@v/list"),
                status: 404,
            })
    }

    fn archive(&self, coordinate: &Coordinate) -> Result<Vec<u8>, FetchError> {
        self.requests.borrow_mut().push(coordinate.clone());
        self.archives
            .get(coordinate)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: format!("fake://{}/@v/{}.zip", coordinate.name, coordinate.version),
                status: 404,
            })
    }
}

pub fn zip_archive(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (path, contents) in files {
        writer
            .start_file(*path, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Classifies a text as every license id it mentions literally, with full
/// coverage when it mentions at least one.
pub struct KeywordOracle;

const KEYWORDS: [&str; 3] = ["Apache-2.0", "BSD-3-Clause", "MIT"];

impl LicenseOracle for KeywordOracle {
    fn scan(&self, contents: &[u8]) -> Coverage {
        let text = String::from_utf8_lossy(contents);
        let matches = KEYWORDS
            .iter()
            .filter_map(|keyword| {
                text.find(keyword).map(|start| LicenseMatch {
                    id: keyword.to_string(),
                    start,
                    end: start + keyword.len(),
                })
            })
            .collect::<Vec<_>>();
        let percent = if matches.is_empty() { 0.0 } else { 100.0 };
        Coverage { percent, matches }
    }
}
