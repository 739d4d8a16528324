use std::io::Read;

use log::{debug, warn};

use crate::tree::{EntryKind, SourceTree, TreeError};

mod oracle;
mod tee;
mod templates;

pub use oracle::{Coverage, LicenseMatch, LicenseOracle, TemplateOracle};
pub use tee::LicenseTee;

pub const UNKNOWN_LICENSE: &str = "UNKNOWN";

/// Minimum share of a license file, in percent, the oracle must recognize
/// before the file counts as fully classified.
pub const COVERAGE_THRESHOLD: f64 = 75.0;

const VENDOR_DIRECTORY: &str = "vendor";

/// Base names of the files that are scanned for license text, as used by
/// pkg.go.dev.
pub const LICENSE_FILE_NAMES: [&str; 40] = [
    "COPYING",
    "COPYING.md",
    "COPYING.markdown",
    "COPYING.txt",
    "LICENCE",
    "LICENCE.md",
    "LICENCE.markdown",
    "LICENCE.txt",
    "LICENSE",
    "LICENSE.md",
    "LICENSE.markdown",
    "LICENSE.txt",
    "LICENSE-2.0.txt",
    "LICENCE-2.0.txt",
    "LICENSE-APACHE",
    "LICENCE-APACHE",
    "LICENSE-APACHE-2.0.txt",
    "LICENCE-APACHE-2.0.txt",
    "LICENSE-MIT",
    "LICENCE-MIT",
    "LICENSE.MIT",
    "LICENCE.MIT",
    "LICENSE.code",
    "LICENCE.code",
    "LICENSE.docs",
    "LICENCE.docs",
    "LICENSE.rst",
    "LICENCE.rst",
    "MIT-LICENSE",
    "MIT-LICENCE",
    "MIT-LICENSE.md",
    "MIT-LICENCE.md",
    "MIT-LICENSE.markdown",
    "MIT-LICENCE.markdown",
    "MIT-LICENSE.txt",
    "MIT-LICENCE.txt",
    "MIT_LICENSE",
    "MIT_LICENCE",
    "UNLICENSE",
    "UNLICENCE",
];

/// Whether a `/`-separated path inside a module names a license file that
/// belongs to the module itself rather than to vendored code.
pub fn is_license_file(path: &str) -> bool {
    let mut components = path.split('/').collect::<Vec<_>>();
    let Some(file_name) = components.pop() else {
        return false;
    };
    LICENSE_FILE_NAMES.contains(&file_name) && !components.contains(&VENDOR_DIRECTORY)
}

/// License ids for the contents of one license file. `UNKNOWN` comes first
/// when too little of the text was recognized; every license the oracle
/// matched follows it, below the threshold as well.
pub fn classify(oracle: &dyn LicenseOracle, contents: &[u8]) -> Vec<String> {
    let coverage = oracle.scan(contents);
    let mut licenses = Vec::with_capacity(coverage.matches.len() + 1);
    if coverage.percent < COVERAGE_THRESHOLD {
        licenses.push(UNKNOWN_LICENSE.to_string());
    }
    licenses.extend(coverage.matches.into_iter().map(|m| m.id));
    licenses
}

/// Classifies every license file of a tree, in tree order.
pub fn scan_tree(
    tree: &dyn SourceTree,
    oracle: &dyn LicenseOracle,
) -> Result<Vec<String>, TreeError> {
    let mut licenses = Vec::new();
    for entry in tree.entries()? {
        if entry.kind != EntryKind::File || !is_license_file(&entry.path) {
            continue;
        }
        let mut contents = Vec::new();
        let read = tree
            .open(&entry.path)
            .and_then(|mut reader| Ok(reader.read_to_end(&mut contents)?));
        if let Err(error) = read {
            warn!("Skipping license file {}: {}", entry.path, error);
            continue;
        }
        let found = classify(oracle, &contents);
        debug!("{}: {:?}", entry.path, found);
        licenses.extend(found);
    }
    Ok(licenses)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::{
        testing::KeywordOracle,
        tree::{DirTree, TreeEntry},
    };

    use pretty_assertions::assert_eq;

    #[test]
    fn license_file_names() {
        assert!(is_license_file("LICENSE"));
        assert!(is_license_file("sub/dir/COPYING.txt"));
        assert!(is_license_file("MIT_LICENCE"));
        assert!(!is_license_file("license"));
        assert!(!is_license_file("LICENSE.go"));
        assert!(!is_license_file("docs/LICENSE/readme.md"));
    }

    #[test]
    fn vendored_license_files_are_ignored() {
        assert!(!is_license_file("vendor/github.com/x/y/LICENSE"));
        assert!(!is_license_file("third_party/vendor/LICENSE"));
        assert!(is_license_file("vendors/LICENSE"));
    }

    #[test]
    fn classify_below_threshold_is_unknown() {
        assert_eq!(classify(&KeywordOracle, b"MIT"), vec!["MIT"]);
        assert_eq!(classify(&KeywordOracle, b"All rights reserved"), vec!["UNKNOWN"]);
        assert_eq!(
            classify(&KeywordOracle, b"MIT or Apache-2.0"),
            vec!["Apache-2.0", "MIT"]
        );
    }

    #[test]
    fn classify_keeps_matches_below_threshold() {
        struct PartialOracle;

        impl LicenseOracle for PartialOracle {
            fn scan(&self, _contents: &[u8]) -> Coverage {
                Coverage {
                    percent: 40.0,
                    matches: vec![LicenseMatch {
                        id: "MIT".to_string(),
                        start: 0,
                        end: 3,
                    }],
                }
            }
        }

        assert_eq!(classify(&PartialOracle, b"MIT plus notes"), vec!["UNKNOWN", "MIT"]);
    }

    /// Reports entry sizes the way a zip header can claim them, regardless
    /// of the real contents.
    struct OversizedTree;

    impl SourceTree for OversizedTree {
        fn entries(&self) -> Result<Vec<TreeEntry>, TreeError> {
            Ok(vec![TreeEntry {
                path: "LICENSE".to_string(),
                kind: EntryKind::File,
                size: u64::MAX,
            }])
        }

        fn open(&self, _path: &str) -> Result<Box<dyn Read + '_>, TreeError> {
            Ok(Box::new("MIT".as_bytes()))
        }

        fn stat(&self, path: &str) -> Result<TreeEntry, TreeError> {
            Ok(TreeEntry {
                path: path.to_string(),
                kind: EntryKind::File,
                size: u64::MAX,
            })
        }
    }

    #[test]
    fn declared_size_is_not_trusted() {
        let licenses = scan_tree(&OversizedTree, &KeywordOracle).unwrap();
        assert_eq!(licenses, vec!["MIT"]);
    }

    #[test]
    fn scan_tree_concatenates() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::create_dir_all(dir.path().join("vendor/a.io/x")).unwrap();
        fs::write(dir.path().join("LICENSE"), "MIT").unwrap();
        fs::write(dir.path().join("sub/LICENSE.md"), "MIT").unwrap();
        fs::write(dir.path().join("vendor/a.io/x/LICENSE"), "Apache-2.0").unwrap();
        fs::write(dir.path().join("main.go"), "package main // MIT").unwrap();

        let licenses = scan_tree(&DirTree::new(dir.path()), &KeywordOracle).unwrap();
        assert_eq!(licenses, vec!["MIT", "MIT"]);
    }

    #[test]
    fn scan_tree_without_license_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("go.mod"), "module a.io/x\n").unwrap();
        let licenses = scan_tree(&DirTree::new(dir.path()), &KeywordOracle).unwrap();
        assert_eq!(licenses, Vec::<String>::new());
    }
}
