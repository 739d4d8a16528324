use std::fmt::{Debug, Display};

use serde::Serialize;
use thiserror::Error;

pub mod gomod;
pub mod gosum;
pub mod resolved;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error reading go.mod: {0}")]
    IO(#[from] std::io::Error),
    #[error("line {line}: multiple module directives")]
    DuplicateModule { line: usize },
    #[error("line {line}: multiple go directives")]
    DuplicateGoVersion { line: usize },
    #[error("line {line}: {directive} block opened inside another block")]
    NestedBlock { line: usize, directive: String },
    #[error("line {line}: {directive} does not accept a block")]
    UnsupportedBlock { line: usize, directive: String },
    #[error("line {line}: unexpected `)` outside of a block")]
    UnexpectedBlockEnd { line: usize },
    #[error("line {line}: {directive} is missing its argument")]
    MissingArgument { line: usize, directive: String },
    #[error("line {line}: invalid require entry `{entry}`")]
    InvalidRequire { line: usize, entry: String },
    #[error("line {line}: invalid replace entry `{entry}`")]
    InvalidReplace { line: usize, entry: String },
    #[error("line {line}: unknown directive `{directive}`")]
    UnknownDirective { line: usize, directive: String },
}

/// A module name and version, the identity of everything the walker visits.
///
/// An empty version is valid and means "unversioned", as produced by a
/// bare-name replace key or a local replacement target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize)]
pub struct Coordinate {
    pub name: String,
    pub version: String,
}

impl Coordinate {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Coordinate {
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn unversioned(name: impl Into<String>) -> Self {
        Self::new(name, "")
    }

    pub fn is_versioned(&self) -> bool {
        !self.version.is_empty()
    }

    /// Whether the name can be served by a module proxy, which requires a
    /// dot in the first path element (`github.com/...`, `golang.org/x/...`).
    /// Relative filesystem paths never qualify.
    pub fn is_remote(&self) -> bool {
        self.name
            .split('/')
            .next()
            .is_some_and(|host| host.contains('.') && !host.starts_with('.'))
    }

    pub fn escaped_name(&self) -> String {
        escape(&self.name)
    }

    pub fn escaped_version(&self) -> String {
        escape(&self.version)
    }

    /// `<escaped name>@<escaped version>`, the layout of the Go module cache.
    pub fn cache_path(&self) -> String {
        format!("{}@{}", self.escaped_name(), self.escaped_version())
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.version.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}@{}", self.name, self.version)
        }
    }
}

/// Case-encodes a module path or version the way the module proxy and the
/// module cache expect it: every upper-case letter becomes `!` followed by
/// its lower-case form.
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(c.to_ascii_lowercase());
        } else {
            escaped.push(c);
        }
    }
    escaped
}
