pub mod archive;
pub mod buildinfo;
pub mod cache;
pub mod cli;
pub mod config;
pub mod fetch;
pub mod license;
pub mod model;
pub mod proxy;
pub mod report;
pub mod tree;
pub mod version;
pub mod walk;

mod api;
#[cfg(test)]
mod testing;

pub use api::{Root, SourceScanner, SourceScannerBuilder};
