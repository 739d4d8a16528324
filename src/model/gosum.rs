use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

use log::{debug, warn};

use crate::model::Coordinate;

pub const GO_SUM: &str = "go.sum";

/// Versions carrying this suffix hash only the module's go.mod, not its sources.
const GO_MOD_HASH_SUFFIX: &str = "/go.mod";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SumEntry {
    pub coordinate: Coordinate,
    pub hash: String,
}

pub fn from_file(path: &Path) -> Result<Vec<SumEntry>, std::io::Error> {
    debug!("Attempting to read go.sum from {}", path.display());
    let file = File::open(path)?;
    Ok(from_reader(file))
}

/// Reads every source-hash line of a go.sum. Lines that do not have exactly
/// three fields are skipped; a read error ends the scan early.
pub fn from_reader(reader: impl Read) -> Vec<SumEntry> {
    let mut entries = Vec::new();
    for line in BufReader::new(reader).lines() {
        let line = match line {
            Ok(line) => line,
            Err(error) => {
                warn!("Stopped reading go.sum: {}", error);
                break;
            }
        };
        let fields = line.split_whitespace().collect::<Vec<_>>();
        let [name, version, hash] = fields.as_slice() else {
            continue;
        };
        if version.ends_with(GO_MOD_HASH_SUFFIX) {
            continue;
        }
        entries.push(SumEntry {
            coordinate: Coordinate::new(*name, *version),
            hash: hash.to_string(),
        });
    }
    entries
}
