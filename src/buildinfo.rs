use std::{fs, path::Path, sync::OnceLock};

use log::{debug, trace};
use regex_lite::Regex;
use thiserror::Error;

const BUILD_INFO_MAGIC: &[u8] = b"\xff Go buildinf:";
const BUILD_INFO_ALIGN: usize = 16;
const BUILD_INFO_HEADER_SIZE: usize = 32;
const FLAGS_OFFSET: usize = 15;
const FLAGS_VERSION_INLINE: u8 = 0x2;
const MOD_INFO_SENTINEL_SIZE: usize = 16;

pub const DEVEL_VERSION: &str = "(devel)";

const LDFLAGS_KEY: &str = "-ldflags";
const KNOWN_BUILD_FLAG_PATTERNS: [&str; 2] = [
    r"(?m)\.([gG]it)?([bB]uild)?[vV]ersion=(\S+/)*(?P<version>v?\d+.\d+.\d+[-\w]*)",
    r"(?m)\.([tT]ag)=(\S+/)*(?P<version>v?\d+.\d+.\d+[-\w]*)",
];

#[derive(Error, Debug)]
pub enum BuildInfoError {
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Not a Go binary: no build info found")]
    NotGoBinary,
    #[error("Build info written before Go 1.18 is not supported")]
    UnsupportedFormat,
    #[error("Build info is truncated")]
    Truncated,
    #[error("Malformed module info line `{0}`")]
    MalformedLine(String),
}

/// What the Go linker records about how a binary was built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildInfo {
    pub go_version: String,
    /// Package path of the main package.
    pub path: String,
    pub main: Module,
    pub deps: Vec<Module>,
    pub settings: Vec<BuildSetting>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    pub path: String,
    pub version: String,
    pub sum: String,
    pub replace: Option<Box<Module>>,
}

impl Module {
    pub fn has_version(&self) -> bool {
        !self.version.is_empty() && self.version != DEVEL_VERSION
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSetting {
    pub key: String,
    pub value: String,
}

pub trait BuildInfoReader {
    fn read(&self, path: &Path) -> Result<BuildInfo, BuildInfoError>;
}

/// Reads build info from executables on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoBuildInfoReader;

impl BuildInfoReader for GoBuildInfoReader {
    fn read(&self, path: &Path) -> Result<BuildInfo, BuildInfoError> {
        trace!("Reading build info from {}", path.display());
        let data = fs::read(path)?;
        BuildInfo::from_binary(&data)
    }
}

impl BuildInfo {
    pub fn from_binary(data: &[u8]) -> Result<BuildInfo, BuildInfoError> {
        let start = find_magic(data).ok_or(BuildInfoError::NotGoBinary)?;
        let header = data
            .get(start..start + BUILD_INFO_HEADER_SIZE)
            .ok_or(BuildInfoError::Truncated)?;
        if header[FLAGS_OFFSET] & FLAGS_VERSION_INLINE == 0 {
            return Err(BuildInfoError::UnsupportedFormat);
        }

        let mut rest = &data[start + BUILD_INFO_HEADER_SIZE..];
        let go_version = read_string(&mut rest).ok_or(BuildInfoError::Truncated)?;
        let mod_info = read_string(&mut rest).ok_or(BuildInfoError::Truncated)?;

        let mut info = BuildInfo::parse_mod_info(&String::from_utf8_lossy(strip_sentinels(
            mod_info,
        )))?;
        info.go_version = String::from_utf8_lossy(go_version).to_string();
        debug!(
            "Found build info of {} built with {}",
            info.path, info.go_version
        );
        Ok(info)
    }

    /// Parses the textual module info, one tab-separated record per line.
    pub fn parse_mod_info(text: &str) -> Result<BuildInfo, BuildInfoError> {
        let mut info = BuildInfo::default();
        let mut last_is_main = false;
        for line in text.lines() {
            if line.is_empty() {
                continue;
            }
            let (kind, rest) = line
                .split_once('\t')
                .ok_or_else(|| BuildInfoError::MalformedLine(line.to_string()))?;
            match kind {
                "go" => info.go_version = rest.to_string(),
                "path" => info.path = rest.to_string(),
                "mod" => {
                    info.main = parse_module(line, rest)?;
                    last_is_main = true;
                }
                "dep" => {
                    info.deps.push(parse_module(line, rest)?);
                    last_is_main = false;
                }
                "=>" => {
                    let replacement = Box::new(parse_module(line, rest)?);
                    let replaced = if last_is_main {
                        Some(&mut info.main)
                    } else {
                        info.deps.last_mut()
                    };
                    replaced
                        .ok_or_else(|| BuildInfoError::MalformedLine(line.to_string()))?
                        .replace = Some(replacement);
                }
                "build" => info.settings.push(parse_setting(line, rest)?),
                _ => trace!("Ignoring module info line {}", line),
            }
        }
        Ok(info)
    }

    /// The main module version a release build stamped into a variable with
    /// `-ldflags -X`, for binaries built outside of module mode.
    pub fn version_from_build_flags(&self) -> Option<String> {
        let ldflags = self
            .settings
            .iter()
            .find(|setting| setting.key == LDFLAGS_KEY)?;
        if ldflags.value.is_empty() {
            return None;
        }
        build_flag_patterns().iter().find_map(|pattern| {
            let version = pattern
                .captures_iter(&ldflags.value)
                .filter_map(|captures| captures.name("version"))
                .map(|m| m.as_str())
                .find(|version| !version.is_empty())?;
            Some(if version.starts_with('v') {
                version.to_string()
            } else {
                format!("v{}", version)
            })
        })
    }
}

fn build_flag_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        KNOWN_BUILD_FLAG_PATTERNS
            .iter()
            .map(|pattern| Regex::new(pattern).unwrap())
            .collect()
    })
}

fn find_magic(data: &[u8]) -> Option<usize> {
    let mut found = data
        .windows(BUILD_INFO_MAGIC.len())
        .enumerate()
        .filter(|(_, window)| *window == BUILD_INFO_MAGIC)
        .map(|(offset, _)| offset);
    let first = found.next()?;
    if first % BUILD_INFO_ALIGN == 0 {
        return Some(first);
    }
    Some(
        found
            .find(|offset| offset % BUILD_INFO_ALIGN == 0)
            .unwrap_or(first),
    )
}

fn read_uvarint(data: &mut &[u8]) -> Option<u64> {
    let bytes = *data;
    let mut value = 0u64;
    let mut shift = 0;
    for (index, byte) in bytes.iter().enumerate() {
        if shift >= 64 {
            return None;
        }
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            *data = &bytes[index + 1..];
            return Some(value);
        }
        shift += 7;
    }
    None
}

fn read_string<'a>(data: &mut &'a [u8]) -> Option<&'a [u8]> {
    let length = usize::try_from(read_uvarint(data)?).ok()?;
    let bytes: &'a [u8] = *data;
    let string = bytes.get(..length)?;
    *data = &bytes[length..];
    Some(string)
}

fn strip_sentinels(mod_info: &[u8]) -> &[u8] {
    let length = mod_info.len();
    if length > 2 * MOD_INFO_SENTINEL_SIZE && mod_info[length - MOD_INFO_SENTINEL_SIZE - 1] == b'\n' {
        &mod_info[MOD_INFO_SENTINEL_SIZE..length - MOD_INFO_SENTINEL_SIZE]
    } else {
        &[]
    }
}

fn parse_module(line: &str, rest: &str) -> Result<Module, BuildInfoError> {
    let fields = rest.split('\t').collect::<Vec<_>>();
    match fields.as_slice() {
        [path, version] | [path, version, ""] => Ok(Module {
            path: path.to_string(),
            version: version.to_string(),
            ..Default::default()
        }),
        [path, version, sum] => Ok(Module {
            path: path.to_string(),
            version: version.to_string(),
            sum: sum.to_string(),
            replace: None,
        }),
        _ => Err(BuildInfoError::MalformedLine(line.to_string())),
    }
}

fn parse_setting(line: &str, rest: &str) -> Result<BuildSetting, BuildInfoError> {
    let malformed = || BuildInfoError::MalformedLine(line.to_string());
    let (key, value) = if rest.starts_with('"') {
        let (key, after) = unquote(rest).ok_or_else(malformed)?;
        (key, after.strip_prefix('=').ok_or_else(malformed)?)
    } else {
        let (key, value) = rest.split_once('=').ok_or_else(malformed)?;
        (key.to_string(), value)
    };
    let value = if value.starts_with('"') {
        match unquote(value) {
            Some((value, "")) => value,
            _ => return Err(malformed()),
        }
    } else {
        value.to_string()
    };
    Ok(BuildSetting { key, value })
}

/// Decodes a Go double-quoted string literal at the start of `text`,
/// returning it with the text that follows the closing quote.
fn unquote(text: &str) -> Option<(String, &str)> {
    let mut chars = text.strip_prefix('"')?.char_indices();
    let mut unquoted = String::new();
    while let Some((index, c)) = chars.next() {
        match c {
            '"' => return Some((unquoted, &text[index + 2..])),
            '\\' => {
                let (_, escape) = chars.next()?;
                match escape {
                    'a' => unquoted.push('\x07'),
                    'b' => unquoted.push('\x08'),
                    'f' => unquoted.push('\x0c'),
                    'n' => unquoted.push('\n'),
                    'r' => unquoted.push('\r'),
                    't' => unquoted.push('\t'),
                    'v' => unquoted.push('\x0b'),
                    '\\' | '"' | '\'' => unquoted.push(escape),
                    'x' | 'u' | 'U' => {
                        let digits = match escape {
                            'x' => 2,
                            'u' => 4,
                            _ => 8,
                        };
                        let hex = (0..digits)
                            .map(|_| chars.next().map(|(_, c)| c))
                            .collect::<Option<String>>()?;
                        let code = u32::from_str_radix(&hex, 16).ok()?;
                        unquoted.push(char::from_u32(code)?);
                    }
                    _ => return None,
                }
            }
            c => unquoted.push(c),
        }
    }
    None
}
