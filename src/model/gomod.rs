use std::{
    fmt::Display,
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

use log::{debug, trace, warn};

use crate::model::{Coordinate, ParseError};

pub const GO_MOD: &str = "go.mod";

const REPLACE_ARROW: &str = "=>";
const COMMENT: &str = "//";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoMod {
    pub module: String,
    pub go_version: Option<String>,
    pub requires: Vec<Requirement>,
    pub replaces: Vec<Replace>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub coordinate: Coordinate,
    /// Informational only, the walker treats direct and indirect requirements alike.
    pub indirect: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replace {
    /// An empty version matches every version of the module.
    pub old: Coordinate,
    /// An empty version marks a replacement by a local directory.
    pub new: Coordinate,
}

impl Replace {
    pub fn is_local(&self) -> bool {
        !self.new.is_versioned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    Module,
    Go,
    Toolchain,
    Godebug,
    Require,
    Exclude,
    Replace,
    Retract,
}

impl Directive {
    fn from_keyword(keyword: &str) -> Option<Directive> {
        match keyword {
            "module" => Some(Directive::Module),
            "go" => Some(Directive::Go),
            "toolchain" => Some(Directive::Toolchain),
            "godebug" => Some(Directive::Godebug),
            "require" => Some(Directive::Require),
            "exclude" => Some(Directive::Exclude),
            "replace" => Some(Directive::Replace),
            "retract" => Some(Directive::Retract),
            _ => None,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Directive::Module => "module",
            Directive::Go => "go",
            Directive::Toolchain => "toolchain",
            Directive::Godebug => "godebug",
            Directive::Require => "require",
            Directive::Exclude => "exclude",
            Directive::Replace => "replace",
            Directive::Retract => "retract",
        }
    }

    fn accepts_block(self) -> bool {
        !matches!(
            self,
            Directive::Module | Directive::Go | Directive::Toolchain
        )
    }
}

impl GoMod {
    pub fn from_file(path: &Path) -> Result<GoMod, ParseError> {
        debug!("Attempting to read go.mod from {}", path.display());
        let file = File::open(path)?;
        GoMod::from_reader(file)
    }

    pub fn from_reader(reader: impl Read) -> Result<GoMod, ParseError> {
        let mut go_mod = GoMod::default();
        let mut block: Option<Directive> = None;

        for (index, line) in BufReader::new(reader).lines().enumerate() {
            let line_number = index + 1;
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with(COMMENT) {
                continue;
            }
            let tokens = line.split_whitespace().collect::<Vec<_>>();

            match block {
                Some(directive) => {
                    if tokens == [")"] {
                        block = None;
                        continue;
                    }
                    if let [keyword, "(", ..] = tokens.as_slice() {
                        if Directive::from_keyword(keyword).is_some() {
                            return Err(ParseError::NestedBlock {
                                line: line_number,
                                directive: keyword.to_string(),
                            });
                        }
                    }
                    go_mod.apply(directive, &tokens, line_number)?;
                }
                None => {
                    let keyword = tokens[0];
                    if keyword == ")" {
                        return Err(ParseError::UnexpectedBlockEnd { line: line_number });
                    }
                    let directive = Directive::from_keyword(keyword).ok_or_else(|| {
                        ParseError::UnknownDirective {
                            line: line_number,
                            directive: keyword.to_string(),
                        }
                    })?;
                    let arguments = &tokens[1..];
                    match arguments.first() {
                        None => {
                            return Err(ParseError::MissingArgument {
                                line: line_number,
                                directive: keyword.to_string(),
                            })
                        }
                        Some(&"(") if directive.accepts_block() => block = Some(directive),
                        Some(&"(") => {
                            return Err(ParseError::UnsupportedBlock {
                                line: line_number,
                                directive: keyword.to_string(),
                            })
                        }
                        Some(_) => go_mod.apply(directive, arguments, line_number)?,
                    }
                }
            }
        }

        if let Some(directive) = block {
            warn!(
                "go.mod of {} ends inside an unterminated {} block",
                go_mod.module,
                directive.keyword()
            );
        }

        Ok(go_mod)
    }

    fn apply(
        &mut self,
        directive: Directive,
        arguments: &[&str],
        line: usize,
    ) -> Result<(), ParseError> {
        match directive {
            Directive::Module => {
                if !self.module.is_empty() {
                    return Err(ParseError::DuplicateModule { line });
                }
                self.module = unquote(arguments[0]).to_string();
            }
            Directive::Go => {
                if self.go_version.is_some() {
                    return Err(ParseError::DuplicateGoVersion { line });
                }
                self.go_version = Some(arguments[0].to_string());
            }
            Directive::Require => self.requires.push(parse_require(arguments, line)?),
            Directive::Replace => self.replaces.push(parse_replace(arguments, line)?),
            Directive::Toolchain | Directive::Godebug | Directive::Exclude | Directive::Retract => {
                trace!(
                    "Ignoring {} directive on line {}",
                    directive.keyword(),
                    line
                )
            }
        }
        Ok(())
    }

    /// The replacement for a coordinate, if any.
    pub fn replacement(&self, coordinate: &Coordinate) -> Option<&Coordinate> {
        find_replacement(&self.replaces, coordinate)
    }
}

/// Looks a coordinate up in a list of replace directives. A key with a
/// version must match exactly and wins over a bare-name key; among equal
/// keys the last declaration wins.
pub fn find_replacement<'a>(
    replaces: &'a [Replace],
    coordinate: &Coordinate,
) -> Option<&'a Coordinate> {
    replaces
        .iter()
        .rev()
        .find(|replace| replace.old.is_versioned() && replace.old == *coordinate)
        .or_else(|| {
            replaces
                .iter()
                .rev()
                .find(|replace| !replace.old.is_versioned() && replace.old.name == coordinate.name)
        })
        .map(|replace| &replace.new)
}

fn parse_require(tokens: &[&str], line: usize) -> Result<Requirement, ParseError> {
    if tokens.len() < 2 || tokens[0].starts_with(COMMENT) || tokens[1].starts_with(COMMENT) {
        return Err(ParseError::InvalidRequire {
            line,
            entry: tokens.join(" "),
        });
    }
    let indirect = tokens.len() > 3 && tokens.last().is_some_and(|t| t.ends_with("indirect"));
    Ok(Requirement {
        coordinate: Coordinate::new(unquote(tokens[0]), tokens[1]),
        indirect,
    })
}

fn parse_replace(tokens: &[&str], line: usize) -> Result<Replace, ParseError> {
    let invalid = || ParseError::InvalidReplace {
        line,
        entry: tokens.join(" "),
    };
    let end = tokens
        .iter()
        .position(|token| token.starts_with(COMMENT))
        .unwrap_or(tokens.len());
    let tokens_without_comment = &tokens[..end];
    let arrow = tokens_without_comment
        .iter()
        .position(|token| *token == REPLACE_ARROW)
        .ok_or_else(invalid)?;

    let old = parse_replace_side(&tokens_without_comment[..arrow]).ok_or_else(invalid)?;
    let new = parse_replace_side(&tokens_without_comment[arrow + 1..]).ok_or_else(invalid)?;
    Ok(Replace { old, new })
}

fn parse_replace_side(tokens: &[&str]) -> Option<Coordinate> {
    match tokens {
        [name] => Some(Coordinate::unversioned(unquote(name))),
        [name, version] => Some(Coordinate::new(unquote(name), *version)),
        _ => None,
    }
}

fn unquote(token: &str) -> &str {
    token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(token)
}

fn write_coordinate(f: &mut std::fmt::Formatter, coordinate: &Coordinate) -> std::fmt::Result {
    f.write_str(&coordinate.name)?;
    if coordinate.is_versioned() {
        write!(f, " {}", coordinate.version)?;
    }
    Ok(())
}

impl Display for GoMod {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if !self.module.is_empty() {
            writeln!(f, "module {}", self.module)?;
        }
        if let Some(go_version) = &self.go_version {
            writeln!(f, "\ngo {}", go_version)?;
        }
        if !self.requires.is_empty() {
            writeln!(f, "\nrequire (")?;
            for requirement in &self.requires {
                f.write_str("\t")?;
                write_coordinate(f, &requirement.coordinate)?;
                if requirement.indirect {
                    f.write_str(" // indirect")?;
                }
                writeln!(f)?;
            }
            writeln!(f, ")")?;
        }
        if !self.replaces.is_empty() {
            writeln!(f, "\nreplace (")?;
            for replace in &self.replaces {
                f.write_str("\t")?;
                write_coordinate(f, &replace.old)?;
                write!(f, " {} ", REPLACE_ARROW)?;
                write_coordinate(f, &replace.new)?;
                writeln!(f)?;
            }
            writeln!(f, ")")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> Result<GoMod, ParseError> {
        GoMod::from_reader(text.as_bytes())
    }

    fn require(name: &str, version: &str, indirect: bool) -> Requirement {
        Requirement {
            coordinate: Coordinate::new(name, version),
            indirect,
        }
    }

    fn replace(old: Coordinate, new: Coordinate) -> Replace {
        Replace { old, new }
    }

    #[test]
    fn load_valid_file() {
        let path = project_root::get_project_root()
            .unwrap()
            .join("resources/gomod/go.mod");
        let go_mod = GoMod::from_file(&path).unwrap();
        let expected = GoMod {
            module: "github.com/example/service".to_string(),
            go_version: Some("1.21".to_string()),
            requires: vec![
                require("github.com/spf13/cobra", "v1.8.0", false),
                require("golang.org/x/text", "v0.14.0", false),
                require("github.com/inconshreveable/mousetrap", "v1.1.0", true),
                require("github.com/spf13/pflag", "v1.0.5", true),
                require("gopkg.in/yaml.v3", "v3.0.1", false),
            ],
            replaces: vec![
                replace(
                    Coordinate::unversioned("golang.org/x/text"),
                    Coordinate::new("github.com/golang/text", "v0.13.0"),
                ),
                replace(
                    Coordinate::new("github.com/spf13/pflag", "v1.0.5"),
                    Coordinate::unversioned("../pflag"),
                ),
            ],
        };
        assert_eq!(go_mod, expected);
    }

    #[test]
    fn single_line_directives() {
        let go_mod = parse(
            r#"
module "github.com/x/root"
go 1.22.1
toolchain go1.22.3
require github.com/x/y v1.2.3
replace github.com/x/y v1.2.3 => github.com/z/y v1.2.4
exclude github.com/x/z v0.1.0
retract v1.0.0 // published by mistake
godebug default=go1.21
"#,
        )
        .unwrap();
        assert_eq!(go_mod.module, "github.com/x/root");
        assert_eq!(go_mod.go_version.as_deref(), Some("1.22.1"));
        assert_eq!(
            go_mod.requires,
            vec![require("github.com/x/y", "v1.2.3", false)]
        );
        assert_eq!(
            go_mod.replaces,
            vec![replace(
                Coordinate::new("github.com/x/y", "v1.2.3"),
                Coordinate::new("github.com/z/y", "v1.2.4"),
            )]
        );
    }

    #[test]
    fn indirect_needs_four_tokens() {
        let go_mod = parse(
            "require a.io/x v1.0.0 // indirect\nrequire b.io/x v1.0.0 //indirect\nrequire (\n\tc.io/x v1.0.0 // indirect\n)\n",
        )
        .unwrap();
        assert_eq!(
            go_mod.requires,
            vec![
                require("a.io/x", "v1.0.0", true),
                require("b.io/x", "v1.0.0", false),
                require("c.io/x", "v1.0.0", true),
            ]
        );
    }

    #[test]
    fn comments_and_blank_lines() {
        let go_mod = parse(
            "// leading comment\n\n   // indented comment\nmodule a.io/m\nrequire (\n\t// inside\n\n\tb.io/n v0.0.1\n)\n",
        )
        .unwrap();
        assert_eq!(go_mod.module, "a.io/m");
        assert_eq!(go_mod.requires, vec![require("b.io/n", "v0.0.1", false)]);
    }

    #[test]
    fn ignored_blocks() {
        let go_mod = parse(
            "module a.io/m\nretract (\n\tv1.0.0\n\t[v1.1.0, v1.2.0]\n)\nexclude (\n\tb.io/n v0.0.1\n)\ngodebug (\n\tpanicnil=1\n)\n",
        )
        .unwrap();
        assert_eq!(go_mod.requires, vec![]);
        assert_eq!(go_mod.replaces, vec![]);
    }

    #[test]
    fn replace_with_trailing_comment() {
        let go_mod = parse("replace a.io/x => ../x // local checkout\n").unwrap();
        assert_eq!(
            go_mod.replaces,
            vec![replace(
                Coordinate::unversioned("a.io/x"),
                Coordinate::unversioned("../x")
            )]
        );
        assert!(go_mod.replaces[0].is_local());
    }

    #[test]
    fn duplicate_module() {
        let error = parse("module a.io/x\nmodule a.io/y\n").unwrap_err();
        assert!(matches!(error, ParseError::DuplicateModule { line: 2 }));
    }

    #[test]
    fn duplicate_go() {
        let error = parse("module a.io/x\n\ngo 1.20\ngo 1.21\n").unwrap_err();
        assert!(matches!(error, ParseError::DuplicateGoVersion { line: 4 }));
    }

    #[test]
    fn nested_block() {
        let error = parse("require (\n\treplace (\n)\n").unwrap_err();
        assert!(matches!(error, ParseError::NestedBlock { line: 2, .. }));
    }

    #[test]
    fn module_block() {
        let error = parse("module (\n)\n").unwrap_err();
        assert!(matches!(error, ParseError::UnsupportedBlock { line: 1, .. }));
    }

    #[test]
    fn unexpected_block_end() {
        let error = parse("module a.io/x\n)\n").unwrap_err();
        assert!(matches!(error, ParseError::UnexpectedBlockEnd { line: 2 }));
    }

    #[test]
    fn missing_argument() {
        let error = parse("module a.io/x\nrequire\n").unwrap_err();
        assert!(matches!(error, ParseError::MissingArgument { line: 2, .. }));
    }

    #[test]
    fn invalid_require() {
        let error = parse("require (\n\ta.io/x\n)\n").unwrap_err();
        assert!(matches!(error, ParseError::InvalidRequire { line: 2, .. }));
    }

    #[test]
    fn invalid_replace() {
        for text in [
            "replace a.io/x v1.0.0\n",
            "replace => b.io/x v1.0.0\n",
            "replace a.io/x =>\n",
            "replace a.io/x v1 extra => b.io/x\n",
        ] {
            let error = parse(text).unwrap_err();
            assert!(
                matches!(error, ParseError::InvalidReplace { line: 1, .. }),
                "{text}"
            );
        }
    }

    #[test]
    fn unknown_directive() {
        let error = parse("module a.io/x\nfrobnicate a b\n").unwrap_err();
        assert!(matches!(
            error,
            ParseError::UnknownDirective { line: 2, directive } if directive == "frobnicate"
        ));
    }

    #[test]
    fn versioned_replace_wins_over_bare_name() {
        let go_mod = parse(
            "replace (\n\ta.io/x v1.0.0 => b.io/x v2.0.0\n\ta.io/x => c.io/x v3.0.0\n)\n",
        )
        .unwrap();
        assert_eq!(
            go_mod.replacement(&Coordinate::new("a.io/x", "v1.0.0")),
            Some(&Coordinate::new("b.io/x", "v2.0.0"))
        );
        assert_eq!(
            go_mod.replacement(&Coordinate::new("a.io/x", "v1.1.0")),
            Some(&Coordinate::new("c.io/x", "v3.0.0"))
        );
        assert_eq!(go_mod.replacement(&Coordinate::new("d.io/x", "v1.1.0")), None);
    }

    #[test]
    fn last_replace_wins() {
        let go_mod =
            parse("replace a.io/x => b.io/x v1.0.0\nreplace a.io/x => c.io/x v1.0.0\n").unwrap();
        assert_eq!(
            go_mod.replacement(&Coordinate::new("a.io/x", "v0.1.0")),
            Some(&Coordinate::new("c.io/x", "v1.0.0"))
        );
    }

    #[test]
    fn display_round_trip() {
        let path = project_root::get_project_root()
            .unwrap()
            .join("resources/gomod/go.mod");
        let go_mod = GoMod::from_file(&path).unwrap();
        let reparsed = parse(&go_mod.to_string()).unwrap();
        assert_eq!(reparsed, go_mod);
    }

    #[test]
    fn display_canonical_form() {
        let go_mod = GoMod {
            module: "a.io/m".to_string(),
            go_version: Some("1.21".to_string()),
            requires: vec![
                require("b.io/n", "v1.0.0", false),
                require("c.io/o", "v0.2.0", true),
            ],
            replaces: vec![replace(
                Coordinate::unversioned("b.io/n"),
                Coordinate::unversioned("./n"),
            )],
        };
        assert_eq!(
            go_mod.to_string(),
            "module a.io/m\n\ngo 1.21\n\nrequire (\n\tb.io/n v1.0.0\n\tc.io/o v0.2.0 // indirect\n)\n\nreplace (\n\tb.io/n => ./n\n)\n"
        );
    }
}
