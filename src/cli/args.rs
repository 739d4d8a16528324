use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

use crate::{api::Root, report::DEFAULT_TEMPLATE};

/// Resolves the dependencies of Go modules and binaries, downloads their
/// sources and reports their licenses.
#[derive(Debug, Parser)]
#[command(version)]
pub struct CliArgs {
    #[command(subcommand)]
    pub cmd: Command,
    /// Base URL of the Go module proxy.
    /// Defaults to $GOSL_PROXY_URL, then https://proxy.golang.org
    #[arg(short, long, global = true)]
    pub proxy: Option<String>,
    /// Location of the Go module cache.
    /// Defaults to $GOSL_CACHE_DIR, $GOMODCACHE, $GOPATH/pkg/mod, then $HOME/go/pkg/mod
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,
    /// Log debug messages
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Lists the licenses of a module and its dependencies
    #[command(visible_aliases = ["license", "list"])]
    Licenses {
        #[command(flatten)]
        scan: ScanArgs,
        /// Also write the sources of every module to this directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Downloads the sources of a module and its dependencies
    #[command(visible_alias = "source")]
    Sources {
        #[command(flatten)]
        scan: ScanArgs,
        /// Directory to write one zip archive per module to
        #[arg(short, long)]
        out: PathBuf,
    },
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("root").required(true).args(["module", "src", "binary", "sum"])))]
pub struct ScanArgs {
    /// Module name, source directory, binary or go.sum file, depending on
    /// the selected root
    pub target: String,
    /// TARGET is a module name
    #[arg(short, long)]
    pub module: bool,
    /// TARGET is a directory of module sources
    #[arg(short, long)]
    pub src: bool,
    /// TARGET is a Go executable
    #[arg(short, long)]
    pub binary: bool,
    /// TARGET is a go.sum file
    #[arg(long)]
    pub sum: bool,
    /// Version of the module, or of the sources.
    /// Defaults to the latest version of a module and to a version derived
    /// from git for sources
    #[arg(short = 'v', long = "version")]
    pub module_version: Option<String>,
    /// Search TARGET recursively for modules or Go executables
    #[arg(short, long)]
    pub find: bool,
    /// Follow the requirements of dependencies too
    #[arg(short, long)]
    pub recursive: bool,
    /// Handlebars template for each output line. Fields: Module, Version,
    /// Licenses, LicenseList and Path
    #[arg(long, default_value = DEFAULT_TEMPLATE)]
    pub template: String,
    /// Subdirectory of the output directory to write archives to
    #[arg(long)]
    pub prefix: Option<PathBuf>,
    /// Download modules even when the module cache has them
    #[arg(long)]
    pub refresh: bool,
}

impl ScanArgs {
    pub fn root(&self) -> Root {
        let path = PathBuf::from(&self.target);
        if self.module {
            Root::Module {
                name: self.target.clone(),
                version: self.module_version.clone(),
            }
        } else if self.src {
            Root::Source {
                path,
                version: self.module_version.clone(),
                find: self.find,
            }
        } else if self.binary {
            Root::Binary {
                path,
                find: self.find,
            }
        } else {
            Root::Sum { path }
        }
    }
}
