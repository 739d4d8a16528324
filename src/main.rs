use std::{error::Error, io};

use clap::Parser;
use env_logger::Env;
use go_sources_and_licenses::{
    cli::args::{CliArgs, Command},
    report::Report,
    SourceScanner,
};
use log::info;

fn main() {
    let cli_args: CliArgs = CliArgs::parse();
    let default_filter = if cli_args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    if let Err(e) = run(cli_args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli_args: CliArgs) -> Result<(), Box<dyn Error>> {
    let (scan, out) = match cli_args.cmd {
        Command::Licenses { scan, out } => (scan, out),
        Command::Sources { scan, out } => (scan, Some(out)),
    };
    let report = Report::new(&scan.template)?;

    let mut builder = SourceScanner::builder()
        .recursive(scan.recursive)
        .refresh(scan.refresh);
    if let Some(proxy) = cli_args.proxy {
        builder = builder.proxy_url(proxy);
    }
    if let Some(cache_dir) = cli_args.cache_dir {
        builder = builder.cache_directory(cache_dir);
    }
    if let Some(out) = out {
        builder = builder.output_directory(out);
    }
    if let Some(prefix) = scan.prefix.clone() {
        builder = builder.prefix(prefix);
    }
    let scanner = builder.try_build()?;

    let modules = scanner.scan(&scan.root())?;
    info!("Found {} modules", modules.len());
    report.write_all(&modules, &mut io::stdout().lock())?;
    Ok(())
}

