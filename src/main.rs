use std::path::PathBuf;

use anyhow::{bail, Result};
use vidtree::RunOptions;

const HELP: &str = "vidtree - Browse a home video library server from the terminal.

  --server <url>       Library server base URL (overrides config)
  --config <path>      Read config from <path>
  --play <path>        Start on a media item and show its related videos
  --version, -V        Show version and exit
  --help,    -h        Show this help message";

enum Cli {
    Exit,
    Run(RunOptions),
}

fn main() {
    let options = match parse_args(std::env::args().skip(1)) {
        Ok(Cli::Exit) => return,
        Ok(Cli::Run(options)) => options,
        Err(err) => {
            eprintln!("error: {err}\n\n{HELP}");
            std::process::exit(2);
        }
    };

    if let Err(err) = vidtree::run(options) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Cli> {
    let mut options = RunOptions::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("vidtree {}", vidtree::VERSION);
                return Ok(Cli::Exit);
            }
            "--help" | "-h" => {
                println!("{HELP}");
                return Ok(Cli::Exit);
            }
            "--server" => options.server = Some(value_for(&arg, args.next())?),
            "--config" => options.config_file = Some(PathBuf::from(value_for(&arg, args.next())?)),
            "--play" => options.play = Some(value_for(&arg, args.next())?),
            other => bail!("unknown argument {other:?}"),
        }
    }
    Ok(Cli::Run(options))
}

fn value_for(flag: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(value) if !value.starts_with("--") => Ok(value),
        _ => bail!("{flag} needs a value"),
    }
}
