//! Shared CLI plumbing for the Relic binaries: argument-parse exit policy,
//! logging setup, and volume opening with mmap-to-file fallback.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use relic_core::VolumeSource;
use relic_io::{DiskReader, MmapReader};
use std::path::Path;
use std::process::ExitCode;

/// Parses arguments with the house exit policy: help and version leave with
/// 0, a usage error with 1.
pub fn parse_cli<T: Parser>() -> T {
    match T::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = err.print();
            std::process::exit(code);
        }
    }
}

/// Initializes env_logger at warn level, raised by `--verbose`/`--debug`.
pub fn init_logging(verbose: bool, debug: bool) {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Reports an analysis failure and yields the parse-failure exit code.
pub fn analysis_failure(err: anyhow::Error) -> ExitCode {
    eprintln!("error: {err:#}");
    ExitCode::from(2)
}

/// Opens a volume image, preferring a memory mapping and falling back to
/// the plain reader for sources that refuse to map.
pub fn open_volume(path: &Path) -> Result<Box<dyn VolumeSource>> {
    match MmapReader::open(path) {
        Ok(reader) => Ok(Box::new(reader)),
        Err(err) => {
            log::debug!("mmap unavailable for {}: {err}; using file reads", path.display());
            let reader = DiskReader::open(path)
                .with_context(|| format!("failed to open image '{}'", path.display()))?;
            Ok(Box::new(reader))
        }
    }
}
