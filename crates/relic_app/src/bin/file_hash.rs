//! `file-hash` — print the SHA-1, SHA-256, and MD5 digests of a file.

use anyhow::{Context, Result};
use clap::Parser;
use md5::Md5;
use relic_app::{analysis_failure, init_logging, parse_cli};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

const CHUNK_SIZE: usize = 8192;

#[derive(Parser)]
#[command(name = "file-hash")]
#[command(version, about = "Print SHA-1, SHA-256, and MD5 digests of a file")]
struct Cli {
    /// File to digest
    #[arg(short = 'f', long = "file")]
    file: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = parse_cli::<Cli>();
    init_logging(cli.verbose, cli.debug);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => analysis_failure(err),
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut file = File::open(&cli.file)
        .with_context(|| format!("failed to open '{}'", cli.file.display()))?;

    let mut sha1 = Sha1::new();
    let mut sha256 = Sha256::new();
    let mut md5 = Md5::new();

    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        sha1.update(&chunk[..n]);
        sha256.update(&chunk[..n]);
        md5.update(&chunk[..n]);
    }

    println!("File: {}", cli.file.display());
    println!("SHA-1: {}", hex::encode(sha1.finalize()));
    println!("SHA-256: {}", hex::encode(sha256.finalize()));
    println!("MD5: {}", hex::encode(md5.finalize()));
    Ok(())
}
