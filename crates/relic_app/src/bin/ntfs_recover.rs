//! `ntfs-recover` — recover deleted files from the NTFS partitions of an
//! MBR-partitioned volume image.

use anyhow::{Context, Result};
use clap::Parser;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use relic_app::{analysis_failure, init_logging, open_volume, parse_cli};
use relic_core::ntfs::recover::recover_deleted;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ntfs-recover")]
#[command(version, about = "Recover deleted files from NTFS partitions")]
struct Cli {
    /// Volume image to analyze
    #[arg(short = 'f', long = "file")]
    file: PathBuf,

    /// Directory receiving the recovered files
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Also write recovery_report.json into the output directory
    #[arg(long)]
    report: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    image: String,
    partitions_scanned: usize,
    entries_scanned: u64,
    files: Vec<ReportFile<'a>>,
}

#[derive(Serialize)]
struct ReportFile<'a> {
    entry_number: u32,
    name: &'a str,
    bytes: u64,
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
    let mut src = open_volume(&cli.file)?;

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
        .context("failed to install the Ctrl+C handler")?;

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg}\n[{elapsed_precise}] [{wide_bar}] {pos}/{len} entries")
            .context("invalid progress template")?
            .progress_chars("#>-"),
    );
    bar.set_message("Walking MFT entries...");

    let progress_bar = bar.clone();
    let outcome = recover_deleted(
        &mut src,
        &cli.output,
        &cancel,
        move |scanned, total| {
            progress_bar.set_length(total);
            progress_bar.set_position(scanned);
        },
    )
    .context("recovery failed")?;
    bar.finish_and_clear();

    let total_bytes: u64 = outcome.files.iter().map(|f| f.bytes).sum();
    for file in &outcome.files {
        println!(
            "Recovered '{}' ({}) from MFT entry {}",
            file.name,
            format_size(file.bytes, BINARY),
            file.entry_number
        );
    }
    println!(
        "\nRecovered {} files ({}) from {} NTFS partitions; {} entries scanned.",
        outcome.files.len(),
        format_size(total_bytes, BINARY),
        outcome.partitions_scanned,
        outcome.entries_scanned
    );
    if cancel.load(Ordering::Relaxed) {
        println!("Scan was interrupted; results are partial.");
    }

    if cli.report {
        let report = Report {
            image: cli.file.display().to_string(),
            partitions_scanned: outcome.partitions_scanned,
            entries_scanned: outcome.entries_scanned,
            files: outcome
                .files
                .iter()
                .map(|f| ReportFile {
                    entry_number: f.entry_number,
                    name: &f.name,
                    bytes: f.bytes,
                })
                .collect(),
        };
        let path = cli.output.join("recovery_report.json");
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Report saved to: {}", path.display());
    }

    Ok(())
}
