//! `mbr-print` — dump the MBR partition table and each NTFS partition's BPB.

use anyhow::{Context, Result};
use clap::Parser;
use relic_app::{analysis_failure, init_logging, open_volume, parse_cli};
use relic_core::mbr::{walk_partitions, PartitionKind};
use relic_core::ntfs::recover::SECTOR_SIZE;
use relic_core::ntfs::NtfsBoot;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "mbr-print")]
#[command(version, about = "Print the MBR partition table of a volume image")]
struct Cli {
    /// Volume image to inspect
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
    let mut src = open_volume(&cli.file)?;

    let partitions = walk_partitions(&mut src, SECTOR_SIZE)
        .context("failed to read the partition table")?;
    if partitions.is_empty() {
        println!("No partitions found.");
        return Ok(());
    }

    for partition in &partitions {
        println!("\n{}", partition.describe());

        if partition.kind == PartitionKind::Ntfs {
            let boot = NtfsBoot::read(&mut src, partition.start_sector, SECTOR_SIZE)
                .with_context(|| {
                    format!(
                        "failed to read the NTFS BPB at sector {}",
                        partition.start_sector
                    )
                })?;
            println!("\n{}", boot.describe(partition.start_sector));
        }
    }

    Ok(())
}
