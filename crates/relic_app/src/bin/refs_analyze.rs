//! `refs-analyze` — interactive directory navigator for ReFS 3.x images.

use anyhow::{Context, Result};
use clap::Parser;
use relic_app::{analysis_failure, init_logging, open_volume, parse_cli};
use relic_core::filetime::utc_offset_hours;
use relic_core::refs::directory::Origin;
use relic_core::refs::navigator::{not_found_message, Listing, MSG_ALREADY_AT_ROOT};
use relic_core::refs::{read_vbr, Catalogs, NavigatorSession, Outcome};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "refs-analyze")]
#[command(version, about = "Navigate the directory tree of a ReFS 3.x image")]
struct Cli {
    /// Volume image to analyze
    #[arg(short = 'f', long = "file")]
    file: PathBuf,

    /// Display offset for timestamps, in whole hours from UTC
    #[arg(long = "utc-offset", default_value_t = 9)]
    utc_offset: i32,

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

    // A bad offset is a malformed argument, not an image parse failure.
    let offset = match utc_offset_hours(cli.utc_offset) {
        Ok(offset) => offset,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(1);
        }
    };

    match run(&cli, offset) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => analysis_failure(err),
    }
}

fn run(cli: &Cli, offset: chrono::FixedOffset) -> Result<()> {
    let mut src = open_volume(&cli.file)?;

    let geometry = read_vbr(&mut src).context("failed to read the ReFS VBR")?;
    log::info!(
        "cluster size {} B, container size {} B ({} clusters per container)",
        geometry.cluster_size,
        geometry.container_size,
        geometry.clusters_per_container
    );
    let catalogs =
        Catalogs::build(&mut src, &geometry).context("failed to build the catalogs")?;
    let mut session = NavigatorSession::new(&mut src, geometry, catalogs);

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        let listing = session.list().context("failed to list the directory")?;
        print_listing(&listing, offset);

        print!("{} > ", session.path());
        std::io::stdout().flush()?;
        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match session.handle_line(line)? {
            Outcome::Exited => break,
            Outcome::AtRoot => println!("{MSG_ALREADY_AT_ROOT}"),
            Outcome::NotFound(name) => println!("{}", not_found_message(&name)),
            Outcome::Descended | Outcome::Ascended => {}
        }
    }

    Ok(())
}

fn print_listing(listing: &Listing, offset: chrono::FixedOffset) {
    println!("\n{}", listing.path);
    for dir in &listing.dirs {
        let stamp = match dir.origin {
            Origin::PageListed => dir.accessed.render(offset),
            Origin::AdjacencyOnly => "-".into(),
        };
        println!("d  {:<40} {:>12} {}", dir.name, "", stamp);
    }
    for file in &listing.files {
        println!(
            "f  {:<40} {:>12} {} {}@{:#x}",
            file.row.name,
            file.row.logical_size,
            file.row.accessed.render(offset),
            render_signature(file.signature),
            file.vcn,
        );
    }
    if listing.dirs.is_empty() && listing.files.is_empty() {
        println!("(empty)");
    }
}

fn render_signature(signature: Option<[u8; 4]>) -> String {
    match signature {
        Some(sig) if sig.iter().all(|b| b.is_ascii_graphic()) => {
            String::from_utf8_lossy(&sig).into_owned()
        }
        Some(sig) => sig.iter().map(|b| format!("{b:02x}")).collect(),
        None => "????".into(),
    }
}
