//! `filetime-decode` — decode a hexadecimal Windows FILETIME value.

use clap::Parser;
use relic_app::{init_logging, parse_cli};
use relic_core::filetime::{utc_offset_hours, Filetime};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "filetime-decode")]
#[command(version, about = "Decode a hexadecimal FILETIME value")]
struct Cli {
    /// FILETIME as hexadecimal 100 ns ticks, e.g. 01d9a07c80000000
    hex: String,

    /// Display offset for the timestamp, in whole hours from UTC
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

    // A value that does not parse is a malformed argument, not an image
    // parse failure.
    let filetime = match Filetime::from_hex(&cli.hex) {
        Ok(ft) => ft,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(1);
        }
    };
    let offset = match utc_offset_hours(cli.utc_offset) {
        Ok(offset) => offset,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(1);
        }
    };

    println!("{}", filetime.render(offset));
    ExitCode::SUCCESS
}
