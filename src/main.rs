mod clipboard;
mod convert;
mod converter;
mod formats;
mod observable;
mod prefs;
mod timezone;
mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "timestamp-converter",
    version,
    about = "Convert one instant across time zones"
)]
struct Cli {
    /// Preferences file location.
    #[arg(long, default_value = "preferences.json")]
    prefs: PathBuf,

    /// One-shot conversion: render TEXT in every catalog zone and exit.
    #[arg(long, value_name = "TEXT")]
    convert: Option<String>,

    /// Print the zone catalog and exit.
    #[arg(long)]
    list_timezones: bool,
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.list_timezones {
        run_list();
        return Ok(());
    }
    if let Some(text) = cli.convert.as_deref() {
        return run_convert(text);
    }

    ui::app::run_gui(cli.prefs)
}

fn run_convert(text: &str) -> Result<()> {
    let instant =
        convert::parse_checked(text).context("unable to interpret input as a timestamp")?;
    let format = formats::format_or_default(formats::DEFAULT_FORMAT_ID);
    for zone in timezone::zones() {
        println!(
            "{:<34} {}",
            zone.label,
            convert::format_in_zone(instant, zone, format)
        );
    }
    Ok(())
}

fn run_list() {
    for zone in timezone::zones() {
        println!("{:>3}  {}", zone.id, zone.label);
    }
}
