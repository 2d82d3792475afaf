//! Ephemeris table generator
//!
//! Prints low-order positions as CSV:
//!
//!   cargo run --bin ephem_cli -- --instant 2025-01-01T00:00:00Z --body moon \
//!       --step-hours 6 --count 4

use std::io;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use clap::Parser;

use pointtosky::ephemeris::{Body, EphemerisComputer, SimpleEphemerisComputer};
use pointtosky::time::parse_instant;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Prints Sun, Moon, Jupiter or Saturn positions as CSV",
    long_about = None
)]
struct Args {
    /// First instant, ISO-8601 (e.g. 2025-01-01T00:00:00Z)
    #[arg(long)]
    instant: String,

    /// SUN, MOON, JUPITER or SATURN
    #[arg(long)]
    body: Body,

    /// Hours between rows
    #[arg(long, default_value_t = 1.0)]
    step_hours: f64,

    /// Number of rows
    #[arg(long, default_value_t = 1)]
    count: u32,
}

fn format_value(value: Option<f64>) -> String {
    value.map(|v| format!("{:.6}", v)).unwrap_or_default()
}

fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if !(args.step_hours.is_finite() && args.step_hours > 0.0) {
        bail!("--step-hours must be a positive number");
    }
    if args.count == 0 {
        bail!("--count must be a positive integer");
    }
    let start = parse_instant(&args.instant).context("parsing --instant")?;
    let step = Duration::nanoseconds((args.step_hours * 3_600_000_000_000.0).round() as i64);

    let computer = SimpleEphemerisComputer::new();
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["instant", "body", "raDeg", "decDeg", "distanceAu", "phase"])?;

    let mut instant = start;
    for _ in 0..args.count {
        let eph = computer.compute(args.body, &instant);
        writer.write_record([
            format_instant(&instant),
            args.body.to_string(),
            format!("{:.6}", eph.eq.ra_deg),
            format!("{:.6}", eph.eq.dec_deg),
            format_value(eph.distance_au),
            format_value(eph.phase),
        ])?;
        instant = instant + step;
    }
    writer.flush()?;
    Ok(())
}
