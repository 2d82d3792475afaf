//! Catalog diagnostics tool
//!
//! Loads the packed catalogs from a data directory the same way a device
//! would, then reports how the load went and runs the built-in self-test.
//!
//! Usage:
//!   cargo run --bin catalog_stats -- [--data-dir DIR] [--ra 101.3 --dec -16.7] [--identify]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::{ArgAction, Parser};
use log::warn;

use pointtosky::catalogs::repository::DEFAULT_PROBE_RESULTS;
use pointtosky::catalogs::{CatalogConfig, CatalogRepository};
use pointtosky::Equatorial;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Loads PointToSky catalogs, prints diagnostics and runs the self-test",
    long_about = None
)]
struct Args {
    /// Directory holding catalog/stars_v1.bin and catalog/const_v1.bin
    /// (defaults to $POINTTOSKY_DATA_DIR or ~/.cache/pointtosky)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Star catalog path relative to the data directory
    #[arg(long)]
    stars: Option<String>,

    /// Boundary file path relative to the data directory
    #[arg(long)]
    boundaries: Option<String>,

    /// Right ascension of a point to probe, degrees
    #[arg(long, requires = "dec", allow_hyphen_values = true)]
    ra: Option<f64>,

    /// Declination of a point to probe, degrees
    #[arg(long, requires = "ra", allow_hyphen_values = true)]
    dec: Option<f64>,

    /// Probe radius in degrees
    #[arg(short, long, default_value_t = 2.0)]
    radius: f64,

    /// Faintest magnitude reported by the probe
    #[arg(short, long)]
    mag_limit: Option<f64>,

    /// Maximum number of probe results
    #[arg(long, default_value_t = DEFAULT_PROBE_RESULTS)]
    max_results: usize,

    /// Also run the identify solver at the probe point
    #[arg(short, long, action = ArgAction::SetTrue)]
    identify: bool,

    /// Exit with failure when a fallback was used or a self-test check failed
    #[arg(long, action = ArgAction::SetTrue)]
    strict: bool,
}

fn print_section_header(title: &str) {
    println!("\n{}:", title);
    println!("-------------------------------------------------------");
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = CatalogConfig::new();
    if let Some(dir) = &args.data_dir {
        config = config.with_data_dir(dir);
    }
    if let Some(path) = &args.stars {
        config = config.with_star_path(path);
    }
    if let Some(path) = &args.boundaries {
        config = config.with_boundaries_path(path);
    }
    if !config.data_dir().is_dir() {
        warn!(
            "Data directory {} does not exist; fallbacks will be used",
            config.data_dir().display()
        );
    }

    let repository = CatalogRepository::from_config(&config);
    let diagnostics = repository.diagnostics();

    print_section_header("Diagnostics");
    println!("{}", serde_json::to_string_pretty(diagnostics)?);

    print_section_header("Self-test");
    let results = repository.run_self_test();
    for result in &results {
        let mark = if result.passed { "PASS" } else { "FAIL" };
        println!("[{}] {}: {}", mark, result.name, result.detail);
    }
    let all_passed = results.iter().all(|r| r.passed);

    if let (Some(ra), Some(dec)) = (args.ra, args.dec) {
        if !(-90.0..=90.0).contains(&dec) {
            bail!("--dec must be within [-90, 90], got {}", dec);
        }
        let center = Equatorial::new(ra, dec);

        print_section_header(&format!(
            "Probe RA {:.3} Dec {:.3} radius {}",
            center.ra_deg, center.dec_deg, args.radius
        ));
        let hits = repository.probe(&center, args.radius, args.mag_limit, args.max_results);
        if hits.is_empty() {
            println!("No stars found");
        }
        for hit in &hits {
            println!(
                "{:>8} {:<16} {:<14} mag {:>5.2} sep {:>6.3}° {}",
                hit.id,
                hit.name.as_deref().unwrap_or("-"),
                hit.designation.as_deref().unwrap_or("-"),
                hit.magnitude,
                hit.separation_deg,
                hit.constellation.as_deref().unwrap_or("")
            );
        }

        if args.identify {
            print_section_header("Identify");
            println!("{}", serde_json::to_string_pretty(&repository.identify(&center))?);
        }
    }

    let healthy = diagnostics.catalog_ok() && diagnostics.boundaries_ok() && all_passed;
    if args.strict && !healthy {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
