//! Offline catalog packer
//!
//! Builds the binary files the runtime loads:
//!
//!   cargo run --bin catalog_packer -- stars --source hyg --input hyg.csv.gz \
//!       --out catalog/stars_v1.bin --meta catalog/stars_v1.json
//!   cargo run --bin catalog_packer -- const --input bound_edges.txt \
//!       --out catalog/const_v1.bin

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use pointtosky::packer::{
    pack, pack_boundaries, parse_iau_ascii, CatalogSource, PackRequest, DEFAULT_MAG_LIMIT,
    DEFAULT_RDP_EPSILON,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Packs star CSVs and constellation boundaries into PointToSky binary catalogs",
    long_about = None
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pack a HYG or BSC CSV export into a PTSKSTAR catalog
    Stars {
        /// CSV schema of the input: hyg or bsc
        #[arg(short, long)]
        source: CatalogSource,

        /// Input CSV, optionally gzip-compressed (.gz)
        #[arg(short, long)]
        input: PathBuf,

        /// Output binary catalog
        #[arg(short, long)]
        out: PathBuf,

        /// JSON metadata output (defaults to the output path with .json)
        #[arg(long)]
        meta: Option<PathBuf>,

        /// Faintest magnitude kept
        #[arg(long, default_value_t = DEFAULT_MAG_LIMIT)]
        mag_limit: f64,

        /// Recorded in the metadata alongside the boundary tolerance
        #[arg(long, default_value_t = DEFAULT_RDP_EPSILON)]
        rdp_epsilon: f64,

        /// Leave every constellation index unset
        #[arg(long)]
        no_con_codes: bool,
    },

    /// Pack an IAU ASCII boundary edge list into a PTSK/CONS file
    Const {
        /// Edge list, one `CODE ra1 dec1 ra2 dec2` per line
        #[arg(short, long)]
        input: PathBuf,

        /// Output boundary file
        #[arg(short, long)]
        out: PathBuf,

        /// JSON summary output (defaults to the output path with .json)
        #[arg(long)]
        meta: Option<PathBuf>,

        /// Ramer-Douglas-Peucker tolerance in degrees
        #[arg(long, default_value_t = DEFAULT_RDP_EPSILON)]
        rdp_epsilon: f64,
    },
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}

fn meta_path(out: &Path, meta: Option<PathBuf>) -> PathBuf {
    meta.unwrap_or_else(|| out.with_extension("json"))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match args.command {
        Command::Stars {
            source,
            input,
            out,
            meta,
            mag_limit,
            rdp_epsilon,
            no_con_codes,
        } => {
            let request = PackRequest::new(source, input)
                .with_mag_limit(mag_limit)
                .with_rdp_epsilon(rdp_epsilon)
                .with_con_codes(!no_con_codes);
            let result = pack(&request).context("packing star catalog")?;

            write_output(&out, &result.bytes)?;
            let meta_out = meta_path(&out, meta);
            write_output(&meta_out, result.meta.to_json()?.as_bytes())?;
            info!("Wrote {} and {}", out.display(), meta_out.display());
            println!("{}", result.meta.to_json()?);
        }
        Command::Const {
            input,
            out,
            meta,
            rdp_epsilon,
        } => {
            let file = File::open(&input)
                .with_context(|| format!("opening {}", input.display()))?;
            let parsed = parse_iau_ascii(BufReader::new(file))?;
            let packed = pack_boundaries(&parsed, rdp_epsilon)?;

            write_output(&out, &packed.bytes)?;
            let summary = serde_json::to_string_pretty(&packed.summary)?;
            let meta_out = meta_path(&out, meta);
            write_output(&meta_out, summary.as_bytes())?;
            info!("Wrote {} and {}", out.display(), meta_out.display());
            println!("{}", summary);
        }
    }
    Ok(())
}
