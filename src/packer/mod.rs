//! Offline catalog packer
//!
//! Turns CSV star lists into `PTSKSTAR` catalogs and IAU boundary edge
//! lists into `PTSK`/`CONS` boundary files. Everything here runs at build
//! time on a workstation; the device only ever reads the output.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use log::{debug, info};
use serde::Serialize;

use crate::catalogs::binary_catalog::{
    StarRecord, FLAG_HAS_DESIGNATION, FLAG_HAS_HIP, FLAG_HAS_NAME, FLAG_SOURCE_BSC,
    FLAG_SOURCE_HYG, STAR_RECORD_SIZE,
};
use crate::catalogs::constellation_index;
use crate::catalogs::header::{payload_crc32, StarCatalogHeader};
use crate::coordinates::angle::wrap_0_360;
use crate::errors::{CatalogError, PackError};

pub mod band_index;
pub mod boundaries;
pub mod csv_source;
pub mod string_pool;

pub use band_index::{BandIndex, IndexSummary};
pub use boundaries::{pack_boundaries, parse_iau_ascii, BoundaryPack, BoundarySummary};
pub use csv_source::{read_stars, read_stars_from_path, CsvStars};
pub use string_pool::StringPoolBuilder;

/// Default magnitude limit of the packer CLI
pub const DEFAULT_MAG_LIMIT: f64 = 6.5;
/// Default RDP tolerance in degrees
pub const DEFAULT_RDP_EPSILON: f64 = 0.05;

pub const RA_MIN_DEG: f64 = 0.0;
pub const RA_MAX_DEG: f64 = 360.0;
pub const DEC_MIN_DEG: f64 = -90.0;
pub const DEC_MAX_DEG: f64 = 90.0;
/// Brightest magnitude accepted; Sirius is -1.46
pub const MAG_MIN: f64 = -2.0;
pub const MAG_MAX: f64 = 15.0;

/// CSV schema of the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CatalogSource {
    /// Yale Bright Star Catalogue export
    Bsc,
    /// HYG database export
    Hyg,
}

impl CatalogSource {
    fn flag(self) -> i16 {
        match self {
            CatalogSource::Bsc => FLAG_SOURCE_BSC,
            CatalogSource::Hyg => FLAG_SOURCE_HYG,
        }
    }
}

impl FromStr for CatalogSource {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bsc" | "bscv5" => Ok(CatalogSource::Bsc),
            "hyg" => Ok(CatalogSource::Hyg),
            other => Err(PackError::UnsupportedSource(other.to_string())),
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::Bsc => f.write_str("BSC"),
            CatalogSource::Hyg => f.write_str("HYG"),
        }
    }
}

/// Checks one star and returns its RA wrapped into `[0, 360)`
///
/// RA may be exactly 360 (it wraps to 0); anything else outside
/// `[0, 360]` is rejected rather than silently wrapped.
pub fn validate_star_input(ra_deg: f64, dec_deg: f64, mag: f64) -> Result<f64, String> {
    if !ra_deg.is_finite() {
        return Err(format!("RA is not finite: {}", ra_deg));
    }
    if !dec_deg.is_finite() {
        return Err(format!("Dec is not finite: {}", dec_deg));
    }
    if !mag.is_finite() {
        return Err(format!("Magnitude is not finite: {}", mag));
    }
    if !(RA_MIN_DEG..=RA_MAX_DEG).contains(&ra_deg) {
        return Err(format!("RA out of range [0, 360]: {}", ra_deg));
    }
    if !(DEC_MIN_DEG..=DEC_MAX_DEG).contains(&dec_deg) {
        return Err(format!("Dec out of range [-90, 90]: {}", dec_deg));
    }
    if !(MAG_MIN..=MAG_MAX).contains(&mag) {
        return Err(format!("Magnitude out of range [{}, {}]: {}", MAG_MIN, MAG_MAX, mag));
    }
    // In-range values pass through untouched; only the closing 360 folds to 0
    Ok(if ra_deg == RA_MAX_DEG { 0.0 } else { ra_deg })
}

/// One star ready to be packed
#[derive(Debug, Clone, PartialEq)]
pub struct StarInput {
    pub source: Option<CatalogSource>,
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub mag: f64,
    /// Hipparcos number, [`Self::NO_HIP`] when unknown
    pub hip: i32,
    pub name: Option<String>,
    pub bayer: Option<String>,
    pub flamsteed: Option<String>,
    pub constellation: Option<String>,
    /// Full designation stored as-is instead of joining Bayer, Flamsteed
    /// and constellation
    pub designation: Option<String>,
}

impl StarInput {
    pub const NO_HIP: i32 = -1;

    pub fn new(ra_deg: f64, dec_deg: f64, mag: f64) -> Self {
        Self {
            source: None,
            ra_deg,
            dec_deg,
            mag,
            hip: Self::NO_HIP,
            name: None,
            bayer: None,
            flamsteed: None,
            constellation: None,
            designation: None,
        }
    }

    pub fn with_source(mut self, source: CatalogSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_hip(mut self, hip: i32) -> Self {
        self.hip = hip;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_bayer(mut self, bayer: &str) -> Self {
        self.bayer = Some(bayer.to_string());
        self
    }

    pub fn with_flamsteed(mut self, flamsteed: &str) -> Self {
        self.flamsteed = Some(flamsteed.to_string());
        self
    }

    pub fn with_constellation(mut self, code: &str) -> Self {
        self.constellation = Some(code.to_string());
        self
    }

    pub fn with_designation(mut self, designation: &str) -> Self {
        self.designation = Some(designation.to_string());
        self
    }

    /// Designation as written to the string pool
    ///
    /// Bayer, Flamsteed and constellation joined by spaces, e.g.
    /// `"Alp 9 CMa"`; absent when there is neither Bayer nor Flamsteed.
    pub fn packed_designation(&self) -> Option<String> {
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        if let Some(designation) = non_blank(&self.designation) {
            return Some(designation);
        }
        let mut parts: Vec<String> = [&self.bayer, &self.flamsteed]
            .into_iter()
            .filter_map(non_blank)
            .collect();
        if parts.is_empty() {
            return None;
        }
        parts.extend(non_blank(&self.constellation));
        Some(parts.join(" "))
    }

    fn flags(&self, designation: Option<&str>) -> i16 {
        let mut flags = 0;
        if self.name.as_deref().is_some_and(|n| !n.trim().is_empty()) {
            flags |= FLAG_HAS_NAME;
        }
        if designation.is_some() {
            flags |= FLAG_HAS_DESIGNATION;
        }
        if self.hip > 0 {
            flags |= FLAG_HAS_HIP;
        }
        if let Some(source) = self.source {
            flags |= source.flag();
        }
        flags
    }
}

/// A complete `PTSKSTAR` file plus the numbers that describe it
#[derive(Debug, Clone)]
pub struct EncodedCatalog {
    pub bytes: Vec<u8>,
    pub star_count: u32,
    pub string_pool_size: u32,
    pub index_offset: u32,
    pub index_size: u32,
    pub crc32: u32,
    pub band_count: usize,
    pub index_entries: usize,
    pub summary: IndexSummary,
}

fn section_size(name: &str, len: usize) -> Result<u32, PackError> {
    u32::try_from(len).map_err(|_| {
        PackError::Catalog(CatalogError::InvalidLayout(format!(
            "{} section of {} bytes does not fit the header",
            name, len
        )))
    })
}

/// Encodes `stars` in the given order
///
/// With `with_con_codes` false every record gets constellation index -1.
pub fn encode_star_catalog(
    stars: &[StarInput],
    with_con_codes: bool,
) -> Result<EncodedCatalog, PackError> {
    let mut pool = StringPoolBuilder::new();
    let mut records = Vec::with_capacity(stars.len() * STAR_RECORD_SIZE);

    for star in stars {
        let designation = star.packed_designation();
        let con_index = if with_con_codes {
            star.constellation
                .as_deref()
                .and_then(constellation_index)
                .unwrap_or(-1)
        } else {
            -1
        };
        let record = StarRecord {
            ra_deg: wrap_0_360(star.ra_deg) as f32,
            dec_deg: star.dec_deg as f32,
            mag: star.mag as f32,
            bv: 0.0,
            hip: star.hip,
            name_offset: pool.offset_or_zero(star.name.as_deref()),
            designation_offset: pool.offset_or_zero(designation.as_deref()),
            flags: star.flags(designation.as_deref()),
            con_index,
        };
        record.write(&mut records)?;
    }

    let index = BandIndex::build(stars);
    let pool_bytes = pool.into_bytes();
    let mut payload = Vec::with_capacity(pool_bytes.len() + records.len());
    payload.extend_from_slice(&pool_bytes);
    payload.extend_from_slice(&records);
    let index_offset = section_size("index offset", payload.len())?;
    index.write(&mut payload)?;
    let index_size = section_size("index", payload.len() - index_offset as usize)?;

    let header = StarCatalogHeader {
        version: StarCatalogHeader::VERSION,
        reserved: 0,
        star_count: section_size("star", stars.len())?,
        string_pool_size: section_size("string pool", pool_bytes.len())?,
        index_offset,
        index_size,
        payload_crc32: payload_crc32(&payload),
    };
    debug!(
        "Encoded {} stars: pool {} bytes, index {}+{} bytes",
        header.star_count, header.string_pool_size, index_offset, index_size
    );

    let mut bytes = Vec::with_capacity(StarCatalogHeader::SIZE + payload.len());
    header.write(&mut bytes)?;
    bytes.extend_from_slice(&payload);

    Ok(EncodedCatalog {
        bytes,
        star_count: header.star_count,
        string_pool_size: header.string_pool_size,
        index_offset,
        index_size,
        crc32: header.payload_crc32,
        band_count: index.band_count(),
        index_entries: index.entry_count(),
        summary: *index.summary(),
    })
}

/// Inputs of one packer run
#[derive(Debug, Clone, PartialEq)]
pub struct PackRequest {
    pub source: CatalogSource,
    pub input: PathBuf,
    pub mag_limit: f64,
    pub rdp_epsilon: f64,
    pub with_con_codes: bool,
}

impl PackRequest {
    pub fn new<P: Into<PathBuf>>(source: CatalogSource, input: P) -> Self {
        Self {
            source,
            input: input.into(),
            mag_limit: DEFAULT_MAG_LIMIT,
            rdp_epsilon: DEFAULT_RDP_EPSILON,
            with_con_codes: true,
        }
    }

    pub fn with_mag_limit(mut self, mag_limit: f64) -> Self {
        self.mag_limit = mag_limit;
        self
    }

    pub fn with_rdp_epsilon(mut self, rdp_epsilon: f64) -> Self {
        self.rdp_epsilon = rdp_epsilon;
        self
    }

    pub fn with_con_codes(mut self, with_con_codes: bool) -> Self {
        self.with_con_codes = with_con_codes;
        self
    }

    fn validate(&self) -> Result<(), PackError> {
        if !self.mag_limit.is_finite() {
            return Err(PackError::InvalidRange {
                name: "mag_limit",
                value: self.mag_limit,
            });
        }
        if !self.rdp_epsilon.is_finite() || self.rdp_epsilon < 0.0 {
            return Err(PackError::InvalidRange {
                name: "rdp_epsilon",
                value: self.rdp_epsilon,
            });
        }
        Ok(())
    }
}

/// JSON summary written next to a packed catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMeta {
    pub source: CatalogSource,
    pub input: String,
    pub mag_limit: f64,
    pub star_count: u32,
    pub total_rows: usize,
    pub skipped_rows: usize,
    pub string_pool_size: u32,
    pub index_offset: u32,
    pub index_size: u32,
    pub crc32: u32,
    pub band_count: usize,
    pub index_entries: usize,
    pub rdp_epsilon: f64,
    pub summary: IndexSummary,
}

impl CatalogMeta {
    pub fn to_json(&self) -> Result<String, PackError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Output of [`pack`]
#[derive(Debug, Clone)]
pub struct PackResult {
    pub bytes: Vec<u8>,
    pub meta: CatalogMeta,
}

/// Reads the request's CSV and packs it
///
/// An input without usable rows still produces a valid zero-star catalog.
pub fn pack(request: &PackRequest) -> Result<PackResult, PackError> {
    request.validate()?;
    let parsed = read_stars_from_path(&request.input, request.source, request.mag_limit)?;
    let encoded = encode_star_catalog(&parsed.stars, request.with_con_codes)?;

    let meta = CatalogMeta {
        source: request.source,
        input: request.input.display().to_string(),
        mag_limit: request.mag_limit,
        star_count: encoded.star_count,
        total_rows: parsed.total_rows,
        skipped_rows: parsed.skipped.len(),
        string_pool_size: encoded.string_pool_size,
        index_offset: encoded.index_offset,
        index_size: encoded.index_size,
        crc32: encoded.crc32,
        band_count: encoded.band_count,
        index_entries: encoded.index_entries,
        rdp_epsilon: request.rdp_epsilon,
        summary: encoded.summary,
    };
    info!(
        "Packed {} {} stars (mag <= {}) into {} bytes, crc=0x{:08X}",
        meta.star_count,
        meta.source,
        meta.mag_limit,
        encoded.bytes.len(),
        meta.crc32
    );

    Ok(PackResult {
        bytes: encoded.bytes,
        meta,
    })
}
