//! CSV star sources
//!
//! Two schemas are understood: HYG-style exports (`ra` in hours or
//! `ra_deg`, `dec`, `mag`, `proper`) and Yale Bright Star exports (`RAdeg`
//! or `RAh`/`RAm`/`RAs`, `DEdeg` or `DE-`/`DEd`/`DEm`/`DEs`, `Vmag`).
//! Header names are matched case-insensitively against a list of aliases.
//!
//! Rows dimmer than the magnitude limit are dropped silently. Rows missing
//! a required field or failing validation are skipped and reported; they
//! never abort the run.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use log::{debug, info, warn};

use super::{validate_star_input, CatalogSource, StarInput};
use crate::constants::DEG_PER_HOUR;
use crate::errors::PackError;

/// Stars read from one CSV file
#[derive(Debug, Default)]
pub struct CsvStars {
    pub stars: Vec<StarInput>,
    /// Data rows seen, header excluded
    pub total_rows: usize,
    /// Rows dimmer than the magnitude limit
    pub filtered_rows: usize,
    /// One [`PackError::RowSkipped`] per rejected row
    pub skipped: Vec<PackError>,
}

/// One CSV row keyed by lowercased header
struct CsvRow {
    values: HashMap<String, String>,
}

impl CsvRow {
    fn new(headers: &[String], record: &csv::StringRecord) -> Self {
        let values = headers
            .iter()
            .zip(record.iter())
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(h, v)| (h.clone(), v.trim().to_string()))
            .collect();
        Self { values }
    }

    /// First non-blank value among `keys`
    fn value(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|k| self.values.get(&k.to_ascii_lowercase()))
            .map(String::as_str)
    }

    fn double(&self, keys: &[&str]) -> Option<f64> {
        self.value(keys).and_then(|v| v.parse().ok())
    }

    fn int(&self, keys: &[&str]) -> Option<i32> {
        self.value(keys).and_then(|v| v.parse().ok())
    }

    fn string(&self, keys: &[&str]) -> Option<String> {
        self.value(keys).map(str::to_string)
    }
}

/// RA in degrees from a HYG row; bare `ra` is in hours
fn hyg_ra(row: &CsvRow) -> Option<f64> {
    row.double(&["ra_deg"])
        .or_else(|| row.double(&["ra"]).map(|h| h * DEG_PER_HOUR))
}

fn hyg_dec(row: &CsvRow) -> Option<f64> {
    row.double(&["dec_deg", "dec"])
}

/// RA in degrees from a BSC row
///
/// Tries decimal degrees, then an hour/minute/second triple, then a bare
/// `RA` column that is taken as hours unless it exceeds 24.
fn bsc_ra(row: &CsvRow) -> Option<f64> {
    if let Some(deg) = row.double(&["RAdeg", "RA (deg)", "RA_deg"]) {
        return Some(deg);
    }
    if let Some(hours) = row.double(&["RAh", "RA (hours)", "RAhour"]) {
        let minutes = row.double(&["RAm", "RAmin"]).unwrap_or(0.0);
        let seconds = row.double(&["RAs", "RAsec"]).unwrap_or(0.0);
        return Some((hours + minutes / 60.0 + seconds / 3600.0) * DEG_PER_HOUR);
    }
    row.double(&["RA"])
        .map(|ra| if ra > 24.0 { ra } else { ra * DEG_PER_HOUR })
}

/// Dec in degrees from a BSC row
///
/// A separate sign column (`DE-`) applies to degree/minute/second triples,
/// which matters for stars between 0° and -1°.
fn bsc_dec(row: &CsvRow) -> Option<f64> {
    if let Some(deg) = row.double(&["DEdeg", "DE (deg)", "DE_deg", "decdeg", "Dec (deg)"]) {
        return Some(deg);
    }
    if let Some(deg) = row.double(&["DEd"]) {
        let minutes = row.double(&["DEm"]).unwrap_or(0.0);
        let seconds = row.double(&["DEs"]).unwrap_or(0.0);
        let magnitude = deg.abs() + minutes / 60.0 + seconds / 3600.0;
        let negative = deg.is_sign_negative()
            || matches!(row.value(&["DE-", "DecSign"]), Some("-") | Some("-1"));
        return Some(if negative { -magnitude } else { magnitude });
    }
    row.double(&["Dec", "decl"])
}

fn parse_row(row: &CsvRow, source: CatalogSource, mag_limit: f64) -> Result<Option<StarInput>, String> {
    let (mag, ra, dec) = match source {
        CatalogSource::Hyg => (row.double(&["mag", "vmag"]), hyg_ra(row), hyg_dec(row)),
        CatalogSource::Bsc => (
            row.double(&["Vmag", "Vmag (Johnson)", "mag"]),
            bsc_ra(row),
            bsc_dec(row),
        ),
    };

    let mag = mag.ok_or("missing magnitude")?;
    if mag > mag_limit {
        return Ok(None);
    }
    let ra = ra.ok_or("missing right ascension")?;
    let dec = dec.ok_or("missing declination")?;
    let ra = validate_star_input(ra, dec, mag)?;

    let star = StarInput {
        source: Some(source),
        ra_deg: ra,
        dec_deg: dec,
        mag,
        hip: row.int(&["hip"]).unwrap_or(StarInput::NO_HIP),
        name: row.string(&["proper", "Name", "ProperName"]),
        bayer: row.string(&["bayer"]),
        flamsteed: row.string(&["flamsteed", "flam"]),
        constellation: row.string(&["con", "Constellation"]),
        designation: None,
    };
    Ok(Some(star))
}

/// Reads stars from CSV text
///
/// Never fails on content: a missing header or unreadable rows only
/// shrink the result.
pub fn read_stars<R: Read>(reader: R, source: CatalogSource, mag_limit: f64) -> CsvStars {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut result = CsvStars::default();
    let headers: Vec<String> = match csv_reader.headers() {
        Ok(headers) => headers.iter().map(|h| h.trim().to_ascii_lowercase()).collect(),
        Err(err) => {
            warn!("[{}] Unreadable CSV header, no stars read: {}", source, err);
            return result;
        }
    };
    debug!("[{}] CSV columns: {:?}", source, headers);

    for (i, record) in csv_reader.records().enumerate() {
        let row_number = i + 1;
        result.total_rows += 1;

        let parsed = record
            .map_err(|e| e.to_string())
            .and_then(|record| parse_row(&CsvRow::new(&headers, &record), source, mag_limit));
        match parsed {
            Ok(Some(star)) => result.stars.push(star),
            Ok(None) => result.filtered_rows += 1,
            Err(reason) => {
                warn!("[{}] Skipping row {}: {}", source, row_number, reason);
                result.skipped.push(PackError::RowSkipped {
                    row: row_number,
                    reason,
                });
            }
        }
    }

    if !result.skipped.is_empty() {
        info!(
            "[{}] Skipped {} / {} rows due to validation failures",
            source,
            result.skipped.len(),
            result.total_rows
        );
    }
    result
}

/// Reads stars from a CSV file, gunzipping `.gz` input
pub fn read_stars_from_path(
    path: &Path,
    source: CatalogSource,
    mag_limit: f64,
) -> Result<CsvStars, PackError> {
    let file = BufReader::new(File::open(path)?);
    let gzipped = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("gz"));

    let stars = if gzipped {
        read_stars(GzDecoder::new(file), source, mag_limit)
    } else {
        read_stars(file, source, mag_limit)
    };
    info!(
        "Read {} stars from {} ({} rows, {} dimmer than {}, {} skipped)",
        stars.stars.len(),
        path.display(),
        stars.total_rows,
        stars.filtered_rows,
        mag_limit,
        stars.skipped.len()
    );
    Ok(stars)
}
