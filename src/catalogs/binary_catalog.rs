//! `PTSKSTAR` binary star catalog
//!
//! Layout after the 32-byte [`StarCatalogHeader`]:
//!
//! ```text
//! string pool   stringPoolSize bytes, offset 0 is a NUL
//! records       starCount × 32 bytes (see StarRecord)
//! index         at indexOffset, indexSize bytes:
//!                 180 × (bandId i16, start i32, count i32)
//!                 total × star index u32, grouped by band
//!                 total × RA f32, sorted within each band
//!                 8 × f32 summary (ignored on load)
//! ```
//!
//! Band `b` holds the stars with `floor(dec) == b` for `b` in `-90..=89`
//! (dec 90 falls in band 89). A radius query only visits the bands its cap
//! overlaps and binary-searches the RA window inside each band.
//!
//! The catalog is immutable once loaded and can be shared freely between
//! threads.

use std::cmp::Ordering;
use std::io::{self, Cursor, Read, Write};
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{error, info, warn};
use serde::Serialize;

use super::asset::AssetProvider;
use super::header::{payload_crc32, StarCatalogHeader};
use super::string_pool::StringPool;
use super::{
    constellation_code, split_designation, LoadStage, LoadStatus, Loaded, Star, StarCatalog,
};
use crate::coordinates::angle::{deg_to_rad, rad_to_deg, wrap_0_360};
use crate::coordinates::Equatorial;
use crate::errors::CatalogError;

/// Default asset path of the star catalog
pub const DEFAULT_PATH: &str = "catalog/stars_v1.bin";
/// Size of one packed star record
pub const STAR_RECORD_SIZE: usize = 32;
/// Number of one-degree declination bands
pub const BAND_COUNT: usize = 180;
pub const MIN_BAND_ID: i32 = -90;
pub const MAX_BAND_ID: i32 = 89;
/// Size of one band entry in the index: i16 + i32 + i32
pub const BAND_ENTRY_SIZE: usize = 10;
/// Trailing summary floats appended to the index
pub const INDEX_SUMMARY_FLOATS: usize = 8;

pub const FLAG_HAS_NAME: i16 = 0x0001;
pub const FLAG_HAS_DESIGNATION: i16 = 0x0002;
pub const FLAG_HAS_HIP: i16 = 0x0004;
pub const FLAG_SOURCE_BSC: i16 = 0x0100;
pub const FLAG_SOURCE_HYG: i16 = 0x0200;

/// Slack on the RA window so f32 rounding never drops a star at its edge
const RA_MARGIN_DEG: f64 = 1e-4;

/// Declination band holding `dec_deg`
pub fn band_id(dec_deg: f64) -> i32 {
    (dec_deg.floor() as i32).clamp(MIN_BAND_ID, MAX_BAND_ID)
}

/// One packed star, 32 bytes on disk
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StarRecord {
    pub ra_deg: f32,
    pub dec_deg: f32,
    pub mag: f32,
    /// B−V colour index, 0 when unknown
    pub bv: f32,
    pub hip: i32,
    pub name_offset: i32,
    pub designation_offset: i32,
    pub flags: i16,
    /// Index into [`super::CONSTELLATION_CODES`], -1 when unknown
    pub con_index: i16,
}

impl StarRecord {
    pub fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Self {
            ra_deg: reader.read_f32::<LittleEndian>()?,
            dec_deg: reader.read_f32::<LittleEndian>()?,
            mag: reader.read_f32::<LittleEndian>()?,
            bv: reader.read_f32::<LittleEndian>()?,
            hip: reader.read_i32::<LittleEndian>()?,
            name_offset: reader.read_i32::<LittleEndian>()?,
            designation_offset: reader.read_i32::<LittleEndian>()?,
            flags: reader.read_i16::<LittleEndian>()?,
            con_index: reader.read_i16::<LittleEndian>()?,
        })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_f32::<LittleEndian>(self.ra_deg)?;
        writer.write_f32::<LittleEndian>(self.dec_deg)?;
        writer.write_f32::<LittleEndian>(self.mag)?;
        writer.write_f32::<LittleEndian>(self.bv)?;
        writer.write_i32::<LittleEndian>(self.hip)?;
        writer.write_i32::<LittleEndian>(self.name_offset)?;
        writer.write_i32::<LittleEndian>(self.designation_offset)?;
        writer.write_i16::<LittleEndian>(self.flags)?;
        writer.write_i16::<LittleEndian>(self.con_index)?;
        Ok(())
    }
}

/// Facts about a loaded star catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StarCatalogMetadata {
    pub size_bytes: usize,
    pub star_count: u32,
    pub string_pool_bytes: u32,
    pub index_offset_bytes: u32,
    pub index_size_bytes: u32,
    pub payload_crc32: u32,
    pub band_entry_count: usize,
}

/// RA interval to scan inside a band
#[derive(Debug, Clone, Copy, PartialEq)]
enum RaWindow {
    All,
    Range(f32, f32),
}

/// Loaded `PTSKSTAR` catalog
#[derive(Debug, Clone)]
pub struct BinaryStarCatalog {
    records: Vec<StarRecord>,
    ra_rad: Vec<f64>,
    dec_rad: Vec<f64>,
    pool: StringPool,
    band_starts: Vec<usize>,
    band_counts: Vec<usize>,
    star_ids_by_band: Vec<u32>,
    ra_by_band: Vec<f32>,
    metadata: StarCatalogMetadata,
}

fn layout(msg: String) -> CatalogError {
    CatalogError::InvalidLayout(msg)
}

impl BinaryStarCatalog {
    /// Decodes and validates a complete catalog file
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CatalogError> {
        let mut stage = LoadStage::Unopened;
        Self::decode(bytes, &mut stage)
    }

    /// Reads `path` from `provider` and decodes it
    pub fn load(provider: &dyn AssetProvider, path: &str) -> Result<Self, CatalogError> {
        let mut stage = LoadStage::Unopened;
        Self::try_load(provider, path, &mut stage)
    }

    /// Loads `path`, or hands back `fallback` with the reason it was rejected
    ///
    /// Never fails: every error is logged once and reported in the status.
    pub fn load_or_fallback(
        provider: &dyn AssetProvider,
        path: &str,
        fallback: Arc<dyn StarCatalog>,
    ) -> Loaded<Arc<dyn StarCatalog>, StarCatalogMetadata> {
        let mut stage = LoadStage::Unopened;
        match Self::try_load(provider, path, &mut stage) {
            Ok(catalog) => {
                let metadata = catalog.metadata.clone();
                Loaded {
                    catalog: Arc::new(catalog),
                    status: LoadStatus::Real(metadata),
                }
            }
            Err(err) => {
                error!(
                    "Star catalog {} rejected after stage {:?}, using fallback: {}",
                    path, stage, err
                );
                Loaded {
                    catalog: fallback,
                    status: LoadStatus::Fallback {
                        stage,
                        reason: err.to_string(),
                    },
                }
            }
        }
    }

    fn try_load(
        provider: &dyn AssetProvider,
        path: &str,
        stage: &mut LoadStage,
    ) -> Result<Self, CatalogError> {
        let bytes = provider.read_all(path).map_err(|source| CatalogError::Open {
            path: path.to_string(),
            source,
        })?;
        let catalog = Self::decode(&bytes, stage)?;
        let meta = &catalog.metadata;
        info!(
            "Loaded star catalog {}: {} bytes, {} stars, crc=0x{:08X}, {} band entries",
            path, meta.size_bytes, meta.star_count, meta.payload_crc32, meta.band_entry_count
        );
        Ok(catalog)
    }

    fn decode(bytes: &[u8], stage: &mut LoadStage) -> Result<Self, CatalogError> {
        let header = StarCatalogHeader::read(bytes)?;
        if header.version != StarCatalogHeader::VERSION {
            return Err(CatalogError::UnsupportedVersion(header.version as u32));
        }
        *stage = LoadStage::HeaderValidated;

        let header_size = StarCatalogHeader::SIZE;
        let count = header.star_count as usize;
        let pool_end = header.string_pool_size as usize;
        let records_end = pool_end as u64 + count as u64 * STAR_RECORD_SIZE as u64;
        let index_start = header.index_offset as usize;
        let index_end = header.index_offset as u64 + header.index_size as u64;
        let needed = header_size as u64 + records_end.max(index_end);
        if (bytes.len() as u64) < needed {
            return Err(CatalogError::Truncated {
                needed: needed as usize,
                actual: bytes.len(),
            });
        }

        let payload = &bytes[header_size..];
        let actual = payload_crc32(payload);
        if actual != header.payload_crc32 {
            return Err(CatalogError::CrcMismatch {
                expected: header.payload_crc32,
                actual,
            });
        }
        *stage = LoadStage::PayloadValidated;

        if index_start < pool_end || index_start - pool_end != count * STAR_RECORD_SIZE {
            return Err(layout(format!(
                "star records size mismatch: expected {}, actual {}",
                count * STAR_RECORD_SIZE,
                index_start as i64 - pool_end as i64
            )));
        }

        let pool = StringPool::new(payload[..pool_end].to_vec());

        let mut reader = Cursor::new(&payload[pool_end..index_start]);
        let mut records = Vec::with_capacity(count);
        for _ in 0..count {
            let mut record = StarRecord::read(&mut reader)?;
            record.ra_deg = wrap_0_360(record.ra_deg as f64) as f32;
            records.push(record);
        }
        let ra_rad = records.iter().map(|r| deg_to_rad(r.ra_deg as f64)).collect();
        let dec_rad = records.iter().map(|r| deg_to_rad(r.dec_deg as f64)).collect();

        let index = &payload[index_start..index_end as usize];
        let (band_starts, band_counts, star_ids_by_band, ra_by_band) =
            Self::decode_index(index, count)?;
        *stage = LoadStage::Ready;

        let metadata = StarCatalogMetadata {
            size_bytes: bytes.len(),
            star_count: header.star_count,
            string_pool_bytes: header.string_pool_size,
            index_offset_bytes: header.index_offset,
            index_size_bytes: header.index_size,
            payload_crc32: header.payload_crc32,
            band_entry_count: star_ids_by_band.len(),
        };

        Ok(Self {
            records,
            ra_rad,
            dec_rad,
            pool,
            band_starts,
            band_counts,
            star_ids_by_band,
            ra_by_band,
            metadata,
        })
    }

    #[allow(clippy::type_complexity)]
    fn decode_index(
        index: &[u8],
        star_count: usize,
    ) -> Result<(Vec<usize>, Vec<usize>, Vec<u32>, Vec<f32>), CatalogError> {
        if index.len() < BAND_COUNT * BAND_ENTRY_SIZE {
            return Err(layout(format!(
                "index too small for {} bands: {} bytes",
                BAND_COUNT,
                index.len()
            )));
        }
        let mut reader = Cursor::new(index);
        let mut band_starts = vec![0usize; BAND_COUNT];
        let mut band_counts = vec![0usize; BAND_COUNT];

        for _ in 0..BAND_COUNT {
            let band = reader.read_i16::<LittleEndian>()? as i32;
            let start = reader.read_i32::<LittleEndian>()?;
            let band_count = reader.read_i32::<LittleEndian>()?;
            if !(MIN_BAND_ID..=MAX_BAND_ID).contains(&band) {
                return Err(layout(format!("invalid band id {}", band)));
            }
            if start < 0 || band_count < 0 {
                return Err(layout(format!(
                    "negative band range {}+{} for band {}",
                    start, band_count, band
                )));
            }
            let slot = (band - MIN_BAND_ID) as usize;
            band_starts[slot] = start as usize;
            band_counts[slot] = band_count as usize;
        }

        let total: usize = band_counts.iter().sum();
        let needed = BAND_COUNT * BAND_ENTRY_SIZE + total * 8;
        if index.len() < needed {
            return Err(layout(format!(
                "index holds {} bytes but {} band entries need {}",
                index.len(),
                total,
                needed
            )));
        }
        for (slot, (&start, &len)) in band_starts.iter().zip(&band_counts).enumerate() {
            if start + len > total {
                return Err(layout(format!(
                    "band {} range {}+{} exceeds {} entries",
                    slot as i32 + MIN_BAND_ID,
                    start,
                    len,
                    total
                )));
            }
        }

        let mut star_ids = Vec::with_capacity(total);
        for _ in 0..total {
            let id = reader.read_u32::<LittleEndian>()?;
            if id as usize >= star_count {
                return Err(layout(format!(
                    "index references star {} of {}",
                    id, star_count
                )));
            }
            star_ids.push(id);
        }
        let mut ra_by_band = Vec::with_capacity(total);
        for _ in 0..total {
            ra_by_band.push(reader.read_f32::<LittleEndian>()?);
        }
        // The trailing summary floats are informational only

        Ok((band_starts, band_counts, star_ids, ra_by_band))
    }

    pub fn metadata(&self) -> &StarCatalogMetadata {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Packed record at `index`
    pub fn record(&self, index: usize) -> Option<&StarRecord> {
        self.records.get(index)
    }

    /// Decoded star at record `index`
    pub fn star(&self, index: usize) -> Option<Star> {
        self.records.get(index).map(|r| self.to_star(index, r))
    }

    /// Iterates over all stars in record order
    pub fn stars(&self) -> impl Iterator<Item = Star> + '_ {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| self.to_star(i, r))
    }

    fn resolve_field(&self, index: usize, field: &str, offset: i32) -> Option<String> {
        match self.pool.resolve(offset) {
            Ok(text) => text.map(str::to_string),
            Err(err) => {
                warn!("Star {} has unreadable {}: {}", index, field, err);
                None
            }
        }
    }

    fn to_star(&self, index: usize, record: &StarRecord) -> Star {
        let id = if record.hip > 0 { record.hip } else { index as i32 };
        let name = self.resolve_field(index, "name", record.name_offset);
        let designation = self.resolve_field(index, "designation", record.designation_offset);
        let constellation = constellation_code(record.con_index);
        let (bayer, flamsteed) =
            split_designation(designation.as_deref(), constellation.as_deref());

        Star {
            id,
            ra_deg: record.ra_deg,
            dec_deg: record.dec_deg,
            mag: record.mag,
            name,
            bayer,
            flamsteed,
            constellation,
        }
    }

    fn ra_windows(center_ra: f64, center_dec: f64, radius: f64) -> Vec<RaWindow> {
        if radius >= 180.0 {
            return vec![RaWindow::All];
        }
        // The widest RA spread of a cap is at its most polar declination
        let dec_max = (center_dec - radius).abs().max((center_dec + radius).abs());
        if dec_max >= 90.0 {
            return vec![RaWindow::All];
        }
        let ratio = deg_to_rad(radius).sin() / deg_to_rad(dec_max).cos();
        if ratio >= 1.0 {
            return vec![RaWindow::All];
        }
        let half_width = rad_to_deg(ratio.asin()) + RA_MARGIN_DEG;

        let min = center_ra - half_width;
        let max = center_ra + half_width;
        if max - min >= 360.0 {
            vec![RaWindow::All]
        } else if min < 0.0 {
            vec![
                RaWindow::Range(0.0, max as f32),
                RaWindow::Range((min + 360.0) as f32, 360.0),
            ]
        } else if max >= 360.0 {
            vec![
                RaWindow::Range(0.0, (max - 360.0) as f32),
                RaWindow::Range(min as f32, 360.0),
            ]
        } else {
            vec![RaWindow::Range(min as f32, max as f32)]
        }
    }
}

fn lower_bound(values: &[f32], target: f32) -> usize {
    values.partition_point(|&v| v < target)
}

fn upper_bound(values: &[f32], target: f32) -> usize {
    values.partition_point(|&v| v <= target)
}

struct Candidate {
    index: usize,
    separation: f64,
    mag: f32,
}

impl StarCatalog for BinaryStarCatalog {
    fn nearby(&self, center: &Equatorial, radius_deg: f64, mag_limit: Option<f64>) -> Vec<Star> {
        if self.records.is_empty() || !(radius_deg > 0.0) {
            return Vec::new();
        }
        let radius = radius_deg.min(180.0);
        let center_ra = wrap_0_360(center.ra_deg);
        let center_dec = center.dec_deg.clamp(-90.0, 90.0);
        let center_ra_rad = deg_to_rad(center_ra);
        let (sin_dec, cos_dec) = deg_to_rad(center_dec).sin_cos();

        let min_band = band_id((center_dec - radius).max(-90.0));
        let max_band = band_id((center_dec + radius).min(90.0));
        let windows = Self::ra_windows(center_ra, center_dec, radius);

        let mut candidates = Vec::new();
        let mut consider = |cursor: usize| {
            let index = self.star_ids_by_band[cursor] as usize;
            let record = &self.records[index];
            if let Some(limit) = mag_limit {
                if record.mag.is_nan() || record.mag as f64 > limit {
                    return;
                }
            }
            let cosine = sin_dec * self.dec_rad[index].sin()
                + cos_dec * self.dec_rad[index].cos() * (center_ra_rad - self.ra_rad[index]).cos();
            let separation = rad_to_deg(cosine.clamp(-1.0, 1.0).acos());
            if separation <= radius {
                candidates.push(Candidate {
                    index,
                    separation,
                    mag: record.mag,
                });
            }
        };

        for band in min_band..=max_band {
            let slot = (band - MIN_BAND_ID) as usize;
            let start = self.band_starts[slot];
            let end = start + self.band_counts[slot];
            if start == end {
                continue;
            }
            let band_ra = &self.ra_by_band[start..end];

            for window in &windows {
                match *window {
                    RaWindow::All => (start..end).for_each(&mut consider),
                    RaWindow::Range(lo, hi) => {
                        let lower = start + lower_bound(band_ra, lo);
                        let upper = start + upper_bound(band_ra, hi);
                        (lower..upper.max(lower)).for_each(&mut consider);
                    }
                }
            }
        }

        candidates.sort_by(|a, b| {
            a.separation
                .partial_cmp(&b.separation)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.mag.total_cmp(&b.mag))
        });
        candidates
            .into_iter()
            .map(|c| self.to_star(c.index, &self.records[c.index]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogs::asset::MemoryAssetProvider;
    use crate::catalogs::fake::FakeStarCatalog;
    use crate::packer::{encode_star_catalog, StarInput};
    use approx::assert_abs_diff_eq;

    fn sample_inputs() -> Vec<StarInput> {
        vec![
            StarInput::new(101.287, -16.716, -1.46)
                .with_hip(32349)
                .with_name("Sirius")
                .with_designation("ALPHA 9 CMA")
                .with_constellation("CMA"),
            StarInput::new(37.954, 89.264, 1.97)
                .with_hip(11767)
                .with_name("Polaris")
                .with_constellation("UMI"),
            StarInput::new(359.9, 0.2, 4.0).with_designation("OMEGA PSC"),
            StarInput::new(0.1, 0.3, 4.5),
            StarInput::new(13.5, 60.5, 3.0).with_hip(4427),
            StarInput::new(101.6, -16.5, 5.0).with_hip(32500),
        ]
    }

    fn sample_bytes() -> Vec<u8> {
        encode_star_catalog(&sample_inputs(), true).unwrap().bytes
    }

    fn sample_catalog() -> BinaryStarCatalog {
        BinaryStarCatalog::from_bytes(&sample_bytes()).unwrap()
    }

    fn ids(stars: &[Star]) -> Vec<i32> {
        stars.iter().map(|s| s.id).collect()
    }

    /// Recomputes the payload CRC after a test edits the payload
    fn reseal(bytes: &mut [u8]) {
        let crc = payload_crc32(&bytes[StarCatalogHeader::SIZE..]);
        bytes[28..32].copy_from_slice(&crc.to_le_bytes());
    }

    #[test]
    fn test_loads_metadata_and_stars() {
        let catalog = sample_catalog();
        assert_eq!(catalog.len(), 6);
        let meta = catalog.metadata();
        assert_eq!(meta.star_count, 6);
        assert_eq!(meta.band_entry_count, 6);
        assert_eq!(meta.size_bytes, sample_bytes().len());

        let sirius = catalog.star(0).unwrap();
        assert_eq!(sirius.id, 32349);
        assert_eq!(sirius.name.as_deref(), Some("Sirius"));
        assert_eq!(sirius.bayer.as_deref(), Some("ALPHA"));
        assert_eq!(sirius.flamsteed.as_deref(), Some("9 CMA"));
        assert_eq!(sirius.constellation.as_deref(), Some("CMA"));
        assert_abs_diff_eq!(sirius.mag, -1.46, epsilon = 1e-6);

        // No HIP: id falls back to the record index
        assert_eq!(catalog.star(3).unwrap().id, 3);
        assert_eq!(catalog.stars().count(), 6);
    }

    #[test]
    fn test_nearby_sorted_by_separation() {
        let catalog = sample_catalog();
        let found = catalog.nearby(&Equatorial::new(101.3, -16.7), 1.0, None);
        assert_eq!(ids(&found), vec![32349, 32500]);

        let bright = catalog.nearby(&Equatorial::new(101.3, -16.7), 1.0, Some(2.0));
        assert_eq!(ids(&bright), vec![32349]);
    }

    #[test]
    fn test_nearby_across_ra_seam() {
        let catalog = sample_catalog();
        let found = catalog.nearby(&Equatorial::new(0.0, 0.0), 1.0, None);
        assert_eq!(ids(&found), vec![2, 3]);
        let found = catalog.nearby(&Equatorial::new(359.95, 0.25), 0.5, None);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_nearby_polar_cap() {
        let catalog = sample_catalog();
        // Polaris is on the far side of the pole from this center
        let found = catalog.nearby(&Equatorial::new(200.0, 88.0), 3.0, None);
        assert_eq!(ids(&found), vec![11767]);
    }

    #[test]
    fn test_nearby_widens_ra_window_at_high_declination() {
        let catalog = sample_catalog();
        // 3.5° of RA at dec 60 is well under 2° of arc
        let found = catalog.nearby(&Equatorial::new(10.0, 60.0), 2.0, None);
        assert_eq!(ids(&found), vec![4427]);
    }

    #[test]
    fn test_nearby_degenerate_radius() {
        let catalog = sample_catalog();
        let center = Equatorial::new(101.3, -16.7);
        assert!(catalog.nearby(&center, 0.0, None).is_empty());
        assert!(catalog.nearby(&center, -1.0, None).is_empty());
        assert!(catalog.nearby(&center, f64::NAN, None).is_empty());
        assert_eq!(catalog.nearby(&center, 500.0, None).len(), 6);
    }

    #[test]
    fn test_nan_magnitude_rejected_only_with_limit() {
        let mut bytes = sample_bytes();
        let header = StarCatalogHeader::read(&bytes).unwrap();
        // Overwrite the magnitude of record 3
        let mag_at = StarCatalogHeader::SIZE + header.string_pool_size as usize + 3 * STAR_RECORD_SIZE + 8;
        bytes[mag_at..mag_at + 4].copy_from_slice(&f32::NAN.to_le_bytes());
        reseal(&mut bytes);

        let catalog = BinaryStarCatalog::from_bytes(&bytes).unwrap();
        let center = Equatorial::new(0.1, 0.3);
        assert_eq!(ids(&catalog.nearby(&center, 0.05, None)), vec![3]);
        assert!(catalog.nearby(&center, 0.05, Some(10.0)).is_empty());
    }

    #[test]
    fn test_malformed_string_offset_only_drops_the_field() {
        let mut bytes = sample_bytes();
        let header = StarCatalogHeader::read(&bytes).unwrap();
        let name_at = StarCatalogHeader::SIZE + header.string_pool_size as usize + 20;
        bytes[name_at..name_at + 4].copy_from_slice(&9_999i32.to_le_bytes());
        reseal(&mut bytes);

        let catalog = BinaryStarCatalog::from_bytes(&bytes).unwrap();
        let sirius = catalog.star(0).unwrap();
        assert_eq!(sirius.name, None);
        assert_eq!(sirius.bayer.as_deref(), Some("ALPHA"));
    }

    #[test]
    fn test_integrity_failures() {
        let bytes = sample_bytes();

        let mut corrupt = bytes.clone();
        let last = corrupt.len() - 1;
        corrupt[last] ^= 0xFF;
        assert!(matches!(
            BinaryStarCatalog::from_bytes(&corrupt),
            Err(CatalogError::CrcMismatch { .. })
        ));

        assert!(matches!(
            BinaryStarCatalog::from_bytes(&bytes[..bytes.len() - 10]),
            Err(CatalogError::Truncated { .. })
        ));
        assert!(matches!(
            BinaryStarCatalog::from_bytes(&[]),
            Err(CatalogError::Truncated { .. })
        ));

        let mut version = bytes.clone();
        version[8..10].copy_from_slice(&2u16.to_le_bytes());
        if let Err(err) = BinaryStarCatalog::from_bytes(&version) {
            assert!(err.to_string().contains("version=2"));
        } else {
            panic!("Expected UnsupportedVersion error");
        }
    }

    #[test]
    fn test_bad_band_id_is_invalid_layout() {
        let mut bytes = sample_bytes();
        let header = StarCatalogHeader::read(&bytes).unwrap();
        let index_at = StarCatalogHeader::SIZE + header.index_offset as usize;
        bytes[index_at..index_at + 2].copy_from_slice(&500i16.to_le_bytes());
        reseal(&mut bytes);

        if let Err(CatalogError::InvalidLayout(msg)) = BinaryStarCatalog::from_bytes(&bytes) {
            assert!(msg.contains("500"));
        } else {
            panic!("Expected InvalidLayout error");
        }
    }

    #[test]
    fn test_load_or_fallback_reports_stage() {
        let mut corrupt = sample_bytes();
        let last = corrupt.len() - 1;
        corrupt[last] ^= 0x01;
        let provider = MemoryAssetProvider::new()
            .with_file(DEFAULT_PATH, sample_bytes())
            .with_file("corrupt.bin", corrupt)
            .with_file("empty.bin", Vec::new());
        let fallback: Arc<dyn StarCatalog> = Arc::new(FakeStarCatalog::new());

        let loaded = BinaryStarCatalog::load_or_fallback(&provider, DEFAULT_PATH, fallback.clone());
        assert!(loaded.status.is_real());
        assert_eq!(loaded.status.metadata().map(|m| m.star_count), Some(6));

        let loaded = BinaryStarCatalog::load_or_fallback(&provider, "corrupt.bin", fallback.clone());
        match &loaded.status {
            LoadStatus::Fallback { stage, reason } => {
                assert_eq!(*stage, LoadStage::HeaderValidated);
                assert!(reason.contains("expected=") && reason.contains("actual="));
            }
            other => panic!("Expected fallback, got {:?}", other),
        }
        // The fallback answers queries
        let found = loaded.catalog.nearby(&Equatorial::new(101.3, -16.7), 1.0, Some(2.0));
        assert_eq!(found[0].name.as_deref(), Some("Sirius"));

        for path in ["empty.bin", "missing.bin"] {
            let loaded = BinaryStarCatalog::load_or_fallback(&provider, path, fallback.clone());
            match loaded.status {
                LoadStatus::Fallback { stage, .. } => assert_eq!(stage, LoadStage::Unopened),
                other => panic!("Expected fallback for {}, got {:?}", path, other),
            }
        }
    }

    #[test]
    fn test_band_id_edges() {
        assert_eq!(band_id(90.0), 89);
        assert_eq!(band_id(-90.0), -90);
        assert_eq!(band_id(-0.5), -1);
        assert_eq!(band_id(0.0), 0);
    }
}
