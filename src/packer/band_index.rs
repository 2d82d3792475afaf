//! Declination band index writer
//!
//! Produces the index section read back by
//! [`crate::catalogs::BinaryStarCatalog`]: one entry per band, the star ids
//! grouped by band, their RAs sorted within each band, then the summary.

use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use serde::Serialize;

use super::StarInput;
use crate::catalogs::binary_catalog::{band_id, BAND_COUNT, MIN_BAND_ID};
use crate::coordinates::angle::wrap_0_360;

/// Extents of the packed stars
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSummary {
    pub min_mag: f64,
    pub max_mag: f64,
    pub min_ra: f64,
    pub max_ra: f64,
    pub min_dec: f64,
    pub max_dec: f64,
}

#[derive(Debug, Clone, Copy)]
struct BandEntry {
    star: u32,
    ra: f32,
}

/// Stars bucketed into the 180 one-degree declination bands
#[derive(Debug, Clone)]
pub struct BandIndex {
    bands: Vec<Vec<BandEntry>>,
    summary: IndexSummary,
}

impl BandIndex {
    /// Buckets `stars` by declination; star ids are positions in the slice
    pub fn build(stars: &[StarInput]) -> Self {
        let mut bands = vec![Vec::new(); BAND_COUNT];
        let mut summary: Option<IndexSummary> = None;

        for (i, star) in stars.iter().enumerate() {
            let ra = wrap_0_360(star.ra_deg);
            let slot = (band_id(star.dec_deg) - MIN_BAND_ID) as usize;
            bands[slot].push(BandEntry {
                star: i as u32,
                ra: ra as f32,
            });

            let s = summary.get_or_insert(IndexSummary {
                min_mag: star.mag,
                max_mag: star.mag,
                min_ra: ra,
                max_ra: ra,
                min_dec: star.dec_deg,
                max_dec: star.dec_deg,
            });
            s.min_mag = s.min_mag.min(star.mag);
            s.max_mag = s.max_mag.max(star.mag);
            s.min_ra = s.min_ra.min(ra);
            s.max_ra = s.max_ra.max(ra);
            s.min_dec = s.min_dec.min(star.dec_deg);
            s.max_dec = s.max_dec.max(star.dec_deg);
        }

        for band in &mut bands {
            // Stable: equal RAs keep input order
            band.sort_by(|a, b| a.ra.total_cmp(&b.ra));
        }

        Self {
            bands,
            summary: summary.unwrap_or_default(),
        }
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn entry_count(&self) -> usize {
        self.bands.iter().map(Vec::len).sum()
    }

    pub fn summary(&self) -> &IndexSummary {
        &self.summary
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut cursor = 0i32;
        for (slot, band) in self.bands.iter().enumerate() {
            writer.write_i16::<LittleEndian>((slot as i32 + MIN_BAND_ID) as i16)?;
            writer.write_i32::<LittleEndian>(cursor)?;
            writer.write_i32::<LittleEndian>(band.len() as i32)?;
            cursor += band.len() as i32;
        }
        for entry in self.bands.iter().flatten() {
            writer.write_u32::<LittleEndian>(entry.star)?;
        }
        for entry in self.bands.iter().flatten() {
            writer.write_f32::<LittleEndian>(entry.ra)?;
        }

        let s = &self.summary;
        for value in [
            self.band_count() as f64,
            self.entry_count() as f64,
            s.min_mag,
            s.max_mag,
            s.min_ra,
            s.max_ra,
            s.min_dec,
            s.max_dec,
        ] {
            writer.write_f32::<LittleEndian>(value as f32)?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        let _ = self.write(&mut bytes);
        bytes
    }
}
