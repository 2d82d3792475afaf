//! Star and constellation catalogs
//!
//! This module holds the runtime side of the offline catalogs: the byte
//! source abstraction, the `PTSKSTAR` star catalog and `PTSK CONS`
//! boundary loaders, built-in fallbacks used when a file is missing or
//! corrupt, and the adapter that exposes them to the identify solver.

use serde::{Deserialize, Serialize};

use crate::coordinates::Equatorial;

pub mod adapter;
pub mod asset;
pub mod binary_catalog;
pub mod boundaries;
pub mod fake;
pub mod header;
pub mod repository;
pub mod string_pool;

pub use adapter::CatalogAdapter;
pub use asset::{AssetProvider, FileAssetProvider, MemoryAssetProvider};
pub use binary_catalog::{BinaryStarCatalog, StarCatalogMetadata, StarRecord};
pub use boundaries::{BinaryConstellationBoundaries, BoundaryBox, BoundaryMetadata};
pub use fake::{FakeConstellationBoundaries, FakeSkyCatalog, FakeStarCatalog};
pub use header::{BoundaryHeader, StarCatalogHeader};
pub use repository::{CatalogConfig, CatalogRepository};
pub use string_pool::StringPool;

/// The 88 IAU constellation abbreviations in catalog index order
///
/// A star record stores its constellation as an index into this table.
pub const CONSTELLATION_CODES: [&str; 88] = [
    "And", "Ant", "Aps", "Aql", "Aqr", "Ara", "Ari", "Aur", "Boo", "Cae", "Cam", "Cap", "Car",
    "Cas", "Cen", "Cep", "Cet", "Cha", "Cir", "CMa", "CMi", "Cnc", "Col", "Com", "CrA", "CrB",
    "Crt", "Cru", "Crv", "CVn", "Cyg", "Del", "Dor", "Dra", "Equ", "Eri", "For", "Gem", "Gru",
    "Her", "Hor", "Hya", "Hyi", "Ind", "Lac", "Leo", "LMi", "Lep", "Lib", "Lup", "Lyn", "Lyr",
    "Men", "Mic", "Mon", "Mus", "Nor", "Oct", "Oph", "Ori", "Pav", "Peg", "Per", "Phe", "Pic",
    "PsA", "Psc", "Pup", "Pyx", "Ret", "Scl", "Sco", "Sct", "Ser", "Sex", "Sge", "Sgr", "Tau",
    "Tel", "TrA", "Tri", "Tuc", "UMa", "UMi", "Vel", "Vir", "Vol", "Vul",
];

/// Last step a catalog load got through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadStage {
    /// Nothing validated yet: the file could not be read or its header is unusable
    Unopened,
    /// Magic and version accepted
    HeaderValidated,
    /// Length and CRC accepted
    PayloadValidated,
    /// Fully decoded
    Ready,
}

/// Whether a loader returned the real catalog or a fallback
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum LoadStatus<M> {
    Real(M),
    Fallback { stage: LoadStage, reason: String },
}

impl<M> LoadStatus<M> {
    pub fn is_real(&self) -> bool {
        matches!(self, LoadStatus::Real(_))
    }

    pub fn metadata(&self) -> Option<&M> {
        match self {
            LoadStatus::Real(meta) => Some(meta),
            LoadStatus::Fallback { .. } => None,
        }
    }
}

/// A catalog handed out by `load_or_fallback`, with how it was obtained
pub struct Loaded<C, M> {
    pub catalog: C,
    pub status: LoadStatus<M>,
}

/// Uppercased constellation code for a record index
pub fn constellation_code(index: i16) -> Option<String> {
    usize::try_from(index)
        .ok()
        .and_then(|i| CONSTELLATION_CODES.get(i))
        .map(|code| code.to_ascii_uppercase())
}

/// Record index of a constellation code, case-insensitive
pub fn constellation_index(code: &str) -> Option<i16> {
    let code = code.trim();
    CONSTELLATION_CODES
        .iter()
        .position(|c| c.eq_ignore_ascii_case(code))
        .map(|i| i as i16)
}

/// Trait for accessing star position data
pub trait StarPosition {
    /// Right ascension in degrees
    fn ra(&self) -> f64;

    /// Declination in degrees
    fn dec(&self) -> f64;

    fn equatorial(&self) -> Equatorial {
        Equatorial::new(self.ra(), self.dec())
    }
}

/// A catalog star as exposed to callers
///
/// Positions and magnitude keep the reduced `f32` precision they are stored
/// with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Star {
    /// Hipparcos number when known, otherwise the record index
    pub id: i32,
    pub ra_deg: f32,
    pub dec_deg: f32,
    /// Apparent V magnitude
    pub mag: f32,
    /// Proper name, e.g. "Sirius"
    pub name: Option<String>,
    /// Bayer letter without the constellation, e.g. "ALPHA"
    pub bayer: Option<String>,
    /// Flamsteed number with the constellation, e.g. "9 CMA"
    pub flamsteed: Option<String>,
    /// Uppercased IAU code, e.g. "CMA"
    pub constellation: Option<String>,
}

impl StarPosition for Star {
    fn ra(&self) -> f64 {
        self.ra_deg as f64
    }

    fn dec(&self) -> f64 {
        self.dec_deg as f64
    }
}

/// Radius query over stars
pub trait StarCatalog: Send + Sync {
    /// Stars within `radius_deg` of `center`, nearest first
    ///
    /// `mag_limit` is inclusive; `None` applies no brightness filter.
    fn nearby(&self, center: &Equatorial, radius_deg: f64, mag_limit: Option<f64>) -> Vec<Star>;
}

impl<T: StarCatalog + ?Sized> StarCatalog for std::sync::Arc<T> {
    fn nearby(&self, center: &Equatorial, radius_deg: f64, mag_limit: Option<f64>) -> Vec<Star> {
        (**self).nearby(center, radius_deg, mag_limit)
    }
}

/// Splits a packed designation into Bayer and Flamsteed parts
///
/// The constellation suffix is stripped, tokens containing digits form the
/// Flamsteed part (with the suffix re-appended) and the rest form the Bayer
/// part. A designation that cannot be split is returned whole as Bayer.
pub fn split_designation(
    designation: Option<&str>,
    constellation: Option<&str>,
) -> (Option<String>, Option<String>) {
    let Some(raw) = designation.map(str::trim).filter(|d| !d.is_empty()) else {
        return (None, None);
    };

    let suffix = constellation.filter(|con| {
        !con.is_empty()
            && raw.len() >= con.len()
            && raw.is_char_boundary(raw.len() - con.len())
            && raw[raw.len() - con.len()..].eq_ignore_ascii_case(con)
    });
    let body = match suffix {
        Some(con) => raw[..raw.len() - con.len()].trim_end(),
        None => raw,
    };

    let tokens: Vec<&str> = body.split_whitespace().collect();
    if tokens.is_empty() {
        return (Some(raw.to_string()), None);
    }

    let has_digit = |t: &&str| t.chars().any(|c| c.is_ascii_digit());
    let bayer: Vec<&str> = tokens.iter().copied().filter(|t| !has_digit(t)).collect();
    let flamsteed: Vec<&str> = tokens.iter().copied().filter(has_digit).collect();

    let bayer = (!bayer.is_empty()).then(|| bayer.join(" "));
    let flamsteed = (!flamsteed.is_empty()).then(|| {
        let value = flamsteed.join(" ");
        match suffix {
            Some(con) => format!("{} {}", value, con),
            None => value,
        }
    });

    (bayer, flamsteed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constellation_table() {
        assert_eq!(CONSTELLATION_CODES.len(), 88);
        assert_eq!(constellation_code(0).as_deref(), Some("AND"));
        assert_eq!(constellation_code(87).as_deref(), Some("VUL"));
        assert_eq!(constellation_code(88), None);
        assert_eq!(constellation_code(-1), None);
        assert_eq!(constellation_index("lmi"), Some(46));
        assert_eq!(constellation_index("ORI").and_then(constellation_code).as_deref(), Some("ORI"));
        assert_eq!(constellation_index("XYZ"), None);
    }

    #[test]
    fn test_split_bayer_and_flamsteed() {
        let (bayer, flamsteed) = split_designation(Some("ALPHA 53 AQL"), Some("AQL"));
        assert_eq!(bayer.as_deref(), Some("ALPHA"));
        assert_eq!(flamsteed.as_deref(), Some("53 AQL"));

        let (bayer, flamsteed) = split_designation(Some("9 CMa"), Some("CMA"));
        assert_eq!(bayer, None);
        assert_eq!(flamsteed.as_deref(), Some("9 CMA"));
    }

    #[test]
    fn test_split_without_constellation() {
        let (bayer, flamsteed) = split_designation(Some("Alp 12"), None);
        assert_eq!(bayer.as_deref(), Some("Alp"));
        assert_eq!(flamsteed.as_deref(), Some("12"));

        // Only the constellation itself: nothing to split
        let (bayer, flamsteed) = split_designation(Some("ORI"), Some("ORI"));
        assert_eq!(bayer.as_deref(), Some("ORI"));
        assert_eq!(flamsteed, None);

        assert_eq!(split_designation(Some("   "), Some("ORI")), (None, None));
        assert_eq!(split_designation(None, Some("ORI")), (None, None));
    }
}
