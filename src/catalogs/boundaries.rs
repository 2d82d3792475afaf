//! `PTSK`/`CONS` constellation boundary file
//!
//! After the 20-byte [`BoundaryHeader`] the payload is `recordCount` records:
//!
//! ```text
//! nameLen u32, name (UTF-8), minRa f64, maxRa f64, minDec f64, maxDec f64
//! ```
//!
//! Each record is an RA/Dec box. A box whose `minRa > maxRa` straddles the
//! 0°/360° seam. Lookups return the first box containing the point, so
//! record order matters where boxes overlap.

use std::io::{self, Cursor, Read, Write};
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use super::asset::AssetProvider;
use super::header::{payload_crc32, BoundaryHeader};
use super::{LoadStage, LoadStatus, Loaded};
use crate::coordinates::angle::wrap_0_360;
use crate::coordinates::Equatorial;
use crate::errors::CatalogError;
use crate::identify::ConstellationBoundaries;

/// Default asset path of the boundary file
pub const DEFAULT_PATH: &str = "catalog/const_v1.bin";

/// Longest constellation name accepted when decoding
const MAX_NAME_LEN: u32 = 64;

const FULL_CIRCLE_DEG: f64 = 360.0;

/// One rectangular region in RA/Dec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryBox {
    pub code: String,
    pub min_ra_deg: f64,
    pub max_ra_deg: f64,
    pub min_dec_deg: f64,
    pub max_dec_deg: f64,
}

impl BoundaryBox {
    /// Creates a box, wrapping both RA limits into `[0, 360)`
    ///
    /// A span of 360° or more is kept as the full circle `[0, 360]`.
    pub fn new(code: &str, min_ra_deg: f64, max_ra_deg: f64, min_dec_deg: f64, max_dec_deg: f64) -> Self {
        let (min_ra_deg, max_ra_deg) = if max_ra_deg - min_ra_deg >= FULL_CIRCLE_DEG {
            (0.0, FULL_CIRCLE_DEG)
        } else {
            (wrap_0_360(min_ra_deg), wrap_0_360(max_ra_deg))
        };
        Self {
            code: code.to_string(),
            min_ra_deg,
            max_ra_deg,
            min_dec_deg,
            max_dec_deg,
        }
    }

    /// Whether the box covers every right ascension
    pub fn is_full_circle(&self) -> bool {
        self.min_ra_deg == 0.0 && self.max_ra_deg >= FULL_CIRCLE_DEG
    }

    /// Whether the box straddles RA 0°/360°
    pub fn wraps(&self) -> bool {
        self.min_ra_deg > self.max_ra_deg
    }

    /// Membership test with wrap-aware RA and inclusive limits
    pub fn contains(&self, ra_deg: f64, dec_deg: f64) -> bool {
        let ra = wrap_0_360(ra_deg);
        let ra_matches = if self.wraps() {
            ra >= self.min_ra_deg || ra <= self.max_ra_deg
        } else {
            ra >= self.min_ra_deg && ra <= self.max_ra_deg
        };
        ra_matches && dec_deg >= self.min_dec_deg && dec_deg <= self.max_dec_deg
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<Self, CatalogError> {
        let name_len = reader.read_u32::<LittleEndian>()?;
        if name_len > MAX_NAME_LEN {
            return Err(CatalogError::InvalidLayout(format!(
                "constellation name length {} exceeds {}",
                name_len, MAX_NAME_LEN
            )));
        }
        let mut name = vec![0u8; name_len as usize];
        reader.read_exact(&mut name)?;
        let code = String::from_utf8(name)
            .map_err(|e| CatalogError::InvalidLayout(format!("constellation name: {}", e)))?;

        let min_ra = reader.read_f64::<LittleEndian>()?;
        let max_ra = reader.read_f64::<LittleEndian>()?;
        let min_dec = reader.read_f64::<LittleEndian>()?;
        let max_dec = reader.read_f64::<LittleEndian>()?;
        Ok(Self::new(&code, min_ra, max_ra, min_dec, max_dec))
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.code.len() as u32)?;
        writer.write_all(self.code.as_bytes())?;
        writer.write_f64::<LittleEndian>(self.min_ra_deg)?;
        writer.write_f64::<LittleEndian>(self.max_ra_deg)?;
        writer.write_f64::<LittleEndian>(self.min_dec_deg)?;
        writer.write_f64::<LittleEndian>(self.max_dec_deg)?;
        Ok(())
    }
}

/// Encodes boxes into a complete boundary file, header and CRC included
pub fn encode_boundaries(boxes: &[BoundaryBox]) -> io::Result<Vec<u8>> {
    let mut payload = Vec::new();
    for b in boxes {
        b.write(&mut payload)?;
    }
    let header = BoundaryHeader {
        version: BoundaryHeader::VERSION,
        record_count: boxes.len() as u32,
        payload_crc32: payload_crc32(&payload),
    };
    let mut bytes = Vec::with_capacity(BoundaryHeader::SIZE + payload.len());
    header.write(&mut bytes)?;
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Facts about a loaded boundary file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryMetadata {
    pub size_bytes: usize,
    pub record_count: u32,
    pub payload_crc32: u32,
}

/// Loaded constellation boundaries
#[derive(Debug, Clone)]
pub struct BinaryConstellationBoundaries {
    regions: Vec<BoundaryBox>,
    metadata: BoundaryMetadata,
}

impl BinaryConstellationBoundaries {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CatalogError> {
        let mut stage = LoadStage::Unopened;
        Self::decode(bytes, &mut stage)
    }

    pub fn load(provider: &dyn AssetProvider, path: &str) -> Result<Self, CatalogError> {
        let mut stage = LoadStage::Unopened;
        Self::try_load(provider, path, &mut stage)
    }

    /// Loads `path`, or hands back `fallback` with the reason it was rejected
    pub fn load_or_fallback(
        provider: &dyn AssetProvider,
        path: &str,
        fallback: Arc<dyn ConstellationBoundaries>,
    ) -> Loaded<Arc<dyn ConstellationBoundaries>, BoundaryMetadata> {
        let mut stage = LoadStage::Unopened;
        match Self::try_load(provider, path, &mut stage) {
            Ok(boundaries) => {
                let metadata = boundaries.metadata.clone();
                Loaded {
                    catalog: Arc::new(boundaries),
                    status: LoadStatus::Real(metadata),
                }
            }
            Err(err) => {
                error!(
                    "Constellation boundaries {} rejected after stage {:?}, using fallback: {}",
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
        let boundaries = Self::decode(&bytes, stage)?;
        info!(
            "Loaded constellation boundaries {}: {} bytes, {} regions, crc=0x{:08X}",
            path,
            boundaries.metadata.size_bytes,
            boundaries.metadata.record_count,
            boundaries.metadata.payload_crc32
        );
        Ok(boundaries)
    }

    fn decode(bytes: &[u8], stage: &mut LoadStage) -> Result<Self, CatalogError> {
        let header = BoundaryHeader::read(bytes)?;
        if header.version != BoundaryHeader::VERSION {
            return Err(CatalogError::UnsupportedVersion(header.version));
        }
        *stage = LoadStage::HeaderValidated;

        let payload = &bytes[BoundaryHeader::SIZE..];
        let actual = payload_crc32(payload);
        if actual != header.payload_crc32 {
            return Err(CatalogError::CrcMismatch {
                expected: header.payload_crc32,
                actual,
            });
        }
        *stage = LoadStage::PayloadValidated;

        let mut reader = Cursor::new(payload);
        let mut regions = Vec::new();
        for _ in 0..header.record_count {
            let region = BoundaryBox::read(&mut reader).map_err(|err| match err {
                CatalogError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    CatalogError::Truncated {
                        needed: bytes.len() + 1,
                        actual: bytes.len(),
                    }
                }
                other => other,
            })?;
            regions.push(region);
        }
        let trailing = payload.len() as u64 - reader.position();
        if trailing > 0 {
            debug!("Ignoring {} trailing bytes after boundary records", trailing);
        }
        *stage = LoadStage::Ready;

        Ok(Self {
            regions,
            metadata: BoundaryMetadata {
                size_bytes: bytes.len(),
                record_count: header.record_count,
                payload_crc32: header.payload_crc32,
            },
        })
    }

    pub fn metadata(&self) -> &BoundaryMetadata {
        &self.metadata
    }

    pub fn regions(&self) -> &[BoundaryBox] {
        &self.regions
    }
}

impl ConstellationBoundaries for BinaryConstellationBoundaries {
    fn find_by_point(&self, eq: &Equatorial) -> Option<String> {
        self.regions
            .iter()
            .find(|region| region.contains(eq.ra_deg, eq.dec_deg))
            .map(|region| region.code.clone())
    }
}
