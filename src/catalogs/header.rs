//! Fixed-size headers of the binary catalog files
//!
//! Both formats are little-endian and protect everything after the header
//! with a CRC32 (IEEE polynomial).
//!
//! Star catalog header, 32 bytes:
//!
//! ```text
//! offset  size  field
//!      0     8  magic "PTSKSTAR"
//!      8     2  version (u16)
//!     10     2  reserved (u16)
//!     12     4  starCount (u32)
//!     16     4  stringPoolSize (u32)
//!     20     4  indexOffset (u32, relative to the end of the header)
//!     24     4  indexSize (u32)
//!     28     4  payloadCrc32 (u32)
//! ```
//!
//! Constellation boundary header, 20 bytes:
//!
//! ```text
//! offset  size  field
//!      0     4  magic "PTSK"
//!      4     4  type "CONS"
//!      8     4  version (u32)
//!     12     4  recordCount (u32)
//!     16     4  payloadCrc32 (u32)
//! ```

use std::io::{self, Cursor, Read, Write};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};

use crate::errors::CatalogError;

/// CRC32 of a payload as stored in the headers
pub fn payload_crc32(payload: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(payload);
    hasher.finalize()
}

fn printable(bytes: &[u8]) -> String {
    bytes.escape_ascii().to_string()
}

fn truncated(needed: usize, actual: usize) -> CatalogError {
    CatalogError::Truncated { needed, actual }
}

/// Header of a `PTSKSTAR` star catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarCatalogHeader {
    pub version: u16,
    pub reserved: u16,
    pub star_count: u32,
    pub string_pool_size: u32,
    /// Offset of the spatial index from the start of the payload
    pub index_offset: u32,
    pub index_size: u32,
    pub payload_crc32: u32,
}

impl StarCatalogHeader {
    pub const SIZE: usize = 32;
    pub const MAGIC: [u8; 8] = *b"PTSKSTAR";
    pub const VERSION: u16 = 1;

    /// Parses the header at the start of `bytes`
    ///
    /// Only the magic is checked here; version and section bounds are the
    /// loader's business.
    pub fn read(bytes: &[u8]) -> Result<Self, CatalogError> {
        if bytes.len() < Self::SIZE {
            return Err(truncated(Self::SIZE, bytes.len()));
        }
        let mut reader = Cursor::new(&bytes[..Self::SIZE]);

        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;
        if magic != Self::MAGIC {
            return Err(CatalogError::BadMagic {
                expected: printable(&Self::MAGIC),
                found: printable(&magic),
            });
        }

        Ok(Self {
            version: reader.read_u16::<LittleEndian>()?,
            reserved: reader.read_u16::<LittleEndian>()?,
            star_count: reader.read_u32::<LittleEndian>()?,
            string_pool_size: reader.read_u32::<LittleEndian>()?,
            index_offset: reader.read_u32::<LittleEndian>()?,
            index_size: reader.read_u32::<LittleEndian>()?,
            payload_crc32: reader.read_u32::<LittleEndian>()?,
        })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[..8].copy_from_slice(&Self::MAGIC);
        LittleEndian::write_u16(&mut bytes[8..10], self.version);
        LittleEndian::write_u16(&mut bytes[10..12], self.reserved);
        LittleEndian::write_u32(&mut bytes[12..16], self.star_count);
        LittleEndian::write_u32(&mut bytes[16..20], self.string_pool_size);
        LittleEndian::write_u32(&mut bytes[20..24], self.index_offset);
        LittleEndian::write_u32(&mut bytes[24..28], self.index_size);
        LittleEndian::write_u32(&mut bytes[28..32], self.payload_crc32);
        bytes
    }
}

/// Header of a `PTSK`/`CONS` constellation boundary file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryHeader {
    pub version: u32,
    pub record_count: u32,
    pub payload_crc32: u32,
}

impl BoundaryHeader {
    pub const SIZE: usize = 20;
    pub const MAGIC: [u8; 4] = *b"PTSK";
    pub const TYPE: [u8; 4] = *b"CONS";
    pub const VERSION: u32 = 1;

    /// Parses the header at the start of `bytes`, checking magic and type tag
    pub fn read(bytes: &[u8]) -> Result<Self, CatalogError> {
        if bytes.len() < Self::SIZE {
            return Err(truncated(Self::SIZE, bytes.len()));
        }
        let mut reader = Cursor::new(&bytes[..Self::SIZE]);

        let mut tag = [0u8; 8];
        reader.read_exact(&mut tag)?;
        if tag[..4] != Self::MAGIC || tag[4..] != Self::TYPE {
            let mut expected = Self::MAGIC.to_vec();
            expected.extend_from_slice(&Self::TYPE);
            return Err(CatalogError::BadMagic {
                expected: printable(&expected),
                found: printable(&tag),
            });
        }

        Ok(Self {
            version: reader.read_u32::<LittleEndian>()?,
            record_count: reader.read_u32::<LittleEndian>()?,
            payload_crc32: reader.read_u32::<LittleEndian>()?,
        })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[..4].copy_from_slice(&Self::MAGIC);
        bytes[4..8].copy_from_slice(&Self::TYPE);
        LittleEndian::write_u32(&mut bytes[8..12], self.version);
        LittleEndian::write_u32(&mut bytes[12..16], self.record_count);
        LittleEndian::write_u32(&mut bytes[16..20], self.payload_crc32);
        bytes
    }
}
