//! PointToSky: offline sky identification for handheld and wrist-worn devices
//!
//! This crate turns an aim direction into "this star" or "this constellation"
//! without network access. It provides spherical-astronomy math (angle
//! normalization, sidereal time, equatorial/horizontal transforms with
//! refraction), a best-match identification solver, and a compact
//! CRC-protected binary catalog format together with its offline packer.

use thiserror::Error;

pub mod catalogs;
pub mod constants;
pub mod coordinates;
pub mod ephemeris;
pub mod errors;
pub mod identify;
pub mod packer;
pub mod time;
pub mod transform;

// Re-export commonly used types
pub use coordinates::{Equatorial, GeoPoint, Horizontal};
pub use errors::{CatalogError, MathError, PackError, TimeError};
pub use identify::{IdentifyResult, IdentifySolver, SkyObject, SkyObjectType};
pub use time::Sidereal;

/// Main error type for the pointtosky library
#[derive(Debug, Error)]
pub enum PointToSkyError {
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    #[error("Time error: {0}")]
    Time(#[from] TimeError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Pack error: {0}")]
    Pack(#[from] PackError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for pointtosky operations
pub type Result<T> = std::result::Result<T, PointToSkyError>;
