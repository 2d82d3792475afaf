//! Error types for the pointtosky components
//!
//! Math errors are contract violations by the caller. Catalog errors are
//! recoverable: loaders report them and hand back a fallback. Packer errors
//! are either per-row (`RowSkipped`, never fatal) or whole-run failures.

use std::io;
use thiserror::Error;

/// Errors raised by the angle and vector helpers
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MathError {
    /// Lower bound is greater than upper bound
    #[error("Invalid range: lo={lo} > hi={hi}")]
    InvalidRange { lo: f64, hi: f64 },

    /// A direction vector has zero length
    #[error("Cannot normalize a zero-length vector")]
    ZeroVector,

    /// Input geometry cannot produce a meaningful result
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

/// Errors raised while parsing time values
#[derive(Debug, Error)]
pub enum TimeError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),
}

/// Errors raised while opening or decoding a binary catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to open file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid header: bad magic (expected {expected:?}, found {found:?})")]
    BadMagic { expected: String, found: String },

    #[error("Unsupported catalog version={0}")]
    UnsupportedVersion(u32),

    #[error("Truncated catalog: need {needed} bytes, have {actual}")]
    Truncated { needed: usize, actual: usize },

    #[error("CRC mismatch: expected=0x{expected:08X} actual=0x{actual:08X}")]
    CrcMismatch { expected: u32, actual: u32 },

    /// A string-pool offset does not resolve to a NUL-terminated UTF-8 run
    #[error("Malformed string offset {offset} (pool size {pool_size})")]
    MalformedStringOffset { offset: i64, pool_size: usize },

    /// Section sizes or index entries disagree with each other
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised by the offline catalog packer
#[derive(Debug, Error)]
pub enum PackError {
    /// One CSV row could not be turned into a star; the run continues
    #[error("Row {row} skipped: {reason}")]
    RowSkipped { row: usize, reason: String },

    #[error("Invalid value for {name}: {value}")]
    InvalidRange { name: &'static str, value: f64 },

    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    #[error("Invalid boundary input: {0}")]
    InvalidBoundary(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Math error: {0}")]
    Math(#[from] MathError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
