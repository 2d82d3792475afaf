//! Time module for sidereal time calculations
//!
//! Converts UTC instants to Julian days and centuries and evaluates the
//! IAU-1982 mean sidereal time polynomial (Meeus 1998, §12). The polynomial
//! stays within 0.2° of the true value for a few centuries around J2000,
//! which is more than enough for identifying what a device is pointed at.
//!
//! Instants are `chrono::DateTime<Utc>`. Epoch seconds are split into whole
//! days and a fractional remainder before any floating-point division so a
//! Julian day keeps sub-millisecond resolution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DAYS_PER_JULIAN_CENTURY, DAY_S, DAY_S_I64, GMST_AT_J2000_DEG, GMST_RATE_DEG_PER_DAY,
    GMST_T2_COEFF, GMST_T3_DIVISOR, J2000, JD_UNIX_EPOCH,
};
use crate::coordinates::angle::wrap_0_360;
use crate::errors::TimeError;

/// Result type for time operations
pub type Result<T> = std::result::Result<T, TimeError>;

/// Julian day of a UTC instant
pub fn julian_day(instant: &DateTime<Utc>) -> f64 {
    let secs = instant.timestamp();
    let whole_days = secs.div_euclid(DAY_S_I64);
    let rem_secs = secs.rem_euclid(DAY_S_I64) as f64 + instant.timestamp_subsec_nanos() as f64 / 1e9;
    JD_UNIX_EPOCH + whole_days as f64 + rem_secs / DAY_S
}

/// Julian centuries elapsed since J2000.0
pub fn julian_centuries(instant: &DateTime<Utc>) -> f64 {
    (julian_day(instant) - J2000) / DAYS_PER_JULIAN_CENTURY
}

/// Greenwich mean sidereal time in degrees, `[0, 360)`
pub fn gmst_deg(julian_day: f64) -> f64 {
    let delta_days = julian_day - J2000;
    let t = delta_days / DAYS_PER_JULIAN_CENTURY;
    let theta = GMST_AT_J2000_DEG + GMST_RATE_DEG_PER_DAY * delta_days + GMST_T2_COEFF * t * t
        - t * t * t / GMST_T3_DIVISOR;
    wrap_0_360(theta)
}

/// Local sidereal time from GMST and an east-positive longitude
pub fn lst_deg(gmst_deg: f64, lon_deg: f64) -> f64 {
    wrap_0_360(gmst_deg + lon_deg)
}

/// Local sidereal time at an observer's meridian
///
/// Always in `[0, 360)`. The only way to build one is from an instant and a
/// longitude, or by wrapping an existing angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sidereal {
    lst_deg: f64,
}

impl Sidereal {
    /// Sidereal time for `instant` at east longitude `lon_deg`
    pub fn at(instant: &DateTime<Utc>, lon_deg: f64) -> Self {
        let gmst = gmst_deg(julian_day(instant));
        Self {
            lst_deg: lst_deg(gmst, lon_deg),
        }
    }

    pub fn from_degrees(lst_deg: f64) -> Self {
        Self {
            lst_deg: wrap_0_360(lst_deg),
        }
    }

    pub fn lst_deg(&self) -> f64 {
        self.lst_deg
    }
}

/// Parses an ISO-8601 / RFC 3339 instant such as `2000-01-01T12:00:00Z`
///
/// A trailing zone offset other than `Z` is accepted and converted to UTC.
pub fn parse_instant(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TimeError::InvalidFormat(format!("{}: {}", text, e)))
}
