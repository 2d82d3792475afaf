//! # Angle Math
//!
//! Pure helpers for working with angles expressed in degrees: unit
//! conversion, wrapping into the canonical intervals used throughout the
//! crate, checked clamping and great-circle separation.
//!
//! ## Intervals
//!
//! - Right ascension, azimuth and sidereal time live in `[0, 360)`.
//! - Hour angles and longitudes live in `(-180, 180]`.
//! - Declination, altitude and latitude are clamped to `[-90, 90]`.
//!
//! ## Examples
//!
//! ```rust
//! use pointtosky::coordinates::angle::{wrap_0_360, wrap_signed_180};
//!
//! assert_eq!(wrap_0_360(-90.0), 270.0);
//! assert_eq!(wrap_0_360(360.0), 0.0);
//! assert_eq!(wrap_signed_180(-180.0), 180.0);
//! ```

use crate::constants::{DEG2RAD, RAD2DEG};
use crate::coordinates::Equatorial;
use crate::errors::MathError;

/// Converts degrees to radians
#[inline]
pub fn deg_to_rad(deg: f64) -> f64 {
    deg * DEG2RAD
}

/// Converts radians to degrees
#[inline]
pub fn rad_to_deg(rad: f64) -> f64 {
    rad * RAD2DEG
}

/// Wraps an angle into `[0, 360)`
///
/// `-0.0` and `360.0` both map to `+0.0`. Non-finite input is returned as NaN.
#[inline]
pub fn wrap_0_360(deg: f64) -> f64 {
    let wrapped = ((deg % 360.0) + 360.0) % 360.0;
    // Adding +0.0 turns a negative zero into a positive one
    wrapped + 0.0
}

/// Wraps an angle into `(-180, 180]`
///
/// The boundary `180.0` is kept and `-180.0` maps to `180.0`.
#[inline]
pub fn wrap_signed_180(deg: f64) -> f64 {
    let wrapped = wrap_0_360(deg);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Clamps `value` into `[lo, hi]`
///
/// # Errors
///
/// Returns [`MathError::InvalidRange`] when `lo > hi`.
pub fn clamp(value: f64, lo: f64, hi: f64) -> Result<f64, MathError> {
    if lo > hi {
        return Err(MathError::InvalidRange { lo, hi });
    }
    Ok(value.max(lo).min(hi))
}

/// Clamps a latitude-like angle into `[-90, 90]`
#[inline]
pub(crate) fn clamp_90(deg: f64) -> f64 {
    deg.clamp(-90.0, 90.0)
}

/// Great-circle separation between two equatorial positions, in degrees
///
/// Uses the spherical law of cosines. The cosine is clamped to `[-1, 1]`
/// before `acos` so rounding overshoot never produces NaN.
pub fn angular_separation_deg(a: &Equatorial, b: &Equatorial) -> f64 {
    let dec_a = deg_to_rad(a.dec_deg);
    let dec_b = deg_to_rad(b.dec_deg);
    let delta_ra = deg_to_rad(a.ra_deg - b.ra_deg);

    let cosine = dec_a.sin() * dec_b.sin() + dec_a.cos() * dec_b.cos() * delta_ra.cos();
    rad_to_deg(cosine.clamp(-1.0, 1.0).acos())
}

/// Haversine form of [`angular_separation_deg`]
///
/// Numerically stable for sub-microdegree separations where the law of
/// cosines loses precision.
pub fn haversine_separation_deg(a: &Equatorial, b: &Equatorial) -> f64 {
    let dec_a = deg_to_rad(a.dec_deg);
    let dec_b = deg_to_rad(b.dec_deg);
    let half_ddec = (dec_b - dec_a) / 2.0;
    let half_dra = deg_to_rad(b.ra_deg - a.ra_deg) / 2.0;

    let h = half_ddec.sin().powi(2) + dec_a.cos() * dec_b.cos() * half_dra.sin().powi(2);
    rad_to_deg(2.0 * h.sqrt().clamp(0.0, 1.0).asin())
}
