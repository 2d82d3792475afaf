//! Coordinate value types shared by every pointtosky component
//!
//! All angles are stored in degrees. [`Equatorial::new`] and
//! [`Horizontal::new`] normalize their inputs so that a constructed value
//! always sits in its canonical interval.

pub mod angle;
pub mod cartesian;

use serde::{Deserialize, Serialize};

use angle::{clamp_90, wrap_0_360};

/// Sky position fixed to the celestial sphere
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equatorial {
    /// Right ascension in degrees, `[0, 360)`
    pub ra_deg: f64,
    /// Declination in degrees, `[-90, 90]`
    pub dec_deg: f64,
}

impl Equatorial {
    /// Creates a position, wrapping RA and clamping Dec
    pub fn new(ra_deg: f64, dec_deg: f64) -> Self {
        Self {
            ra_deg: wrap_0_360(ra_deg),
            dec_deg: clamp_90(dec_deg),
        }
    }

    /// Great-circle distance to `other` in degrees
    pub fn separation_deg(&self, other: &Equatorial) -> f64 {
        angle::angular_separation_deg(self, other)
    }
}

/// Device pointing direction relative to the local horizon
///
/// Azimuth is measured clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Horizontal {
    /// Azimuth in degrees, `[0, 360)`
    pub az_deg: f64,
    /// Altitude in degrees, `[-90, 90]`
    pub alt_deg: f64,
}

impl Horizontal {
    pub fn new(az_deg: f64, alt_deg: f64) -> Self {
        Self {
            az_deg: wrap_0_360(az_deg),
            alt_deg: clamp_90(alt_deg),
        }
    }
}

/// Observer location on the Earth
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    /// Geodetic latitude in degrees, `[-90, 90]`
    pub lat_deg: f64,
    /// East longitude in degrees, `[-180, 180]`
    pub lon_deg: f64,
}

impl GeoPoint {
    pub fn new(lat_deg: f64, lon_deg: f64) -> Self {
        let lon = angle::wrap_signed_180(lon_deg);
        Self {
            lat_deg: clamp_90(lat_deg),
            // -180 is a valid east longitude; keep the caller's sign for it
            lon_deg: if lon == 180.0 && lon_deg < 0.0 { -180.0 } else { lon },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_equatorial_normalizes_on_construction() {
        let eq = Equatorial::new(-30.0, 95.0);
        assert_eq!(eq.ra_deg, 330.0);
        assert_eq!(eq.dec_deg, 90.0);

        let eq = Equatorial::new(360.0, -91.0);
        assert_eq!(eq.ra_deg, 0.0);
        assert_eq!(eq.dec_deg, -90.0);
    }

    #[test]
    fn test_horizontal_normalizes_on_construction() {
        let h = Horizontal::new(725.0, -100.0);
        assert_abs_diff_eq!(h.az_deg, 5.0, epsilon = 1e-12);
        assert_eq!(h.alt_deg, -90.0);
    }

    #[test]
    fn test_geo_point_longitude_range() {
        assert_eq!(GeoPoint::new(10.0, 190.0).lon_deg, -170.0);
        assert_eq!(GeoPoint::new(10.0, -180.0).lon_deg, -180.0);
        assert_eq!(GeoPoint::new(10.0, 180.0).lon_deg, 180.0);
        assert_eq!(GeoPoint::new(120.0, 0.0).lat_deg, 90.0);
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let eq = Equatorial::new(10.5, -20.25);
        let json = serde_json::to_string(&eq).unwrap();
        assert_eq!(json, r#"{"raDeg":10.5,"decDeg":-20.25}"#);
        let back: Equatorial = serde_json::from_str(&json).unwrap();
        assert_eq!(back, eq);
    }
}
