//! Equatorial ↔ horizontal coordinate transforms
//!
//! Standard spherical-astronomy relations (Meeus 1991, ch. 13):
//!
//! ```text
//! τ     = LST − α
//! sin h = sin φ sin δ + cos φ cos δ cos τ
//! sin A = −sin τ cos δ / cos h
//! cos A = (sin δ − sin h sin φ) / (cos h cos φ)
//! ```
//!
//! Azimuth is measured clockwise from north. Near the poles (`cos φ → 0`) and
//! the zenith (`cos h → 0`) the divisors are replaced with ±[`EPSILON`] so the
//! azimuth stays finite. The azimuth reported for a target exactly at the
//! zenith is arbitrary.
//!
//! Atmospheric refraction follows Saemundsson's formula, scaled for pressure
//! and temperature.

use serde::{Deserialize, Serialize};

use crate::coordinates::angle::{clamp_90, deg_to_rad, rad_to_deg, wrap_0_360, wrap_signed_180};
use crate::coordinates::{Equatorial, GeoPoint, Horizontal};
use crate::time::Sidereal;

/// Substitute for divisors that vanish at the poles and the zenith
pub const EPSILON: f64 = 1e-12;

/// Refraction is only applied above this apparent altitude, in degrees
pub const REFRACTION_MIN_ALT_DEG: f64 = -1.0;

/// Meteorological conditions for the refraction correction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meteo {
    /// Pressure in millibars (hPa)
    pub pressure_mbar: f64,
    /// Air temperature in degrees Celsius
    pub temperature_c: f64,
}

impl Default for Meteo {
    fn default() -> Self {
        Self {
            pressure_mbar: 1010.0,
            temperature_c: 10.0,
        }
    }
}

#[inline]
fn safe_divisor(value: f64) -> f64 {
    if value.abs() < EPSILON {
        if value >= 0.0 {
            EPSILON
        } else {
            -EPSILON
        }
    } else {
        value
    }
}

/// Saemundsson refraction in degrees for a geometric altitude `alt_deg`
///
/// Returns `0.0` below [`REFRACTION_MIN_ALT_DEG`] and where the tangent
/// vanishes.
pub fn refraction_deg(alt_deg: f64, meteo: &Meteo) -> f64 {
    if alt_deg <= REFRACTION_MIN_ALT_DEG {
        return 0.0;
    }
    let tan_value = deg_to_rad(alt_deg + 10.3 / (alt_deg + 5.11)).tan();
    if tan_value.abs() <= EPSILON {
        return 0.0;
    }
    let pressure_factor = meteo.pressure_mbar / 1010.0;
    let temperature_factor = 283.0 / (273.0 + meteo.temperature_c);
    1.02 / tan_value / 60.0 * pressure_factor * temperature_factor
}

/// Converts an equatorial position to azimuth/altitude
///
/// # Arguments
///
/// * `eq` - Target position
/// * `lst_deg` - Local sidereal time in degrees
/// * `lat_deg` - Observer latitude in degrees
/// * `apply_refraction` - Add Saemundsson refraction to the altitude
/// * `meteo` - Conditions for refraction; defaults apply when `None`
pub fn equatorial_to_horizontal(
    eq: &Equatorial,
    lst_deg: f64,
    lat_deg: f64,
    apply_refraction: bool,
    meteo: Option<&Meteo>,
) -> Horizontal {
    let lst = wrap_0_360(lst_deg);
    let ra = wrap_0_360(eq.ra_deg);
    let dec = deg_to_rad(clamp_90(eq.dec_deg));
    let lat = deg_to_rad(clamp_90(lat_deg));
    let tau = deg_to_rad(wrap_signed_180(lst - ra));

    let (sin_phi, cos_phi) = lat.sin_cos();
    let (sin_delta, cos_delta) = dec.sin_cos();
    let (sin_tau, cos_tau) = tau.sin_cos();
    let cos_phi_safe = safe_divisor(cos_phi);

    let sin_h = (sin_phi * sin_delta + cos_phi * cos_delta * cos_tau).clamp(-1.0, 1.0);
    let h = sin_h.asin();
    let cos_h = h.cos().max(EPSILON);

    let sin_a = -sin_tau * cos_delta / cos_h;
    let cos_a = (sin_delta - sin_h * sin_phi) / (cos_h * cos_phi_safe);
    let az_deg = wrap_0_360(rad_to_deg(sin_a.atan2(cos_a)));

    let mut alt_deg = clamp_90(rad_to_deg(h));
    if apply_refraction && alt_deg > REFRACTION_MIN_ALT_DEG {
        let defaults = Meteo::default();
        let meteo = meteo.unwrap_or(&defaults);
        alt_deg = clamp_90(alt_deg + refraction_deg(alt_deg, meteo));
    }

    Horizontal { az_deg, alt_deg }
}

/// Converts azimuth/altitude back to an equatorial position
///
/// No refraction is removed; pass a geometric altitude.
pub fn horizontal_to_equatorial(hor: &Horizontal, lst_deg: f64, lat_deg: f64) -> Equatorial {
    let lst = deg_to_rad(wrap_0_360(lst_deg));
    let az = deg_to_rad(wrap_0_360(hor.az_deg));
    let alt = deg_to_rad(clamp_90(hor.alt_deg));
    let lat = deg_to_rad(clamp_90(lat_deg));

    let (sin_phi, cos_phi) = lat.sin_cos();
    let cos_phi_safe = safe_divisor(cos_phi);
    let sin_alt = alt.sin();
    let cos_alt = alt.cos().max(EPSILON);
    let (sin_az, cos_az) = az.sin_cos();

    let sin_delta = (sin_alt * sin_phi + cos_alt * cos_phi * cos_az).clamp(-1.0, 1.0);
    let delta = sin_delta.asin();
    let cos_delta = (1.0 - sin_delta * sin_delta).max(0.0).sqrt().max(EPSILON);

    let sin_tau = -sin_az * cos_alt / cos_delta;
    let cos_tau = (sin_alt - sin_phi * sin_delta) / (cos_phi_safe * cos_delta);
    let tau = sin_tau.atan2(cos_tau);

    Equatorial {
        ra_deg: wrap_0_360(rad_to_deg(lst - tau)),
        dec_deg: clamp_90(rad_to_deg(delta)),
    }
}

/// Where an equatorial target appears for an observer at a sidereal time
///
/// Refraction is applied with `meteo` when given.
pub fn observe(
    eq: &Equatorial,
    sidereal: &Sidereal,
    observer: &GeoPoint,
    meteo: Option<&Meteo>,
) -> Horizontal {
    equatorial_to_horizontal(
        eq,
        sidereal.lst_deg(),
        observer.lat_deg,
        meteo.is_some(),
        meteo,
    )
}

/// Equatorial position of the direction an observer is aiming at
pub fn aim_to_equatorial(aim: &Horizontal, sidereal: &Sidereal, observer: &GeoPoint) -> Equatorial {
    horizontal_to_equatorial(aim, sidereal.lst_deg(), observer.lat_deg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_meridian_transit_reaches_zenith() {
        for lat in [-60.0, -10.0, 0.0, 35.0, 60.0] {
            let eq = Equatorial::new(123.0, lat);
            let hor = equatorial_to_horizontal(&eq, 123.0, lat, false, None);
            assert!(hor.alt_deg > 89.999, "lat {} alt {}", lat, hor.alt_deg);
        }
    }

    #[test]
    fn test_hour_angle_90_on_equator_is_horizon() {
        let eq = Equatorial::new(0.0, 0.0);
        let west = equatorial_to_horizontal(&eq, 90.0, 0.0, false, None);
        assert_abs_diff_eq!(west.alt_deg, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(west.az_deg, 270.0, epsilon = 1e-6);

        let east = equatorial_to_horizontal(&eq, 270.0, 0.0, false, None);
        assert_abs_diff_eq!(east.alt_deg, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(east.az_deg, 90.0, epsilon = 1e-6);
    }

    #[test]
    fn test_refraction_default_meteo() {
        assert_abs_diff_eq!(refraction_deg(10.0, &Meteo::default()), 0.0901, epsilon = 5e-4);
        assert_abs_diff_eq!(refraction_deg(0.0, &Meteo::default()), 0.4830, epsilon = 1e-3);
        assert_eq!(refraction_deg(-2.0, &Meteo::default()), 0.0);
    }

    #[test]
    fn test_refraction_scales_with_meteo() {
        let cold = Meteo {
            pressure_mbar: 1030.0,
            temperature_c: -20.0,
        };
        let r = refraction_deg(10.0, &cold);
        assert!(r > 0.1 && r < 0.2, "refraction {}", r);
    }

    #[test]
    fn test_refraction_adds_to_altitude() {
        let lat = 52.0;
        let lst = 80.0;
        let eq = horizontal_to_equatorial(&Horizontal::new(120.0, 10.0), lst, lat);

        let plain = equatorial_to_horizontal(&eq, lst, lat, false, None);
        let refracted = equatorial_to_horizontal(&eq, lst, lat, true, None);
        let delta = refracted.alt_deg - plain.alt_deg;
        assert_abs_diff_eq!(delta, 0.0901, epsilon = 1e-3);
        assert_abs_diff_eq!(refracted.az_deg, plain.az_deg, epsilon = 1e-12);

        let cold = Meteo {
            pressure_mbar: 1030.0,
            temperature_c: -20.0,
        };
        let cold_refracted = equatorial_to_horizontal(&eq, lst, lat, true, Some(&cold));
        let delta = cold_refracted.alt_deg - plain.alt_deg;
        assert!(delta > 0.1 && delta < 0.2, "delta {}", delta);
    }

    #[test]
    fn test_refraction_skipped_below_horizon() {
        let lat = 52.0;
        let lst = 80.0;
        let eq = horizontal_to_equatorial(&Horizontal::new(200.0, -5.0), lst, lat);
        let plain = equatorial_to_horizontal(&eq, lst, lat, false, None);
        let refracted = equatorial_to_horizontal(&eq, lst, lat, true, None);
        assert_eq!(plain.alt_deg, refracted.alt_deg);
    }

    #[test]
    fn test_pole_observer_stays_finite() {
        let eq = Equatorial::new(45.0, 30.0);
        let hor = equatorial_to_horizontal(&eq, 0.0, 90.0, false, None);
        assert!(hor.az_deg.is_finite());
        assert_abs_diff_eq!(hor.alt_deg, 30.0, epsilon = 1e-9);

        let back = horizontal_to_equatorial(&Horizontal::new(10.0, 45.0), 0.0, -90.0);
        assert!(back.ra_deg.is_finite());
        assert_abs_diff_eq!(back.dec_deg, -45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_observe_uses_sidereal_and_location() {
        let observer = GeoPoint::new(40.0, -74.0);
        let sidereal = Sidereal::from_degrees(200.0);
        let eq = Equatorial::new(200.0, 40.0);
        let hor = observe(&eq, &sidereal, &observer, None);
        assert!(hor.alt_deg > 89.999);

        let aim = Horizontal::new(135.0, 25.0);
        let target = aim_to_equatorial(&aim, &sidereal, &observer);
        let seen = observe(&target, &sidereal, &observer, None);
        assert_abs_diff_eq!(seen.alt_deg, 25.0, epsilon = 1e-6);
        assert_abs_diff_eq!(seen.az_deg, 135.0, epsilon = 1e-6);
    }
}
