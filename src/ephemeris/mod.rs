//! Low-order ephemerides for the Sun, Moon, Jupiter and Saturn
//!
//! Mean orbital elements with linear rates from day 0 of 2000 (JD
//! 2451543.5), a Newton solve of Kepler's equation, the largest lunar and
//! Jupiter/Saturn perturbation terms and the mean obliquity of the
//! ecliptic. Accuracy is a few tenths of a degree, good enough to label a
//! bright object in the sky, and positions are geocentric.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::constants::{DAYS_PER_JULIAN_CENTURY, DEG2RAD, EARTH_RADIUS_AU, JD_2000_JAN_0, RAD2DEG};
use crate::coordinates::angle::wrap_0_360;
use crate::coordinates::Equatorial;
use crate::time::julian_day;

/// Bodies the simple model knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Body {
    Sun,
    Moon,
    Jupiter,
    Saturn,
}

impl Body {
    pub const ALL: [Body; 4] = [Body::Sun, Body::Moon, Body::Jupiter, Body::Saturn];

    pub fn name(&self) -> &'static str {
        match self {
            Body::Sun => "SUN",
            Body::Moon => "MOON",
            Body::Jupiter => "JUPITER",
            Body::Saturn => "SATURN",
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Body {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Body::ALL
            .into_iter()
            .find(|body| body.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Unsupported body: '{}'. Expected one of SUN, MOON, JUPITER, SATURN",
                    s
                )
            })
    }
}

/// Apparent geocentric position of a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ephemeris {
    pub eq: Equatorial,
    /// Geocentric distance, absent when the model does not provide one
    pub distance_au: Option<f64>,
    /// Illuminated fraction in `[0, 1]`, Moon only
    pub phase: Option<f64>,
}

/// Source of body positions
pub trait EphemerisComputer {
    fn compute(&self, body: Body, instant: &DateTime<Utc>) -> Ephemeris;
}

struct OrbitalElements {
    node: (f64, f64),
    inclination: (f64, f64),
    perihelion: (f64, f64),
    semi_major_axis: f64,
    eccentricity: (f64, f64),
    mean_anomaly: (f64, f64),
}

impl OrbitalElements {
    fn mean_anomaly_deg(&self, d: f64) -> f64 {
        wrap_0_360(self.mean_anomaly.0 + self.mean_anomaly.1 * d)
    }
}

const JUPITER: OrbitalElements = OrbitalElements {
    node: (100.4542, 2.76854e-5),
    inclination: (1.3030, -1.557e-7),
    perihelion: (273.8777, 1.64505e-5),
    semi_major_axis: 5.20256,
    eccentricity: (0.048498, 4.469e-9),
    mean_anomaly: (19.8950, 0.0830853001),
};

const SATURN: OrbitalElements = OrbitalElements {
    node: (113.6634, 2.38980e-5),
    inclination: (2.4886, -1.081e-7),
    perihelion: (339.3939, 2.97661e-5),
    semi_major_axis: 9.55475,
    eccentricity: (0.055546, -9.499e-9),
    mean_anomaly: (316.9670, 0.0334442282),
};

/// Eccentric anomaly for mean anomaly `m` (radians)
fn solve_kepler(m: f64, e: f64, tolerance: f64) -> f64 {
    let mut ecc = m + e * m.sin() * (1.0 + e * m.cos());
    for _ in 0..50 {
        let delta = (ecc - e * ecc.sin() - m) / (1.0 - e * ecc.cos());
        ecc -= delta;
        if delta.abs() <= tolerance {
            break;
        }
    }
    ecc
}

/// Mean obliquity of the ecliptic in degrees
pub fn mean_obliquity_deg(d: f64) -> f64 {
    let t = d / DAYS_PER_JULIAN_CENTURY;
    23.439291 - 0.0130042 * t - 1.64e-7 * t * t + 5.04e-7 * t * t * t
}

/// Ecliptic rectangular coordinates rotated to equatorial RA/Dec
fn ecliptic_to_equatorial(x: f64, y: f64, z: f64, obliquity_rad: f64) -> Equatorial {
    let (sin_e, cos_e) = obliquity_rad.sin_cos();
    let ye = y * cos_e - z * sin_e;
    let ze = y * sin_e + z * cos_e;
    Equatorial::new(
        wrap_0_360(ye.atan2(x) * RAD2DEG),
        ze.atan2(x.hypot(ye)) * RAD2DEG,
    )
}

/// Position in the orbital plane rotated to ecliptic longitude/latitude
///
/// Returns `(longitude_deg, latitude_deg, radius)`.
fn orbit_to_ecliptic(
    semi_major_axis: f64,
    e: f64,
    mean_anomaly_deg: f64,
    node_deg: f64,
    inclination_deg: f64,
    perihelion_deg: f64,
    tolerance: f64,
) -> (f64, f64, f64) {
    let ecc = solve_kepler(mean_anomaly_deg * DEG2RAD, e, tolerance);
    let xv = semi_major_axis * (ecc.cos() - e);
    let yv = semi_major_axis * (1.0 - e * e).sqrt() * ecc.sin();
    let v = yv.atan2(xv);
    let r = xv.hypot(yv);

    let (sin_n, cos_n) = (node_deg * DEG2RAD).sin_cos();
    let (sin_i, cos_i) = (inclination_deg * DEG2RAD).sin_cos();
    let (sin_vw, cos_vw) = (v + perihelion_deg * DEG2RAD).sin_cos();

    let xh = r * (cos_n * cos_vw - sin_n * sin_vw * cos_i);
    let yh = r * (sin_n * cos_vw + cos_n * sin_vw * cos_i);
    let zh = r * sin_vw * sin_i;

    (
        wrap_0_360(yh.atan2(xh) * RAD2DEG),
        zh.atan2(xh.hypot(yh)) * RAD2DEG,
        r,
    )
}

fn spherical_to_rect(lon_deg: f64, lat_deg: f64, r: f64) -> (f64, f64, f64) {
    let (sin_lon, cos_lon) = (lon_deg * DEG2RAD).sin_cos();
    let (sin_lat, cos_lat) = (lat_deg * DEG2RAD).sin_cos();
    (r * cos_lon * cos_lat, r * sin_lon * cos_lat, r * sin_lat)
}

struct SunState {
    eq: Equatorial,
    distance_au: f64,
    longitude_deg: f64,
    mean_anomaly_deg: f64,
    perihelion_deg: f64,
}

fn sun_state(d: f64, obliquity_rad: f64) -> SunState {
    let perihelion_deg = 282.9404 + 4.70935e-5 * d;
    let e = 0.016709 - 1.151e-9 * d;
    let mean_anomaly_deg = wrap_0_360(356.0470 + 0.9856002585 * d);

    let ecc = solve_kepler(mean_anomaly_deg * DEG2RAD, e, 1e-12);
    let xv = ecc.cos() - e;
    let yv = (1.0 - e * e).sqrt() * ecc.sin();
    let r = xv.hypot(yv);
    let longitude_deg = wrap_0_360(yv.atan2(xv) * RAD2DEG + perihelion_deg);

    let (x, y, z) = spherical_to_rect(longitude_deg, 0.0, r);
    SunState {
        eq: ecliptic_to_equatorial(x, y, z, obliquity_rad),
        distance_au: r,
        longitude_deg,
        mean_anomaly_deg,
        perihelion_deg,
    }
}

fn moon(d: f64, obliquity_rad: f64, sun: &SunState) -> Ephemeris {
    let node = wrap_0_360(125.1228 - 0.0529538083 * d);
    let perigee = wrap_0_360(318.0634 + 0.1643573223 * d);
    let m_moon = wrap_0_360(115.3654 + 13.0649929509 * d);
    let (mut lon, mut lat, mut r) =
        orbit_to_ecliptic(60.2666, 0.0549, m_moon, node, 5.1454, perigee, 1e-10);

    let sun_lon = wrap_0_360(sun.mean_anomaly_deg + sun.perihelion_deg);
    let moon_lon = wrap_0_360(m_moon + perigee + node);
    let elong = wrap_0_360(moon_lon - sun_lon) * DEG2RAD;
    let arg_lat = wrap_0_360(moon_lon - node) * DEG2RAD;
    let ms = sun.mean_anomaly_deg * DEG2RAD;
    let mm = m_moon * DEG2RAD;

    lon += -1.274 * (mm - 2.0 * elong).sin()
        + 0.658 * (2.0 * elong).sin()
        - 0.186 * ms.sin()
        - 0.059 * (2.0 * mm - 2.0 * elong).sin()
        - 0.057 * (mm - 2.0 * elong + ms).sin()
        + 0.053 * (mm + 2.0 * elong).sin()
        + 0.046 * (2.0 * elong - ms).sin()
        + 0.041 * (mm - ms).sin()
        - 0.035 * elong.sin()
        - 0.031 * (mm + ms).sin()
        - 0.015 * (2.0 * arg_lat - 2.0 * elong).sin()
        + 0.011 * (mm - 4.0 * elong).sin();
    let lon = wrap_0_360(lon);

    lat += -0.173 * (arg_lat - 2.0 * elong).sin()
        - 0.055 * (mm - arg_lat - 2.0 * elong).sin()
        - 0.046 * (mm + arg_lat - 2.0 * elong).sin()
        + 0.033 * (arg_lat + 2.0 * elong).sin()
        + 0.017 * (2.0 * mm + arg_lat).sin();

    // Earth radii
    r += -0.58 * (mm - 2.0 * elong).cos() - 0.46 * (2.0 * elong).cos();

    let (x, y, z) = spherical_to_rect(lon, lat, r);
    let elongation = wrap_0_360(lon - sun.longitude_deg) * DEG2RAD;
    let phase = (0.5 * (1.0 - elongation.cos())).clamp(0.0, 1.0);

    Ephemeris {
        eq: ecliptic_to_equatorial(x, y, z, obliquity_rad),
        distance_au: Some(r * EARTH_RADIUS_AU),
        phase: Some(phase),
    }
}

fn jupiter_perturbations(lon: f64, lat: f64, mj: f64, ms: f64) -> (f64, f64) {
    let lon = lon - 0.332 * (2.0 * mj - 5.0 * ms - 67.6 * DEG2RAD).sin()
        - 0.056 * (2.0 * mj - 2.0 * ms + 21.0 * DEG2RAD).sin()
        + 0.042 * (3.0 * mj - 5.0 * ms + 21.0 * DEG2RAD).sin()
        - 0.036 * (mj - 2.0 * ms).sin()
        + 0.022 * (mj - ms).cos()
        + 0.023 * (2.0 * mj - 3.0 * ms + 52.0 * DEG2RAD).sin()
        - 0.016 * (mj - 5.0 * ms - 69.0 * DEG2RAD).sin();
    (wrap_0_360(lon), lat)
}

fn saturn_perturbations(lon: f64, lat: f64, mj: f64, ms: f64) -> (f64, f64) {
    let lon = lon + 0.812 * (2.0 * mj - 5.0 * ms - 67.6 * DEG2RAD).sin()
        - 0.229 * (2.0 * mj - 4.0 * ms - 2.0 * DEG2RAD).cos()
        + 0.119 * (mj - 2.0 * ms - 3.0 * DEG2RAD).sin()
        + 0.046 * (2.0 * mj - 6.0 * ms - 69.0 * DEG2RAD).sin()
        + 0.014 * (mj - 3.0 * ms + 32.0 * DEG2RAD).sin();
    let lat = lat - 0.020 * (2.0 * mj - 4.0 * ms - 2.0 * DEG2RAD).cos()
        + 0.018 * (2.0 * mj - 6.0 * ms - 49.0 * DEG2RAD).sin();
    (wrap_0_360(lon), lat)
}

fn planet(d: f64, obliquity_rad: f64, sun: &SunState, body: Body) -> Ephemeris {
    let (elements, perturb): (&OrbitalElements, fn(f64, f64, f64, f64) -> (f64, f64)) =
        match body {
            Body::Saturn => (&SATURN, saturn_perturbations),
            _ => (&JUPITER, jupiter_perturbations),
        };

    let (lon, lat, r) = orbit_to_ecliptic(
        elements.semi_major_axis,
        elements.eccentricity.0 + elements.eccentricity.1 * d,
        elements.mean_anomaly_deg(d),
        wrap_0_360(elements.node.0 + elements.node.1 * d),
        elements.inclination.0 + elements.inclination.1 * d,
        wrap_0_360(elements.perihelion.0 + elements.perihelion.1 * d),
        1e-12,
    );
    let mj = JUPITER.mean_anomaly_deg(d) * DEG2RAD;
    let ms = SATURN.mean_anomaly_deg(d) * DEG2RAD;
    let (lon, lat) = perturb(lon, lat, mj, ms);

    // Heliocentric planet plus geocentric Sun gives geocentric planet
    let (x, y, z) = spherical_to_rect(lon, lat, r);
    let (xs, ys, _) = spherical_to_rect(sun.longitude_deg, 0.0, sun.distance_au);
    let (xg, yg, zg) = (x + xs, y + ys, z);

    Ephemeris {
        eq: ecliptic_to_equatorial(xg, yg, zg, obliquity_rad),
        distance_au: Some((xg * xg + yg * yg + zg * zg).sqrt()),
        phase: None,
    }
}

/// The low-order model described in the module docs
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleEphemerisComputer;

impl SimpleEphemerisComputer {
    pub fn new() -> Self {
        Self
    }
}

impl EphemerisComputer for SimpleEphemerisComputer {
    fn compute(&self, body: Body, instant: &DateTime<Utc>) -> Ephemeris {
        let d = julian_day(instant) - JD_2000_JAN_0;
        let obliquity_rad = mean_obliquity_deg(d) * DEG2RAD;
        let sun = sun_state(d, obliquity_rad);

        match body {
            Body::Sun => Ephemeris {
                eq: sun.eq,
                distance_au: Some(sun.distance_au),
                phase: None,
            },
            Body::Moon => moon(d, obliquity_rad, &sun),
            Body::Jupiter | Body::Saturn => planet(d, obliquity_rad, &sun, body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::parse_instant;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    /// Positions of date; the model is J2000-ish so precession alone
    /// accounts for roughly 0.35° in 2025
    #[rstest]
    #[case(Body::Sun, "2025-01-01T00:00:00Z", 281.3816, -23.0238, 0.98335, 0.02)]
    #[case(Body::Moon, "2025-01-01T00:00:00Z", 296.2990, -25.9205, 0.0025518, 0.0004)]
    #[case(Body::Jupiter, "2025-01-01T00:00:00Z", 71.5094, 21.7414, 4.19075, 0.2)]
    #[case(Body::Saturn, "2025-01-01T00:00:00Z", 346.1911, -8.0515, 10.02533, 0.3)]
    #[case(Body::Sun, "2025-06-01T00:00:00Z", 68.8056, 22.0066, 1.01397, 0.02)]
    #[case(Body::Moon, "2025-06-01T00:00:00Z", 138.5795, 19.2996, 0.0025658, 0.0004)]
    #[case(Body::Jupiter, "2025-06-01T00:00:00Z", 87.4359, 23.2362, 6.09403, 0.3)]
    #[case(Body::Saturn, "2025-06-01T00:00:00Z", 0.9580, -1.8814, 9.87856, 0.3)]
    fn test_reference_positions(
        #[case] body: Body,
        #[case] instant: &str,
        #[case] ra: f64,
        #[case] dec: f64,
        #[case] distance: f64,
        #[case] distance_tolerance: f64,
    ) {
        let instant = parse_instant(instant).unwrap();
        let eph = SimpleEphemerisComputer::new().compute(body, &instant);
        let separation = eph.eq.separation_deg(&Equatorial::new(ra, dec));
        assert!(separation < 0.5, "{} off by {}°", body, separation);
        assert_abs_diff_eq!(eph.distance_au.unwrap(), distance, epsilon = distance_tolerance);
        assert_eq!(eph.phase.is_some(), body == Body::Moon);
    }

    #[test]
    fn test_sun_near_equator_at_equinox() {
        let instant = parse_instant("2025-03-20T00:00:00Z").unwrap();
        let sun = SimpleEphemerisComputer::new().compute(Body::Sun, &instant);
        assert!(sun.eq.dec_deg.abs() < 0.5);
    }

    #[test]
    fn test_moon_phase() {
        let computer = SimpleEphemerisComputer::new();
        // Two days after the new moon of 2024-12-30
        let new_moon = computer.compute(Body::Moon, &parse_instant("2025-01-01T00:00:00Z").unwrap());
        assert!(new_moon.phase.unwrap() < 0.05);
        let crescent = computer.compute(Body::Moon, &parse_instant("2025-06-01T00:00:00Z").unwrap());
        let phase = crescent.phase.unwrap();
        assert!(phase > 0.2 && phase < 0.4, "phase {}", phase);
    }

    #[test]
    fn test_kepler_solution() {
        let e = 0.2;
        let m = 1.0;
        let ecc = solve_kepler(m, e, 1e-14);
        assert_abs_diff_eq!(ecc - e * ecc.sin(), m, epsilon = 1e-12);
        assert_eq!(solve_kepler(0.0, e, 1e-14), 0.0);
    }

    #[test]
    fn test_body_names() {
        assert_eq!("moon".parse::<Body>().unwrap(), Body::Moon);
        assert_eq!(" Saturn ".parse::<Body>().unwrap(), Body::Saturn);
        assert_eq!(Body::Jupiter.to_string(), "JUPITER");
        assert!("pluto".parse::<Body>().unwrap_err().contains("pluto"));
    }

    #[test]
    fn test_obliquity_at_epoch() {
        assert_abs_diff_eq!(mean_obliquity_deg(0.0), 23.439291, epsilon = 1e-12);
        assert!(mean_obliquity_deg(36525.0) < mean_obliquity_deg(0.0));
    }
}
