//! Built-in catalogs used when the binary files are missing or rejected
//!
//! They are small enough to scan linearly and are good for demos and tests.

use std::cmp::Ordering;

use super::{Star, StarCatalog, StarPosition};
use crate::coordinates::angle::{angular_separation_deg, wrap_0_360};
use crate::coordinates::Equatorial;
use crate::identify::{ConstellationBoundaries, SkyCatalog, SkyObject, SkyObjectType};

/// Twenty bright stars keyed by Hipparcos number
#[derive(Debug, Clone)]
pub struct FakeStarCatalog {
    stars: Vec<Star>,
}

type BrightStar = (i32, f32, f32, f32, &'static str, &'static str, Option<&'static str>, &'static str);

const BRIGHT_STARS: [BrightStar; 20] = [
    (32349, 101.287, -16.716, -1.46, "Sirius", "α", Some("9 CMA"), "CMA"),
    (30438, 95.987, -52.695, -0.74, "Canopus", "α", None, "CAR"),
    (69673, 213.915, 19.182, -0.05, "Arcturus", "α", Some("16 BOO"), "BOO"),
    (71683, 219.902, -60.835, -0.27, "Alpha Centauri", "α", None, "CEN"),
    (91262, 279.234, 38.783, 0.03, "Vega", "α", Some("3 LYR"), "LYR"),
    (24608, 79.172, 45.997, 0.08, "Capella", "α", Some("13 AUR"), "AUR"),
    (24436, 78.634, -8.205, 0.18, "Rigel", "β", Some("19 ORI"), "ORI"),
    (27989, 88.793, 7.407, 0.42, "Betelgeuse", "α", Some("58 ORI"), "ORI"),
    (37279, 114.825, 5.225, 0.38, "Procyon", "α", Some("10 CMI"), "CMI"),
    (7588, 24.428, -57.236, 0.46, "Achernar", "α", None, "ERI"),
    (68702, 210.955, -60.373, 0.61, "Hadar", "β", None, "CEN"),
    (97649, 297.695, 8.868, 0.77, "Altair", "α", Some("53 AQL"), "AQL"),
    (21421, 68.980, 16.509, 0.87, "Aldebaran", "α", Some("87 TAU"), "TAU"),
    (80763, 247.351, -26.432, 1.06, "Antares", "α", Some("21 SCO"), "SCO"),
    (65474, 201.298, -11.161, 0.98, "Spica", "α", Some("67 VIR"), "VIR"),
    (37826, 116.329, 28.026, 1.14, "Pollux", "β", Some("78 GEM"), "GEM"),
    (113368, 344.412, -29.622, 1.16, "Fomalhaut", "α", Some("24 PSA"), "PSA"),
    (102098, 310.358, 45.280, 1.25, "Deneb", "α", Some("50 CYG"), "CYG"),
    (49669, 152.093, 11.967, 1.35, "Regulus", "α", Some("32 LEO"), "LEO"),
    (11767, 37.954, 89.264, 1.97, "Polaris", "α", Some("1 UMI"), "UMI"),
];

impl FakeStarCatalog {
    pub fn new() -> Self {
        let stars = BRIGHT_STARS
            .iter()
            .map(|&(id, ra_deg, dec_deg, mag, name, bayer, flamsteed, con)| Star {
                id,
                ra_deg,
                dec_deg,
                mag,
                name: Some(name.to_string()),
                bayer: Some(bayer.to_string()),
                flamsteed: flamsteed.map(str::to_string),
                constellation: Some(con.to_string()),
            })
            .collect();
        Self { stars }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }
}

impl Default for FakeStarCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl StarCatalog for FakeStarCatalog {
    fn nearby(&self, center: &Equatorial, radius_deg: f64, mag_limit: Option<f64>) -> Vec<Star> {
        let mut hits: Vec<(f64, &Star)> = self
            .stars
            .iter()
            .filter(|star| mag_limit.map_or(true, |limit| star.mag as f64 <= limit))
            .map(|star| (angular_separation_deg(center, &star.equatorial()), star))
            .filter(|(separation, _)| *separation <= radius_deg)
            .collect();
        hits.sort_by(|(a, sa), (b, sb)| {
            a.partial_cmp(b)
                .unwrap_or(Ordering::Equal)
                .then_with(|| sa.mag.total_cmp(&sb.mag))
        });
        hits.into_iter().map(|(_, star)| star.clone()).collect()
    }
}

struct FakeBox {
    code: &'static str,
    min_ra: f64,
    max_ra: f64,
    min_dec: f64,
    max_dec: f64,
}

impl FakeBox {
    fn contains(&self, eq: &Equatorial) -> bool {
        let ra = wrap_0_360(eq.ra_deg);
        let ra_matches = if self.min_ra <= self.max_ra {
            (self.min_ra..=self.max_ra).contains(&ra)
        } else {
            ra >= self.min_ra || ra <= self.max_ra
        };
        ra_matches && (self.min_dec..=self.max_dec).contains(&eq.dec_deg)
    }
}

const FAKE_BOXES: [FakeBox; 6] = [
    FakeBox { code: "ORI", min_ra: 70.0, max_ra: 100.0, min_dec: -20.0, max_dec: 30.0 },
    FakeBox { code: "CMA", min_ra: 90.0, max_ra: 130.0, min_dec: -35.0, max_dec: 5.0 },
    FakeBox { code: "LYR", min_ra: 270.0, max_ra: 300.0, min_dec: 25.0, max_dec: 50.0 },
    FakeBox { code: "CYG", min_ra: 285.0, max_ra: 330.0, min_dec: 30.0, max_dec: 55.0 },
    FakeBox { code: "TUC", min_ra: 330.0, max_ra: 40.0, min_dec: -75.0, max_dec: -25.0 },
    FakeBox { code: "UMA", min_ra: 140.0, max_ra: 210.0, min_dec: 30.0, max_dec: 75.0 },
];

/// A handful of coarse rectangular constellation regions
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeConstellationBoundaries;

impl FakeConstellationBoundaries {
    pub fn new() -> Self {
        Self
    }
}

impl ConstellationBoundaries for FakeConstellationBoundaries {
    fn find_by_point(&self, eq: &Equatorial) -> Option<String> {
        FAKE_BOXES
            .iter()
            .find(|b| b.contains(eq))
            .map(|b| b.code.to_string())
    }
}

/// Sky catalog that always offers one placeholder object
#[derive(Debug, Clone)]
pub struct FakeSkyCatalog {
    placeholder: SkyObject,
}

impl FakeSkyCatalog {
    pub fn new() -> Self {
        Self {
            placeholder: SkyObject {
                id: "debug-star".to_string(),
                name: Some("Debug Star".to_string()),
                eq: Equatorial::new(0.0, 0.0),
                mag: Some(1.0),
                object_type: SkyObjectType::Star,
            },
        }
    }

    pub fn placeholder(&self) -> &SkyObject {
        &self.placeholder
    }
}

impl Default for FakeSkyCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl SkyCatalog for FakeSkyCatalog {
    fn nearby(&self, _center: &Equatorial, radius_deg: f64, mag_limit: Option<f64>) -> Vec<SkyObject> {
        let passes_mag = match (mag_limit, self.placeholder.mag) {
            (Some(limit), Some(mag)) => mag <= limit,
            _ => true,
        };
        if radius_deg >= 0.0 && passes_mag {
            vec![self.placeholder.clone()]
        } else {
            Vec::new()
        }
    }
}
