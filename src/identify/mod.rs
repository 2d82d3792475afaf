//! Best-match identification of what the device is aimed at
//!
//! [`IdentifySolver`] asks a [`SkyCatalog`] for bright objects around the aim
//! direction and scores each candidate as
//!
//! ```text
//! score = separation − weight · (reference_mag − mag)
//! ```
//!
//! so a bright star slightly off-center beats a faint one dead-center. The
//! lowest score wins. When no candidate is in range the solver falls back to
//! the constellation containing the aim point, or `"UNKNOWN"`.
//!
//! The solver holds no mutable state and can be shared between threads.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::coordinates::angle::angular_separation_deg;
use crate::coordinates::Equatorial;

/// Default search radius in degrees
pub const DEFAULT_SEARCH_RADIUS_DEG: f64 = 5.0;
/// Default faintest magnitude considered
pub const DEFAULT_MAG_LIMIT: f64 = 5.5;
/// Default weight of the brightness term, degrees per magnitude
pub const DEFAULT_BRIGHTNESS_WEIGHT: f64 = 0.5;
/// Default magnitude at which the brightness term is zero
pub const DEFAULT_REFERENCE_MAG: f64 = 6.5;
/// Constellation code reported when no boundary contains the point
pub const UNKNOWN_CONSTELLATION: &str = "UNKNOWN";

/// Kind of resolved object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkyObjectType {
    Star,
    Planet,
    Moon,
    Constellation,
}

impl fmt::Display for SkyObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SkyObjectType::Star => "STAR",
            SkyObjectType::Planet => "PLANET",
            SkyObjectType::Moon => "MOON",
            SkyObjectType::Constellation => "CONSTELLATION",
        };
        f.write_str(label)
    }
}

/// An identified object
///
/// `id` is stable across catalog rebuilds as long as the source id is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkyObject {
    pub id: String,
    pub name: Option<String>,
    pub eq: Equatorial,
    pub mag: Option<f64>,
    #[serde(rename = "type")]
    pub object_type: SkyObjectType,
}

/// Outcome of an identification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum IdentifyResult {
    /// A catalog object near the aim direction
    Object(SkyObject),
    /// IAU code of the containing constellation, or [`UNKNOWN_CONSTELLATION`]
    Constellation(String),
}

/// Radius query over sky objects
pub trait SkyCatalog: Send + Sync {
    /// Objects within `radius_deg` of `center`, optionally no fainter than `mag_limit`
    fn nearby(&self, center: &Equatorial, radius_deg: f64, mag_limit: Option<f64>) -> Vec<SkyObject>;
}

/// Point-in-region lookup over constellation boundaries
pub trait ConstellationBoundaries: Send + Sync {
    /// IAU code of the region containing `eq`, if any
    fn find_by_point(&self, eq: &Equatorial) -> Option<String>;
}

impl<T: SkyCatalog + ?Sized> SkyCatalog for Arc<T> {
    fn nearby(&self, center: &Equatorial, radius_deg: f64, mag_limit: Option<f64>) -> Vec<SkyObject> {
        (**self).nearby(center, radius_deg, mag_limit)
    }
}

impl<T: ConstellationBoundaries + ?Sized> ConstellationBoundaries for Arc<T> {
    fn find_by_point(&self, eq: &Equatorial) -> Option<String> {
        (**self).find_by_point(eq)
    }
}

/// Picks the best object near an aim direction
#[derive(Clone)]
pub struct IdentifySolver {
    catalog: Arc<dyn SkyCatalog>,
    constellations: Arc<dyn ConstellationBoundaries>,
    brightness_weight: f64,
    reference_mag: f64,
}

impl fmt::Debug for IdentifySolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentifySolver")
            .field("brightness_weight", &self.brightness_weight)
            .field("reference_mag", &self.reference_mag)
            .finish_non_exhaustive()
    }
}

impl IdentifySolver {
    pub fn new(
        catalog: Arc<dyn SkyCatalog>,
        constellations: Arc<dyn ConstellationBoundaries>,
    ) -> Self {
        Self {
            catalog,
            constellations,
            brightness_weight: DEFAULT_BRIGHTNESS_WEIGHT,
            reference_mag: DEFAULT_REFERENCE_MAG,
        }
    }

    /// Overrides the brightness weight and reference magnitude
    pub fn with_scoring(mut self, brightness_weight: f64, reference_mag: f64) -> Self {
        self.brightness_weight = brightness_weight;
        self.reference_mag = reference_mag;
        self
    }

    /// Score of one candidate; lower is better
    ///
    /// A missing or NaN magnitude contributes no brightness boost.
    pub fn score(&self, center: &Equatorial, candidate: &SkyObject) -> f64 {
        let separation = angular_separation_deg(center, &candidate.eq);
        let boost = match candidate.mag {
            Some(mag) if !mag.is_nan() => self.reference_mag - mag,
            _ => 0.0,
        };
        separation - self.brightness_weight * boost
    }

    /// [`Self::find_best_with`] using the default radius and magnitude limit
    pub fn find_best(&self, center: &Equatorial) -> IdentifyResult {
        self.find_best_with(center, DEFAULT_SEARCH_RADIUS_DEG, Some(DEFAULT_MAG_LIMIT))
    }

    /// Best candidate within `radius_deg`, or the containing constellation
    ///
    /// Ties keep the candidate the catalog returned first.
    pub fn find_best_with(
        &self,
        center: &Equatorial,
        radius_deg: f64,
        mag_limit: Option<f64>,
    ) -> IdentifyResult {
        let candidates = self.catalog.nearby(center, radius_deg, mag_limit);

        let best = candidates
            .into_iter()
            .map(|candidate| (self.score(center, &candidate), candidate))
            .min_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        match best {
            Some((_, object)) => IdentifyResult::Object(object),
            None => {
                let code = self
                    .constellations
                    .find_by_point(center)
                    .unwrap_or_else(|| UNKNOWN_CONSTELLATION.to_string());
                IdentifyResult::Constellation(code)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ListCatalog(Vec<SkyObject>);

    impl SkyCatalog for ListCatalog {
        fn nearby(&self, center: &Equatorial, radius_deg: f64, mag_limit: Option<f64>) -> Vec<SkyObject> {
            self.0
                .iter()
                .filter(|o| angular_separation_deg(center, &o.eq) <= radius_deg)
                .filter(|o| match (mag_limit, o.mag) {
                    (Some(limit), Some(mag)) => mag <= limit,
                    _ => true,
                })
                .cloned()
                .collect()
        }
    }

    struct FixedBoundaries(Option<&'static str>);

    impl ConstellationBoundaries for FixedBoundaries {
        fn find_by_point(&self, _eq: &Equatorial) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    fn star(id: &str, ra: f64, dec: f64, mag: Option<f64>) -> SkyObject {
        SkyObject {
            id: id.to_string(),
            name: Some(id.to_string()),
            eq: Equatorial::new(ra, dec),
            mag,
            object_type: SkyObjectType::Star,
        }
    }

    fn solver(objects: Vec<SkyObject>, code: Option<&'static str>) -> IdentifySolver {
        IdentifySolver::new(Arc::new(ListCatalog(objects)), Arc::new(FixedBoundaries(code)))
    }

    #[test]
    fn test_center_hit_beats_dimmer_farther_star() {
        let s = solver(
            vec![star("far", 10.5, 10.0, Some(3.0)), star("center", 10.0, 10.0, Some(2.0))],
            None,
        );
        match s.find_best(&Equatorial::new(10.0, 10.0)) {
            IdentifyResult::Object(obj) => assert_eq!(obj.id, "center"),
            other => panic!("Expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_brightness_outweighs_small_offset() {
        // 1° away but 4 magnitudes brighter: 1 - 0.5*5.5 < 0 - 0.5*1.5
        let s = solver(
            vec![star("faint", 50.0, 0.0, Some(5.0)), star("bright", 51.0, 0.0, Some(1.0))],
            None,
        );
        match s.find_best(&Equatorial::new(50.0, 0.0)) {
            IdentifyResult::Object(obj) => assert_eq!(obj.id, "bright"),
            other => panic!("Expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_magnitude_gets_no_boost() {
        let s = solver(vec![star("nomag", 0.0, 0.0, None)], None);
        let center = Equatorial::new(1.0, 0.0);
        let score = s.score(&center, &star("nomag", 0.0, 0.0, None));
        assert!((score - 1.0).abs() < 1e-9);
        let nan_score = s.score(&center, &star("nan", 0.0, 0.0, Some(f64::NAN)));
        assert!((nan_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_ties_keep_first_candidate() {
        let s = solver(
            vec![star("first", 20.0, 0.0, Some(1.0)), star("second", 20.0, 0.0, Some(1.0))],
            None,
        );
        match s.find_best(&Equatorial::new(20.0, 0.0)) {
            IdentifyResult::Object(obj) => assert_eq!(obj.id, "first"),
            other => panic!("Expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_sky_falls_back_to_constellation() {
        let s = solver(vec![], Some("TUC"));
        assert_eq!(
            s.find_best(&Equatorial::new(30.0, -50.0)),
            IdentifyResult::Constellation("TUC".to_string())
        );

        let s = solver(vec![], None);
        assert_eq!(
            s.find_best(&Equatorial::new(30.0, -50.0)),
            IdentifyResult::Constellation(UNKNOWN_CONSTELLATION.to_string())
        );
    }

    #[test]
    fn test_custom_scoring_prefers_nearest() {
        let s = solver(
            vec![star("bright", 51.0, 0.0, Some(1.0)), star("faint", 50.1, 0.0, Some(5.0))],
            None,
        )
        .with_scoring(0.0, DEFAULT_REFERENCE_MAG);
        match s.find_best(&Equatorial::new(50.0, 0.0)) {
            IdentifyResult::Object(obj) => assert_eq!(obj.id, "faint"),
            other => panic!("Expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_result_serializes_with_kind_tag() {
        let json = serde_json::to_string(&IdentifyResult::Constellation("ORI".into())).unwrap();
        assert_eq!(json, r#"{"kind":"constellation","value":"ORI"}"#);
        let obj = star("x", 1.0, 2.0, Some(3.0));
        let json = serde_json::to_value(IdentifyResult::Object(obj)).unwrap();
        assert_eq!(json["value"]["type"], "STAR");
    }
}
