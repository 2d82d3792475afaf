//! Exposes the star catalog and boundaries to the identify solver

use std::sync::Arc;

use super::{Star, StarCatalog, StarPosition};
use crate::coordinates::Equatorial;
use crate::identify::{ConstellationBoundaries, SkyCatalog, SkyObject, SkyObjectType};

/// Wraps a [`StarCatalog`] and a boundary set as solver collaborators
#[derive(Clone)]
pub struct CatalogAdapter {
    stars: Arc<dyn StarCatalog>,
    boundaries: Arc<dyn ConstellationBoundaries>,
}

impl CatalogAdapter {
    pub fn new(stars: Arc<dyn StarCatalog>, boundaries: Arc<dyn ConstellationBoundaries>) -> Self {
        Self { stars, boundaries }
    }
}

/// Label shown for a star: proper name, else its designation
pub fn display_name(star: &Star) -> Option<String> {
    star.name
        .as_deref()
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or_else(|| designation_label(star))
}

/// Bayer letter with constellation, else the Flamsteed designation
///
/// Flamsteed designations already carry the constellation; it is only
/// appended when missing.
pub fn designation_label(star: &Star) -> Option<String> {
    let con = star.constellation.as_deref().filter(|c| !c.is_empty());
    if let Some(bayer) = star.bayer.as_deref().filter(|b| !b.is_empty()) {
        return Some(match con {
            Some(con) => format!("{} {}", bayer, con),
            None => bayer.to_string(),
        });
    }
    star.flamsteed
        .as_deref()
        .filter(|f| !f.is_empty())
        .map(|flamsteed| match con {
            Some(con) if !flamsteed.to_ascii_uppercase().ends_with(&con.to_ascii_uppercase()) => {
                format!("{} {}", flamsteed, con)
            }
            _ => flamsteed.to_string(),
        })
}

fn to_sky_object(star: &Star) -> SkyObject {
    SkyObject {
        id: format!("star-{}", star.id),
        name: display_name(star),
        eq: star.equatorial(),
        mag: Some(star.mag as f64),
        object_type: SkyObjectType::Star,
    }
}

impl SkyCatalog for CatalogAdapter {
    fn nearby(&self, center: &Equatorial, radius_deg: f64, mag_limit: Option<f64>) -> Vec<SkyObject> {
        self.stars
            .nearby(center, radius_deg, mag_limit)
            .iter()
            .map(to_sky_object)
            .collect()
    }
}

impl ConstellationBoundaries for CatalogAdapter {
    fn find_by_point(&self, eq: &Equatorial) -> Option<String> {
        self.boundaries.find_by_point(eq)
    }
}
