//! Runtime entry point over the packed catalogs
//!
//! [`CatalogRepository`] loads the star catalog and the constellation
//! boundaries once, falling back to the built-in catalogs when a file is
//! missing or rejected, and wires both into an [`IdentifySolver`].

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use log::info;
use serde::Serialize;

use super::adapter::{designation_label, CatalogAdapter};
use super::asset::{AssetProvider, FileAssetProvider};
use super::binary_catalog::{self, BinaryStarCatalog, StarCatalogMetadata};
use super::boundaries::{self, BinaryConstellationBoundaries, BoundaryMetadata};
use super::fake::{FakeConstellationBoundaries, FakeStarCatalog};
use super::{LoadStatus, StarCatalog, StarPosition};
use crate::coordinates::angle::angular_separation_deg;
use crate::coordinates::Equatorial;
use crate::identify::{ConstellationBoundaries, IdentifyResult, IdentifySolver, SkyCatalog};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "POINTTOSKY_DATA_DIR";

/// Default number of rows returned by [`CatalogRepository::probe`]
pub const DEFAULT_PROBE_RESULTS: usize = 8;

/// `$POINTTOSKY_DATA_DIR`, else `$HOME/.cache/pointtosky`
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".cache").join("pointtosky")
}

/// Where the catalog files live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    data_dir: PathBuf,
    star_path: String,
    boundaries_path: String,
}

impl CatalogConfig {
    pub fn new() -> Self {
        Self {
            data_dir: default_data_dir(),
            star_path: binary_catalog::DEFAULT_PATH.to_string(),
            boundaries_path: boundaries::DEFAULT_PATH.to_string(),
        }
    }

    pub fn with_data_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_star_path(mut self, path: &str) -> Self {
        self.star_path = path.to_string();
        self
    }

    pub fn with_boundaries_path(mut self, path: &str) -> Self {
        self.boundaries_path = path.to_string();
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn star_path(&self) -> &str {
        &self.star_path
    }

    pub fn boundaries_path(&self) -> &str {
        &self.boundaries_path
    }

    /// Filesystem provider rooted at the data directory
    pub fn asset_provider(&self) -> FileAssetProvider {
        FileAssetProvider::new(&self.data_dir)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// How the catalogs were obtained
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDiagnostics {
    pub star_path: String,
    pub star_status: LoadStatus<StarCatalogMetadata>,
    pub star_load_ms: f64,
    pub boundaries_path: String,
    pub boundary_status: LoadStatus<BoundaryMetadata>,
    pub boundary_load_ms: f64,
}

impl CatalogDiagnostics {
    /// The packed star catalog is in use
    pub fn catalog_ok(&self) -> bool {
        self.star_status.is_real()
    }

    /// The packed boundaries are in use
    pub fn boundaries_ok(&self) -> bool {
        self.boundary_status.is_real()
    }
}

/// One star found by [`CatalogRepository::probe`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    pub id: i32,
    pub name: Option<String>,
    pub designation: Option<String>,
    pub magnitude: f64,
    pub separation_deg: f64,
    pub constellation: Option<String>,
}

/// Outcome of one built-in sanity check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfTestResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

struct SelfTestCase {
    name: &'static str,
    center: Equatorial,
    expected_id: i32,
}

const SELF_TEST_RADIUS_DEG: f64 = 1.0;
const SELF_TEST_MAG_LIMIT: f64 = 2.0;

/// Loaded catalogs plus the solver built on them
pub struct CatalogRepository {
    stars: Arc<dyn StarCatalog>,
    boundaries: Arc<dyn ConstellationBoundaries>,
    adapter: Arc<CatalogAdapter>,
    solver: IdentifySolver,
    diagnostics: CatalogDiagnostics,
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

impl CatalogRepository {
    /// Loads both catalogs through `provider`, falling back per file
    pub fn load(provider: &dyn AssetProvider, star_path: &str, boundaries_path: &str) -> Self {
        let start = Instant::now();
        let stars = BinaryStarCatalog::load_or_fallback(
            provider,
            star_path,
            Arc::new(FakeStarCatalog::new()),
        );
        let star_load_ms = elapsed_ms(start);

        let start = Instant::now();
        let bounds = BinaryConstellationBoundaries::load_or_fallback(
            provider,
            boundaries_path,
            Arc::new(FakeConstellationBoundaries::new()),
        );
        let boundary_load_ms = elapsed_ms(start);

        let diagnostics = CatalogDiagnostics {
            star_path: star_path.to_string(),
            star_status: stars.status,
            star_load_ms,
            boundaries_path: boundaries_path.to_string(),
            boundary_status: bounds.status,
            boundary_load_ms,
        };
        info!(
            "Catalog repository ready: stars {} ({:.1} ms), boundaries {} ({:.1} ms)",
            if diagnostics.catalog_ok() { "packed" } else { "fallback" },
            star_load_ms,
            if diagnostics.boundaries_ok() { "packed" } else { "fallback" },
            boundary_load_ms
        );

        let adapter = Arc::new(CatalogAdapter::new(stars.catalog.clone(), bounds.catalog.clone()));
        let solver = IdentifySolver::new(adapter.clone(), adapter.clone());
        Self {
            stars: stars.catalog,
            boundaries: bounds.catalog,
            adapter,
            solver,
            diagnostics,
        }
    }

    /// Loads the files named by `config` from its data directory
    pub fn from_config(config: &CatalogConfig) -> Self {
        let provider = config.asset_provider();
        Self::load(&provider, config.star_path(), config.boundaries_path())
    }

    pub fn diagnostics(&self) -> &CatalogDiagnostics {
        &self.diagnostics
    }

    pub fn star_catalog(&self) -> &Arc<dyn StarCatalog> {
        &self.stars
    }

    pub fn boundaries(&self) -> &Arc<dyn ConstellationBoundaries> {
        &self.boundaries
    }

    pub fn sky_catalog(&self) -> Arc<dyn SkyCatalog> {
        self.adapter.clone()
    }

    pub fn solver(&self) -> &IdentifySolver {
        &self.solver
    }

    /// Best object or constellation at `center` with default search settings
    pub fn identify(&self, center: &Equatorial) -> IdentifyResult {
        self.solver.find_best(center)
    }

    /// Up to `max_results` stars near `center`, nearest first
    pub fn probe(
        &self,
        center: &Equatorial,
        radius_deg: f64,
        mag_limit: Option<f64>,
        max_results: usize,
    ) -> Vec<ProbeResult> {
        if radius_deg <= 0.0 {
            return Vec::new();
        }
        self.stars
            .nearby(center, radius_deg, mag_limit)
            .into_iter()
            .take(max_results)
            .map(|star| ProbeResult {
                id: star.id,
                separation_deg: angular_separation_deg(center, &star.equatorial()),
                designation: designation_label(&star),
                magnitude: star.mag as f64,
                name: star.name,
                constellation: star.constellation,
            })
            .collect()
    }

    /// Checks three bright stars and one constellation lookup
    pub fn run_self_test(&self) -> Vec<SelfTestResult> {
        let cases = [
            SelfTestCase {
                name: "Sirius proximity",
                center: Equatorial::new(101.3, -16.7),
                expected_id: 32349,
            },
            SelfTestCase {
                name: "Arcturus proximity",
                center: Equatorial::new(213.9, 19.2),
                expected_id: 69673,
            },
            SelfTestCase {
                name: "Rigel proximity",
                center: Equatorial::new(78.6, -8.2),
                expected_id: 24436,
            },
        ];

        let mut results: Vec<SelfTestResult> = cases
            .iter()
            .map(|case| {
                let found =
                    self.probe(&case.center, SELF_TEST_RADIUS_DEG, Some(SELF_TEST_MAG_LIMIT), 1);
                let hit = found.first();
                SelfTestResult {
                    name: case.name.to_string(),
                    passed: hit.map(|h| h.id) == Some(case.expected_id),
                    detail: hit
                        .map(|h| format!("hit={}, sep={:.2}°", h.id, h.separation_deg))
                        .unwrap_or_else(|| "no-match".to_string()),
                }
            })
            .collect();

        let code = self.boundaries.find_by_point(&Equatorial::new(90.0, 0.0));
        results.push(SelfTestResult {
            name: "Constellation lookup".to_string(),
            passed: code.as_deref() == Some("ORI"),
            detail: code.unwrap_or_else(|| "none".to_string()),
        });
        results
    }
}
