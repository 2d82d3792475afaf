//! Constellation boundary packer
//!
//! Input is an IAU ASCII edge list, one edge per line:
//!
//! ```text
//! ORI 5.000 -10.0 6.000 -10.0
//! ```
//!
//! The code is the first three letters; the next four numbers are the edge
//! end points. RA is taken as hours when no value in the file exceeds 24.1.
//! Edges are chained into closed polygons, simplified with
//! Ramer-Douglas-Peucker and written as one RA/Dec box per polygon.

use std::collections::HashMap;
use std::io::BufRead;

use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use serde::Serialize;

use crate::catalogs::boundaries::{encode_boundaries, BoundaryBox};
use crate::catalogs::constellation_index;
use crate::catalogs::header::{payload_crc32, BoundaryHeader};
use crate::constants::DEG_PER_HOUR;
use crate::coordinates::angle::wrap_0_360;
use crate::errors::PackError;

lazy_static! {
    static ref NUMBER: Regex = Regex::new(r"[-+]?\d+(?:\.\d+)?").unwrap();
}

/// Largest RA seen in an hours-based file
const HOURS_DETECTION_LIMIT: f64 = 24.1;
/// Vertices closer than this are the same vertex
const VERTEX_TOLERANCE: f64 = 1e-6;
const QUANTIZE_SCALE: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub ra: f64,
    pub dec: f64,
}

impl Vertex {
    pub fn new(ra: f64, dec: f64) -> Self {
        Self { ra, dec }
    }

    fn key(&self) -> (i64, i64) {
        (
            (self.ra * QUANTIZE_SCALE).round() as i64,
            (self.dec * QUANTIZE_SCALE).round() as i64,
        )
    }

    fn approx_eq(&self, other: &Vertex) -> bool {
        (self.ra - other.ra).abs() < VERTEX_TOLERANCE
            && (self.dec - other.dec).abs() < VERTEX_TOLERANCE
    }

    fn distance(&self, other: &Vertex) -> f64 {
        (self.ra - other.ra).hypot(self.dec - other.dec)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub start: Vertex,
    pub end: Vertex,
}

/// All edges of one constellation, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedConstellation {
    pub code: String,
    pub edges: Vec<Edge>,
}

fn parse_code(line: &str) -> Option<String> {
    let head = line.get(..3)?;
    head.chars()
        .all(|c| c.is_ascii_alphabetic())
        .then(|| head.to_ascii_uppercase())
}

/// Parses an IAU ASCII edge list
///
/// Comments (`#`, `//`) and lines without a leading code are ignored. A
/// coded line with fewer than four numbers fails the whole parse.
pub fn parse_iau_ascii<R: BufRead>(reader: R) -> Result<Vec<ParsedConstellation>, PackError> {
    let mut parsed: Vec<ParsedConstellation> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut max_ra = f64::NEG_INFINITY;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let content = line.split('#').next().unwrap_or_default();
        let content = content.split("//").next().unwrap_or_default();
        let content = content.replace([';', ','], " ");
        let content = content.trim();
        if content.is_empty() {
            continue;
        }
        let Some(code) = parse_code(content) else {
            debug!("Ignoring boundary line {}: {:?}", i + 1, line);
            continue;
        };

        // Numbers after the code token, so "SER1" does not yield a 1
        let rest = content
            .split_once(char::is_whitespace)
            .map_or("", |(_, rest)| rest);
        let numbers: Vec<f64> = NUMBER
            .find_iter(rest)
            .filter_map(|m| m.as_str().parse().ok())
            .collect();
        if numbers.len() < 4 {
            return Err(PackError::InvalidBoundary(format!(
                "line {} needs four numbers: {:?}",
                i + 1,
                line
            )));
        }

        let edge = Edge {
            start: Vertex::new(numbers[0], numbers[1]),
            end: Vertex::new(numbers[2], numbers[3]),
        };
        max_ra = max_ra.max(edge.start.ra).max(edge.end.ra);

        let slot = *slots.entry(code.clone()).or_insert_with(|| {
            parsed.push(ParsedConstellation {
                code,
                edges: Vec::new(),
            });
            parsed.len() - 1
        });
        parsed[slot].edges.push(edge);
    }

    if max_ra <= HOURS_DETECTION_LIMIT {
        debug!("Boundary RA values look like hours (max {})", max_ra);
        for edge in parsed.iter_mut().flat_map(|c| c.edges.iter_mut()) {
            edge.start.ra *= DEG_PER_HOUR;
            edge.end.ra *= DEG_PER_HOUR;
        }
    }
    Ok(parsed)
}

/// Chains edges that share end points into vertex paths
///
/// Edge direction does not matter. Paths with fewer than three vertices
/// are dropped.
pub fn build_polygons(edges: &[Edge]) -> Vec<Vec<Vertex>> {
    let mut adjacency: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (i, edge) in edges.iter().enumerate() {
        adjacency.entry(edge.start.key()).or_default().push(i);
        adjacency.entry(edge.end.key()).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut polygons = Vec::new();
    for first in 0..edges.len() {
        if used[first] {
            continue;
        }
        used[first] = true;
        let mut path = vec![edges[first].start, edges[first].end];
        let mut current = edges[first].end.key();

        while let Some(next) = adjacency
            .get(&current)
            .and_then(|candidates| candidates.iter().copied().find(|&e| !used[e]))
        {
            used[next] = true;
            let edge = edges[next];
            let end = if edge.start.key() == current {
                edge.end
            } else {
                edge.start
            };
            path.push(end);
            current = end.key();
        }

        if path.len() >= 3 {
            polygons.push(path);
        }
    }
    polygons
}

fn unwrap_ra(vertices: &[Vertex]) -> Vec<Vertex> {
    let mut result = Vec::with_capacity(vertices.len());
    let mut previous = match vertices.first() {
        Some(v) => v.ra,
        None => return result,
    };
    for v in vertices {
        let mut ra = v.ra;
        let diff = ra - previous;
        if diff > 180.0 {
            ra -= 360.0;
        } else if diff < -180.0 {
            ra += 360.0;
        }
        result.push(Vertex::new(ra, v.dec));
        previous = ra;
    }
    result
}

/// Whether a closed vertex ring winds once around a celestial pole
///
/// Unwrapping RA along such a ring ends a whole turn away from where it
/// started; any other closed ring ends where it began.
pub fn encircles_pole(vertices: &[Vertex]) -> bool {
    let unwrapped = unwrap_ra(vertices);
    let (Some(first), Some(last)) = (unwrapped.first(), unwrapped.last()) else {
        return false;
    };
    let net = last.ra - first.ra;
    let turns = (net / 360.0).round();
    turns != 0.0
        && (net - turns * 360.0).abs() < VERTEX_TOLERANCE
        && (last.dec - first.dec).abs() < VERTEX_TOLERANCE
}

fn perpendicular_distance(point: &Vertex, start: &Vertex, end: &Vertex) -> f64 {
    let dx = end.ra - start.ra;
    let dy = end.dec - start.dec;
    if dx.abs() < 1e-9 && dy.abs() < 1e-9 {
        return point.distance(start);
    }
    let t = ((point.ra - start.ra) * dx + (point.dec - start.dec) * dy) / (dx * dx + dy * dy);
    point.distance(&Vertex::new(start.ra + t * dx, start.dec + t * dy))
}

fn rdp(points: &[Vertex], epsilon: f64, out: &mut Vec<Vertex>) {
    let (Some(start), Some(end)) = (points.first(), points.last()) else {
        return;
    };
    let mut max_distance = 0.0;
    let mut split = 0;
    for (i, p) in points.iter().enumerate().take(points.len() - 1).skip(1) {
        let d = perpendicular_distance(p, start, end);
        if d > max_distance {
            max_distance = d;
            split = i;
        }
    }

    if max_distance > epsilon {
        rdp(&points[..=split], epsilon, out);
        out.pop();
        rdp(&points[split..], epsilon, out);
    } else {
        out.push(*start);
        if points.len() > 1 {
            out.push(*end);
        }
    }
}

/// Ramer-Douglas-Peucker simplification in the RA/Dec plane
///
/// RA is unwrapped across the 0°/360° seam before simplifying and wrapped
/// back afterwards. Paths of three vertices or fewer, and rings around a
/// pole, are returned as-is.
pub fn simplify(vertices: &[Vertex], epsilon: f64) -> Result<Vec<Vertex>, PackError> {
    if !epsilon.is_finite() || epsilon < 0.0 {
        return Err(PackError::InvalidRange {
            name: "rdp_epsilon",
            value: epsilon,
        });
    }
    if vertices.len() <= 3 || encircles_pole(vertices) {
        return Ok(vertices.to_vec());
    }
    let unwrapped = unwrap_ra(vertices);
    let mut simplified = Vec::with_capacity(unwrapped.len());
    rdp(&unwrapped, epsilon, &mut simplified);
    Ok(simplified
        .into_iter()
        .map(|v| Vertex::new(wrap_0_360(v.ra), v.dec))
        .collect())
}

/// Smallest RA interval covering `values`, as `(min, max)`
///
/// The interval is the complement of the largest gap between sorted
/// values, so `min > max` means it crosses 0°.
pub fn circular_bounds(values: &[f64]) -> Option<(f64, f64)> {
    let mut sorted: Vec<f64> = values.iter().map(|&v| wrap_0_360(v)).collect();
    sorted.sort_by(f64::total_cmp);
    let last = sorted.len().checked_sub(1)?;

    let mut max_gap = -1.0;
    let mut gap_at = 0;
    for i in 0..=last {
        let gap = if i == last {
            sorted[0] + 360.0 - sorted[i]
        } else {
            sorted[i + 1] - sorted[i]
        };
        if gap > max_gap {
            max_gap = gap;
            gap_at = i;
        }
    }
    Some((sorted[(gap_at + 1) % sorted.len()], sorted[gap_at]))
}

fn distinct_vertex_count(vertices: &[Vertex]) -> usize {
    match (vertices.first(), vertices.last()) {
        (Some(first), Some(last)) if vertices.len() > 1 && first.approx_eq(last) => {
            vertices.len() - 1
        }
        _ => vertices.len(),
    }
}

fn bounding_box(code: &str, vertices: &[Vertex]) -> Option<BoundaryBox> {
    let ras: Vec<f64> = vertices.iter().map(|v| v.ra).collect();
    let (min_ra, max_ra) = circular_bounds(&ras)?;
    let min_dec = vertices.iter().map(|v| v.dec).fold(f64::INFINITY, f64::min);
    let max_dec = vertices.iter().map(|v| v.dec).fold(f64::NEG_INFINITY, f64::max);
    Some(BoundaryBox::new(code, min_ra, max_ra, min_dec, max_dec))
}

/// Full-RA box from a pole-encircling ring out to the pole it surrounds
fn polar_cap_box(code: &str, vertices: &[Vertex]) -> BoundaryBox {
    let min_dec = vertices.iter().map(|v| v.dec).fold(f64::INFINITY, f64::min);
    let max_dec = vertices.iter().map(|v| v.dec).fold(f64::NEG_INFINITY, f64::max);
    if min_dec + max_dec >= 0.0 {
        BoundaryBox::new(code, 0.0, 360.0, min_dec, 90.0)
    } else {
        BoundaryBox::new(code, 0.0, 360.0, -90.0, max_dec)
    }
}

/// JSON summary of a boundary pack
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundarySummary {
    pub constellations: usize,
    pub polygons: usize,
    pub vertices_in: usize,
    pub vertices_out: usize,
    pub rdp_epsilon: f64,
    pub record_count: usize,
    pub size_bytes: usize,
    pub crc32: u32,
}

/// A packed boundary file
#[derive(Debug, Clone)]
pub struct BoundaryPack {
    pub boxes: Vec<BoundaryBox>,
    pub bytes: Vec<u8>,
    pub summary: BoundarySummary,
}

/// Turns parsed constellations into a boundary file
///
/// Records follow the IAU code order; codes outside the 88 constellations
/// are dropped with a warning.
pub fn pack_boundaries(
    parsed: &[ParsedConstellation],
    epsilon: f64,
) -> Result<BoundaryPack, PackError> {
    let mut known: Vec<(i16, &ParsedConstellation)> = Vec::with_capacity(parsed.len());
    for constellation in parsed {
        match constellation_index(&constellation.code) {
            Some(index) => known.push((index, constellation)),
            None => warn!("Dropping unknown constellation code {}", constellation.code),
        }
    }
    known.sort_by_key(|(index, _)| *index);

    let mut boxes = Vec::new();
    let mut constellations = 0;
    let mut vertices_in = 0;
    let mut vertices_out = 0;
    for (_, constellation) in known {
        let mut produced = false;
        for polygon in build_polygons(&constellation.edges) {
            vertices_in += polygon.len();
            if encircles_pole(&polygon) {
                debug!("{}: polygon encircles a pole", constellation.code);
                vertices_out += polygon.len();
                boxes.push(polar_cap_box(&constellation.code, &polygon));
                produced = true;
                continue;
            }
            let simplified = simplify(&polygon, epsilon)?;
            if distinct_vertex_count(&simplified) < 3 {
                debug!(
                    "{}: polygon collapsed to {} vertices",
                    constellation.code,
                    simplified.len()
                );
                continue;
            }
            vertices_out += simplified.len();
            if let Some(b) = bounding_box(&constellation.code, &simplified) {
                boxes.push(b);
                produced = true;
            }
        }
        if produced {
            constellations += 1;
        }
    }

    let bytes = encode_boundaries(&boxes)?;
    let summary = BoundarySummary {
        constellations,
        polygons: boxes.len(),
        vertices_in,
        vertices_out,
        rdp_epsilon: epsilon,
        record_count: boxes.len(),
        size_bytes: bytes.len(),
        crc32: payload_crc32(&bytes[BoundaryHeader::SIZE..]),
    };
    info!(
        "Packed {} boundary boxes for {} constellations ({} -> {} vertices, epsilon {})",
        summary.record_count, constellations, vertices_in, vertices_out, epsilon
    );
    Ok(BoundaryPack {
        boxes,
        bytes,
        summary,
    })
}
