//! GeoJSON Boundary Loader
//! Parses the region boundary file into plain lon/lat rings for drawing.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Region {code}: polygon without rings")]
    EmptyPolygon { code: String },
    #[error("Region {code}: position with fewer than two coordinates")]
    BadPosition { code: String },
}

/// Boundary of one region: its code, optional display name, and the exterior
/// ring of each of its polygons as (lon, lat) pairs.
#[derive(Debug, Clone)]
pub struct RegionShape {
    pub code: String,
    pub name: Option<String>,
    pub rings: Vec<Vec<(f64, f64)>>,
}

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    properties: Properties,
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Properties {
    code: String,
    #[serde(default)]
    nom: Option<String>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
}

/// Load region boundaries from a GeoJSON feature collection.
///
/// Each feature must carry a `code` property and a Polygon or MultiPolygon
/// geometry. Interior rings (holes) are not retained.
pub fn load_region_shapes(path: &Path) -> Result<Vec<RegionShape>, GeoError> {
    let raw = std::fs::read_to_string(path).map_err(|source| GeoError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_region_shapes(&raw)
}

fn parse_region_shapes(raw: &str) -> Result<Vec<RegionShape>, GeoError> {
    let collection: FeatureCollection = serde_json::from_str(raw)?;

    collection
        .features
        .into_iter()
        .map(|feature| {
            let code = feature.properties.code;
            let rings = match feature.geometry {
                Geometry::Polygon { coordinates } => {
                    vec![exterior_ring(&coordinates, &code)?]
                }
                Geometry::MultiPolygon { coordinates } => coordinates
                    .iter()
                    .map(|polygon| exterior_ring(polygon, &code))
                    .collect::<Result<_, _>>()?,
            };
            Ok(RegionShape {
                code,
                name: feature.properties.nom,
                rings,
            })
        })
        .collect()
}

/// First ring of a polygon, converted to (lon, lat) pairs. Extra coordinates
/// (altitude) are ignored.
fn exterior_ring(polygon: &[Vec<Vec<f64>>], code: &str) -> Result<Vec<(f64, f64)>, GeoError> {
    let outer = polygon.first().ok_or_else(|| GeoError::EmptyPolygon {
        code: code.to_string(),
    })?;

    outer
        .iter()
        .map(|position| match position.as_slice() {
            [lon, lat, ..] => Ok((*lon, *lat)),
            _ => Err(GeoError::BadPosition {
                code: code.to_string(),
            }),
        })
        .collect()
}
