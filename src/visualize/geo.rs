//! Country boundary polygons from a GeoJSON feature collection

use crate::error::{PipelineError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Exterior rings of one country, as (longitude, latitude) points
#[derive(Debug, Clone, PartialEq)]
pub struct CountryShape {
    pub iso3: Option<String>,
    pub rings: Vec<Vec<(f64, f64)>>,
}

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    properties: serde_json::Map<String, serde_json::Value>,
    geometry: Option<Geometry>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    #[serde(other)]
    Unsupported,
}

/// Load boundaries from a GeoJSON file
pub fn load_boundaries(path: &Path, iso_property: &str) -> Result<Vec<CountryShape>> {
    let body = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    parse_boundaries(&body, iso_property)
}

/// Parse a GeoJSON `FeatureCollection`; holes are ignored
///
/// Features whose ISO property is missing or a placeholder (`-99`) keep their
/// shape with `iso3 = None` so they are still drawn as "no data".
pub fn parse_boundaries(body: &str, iso_property: &str) -> Result<Vec<CountryShape>> {
    let collection: FeatureCollection = serde_json::from_str(body)?;

    let shapes = collection
        .features
        .into_iter()
        .map(|feature| {
            let iso3 = feature
                .properties
                .get(iso_property)
                .and_then(|v| v.as_str())
                .filter(|code| *code != "-99" && !code.is_empty())
                .map(str::to_string);
            let rings = match feature.geometry {
                Some(Geometry::Polygon { coordinates }) => exterior(coordinates).into_iter().collect(),
                Some(Geometry::MultiPolygon { coordinates }) => {
                    coordinates.into_iter().filter_map(exterior).collect()
                }
                Some(Geometry::Unsupported) | None => Vec::new(),
            };
            CountryShape { iso3, rings }
        })
        .filter(|shape| !shape.rings.is_empty())
        .collect();

    Ok(shapes)
}

fn exterior(polygon: Vec<Vec<Vec<f64>>>) -> Option<Vec<(f64, f64)>> {
    let ring = polygon.into_iter().next()?;
    let points: Vec<(f64, f64)> = ring
        .into_iter()
        .filter(|p| p.len() >= 2)
        .map(|p| (p[0], p[1]))
        .collect();
    (points.len() >= 3).then_some(points)
}
