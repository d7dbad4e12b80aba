//! Geometry lookups used by map preparation.
//!
//! Map preparation only needs centroids, bounding boxes and state outlines,
//! so the provider is a trait; [`StaticGeometry`] serves them from a JSON
//! file prepared offline.

use std::collections::HashMap;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::map::MapError;

/// A geographic area the provider can describe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Region {
    /// Five-digit ZIP code.
    Zip(String),
    /// Two-letter state code.
    State(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl Bounds {
    pub fn center(&self) -> Point {
        Point {
            lat: (self.min_lat + self.max_lat) / 2.0,
            lon: (self.min_lon + self.max_lon) / 2.0,
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lon >= self.min_lon
            && point.lon <= self.max_lon
    }

    /// Uniform random point inside the box.
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
        Point {
            lat: sample(rng, self.min_lat, self.max_lat),
            lon: sample(rng, self.min_lon, self.max_lon),
        }
    }
}

fn sample<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
    if high > low {
        rng.gen_range(low..=high)
    } else {
        low
    }
}

/// Outer ring of a polygon, first point not repeated.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Polygon {
    pub exterior: Vec<Point>,
}

impl Polygon {
    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.exterior.first()?;
        let mut bounds = Bounds {
            min_lat: first.lat,
            min_lon: first.lon,
            max_lat: first.lat,
            max_lon: first.lon,
        };
        for p in &self.exterior[1..] {
            bounds.min_lat = bounds.min_lat.min(p.lat);
            bounds.min_lon = bounds.min_lon.min(p.lon);
            bounds.max_lat = bounds.max_lat.max(p.lat);
            bounds.max_lon = bounds.max_lon.max(p.lon);
        }
        Some(bounds)
    }
}

/// Source of region geometry.
pub trait GeometryProvider {
    fn polygon_for(&self, region: &Region) -> Option<Polygon>;
    fn centroid_for(&self, region: &Region) -> Option<Point>;
    fn bounds_for(&self, region: &Region) -> Option<Bounds>;
    /// ZIP codes whose primary city matches, case-insensitively.
    fn zips_in_city(&self, city: &str, state: &str) -> Vec<String>;
}

#[derive(Deserialize, Debug, Clone)]
pub struct ZipArea {
    pub city: String,
    pub state: String,
    pub bounds: Bounds,
    #[serde(default)]
    pub centroid: Option<Point>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct StateArea {
    pub name: String,
    pub centroid: Point,
    #[serde(default)]
    pub polygon: Option<Polygon>,
}

/// Geometry loaded from a JSON document of the form
/// `{"zips": {"19103": {...}}, "states": {"PA": {...}}}`.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct StaticGeometry {
    #[serde(default)]
    zips: HashMap<String, ZipArea>,
    #[serde(default)]
    states: HashMap<String, StateArea>,
}

impl StaticGeometry {
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

impl GeometryProvider for StaticGeometry {
    fn polygon_for(&self, region: &Region) -> Option<Polygon> {
        match region {
            Region::State(code) => self.states.get(code)?.polygon.clone(),
            Region::Zip(_) => None,
        }
    }

    fn centroid_for(&self, region: &Region) -> Option<Point> {
        match region {
            Region::Zip(zip) => {
                let area = self.zips.get(zip)?;
                Some(area.centroid.unwrap_or_else(|| area.bounds.center()))
            }
            Region::State(code) => Some(self.states.get(code)?.centroid),
        }
    }

    fn bounds_for(&self, region: &Region) -> Option<Bounds> {
        match region {
            Region::Zip(zip) => Some(self.zips.get(zip)?.bounds),
            Region::State(code) => self.states.get(code)?.polygon.as_ref()?.bounds(),
        }
    }

    fn zips_in_city(&self, city: &str, state: &str) -> Vec<String> {
        let mut zips: Vec<String> = self
            .zips
            .iter()
            .filter(|(_, area)| {
                area.city.eq_ignore_ascii_case(city) && area.state.eq_ignore_ascii_case(state)
            })
            .map(|(zip, _)| zip.clone())
            .collect();
        zips.sort();
        zips
    }
}
