//! Geo module - GeoJSON boundary parsing

mod geojson;

pub use geojson::{load_region_shapes, GeoError, RegionShape};
