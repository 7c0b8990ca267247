//! Map module - choropleth rendering

mod choropleth;

pub use choropleth::{merge_results_with_geometry, plot_referendum_map, MapError};
