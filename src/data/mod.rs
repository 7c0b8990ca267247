//! Data module - CSV loading, joins and aggregation

mod aggregate;
mod loader;
mod merge;

pub use aggregate::{compute_referendum_result_by_regions, AggregateError};
pub use loader::{InputTables, LoaderError};
pub use merge::{merge_referendum_and_areas, merge_regions_and_departments, MergeError};
