//! CSV Data Loader Module
//! Reads the three referendum input files into Polars DataFrames.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File names expected under the data directory.
pub const REFERENDUM_FILE: &str = "referendum.csv";
pub const REGIONS_FILE: &str = "regions.csv";
pub const DEPARTMENTS_FILE: &str = "departments.csv";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV {path}: {source}")]
    CsvError {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
}

/// The three raw input tables, loaded as-is with inferred schemas.
pub struct InputTables {
    pub referendum: DataFrame,
    pub regions: DataFrame,
    pub departments: DataFrame,
}

impl InputTables {
    /// Load the three CSV files from `data_dir`.
    ///
    /// The referendum file is semicolon-delimited; both reference tables are
    /// comma-delimited. No schema validation is performed beyond what the CSV
    /// reader infers from the header rows.
    pub fn load(data_dir: &Path) -> Result<Self, LoaderError> {
        let referendum = read_csv(&data_dir.join(REFERENDUM_FILE), b';')?;
        let regions = read_csv(&data_dir.join(REGIONS_FILE), b',')?;
        let departments = read_csv(&data_dir.join(DEPARTMENTS_FILE), b',')?;

        log::info!(
            "loaded {} referendum rows, {} regions, {} departments",
            referendum.height(),
            regions.height(),
            departments.height()
        );

        Ok(Self {
            referendum,
            regions,
            departments,
        })
    }
}

/// Load a single delimited file using the Polars lazy CSV reader.
pub fn read_csv(path: &Path, separator: u8) -> Result<DataFrame, LoaderError> {
    LazyCsvReader::new(path)
        .with_separator(separator)
        .with_infer_schema_length(Some(10000))
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(|source| LoaderError::CsvError {
            path: path.to_path_buf(),
            source,
        })
}
