//! Region Aggregation Module
//! Sums vote counts per region from the joined referendum table.

use polars::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Multiple region names for region code(s): {codes}")]
    ConflictingRegionNames { codes: String },
}

/// Group the joined referendum rows by region code, summing the count columns
/// and keeping the region name.
///
/// By construction every row of a group carries the same `name_reg`; that
/// assumption is asserted rather than trusted, and a violation is an error.
/// Output is sorted by `code_reg` so repeated runs print identically.
pub fn compute_referendum_result_by_regions(
    referendum_and_areas: &DataFrame,
) -> Result<DataFrame, AggregateError> {
    let conflicting = referendum_and_areas
        .clone()
        .lazy()
        .group_by([col("code_reg")])
        .agg([col("name_reg").n_unique().alias("distinct_names")])
        .filter(col("distinct_names").gt(lit(1)))
        .collect()?;

    if conflicting.height() > 0 {
        let codes: Vec<String> = conflicting
            .column("code_reg")?
            .as_materialized_series()
            .iter()
            .map(|v| v.to_string().trim_matches('"').to_string())
            .collect();
        return Err(AggregateError::ConflictingRegionNames {
            codes: codes.join(", "),
        });
    }

    let results = referendum_and_areas
        .clone()
        .lazy()
        .group_by([col("code_reg")])
        .agg([
            col("name_reg").first(),
            col("Registered").sum(),
            col("Abstentions").sum(),
            col("Null").sum(),
            col("Choice A").sum(),
            col("Choice B").sum(),
        ])
        .sort(["code_reg"], Default::default())
        .collect()?;

    Ok(results)
}
