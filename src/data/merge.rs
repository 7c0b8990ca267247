//! Table Merge Module
//! Relational joins between the referendum table and the area reference tables.

use polars::prelude::*;
use thiserror::Error;

/// Substrings marking overseas/foreign territory rows, excluded from the
/// regional tally.
pub const OVERSEAS_MARKERS: [&str; 4] = ["DOM", "ROM", "TOM", "FRANCAIS DE L'ETRANGER"];

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Join departments to their region on `department.region_code = region.code`.
///
/// Both join keys are cast to strings so that a numerically-inferred code on
/// one side cannot produce a dtype mismatch. Output columns are exactly
/// `code_reg`, `name_reg`, `code_dep`, `name_dep`; departments without a
/// matching region produce no row (inner join).
pub fn merge_regions_and_departments(
    regions: &DataFrame,
    departments: &DataFrame,
) -> Result<DataFrame, MergeError> {
    let departments = departments.clone().lazy().select([
        col("region_code").cast(DataType::String),
        col("code").cast(DataType::String).alias("code_dep"),
        col("name").alias("name_dep"),
    ]);
    let regions = regions.clone().lazy().select([
        col("code").cast(DataType::String).alias("code_reg"),
        col("name").alias("name_reg"),
    ]);

    let joined = departments
        .join(
            regions,
            [col("region_code")],
            [col("code_reg")],
            JoinArgs::new(JoinType::Inner),
        )
        .select([
            col("region_code").alias("code_reg"),
            col("name_reg"),
            col("code_dep"),
            col("name_dep"),
        ])
        .collect()?;

    Ok(joined)
}

/// Join referendum rows to the region/department table on department code.
///
/// Referendum codes drop leading zeros ("1" where the reference table says
/// "01"), so `code_dep` is left-stripped of zeros before joining. Rows whose
/// department code contains an overseas/foreign marker are excluded from the
/// result. Referendum rows without a matching department are dropped by the
/// inner join; the count of dropped rows is logged as a warning.
pub fn merge_referendum_and_areas(
    referendum: &DataFrame,
    regions_and_departments: &DataFrame,
) -> Result<DataFrame, MergeError> {
    let areas = regions_and_departments
        .clone()
        .lazy()
        .with_column(col("code_dep").str().strip_chars_start(lit("0")));
    let referendum_lf = referendum
        .clone()
        .lazy()
        .with_column(col("Department code").cast(DataType::String));

    let joined = areas
        .join(
            referendum_lf,
            [col("code_dep")],
            [col("Department code")],
            JoinArgs::new(JoinType::Inner),
        )
        .collect()?;

    // Department codes are unique, so each referendum row matches at most one
    // department and the height difference is exactly the unmatched rows.
    let unmatched = referendum.height().saturating_sub(joined.height());
    if unmatched > 0 {
        log::warn!(
            "{} referendum rows had no matching department and were dropped",
            unmatched
        );
    }

    let kept = joined
        .lazy()
        .filter(overseas_marker_expr().not())
        .collect()?;

    Ok(kept)
}

/// True for rows whose `code_dep` contains any overseas/foreign marker.
fn overseas_marker_expr() -> Expr {
    OVERSEAS_MARKERS
        .iter()
        .map(|marker| col("code_dep").str().contains_literal(lit(*marker)))
        .reduce(|acc, e| acc.or(e))
        .unwrap_or_else(|| lit(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regions() -> DataFrame {
        df!(
            "code" => ["84", "32"],
            "name" => ["Auvergne-Rhone-Alpes", "Hauts-de-France"],
        )
        .unwrap()
    }

    fn departments() -> DataFrame {
        df!(
            "region_code" => ["84", "84", "32"],
            "code" => ["01", "69", "59"],
            "name" => ["Ain", "Rhone", "Nord"],
        )
        .unwrap()
    }

    fn column_names(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn geo_join_keeps_one_row_per_department() {
        let joined = merge_regions_and_departments(&regions(), &departments()).unwrap();

        assert_eq!(joined.height(), 3);
        assert_eq!(
            column_names(&joined),
            ["code_reg", "name_reg", "code_dep", "name_dep"]
        );

        let ain = joined
            .clone()
            .lazy()
            .filter(col("code_dep").eq(lit("01")))
            .collect()
            .unwrap();
        assert_eq!(ain.height(), 1);
        assert_eq!(
            ain.column("name_reg").unwrap().str().unwrap().get(0),
            Some("Auvergne-Rhone-Alpes")
        );
    }

    #[test]
    fn geo_join_drops_departments_without_region() {
        let departments = df!(
            "region_code" => ["84", "99"],
            "code" => ["01", "98"],
            "name" => ["Ain", "Nowhere"],
        )
        .unwrap();

        let joined = merge_regions_and_departments(&regions(), &departments).unwrap();
        assert_eq!(joined.height(), 1);
    }

    #[test]
    fn geo_join_casts_numeric_keys_to_string() {
        let regions = df!(
            "code" => [84i64],
            "name" => ["Auvergne-Rhone-Alpes"],
        )
        .unwrap();
        let departments = df!(
            "region_code" => [84i64],
            "code" => [1i64],
            "name" => ["Ain"],
        )
        .unwrap();

        let joined = merge_regions_and_departments(&regions, &departments).unwrap();
        assert_eq!(joined.height(), 1);
        assert_eq!(
            joined.column("code_reg").unwrap().str().unwrap().get(0),
            Some("84")
        );
    }

    fn referendum() -> DataFrame {
        df!(
            "Department code" => ["1", "69", "59", "975"],
            "Registered" => [100i64, 200, 300, 50],
            "Abstentions" => [10i64, 20, 30, 5],
            "Null" => [5i64, 10, 15, 2],
            "Choice A" => [50i64, 90, 150, 20],
            "Choice B" => [35i64, 80, 105, 23],
        )
        .unwrap()
    }

    #[test]
    fn referendum_join_matches_leading_zero_codes() {
        let areas = merge_regions_and_departments(&regions(), &departments()).unwrap();
        let merged = merge_referendum_and_areas(&referendum(), &areas).unwrap();

        // "975" has no department; the three mainland rows survive, and the
        // department coded "01" matched the referendum's "1".
        assert_eq!(merged.height(), 3);
        let ain = merged
            .clone()
            .lazy()
            .filter(col("code_dep").eq(lit("1")))
            .collect()
            .unwrap();
        assert_eq!(ain.height(), 1);
        assert_eq!(
            ain.column("name_dep").unwrap().str().unwrap().get(0),
            Some("Ain")
        );
    }

    #[test]
    fn referendum_join_excludes_overseas_markers() {
        let regions = df!(
            "code" => ["84", "COM"],
            "name" => ["Auvergne-Rhone-Alpes", "Overseas"],
        )
        .unwrap();
        let departments = df!(
            "region_code" => ["84", "COM"],
            "code" => ["01", "ZZ-TOM"],
            "name" => ["Ain", "Elsewhere"],
        )
        .unwrap();
        let referendum = df!(
            "Department code" => ["1", "ZZ-TOM"],
            "Registered" => [100i64, 40],
            "Abstentions" => [10i64, 4],
            "Null" => [5i64, 1],
            "Choice A" => [50i64, 20],
            "Choice B" => [35i64, 15],
        )
        .unwrap();

        let areas = merge_regions_and_departments(&regions, &departments).unwrap();
        let merged = merge_referendum_and_areas(&referendum, &areas).unwrap();

        assert_eq!(merged.height(), 1);
        let codes = merged.column("code_dep").unwrap().str().unwrap();
        for code in codes.into_iter().flatten() {
            for marker in OVERSEAS_MARKERS {
                assert!(!code.contains(marker));
            }
        }
    }
}
