//! Choropleth Renderer
//! Joins per-region results to boundary geometry and draws the map.

use crate::geo::RegionShape;
use plotters::coord::Shift;
use plotters::prelude::*;
use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

// Colors (RGB), diverging ramp from Choice B to Choice A majority
const CHOICE_B_COLOR: RGBColor = RGBColor(33, 102, 172); // Blue
const MIDPOINT_COLOR: RGBColor = RGBColor(247, 247, 247); // Near white
const CHOICE_A_COLOR: RGBColor = RGBColor(178, 24, 43); // Red
const NO_DATA_COLOR: RGBColor = RGBColor(204, 204, 204); // Grey
const OUTLINE_COLOR: RGBColor = RGBColor(60, 60, 60);

const MAP_WIDTH: u32 = 900;
const LEGEND_HEIGHT: u32 = 36;
const LEGEND_MARGIN: i32 = 20;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("No geometry to draw")]
    NoGeometry,
    #[error("Failed to render map: {0}")]
    Render(String),
}

fn render_err<E: std::fmt::Display>(e: E) -> MapError {
    MapError::Render(e.to_string())
}

/// Join aggregated results to the boundary set and derive the vote-share
/// columns.
///
/// Adds `total_expressed = Choice A + Choice B` and
/// `ratio = Choice A / total_expressed`. A region whose expressed total is
/// zero gets a null ratio; no NaN ever enters the column. Regions without a
/// result row are dropped (inner join), mirroring the tabular joins upstream.
pub fn merge_results_with_geometry(
    results: &DataFrame,
    shapes: &[RegionShape],
) -> Result<DataFrame, MapError> {
    let codes: Vec<String> = shapes.iter().map(|s| s.code.clone()).collect();
    let names: Vec<Option<String>> = shapes.iter().map(|s| s.name.clone()).collect();
    let geo = df!(
        "code" => codes,
        "nom" => names,
    )?;

    let merged = geo
        .lazy()
        .join(
            results.clone().lazy(),
            [col("code")],
            [col("code_reg")],
            JoinArgs::new(JoinType::Inner),
        )
        .with_column((col("Choice A") + col("Choice B")).alias("total_expressed"))
        .with_column(
            when(col("total_expressed").gt(lit(0)))
                .then(
                    col("Choice A").cast(DataType::Float64)
                        / col("total_expressed").cast(DataType::Float64),
                )
                .otherwise(lit(NULL))
                .alias("ratio"),
        )
        .sort(["code"], Default::default())
        .collect()?;

    Ok(merged)
}

/// Render the choropleth PNG and return the merged table.
///
/// The returned frame is the output of [`merge_results_with_geometry`];
/// writing the PNG is the only side effect here.
pub fn plot_referendum_map(
    results: &DataFrame,
    shapes: &[RegionShape],
    output: &Path,
) -> Result<DataFrame, MapError> {
    let merged = merge_results_with_geometry(results, shapes)?;
    render_choropleth(&merged, shapes, output)?;
    Ok(merged)
}

fn ratio_by_code(merged: &DataFrame) -> Result<HashMap<String, Option<f64>>, MapError> {
    let codes = merged.column("code")?.str()?.clone();
    let ratios = merged.column("ratio")?.f64()?.clone();

    Ok(codes
        .into_iter()
        .zip(ratios.into_iter())
        .filter_map(|(code, ratio)| code.map(|c| (c.to_string(), ratio)))
        .collect())
}

fn render_choropleth(
    merged: &DataFrame,
    shapes: &[RegionShape],
    output: &Path,
) -> Result<(), MapError> {
    let ratios = ratio_by_code(merged)?;

    let mut lon_min = f64::INFINITY;
    let mut lon_max = f64::NEG_INFINITY;
    let mut lat_min = f64::INFINITY;
    let mut lat_max = f64::NEG_INFINITY;
    for shape in shapes {
        for ring in &shape.rings {
            for &(lon, lat) in ring {
                lon_min = lon_min.min(lon);
                lon_max = lon_max.max(lon);
                lat_min = lat_min.min(lat);
                lat_max = lat_max.max(lat);
            }
        }
    }
    if !lon_min.is_finite() {
        return Err(MapError::NoGeometry);
    }

    let lon_span = (lon_max - lon_min).max(f64::EPSILON);
    let lat_span = (lat_max - lat_min).max(f64::EPSILON);

    // Equirectangular correction so France is not stretched sideways.
    let mean_lat = ((lat_min + lat_max) / 2.0).to_radians();
    let aspect = lat_span / (lon_span * mean_lat.cos().max(0.01));
    let map_height = ((MAP_WIDTH as f64 * aspect).round() as u32).clamp(200, 1600);
    let total_height = map_height + LEGEND_HEIGHT;

    let pad_lon = lon_span * 0.02;
    let pad_lat = lat_span * 0.02;

    let root = BitMapBackend::new(output, (MAP_WIDTH, total_height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;
    let (map_area, legend_area) = root.split_vertically(map_height as i32);

    let mut chart = ChartBuilder::on(&map_area)
        .margin(8)
        .build_cartesian_2d(
            (lon_min - pad_lon)..(lon_max + pad_lon),
            (lat_min - pad_lat)..(lat_max + pad_lat),
        )
        .map_err(render_err)?;

    for shape in shapes {
        let ratio = ratios.get(&shape.code).copied().flatten();
        let fill = ratio.map(ratio_color).unwrap_or(NO_DATA_COLOR);

        for ring in &shape.rings {
            chart
                .draw_series(std::iter::once(Polygon::new(ring.clone(), fill.filled())))
                .map_err(render_err)?;
            chart
                .draw_series(std::iter::once(PathElement::new(
                    ring.clone(),
                    OUTLINE_COLOR.stroke_width(1),
                )))
                .map_err(render_err)?;
        }
    }

    draw_legend(&legend_area)?;
    root.present().map_err(render_err)?;

    Ok(())
}

/// Color for a Choice A share in [0, 1]: blue below one half, red above,
/// fading through a near-white midpoint.
fn ratio_color(ratio: f64) -> RGBColor {
    let t = ratio.clamp(0.0, 1.0);
    let (from, to, f) = if t < 0.5 {
        (CHOICE_B_COLOR, MIDPOINT_COLOR, t * 2.0)
    } else {
        (MIDPOINT_COLOR, CHOICE_A_COLOR, (t - 0.5) * 2.0)
    };
    RGBColor(
        lerp(from.0, to.0, f),
        lerp(from.1, to.1, f),
        lerp(from.2, to.2, f),
    )
}

fn lerp(a: u8, b: u8, f: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * f).round() as u8
}

/// Horizontal color bar spanning ratio 0 to 1.
fn draw_legend(area: &DrawingArea<BitMapBackend<'_>, Shift>) -> Result<(), MapError> {
    let (width, height) = area.dim_in_pixel();
    let steps = 100i32;
    let bar_width = ((width as i32 - 2 * LEGEND_MARGIN) / steps).max(1);
    let top = 8i32;
    let bottom = height as i32 - 8;

    for i in 0..steps {
        let x = LEGEND_MARGIN + i * bar_width;
        let color = ratio_color(i as f64 / (steps - 1) as f64);
        area.draw(&Rectangle::new(
            [(x, top), (x + bar_width, bottom)],
            color.filled(),
        ))
        .map_err(render_err)?;
    }

    Ok(())
}
