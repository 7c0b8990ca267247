//! refmap - Referendum results aggregation & choropleth map renderer
//!
//! Loads referendum results plus the region/department reference tables,
//! tallies votes per region, prints the table and renders the result ratio
//! on a map of the regions.

mod data;
mod geo;
mod map;

use anyhow::Context;
use std::path::Path;

use data::{
    compute_referendum_result_by_regions, merge_referendum_and_areas,
    merge_regions_and_departments, InputTables,
};
use geo::load_region_shapes;
use map::plot_referendum_map;

const DATA_DIR: &str = "data";
const GEOJSON_FILE: &str = "data/regions.geojson";
const OUTPUT_FILE: &str = "referendum_map.png";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let tables = InputTables::load(Path::new(DATA_DIR)).context("loading input tables")?;
    let regions_and_departments =
        merge_regions_and_departments(&tables.regions, &tables.departments)
            .context("joining departments to regions")?;
    let referendum_and_areas =
        merge_referendum_and_areas(&tables.referendum, &regions_and_departments)
            .context("joining referendum rows to areas")?;
    let results = compute_referendum_result_by_regions(&referendum_and_areas)
        .context("aggregating results by region")?;

    println!("{}", results);

    let shapes =
        load_region_shapes(Path::new(GEOJSON_FILE)).context("loading region boundaries")?;
    let merged = plot_referendum_map(&results, &shapes, Path::new(OUTPUT_FILE))
        .context("rendering the choropleth")?;
    log::info!("rendered {} regions to {}", merged.height(), OUTPUT_FILE);

    if let Err(e) = open::that(OUTPUT_FILE) {
        log::warn!("could not open {} with the system viewer: {}", OUTPUT_FILE, e);
    }

    Ok(())
}
