//! FFI bindings for mobile platforms (iOS/Android).
//!
//! Exposes skyline generation to Kotlin and Swift through UniFFI. All FFI
//! functions are prefixed with `ffi_` to avoid naming conflicts with the
//! internal API.

use std::time::Instant;

use log::info;

use crate::{
    build_scene, init_logging, load_activity_grid, ActivityGrid, Result, SkylineConfig,
};

/// Summary of a generated skyline, returned to the app for display.
#[derive(Debug, Clone, uniffi::Record)]
pub struct SkylineSummary {
    /// Path of the written OpenSCAD file
    pub output_path: String,
    /// Days with a positive distance
    pub active_days: u32,
    /// Summed distance in miles
    pub total_miles: f64,
    /// Busiest day in miles (drawn at full bar height)
    pub max_day_miles: f64,
    /// Slope of the base's front face in degrees
    pub flare_angle_deg: f64,
}

/// Default skyline configuration.
#[uniffi::export]
pub fn ffi_default_skyline_config() -> SkylineConfig {
    SkylineConfig::default()
}

/// Build OpenSCAD source from a 52x7 grid of miles.
#[uniffi::export]
pub fn ffi_build_skyline_scad(rows: Vec<Vec<f64>>, config: SkylineConfig) -> Result<String> {
    init_logging();
    let grid = ActivityGrid::from_rows(rows)?;
    let scene = build_scene(&grid, &config)?;
    Ok(scene.to_scad())
}

/// Load an activity export, aggregate one activity kind and write the model.
#[uniffi::export]
pub fn ffi_generate_skyline_from_csv(
    csv_path: String,
    activity_kind: String,
    date_min: String,
    date_max: String,
    output_path: String,
    config: SkylineConfig,
) -> Result<SkylineSummary> {
    init_logging();
    info!(
        "[ActivitySkylineRust] generate_skyline_from_csv called for {} ({} {}..{})",
        csv_path, activity_kind, date_min, date_max
    );
    let start = Instant::now();

    let grid = load_activity_grid(&csv_path, &activity_kind, &date_min, &date_max)?;
    let scene = build_scene(&grid, &config)?;
    scene.write_scad(&output_path)?;

    info!(
        "[ActivitySkylineRust] Wrote {} in {:?}",
        output_path,
        start.elapsed()
    );

    Ok(SkylineSummary {
        output_path,
        active_days: grid.active_days() as u32,
        total_miles: grid.total(),
        max_day_miles: grid.max_value(),
        flare_angle_deg: scene.geometry().flare_angle_deg,
    })
}
