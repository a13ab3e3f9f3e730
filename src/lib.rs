//! # Activity Skyline
//!
//! Turns a year of running activities into a weekly distance grid and a
//! 3D-printable "skyline" model.
//!
//! This library provides:
//! - Loading of Strava-style `activities.csv` exports
//! - Aggregation into a 52x7 (ISO week x weekday) grid of miles
//! - A CSG skyline model (flared base, one bar per day, embossed labels)
//! - OpenSCAD and JSON export of the model
//!
//! ## Features
//!
//! - **`cli`** - The `skyline` command-line tool (default)
//! - **`parallel`** - Aggregate several date ranges in parallel with rayon
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use activity_skyline::{load_activity_grid, build_scene, SkylineConfig};
//!
//! let grid = load_activity_grid("activities.csv", "Run", "1/1/2024", "12/31/2024")?;
//! let scene = build_scene(&grid, &SkylineConfig::with_labels("My Name", "2024 Marathon"))?;
//! scene.write_scad("output/skyline.scad")?;
//! # Ok::<(), activity_skyline::SkylineError>(())
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, SkylineError};

// Activity export loading
pub mod records;
pub use records::{load_activity_grid, load_activity_records, read_activity_records};

// Weekly grid aggregation
pub mod grid;
#[cfg(feature = "parallel")]
pub use grid::aggregate_ranges_parallel;
pub use grid::{aggregate, aggregate_in_range, cell_for_date, log_grid, DateRange};

// CSG scene tree and OpenSCAD output
pub mod scad;
pub mod scene;
pub use scene::{HAlign, Node};

// Skyline model construction
pub mod skyline;
pub use skyline::{
    build_scene, flare_angle_degrees, generate_skyline, serialize, Scene, SkylineConfig,
    SkylineGeometry,
};

// FFI bindings for mobile platforms (iOS/Android)
#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
pub(crate) fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("ActivitySkylineRust"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
pub(crate) fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// Number of grid rows (ISO weeks).
pub const GRID_WEEKS: usize = 52;
/// Number of grid columns (weekdays, Monday first).
pub const GRID_DAYS: usize = 7;
/// Kilometers to miles.
pub const KM_TO_MILES: f64 = 0.621371;

/// One row of an activity export.
///
/// # Example
/// ```
/// use activity_skyline::ActivityRecord;
/// let run = ActivityRecord::new("Run", "2024-04-21T08:30:00".parse().unwrap(), 42.195);
/// assert_eq!(run.activity_type, "Run");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Category label ("Run", "Ride", ...)
    pub activity_type: String,
    /// Local start time
    pub timestamp: NaiveDateTime,
    /// Distance in kilometers
    pub distance_km: f64,
}

impl ActivityRecord {
    pub fn new(activity_type: impl Into<String>, timestamp: NaiveDateTime, distance_km: f64) -> Self {
        Self {
            activity_type: activity_type.into(),
            timestamp,
            distance_km,
        }
    }
}

/// Dense 52x7 grid of weekly distances.
///
/// Row `w` is ISO week `w + 1`, column `d` is the weekday counted from
/// Monday. Every cell is finite and non-negative; days without activity are
/// exactly zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct ActivityGrid {
    weeks: Vec<[f64; GRID_DAYS]>,
}

impl ActivityGrid {
    /// All-zero grid.
    pub fn zeros() -> Self {
        Self {
            weeks: vec![[0.0; GRID_DAYS]; GRID_WEEKS],
        }
    }

    /// Build a grid from nested rows, validating shape and values.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let bad_row = rows.iter().find(|row| row.len() != GRID_DAYS);
        if rows.len() != GRID_WEEKS || bad_row.is_some() {
            return Err(SkylineError::InvalidGridShape {
                rows: rows.len(),
                cols: bad_row.or(rows.first()).map_or(0, |row| row.len()),
                expected_rows: GRID_WEEKS,
                expected_cols: GRID_DAYS,
            });
        }

        let mut grid = Self::zeros();
        for (week, row) in rows.iter().enumerate() {
            for (day, &value) in row.iter().enumerate() {
                if !value.is_finite() || value < 0.0 {
                    return Err(SkylineError::invalid_parameter(
                        "grid",
                        format!("cell ({}, {}) must be finite and non-negative, got {}", week, day, value),
                    ));
                }
                grid.weeks[week][day] = value;
            }
        }
        Ok(grid)
    }

    pub(crate) fn add(&mut self, week: usize, day: usize, value: f64) {
        self.weeks[week][day] += value;
    }

    /// Value of one cell. Panics if the indices are outside 52x7.
    pub fn get(&self, week: usize, day: usize) -> f64 {
        self.weeks[week][day]
    }

    pub fn rows(&self) -> &[[f64; GRID_DAYS]] {
        &self.weeks
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.weeks.iter().map(|row| row.to_vec()).collect()
    }

    /// Largest cell value (0.0 for an empty grid).
    pub fn max_value(&self) -> f64 {
        self.weeks.iter().flatten().copied().fold(0.0, f64::max)
    }

    /// Sum of all cells.
    pub fn total(&self) -> f64 {
        self.weeks.iter().flatten().sum()
    }

    /// Number of cells with a positive value.
    pub fn active_days(&self) -> usize {
        self.weeks.iter().flatten().filter(|v| **v > 0.0).count()
    }

    /// True when no cell is positive.
    pub fn is_empty(&self) -> bool {
        self.max_value() <= 0.0
    }
}

impl Default for ActivityGrid {
    fn default() -> Self {
        Self::zeros()
    }
}

impl TryFrom<Vec<Vec<f64>>> for ActivityGrid {
    type Error = SkylineError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::from_rows(rows)
    }
}

impl From<ActivityGrid> for Vec<Vec<f64>> {
    fn from(grid: ActivityGrid) -> Self {
        grid.to_rows()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_grid_shape() {
        let grid = ActivityGrid::zeros();
        assert_eq!(grid.rows().len(), GRID_WEEKS);
        assert!(grid.rows().iter().all(|row| row.len() == GRID_DAYS));
        assert!(grid.is_empty());
        assert_eq!(grid.max_value(), 0.0);
    }

    #[test]
    fn test_from_rows_validation() {
        assert!(matches!(
            ActivityGrid::from_rows(vec![vec![0.0; 7]; 53]),
            Err(SkylineError::InvalidGridShape { rows: 53, .. })
        ));

        let mut ragged = vec![vec![0.0; 7]; 52];
        ragged[4] = vec![0.0; 6];
        assert!(matches!(
            ActivityGrid::from_rows(ragged),
            Err(SkylineError::InvalidGridShape { cols: 6, .. })
        ));

        let mut negative = vec![vec![0.0; 7]; 52];
        negative[0][0] = -1.0;
        assert!(matches!(
            ActivityGrid::from_rows(negative),
            Err(SkylineError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_grid_stats() {
        let mut rows = vec![vec![0.0; 7]; 52];
        rows[0][0] = 3.5;
        rows[20][6] = 10.0;
        let grid = ActivityGrid::from_rows(rows.clone()).unwrap();

        assert_eq!(grid.max_value(), 10.0);
        assert_eq!(grid.total(), 13.5);
        assert_eq!(grid.active_days(), 2);
        assert_eq!(grid.to_rows(), rows);
    }

    #[test]
    fn test_grid_json_round_trip_validates() {
        let mut grid = ActivityGrid::zeros();
        grid.add(1, 2, 4.0);
        let json = serde_json::to_string(&grid).unwrap();
        let back: ActivityGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid);

        assert!(serde_json::from_str::<ActivityGrid>("[[1.0, 2.0]]").is_err());
    }
}
