//! Weekly activity grid aggregation.
//!
//! Buckets activity records into a dense 52x7 grid:
//! - Rows are ISO weeks of the year (week 1 = row 0)
//! - Columns are weekdays (Monday = 0 .. Sunday = 6)
//! - Cells hold the summed distance in miles
//!
//! The grid is the input for the skyline builder.

use chrono::{Datelike, NaiveDate};
use log::{debug, trace, warn};

use crate::error::{Result, SkylineError};
use crate::{ActivityGrid, ActivityRecord, GRID_WEEKS, KM_TO_MILES};

/// Format accepted for date range bounds, e.g. `1/1/2024`.
pub const DATE_BOUND_FORMAT: &str = "%m/%d/%Y";

/// Inclusive calendar-date range that stays inside one calendar year.
///
/// The year constraint fixes the ISO week numbering used for bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range from two dates.
    ///
    /// Fails with [`SkylineError::InvalidDateRange`] when the bounds fall in
    /// different years or `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start.year() != end.year() {
            return Err(SkylineError::InvalidDateRange {
                min: start.to_string(),
                max: end.to_string(),
                message: "bounds must fall within the same calendar year".to_string(),
            });
        }
        if start > end {
            return Err(SkylineError::InvalidDateRange {
                min: start.to_string(),
                max: end.to_string(),
                message: "start date is after end date".to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse `m/d/Y` bounds such as `"1/1/2024"` and `"12/31/2024"`.
    ///
    /// # Example
    /// ```
    /// use activity_skyline::DateRange;
    ///
    /// let range = DateRange::parse("1/1/2024", "11/4/2024").unwrap();
    /// assert_eq!(range.year(), 2024);
    /// assert!(DateRange::parse("12/1/2023", "1/31/2024").is_err());
    /// ```
    pub fn parse(date_min: &str, date_max: &str) -> Result<Self> {
        let start = parse_date_bound(date_min)?;
        let end = parse_date_bound(date_max)?;
        Self::new(start, end).map_err(|err| match err {
            SkylineError::InvalidDateRange { message, .. } => SkylineError::InvalidDateRange {
                min: date_min.to_string(),
                max: date_max.to_string(),
                message,
            },
            other => other,
        })
    }

    /// The whole calendar year.
    pub fn full_year(year: i32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| SkylineError::invalid_parameter("year", format!("{} is out of range", year)))?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| SkylineError::invalid_parameter("year", format!("{} is out of range", year)))?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Calendar year shared by both bounds.
    pub fn year(&self) -> i32 {
        self.start.year()
    }

    /// Check whether a date lies inside the range (both ends inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

fn parse_date_bound(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_BOUND_FORMAT).map_err(|_| SkylineError::DateParse {
        value: value.to_string(),
        expected: "m/d/Y".to_string(),
    })
}

/// Grid cell a date falls into: (ISO week - 1, weekday from Monday).
///
/// Week 53 of long ISO years has no row of its own and is clamped into the
/// last row.
pub fn cell_for_date(date: NaiveDate) -> (usize, usize) {
    let week = date.iso_week().week() as usize;
    let row = (week - 1).min(GRID_WEEKS - 1);
    let col = date.weekday().num_days_from_monday() as usize;
    (row, col)
}

// Internal accumulator used while scanning records
struct GridBuilder {
    grid: ActivityGrid,
    matched: usize,
    clamped: usize,
}

impl GridBuilder {
    fn new() -> Self {
        Self {
            grid: ActivityGrid::zeros(),
            matched: 0,
            clamped: 0,
        }
    }

    fn add_record(&mut self, record: &ActivityRecord) -> Result<()> {
        if !record.distance_km.is_finite() || record.distance_km < 0.0 {
            return Err(SkylineError::invalid_parameter(
                "distance_km",
                format!(
                    "{} activity at {} has distance {}, expected a non-negative number",
                    record.activity_type, record.timestamp, record.distance_km
                ),
            ));
        }

        let date = record.timestamp.date();
        if date.iso_week().week() as usize > GRID_WEEKS {
            warn!(
                "[Skyline] Activity on {} falls in ISO week 53, folding into week {}",
                date, GRID_WEEKS
            );
            self.clamped += 1;
        }

        let (row, col) = cell_for_date(date);
        self.grid.add(row, col, record.distance_km * KM_TO_MILES);
        self.matched += 1;
        Ok(())
    }

    fn build(self) -> ActivityGrid {
        debug!(
            "[Skyline] Aggregated {} activities ({} from week 53), total {:.2} mi",
            self.matched,
            self.clamped,
            self.grid.total()
        );
        self.grid
    }
}

/// Aggregate records of one activity kind into the weekly grid.
///
/// `date_min` and `date_max` are inclusive `m/d/Y` bounds within a single
/// calendar year. Distances are converted from kilometers to miles and summed
/// per (week, weekday) cell.
///
/// A record counts when its calendar date is inside the range, so activities
/// at any time on the last day are included. Comparing full timestamps
/// against midnight of `date_max` would drop them.
///
/// Fails with [`SkylineError::InvalidParameter`] when a matching record has a
/// negative or non-finite distance.
///
/// # Example
/// ```
/// use activity_skyline::{aggregate, ActivityRecord};
///
/// let records = vec![
///     ActivityRecord::new("Run", "2024-01-01T07:00:00".parse().unwrap(), 5.0),
///     ActivityRecord::new("Ride", "2024-01-01T09:00:00".parse().unwrap(), 100.0),
/// ];
///
/// let grid = aggregate(&records, "Run", "1/1/2024", "12/31/2024").unwrap();
/// assert!((grid.get(0, 0) - 5.0 * 0.621371).abs() < 1e-12);
/// assert_eq!(grid.total(), grid.get(0, 0));
/// ```
pub fn aggregate(
    records: &[ActivityRecord],
    activity_kind: &str,
    date_min: &str,
    date_max: &str,
) -> Result<ActivityGrid> {
    let range = DateRange::parse(date_min, date_max)?;
    aggregate_in_range(records, activity_kind, &range)
}

/// Aggregate records of one activity kind inside an already validated range.
pub fn aggregate_in_range(
    records: &[ActivityRecord],
    activity_kind: &str,
    range: &DateRange,
) -> Result<ActivityGrid> {
    let mut builder = GridBuilder::new();

    for record in records {
        if record.activity_type != activity_kind {
            continue;
        }
        if !range.contains(record.timestamp.date()) {
            continue;
        }
        builder.add_record(record)?;
    }

    let grid = builder.build();
    log_grid(&grid);
    Ok(grid)
}

/// Aggregate several independent date ranges at once.
///
/// Each range is processed by [`aggregate_in_range`]; grids are returned in
/// the same order as `ranges`. The first failing range aborts the batch.
#[cfg(feature = "parallel")]
pub fn aggregate_ranges_parallel(
    records: &[ActivityRecord],
    activity_kind: &str,
    ranges: &[DateRange],
) -> Result<Vec<ActivityGrid>> {
    use rayon::prelude::*;

    log::info!(
        "[Skyline] Aggregating {} date ranges over {} records in parallel",
        ranges.len(),
        records.len()
    );

    ranges
        .par_iter()
        .map(|range| aggregate_in_range(records, activity_kind, range))
        .collect()
}

/// Log a grid: a one-line summary at debug level, then every row (values
/// rounded to 2 decimals) at trace level.
pub fn log_grid(grid: &ActivityGrid) {
    debug!(
        "[Skyline] Grid ready: {} active days, max {:.2} mi, total {:.2} mi",
        grid.active_days(),
        grid.max_value(),
        grid.total()
    );
    if !log::log_enabled!(log::Level::Trace) {
        return;
    }
    trace!("[Skyline] Progress data for skyline:");
    for (week, row) in grid.rows().iter().enumerate() {
        let rounded: Vec<f64> = row.iter().map(|v| (v * 100.0).round() / 100.0).collect();
        trace!("[Skyline] week {:>2}: {:?}", week + 1, rounded);
    }
}
