//! Activity export loading.
//!
//! Reads the `activities.csv` file found in a Strava bulk export. Only three
//! columns matter: `Activity Type`, `Activity Date` and `Distance` (km). The
//! export repeats some header names; the first occurrence wins.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use log::{debug, info};

use crate::error::{Result, SkylineError};
use crate::grid::{aggregate_in_range, DateRange};
use crate::{ActivityGrid, ActivityRecord};

pub const TYPE_COLUMN: &str = "Activity Type";
pub const DATE_COLUMN: &str = "Activity Date";
pub const DISTANCE_COLUMN: &str = "Distance";

/// Accepted timestamp layouts, tried in order.
///
/// The first is the Strava export format, e.g. `Jan 1, 2024, 7:05:12 AM`.
pub const TIMESTAMP_FORMATS: &[&str] = &[
    "%b %d, %Y, %I:%M:%S %p",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Parse an export timestamp using [`TIMESTAMP_FORMATS`].
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Parse a distance in kilometers. Empty cells count as zero.
fn parse_distance(value: &str) -> std::result::Result<f64, String> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Ok(0.0);
    }
    match cleaned.parse::<f64>() {
        Ok(d) if d.is_finite() && d >= 0.0 => Ok(d),
        Ok(d) => Err(format!("distance {} is not a non-negative number", d)),
        Err(_) => Err(format!("could not parse distance '{}'", value.trim())),
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| SkylineError::missing_column(name))
}

/// Read activity records from any CSV source.
///
/// Fails with [`SkylineError::MissingColumn`] when a required header is
/// absent and [`SkylineError::InvalidRecord`] for rows whose timestamp or
/// distance cannot be parsed.
pub fn read_activity_records<R: Read>(reader: R) -> Result<Vec<ActivityRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let type_idx = column_index(&headers, TYPE_COLUMN)?;
    let date_idx = column_index(&headers, DATE_COLUMN)?;
    let distance_idx = column_index(&headers, DISTANCE_COLUMN)?;

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let line = row.position().map_or(0, |p| p.line());
        let field = |idx: usize| row.get(idx).unwrap_or("");

        let raw_date = field(date_idx);
        let timestamp = parse_timestamp(raw_date).ok_or_else(|| SkylineError::InvalidRecord {
            line,
            message: format!("could not parse timestamp '{}'", raw_date),
        })?;
        let distance_km = parse_distance(field(distance_idx))
            .map_err(|message| SkylineError::InvalidRecord { line, message })?;

        records.push(ActivityRecord::new(field(type_idx).trim(), timestamp, distance_km));
    }

    debug!("[Skyline] Parsed {} activity records", records.len());
    Ok(records)
}

/// Load activity records from a CSV file.
pub fn load_activity_records(path: impl AsRef<Path>) -> Result<Vec<ActivityRecord>> {
    let path = path.as_ref();
    info!("[Skyline] Loading activities from {}", path.display());
    let file = File::open(path)?;
    read_activity_records(file)
}

/// Load a CSV export and aggregate one activity kind into the weekly grid.
///
/// The date range is validated before the file is opened.
pub fn load_activity_grid(
    path: impl AsRef<Path>,
    activity_kind: &str,
    date_min: &str,
    date_max: &str,
) -> Result<ActivityGrid> {
    let range = DateRange::parse(date_min, date_max)?;
    let records = load_activity_records(path)?;
    aggregate_in_range(&records, activity_kind, &range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const EXPORT: &str = "\
Activity ID,Activity Date,Activity Name,Activity Type,Elapsed Time,Distance,Max Heart Rate,Distance
101,\"Jan 1, 2024, 7:05:12 AM\",Morning Run,Run,1800,5.02,171,5020.0
102,\"Jan 1, 2024, 5:30:00 PM\",Evening Ride,Ride,3600,\"1,002.5\",150,1002500.0
103,\"Mar 15, 2024, 12:00:00 PM\",Yoga,Yoga,3600,,,
";

    #[test]
    fn test_parse_strava_timestamp() {
        let ts = parse_timestamp("Jan 1, 2024, 7:05:12 AM").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 1, 1));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (7, 5, 12));

        let ts = parse_timestamp("Nov 4, 2024, 11:59:59 PM").unwrap();
        assert_eq!(ts.hour(), 23);

        assert!(parse_timestamp("2024-06-01 06:00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_read_export() {
        let records = read_activity_records(EXPORT.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].activity_type, "Run");
        assert_eq!(records[0].distance_km, 5.02);
        assert_eq!(records[1].activity_type, "Ride");
        assert_eq!(records[1].distance_km, 1002.5);
        // Empty distance reads as zero
        assert_eq!(records[2].distance_km, 0.0);
    }

    #[test]
    fn test_missing_column() {
        let csv = "Activity Date,Activity Type\n\"Jan 1, 2024, 7:05:12 AM\",Run\n";
        match read_activity_records(csv.as_bytes()) {
            Err(SkylineError::MissingColumn { column }) => assert_eq!(column, DISTANCE_COLUMN),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_rows_report_line() {
        let csv = "Activity Date,Activity Type,Distance\n\"Jan 1, 2024, 7:05:12 AM\",Run,5\nnot a date,Run,5\n";
        match read_activity_records(csv.as_bytes()) {
            Err(SkylineError::InvalidRecord { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("not a date"));
            }
            other => panic!("expected InvalidRecord, got {:?}", other),
        }

        let csv = "Activity Date,Activity Type,Distance\n\"Jan 1, 2024, 7:05:12 AM\",Run,fast\n";
        assert!(matches!(
            read_activity_records(csv.as_bytes()),
            Err(SkylineError::InvalidRecord { line: 2, .. })
        ));
    }

    #[test]
    fn test_load_grid_validates_range_first() {
        let result = load_activity_grid("/definitely/not/here.csv", "Run", "12/1/2023", "1/1/2024");
        assert!(matches!(result, Err(SkylineError::InvalidDateRange { .. })));

        let result = load_activity_grid("/definitely/not/here.csv", "Run", "1/1/2024", "12/31/2024");
        assert!(matches!(result, Err(SkylineError::Io(_))));
    }
}
