//! Conversion of log records into KML text fragments.
//!
//! The converters are pure functions over a single [`Record`]. Each one checks
//! that the columns it needs are present before touching any value, and
//! reports every missing column at once.
//!
//! The aggregation helpers map a whole pass of records through a converter,
//! keeping row order.

use thiserror::Error;

use crate::core::reader::Record;
use crate::core::source::LoaderError;

/// Log column holding the date, e.g. `2023-01-01`.
pub const DATE_COLUMN: &str = "Date";
/// Log column holding the time of day with a one-character unit suffix.
pub const TIME_COLUMN: &str = "Time";
/// Log column holding `lat lon` separated by whitespace.
pub const GPS_COLUMN: &str = "GPS";
/// Log column holding the altitude in metres.
pub const ALTITUDE_COLUMN: &str = "Alt(m)";

/// Altitude written for every track point.
const TRACK_ALTITUDE: &str = "0";

/// Errors raised while converting a single record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KmlError {
    #[error("missing required data columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("column {0} is empty")]
    EmptyField(String),
}

/// Errors raised while converting a whole pass of records.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Kml(#[from] KmlError),
}

/// Result type for single-record conversions.
pub type Result<T> = std::result::Result<T, KmlError>;

/// Check that `record` has every column in `columns`.
///
/// # Errors
///
/// Returns [`KmlError::MissingColumns`] listing all absent columns, in the
/// order they were asked for.
pub fn require_columns(record: &Record, columns: &[&str]) -> Result<()> {
    let missing: Vec<String> = columns
        .iter()
        .filter(|column| !record.contains_key(column))
        .map(|column| column.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(KmlError::MissingColumns(missing))
    }
}

fn field<'a>(record: &'a Record, column: &str) -> Result<&'a str> {
    record
        .get(column)
        .ok_or_else(|| KmlError::MissingColumns(vec![column.to_string()]))
}

/// `GPS` tokens in reverse order, i.e. `lon` before `lat`. Leading and
/// trailing whitespace never produces an empty token.
fn reversed_gps(record: &Record) -> Result<Vec<&str>> {
    Ok(field(record, GPS_COLUMN)?.split_whitespace().rev().collect())
}

/// KML timestamp for a record: `<Date>T<Time>Z`.
///
/// The last character of `Time` is a unit marker and is dropped.
///
/// # Errors
///
/// Fails if `Date` or `Time` is missing, or if `Time` is empty.
pub fn to_datetime(record: &Record) -> Result<String> {
    require_columns(record, &[DATE_COLUMN, TIME_COLUMN])?;

    let date = field(record, DATE_COLUMN)?;
    let mut time = field(record, TIME_COLUMN)?.chars();
    if time.next_back().is_none() {
        return Err(KmlError::EmptyField(TIME_COLUMN.to_string()));
    }

    Ok(format!("{}T{}Z", date, time.as_str()))
}

/// One `lon,lat,alt` triple for a `<LineString>` coordinate list.
///
/// # Example
///
/// ```
/// use otx_log::{kml, Record};
///
/// let record: Record = [("GPS", "12.5 -71.2"), ("Alt(m)", "340")].into_iter().collect();
/// assert_eq!(kml::to_linestring_coordinate(&record).unwrap(), "-71.2,12.5,340");
/// ```
pub fn to_linestring_coordinate(record: &Record) -> Result<String> {
    require_columns(record, &[GPS_COLUMN, ALTITUDE_COLUMN])?;

    let mut parts = reversed_gps(record)?;
    parts.push(field(record, ALTITUDE_COLUMN)?);
    Ok(parts.join(","))
}

/// One `lon lat 0` point for a `<gx:Track>`.
pub fn to_track_coordinate(record: &Record) -> Result<String> {
    require_columns(record, &[GPS_COLUMN])?;

    let mut parts = reversed_gps(record)?;
    parts.push(TRACK_ALTITUDE);
    Ok(parts.join(" "))
}

fn map_records<I, F>(records: I, convert: F) -> std::result::Result<Vec<String>, ConvertError>
where
    I: IntoIterator<Item = std::result::Result<Record, LoaderError>>,
    F: Fn(&Record) -> Result<String>,
{
    records
        .into_iter()
        .map(|record| -> std::result::Result<String, ConvertError> { Ok(convert(&record?)?) })
        .collect()
}

/// Full `<coordinates>` content: every record's linestring triple, joined by
/// a single space.
pub fn linestring_coordinates<I>(records: I) -> std::result::Result<String, ConvertError>
where
    I: IntoIterator<Item = std::result::Result<Record, LoaderError>>,
{
    Ok(map_records(records, to_linestring_coordinate)?.join(" "))
}

/// Track points for every record, in order.
pub fn track_coordinates<I>(records: I) -> std::result::Result<Vec<String>, ConvertError>
where
    I: IntoIterator<Item = std::result::Result<Record, LoaderError>>,
{
    map_records(records, to_track_coordinate)
}

/// Track timestamps for every record, in order.
pub fn track_timestamps<I>(records: I) -> std::result::Result<Vec<String>, ConvertError>
where
    I: IntoIterator<Item = std::result::Result<Record, LoaderError>>,
{
    map_records(records, to_datetime)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_to_datetime() {
        let rec = record(&[("Date", "2023-01-01"), ("Time", "120000X")]);
        assert_eq!(to_datetime(&rec).unwrap(), "2023-01-01T120000Z");
    }

    #[test]
    fn test_to_datetime_drops_one_multibyte_char() {
        let rec = record(&[("Date", "2023-01-01"), ("Time", "12:00:00µ")]);
        assert_eq!(to_datetime(&rec).unwrap(), "2023-01-01T12:00:00Z");
    }

    #[test]
    fn test_to_datetime_missing_both_columns() {
        let err = to_datetime(&Record::new()).unwrap_err();
        assert_eq!(
            err,
            KmlError::MissingColumns(vec!["Date".to_string(), "Time".to_string()])
        );
        assert_eq!(err.to_string(), "missing required data columns: Date, Time");
    }

    #[test]
    fn test_to_datetime_empty_time() {
        let rec = record(&[("Date", "2023-01-01"), ("Time", "")]);
        assert_eq!(
            to_datetime(&rec).unwrap_err(),
            KmlError::EmptyField("Time".to_string())
        );
    }

    #[test]
    fn test_to_linestring_coordinate() {
        let rec = record(&[("GPS", "12.5 -71.2"), ("Alt(m)", "340")]);
        assert_eq!(to_linestring_coordinate(&rec).unwrap(), "-71.2,12.5,340");
    }

    #[test]
    fn test_to_linestring_coordinate_whitespace_runs() {
        let rec = record(&[("GPS", "  12.5 \t  -71.2 "), ("Alt(m)", "340")]);
        assert_eq!(to_linestring_coordinate(&rec).unwrap(), "-71.2,12.5,340");
    }

    #[test]
    fn test_to_linestring_coordinate_missing_altitude() {
        let rec = record(&[("GPS", "12.5 -71.2")]);
        assert_eq!(
            to_linestring_coordinate(&rec).unwrap_err(),
            KmlError::MissingColumns(vec!["Alt(m)".to_string()])
        );
    }

    #[test]
    fn test_to_track_coordinate() {
        let rec = record(&[("GPS", "12.5 -71.2")]);
        assert_eq!(to_track_coordinate(&rec).unwrap(), "-71.2 12.5 0");
    }

    #[test]
    fn test_to_track_coordinate_missing_gps() {
        let rec = record(&[("Alt(m)", "340")]);
        assert_eq!(
            to_track_coordinate(&rec).unwrap_err(),
            KmlError::MissingColumns(vec!["GPS".to_string()])
        );
    }

    #[test]
    fn test_require_columns_reports_all_missing() {
        let rec = record(&[("GPS", "1 2")]);
        assert!(require_columns(&rec, &["GPS"]).is_ok());
        assert_eq!(
            require_columns(&rec, &["Date", "GPS", "Alt(m)"]).unwrap_err(),
            KmlError::MissingColumns(vec!["Date".to_string(), "Alt(m)".to_string()])
        );
    }

    fn three_points() -> Vec<std::result::Result<Record, LoaderError>> {
        vec![
            Ok(record(&[("GPS", "1 2"), ("Alt(m)", "10"), ("Date", "d"), ("Time", "t1s")])),
            Ok(record(&[("GPS", "3 4"), ("Alt(m)", "20"), ("Date", "d"), ("Time", "t2s")])),
            Ok(record(&[("GPS", "5 6"), ("Alt(m)", "30"), ("Date", "d"), ("Time", "t3s")])),
        ]
    }

    #[test]
    fn test_aggregations_keep_order() {
        assert_eq!(
            linestring_coordinates(three_points()).unwrap(),
            "2,1,10 4,3,20 6,5,30"
        );

        let track = track_coordinates(three_points()).unwrap();
        assert_eq!(track, vec!["2 1 0", "4 3 0", "6 5 0"]);

        let when = track_timestamps(three_points()).unwrap();
        assert_eq!(when, vec!["dTt1Z", "dTt2Z", "dTt3Z"]);
    }

    #[test]
    fn test_aggregation_stops_on_bad_record() {
        let records = vec![
            Ok(record(&[("GPS", "1 2"), ("Alt(m)", "10")])),
            Ok(record(&[("GPS", "3 4")])),
        ];

        match linestring_coordinates(records) {
            Err(ConvertError::Kml(KmlError::MissingColumns(cols))) => {
                assert_eq!(cols, vec!["Alt(m)".to_string()])
            }
            other => panic!("Expected MissingColumns error, got {:?}", other),
        }
    }

    #[test]
    fn test_aggregation_of_nothing() {
        let records: Vec<std::result::Result<Record, LoaderError>> = Vec::new();
        assert_eq!(linestring_coordinates(records).unwrap(), "");
    }
}
