//! Record-level view over a flight log.
//!
//! [`LogReader`] turns the raw rows of a [`LogSource`] into [`Record`]s,
//! either full width or restricted to a projection of named columns. Every
//! call to [`LogReader::records`] starts a fresh pass from the first data row.

use std::iter::FusedIterator;
use std::path::Path;

use csv::StringRecord;
use log::{debug, trace};

use super::source::{LoaderError, LogSource, Result};
use crate::kml::{self, ConvertError};

/// One data row, as an ordered mapping from column name to raw cell value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty record with room for `capacity` fields.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Sets `name` to `value`, returning the previous value if the column was
    /// already present. New columns keep insertion order.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }

    /// Value of a column, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    #[inline]
    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Column names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(key, _)| key.as_str())
    }

    /// `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Positional zip of header and cells. Trailing columns without a cell
    /// are left out of the record entirely.
    fn zip(header: &[String], row: &StringRecord) -> Self {
        let mut record = Self::with_capacity(header.len().min(row.len()));
        for (name, value) in header.iter().zip(row.iter()) {
            record.fields.push((name.clone(), value.to_string()));
        }
        record
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

/// Ordered set of column names resolved to their header positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    columns: Vec<(String, usize)>,
}

impl Projection {
    /// Resolve `names` against `header`, left to right.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::ColumnNotFound`] for the first name that is not
    /// in the header.
    pub fn resolve<I, S>(header: &[String], names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut columns: Vec<(String, usize)> = Vec::new();
        for name in names {
            let name = name.as_ref();
            let index = header
                .iter()
                .position(|column| column == name)
                .ok_or_else(|| LoaderError::ColumnNotFound(name.to_string()))?;
            if !columns.iter().any(|(existing, _)| existing == name) {
                columns.push((name.to_string(), index));
            }
        }
        Ok(Self { columns })
    }

    /// Projected column names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Build a record from the current row. A column past the end of a short
    /// row is still present, with an empty value.
    fn apply(&self, row: &StringRecord) -> Record {
        let mut record = Record::with_capacity(self.columns.len());
        for (name, index) in &self.columns {
            let value = row.get(*index).unwrap_or_default();
            record.fields.push((name.clone(), value.to_string()));
        }
        record
    }
}

/// A reusable, restartable record view over one CSV log.
#[derive(Debug)]
pub struct LogReader {
    source: LogSource,
    projection: Option<Projection>,
}

impl LogReader {
    /// Open a log in full-width mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened as CSV (see
    /// [`LogSource::open`]).
    ///
    /// # Example
    ///
    /// ```no_run
    /// use otx_log::LogReader;
    ///
    /// let mut reader = LogReader::open("flight.csv").unwrap();
    /// reader.select_columns(["Date", "Time", "GPS"]).unwrap();
    /// for record in reader.records().unwrap() {
    ///     println!("{:?}", record.unwrap().get("GPS"));
    /// }
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            source: LogSource::open(path)?,
            projection: None,
        })
    }

    #[inline]
    pub fn header(&self) -> &[String] {
        self.source.header()
    }

    #[inline]
    pub fn path(&self) -> &Path {
        self.source.path()
    }

    /// Restrict records to `names`, replacing any earlier selection.
    ///
    /// Every name is checked against the header before anything is read, so
    /// an unknown column fails here rather than during iteration. On failure
    /// the previous selection is left untouched.
    pub fn select_columns<I, S>(&mut self, names: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let projection = Projection::resolve(self.source.header(), names)?;
        debug!(
            "Selected columns [{}] from {}",
            projection.names().collect::<Vec<_>>().join(", "),
            self.source.path().display()
        );
        self.projection = Some(projection);
        Ok(self)
    }

    /// Go back to full-width records.
    pub fn clear_selection(&mut self) -> &mut Self {
        self.projection = None;
        self
    }

    /// The active projection, if any.
    #[inline]
    pub fn selected_columns(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    /// Start a new pass over the data rows.
    ///
    /// The source is rewound first, so each call yields the same sequence
    /// regardless of how far an earlier pass got.
    pub fn records(&mut self) -> Result<Records<'_>> {
        self.source.rewind()?;
        trace!("New pass over {}", self.source.path().display());
        Ok(Records {
            source: &mut self.source,
            projection: self.projection.as_ref(),
            row: StringRecord::new(),
            done: false,
        })
    }

    /// The final record of the log, or `None` when it has no data rows.
    pub fn last_record(&mut self) -> Result<Option<Record>> {
        let mut last = None;
        for record in self.records()? {
            last = Some(record?);
        }
        Ok(last)
    }

    /// Space-separated `lon,lat,alt` coordinates for every record.
    pub fn kml_linestring_coordinates(&mut self) -> std::result::Result<String, ConvertError> {
        kml::linestring_coordinates(self.records()?)
    }

    /// `lon lat 0` track points for every record.
    pub fn kml_track_coords(&mut self) -> std::result::Result<Vec<String>, ConvertError> {
        kml::track_coordinates(self.records()?)
    }
}

/// Lazy iterator over the records of one pass.
pub struct Records<'r> {
    source: &'r mut LogSource,
    projection: Option<&'r Projection>,
    row: StringRecord,
    done: bool,
}

impl Iterator for Records<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.source.next_row(&mut self.row) {
            Ok(true) => Some(Ok(match self.projection {
                Some(projection) => projection.apply(&self.row),
                None => Record::zip(self.source.header(), &self.row),
            })),
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for Records<'_> {}
