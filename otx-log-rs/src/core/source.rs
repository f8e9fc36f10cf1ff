//! Seekable CSV source for flight telemetry logs.
//!
//! A [`LogSource`] owns the open file handle, caches the header row read at
//! open time and can seek back to the first data row as many times as needed.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{Position, Reader, ReaderBuilder, StringRecord};
use log::debug;
use thiserror::Error;

/// Errors that can occur while opening or reading a log.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),

    #[error("Duplicate column in header: {0}")]
    DuplicateColumn(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),
}

impl LoaderError {
    /// Returns true for errors raised while acquiring or reading the file
    /// itself, as opposed to errors about its columns.
    pub fn is_resource_error(&self) -> bool {
        matches!(
            self,
            LoaderError::Io(_) | LoaderError::Csv(_) | LoaderError::EmptyFile(_)
        )
    }
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// An open CSV log positioned somewhere in its data rows.
#[derive(Debug)]
pub struct LogSource {
    path: PathBuf,
    reader: Reader<File>,
    header: Vec<String>,
    /// Position just past the header row.
    data_start: Position,
}

impl LogSource {
    /// Open a CSV log and consume its header row.
    ///
    /// Rows may be shorter (or longer) than the header; the reader is
    /// configured as flexible so ragged rows are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, is not valid UTF-8 CSV,
    /// has no header row, or repeats a column name in its header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut first = StringRecord::new();
        if !reader.read_record(&mut first)? {
            return Err(LoaderError::EmptyFile(path.to_path_buf()));
        }

        let header: Vec<String> = first.iter().map(str::to_string).collect();
        let mut seen = HashSet::with_capacity(header.len());
        for name in &header {
            if !seen.insert(name.as_str()) {
                return Err(LoaderError::DuplicateColumn(name.clone()));
            }
        }

        let data_start = reader.position().clone();
        debug!(
            "Opened {} with {} columns (data starts at byte {})",
            path.display(),
            header.len(),
            data_start.byte()
        );

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            header,
            data_start,
        })
    }

    /// Column names from the first row of the file.
    #[inline]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Path this source was opened from.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Seek back so the next row read is the first data row.
    pub fn rewind(&mut self) -> Result<()> {
        self.reader.seek(self.data_start.clone())?;
        Ok(())
    }

    /// Read the next data row into `row`.
    ///
    /// Returns `false` once the end of the file is reached.
    pub fn next_row(&mut self, row: &mut StringRecord) -> Result<bool> {
        Ok(self.reader.read_record(row)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_log(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_open_reads_header() -> Result<()> {
        let file = write_log(&["Date,Time,GPS,Alt(m)", "2023-01-01,120000X,12.5 -71.2,340"]);

        let source = LogSource::open(file.path())?;
        assert_eq!(source.header(), ["Date", "Time", "GPS", "Alt(m)"]);
        assert_eq!(source.path(), file.path());

        Ok(())
    }

    #[test]
    fn test_first_row_after_open_is_data() -> Result<()> {
        let file = write_log(&["a,b", "1,2", "3,4"]);
        let mut source = LogSource::open(file.path())?;

        let mut row = StringRecord::new();
        assert!(source.next_row(&mut row)?);
        assert_eq!(row.get(0), Some("1"));

        Ok(())
    }

    #[test]
    fn test_rewind_returns_to_first_data_row() -> Result<()> {
        let file = write_log(&["a,b", "1,2", "3,4"]);
        let mut source = LogSource::open(file.path())?;

        let mut row = StringRecord::new();
        while source.next_row(&mut row)? {}

        source.rewind()?;
        assert!(source.next_row(&mut row)?);
        assert_eq!(row.iter().collect::<Vec<_>>(), vec!["1", "2"]);

        // Rewinding twice in a row is harmless.
        source.rewind()?;
        source.rewind()?;
        assert!(source.next_row(&mut row)?);
        assert_eq!(row.get(1), Some("2"));

        Ok(())
    }

    #[test]
    fn test_ragged_rows_are_accepted() -> Result<()> {
        let file = write_log(&["a,b,c", "1", "1,2,3,4"]);
        let mut source = LogSource::open(file.path())?;

        let mut row = StringRecord::new();
        assert!(source.next_row(&mut row)?);
        assert_eq!(row.len(), 1);
        assert!(source.next_row(&mut row)?);
        assert_eq!(row.len(), 4);
        assert!(!source.next_row(&mut row)?);

        Ok(())
    }

    #[test]
    fn test_missing_file_is_resource_error() {
        let err = LogSource::open("/nonexistent/otx/flight.csv").unwrap_err();
        assert!(matches!(err, LoaderError::Io(_)));
        assert!(err.is_resource_error());
    }

    #[test]
    fn test_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let err = LogSource::open(file.path()).unwrap_err();
        assert!(matches!(err, LoaderError::EmptyFile(_)));
    }

    #[test]
    fn test_invalid_utf8_is_resource_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"a,b\n\xff\xfe,1\n").unwrap();
        file.flush().unwrap();

        let mut source = LogSource::open(file.path()).unwrap();
        let mut row = StringRecord::new();
        let err = source.next_row(&mut row).unwrap_err();
        assert!(err.is_resource_error());
    }

    #[test]
    fn test_duplicate_header_rejected() {
        let file = write_log(&["GPS,Alt(m),GPS", "1,2,3"]);
        match LogSource::open(file.path()).unwrap_err() {
            LoaderError::DuplicateColumn(name) => assert_eq!(name, "GPS"),
            other => panic!("Expected DuplicateColumn error, got {:?}", other),
        }
    }
}
