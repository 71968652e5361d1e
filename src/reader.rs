//! Raw rows and the CSV row reader.
//!
//! GTFS files are plain CSV with a header line. [`read_csv`] turns any
//! [`Read`] into a lazy iterator of [`RawRow`]s, so a file is never held in
//! memory as a whole.

use std::fs::File;
use std::io::{BufReader, Read};
use std::sync::Arc;

use camino::Utf8Path;
use csv::StringRecord;

use crate::error::ReadError;

/// A lazy, fallible sequence of rows in source order.
pub type Rows = Box<dyn Iterator<Item = Result<RawRow, ReadError>>>;

/// A named input, e.g. the contents of `stops.txt` named `stops`.
pub struct Input {
    pub name: String,
    pub rows: Rows,
}

impl Input {
    pub fn new(name: impl Into<String>, rows: Rows) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// An input over rows which are already in memory.
    pub fn from_rows(name: impl Into<String>, rows: Vec<RawRow>) -> Self {
        Self::new(name, Box::new(rows.into_iter().map(Ok)))
    }
}

impl std::fmt::Debug for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Input({})", self.name)
    }
}

/// One record of a source file, addressable by column name.
#[derive(Debug, Clone)]
pub struct RawRow {
    headers: Arc<StringRecord>,
    record: StringRecord,
}

impl RawRow {
    pub fn new(headers: Arc<StringRecord>, record: StringRecord) -> Self {
        Self { headers, record }
    }

    /// Builds a row from `(column, value)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let (headers, record): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self {
            headers: Arc::new(StringRecord::from(headers)),
            record: StringRecord::from(record),
        }
    }

    /// The value of a column. Missing columns and empty cells are both
    /// `None`, GTFS doesn't distinguish them.
    pub fn get(&self, column: &str) -> Option<&str> {
        let index = self.headers.iter().position(|header| header == column)?;
        self.record.get(index).filter(|value| !value.is_empty())
    }
}

/// Reads CSV with a header line.
pub fn read_csv(reader: impl Read + 'static) -> Result<Rows, ReadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, header)| match i {
            0 => header.trim_start_matches('\u{feff}').trim(),
            _ => header.trim(),
        })
        .collect::<StringRecord>();
    let headers = Arc::new(headers);

    let rows = reader.into_records().map(move |record| {
        let record = record?;
        Ok(RawRow::new(headers.clone(), record))
    });

    Ok(Box::new(rows))
}

/// Opens a GTFS file, naming the input after the file stem.
pub fn open(path: &Utf8Path) -> Result<Input, ReadError> {
    let name = path.file_stem().unwrap_or(path.as_str()).to_owned();
    let file = File::open(path)?;
    let rows = read_csv(BufReader::new(file))?;

    Ok(Input::new(name, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect(data: &'static str) -> Vec<RawRow> {
        read_csv(Cursor::new(data))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_read_by_column_name() {
        let rows = collect("stop_id,stop_name\n1,Alexanderplatz\n2,\"Zoo, Berlin\"\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("stop_name"), Some("Alexanderplatz"));
        assert_eq!(rows[1].get("stop_name"), Some("Zoo, Berlin"));
        assert_eq!(rows[1].get("stop_id"), Some("2"));
    }

    #[test]
    fn test_empty_and_missing_are_none() {
        let rows = collect("a,b\n1,\n");
        assert_eq!(rows[0].get("a"), Some("1"));
        assert_eq!(rows[0].get("b"), None);
        assert_eq!(rows[0].get("c"), None);
    }

    #[test]
    fn test_strips_bom_and_whitespace() {
        let rows = collect("\u{feff}agency_id, agency_name\nx,Acme\n");
        assert_eq!(rows[0].get("agency_id"), Some("x"));
        assert_eq!(rows[0].get("agency_name"), Some("Acme"));
    }

    #[test]
    fn test_short_records_are_allowed() {
        let rows = collect("a,b,c\n1,2\n");
        assert_eq!(rows[0].get("b"), Some("2"));
        assert_eq!(rows[0].get("c"), None);
    }

    #[test]
    fn test_reads_lazily() {
        let mut rows = read_csv(Cursor::new("a\n1\n\"unterminated\n")).unwrap();
        assert_eq!(rows.next().unwrap().unwrap().get("a"), Some("1"));
    }

    #[test]
    fn test_from_pairs() {
        let row = RawRow::from_pairs([("agency_name", "Acme"), ("agency_url", "http://x")]);
        assert_eq!(row.get("agency_url"), Some("http://x"));
    }
}
