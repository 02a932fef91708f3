//! CSV boundary: map tabular uploads onto typed records
//!
//! Header names are trimmed and lower-cased before lookup, so `Student_ID `
//! and `student_id` address the same column. Blank cells and absent columns
//! both become `None`. No other cleaning happens here; canonicalization for
//! matching is the normalizer's job.

use ptrack_common::{Identity, RawEvent, Result};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Anything that can hand the engine a batch of raw events
pub trait EventSource: Send + Sync {
    fn load_events(&self) -> Result<Vec<RawEvent>>;

    /// Human-readable origin for log messages
    fn describe(&self) -> String;
}

impl EventSource for Vec<RawEvent> {
    fn load_events(&self) -> Result<Vec<RawEvent>> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory batch ({} rows)", self.len())
    }
}

/// Event CSV on disk, read fresh on every call
#[derive(Debug, Clone)]
pub struct CsvEventSource {
    path: PathBuf,
}

impl CsvEventSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl EventSource for CsvEventSource {
    fn load_events(&self) -> Result<Vec<RawEvent>> {
        read_events_csv(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Header lookup over one CSV table
struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(headers: &csv::StringRecord) -> Self {
        let mut index = HashMap::new();
        for (i, h) in headers.iter().enumerate() {
            // First column wins if a header repeats after normalization
            index.entry(h.trim().to_lowercase()).or_insert(i);
        }
        Self { index }
    }

    fn get(&self, row: &csv::StringRecord, name: &str) -> Option<String> {
        self.index
            .get(name)
            .and_then(|&i| row.get(i))
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string)
    }

    fn get_or_empty(&self, row: &csv::StringRecord, name: &str) -> String {
        self.get(row, name).unwrap_or_default()
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new().flexible(true).from_reader(reader)
}

/// Parse raw events from any CSV reader
pub fn parse_events<R: Read>(reader: R) -> Result<Vec<RawEvent>> {
    let mut reader = csv_reader(reader);
    let columns = Columns::new(reader.headers()?);

    let mut events = Vec::new();
    for record in reader.records() {
        let row = record?;
        events.push(RawEvent {
            student_id: columns.get(&row, "student_id"),
            name: columns.get(&row, "name"),
            email: columns.get(&row, "email"),
            phone: columns.get(&row, "phone"),
            company_or_organizer: columns.get(&row, "company_or_organizer"),
            event_type: columns.get_or_empty(&row, "event_type"),
            event_date: columns.get_or_empty(&row, "event_date"),
            result: columns.get_or_empty(&row, "result"),
            lpa: columns.get(&row, "lpa"),
            attendance_status: columns.get(&row, "attendance_status"),
        });
    }

    Ok(events)
}

/// Parse roster rows from any CSV reader
///
/// Rows missing `student_id` or `class_id` come back with empty strings; the
/// roster store decides what to do with them.
pub fn parse_roster<R: Read>(reader: R) -> Result<Vec<Identity>> {
    let mut reader = csv_reader(reader);
    let columns = Columns::new(reader.headers()?);

    let mut roster = Vec::new();
    for record in reader.records() {
        let row = record?;
        roster.push(Identity {
            student_id: columns.get_or_empty(&row, "student_id").trim().to_string(),
            name: columns.get(&row, "name"),
            email: columns.get(&row, "email"),
            phone: columns.get(&row, "phone"),
            class_id: columns.get_or_empty(&row, "class_id").trim().to_string(),
        });
    }

    Ok(roster)
}

pub fn read_events_csv(path: &Path) -> Result<Vec<RawEvent>> {
    let file = std::fs::File::open(path)?;
    let events = parse_events(file)?;
    tracing::debug!(path = %path.display(), rows = events.len(), "Read event CSV");
    Ok(events)
}

pub fn read_roster_csv(path: &Path) -> Result<Vec<Identity>> {
    let file = std::fs::File::open(path)?;
    let roster = parse_roster(file)?;
    tracing::debug!(path = %path.display(), rows = roster.len(), "Read roster CSV");
    Ok(roster)
}
