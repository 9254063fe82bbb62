//! Sample tables and their CSV persistence.
//!
//! A [`SampleTable`] is a fixed header row plus an append-only sequence of
//! sample rows, one per tick. One table belongs to exactly one run: it is
//! reset when sampling starts and frozen when the run's file is written.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

/// Header row plus ordered sample rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl SampleTable {
    /// Create an empty table with the given header.
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Append one complete sample row. Rows are never edited afterwards.
    pub fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.header.len());
        self.rows.push(row);
    }

    /// Values of one column, looked up by header name.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.header.iter().position(|h| h == name)?;
        Some(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    /// Serialize header then rows as comma-separated text, creating or
    /// truncating `path`.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);
        writeln!(w, "{}", self.header.join(","))?;
        for row in &self.rows {
            writeln!(w, "{}", row.join(","))?;
        }
        w.flush()?;
        Ok(())
    }

    /// Read a persisted table back: first line is the header, every further
    /// non-empty line one row.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut lines = BufReader::new(file).lines();

        let header_line = lines.next().transpose()?.ok_or_else(|| Error::MalformedTable {
            path: path.to_path_buf(),
            reason: "missing header row".to_string(),
        })?;
        let header: Vec<String> = header_line.split(',').map(str::to_string).collect();

        let mut table = Self::new(header);
        for line in lines {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let row: Vec<String> = line.split(',').map(str::to_string).collect();
            if row.len() != table.header.len() {
                return Err(Error::MalformedTable {
                    path: path.to_path_buf(),
                    reason: format!(
                        "row has {} fields, header has {}",
                        row.len(),
                        table.header.len()
                    ),
                });
            }
            table.rows.push(row);
        }
        Ok(table)
    }
}

/// Filename for one run's output: `{device_id}_{Y.m.d_HMS}.csv`, UTC.
pub fn run_filename(device_id: &str) -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    run_filename_at(device_id, secs)
}

fn run_filename_at(device_id: &str, secs: u64) -> String {
    let (year, month, day, hour, min, sec) = secs_to_utc(secs);
    format!("{device_id}_{year:04}.{month:02}.{day:02}_{hour:02}{min:02}{sec:02}.csv")
}

/// Write a run's table into `output_dir` under its timestamped name,
/// returning the path written.
pub fn write_run(table: &SampleTable, output_dir: &Path, device_id: &str) -> Result<PathBuf> {
    let path = output_dir.join(run_filename(device_id));
    table.write_csv(&path)?;
    Ok(path)
}

/// Convert seconds since Unix epoch to (year, month, day, hour, minute,
/// second) UTC. No leap second handling.
fn secs_to_utc(secs: u64) -> (u64, u64, u64, u64, u64, u64) {
    let sec = secs % 60;
    let min = (secs / 60) % 60;
    let hour = (secs / 3600) % 24;

    let mut days = secs / 86400;
    let mut year = 1970u64;

    loop {
        let days_in_year = if is_leap(year) { 366 } else { 365 };
        if days < days_in_year {
            break;
        }
        days -= days_in_year;
        year += 1;
    }

    let months_days: [u64; 12] = if is_leap(year) {
        [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    } else {
        [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    };

    let mut month = 0u64;
    for (i, &md) in months_days.iter().enumerate() {
        if days < md {
            month = i as u64 + 1;
            break;
        }
        days -= md;
    }
    let day = days + 1;

    (year, month, day, hour, min, sec)
}

fn is_leap(year: u64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}
