//! Per-subject aggregation of run logs.
//!
//! Two-stage mean reduction: every run file is reduced to per-field means
//! across its sample rows, then the per-run means are averaged field by
//! field across all runs in the directory. Field names are prefixed with
//! `android_` and emitted in lexicographic order.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::table::SampleTable;

/// Name of the per-subject aggregate file inside a run directory.
pub const AGGREGATE_FILENAME: &str = "Aggregated.csv";

/// Prefix applied to every aggregated field name.
pub const FIELD_PREFIX: &str = "android_";

/// Averaged metrics for one subject: prefixed field name → mean value.
///
/// `BTreeMap` keeps fields in the lexicographic order the output format
/// requires.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunAggregate {
    fields: BTreeMap<String, f64>,
}

impl RunAggregate {
    pub fn get(&self, field: &str) -> Option<f64> {
        self.fields.get(field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Write as a one-row CSV: sorted header, then the averaged values.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);
        let header: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        writeln!(w, "{}", header.join(","))?;
        let values: Vec<String> = self.fields.values().map(|v| v.to_string()).collect();
        writeln!(w, "{}", values.join(","))?;
        w.flush()?;
        Ok(())
    }

    /// Read a persisted aggregate file (header + one data row).
    pub fn read_csv(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut lines = BufReader::new(file).lines();

        let header = lines.next().transpose()?.ok_or_else(|| Error::MalformedTable {
            path: path.to_path_buf(),
            reason: "missing header row".to_string(),
        })?;
        let row = lines.next().transpose()?.ok_or_else(|| Error::MalformedTable {
            path: path.to_path_buf(),
            reason: "missing data row".to_string(),
        })?;

        let names: Vec<&str> = header.split(',').collect();
        let values: Vec<&str> = row.split(',').collect();
        if names.len() != values.len() {
            return Err(Error::MalformedTable {
                path: path.to_path_buf(),
                reason: format!(
                    "header has {} fields, data row has {}",
                    names.len(),
                    values.len()
                ),
            });
        }

        let mut fields = BTreeMap::new();
        for (name, value) in names.iter().zip(&values) {
            let parsed = value.trim().parse::<f64>().map_err(|_| Error::MalformedTable {
                path: path.to_path_buf(),
                reason: format!("field {name} has non-numeric value {value:?}"),
            })?;
            fields.insert((*name).to_string(), parsed);
        }
        Ok(Self { fields })
    }
}

/// Reduce all run files in `dir` to one aggregate.
///
/// Every file in `dir` except a previously written `Aggregated.csv` counts
/// as one run. A directory with no run files, or a run file with no sample
/// rows, cannot be averaged and fails with
/// [`Error::EmptyAggregationSet`].
pub fn aggregate_run_dir(dir: &Path) -> Result<RunAggregate> {
    let mut run_files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file())
        .filter(|p| p.file_name().is_none_or(|n| n != AGGREGATE_FILENAME))
        .collect();
    run_files.sort();

    let mut run_means: Vec<BTreeMap<String, f64>> = Vec::with_capacity(run_files.len());
    for run_file in &run_files {
        run_means.push(run_mean(run_file)?);
    }

    let Some(first) = run_means.first() else {
        return Err(Error::EmptyAggregationSet {
            path: dir.to_path_buf(),
            reason: "no run files".to_string(),
        });
    };

    // Every run must expose the same field set for the second-stage mean to
    // be defined.
    let field_names: Vec<&String> = first.keys().collect();
    for (means, file) in run_means.iter().zip(&run_files) {
        if means.keys().collect::<Vec<_>>() != field_names {
            return Err(Error::MalformedTable {
                path: file.clone(),
                reason: "run files disagree on metric columns".to_string(),
            });
        }
    }

    let run_count = run_means.len() as f64;
    let mut fields = BTreeMap::new();
    for name in field_names {
        let sum: f64 = run_means.iter().map(|m| m[name]).sum();
        fields.insert(format!("{FIELD_PREFIX}{name}"), sum / run_count);
    }
    Ok(RunAggregate { fields })
}

/// Aggregate `logs_dir` and write the result to its `Aggregated.csv`,
/// returning the path written.
pub fn aggregate_subject(logs_dir: &Path) -> Result<PathBuf> {
    let aggregate = aggregate_run_dir(logs_dir)?;
    let path = logs_dir.join(AGGREGATE_FILENAME);
    aggregate.write_csv(&path)?;
    Ok(path)
}

/// Per-field mean across one run's sample rows, `datetime` excluded.
fn run_mean(run_file: &Path) -> Result<BTreeMap<String, f64>> {
    let table = SampleTable::read_csv(run_file)?;
    if table.is_empty() {
        return Err(Error::EmptyAggregationSet {
            path: run_file.to_path_buf(),
            reason: "run has no sample rows".to_string(),
        });
    }

    let row_count = table.len() as f64;
    let mut means = BTreeMap::new();
    for name in table.header() {
        if name == "datetime" {
            continue;
        }
        let values = table.column(name).unwrap_or_default();
        let mut sum = 0.0;
        for value in values {
            sum += value.trim().parse::<f64>().map_err(|_| Error::MalformedTable {
                path: run_file.to_path_buf(),
                reason: format!("column {name} has non-numeric value {value:?}"),
            })?;
        }
        means.insert(name.clone(), sum / row_count);
    }
    Ok(means)
}
