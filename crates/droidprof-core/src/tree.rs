//! Cross-experiment flattening of per-subject aggregates.
//!
//! Walks a results tree shaped
//! `<root>/<device>/<subject>/[<browser>/]android/Aggregated.csv` and
//! assembles one flat row per discovered leaf. Whether a leaf sits directly
//! under the subject or one browser tier deeper is captured as a tagged
//! scope on the row, not re-derived from filesystem shape downstream.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::aggregate::{AGGREGATE_FILENAME, RunAggregate};
use crate::error::Result;

/// Name of the per-metric-source subdirectory holding the aggregate file.
const SOURCE_DIR: &str = "android";

/// Where a subject's aggregate was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectScope {
    /// Aggregate sits directly under the subject.
    Subject,
    /// Aggregate sits under one browser tier below the subject.
    Browser(String),
}

impl SubjectScope {
    pub fn browser(&self) -> Option<&str> {
        match self {
            Self::Subject => None,
            Self::Browser(name) => Some(name),
        }
    }
}

/// One flat result row: device, subject, scope, and the subject's
/// aggregated metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectRow {
    pub device: String,
    pub subject: String,
    pub scope: SubjectScope,
    pub metrics: RunAggregate,
}

/// Walk the results tree and collect one row per leaf with a persisted
/// aggregate. Leaves without the aggregate subdirectory (or file) are
/// skipped; a subject may simply lack this metric source.
pub fn aggregate_tree(root: &Path) -> Result<Vec<SubjectRow>> {
    let mut rows = Vec::new();

    for (device, device_dir) in subdirs(root)? {
        for (subject, subject_dir) in subdirs(&device_dir)? {
            if let Some(metrics) = read_leaf(&subject_dir)? {
                rows.push(SubjectRow {
                    device: device.clone(),
                    subject,
                    scope: SubjectScope::Subject,
                    metrics,
                });
                continue;
            }
            for (browser, browser_dir) in subdirs(&subject_dir)? {
                if let Some(metrics) = read_leaf(&browser_dir)? {
                    rows.push(SubjectRow {
                        device: device.clone(),
                        subject: subject.clone(),
                        scope: SubjectScope::Browser(browser),
                        metrics,
                    });
                }
            }
        }
    }

    Ok(rows)
}

/// Flatten rows into one CSV table.
///
/// Columns: `device`, `subject`, `browser` (only if some row has browser
/// scope), then the sorted union of metric names. Cells a row has no value
/// for are left empty.
pub fn write_subject_rows(path: &Path, rows: &[SubjectRow]) -> Result<()> {
    let has_browser = rows.iter().any(|r| r.scope.browser().is_some());
    let metric_names: BTreeSet<&str> = rows
        .iter()
        .flat_map(|r| r.metrics.field_names())
        .collect();

    let file = File::create(path)?;
    let mut w = BufWriter::new(file);

    let mut header = vec!["device", "subject"];
    if has_browser {
        header.push("browser");
    }
    header.extend(metric_names.iter().copied());
    writeln!(w, "{}", header.join(","))?;

    for row in rows {
        let mut cells = vec![row.device.clone(), row.subject.clone()];
        if has_browser {
            cells.push(row.scope.browser().unwrap_or_default().to_string());
        }
        for &name in &metric_names {
            cells.push(
                row.metrics
                    .get(name)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        writeln!(w, "{}", cells.join(","))?;
    }
    w.flush()?;
    Ok(())
}

/// Read a leaf's aggregate if `<dir>/android/Aggregated.csv` exists.
fn read_leaf(dir: &Path) -> Result<Option<RunAggregate>> {
    let aggregate_path = dir.join(SOURCE_DIR).join(AGGREGATE_FILENAME);
    if !aggregate_path.is_file() {
        return Ok(None);
    }
    RunAggregate::read_csv(&aggregate_path).map(Some)
}

/// Immediate subdirectories of `dir` as (name, path), sorted by name.
fn subdirs(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            out.push((entry.file_name().to_string_lossy().into_owned(), path));
        }
    }
    out.sort();
    Ok(out)
}
