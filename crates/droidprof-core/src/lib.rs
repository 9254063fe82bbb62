//! # droidprof-core
//!
//! Sample resource-usage metrics from Android devices while a test subject
//! runs, persist the timestamped samples per run, and aggregate many runs
//! into per-subject and cross-experiment summaries.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use droidprof_core::{AdbDevice, AndroidProfiler, SamplerConfig};
//!
//! let config = SamplerConfig::new(1000, &["cpu".to_string(), "mem".to_string()]);
//! let mut profiler = AndroidProfiler::new(config, "results/pixel/subjectX/android");
//!
//! let device = Arc::new(AdbDevice::new("emulator-5554"));
//! profiler.start_profiling(device, None);
//! // ... run the subject under test ...
//! profiler.stop_profiling();
//! profiler.collect_results("emulator-5554").unwrap();
//! profiler.aggregate_subject().unwrap();
//! ```
//!
//! ## Architecture
//!
//! Device shell → metric extractors → sampling loop → run CSVs →
//! per-subject aggregate → cross-experiment table.
//!
//! The sampling loop re-arms itself at a configured interval, correcting
//! for the latency of the sampling calls, and a single mutex keeps
//! start/stop/tick from racing on the sample table. Aggregation is a
//! two-stage mean: per-run means first, then a mean of means per subject;
//! the tree walker finally flattens every subject's aggregate into one
//! table.

pub mod aggregate;
pub mod config;
pub mod device;
pub mod error;
pub mod metrics;
pub mod profiler;
pub mod sampler;
pub mod table;
pub mod tree;

#[cfg(test)]
pub(crate) mod testutil;

pub use aggregate::{AGGREGATE_FILENAME, FIELD_PREFIX, RunAggregate, aggregate_run_dir, aggregate_subject};
pub use config::{RawConfig, SamplerConfig};
pub use device::{AdbDevice, Device};
pub use error::{Error, Result};
pub use metrics::{MetricKind, cpu_clockspeed, cpu_usage, gpu_memory_usage, mem_usage};
pub use profiler::AndroidProfiler;
pub use sampler::Sampler;
pub use table::{SampleTable, run_filename, write_run};
pub use tree::{SubjectRow, SubjectScope, aggregate_tree, write_subject_rows};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
