//! High-level profiler facade tying sampling, persistence, and aggregation
//! together the way an experiment driver consumes them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::aggregate;
use crate::config::SamplerConfig;
use crate::device::Device;
use crate::error::Result;
use crate::sampler::Sampler;
use crate::table;
use crate::tree;

/// One profiler instance drives the sample → persist → aggregate lifecycle
/// for a sequence of runs sharing a configuration.
pub struct AndroidProfiler {
    sampler: Sampler,
    output_dir: PathBuf,
}

impl AndroidProfiler {
    pub fn new(config: SamplerConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            sampler: Sampler::new(config),
            output_dir: output_dir.into(),
        }
    }

    /// Redirect run output, e.g. when the experiment moves to the next
    /// subject.
    pub fn set_output(&mut self, output_dir: impl Into<PathBuf>) {
        self.output_dir = output_dir.into();
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Begin sampling `device` for one run.
    pub fn start_profiling(&mut self, device: Arc<dyn Device>, app: Option<String>) {
        self.sampler.start(device, app);
    }

    /// Request the current run to end. Never blocks on an in-flight tick.
    pub fn stop_profiling(&self) {
        self.sampler.stop();
    }

    /// Persist the finished run's samples under the output directory as
    /// `{device_id}_{timestamp}.csv`, returning the path written. Surfaces
    /// a tick error if one terminated the run.
    pub fn collect_results(&mut self, device_id: &str) -> Result<PathBuf> {
        let table = self.sampler.finish()?;
        table::write_run(&table, &self.output_dir, device_id)
    }

    /// Reduce all run files in the output directory into its
    /// `Aggregated.csv`.
    pub fn aggregate_subject(&self) -> Result<PathBuf> {
        aggregate::aggregate_subject(&self.output_dir)
    }

    /// Flatten a whole experiment tree into one final table at
    /// `output_file`.
    pub fn aggregate_end(data_dir: &Path, output_file: &Path) -> Result<()> {
        let rows = tree::aggregate_tree(data_dir)?;
        tree::write_subject_rows(output_file, &rows)
    }
}
