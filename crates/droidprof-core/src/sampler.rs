//! The sampling state machine: start, self-rescheduling ticks, stop.
//!
//! One [`Sampler`] owns one run's sample table. A single mutex guards the
//! running flag, the table, and the first tick error, so no two ticks and
//! no tick concurrent with a stop observe the table inconsistently.
//!
//! Ticks execute on a dedicated worker thread that loops instead of
//! re-arming a timer: sample under the lock, correct the next delay for the
//! time the extraction itself took, then wait out the delay in small slices
//! so a stop request is honored promptly.
//!
//! `stop` never blocks on an in-flight tick. A tick that has already passed
//! its guard check may append one trailing sample after stop is requested;
//! that race is tolerated, not serialized away.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::SamplerConfig;
use crate::device::Device;
use crate::error::{Error, Result};
use crate::metrics::MetricKind;
use crate::table::SampleTable;

/// Granularity of the cancellable wait between ticks.
const WAIT_SLICE: Duration = Duration::from_millis(10);

struct Inner {
    running: bool,
    table: SampleTable,
    error: Option<Error>,
}

/// Samples a device at a fixed interval while a run is in progress.
pub struct Sampler {
    config: SamplerConfig,
    inner: Arc<Mutex<Inner>>,
    worker: Option<JoinHandle<()>>,
}

impl Sampler {
    pub fn new(config: SamplerConfig) -> Self {
        let table = SampleTable::new(config.header());
        Self {
            config,
            inner: Arc::new(Mutex::new(Inner {
                running: false,
                table,
                error: None,
            })),
            worker: None,
        }
    }

    /// Whether a run is currently in progress.
    pub fn is_running(&self) -> bool {
        self.inner.lock().unwrap().running
    }

    /// Begin a run: reset the table to its header and start ticking.
    ///
    /// Ignored with a warning if a run is already in progress.
    pub fn start(&mut self, device: Arc<dyn Device>, app: Option<String>) {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.running {
                log::warn!("sampler already running on device {}", device.id());
                return;
            }
            inner.running = true;
            inner.table = SampleTable::new(self.config.header());
            inner.error = None;
        }

        let inner = Arc::clone(&self.inner);
        let interval = self.config.interval;
        let data_points = self.config.data_points.clone();
        self.worker = Some(thread::spawn(move || {
            run_ticks(&inner, device.as_ref(), app.as_deref(), interval, &data_points);
        }));
    }

    /// Request the run to end. Never blocks on an in-flight tick.
    pub fn stop(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.running = false;
    }

    /// End the run (if still running), wait for the worker to exit, and
    /// hand out the frozen table. Returns the first tick error if one
    /// terminated the run.
    pub fn finish(&mut self) -> Result<SampleTable> {
        self.stop();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }

        let mut inner = self.inner.lock().unwrap();
        if let Some(err) = inner.error.take() {
            return Err(err);
        }
        let table = std::mem::replace(&mut inner.table, SampleTable::new(self.config.header()));
        Ok(table)
    }
}

/// Worker loop: one iteration per tick.
fn run_ticks(
    inner: &Mutex<Inner>,
    device: &dyn Device,
    app: Option<&str>,
    interval: Duration,
    data_points: &[MetricKind],
) {
    loop {
        let tick_start = Instant::now();
        {
            let mut guard = inner.lock().unwrap();
            if !guard.running {
                // Terminates the tick chain after stop.
                return;
            }
            match sample_row(device, app, data_points) {
                Ok(row) => guard.table.push_row(row),
                Err(err) => {
                    // An extraction failure is terminal for the run.
                    log::error!("tick failed on device {}: {err}", device.id());
                    guard.error = Some(err);
                    guard.running = false;
                    return;
                }
            }
        }

        let delay = next_delay(interval, tick_start.elapsed());
        let deadline = Instant::now() + delay;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            if !inner.lock().unwrap().running {
                return;
            }
            thread::sleep(remaining.min(WAIT_SLICE));
        }
    }
}

/// Build one complete sample row: device wall-clock time first, then every
/// configured metric in the fixed supported order.
fn sample_row(
    device: &dyn Device,
    app: Option<&str>,
    data_points: &[MetricKind],
) -> Result<Vec<String>> {
    let device_time = device.shell("date -u")?;
    let mut row = Vec::with_capacity(data_points.len() + 1);
    row.push(device_time);
    for kind in data_points {
        row.push(kind.extract(device, app)?);
    }
    Ok(row)
}

/// Delay before the next tick: the configured interval minus the
/// whole-second-truncated duration of this tick's extraction work, clamped
/// at zero.
fn next_delay(interval: Duration, tick_elapsed: Duration) -> Duration {
    interval.saturating_sub(Duration::from_secs(tick_elapsed.as_secs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeDevice;

    fn cpu_mem_device() -> FakeDevice {
        FakeDevice::new("test-device")
            .respond("date -u", "Mon Jan 1 00:00:00 UTC 2024")
            .respond("dumpsys cpuinfo | grep TOTAL", "10% TOTAL")
            .respond("dumpsys meminfo | grep Used", " Used RAM: 100K (x)")
    }

    fn cpu_mem_config(interval_ms: u64) -> SamplerConfig {
        SamplerConfig::new(interval_ms, &["cpu".to_string(), "mem".to_string()])
    }

    #[test]
    fn delay_is_interval_minus_truncated_elapsed() {
        let i = Duration::from_secs(5);
        assert_eq!(next_delay(i, Duration::from_millis(900)), i);
        assert_eq!(next_delay(i, Duration::from_millis(1900)), Duration::from_secs(4));
        assert_eq!(next_delay(i, Duration::from_secs(5)), Duration::ZERO);
        assert_eq!(next_delay(i, Duration::from_secs(60)), Duration::ZERO);
        assert_eq!(next_delay(Duration::ZERO, Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn sample_row_orders_columns() {
        let dev = cpu_mem_device();
        let row = sample_row(
            &dev,
            None,
            &[MetricKind::Cpu, MetricKind::Mem],
        )
        .unwrap();
        assert_eq!(row, vec!["Mon Jan 1 00:00:00 UTC 2024", "10", "100"]);
    }

    #[test]
    fn start_stop_produces_complete_rows() {
        let mut sampler = Sampler::new(cpu_mem_config(0));
        sampler.start(Arc::new(cpu_mem_device()), None);
        thread::sleep(Duration::from_millis(50));
        sampler.stop();

        let table = sampler.finish().unwrap();
        assert!(!table.is_empty(), "expected at least one sample");
        for row in table.rows() {
            assert_eq!(row.len(), table.header().len(), "partial row: {row:?}");
        }
        assert_eq!(table.header(), ["datetime", "cpu", "mem"]);
    }

    #[test]
    fn stop_halts_the_tick_chain() {
        let mut sampler = Sampler::new(cpu_mem_config(0));
        sampler.start(Arc::new(cpu_mem_device()), None);
        thread::sleep(Duration::from_millis(20));
        sampler.stop();
        sampler.finish().unwrap();

        // No more samples accumulate once the run is finished.
        thread::sleep(Duration::from_millis(20));
        assert!(!sampler.is_running());
        assert_eq!(sampler.finish().unwrap().len(), 0, "table was reset");
    }

    #[test]
    fn extraction_failure_ends_the_run() {
        // No canned cpuinfo response, so the first tick fails.
        let dev = FakeDevice::new("test-device").respond("date -u", "Mon Jan 1 00:00:00 UTC 2024");
        let mut sampler = Sampler::new(cpu_mem_config(0));
        sampler.start(Arc::new(dev), None);
        thread::sleep(Duration::from_millis(20));

        assert!(!sampler.is_running(), "failed run should stop itself");
        assert!(sampler.finish().is_err());
    }

    #[test]
    fn start_while_running_is_ignored() {
        let mut sampler = Sampler::new(cpu_mem_config(1000));
        sampler.start(Arc::new(cpu_mem_device()), None);
        assert!(sampler.is_running());
        sampler.start(Arc::new(cpu_mem_device()), None);
        assert!(sampler.is_running());
        sampler.stop();
        sampler.finish().unwrap();
    }

    #[test]
    fn restart_resets_the_table() {
        let mut sampler = Sampler::new(cpu_mem_config(0));
        sampler.start(Arc::new(cpu_mem_device()), None);
        thread::sleep(Duration::from_millis(30));
        sampler.stop();
        assert!(!sampler.finish().unwrap().is_empty());

        // Second run against a device reporting different values; no row
        // from the first run may survive the reset.
        let dev = FakeDevice::new("test-device")
            .respond("date -u", "Tue Jan 2 00:00:00 UTC 2024")
            .respond("dumpsys cpuinfo | grep TOTAL", "99% TOTAL")
            .respond("dumpsys meminfo | grep Used", " Used RAM: 999K (x)");
        sampler.start(Arc::new(dev), None);
        thread::sleep(Duration::from_millis(30));
        sampler.stop();
        let table = sampler.finish().unwrap();
        for row in table.rows() {
            assert_eq!(row[1], "99", "row from a previous run survived: {row:?}");
        }
    }
}
