//! Sampler configuration.
//!
//! Deserialized from experiment config files. Unknown data points are
//! dropped with a warning rather than failing the whole experiment.

use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;
use crate::metrics::MetricKind;

/// Raw configuration as it appears in an experiment config file.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    /// Sampling interval in milliseconds.
    #[serde(default)]
    pub sample_interval: u64,
    /// Requested data points, config spelling (`cpu`, `mem`, `GPU_mem`,
    /// `cpu_clockspeed`).
    #[serde(default)]
    pub data_points: Vec<String>,
}

/// Validated, immutable sampler configuration.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Time between tick starts.
    pub interval: Duration,
    /// Metrics to sample, in the fixed supported order.
    pub data_points: Vec<MetricKind>,
}

impl SamplerConfig {
    /// Build a config from raw values, dropping unsupported data points
    /// with a warning.
    pub fn new(sample_interval_ms: u64, data_points: &[String]) -> Self {
        let invalid: Vec<&str> = data_points
            .iter()
            .filter(|dp| dp.parse::<MetricKind>().is_err())
            .map(String::as_str)
            .collect();
        if !invalid.is_empty() {
            log::warn!("invalid data points in config: {invalid:?}");
        }

        // Keep the fixed documented order regardless of config order.
        let requested: Vec<MetricKind> = data_points
            .iter()
            .filter_map(|dp| dp.parse().ok())
            .collect();
        let data_points = MetricKind::ALL
            .iter()
            .copied()
            .filter(|k| requested.contains(k))
            .collect();

        Self {
            interval: Duration::from_millis(sample_interval_ms),
            data_points,
        }
    }

    /// Parse a JSON config document.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(s).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e)
        })?;
        Ok(Self::new(raw.sample_interval, &raw.data_points))
    }

    /// Header row for the sample table this config produces.
    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["datetime".to_string()];
        header.extend(self.data_points.iter().map(|k| k.to_string()));
        header
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::ZERO,
            data_points: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_data_points_are_dropped() {
        let cfg = SamplerConfig::new(
            500,
            &[
                "cpu".to_string(),
                "disk".to_string(),
                "mem".to_string(),
            ],
        );
        assert_eq!(cfg.data_points, vec![MetricKind::Cpu, MetricKind::Mem]);
        assert_eq!(cfg.interval, Duration::from_millis(500));
    }

    #[test]
    fn data_points_keep_fixed_order() {
        let cfg = SamplerConfig::new(
            0,
            &[
                "cpu_clockspeed".to_string(),
                "cpu".to_string(),
                "GPU_mem".to_string(),
            ],
        );
        assert_eq!(
            cfg.data_points,
            vec![
                MetricKind::Cpu,
                MetricKind::GpuMem,
                MetricKind::CpuClockspeed
            ]
        );
    }

    #[test]
    fn header_starts_with_datetime() {
        let cfg = SamplerConfig::new(0, &["mem".to_string(), "cpu".to_string()]);
        assert_eq!(cfg.header(), vec!["datetime", "cpu", "mem"]);
    }

    #[test]
    fn from_json_defaults() {
        let cfg = SamplerConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg.interval, Duration::ZERO);
        assert!(cfg.data_points.is_empty());
    }

    #[test]
    fn from_json_full() {
        let cfg = SamplerConfig::from_json_str(
            r#"{"sample_interval": 1000, "data_points": ["cpu", "mem"]}"#,
        )
        .unwrap();
        assert_eq!(cfg.interval, Duration::from_secs(1));
        assert_eq!(cfg.data_points, vec![MetricKind::Cpu, MetricKind::Mem]);
    }
}
