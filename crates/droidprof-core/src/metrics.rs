//! Per-metric extraction from device shell output.
//!
//! Each extractor issues one shell query (two on the app-memory fallback
//! path) and scrapes a single value out of the text response. The scraping
//! heuristics are deliberately confined to this module so they can be
//! swapped per device/OS version without touching scheduling or
//! aggregation.

use std::str::FromStr;

use crate::device::Device;
use crate::error::{Error, Result};

/// Characters stripped from the system-wide meminfo token before parsing.
const MEM_DECORATION: &[char] = &['(', 'k', 'B', ',', 'K'];

/// The supported metric kinds, in the fixed sampling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Aggregate CPU load percentage (`dumpsys cpuinfo`).
    Cpu,
    /// Memory use in kB, system-wide or per app (`dumpsys meminfo`).
    Mem,
    /// GPU memory use for a package (`dumpsys gfxinfo`).
    GpuMem,
    /// Current cpu0 scaling frequency (cpufreq sysfs).
    CpuClockspeed,
}

impl MetricKind {
    /// All supported kinds, in the order they appear in a sample row.
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Cpu,
        MetricKind::Mem,
        MetricKind::GpuMem,
        MetricKind::CpuClockspeed,
    ];

    /// Extract this metric's value from the device.
    ///
    /// `app` is the package under test; only the memory metrics use it.
    pub fn extract(&self, device: &dyn Device, app: Option<&str>) -> Result<String> {
        match self {
            MetricKind::Cpu => cpu_usage(device),
            MetricKind::Mem => mem_usage(device, app),
            MetricKind::GpuMem => gpu_memory_usage(device, app.unwrap_or_default()),
            MetricKind::CpuClockspeed => cpu_clockspeed(device),
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Mem => write!(f, "mem"),
            Self::GpuMem => write!(f, "GPU_mem"),
            Self::CpuClockspeed => write!(f, "cpu_clockspeed"),
        }
    }
}

impl FromStr for MetricKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cpu" => Ok(Self::Cpu),
            "mem" => Ok(Self::Mem),
            "GPU_mem" => Ok(Self::GpuMem),
            "cpu_clockspeed" => Ok(Self::CpuClockspeed),
            other => Err(Error::UnsupportedMetric(other.to_string())),
        }
    }
}

/// Get aggregate CPU usage in percent.
///
/// Some Android builds emit a malformed negative-fraction token like
/// `12.-5%`; the stray minus is dropped. [`normalize_cpu_token`] is
/// idempotent, so re-normalizing persisted values is harmless.
pub fn cpu_usage(device: &dyn Device) -> Result<String> {
    let raw = device.shell("dumpsys cpuinfo | grep TOTAL")?;
    let token = raw.split('%').next().unwrap_or("");
    Ok(normalize_cpu_token(token))
}

fn normalize_cpu_token(token: &str) -> String {
    token.replace(".-", ".").trim().to_string()
}

/// Get memory usage in kB for `app`; system-wide usage when `app` is absent.
pub fn mem_usage(device: &dyn Device, app: Option<&str>) -> Result<String> {
    match app {
        None | Some("") => {
            let raw = device.shell("dumpsys meminfo | grep Used")?;
            let cleaned: String = raw.chars().filter(|c| !MEM_DECORATION.contains(c)).collect();
            cleaned
                .split_whitespace()
                .nth(2)
                .map(str::to_string)
                .ok_or_else(|| Error::Device {
                    device: device.id().to_string(),
                    reason: format!("unexpected meminfo output: {raw:?}"),
                })
        }
        Some(app) => {
            let mut result = device.shell(&format!("dumpsys meminfo {app} | grep TOTAL"))?;
            if result.is_empty() {
                // Some devices return nothing for the grep form; the full
                // dump also tells us when the process does not exist.
                result = device.shell(&format!("dumpsys meminfo {app}"))?;
                if result.contains("No process found") {
                    return Err(Error::ProcessNotFound(app.to_string()));
                }
            }
            result
                .split_whitespace()
                .nth(1)
                .map(str::to_string)
                .ok_or_else(|| Error::Device {
                    device: device.id().to_string(),
                    reason: format!("unexpected meminfo output for {app}: {result:?}"),
                })
        }
    }
}

/// Get total GPU memory usage for a package.
pub fn gpu_memory_usage(device: &dyn Device, package: &str) -> Result<String> {
    let raw = device.shell(&format!(
        "dumpsys gfxinfo {package} | grep -A1 'Total GPU memory usage:'"
    ))?;
    raw.split(',')
        .nth(1)
        .map(|s| s.trim().to_string())
        .ok_or_else(|| Error::Device {
            device: device.id().to_string(),
            reason: format!("unexpected gfxinfo output for {package}: {raw:?}"),
        })
}

/// Get the current cpu0 scaling frequency, verbatim.
pub fn cpu_clockspeed(device: &dyn Device) -> Result<String> {
    device.shell("cat /sys/devices/system/cpu/cpu0/cpufreq/scaling_cur_freq")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeDevice;

    #[test]
    fn cpu_usage_takes_token_before_percent() {
        let dev = FakeDevice::new("d")
            .respond("dumpsys cpuinfo | grep TOTAL", "12.5% TOTAL: 6% user + 4% kernel");
        assert_eq!(cpu_usage(&dev).unwrap(), "12.5");
    }

    #[test]
    fn cpu_usage_repairs_negative_fraction_artifact() {
        let dev = FakeDevice::new("d")
            .respond("dumpsys cpuinfo | grep TOTAL", "3.-7% TOTAL");
        assert_eq!(cpu_usage(&dev).unwrap(), "3.7");
    }

    #[test]
    fn cpu_normalization_is_idempotent() {
        let once = normalize_cpu_token("3.-7");
        let twice = normalize_cpu_token(&once);
        assert_eq!(once, twice);
        assert_eq!(once, "3.7");
    }

    #[test]
    fn mem_usage_system_wide_strips_decoration() {
        let dev = FakeDevice::new("d").respond(
            "dumpsys meminfo | grep Used",
            " Used RAM: 2,374,472K (2,032,616K used pss + 341,856K kernel)",
        );
        // After deleting '(', 'k', 'B', ',', 'K' the third whitespace field
        // is the used-RAM figure.
        assert_eq!(mem_usage(&dev, None).unwrap(), "2374472");
    }

    #[test]
    fn mem_usage_app_takes_second_field() {
        let dev = FakeDevice::new("d").respond(
            "dumpsys meminfo com.example | grep TOTAL",
            "       TOTAL   123456     2000    14000",
        );
        assert_eq!(mem_usage(&dev, Some("com.example")).unwrap(), "123456");
    }

    #[test]
    fn mem_usage_app_falls_back_to_full_dump() {
        let dev = FakeDevice::new("d")
            .respond("dumpsys meminfo com.example | grep TOTAL", "")
            .respond("dumpsys meminfo com.example", "  TOTAL   98765   2000");
        assert_eq!(mem_usage(&dev, Some("com.example")).unwrap(), "98765");
    }

    #[test]
    fn mem_usage_missing_process_is_fatal() {
        let dev = FakeDevice::new("d")
            .respond("dumpsys meminfo com.gone | grep TOTAL", "")
            .respond("dumpsys meminfo com.gone", "No process found for: com.gone");
        match mem_usage(&dev, Some("com.gone")) {
            Err(Error::ProcessNotFound(app)) => assert_eq!(app, "com.gone"),
            other => panic!("expected ProcessNotFound, got {other:?}"),
        }
    }

    #[test]
    fn gpu_memory_takes_second_comma_field() {
        let dev = FakeDevice::new("d").respond(
            "dumpsys gfxinfo com.example | grep -A1 'Total GPU memory usage:'",
            "Total GPU memory usage:   53477376 bytes, 51.00 MB",
        );
        assert_eq!(gpu_memory_usage(&dev, "com.example").unwrap(), "51.00 MB");
    }

    #[test]
    fn clockspeed_is_verbatim() {
        let dev = FakeDevice::new("d").respond(
            "cat /sys/devices/system/cpu/cpu0/cpufreq/scaling_cur_freq",
            "1804800",
        );
        assert_eq!(cpu_clockspeed(&dev).unwrap(), "1804800");
    }

    #[test]
    fn metric_kind_round_trips_config_spelling() {
        for kind in MetricKind::ALL {
            assert_eq!(kind.to_string().parse::<MetricKind>().unwrap(), kind);
        }
        assert!(matches!(
            "disk".parse::<MetricKind>(),
            Err(Error::UnsupportedMetric(_))
        ));
    }
}
