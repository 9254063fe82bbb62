//! Abstract device collaborator and the adb-backed implementation.
//!
//! Everything the sampler needs from a device fits behind [`Device`]: a
//! synchronous `shell` call returning the command's text output, and a
//! stable identifier used in run filenames. Tests substitute canned
//! implementations; production code uses [`AdbDevice`].

use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// A remote device that can execute shell commands.
///
/// `shell` may block for the duration of the remote roundtrip; there is no
/// built-in timeout. Callers needing bounded latency wrap their device in a
/// timeout adapter.
pub trait Device: Send + Sync {
    /// Run a shell command on the device and return its text output.
    fn shell(&self, command: &str) -> Result<String>;

    /// Stable device identifier (e.g. an adb serial).
    fn id(&self) -> &str;
}

/// A device reached through the local `adb` binary.
#[derive(Debug, Clone)]
pub struct AdbDevice {
    serial: String,
}

impl AdbDevice {
    pub fn new(serial: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
        }
    }
}

impl Device for AdbDevice {
    fn shell(&self, command: &str) -> Result<String> {
        let output = Command::new("adb")
            .arg("-s")
            .arg(&self.serial)
            .arg("shell")
            .arg(command)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::Device {
                device: self.serial.clone(),
                reason: format!("failed to spawn adb: {e}"),
            })?;

        if !output.status.success() {
            return Err(Error::Device {
                device: self.serial.clone(),
                reason: format!(
                    "adb shell exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .trim_end()
            .to_string())
    }

    fn id(&self) -> &str {
        &self.serial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adb_device_reports_serial_as_id() {
        let dev = AdbDevice::new("emulator-5554");
        assert_eq!(dev.id(), "emulator-5554");
    }
}
