//! Canned-response devices for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::device::Device;
use crate::error::{Error, Result};

/// Device that answers shell commands from canned responses.
///
/// Multiple responses to the same command are played back in order, the
/// last one repeating indefinitely.
pub(crate) struct FakeDevice {
    id: String,
    responses: Mutex<HashMap<String, Vec<String>>>,
}

impl FakeDevice {
    pub(crate) fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            responses: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn respond(self, command: &str, output: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(command.to_string())
            .or_default()
            .push(output.to_string());
        self
    }
}

impl Device for FakeDevice {
    fn shell(&self, command: &str) -> Result<String> {
        let mut responses = self.responses.lock().unwrap();
        let queue = responses.get_mut(command).ok_or_else(|| Error::Device {
            device: self.id.clone(),
            reason: format!("no canned response for {command:?}"),
        })?;
        if queue.len() > 1 {
            Ok(queue.remove(0))
        } else {
            queue.first().cloned().ok_or_else(|| Error::Device {
                device: self.id.clone(),
                reason: format!("response queue drained for {command:?}"),
            })
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}
