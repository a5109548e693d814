use std::sync::Mutex;

use super::{DeviceError, DioBank};

#[derive(Debug, Default)]
struct Channels {
    di_values: u32,
    do_values: u32,
}

/// In-process digital I/O bank. Stands in for the vendor driver so the
/// bridge can run (and be tested) without a module attached.
#[derive(Debug, Default)]
pub struct SimulatedBank {
    channels: Mutex<Channels>,
}

impl SimulatedBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the simulated input channels, as wiring a sensor would.
    pub fn set_inputs(&self, values: u32) {
        self.channels.lock().unwrap().di_values = values;
    }
}

impl DioBank for SimulatedBank {
    fn digital_inputs(&self, _slot: u32) -> Result<u32, DeviceError> {
        Ok(self.channels.lock().unwrap().di_values)
    }

    fn digital_outputs(&self, _slot: u32) -> Result<u32, DeviceError> {
        Ok(self.channels.lock().unwrap().do_values)
    }

    fn set_digital_outputs(&self, _slot: u32, values: u32) -> Result<(), DeviceError> {
        self.channels.lock().unwrap().do_values = values;
        Ok(())
    }
}
