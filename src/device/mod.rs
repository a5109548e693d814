pub mod sim;

#[cfg(test)]
pub mod mock;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("digital input read failed on slot {slot}: {detail}")]
    Read { slot: u32, detail: String },

    #[error("digital output write failed on slot {slot}: {detail}")]
    Write { slot: u32, detail: String },
}

/// Access to one bank of digital channels on an I/O module.
///
/// Values are bit-packed, one bit per channel: bit 0 is channel 0 and so
/// on. Implementations wrap whatever driver actually talks to the
/// hardware; [`sim::SimulatedBank`] is an in-process stand-in for running
/// without a module attached.
pub trait DioBank: Send + Sync {
    fn digital_inputs(&self, slot: u32) -> Result<u32, DeviceError>;
    fn digital_outputs(&self, slot: u32) -> Result<u32, DeviceError>;
    fn set_digital_outputs(&self, slot: u32, values: u32) -> Result<(), DeviceError>;
}
