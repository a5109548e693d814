use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{DeviceError, DioBank};

/// Scriptable bank for tests: records every output write and can be told
/// to fail reads or writes.
#[derive(Debug, Default)]
pub struct MockBank {
    di_values: Mutex<u32>,
    do_values: Mutex<u32>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: Mutex<Vec<u32>>,
}

impl MockBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_inputs(&self, values: u32) {
        *self.di_values.lock().unwrap() = values;
    }

    pub fn set_outputs(&self, values: u32) {
        *self.do_values.lock().unwrap() = values;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn recorded_writes(&self) -> Vec<u32> {
        self.writes.lock().unwrap().clone()
    }
}

impl DioBank for MockBank {
    fn digital_inputs(&self, slot: u32) -> Result<u32, DeviceError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DeviceError::Read {
                slot,
                detail: "scripted failure".to_string(),
            });
        }
        Ok(*self.di_values.lock().unwrap())
    }

    fn digital_outputs(&self, slot: u32) -> Result<u32, DeviceError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DeviceError::Read {
                slot,
                detail: "scripted failure".to_string(),
            });
        }
        Ok(*self.do_values.lock().unwrap())
    }

    fn set_digital_outputs(&self, slot: u32, values: u32) -> Result<(), DeviceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DeviceError::Write {
                slot,
                detail: "scripted failure".to_string(),
            });
        }
        self.writes.lock().unwrap().push(values);
        *self.do_values.lock().unwrap() = values;
        Ok(())
    }
}
