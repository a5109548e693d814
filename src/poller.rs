use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::cloud::StateReport;
use crate::config::DeviceConfig;
use crate::device::DioBank;
use crate::error::BridgeError;

/// Last values sent to the broker. Owned exclusively by the poller; the
/// dispatcher writes to the device only, and the next poll picks the
/// change up from a fresh read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub device_id: String,
    pub di_values: u32,
    pub do_values: u32,
}

pub struct Poller {
    bank: Arc<dyn DioBank>,
    device: DeviceConfig,
}

impl Poller {
    pub fn new(bank: Arc<dyn DioBank>, device: DeviceConfig) -> Self {
        Self { bank, device }
    }

    /// One poll cycle: read both banks, compare against the snapshot, and
    /// return the report to send if anything changed. The first cycle
    /// (no snapshot yet) always produces a report. The snapshot is
    /// updated before the report is handed back.
    pub fn poll_once(
        &self,
        snapshot: &mut Option<Snapshot>,
    ) -> Result<Option<StateReport>, BridgeError> {
        let slot = self.device.slot;
        let di_values = self.bank.digital_inputs(slot)?;
        let do_values = self.bank.digital_outputs(slot)?;

        let changed = snapshot
            .as_ref()
            .is_none_or(|s| s.di_values != di_values || s.do_values != do_values);
        if !changed {
            debug!("No channel change (di={di_values:#06b} do={do_values:#06b})");
            return Ok(None);
        }

        let snap = snapshot.insert(Snapshot {
            device_id: self.device.device_id.clone(),
            di_values,
            do_values,
        });

        Ok(Some(StateReport {
            device_id: snap.device_id.clone(),
            di_values: snap.di_values,
            do_values: snap.do_values,
        }))
    }

    /// Poll at a fixed cadence until a device read fails or the report
    /// channel closes. Both are fatal; no retry.
    pub async fn run(
        self,
        report_tx: mpsc::Sender<StateReport>,
        poll_interval: Duration,
    ) -> Result<(), BridgeError> {
        let mut snapshot: Option<Snapshot> = None;
        // First tick fires immediately, so the initial reading is sent
        // before the first sleep.
        let mut ticker = tokio::time::interval(poll_interval);

        loop {
            ticker.tick().await;
            if let Some(report) = self.poll_once(&mut snapshot)? {
                report_tx
                    .send(report)
                    .await
                    .map_err(|_| BridgeError::ChannelClosed("state report"))?;
            }
        }
    }
}
