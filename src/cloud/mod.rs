pub mod client;

use serde::{Deserialize, Serialize};

/// Snapshot of the channel bank, ready to publish to the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateReport {
    pub device_id: String,
    pub di_values: u32,
    pub do_values: u32,
}

/// The single inbound command: set the output channels to this pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOutputsCommand {
    pub do_values: u32,
}

/// Per-message outcome reported back to the broker.
///
/// Accepted and Rejected both acknowledge the message (rejection is
/// non-transient, redelivery cannot fix it). Abandoned leaves the message
/// unacknowledged so the broker may redeliver it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Accepted,
    Rejected,
    Abandoned,
}

pub fn encode_report(report: &StateReport) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(report)
}

pub fn decode_command(payload: &[u8]) -> serde_json::Result<SetOutputsCommand> {
    serde_json::from_slice(payload)
}
