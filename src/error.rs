use thiserror::Error;

use crate::device::DeviceError;

/// Fatal bridge errors. Any of these tears the process down; the only
/// non-fatal failure path is the dispatcher's per-message disposition.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("device access failed: {0}")]
    Device(#[from] DeviceError),

    #[error("mqtt connection failed: {0}")]
    CloudConnect(#[from] rumqttc::ConnectionError),

    #[error("mqtt send failed: {0}")]
    CloudSend(#[from] rumqttc::ClientError),

    #[error("message codec failed: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("{0} channel closed")]
    ChannelClosed(&'static str),
}
