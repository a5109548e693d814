use std::sync::Arc;

use rumqttc::{AsyncClient, Publish};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cloud::{Disposition, decode_command};
use crate::device::DioBank;

/// Decodes inbound set-output commands and applies them to the device.
///
/// Per message: Received -> Decoding -> {Rejected | Abandoned |
/// Applying -> Accepted}. A payload that fails to decode is rejected
/// (malformed input stays malformed on redelivery); a device write
/// failure abandons the message so the broker may redeliver it. The
/// dispatcher never retries on its own and never touches the poller's
/// snapshot.
pub struct Dispatcher {
    bank: Arc<dyn DioBank>,
    slot: u32,
}

impl Dispatcher {
    pub fn new(bank: Arc<dyn DioBank>, slot: u32) -> Self {
        Self { bank, slot }
    }

    pub fn handle(&self, payload: &[u8]) -> Disposition {
        let command = match decode_command(payload) {
            Ok(command) => command,
            Err(e) => {
                warn!("Failed to decode command payload: {e}");
                return Disposition::Rejected;
            }
        };

        match self.bank.set_digital_outputs(self.slot, command.do_values) {
            Ok(()) => {
                info!("Applied output command: do={:#06b}", command.do_values);
                Disposition::Accepted
            }
            Err(e) => {
                warn!("Device rejected output command: {e}");
                Disposition::Abandoned
            }
        }
    }
}

/// Single handler task consuming command messages from the MQTT event
/// loop, keeping device writes on one path. Accepted and rejected
/// messages are acked; abandoned ones are left for redelivery.
pub async fn run(
    dispatcher: Dispatcher,
    mut inbound_rx: mpsc::Receiver<Publish>,
    client: AsyncClient,
) {
    while let Some(publish) = inbound_rx.recv().await {
        let disposition = dispatcher.handle(&publish.payload);
        info!(
            "Command on {} ({} bytes): {:?}",
            publish.topic,
            publish.payload.len(),
            disposition
        );
        match disposition {
            Disposition::Accepted | Disposition::Rejected => {
                if let Err(e) = client.ack(&publish).await {
                    warn!("Failed to ack command message: {e}");
                }
            }
            Disposition::Abandoned => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;
    use crate::device::mock::MockBank;
    use crate::device::sim::SimulatedBank;
    use crate::poller::Poller;

    #[test]
    fn well_formed_command_is_accepted_and_applied_once() {
        let bank = Arc::new(MockBank::new());
        let dispatcher = Dispatcher::new(bank.clone(), 1);

        let disposition = dispatcher.handle(br#"{"do_values": 5}"#);

        assert_eq!(disposition, Disposition::Accepted);
        assert_eq!(bank.recorded_writes(), vec![0b0101]);
    }

    #[test]
    fn undecodable_payload_is_rejected_without_touching_the_device() {
        let bank = Arc::new(MockBank::new());
        let dispatcher = Dispatcher::new(bank.clone(), 1);

        assert_eq!(dispatcher.handle(b"not json"), Disposition::Rejected);
        assert_eq!(
            dispatcher.handle(br#"{"di_values": 5}"#),
            Disposition::Rejected
        );
        assert!(bank.recorded_writes().is_empty());
    }

    #[test]
    fn failing_device_write_abandons_the_message() {
        let bank = Arc::new(MockBank::new());
        bank.fail_writes(true);
        let dispatcher = Dispatcher::new(bank.clone(), 1);

        let disposition = dispatcher.handle(br#"{"do_values": 5}"#);

        assert_eq!(disposition, Disposition::Abandoned);
        assert!(bank.recorded_writes().is_empty());
    }

    // Poller and dispatcher share only the device itself; every report
    // the poller produces must be a value the device actually held.
    #[tokio::test]
    async fn concurrent_commands_and_polls_stay_consistent() {
        let bank = Arc::new(SimulatedBank::new());
        let dispatcher = Arc::new(Dispatcher::new(bank.clone(), 1));
        let poller = Arc::new(Poller::new(
            bank,
            DeviceConfig {
                device_id: "iomod".to_string(),
                slot: 1,
                sim_inputs: 0,
            },
        ));

        let writer = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                for values in 0..64u32 {
                    let payload = format!(r#"{{"do_values": {values}}}"#);
                    assert_eq!(dispatcher.handle(payload.as_bytes()), Disposition::Accepted);
                    tokio::task::yield_now().await;
                }
            })
        };

        let reader = {
            let poller = poller.clone();
            tokio::spawn(async move {
                let mut snapshot = None;
                let mut reports = Vec::new();
                for _ in 0..256 {
                    if let Some(report) = poller.poll_once(&mut snapshot).unwrap() {
                        reports.push(report);
                    }
                    tokio::task::yield_now().await;
                }
                reports
            })
        };

        writer.await.unwrap();
        let reports = reader.await.unwrap();

        // Each report carries a pattern the writer actually set (or the
        // initial zero state), and the snapshot logic never duplicates
        // consecutive values.
        for report in &reports {
            assert!(report.do_values < 64);
        }
        for pair in reports.windows(2) {
            assert_ne!(pair[0].do_values, pair[1].do_values);
        }
    }
}
