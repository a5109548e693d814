use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Incoming, MqttOptions, Publish, QoS};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::BridgeError;

use super::{StateReport, encode_report};

pub struct CloudClient {
    client: AsyncClient,
    eventloop: EventLoop,
    config: Config,
}

impl CloudClient {
    pub fn new(config: &Config) -> Self {
        let mut mqttopts = MqttOptions::new(
            &config.mqtt.client_id,
            &config.mqtt.broker_host,
            config.mqtt.broker_port,
        );
        mqttopts.set_keep_alive(Duration::from_secs(30));
        // Command messages are acked only after the dispatcher has decided
        // their disposition; an abandoned message stays unacked.
        mqttopts.set_manual_acks(true);

        if let (Some(user), Some(pass)) = (&config.mqtt.username, &config.mqtt.password) {
            mqttopts.set_credentials(user, pass);
        }

        let lwt = rumqttc::LastWill::new(
            config.status_topic(),
            "offline".as_bytes().to_vec(),
            QoS::AtLeastOnce,
            true,
        );
        mqttopts.set_last_will(lwt);

        let (client, eventloop) = AsyncClient::new(mqttopts, 100);

        Self {
            client,
            eventloop,
            config: config.clone(),
        }
    }

    /// Clone of the underlying client, used by the dispatcher task to
    /// acknowledge command messages.
    pub fn handle(&self) -> AsyncClient {
        self.client.clone()
    }

    /// Run the MQTT event loop. Subscribes to the command topic on
    /// connect, forwards incoming command messages through inbound_tx,
    /// and publishes state reports received from report_rx. Any broker
    /// error is fatal and returned to the caller.
    pub async fn run(
        mut self,
        mut report_rx: mpsc::Receiver<StateReport>,
        inbound_tx: mpsc::Sender<Publish>,
    ) -> Result<(), BridgeError> {
        let command_topic = self.config.command_topic();
        let state_topic = self.config.state_topic();

        loop {
            tokio::select! {
                event = self.eventloop.poll() => {
                    match event {
                        Ok(Event::Incoming(incoming)) => match incoming {
                            Incoming::ConnAck(_) => {
                                info!("Connected to MQTT broker");
                                self.client
                                    .publish(self.config.status_topic(), QoS::AtLeastOnce, true, "online")
                                    .await?;
                                self.client
                                    .subscribe(&command_topic, QoS::AtLeastOnce)
                                    .await?;
                            }
                            Incoming::Publish(publish) => {
                                if inbound_tx.send(publish).await.is_err() {
                                    return Err(BridgeError::ChannelClosed("inbound command"));
                                }
                            }
                            Incoming::PubAck(ack) => {
                                debug!("Broker confirmed delivery (pkid={})", ack.pkid);
                            }
                            _ => {}
                        },
                        Ok(Event::Outgoing(_)) => {}
                        Err(e) => return Err(BridgeError::CloudConnect(e)),
                    }
                }
                report = report_rx.recv() => {
                    match report {
                        Some(report) => {
                            let payload = encode_report(&report)?;
                            info!(
                                "Publishing {}: di={:#06b} do={:#06b}",
                                state_topic, report.di_values, report.do_values
                            );
                            self.client
                                .publish(&state_topic, QoS::AtLeastOnce, false, payload)
                                .await?;
                        }
                        // Poller gone; its own error (if any) surfaces in main.
                        None => {
                            warn!("State report channel closed, stopping MQTT event loop");
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}
