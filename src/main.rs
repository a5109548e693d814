mod cloud;
mod config;
mod device;
mod dispatch;
mod error;
mod poller;

use std::sync::Arc;
use std::time::Duration;

use rumqttc::Publish;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::cloud::StateReport;
use crate::device::DioBank;
use crate::device::sim::SimulatedBank;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Starting dio-to-mqtt bridge (mqtt={}:{}, device={}, slot={}, poll={}s)",
        config.mqtt.broker_host,
        config.mqtt.broker_port,
        config.device.device_id,
        config.device.slot,
        config.poll_interval_secs,
    );

    let sim_bank = SimulatedBank::new();
    sim_bank.set_inputs(config.device.sim_inputs);
    let bank: Arc<dyn DioBank> = Arc::new(sim_bank);

    // Channels
    let (report_tx, report_rx) = mpsc::channel::<StateReport>(100);
    let (inbound_tx, inbound_rx) = mpsc::channel::<Publish>(100);

    // MQTT event loop task: publishes reports, feeds inbound commands
    let cloud_client = cloud::client::CloudClient::new(&config);
    let ack_client = cloud_client.handle();
    let mut cloud_task = tokio::spawn(cloud_client.run(report_rx, inbound_tx));

    // Dispatcher task: sole writer to device outputs
    let dispatcher = dispatch::Dispatcher::new(bank.clone(), config.device.slot);
    let dispatch_task = tokio::spawn(dispatch::run(dispatcher, inbound_rx, ack_client.clone()));

    // Poller task: reads the bank each tick, reports changes
    let poll_interval = Duration::from_secs(config.poll_interval_secs);
    let poller = poller::Poller::new(bank, config.device.clone());
    let mut poller_task = tokio::spawn(poller.run(report_tx, poll_interval));

    let exit_code = tokio::select! {
        res = &mut poller_task => match res {
            Ok(Err(e)) => {
                error!("Poller failed: {}", e);
                1
            }
            Ok(Ok(())) => 0,
            Err(e) => {
                error!("Poller task panicked: {}", e);
                1
            }
        },
        res = &mut cloud_task => match res {
            Ok(Err(e)) => {
                error!("MQTT session failed: {}", e);
                1
            }
            // The event loop only exits cleanly once the poller is gone,
            // so surface the poller's verdict as the exit status.
            Ok(Ok(())) => match (&mut poller_task).await {
                Ok(Ok(())) => 0,
                Ok(Err(e)) => {
                    error!("Poller failed: {}", e);
                    1
                }
                Err(e) => {
                    error!("Poller task panicked: {}", e);
                    1
                }
            },
            Err(e) => {
                error!("MQTT task panicked: {}", e);
                1
            }
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT, shutting down");
            0
        }
        _ = async {
            let mut sigterm = tokio::signal::unix::signal(
                tokio::signal::unix::SignalKind::terminate()
            ).expect("Failed to register SIGTERM handler");
            sigterm.recv().await;
        } => {
            info!("Received SIGTERM, shutting down");
            0
        }
    };

    // Teardown: best-effort disconnect, then stop all tasks
    let _ = ack_client.disconnect().await;
    poller_task.abort();
    cloud_task.abort();
    dispatch_task.abort();
    info!("dio-to-mqtt bridge stopped");
    std::process::exit(exit_code);
}
