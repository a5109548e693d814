use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub mqtt: MqttConfig,
    pub device: DeviceConfig,
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub topic_prefix: String,
    pub client_id: String,
}

#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Identifier reported in every state message and used in topic paths.
    pub device_id: String,
    /// Slot on the I/O module housing the digital channel bank.
    pub slot: u32,
    /// Initial input pattern for the simulated bank. Ignored once a real
    /// driver backs the device trait.
    pub sim_inputs: u32,
}

fn env_required(key: &str) -> Result<String, String> {
    env::var(key).map_err(|_| format!("{key} environment variable is required"))
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let config = Self {
            mqtt: MqttConfig {
                broker_host: env_required("MQTT_BROKER_HOST")?,
                broker_port: env_or_default("MQTT_BROKER_PORT", 1883),
                username: env_optional("MQTT_USERNAME"),
                password: env_optional("MQTT_PASSWORD"),
                topic_prefix: env_or_default("MQTT_TOPIC_PREFIX", "dio".to_string()),
                client_id: env_or_default("MQTT_CLIENT_ID", "dio-to-mqtt".to_string()),
            },
            device: DeviceConfig {
                device_id: env_or_default("DEVICE_ID", "iomod".to_string()),
                slot: env_or_default("DEVICE_SLOT", 1),
                sim_inputs: env_or_default("SIM_INPUTS", 0),
            },
            poll_interval_secs: env_or_default("POLL_INTERVAL_SECS", 1),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.mqtt.broker_host.is_empty() {
            return Err("MQTT_BROKER_HOST must not be empty".into());
        }
        if self.poll_interval_secs == 0 {
            return Err("POLL_INTERVAL_SECS must be > 0".into());
        }
        if self.device.device_id.is_empty() {
            return Err("DEVICE_ID must not be empty".into());
        }
        if self.device.device_id.contains(['/', '+', '#']) {
            return Err("DEVICE_ID must not contain MQTT topic characters (/ + #)".into());
        }
        Ok(())
    }

    /// Topic carrying outbound state reports.
    pub fn state_topic(&self) -> String {
        format!("{}/{}/state", self.mqtt.topic_prefix, self.device.device_id)
    }

    /// Topic the broker delivers set-output commands on.
    pub fn command_topic(&self) -> String {
        format!("{}/{}/command", self.mqtt.topic_prefix, self.device.device_id)
    }

    /// Online/offline marker topic, also used for the last-will message.
    pub fn status_topic(&self) -> String {
        format!(
            "{}/{}/bridge_status",
            self.mqtt.topic_prefix, self.device.device_id
        )
    }
}
