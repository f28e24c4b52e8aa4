use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub(crate) struct Settings {
    pub client_name: String,
    /// Substring of the controller's MIDI input port name.
    pub port_name_in: String,
    /// Substring of the controller's MIDI output port name.
    pub port_name_out: String,
    /// LED encoding: "mk2" (RGB, brightness as channel) or "mk1" (three colors).
    pub device_generation: String,
    pub engine_host: String,
    pub engine_port: u16,
    /// Directory holding saved looper sessions.
    pub session_path: String,
    pub session_extension: String,
    /// Grace period while the looper process starts up.
    pub warmup_secs: u64,
    pub warmup_poll_ms: u64,
    pub probe_interval_ms: u64,
    /// Delay before pulling initial values after registering.
    pub initial_sweep_ms: u64,
    pub session_settle_ms: u64,
    pub auto_update_interval_ms: i32,
    pub self_test: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            client_name: "APC Key 25 SooperLooper".to_string(),
            port_name_in: "APC Key 25".to_string(),
            port_name_out: "APC Key 25".to_string(),
            device_generation: "mk2".to_string(),
            engine_host: "127.0.0.1".to_string(),
            engine_port: 9951,
            session_path: "/zynthian/zynthian-my-data/presets/sooperlooper/".to_string(),
            session_extension: "slsess".to_string(),
            warmup_secs: 10,
            warmup_poll_ms: 1000,
            probe_interval_ms: 2000,
            initial_sweep_ms: 2000,
            session_settle_ms: 1000,
            auto_update_interval_ms: 100,
            self_test: true,
        }
    }
}

impl Settings {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.client_name.is_empty() {
            return Err("Client name must not be empty".to_string());
        }

        if self.port_name_in.is_empty() {
            return Err("Input port name must not be empty".to_string());
        }

        if self.port_name_out.is_empty() {
            return Err("Output port name must not be empty".to_string());
        }

        let generation = self.device_generation.trim().to_ascii_lowercase();
        if !matches!(generation.as_str(), "mk1" | "mk2") {
            return Err("device_generation must be one of: \"mk1\", \"mk2\"".to_string());
        }

        if self.engine_port == 0 {
            return Err("engine_port must not be 0".to_string());
        }

        // replies are requested on a localhost URL
        let loopback = self.engine_host.eq_ignore_ascii_case("localhost")
            || self.engine_host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback());
        if !loopback {
            return Err(format!(
                "engine_host must be a loopback address (found {:?})",
                self.engine_host
            ));
        }

        if !(1000..=2000).contains(&self.probe_interval_ms) {
            return Err(format!(
                "probe_interval_ms must be between 1000 and 2000 (found {})",
                self.probe_interval_ms
            ));
        }

        if self.warmup_poll_ms == 0 {
            return Err("warmup_poll_ms must not be 0".to_string());
        }

        if self.session_extension.is_empty() || self.session_extension.contains('.') {
            return Err("session_extension must be a bare extension like \"slsess\"".to_string());
        }

        Ok(())
    }

    pub(crate) fn is_mk1(&self) -> bool {
        self.device_generation.trim().eq_ignore_ascii_case("mk1")
    }

    pub(crate) fn timings(&self) -> Timings {
        Timings {
            warmup: Duration::from_secs(self.warmup_secs),
            warmup_poll: Duration::from_millis(self.warmup_poll_ms),
            probe_interval: Duration::from_millis(self.probe_interval_ms),
            initial_sweep: Duration::from_millis(self.initial_sweep_ms),
            session_settle: Duration::from_millis(self.session_settle_ms),
        }
    }
}

/// Delays used by the engine link and the session submodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Timings {
    pub warmup: Duration,
    pub warmup_poll: Duration,
    pub probe_interval: Duration,
    pub initial_sweep: Duration,
    pub session_settle: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Settings::default().timings()
    }
}
