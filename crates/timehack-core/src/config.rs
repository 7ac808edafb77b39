//! Display configuration
//!
//! Every option has a default, so an empty TOML document is a valid config.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{HackError, HackResult};

/// Ranked authority endpoints used when none are configured
pub const DEFAULT_ENDPOINTS: &[&str] = &[
    "https://worldtimeapi.org/api/timezone/Etc/UTC",
    "https://timeapi.io/api/Time/current/zone?timeZone=UTC",
];

/// TIMEHACK configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HackConfig {
    /// IANA zone for the clock face; `None` uses the host zone
    pub display_zone: Option<String>,
    /// Authority endpoints, highest priority first
    pub endpoints: Vec<String>,
    /// Period of the background resync
    pub resync_period_ms: u64,
    /// Attempts per sync cycle
    pub sync_retry_budget: u32,
    /// Delay between attempts inside one cycle
    pub sync_retry_delay_ms: u64,
    /// Per-request timeout for one endpoint
    pub fetch_timeout_ms: u64,
    /// How long the HACK announcement is held
    pub hack_hold_ms: u64,
    /// Render loop period
    pub frame_interval_ms: u64,
    /// Missed resync cycles before the sync is reported degraded
    pub degraded_after_cycles: u32,
    /// Lit time of one flash pulse
    pub flash_pulse_on_ms: u32,
    /// Start-to-start spacing of flash pulses
    pub flash_pulse_spacing_ms: u32,
    /// Pulse count of the :00 / :30 boundary flash
    pub boundary_flash_pulses: u32,
}

impl Default for HackConfig {
    fn default() -> Self {
        HackConfig {
            display_zone: None,
            endpoints: DEFAULT_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
            resync_period_ms: 60_000,
            sync_retry_budget: 3,
            sync_retry_delay_ms: 2_000,
            fetch_timeout_ms: 5_000,
            hack_hold_ms: 5_000,
            frame_interval_ms: 100,
            degraded_after_cycles: 3,
            flash_pulse_on_ms: 150,
            flash_pulse_spacing_ms: 160,
            boundary_flash_pulses: 3,
        }
    }
}

impl HackConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> HackResult<Self> {
        let config: HackConfig =
            toml::from_str(text).map_err(|e| HackError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> HackResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| HackError::ConfigIo(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Configuration with no network endpoints (always local fallback)
    pub fn offline() -> Self {
        HackConfig {
            endpoints: Vec::new(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> HackResult<()> {
        if self.resync_period_ms == 0 {
            return Err(HackError::InvalidConfig("resync_period_ms must be > 0".into()));
        }
        if self.sync_retry_budget == 0 {
            return Err(HackError::InvalidConfig("sync_retry_budget must be >= 1".into()));
        }
        if self.frame_interval_ms == 0 {
            return Err(HackError::InvalidConfig("frame_interval_ms must be > 0".into()));
        }
        if self.degraded_after_cycles == 0 {
            return Err(HackError::InvalidConfig(
                "degraded_after_cycles must be >= 1".into(),
            ));
        }
        if self.boundary_flash_pulses == 0 {
            return Err(HackError::InvalidConfig(
                "boundary_flash_pulses must be >= 1".into(),
            ));
        }
        if self.flash_pulse_on_ms == 0 || self.flash_pulse_on_ms > self.flash_pulse_spacing_ms {
            return Err(HackError::InvalidConfig(format!(
                "flash_pulse_on_ms ({}) must be in 1..=flash_pulse_spacing_ms ({})",
                self.flash_pulse_on_ms, self.flash_pulse_spacing_ms
            )));
        }
        if let Some(bad) = self.endpoints.iter().find(|e| e.trim().is_empty()) {
            return Err(HackError::InvalidConfig(format!("blank endpoint {:?}", bad)));
        }
        if matches!(self.display_zone.as_deref(), Some(z) if z.trim().is_empty()) {
            return Err(HackError::InvalidConfig("display_zone is blank".into()));
        }
        Ok(())
    }

    pub fn resync_period(&self) -> Duration {
        Duration::from_millis(self.resync_period_ms)
    }

    pub fn sync_retry_delay(&self) -> Duration {
        Duration::from_millis(self.sync_retry_delay_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn hack_hold(&self) -> Duration {
        Duration::from_millis(self.hack_hold_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Anchor age after which the sync counts as degraded
    pub fn degraded_after(&self) -> Duration {
        self.resync_period() * self.degraded_after_cycles
    }
}
