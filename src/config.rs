use crate::mappings::KeyNames;
use crate::services::typing_session::TypingDelays;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub input: InputConfig,
    pub triggers: TriggerConfig,
    pub typing: TypingConfig,
    pub layout: LayoutConfig,
    pub unicode: UnicodeConfig,
    pub clipboard: ClipboardConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    /// Keyboard watched for trigger keys, or "auto"
    pub device_path: String,
    pub virtual_device_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TriggerConfig {
    pub start_key: String,
    pub stop_key: String,
}

/// Timings of one session. Every gap is the minimum the receiving
/// application's input queue is known to absorb; going lower drops or
/// reorders characters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TypingConfig {
    /// Pause after a trigger so the user can release keys and focus the target
    pub start_delay_ms: u64,
    /// Wait after a keyboard layout switch before the first event
    pub layout_settle_ms: u64,
    pub shift_settle_ms: u64,
    pub key_hold_ms: u64,
    pub key_release_ms: u64,
    pub shift_release_ms: u64,
    pub inter_char_ms: u64,
    pub unicode_hold_ms: u64,
    pub unicode_settle_ms: u64,
    /// Physical key used as shift: "left_shift" or "right_shift"
    pub shift_key: String,
    pub busy_policy: BusyPolicy,
}

/// What a start request does while another session is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BusyPolicy {
    /// Refuse with `TyperError::Busy`
    Reject,
    /// Stop the running session, wait for it to wind down, then start
    Preempt,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub enabled: bool,
    pub backend: LayoutBackend,
    /// Layout identifiers whose key positions match the key-code table
    pub latin_layouts: Vec<String>,
    /// Put the previous layout back when the session ends
    pub restore: bool,
    /// Without a Latin layout, send everything but line breaks as Unicode
    pub force_unicode_without_latin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutBackend {
    Auto,
    Kde,
    Setxkbmap,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UnicodeConfig {
    pub backend: UnicodeBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnicodeBackend {
    Auto,
    Xdotool,
    Wtype,
    None,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ClipboardConfig {
    /// Command printing the clipboard text; empty means pick by session type
    pub command: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            device_path: "auto".to_string(),
            virtual_device_name: "clip-typer virtual keyboard".to_string(),
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            start_key: "f10".to_string(),
            stop_key: "f12".to_string(),
        }
    }
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: 2000,
            layout_settle_ms: 500,
            shift_settle_ms: 50,
            key_hold_ms: 30,
            key_release_ms: 30,
            shift_release_ms: 50,
            inter_char_ms: 25,
            unicode_hold_ms: 80,
            unicode_settle_ms: 120,
            shift_key: "left_shift".to_string(),
            busy_policy: BusyPolicy::Reject,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: LayoutBackend::Auto,
            latin_layouts: vec!["us".to_string()],
            restore: true,
            force_unicode_without_latin: true,
        }
    }
}

impl Default for UnicodeConfig {
    fn default() -> Self {
        Self {
            backend: UnicodeBackend::Auto,
        }
    }
}

impl TypingConfig {
    pub fn delays(&self) -> TypingDelays {
        TypingDelays {
            start: Duration::from_millis(self.start_delay_ms),
            layout_settle: Duration::from_millis(self.layout_settle_ms),
            shift_settle: Duration::from_millis(self.shift_settle_ms),
            key_hold: Duration::from_millis(self.key_hold_ms),
            key_release: Duration::from_millis(self.key_release_ms),
            shift_release: Duration::from_millis(self.shift_release_ms),
            inter_char: Duration::from_millis(self.inter_char_ms),
            unicode_hold: Duration::from_millis(self.unicode_hold_ms),
            unicode_settle: Duration::from_millis(self.unicode_settle_ms),
        }
    }

    pub fn shift_key_code(&self) -> Result<u16> {
        let code = KeyNames::translate(&self.shift_key).map_err(anyhow::Error::msg)?;
        if !KeyNames::is_shift(code) {
            anyhow::bail!("shift_key must be left_shift or right_shift, got '{}'", self.shift_key);
        }
        Ok(code)
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("CLIP_TYPER_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "full" | "compact" => {}
            _ => anyhow::bail!("Invalid log format: {}", self.logging.format),
        }

        if self.typing.key_hold_ms == 0 {
            anyhow::bail!("typing.key_hold_ms must be greater than 0");
        }
        if self.typing.unicode_hold_ms == 0 {
            anyhow::bail!("typing.unicode_hold_ms must be greater than 0");
        }
        self.typing.shift_key_code()?;

        let start = KeyNames::translate(&self.triggers.start_key)
            .map_err(|e| anyhow::anyhow!("triggers.start_key: {}", e))?;
        let stop = KeyNames::translate(&self.triggers.stop_key)
            .map_err(|e| anyhow::anyhow!("triggers.stop_key: {}", e))?;
        if start == stop {
            anyhow::bail!("Start and stop triggers must be different keys");
        }

        if self.layout.enabled && self.layout.latin_layouts.is_empty() {
            anyhow::bail!("layout.latin_layouts must not be empty when layout switching is enabled");
        }

        if self.input.virtual_device_name.is_empty() {
            anyhow::bail!("input.virtual_device_name must not be empty");
        }

        Ok(())
    }

    pub fn start_key_code(&self) -> Result<u16> {
        KeyNames::translate(&self.triggers.start_key).map_err(anyhow::Error::msg)
    }

    pub fn stop_key_code(&self) -> Result<u16> {
        KeyNames::translate(&self.triggers.stop_key).map_err(anyhow::Error::msg)
    }
}
