use crate::config::Config;
use crate::error::Result;
use crate::events::TriggerCommand;
use crate::mappings::KeyNames;
use crate::utils::DeviceFinder;
use evdev::{Device, EventType};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::r#trait::TriggerListener;

/// Key codes bound to the start and stop triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyBindings {
    pub start: u16,
    pub stop: u16,
}

impl HotkeyBindings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            start: config.start_key_code()?,
            stop: config.stop_key_code()?,
        })
    }

    /// Command for one EV_KEY event. Only presses count: releases and
    /// autorepeat would otherwise fire the trigger again.
    pub fn command_for(&self, code: u16, value: i32) -> Option<TriggerCommand> {
        if value != 1 {
            return None;
        }
        if code == self.start {
            Some(TriggerCommand::StartFromSource)
        } else if code == self.stop {
            Some(TriggerCommand::Stop)
        } else {
            None
        }
    }
}

/// Watches a physical keyboard for the trigger keys. The device is read,
/// not grabbed: every key still reaches the desktop.
pub struct HotkeyListener {
    device: Device,
    bindings: HotkeyBindings,
    commands: mpsc::Sender<TriggerCommand>,
}

impl HotkeyListener {
    pub fn new(config: &Config, commands: mpsc::Sender<TriggerCommand>) -> Result<Self> {
        let bindings = HotkeyBindings::from_config(config)?;
        let device_path = DeviceFinder::find_keyboard_device(
            &config.input.device_path,
            &config.input.virtual_device_name,
        )?;

        let device = Device::open(&device_path).map_err(|e| {
            crate::typer_error!(device_not_found, "cannot open {:?}: {}", device_path, e)
        })?;

        info!(
            "Listening for hot keys on '{}' (start: {}, stop: {})",
            device.name().unwrap_or("Unknown"),
            KeyNames::reverse_translate(bindings.start).unwrap_or("?"),
            KeyNames::reverse_translate(bindings.stop).unwrap_or("?"),
        );

        Ok(Self {
            device,
            bindings,
            commands,
        })
    }

    async fn run_impl(self) -> Result<()> {
        let Self {
            device,
            bindings,
            commands,
        } = self;
        let mut events = device.into_event_stream()?;

        loop {
            let event = match events.next_event().await {
                Ok(event) => event,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!("Reading keyboard events failed: {}", e);
                    return Err(e.into());
                }
            };

            if event.event_type() != EventType::KEY {
                continue;
            }

            if let Some(command) = bindings.command_for(event.code(), event.value()) {
                debug!("Hot key {} -> {}", event.code(), command);
                if commands.send(command).await.is_err() {
                    warn!("Typing service gone, hot key listener stopping");
                    return Ok(());
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl TriggerListener for HotkeyListener {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings() -> HotkeyBindings {
        HotkeyBindings::from_config(&Config::default()).unwrap()
    }

    #[test]
    fn test_default_bindings() {
        assert_eq!(bindings(), HotkeyBindings { start: 68, stop: 88 });
    }

    #[test]
    fn test_only_presses_trigger() {
        let b = bindings();
        assert_eq!(b.command_for(68, 1), Some(TriggerCommand::StartFromSource));
        assert_eq!(b.command_for(88, 1), Some(TriggerCommand::Stop));
        assert_eq!(b.command_for(68, 0), None);
        assert_eq!(b.command_for(68, 2), None);
        assert_eq!(b.command_for(30, 1), None);
    }
}
