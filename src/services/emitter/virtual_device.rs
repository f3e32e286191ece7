use crate::error::{Result, TyperError};
use crate::events::{KeyPayload, KeyState, SynthesizedKeyEvent};
use crate::mappings::key_code_table::{KeyCodeTable, LEFT_SHIFT, RIGHT_SHIFT};
use crate::mappings::KeyNames;
use evdev::uinput::VirtualDevice;
use evdev::{AttributeSet, EventType, InputEvent, KeyCode as EvdevKey};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use super::r#trait::KeyEmitter;
use super::unicode::UnicodeInjector;

#[derive(Default)]
struct DeviceState {
    device: Option<VirtualDevice>,
    /// Codes pressed and not yet released, so shutdown can let go of them
    held: BTreeSet<u16>,
}

/// uinput virtual keyboard for key codes, plus an optional helper for
/// raw-Unicode events the kernel interface cannot express
pub struct VirtualKeyboard {
    state: Mutex<DeviceState>,
    device_name: String,
    unicode: Option<UnicodeInjector>,
}

impl VirtualKeyboard {
    /// The uinput device itself is created on first `ensure_ready`, so a missing
    /// permission surfaces per session instead of killing the daemon.
    pub fn new(device_name: &str, unicode: Option<UnicodeInjector>) -> Self {
        info!(
            "VirtualKeyboard '{}' configured (unicode: {})",
            device_name,
            unicode.as_ref().map_or("none", UnicodeInjector::name)
        );

        Self {
            state: Mutex::new(DeviceState::default()),
            device_name: device_name.to_string(),
            unicode,
        }
    }

    fn create_virtual_device(device_name: &str) -> Result<VirtualDevice> {
        info!("Creating uinput virtual keyboard '{}'", device_name);

        let mut keys = AttributeSet::<EvdevKey>::new();
        for mapping in KeyCodeTable::covered().filter_map(KeyCodeTable::resolve) {
            keys.insert(EvdevKey::new(mapping.key_code.value()));
        }
        keys.insert(EvdevKey::new(LEFT_SHIFT.value()));
        keys.insert(EvdevKey::new(RIGHT_SHIFT.value()));

        let device = VirtualDevice::builder()
            .and_then(|builder| builder.name(device_name).with_keys(&keys))
            .and_then(|builder| builder.build())
            .map_err(|e| {
                TyperError::EventSourceUnavailable(format!(
                    "cannot create uinput device '{}': {}",
                    device_name, e
                ))
            })?;

        info!("Virtual keyboard '{}' created", device_name);
        Ok(device)
    }

    fn write_key(state: &mut DeviceState, code: u16, key_state: KeyState) -> Result<()> {
        let device = state
            .device
            .as_mut()
            .ok_or_else(|| TyperError::EventSourceUnavailable("virtual keyboard not created".to_string()))?;

        let event = InputEvent::new(EventType::KEY.0, code, key_state.value());
        // emit() appends the SYN_REPORT
        device
            .emit(&[event])
            .map_err(|e| crate::typer_error!(emit, "key {} {:?}: {}", code, key_state, e))?;

        match key_state {
            KeyState::Pressed => state.held.insert(code),
            KeyState::Released => state.held.remove(&code),
        };
        Ok(())
    }
}

impl KeyEmitter for VirtualKeyboard {
    fn ensure_ready(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.device.is_none() {
            state.device = Some(Self::create_virtual_device(&self.device_name)?);
        }
        Ok(())
    }

    fn supports_unicode(&self) -> bool {
        self.unicode.is_some()
    }

    fn post(&self, event: &SynthesizedKeyEvent) -> Result<()> {
        crate::debug_if_enabled!("Posting {}", event);

        match event.payload {
            KeyPayload::Key(code) => {
                let mut state = self.state.lock();
                Self::write_key(&mut state, code.value(), event.state)
            }
            KeyPayload::Unicode(ch) => match &self.unicode {
                Some(injector) => injector.post(ch, event.state),
                None => Err(crate::typer_error!(emit, "no Unicode injector for U+{:04X}", u32::from(ch))),
            },
        }
    }

    fn release_all(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.device.is_none() {
            return Ok(());
        }

        let held: Vec<u16> = state.held.iter().copied().collect();
        for code in held {
            debug!(
                "Releasing held key {}",
                KeyNames::reverse_translate(code).map_or_else(|| code.to_string(), str::to_string)
            );
            if let Err(e) = Self::write_key(&mut state, code, KeyState::Released) {
                warn!("Failed to release key {}: {}", code, e);
            }
        }
        Ok(())
    }
}

impl Drop for VirtualKeyboard {
    fn drop(&mut self) {
        if let Err(e) = self.release_all() {
            warn!("Failed to release keys on shutdown: {}", e);
        }
        if self.state.get_mut().device.is_some() {
            info!("Closing virtual keyboard '{}'", self.device_name);
        }
    }
}
