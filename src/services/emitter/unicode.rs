//! Raw-Unicode key events through desktop helpers.
//!
//! uinput only speaks physical key codes, so a code point without a key is
//! handed to a helper that binds a spare keycode to the keysym `U<hex>` and
//! presses or releases it.

use crate::config::UnicodeBackend;
use crate::error::{Result, TyperError};
use crate::events::KeyState;
use std::process::Command;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnicodeInjector {
    /// X11: `xdotool keydown|keyup U4E2D`
    Xdotool,
    /// Wayland (virtual-keyboard protocol): `wtype -P|-p U4E2D`
    Wtype,
}

impl UnicodeInjector {
    pub fn from_config(backend: UnicodeBackend) -> Option<Self> {
        match backend {
            UnicodeBackend::Xdotool => Some(Self::Xdotool),
            UnicodeBackend::Wtype => Some(Self::Wtype),
            UnicodeBackend::None => None,
            UnicodeBackend::Auto => Self::detect(),
        }
    }

    fn detect() -> Option<Self> {
        let session = std::env::var("XDG_SESSION_TYPE").unwrap_or_default();
        let candidate = if session == "wayland" || std::env::var_os("WAYLAND_DISPLAY").is_some() {
            Self::Wtype
        } else if std::env::var_os("DISPLAY").is_some() {
            Self::Xdotool
        } else {
            warn!("No graphical session detected, Unicode characters will be skipped");
            return None;
        };

        if candidate.is_installed() {
            info!("Unicode injection through {}", candidate.name());
            Some(candidate)
        } else {
            warn!(
                "{} not found, Unicode characters will be skipped",
                candidate.name()
            );
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Xdotool => "xdotool",
            Self::Wtype => "wtype",
        }
    }

    fn is_installed(&self) -> bool {
        Command::new("which")
            .arg(self.name())
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Keysym name for a code point, e.g. `U4E2D`
    pub fn keysym(ch: char) -> String {
        format!("U{:04X}", u32::from(ch))
    }

    pub fn args(&self, ch: char, state: KeyState) -> Vec<String> {
        let keysym = Self::keysym(ch);
        match (self, state) {
            (Self::Xdotool, KeyState::Pressed) => vec!["keydown".to_string(), keysym],
            (Self::Xdotool, KeyState::Released) => vec!["keyup".to_string(), keysym],
            (Self::Wtype, KeyState::Pressed) => vec!["-P".to_string(), keysym],
            (Self::Wtype, KeyState::Released) => vec!["-p".to_string(), keysym],
        }
    }

    pub fn post(&self, ch: char, state: KeyState) -> Result<()> {
        let args = self.args(ch, state);
        debug!("{} {}", self.name(), args.join(" "));

        let output = Command::new(self.name()).args(&args).output().map_err(|e| {
            TyperError::EventSourceUnavailable(format!("{} could not be run: {}", self.name(), e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(crate::typer_error!(
                emit,
                "{} failed for {}: {}",
                self.name(),
                Self::keysym(ch),
                stderr.trim()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keysym_format() {
        assert_eq!(UnicodeInjector::keysym('中'), "U4E2D");
        assert_eq!(UnicodeInjector::keysym('é'), "U00E9");
        assert_eq!(UnicodeInjector::keysym('😀'), "U1F600");
    }

    #[test]
    fn test_helper_arguments() {
        assert_eq!(
            UnicodeInjector::Xdotool.args('中', KeyState::Pressed),
            vec!["keydown", "U4E2D"]
        );
        assert_eq!(
            UnicodeInjector::Xdotool.args('中', KeyState::Released),
            vec!["keyup", "U4E2D"]
        );
        assert_eq!(UnicodeInjector::Wtype.args('é', KeyState::Pressed), vec!["-P", "U00E9"]);
        assert_eq!(UnicodeInjector::Wtype.args('é', KeyState::Released), vec!["-p", "U00E9"]);
    }

    #[test]
    fn test_explicit_backends() {
        assert_eq!(
            UnicodeInjector::from_config(UnicodeBackend::Xdotool),
            Some(UnicodeInjector::Xdotool)
        );
        assert_eq!(UnicodeInjector::from_config(UnicodeBackend::None), None);
    }
}
