pub mod keyboard;
pub mod trigger;

pub use keyboard::{KeyCode, KeyPayload, KeyState, Modifiers};
pub use trigger::TriggerCommand;

use tokio::time::Instant;

/// One synthetic key event on its way to the OS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedKeyEvent {
    pub payload: KeyPayload,
    pub state: KeyState,
    pub modifiers: Modifiers,
    pub emitted_at: Instant,
}

impl SynthesizedKeyEvent {
    pub fn new(payload: KeyPayload, state: KeyState, modifiers: Modifiers) -> Self {
        Self {
            payload,
            state,
            modifiers,
            emitted_at: Instant::now(),
        }
    }

    #[cfg(test)]
    pub fn is_press(&self) -> bool {
        self.state == KeyState::Pressed
    }
}

impl std::fmt::Display for SynthesizedKeyEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:?}", self.payload, self.state)?;
        if !self.modifiers.is_empty() {
            write!(f, " [{}]", self.modifiers)?;
        }
        Ok(())
    }
}
