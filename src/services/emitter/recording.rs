//! In-memory emitter for tests

use crate::error::{Result, TyperError};
use crate::events::{KeyPayload, KeyState, Modifiers, SynthesizedKeyEvent};
use parking_lot::Mutex;

use super::r#trait::KeyEmitter;

#[derive(Debug, Default)]
pub struct RecordingEmitter {
    events: Mutex<Vec<SynthesizedKeyEvent>>,
    unicode: bool,
    unavailable: bool,
    fail_after: Option<usize>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self { unicode: true, ..Self::default() }
    }

    pub fn without_unicode() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self { unavailable: true, ..Self::new() }
    }

    /// Accept `n` events, then fail every post
    pub fn failing_after(n: usize) -> Self {
        Self { fail_after: Some(n), ..Self::new() }
    }

    pub fn events(&self) -> Vec<SynthesizedKeyEvent> {
        self.events.lock().clone()
    }

    /// (payload, state, modifiers) without timestamps
    pub fn sequence(&self) -> Vec<(KeyPayload, KeyState, Modifiers)> {
        self.events
            .lock()
            .iter()
            .map(|e| (e.payload, e.state, e.modifiers))
            .collect()
    }
}

impl KeyEmitter for RecordingEmitter {
    fn ensure_ready(&self) -> Result<()> {
        if self.unavailable {
            return Err(TyperError::EventSourceUnavailable("recording emitter disabled".to_string()));
        }
        Ok(())
    }

    fn supports_unicode(&self) -> bool {
        self.unicode
    }

    fn post(&self, event: &SynthesizedKeyEvent) -> Result<()> {
        let mut events = self.events.lock();
        if self.fail_after.is_some_and(|n| events.len() >= n) {
            return Err(crate::typer_error!(emit, "recording emitter full"));
        }
        events.push(event.clone());
        Ok(())
    }
}
