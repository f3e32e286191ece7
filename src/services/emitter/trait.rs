use crate::config::Config;
use crate::error::Result;
use crate::events::SynthesizedKeyEvent;
use std::sync::Arc;
use tracing::info;

use super::dry_run::DryRunEmitter;
use super::unicode::UnicodeInjector;
use super::virtual_device::VirtualKeyboard;

/// Sink for synthetic key events
pub trait KeyEmitter: Send + Sync {
    /// Make sure events can be posted at all. Called once per session,
    /// before anything is emitted.
    fn ensure_ready(&self) -> Result<()>;

    /// Whether `KeyPayload::Unicode` events can be posted
    fn supports_unicode(&self) -> bool;

    /// Post one event. Must not block beyond the write itself.
    fn post(&self, event: &SynthesizedKeyEvent) -> Result<()>;

    /// Release every key this emitter may still be holding down
    fn release_all(&self) -> Result<()> {
        Ok(())
    }
}

/// Factory picking the emitter for the dry_run flag
pub fn create_emitter(config: &Config, dry_run: bool) -> Arc<dyn KeyEmitter> {
    if dry_run {
        info!("Using dry-run emitter");
        return Arc::new(DryRunEmitter::new());
    }

    let unicode = UnicodeInjector::from_config(config.unicode.backend);
    Arc::new(VirtualKeyboard::new(&config.input.virtual_device_name, unicode))
}
