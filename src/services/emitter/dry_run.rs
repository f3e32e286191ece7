use crate::error::Result;
use crate::events::SynthesizedKeyEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

use super::r#trait::KeyEmitter;

/// Logs events instead of posting them
#[derive(Debug, Default)]
pub struct DryRunEmitter {
    posted: AtomicU64,
}

impl DryRunEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posted(&self) -> u64 {
        self.posted.load(Ordering::Relaxed)
    }
}

impl KeyEmitter for DryRunEmitter {
    fn ensure_ready(&self) -> Result<()> {
        Ok(())
    }

    fn supports_unicode(&self) -> bool {
        true
    }

    fn post(&self, event: &SynthesizedKeyEvent) -> Result<()> {
        let n = self.posted.fetch_add(1, Ordering::Relaxed) + 1;
        info!("[DRY RUN] #{} {}", n, event);
        Ok(())
    }

    fn release_all(&self) -> Result<()> {
        info!("[DRY RUN] release all ({} events posted)", self.posted());
        Ok(())
    }
}
