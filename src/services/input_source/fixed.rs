use crate::error::Result;
use parking_lot::Mutex;
use tracing::info;

use super::r#trait::{LayoutId, LayoutRegistry, LayoutSnapshot};

/// In-memory layout registry for dry runs and tests
pub struct FixedLayouts {
    layouts: Vec<LayoutId>,
    active: Mutex<Option<usize>>,
    activations: Mutex<Vec<usize>>,
}

impl FixedLayouts {
    pub fn new(layouts: Vec<LayoutId>, active: Option<usize>) -> Self {
        Self {
            layouts,
            active: Mutex::new(active),
            activations: Mutex::new(Vec::new()),
        }
    }

    pub fn active(&self) -> Option<usize> {
        *self.active.lock()
    }

    /// Indices passed to `activate` or `restore`, in call order
    #[cfg(test)]
    pub fn activations(&self) -> Vec<usize> {
        self.activations.lock().clone()
    }
}

#[async_trait::async_trait]
impl LayoutRegistry for FixedLayouts {
    fn backend_name(&self) -> &'static str {
        "fixed"
    }

    async fn snapshot(&self) -> Result<LayoutSnapshot> {
        Ok(LayoutSnapshot {
            layouts: self.layouts.clone(),
            active: self.active(),
        })
    }

    async fn activate(&self, _snapshot: &LayoutSnapshot, index: usize) -> Result<()> {
        if index >= self.layouts.len() {
            return Err(crate::typer_error!(layout, "layout index {} out of range", index));
        }
        info!("[FIXED] Activating layout {}", self.layouts[index]);
        *self.active.lock() = Some(index);
        self.activations.lock().push(index);
        Ok(())
    }

    async fn restore(&self, snapshot: &LayoutSnapshot) -> Result<()> {
        *self.active.lock() = snapshot.active;
        if let Some(index) = snapshot.active {
            self.activations.lock().push(index);
        }
        Ok(())
    }
}
