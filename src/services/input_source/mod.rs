//! InputSourceGuard: make sure a Latin keyboard layout is active before key
//! codes are emitted, and put the user's layout back afterwards.
//!
//! The key-code table describes US QWERTY positions. Under any other active
//! layout the same codes produce different characters, so a session either
//! switches to a known Latin layout or, failing that, sends text through
//! the raw-Unicode path.

pub mod fixed;
mod kde;
mod setxkbmap;
mod r#trait;

pub use self::r#trait::{create_layout_registry, LayoutId, LayoutRegistry, LayoutSnapshot};

use crate::config::LayoutConfig;
use crate::error::TyperError;
use std::sync::Arc;
use tracing::{info, warn};

pub struct InputSourceGuard {
    registry: Option<Arc<dyn LayoutRegistry>>,
    latin_layouts: Vec<String>,
    restore: bool,
}

/// Result of engaging the guard, handed back to [`InputSourceGuard::release`]
#[derive(Debug)]
pub struct LayoutLease {
    latin_active: bool,
    switched: bool,
    restore_to: Option<LayoutSnapshot>,
}

impl LayoutLease {
    /// Whether a layout matching the key-code table is now active
    pub fn latin_active(&self) -> bool {
        self.latin_active
    }

    pub fn switched(&self) -> bool {
        self.switched
    }
}

impl InputSourceGuard {
    pub fn new(registry: Option<Arc<dyn LayoutRegistry>>, config: &LayoutConfig) -> Self {
        Self {
            registry,
            latin_layouts: config
                .latin_layouts
                .iter()
                .map(|l| l.to_lowercase())
                .collect(),
            restore: config.restore,
        }
    }

    /// Guard that never touches layouts and trusts the active one
    #[cfg(test)]
    pub fn unmanaged() -> Self {
        Self {
            registry: None,
            latin_layouts: Vec::new(),
            restore: false,
        }
    }

    fn is_latin(&self, layout: &LayoutId) -> bool {
        let name = layout.name.to_lowercase();
        let full = layout.to_string().to_lowercase();
        self.latin_layouts
            .iter()
            .any(|known| *known == name || *known == full)
    }

    /// Switch to a Latin layout if the active one is not. Never fails: a
    /// missing Latin layout or a backend error yields a lease with
    /// `latin_active() == false` and a warning in the log.
    pub async fn engage(&self) -> LayoutLease {
        let Some(registry) = &self.registry else {
            return LayoutLease {
                latin_active: true,
                switched: false,
                restore_to: None,
            };
        };

        match self.try_engage(registry.as_ref()).await {
            Ok(lease) => lease,
            Err(e) => {
                warn!("{}", e);
                LayoutLease {
                    latin_active: false,
                    switched: false,
                    restore_to: None,
                }
            }
        }
    }

    async fn try_engage(&self, registry: &dyn LayoutRegistry) -> crate::error::Result<LayoutLease> {
        let snapshot = registry.snapshot().await?;

        if let Some(active) = snapshot.active_layout() {
            if self.is_latin(active) {
                crate::debug_if_enabled!("Active layout {} is already Latin", active);
                return Ok(LayoutLease {
                    latin_active: true,
                    switched: false,
                    restore_to: None,
                });
            }
        }

        let Some(index) = snapshot.layouts.iter().position(|l| self.is_latin(l)) else {
            return Err(TyperError::LayoutSwitchUnavailable(format!(
                "none of {:?} is installed (have: {})",
                self.latin_layouts,
                snapshot
                    .layouts
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        };

        registry.activate(&snapshot, index).await?;
        info!(
            "Switched keyboard layout to {} via {}",
            snapshot.layouts[index],
            registry.backend_name()
        );

        Ok(LayoutLease {
            latin_active: true,
            switched: true,
            restore_to: self.restore.then_some(snapshot),
        })
    }

    /// Undo what `engage` switched, when restoring is configured
    pub async fn release(&self, lease: LayoutLease) {
        let (Some(registry), Some(snapshot)) = (&self.registry, lease.restore_to) else {
            return;
        };

        match registry.restore(&snapshot).await {
            Ok(()) => info!("Restored previous keyboard layout"),
            Err(e) => warn!("Failed to restore keyboard layout: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::fixed::FixedLayouts;

    fn config() -> LayoutConfig {
        LayoutConfig::default()
    }

    #[tokio::test]
    async fn test_already_latin_is_left_alone() {
        let registry = Arc::new(FixedLayouts::new(
            vec![LayoutId::new("us", ""), LayoutId::new("ru", "")],
            Some(0),
        ));
        let guard = InputSourceGuard::new(Some(registry.clone() as Arc<dyn LayoutRegistry>), &config());

        let lease = guard.engage().await;
        assert!(lease.latin_active());
        assert!(!lease.switched());
        guard.release(lease).await;
        assert!(registry.activations().is_empty());
    }

    #[tokio::test]
    async fn test_switches_and_restores() {
        let registry = Arc::new(FixedLayouts::new(
            vec![LayoutId::new("ru", ""), LayoutId::new("us", "")],
            Some(0),
        ));
        let guard = InputSourceGuard::new(Some(registry.clone() as Arc<dyn LayoutRegistry>), &config());

        let lease = guard.engage().await;
        assert!(lease.latin_active());
        assert!(lease.switched());
        assert_eq!(registry.active(), Some(1));

        guard.release(lease).await;
        assert_eq!(registry.active(), Some(0));
        assert_eq!(registry.activations(), vec![1, 0]);
    }

    #[tokio::test]
    async fn test_no_restore_when_disabled() {
        let registry = Arc::new(FixedLayouts::new(
            vec![LayoutId::new("ru", ""), LayoutId::new("us", "")],
            Some(0),
        ));
        let mut cfg = config();
        cfg.restore = false;
        let guard = InputSourceGuard::new(Some(registry.clone() as Arc<dyn LayoutRegistry>), &cfg);

        let lease = guard.engage().await;
        guard.release(lease).await;
        assert_eq!(registry.active(), Some(1));
    }

    #[tokio::test]
    async fn test_unknown_active_layout_is_switched() {
        let registry = Arc::new(FixedLayouts::new(
            vec![LayoutId::new("de", ""), LayoutId::new("us", "")],
            None,
        ));
        let guard = InputSourceGuard::new(Some(registry.clone() as Arc<dyn LayoutRegistry>), &config());

        let lease = guard.engage().await;
        assert!(lease.latin_active());
        assert_eq!(registry.activations(), vec![1]);
    }

    #[tokio::test]
    async fn test_missing_latin_layout_is_not_fatal() {
        let registry = Arc::new(FixedLayouts::new(
            vec![LayoutId::new("ru", ""), LayoutId::new("ua", "")],
            Some(0),
        ));
        let guard = InputSourceGuard::new(Some(registry.clone() as Arc<dyn LayoutRegistry>), &config());

        let lease = guard.engage().await;
        assert!(!lease.latin_active());
        assert!(registry.activations().is_empty());
    }

    #[tokio::test]
    async fn test_variant_qualified_match() {
        let registry = Arc::new(FixedLayouts::new(
            vec![LayoutId::new("ru", ""), LayoutId::new("us", "intl")],
            Some(0),
        ));
        let mut cfg = config();
        cfg.latin_layouts = vec!["us(intl)".to_string()];
        let guard = InputSourceGuard::new(Some(registry.clone() as Arc<dyn LayoutRegistry>), &cfg);

        assert!(guard.engage().await.latin_active());
        assert_eq!(registry.active(), Some(1));
    }

    #[tokio::test]
    async fn test_unmanaged_trusts_active_layout() {
        let guard = InputSourceGuard::unmanaged();
        let lease = guard.engage().await;
        assert!(lease.latin_active());
        assert!(!lease.switched());
    }
}
