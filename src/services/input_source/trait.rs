use crate::config::{LayoutBackend, LayoutConfig};
use crate::error::Result;
use std::fmt;
use std::process::Command;
use std::sync::Arc;
use tracing::{info, warn};

use super::fixed::FixedLayouts;
use super::kde::KdeLayouts;
use super::setxkbmap::SetxkbmapLayouts;

/// One installed keyboard layout, e.g. `us` or `de(nodeadkeys)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutId {
    pub name: String,
    pub variant: String,
}

impl LayoutId {
    pub fn new(name: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variant: variant.into(),
        }
    }
}

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.variant.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}({})", self.name, self.variant)
        }
    }
}

/// Installed layouts and which one is active, if the backend can tell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutSnapshot {
    pub layouts: Vec<LayoutId>,
    pub active: Option<usize>,
}

impl LayoutSnapshot {
    pub fn active_layout(&self) -> Option<&LayoutId> {
        self.active.and_then(|i| self.layouts.get(i))
    }
}

/// OS registry of keyboard layouts
#[async_trait::async_trait]
pub trait LayoutRegistry: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn snapshot(&self) -> Result<LayoutSnapshot>;

    /// Make `snapshot.layouts[index]` the active layout
    async fn activate(&self, snapshot: &LayoutSnapshot, index: usize) -> Result<()>;

    /// Return to the state captured in `snapshot`
    async fn restore(&self, snapshot: &LayoutSnapshot) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DesktopEnvironment {
    Kde,
    X11Generic,
    Other,
}

fn detect_desktop_environment() -> DesktopEnvironment {
    if let Ok(desktop) = std::env::var("XDG_CURRENT_DESKTOP") {
        if desktop.to_lowercase().contains("kde") {
            return DesktopEnvironment::Kde;
        }
    }

    match std::env::var("XDG_SESSION_TYPE").as_deref() {
        Ok("x11") => return DesktopEnvironment::X11Generic,
        Ok("wayland") => return DesktopEnvironment::Other,
        _ => {}
    }

    if let Ok(output) = Command::new("pgrep").arg("-x").arg("kwin_x11").output() {
        if !output.stdout.is_empty() {
            return DesktopEnvironment::Kde;
        }
    }

    if std::env::var_os("DISPLAY").is_some() {
        DesktopEnvironment::X11Generic
    } else {
        DesktopEnvironment::Other
    }
}

/// Factory for the layout registry. `None` means layouts are not managed and
/// the active one is trusted to match the key-code table.
pub fn create_layout_registry(
    config: &LayoutConfig,
    dry_run: bool,
) -> Option<Arc<dyn LayoutRegistry>> {
    if !config.enabled {
        info!("Keyboard layout switching disabled");
        return None;
    }

    if dry_run {
        return Some(Arc::new(FixedLayouts::new(
            vec![LayoutId::new("us", "")],
            Some(0),
        )));
    }

    let backend = match config.backend {
        LayoutBackend::Auto => match detect_desktop_environment() {
            DesktopEnvironment::Kde => LayoutBackend::Kde,
            DesktopEnvironment::X11Generic => LayoutBackend::Setxkbmap,
            DesktopEnvironment::Other => {
                warn!("No keyboard layout backend for this desktop, layouts are left as they are");
                return None;
            }
        },
        explicit => explicit,
    };

    let registry: Arc<dyn LayoutRegistry> = match backend {
        LayoutBackend::Kde => Arc::new(KdeLayouts::new()),
        _ => Arc::new(SetxkbmapLayouts::new()),
    };
    info!("Keyboard layouts managed through {}", registry.backend_name());
    Some(registry)
}
