use crate::error::{Result, TyperError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Locates the physical keyboard the hot keys are read from
pub struct DeviceFinder;

impl DeviceFinder {
    /// `device_path` is either a path or "auto". Devices named
    /// `exclude_name` (our own virtual keyboard) are never picked.
    pub fn find_keyboard_device(device_path: &str, exclude_name: &str) -> Result<PathBuf> {
        if device_path != "auto" {
            let path = PathBuf::from(device_path);
            return if path.exists() {
                info!("Using configured keyboard {:?}", path);
                Ok(path)
            } else {
                TyperError::device_not_found(format!("configured keyboard {:?} does not exist", path))
            };
        }

        Self::auto_find_keyboard(exclude_name)
    }

    fn auto_find_keyboard(exclude_name: &str) -> Result<PathBuf> {
        info!("Looking for a keyboard device...");

        if let Ok(device) = Self::find_by_id(exclude_name) {
            info!("Found keyboard by id: {:?}", device);
            return Ok(device);
        }

        if let Ok(device) = Self::find_by_event_devices(exclude_name) {
            info!("Found keyboard among event devices: {:?}", device);
            return Ok(device);
        }

        TyperError::device_not_found(
            "no usable keyboard found; is the user in the 'input' group?",
        )
    }

    fn find_by_id(exclude_name: &str) -> Result<PathBuf> {
        let by_id_dir = Path::new("/dev/input/by-id");
        if !by_id_dir.exists() {
            debug!("/dev/input/by-id does not exist");
            return TyperError::device_not_found("no /dev/input/by-id");
        }

        let entries = fs::read_dir(by_id_dir)
            .map_err(|e| crate::typer_error!(permission, "cannot read /dev/input/by-id: {}", e))?;

        let mut candidates = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("")
                .to_string();

            if !Self::looks_like_keyboard_link(&name) {
                continue;
            }
            if !Self::is_device_accessible(&path) {
                warn!("Keyboard {:?} is not accessible", path);
                continue;
            }
            if Self::is_keyboard_device(&path, exclude_name) {
                let priority = Self::link_priority(&name);
                debug!("Keyboard candidate {} (priority {})", name, priority);
                candidates.push((path, priority));
            }
        }

        candidates.sort_by(|a, b| b.1.cmp(&a.1));
        match candidates.into_iter().next() {
            Some((path, _)) => Ok(path),
            None => TyperError::device_not_found("no keyboard under /dev/input/by-id"),
        }
    }

    fn looks_like_keyboard_link(name: &str) -> bool {
        let lower = name.to_lowercase();
        (lower.contains("kbd") || lower.contains("keyboard"))
            && lower.contains("event")
            && !lower.contains("mouse")
    }

    fn link_priority(name: &str) -> u8 {
        if name.ends_with("event-kbd") {
            100
        } else if name.to_lowercase().contains("keyboard") {
            50
        } else {
            10
        }
    }

    fn find_by_event_devices(exclude_name: &str) -> Result<PathBuf> {
        let entries = fs::read_dir("/dev/input")
            .map_err(|e| crate::typer_error!(permission, "cannot read /dev/input: {}", e))?;

        let mut event_devices: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("event"))
            })
            .collect();
        event_devices.sort();

        event_devices
            .into_iter()
            .find(|path| {
                Self::is_device_accessible(path) && Self::is_keyboard_device(path, exclude_name)
            })
            .map_or_else(
                || TyperError::device_not_found("no accessible keyboard among event devices"),
                Ok,
            )
    }

    fn is_keyboard_device(device_path: &Path, exclude_name: &str) -> bool {
        let device = match evdev::Device::open(device_path) {
            Ok(device) => device,
            Err(e) => {
                debug!("Cannot open {:?}: {}", device_path, e);
                return false;
            }
        };

        let name = device.name().unwrap_or("Unknown");
        if !Self::is_candidate_name(name, exclude_name) {
            debug!("Skipping {:?} ({})", device_path, name);
            return false;
        }

        device.supported_keys().is_some_and(|keys| {
            keys.contains(evdev::KeyCode::KEY_A)
                && keys.contains(evdev::KeyCode::KEY_SPACE)
                && keys.contains(evdev::KeyCode::KEY_ENTER)
                && keys.iter().count() > 20
        })
    }

    /// Pointing devices and our own virtual keyboard are never candidates
    fn is_candidate_name(device_name: &str, exclude_name: &str) -> bool {
        if device_name == exclude_name {
            return false;
        }
        let lower = device_name.to_lowercase();
        !["mouse", "touchpad", "trackpoint"]
            .iter()
            .any(|word| lower.contains(word))
    }

    fn is_device_accessible(device_path: &Path) -> bool {
        match fs::File::open(device_path) {
            Ok(_) => true,
            Err(e) => {
                debug!("{:?} not accessible: {}", device_path, e);
                false
            }
        }
    }
}
