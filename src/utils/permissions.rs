use crate::error::{Result, TyperError};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tracing::{info, warn};

const INPUT_DIR: &str = "/dev/input";
const UINPUT_DEVICE: &str = "/dev/uinput";

/// Check access to the kernel input interfaces. `/dev/input` is only needed
/// when hot keys are read from a physical keyboard.
pub fn check_permissions(needs_input: bool) -> Result<()> {
    info!("Checking input device permissions...");

    if needs_input {
        check_input_devices_access()?;
    }
    check_uinput_access()?;
    check_not_root();

    info!("Input device permissions OK");
    Ok(())
}

fn check_input_devices_access() -> Result<()> {
    if !Path::new(INPUT_DIR).exists() {
        return Err(TyperError::Permission(format!("{} does not exist", INPUT_DIR)));
    }

    fs::read_dir(INPUT_DIR).map(|_| ()).map_err(|e| {
        TyperError::Permission(format!(
            "cannot read {}: {}. Add the user to the 'input' group",
            INPUT_DIR, e
        ))
    })
}

fn check_uinput_access() -> Result<()> {
    if !Path::new(UINPUT_DEVICE).exists() {
        // The module may still be loaded before the first session
        warn!("{} does not exist, is the uinput module loaded?", UINPUT_DEVICE);
        return Ok(());
    }

    let mode = fs::metadata(UINPUT_DEVICE)
        .map_err(|e| {
            TyperError::Permission(format!("cannot stat {}: {}", UINPUT_DEVICE, e))
        })?
        .permissions()
        .mode();

    if !uinput_mode_allows_access(mode) {
        return Err(TyperError::Permission(format!(
            "no access to {}. Add the user to the 'uinput' or 'input' group",
            UINPUT_DEVICE
        )));
    }
    Ok(())
}

/// Group or other read/write bits (typically 0660 or 0666)
fn uinput_mode_allows_access(mode: u32) -> bool {
    mode & 0o006 != 0 || mode & 0o060 != 0
}

fn check_not_root() {
    match std::env::var("USER") {
        Ok(user) if user == "root" => {
            warn!("Running as root");
            warn!("  Prefer: sudo usermod -a -G input,uinput $USER && sudo modprobe uinput");
        }
        Ok(user) => info!("Running as user {}", user),
        Err(_) => warn!("Could not determine the current user"),
    }
}
