use thiserror::Error;

#[derive(Error, Debug)]
pub enum TyperError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("D-Bus error: {0}")]
    DBus(#[from] zbus::Error),

    #[error("Event source unavailable: {0}")]
    EventSourceUnavailable(String),

    #[error("Keyboard layout switch unavailable: {0}")]
    LayoutSwitchUnavailable(String),

    #[error("A typing session is already running")]
    Busy,

    #[error("Nothing to type")]
    EmptyText,

    #[error("Failed to post key event: {0}")]
    Emit(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Insufficient permissions: {0}")]
    Permission(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TyperError {
    pub fn device_not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(TyperError::DeviceNotFound(msg.into()))
    }

    /// Errors that mean the OS refuses synthetic input altogether.
    /// Retrying them would only spin.
    pub fn is_event_source_failure(&self) -> bool {
        matches!(
            self,
            TyperError::EventSourceUnavailable(_) | TyperError::Permission(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TyperError>;

#[macro_export]
macro_rules! typer_error {
    (emit, $($arg:tt)*) => {
        $crate::error::TyperError::Emit(format!($($arg)*))
    };
    (event_source, $($arg:tt)*) => {
        $crate::error::TyperError::EventSourceUnavailable(format!($($arg)*))
    };
    (layout, $($arg:tt)*) => {
        $crate::error::TyperError::LayoutSwitchUnavailable(format!($($arg)*))
    };
    (device_not_found, $($arg:tt)*) => {
        $crate::error::TyperError::DeviceNotFound(format!($($arg)*))
    };
    (permission, $($arg:tt)*) => {
        $crate::error::TyperError::Permission(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::TyperError::ServiceUnavailable(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::TyperError::Internal(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_macro_formats_message() {
        let err = typer_error!(emit, "key {} rejected", 30);
        assert_eq!(err.to_string(), "Failed to post key event: key 30 rejected");
    }

    #[test]
    fn test_event_source_failure_classification() {
        assert!(TyperError::EventSourceUnavailable("no uinput".into()).is_event_source_failure());
        assert!(TyperError::Permission("denied".into()).is_event_source_failure());
        assert!(!TyperError::Emit("short write".into()).is_event_source_failure());
        assert!(!TyperError::Busy.is_event_source_failure());
    }
}
