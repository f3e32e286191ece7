use crate::config::ClipboardConfig;
use crate::error::Result;
use std::process::Command;
use tracing::debug;

/// Where a start trigger gets its text from
#[async_trait::async_trait]
pub trait TextSource: Send + Sync {
    fn name(&self) -> String;

    async fn read(&self) -> Result<String>;
}

/// Runs a helper process and takes its stdout as the clipboard text
pub struct ClipboardCommand {
    program: String,
    args: Vec<String>,
}

impl ClipboardCommand {
    /// Configured command, or `wl-paste`/`xclip` depending on the session type
    pub fn from_config(config: &ClipboardConfig) -> Self {
        if let Some((program, args)) = config.command.split_first() {
            return Self {
                program: program.clone(),
                args: args.to_vec(),
            };
        }

        let (program, args) = Self::default_command(
            std::env::var("XDG_SESSION_TYPE").ok().as_deref(),
            std::env::var_os("WAYLAND_DISPLAY").is_some(),
        );
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn default_command(
        session_type: Option<&str>,
        wayland_display: bool,
    ) -> (&'static str, &'static [&'static str]) {
        if session_type == Some("wayland") || (session_type.is_none() && wayland_display) {
            ("wl-paste", &["--no-newline"])
        } else {
            ("xclip", &["-o", "-selection", "clipboard"])
        }
    }
}

#[async_trait::async_trait]
impl TextSource for ClipboardCommand {
    fn name(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    async fn read(&self) -> Result<String> {
        let program = self.program.clone();
        let args = self.args.clone();

        let output = tokio::task::spawn_blocking(move || Command::new(&program).args(&args).output())
            .await
            .map_err(|e| crate::typer_error!(internal, "clipboard reader panicked: {}", e))?
            .map_err(|e| {
                crate::typer_error!(service_unavailable, "{} could not be run: {}", self.program, e)
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(crate::typer_error!(
                service_unavailable,
                "{} failed: {}",
                self.program,
                stderr.trim()
            ));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("Read {} chars from {}", text.chars().count(), self.name());
        Ok(text)
    }
}

/// Always yields the same text
pub struct FixedText(pub String);

#[async_trait::async_trait]
impl TextSource for FixedText {
    fn name(&self) -> String {
        "fixed text".to_string()
    }

    async fn read(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_by_session_type() {
        assert_eq!(
            ClipboardCommand::default_command(Some("wayland"), false).0,
            "wl-paste"
        );
        assert_eq!(ClipboardCommand::default_command(Some("x11"), true).0, "xclip");
        assert_eq!(ClipboardCommand::default_command(None, true).0, "wl-paste");
        assert_eq!(ClipboardCommand::default_command(None, false).0, "xclip");
    }

    #[test]
    fn test_configured_command_wins() {
        let config = ClipboardConfig {
            command: vec!["cat".to_string(), "/tmp/clip".to_string()],
        };
        let source = ClipboardCommand::from_config(&config);
        assert_eq!(source.name(), "cat /tmp/clip");
    }

    #[tokio::test]
    async fn test_command_output_is_text() {
        let config = ClipboardConfig {
            command: vec!["printf".to_string(), "hello".to_string()],
        };
        let source = ClipboardCommand::from_config(&config);
        assert_eq!(source.read().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let config = ClipboardConfig {
            command: vec!["clip-typer-no-such-program".to_string()],
        };
        let source = ClipboardCommand::from_config(&config);
        assert!(source.read().await.is_err());
    }
}
