use std::fmt;

/// Messages delivered by trigger sources (hot keys, CLI) to the typing service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerCommand {
    /// Type the given text
    Start(String),
    /// Type whatever the configured text source yields at trigger time
    StartFromSource,
    /// Cancel the running session at the next character boundary
    Stop,
}

impl fmt::Display for TriggerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerCommand::Start(text) => write!(f, "start ({} chars)", text.chars().count()),
            TriggerCommand::StartFromSource => write!(f, "start (from text source)"),
            TriggerCommand::Stop => write!(f, "stop"),
        }
    }
}
