use crate::config::Config;
use crate::error::Result;
use crate::events::TriggerCommand;
use tokio::sync::mpsc;

use super::dry_run::DryRunTriggerListener;
use super::hotkey_listener::HotkeyListener;

/// Source of start/stop commands for the typing service
#[async_trait::async_trait]
pub trait TriggerListener {
    /// Run until the receiving side of the channel goes away
    async fn run(self: Box<Self>) -> Result<()>;
}

/// Factory picking the trigger listener for the dry_run flag
pub fn create_trigger_listener(
    config: &Config,
    commands: mpsc::Sender<TriggerCommand>,
    dry_run: bool,
) -> Result<Box<dyn TriggerListener + Send>> {
    if dry_run {
        Ok(Box::new(DryRunTriggerListener::new(config, commands)))
    } else {
        Ok(Box::new(HotkeyListener::new(config, commands)?))
    }
}
