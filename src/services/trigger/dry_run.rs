use crate::config::Config;
use crate::error::Result;
use crate::events::TriggerCommand;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::r#trait::TriggerListener;

const IDLE_INTERVAL: Duration = Duration::from_secs(5);
const SAMPLE_TEXT: &str = "clip-typer dry run\n";

/// Stands in for the hot-key listener without opening any device. After the
/// first idle interval it emulates one start trigger with a sample text.
pub struct DryRunTriggerListener {
    start_key: String,
    stop_key: String,
    commands: mpsc::Sender<TriggerCommand>,
}

impl DryRunTriggerListener {
    pub fn new(config: &Config, commands: mpsc::Sender<TriggerCommand>) -> Self {
        Self {
            start_key: config.triggers.start_key.clone(),
            stop_key: config.triggers.stop_key.clone(),
            commands,
        }
    }

    async fn run_impl(self) -> Result<()> {
        info!(
            "[DRY RUN] Hot keys not read (start: {}, stop: {})",
            self.start_key, self.stop_key
        );

        tokio::time::sleep(IDLE_INTERVAL).await;
        info!("[DRY RUN] Emulating start trigger");
        if self
            .commands
            .send(TriggerCommand::Start(SAMPLE_TEXT.to_string()))
            .await
            .is_err()
        {
            return Ok(());
        }

        while !self.commands.is_closed() {
            tokio::time::sleep(IDLE_INTERVAL).await;
            debug!("[DRY RUN] trigger listener idle");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TriggerListener for DryRunTriggerListener {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_emulates_one_start_trigger() {
        let (tx, mut rx) = mpsc::channel(4);
        let listener = Box::new(DryRunTriggerListener::new(&Config::default(), tx));
        let task = tokio::spawn(listener.run());

        assert_eq!(
            rx.recv().await,
            Some(TriggerCommand::Start(SAMPLE_TEXT.to_string()))
        );

        drop(rx);
        assert!(task.await.unwrap().is_ok());
    }
}
