use crate::config::{BusyPolicy, Config};
use crate::error::{Result, TyperError};
use crate::events::{KeyCode, TriggerCommand};
use crate::services::emitter::KeyEmitter;
use crate::services::input_source::InputSourceGuard;
use crate::services::session_handle::{SessionHandle, SessionLease};
use crate::services::text_source::TextSource;
use crate::services::typing_session::{SessionContext, SessionReport, TypingDelays, TypingSession};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Running session started by [`TypingService::start_typing`]
pub struct SessionTicket {
    chars: usize,
    task: JoinHandle<SessionReport>,
}

impl SessionTicket {
    pub fn chars(&self) -> usize {
        self.chars
    }

    /// Wait for the session to end
    pub async fn wait(self) -> Result<SessionReport> {
        self.task
            .await
            .map_err(|e| crate::typer_error!(internal, "typing session task failed: {}", e))
    }
}

/// Entry point for starting and stopping typing sessions. At most one
/// session runs at a time; the shared [`SessionHandle`] is the only state
/// the session task and the callers have in common.
pub struct TypingService {
    emitter: Arc<dyn KeyEmitter>,
    layout: Arc<InputSourceGuard>,
    text_source: Arc<dyn TextSource>,
    handle: SessionHandle,
    delays: TypingDelays,
    shift_key: KeyCode,
    busy_policy: BusyPolicy,
    force_unicode_without_latin: bool,
}

impl TypingService {
    pub fn new(
        config: &Config,
        emitter: Arc<dyn KeyEmitter>,
        layout: InputSourceGuard,
        text_source: Arc<dyn TextSource>,
    ) -> anyhow::Result<Self> {
        let shift_key = KeyCode::new(config.typing.shift_key_code()?);

        Ok(Self {
            emitter,
            layout: Arc::new(layout),
            text_source,
            handle: SessionHandle::new(),
            delays: config.typing.delays(),
            shift_key,
            busy_policy: config.typing.busy_policy,
            force_unicode_without_latin: config.layout.force_unicode_without_latin,
        })
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    #[allow(dead_code)]
    pub fn is_session_active(&self) -> bool {
        self.handle.is_active()
    }

    /// Ask the running session to stop at the next character boundary.
    /// `false` when nothing is running.
    pub fn request_stop(&self) -> bool {
        let stopped = self.handle.request_stop();
        if stopped {
            info!("Stop requested");
        } else {
            debug!("Stop requested while {}", self.handle.phase());
        }
        stopped
    }

    /// Start typing `text` on a new task.
    ///
    /// Fails with `EmptyText`, with `Busy` while another session runs under
    /// the reject policy, or with `EventSourceUnavailable` when the emitter
    /// cannot post events. On failure the handle stays idle.
    pub async fn start_typing(&self, text: &str) -> Result<SessionTicket> {
        if text.is_empty() {
            return Err(TyperError::EmptyText);
        }

        let lease = self.acquire().await?;

        if let Err(e) = self.emitter.ensure_ready() {
            error!("Event source unavailable: {}", e);
            return Err(match e {
                TyperError::EventSourceUnavailable(_) => e,
                other => TyperError::EventSourceUnavailable(other.to_string()),
            });
        }

        let context = SessionContext {
            emitter: Arc::clone(&self.emitter),
            layout: Arc::clone(&self.layout),
            delays: self.delays,
            shift_key: self.shift_key,
            force_unicode_without_latin: self.force_unicode_without_latin,
        };
        let session = TypingSession::new(text, lease, context);
        let chars = session.char_count();

        let task = tokio::spawn(session.run());
        Ok(SessionTicket { chars, task })
    }

    async fn acquire(&self) -> Result<SessionLease> {
        loop {
            if let Some(lease) = self.handle.try_begin() {
                return Ok(lease);
            }

            match self.busy_policy {
                BusyPolicy::Reject => {
                    warn!("Typing session already running, start request rejected");
                    return Err(TyperError::Busy);
                }
                BusyPolicy::Preempt => {
                    info!("Preempting running typing session");
                    self.handle.request_stop();
                    self.handle.wait_idle().await;
                }
            }
        }
    }

    async fn start_from_source(&self) -> Result<SessionTicket> {
        if self.handle.is_active() && self.busy_policy == BusyPolicy::Reject {
            return Err(TyperError::Busy);
        }
        let text = self.text_source.read().await?;
        self.start_typing(&text).await
    }

    /// Consume trigger commands until every sender is gone
    pub async fn run(self: Arc<Self>, mut commands: mpsc::Receiver<TriggerCommand>) {
        info!("Typing service waiting for triggers");

        while let Some(command) = commands.recv().await {
            debug!("Trigger: {}", command);

            let started = match command {
                TriggerCommand::Start(text) => self.start_typing(&text).await,
                TriggerCommand::StartFromSource => self.start_from_source().await,
                TriggerCommand::Stop => {
                    self.request_stop();
                    continue;
                }
            };

            match started {
                Ok(ticket) => info!("Typing {} chars", ticket.chars()),
                Err(TyperError::Busy) => {}
                Err(TyperError::EmptyText) => warn!("Nothing to type"),
                Err(e) => error!("Could not start typing: {}", e),
            }
        }

        info!("Trigger channel closed");
    }

    /// Stop any running session and wait up to `timeout` for it to end,
    /// then release held keys
    pub async fn shutdown(&self, timeout: Duration) {
        if self.request_stop() {
            if tokio::time::timeout(timeout, self.handle.wait_idle())
                .await
                .is_err()
            {
                warn!("Typing session did not stop within {:?}", timeout);
            }
        }

        if let Err(e) = self.emitter.release_all() {
            warn!("Failed to release held keys: {}", e);
        }
    }
}
