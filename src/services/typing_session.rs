//! One pass of typing a string.
//!
//! `Idle → Running → {Completed, Cancelled, Aborted}`. The session owns the
//! [`SessionLease`]; when `run` returns the lease is dropped and the shared
//! handle is idle again.
//!
//! Stop requests cut the start and layout-settle waits short and are
//! otherwise honoured between characters. A character's key events are
//! always emitted as a complete group (shift down, key down, key up, shift
//! up), so the worst-case stop latency is one character's emission time.

use crate::error::TyperError;
use crate::events::{KeyCode, KeyPayload, KeyState, Modifiers, SynthesizedKeyEvent};
use crate::mappings::{KeyCodeTable, KeyMapping};
use crate::services::emitter::KeyEmitter;
use crate::services::input_source::InputSourceGuard;
use crate::services::session_handle::SessionLease;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

/// Gaps between synthesized events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingDelays {
    pub start: Duration,
    pub layout_settle: Duration,
    pub shift_settle: Duration,
    pub key_hold: Duration,
    pub key_release: Duration,
    pub shift_release: Duration,
    pub inter_char: Duration,
    pub unicode_hold: Duration,
    pub unicode_settle: Duration,
}

/// How a single character was (or was not) emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharPath {
    KeyCode { shifted: bool },
    Unicode,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    Cancelled,
    /// The event sink failed mid-session; no retry
    Aborted(String),
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionOutcome::Completed => write!(f, "completed"),
            SessionOutcome::Cancelled => write!(f, "cancelled"),
            SessionOutcome::Aborted(reason) => write!(f, "aborted: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    /// Characters fully emitted (key code or Unicode)
    pub chars_emitted: usize,
    pub keycode_chars: usize,
    pub unicode_chars: usize,
    pub skipped_chars: usize,
    pub total_chars: usize,
    pub elapsed: Duration,
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} after {}/{} chars ({} key code, {} unicode, {} skipped) in {} ms",
            self.outcome,
            self.chars_emitted,
            self.total_chars,
            self.keycode_chars,
            self.unicode_chars,
            self.skipped_chars,
            self.elapsed.as_millis()
        )
    }
}

/// One step of a character's emission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Post {
        payload: KeyPayload,
        state: KeyState,
        modifiers: Modifiers,
    },
    Wait(Duration),
}

impl Step {
    fn key(code: KeyCode, state: KeyState, modifiers: Modifiers) -> Self {
        Step::Post {
            payload: KeyPayload::Key(code),
            state,
            modifiers,
        }
    }

    fn unicode(ch: char, state: KeyState) -> Self {
        Step::Post {
            payload: KeyPayload::Unicode(ch),
            state,
            modifiers: Modifiers::NONE,
        }
    }
}

pub type Plan = SmallVec<[Step; 10]>;

/// Everything a session needs besides its text
#[derive(Clone)]
pub struct SessionContext {
    pub emitter: Arc<dyn KeyEmitter>,
    pub layout: Arc<InputSourceGuard>,
    pub delays: TypingDelays,
    pub shift_key: KeyCode,
    pub force_unicode_without_latin: bool,
}

/// Decide the events and waits for one character.
///
/// `force_unicode` routes everything except line breaks through the
/// raw-Unicode path without looking at the key-code table.
pub fn plan_char(
    ch: char,
    force_unicode: bool,
    unicode_available: bool,
    shift_key: KeyCode,
    delays: &TypingDelays,
) -> (CharPath, Plan) {
    let mut plan = Plan::new();

    let mapping = if KeyCodeTable::is_commit(ch) {
        Some(KeyMapping {
            key_code: KeyCodeTable::commit_key(),
            needs_shift: false,
        })
    } else if force_unicode {
        None
    } else {
        KeyCodeTable::resolve(ch)
    };

    let path = match mapping {
        Some(mapping) if mapping.needs_shift => {
            plan.push(Step::key(shift_key, KeyState::Pressed, Modifiers::NONE));
            plan.push(Step::Wait(delays.shift_settle));
            plan.push(Step::key(mapping.key_code, KeyState::Pressed, Modifiers::SHIFT));
            plan.push(Step::Wait(delays.key_hold));
            plan.push(Step::key(mapping.key_code, KeyState::Released, Modifiers::NONE));
            plan.push(Step::Wait(delays.key_release));
            plan.push(Step::key(shift_key, KeyState::Released, Modifiers::NONE));
            plan.push(Step::Wait(delays.shift_release));
            plan.push(Step::Wait(delays.inter_char));
            CharPath::KeyCode { shifted: true }
        }
        Some(mapping) => {
            plan.push(Step::key(mapping.key_code, KeyState::Pressed, Modifiers::NONE));
            plan.push(Step::Wait(delays.key_hold));
            plan.push(Step::key(mapping.key_code, KeyState::Released, Modifiers::NONE));
            plan.push(Step::Wait(delays.key_release));
            plan.push(Step::Wait(delays.inter_char));
            CharPath::KeyCode { shifted: false }
        }
        None if unicode_available => {
            plan.push(Step::unicode(ch, KeyState::Pressed));
            plan.push(Step::Wait(delays.unicode_hold));
            plan.push(Step::unicode(ch, KeyState::Released));
            plan.push(Step::Wait(delays.unicode_settle));
            CharPath::Unicode
        }
        None => CharPath::Skipped,
    };

    (path, plan)
}

pub struct TypingSession {
    text: Vec<char>,
    cursor: usize,
    lease: SessionLease,
    context: SessionContext,
    keycode_chars: usize,
    unicode_chars: usize,
    skipped_chars: usize,
}

impl TypingSession {
    /// `\r\n` pairs are folded into one line break.
    pub fn new(text: &str, lease: SessionLease, context: SessionContext) -> Self {
        let text: Vec<char> = text.replace("\r\n", "\n").chars().collect();
        Self {
            text,
            cursor: 0,
            lease,
            context,
            keycode_chars: 0,
            unicode_chars: 0,
            skipped_chars: 0,
        }
    }

    pub fn char_count(&self) -> usize {
        self.text.len()
    }

    pub async fn run(mut self) -> SessionReport {
        let started = Instant::now();
        let total = self.text.len();
        info!("Typing session started ({} chars)", total);

        // Stopped during the countdown: the layout is never touched
        let outcome = if self.pause(self.context.delays.start).await {
            self.type_with_layout().await
        } else {
            info!("Stop requested before typing began");
            SessionOutcome::Cancelled
        };

        let report = SessionReport {
            outcome,
            chars_emitted: self.keycode_chars + self.unicode_chars,
            keycode_chars: self.keycode_chars,
            unicode_chars: self.unicode_chars,
            skipped_chars: self.skipped_chars,
            total_chars: total,
            elapsed: started.elapsed(),
        };

        match &report.outcome {
            SessionOutcome::Aborted(_) => error!("Typing session {}", report),
            _ => info!("Typing session {}", report),
        }
        report
        // `self.lease` drops here: the handle goes idle
    }

    async fn type_with_layout(&mut self) -> SessionOutcome {
        let layout = Arc::clone(&self.context.layout);
        let layout_lease = layout.engage().await;
        let force_unicode =
            !layout_lease.latin_active() && self.context.force_unicode_without_latin;
        if force_unicode {
            warn!("No Latin keyboard layout active, typing through Unicode injection");
        } else if layout_lease.switched() {
            debug!("Waiting {:?} for the layout switch to settle", self.context.delays.layout_settle);
        }

        let outcome = if self.pause(self.context.delays.layout_settle).await {
            self.emit_all(force_unicode).await
        } else {
            info!("Stop requested while the layout settled");
            SessionOutcome::Cancelled
        };

        layout.release(layout_lease).await;
        outcome
    }

    /// Sleep for `delay` unless a stop arrives first; `false` when stopped
    async fn pause(&self, delay: Duration) -> bool {
        if self.lease.stop_requested() {
            return false;
        }
        if delay.is_zero() {
            return true;
        }
        tokio::select! {
            _ = sleep(delay) => !self.lease.stop_requested(),
            _ = self.lease.stopped() => false,
        }
    }

    async fn emit_all(&mut self, force_unicode: bool) -> SessionOutcome {
        let unicode_available = self.context.emitter.supports_unicode();

        loop {
            if self.lease.stop_requested() {
                info!("Stop requested, cancelling at char {}", self.cursor);
                return SessionOutcome::Cancelled;
            }

            let Some(&ch) = self.text.get(self.cursor) else {
                return SessionOutcome::Completed;
            };

            let (path, plan) = plan_char(
                ch,
                force_unicode,
                unicode_available,
                self.context.shift_key,
                &self.context.delays,
            );

            if let Err(e) = self.execute(&plan).await {
                if e.is_event_source_failure() {
                    error!("System refused synthetic input at {:?}: {}", ch, e);
                } else {
                    error!("Emitting {:?} failed: {}", ch, e);
                }
                if let Err(release_err) = self.context.emitter.release_all() {
                    warn!("Could not release held keys: {}", release_err);
                }
                return SessionOutcome::Aborted(e.to_string());
            }

            match path {
                CharPath::KeyCode { .. } => self.keycode_chars += 1,
                CharPath::Unicode => self.unicode_chars += 1,
                CharPath::Skipped => {
                    warn!("Unsupported character {:?} (U+{:04X}) skipped", ch, u32::from(ch));
                    self.skipped_chars += 1;
                }
            }
            crate::trace_if_enabled!("{:?} via {:?}", ch, path);

            self.cursor += 1;
        }
    }

    async fn execute(&self, plan: &Plan) -> Result<(), TyperError> {
        for step in plan {
            match *step {
                Step::Post {
                    payload,
                    state,
                    modifiers,
                } => {
                    let event = SynthesizedKeyEvent::new(payload, state, modifiers);
                    self.context.emitter.post(&event)?;
                }
                Step::Wait(delay) => {
                    if !delay.is_zero() {
                        sleep(delay).await;
                    }
                }
            }
        }
        debug!("char group of {} steps emitted", plan.len());
        Ok(())
    }
}
