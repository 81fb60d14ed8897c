//! Chat session. Drives one interpreter against a host in real time.
//!
//! The session turns input lines into interpreter operations, sleeps until
//! the interpreter's next deferred action falls due, and forwards rendered
//! updates and page effects to the host.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::contact::{BUBBLE_DELAY, BUBBLE_TEXT, ContactButton, WhatsAppLink};
use crate::dialogue::{
    Attachment, Delays, HostEffect, InputMode, Interpreter, StepId, Transition,
};
use crate::error::{DialogueError, HostError};
use crate::host::{DialogueHost, WidgetUpdate};

/// Slash commands understood in every input mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Open,
    Close,
    Reset,
    WhatsApp,
    Quit,
}

impl Command {
    /// Parse a slash command. Anything else is visitor input.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "/open" => Some(Self::Open),
            "/close" => Some(Self::Close),
            "/reset" | "/restart" => Some(Self::Reset),
            "/whatsapp" | "/contact" => Some(Self::WhatsApp),
            "/quit" | "/exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Whether the session keeps running after an input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// What the host last saw, to skip redundant redraws.
#[derive(Debug, Clone, PartialEq)]
struct RenderedState {
    step: StepId,
    input_mode: InputMode,
    attachment: Option<Attachment>,
}

/// One visitor's chat widget, bound to a host.
pub struct ChatSession<H: DialogueHost> {
    interpreter: Interpreter,
    host: Arc<H>,
    delays: Delays,
    whatsapp: WhatsAppLink,
    started: Instant,
    rendered_len: usize,
    rendered: Option<RenderedState>,
    /// Contact bubble not yet shown.
    bubble_pending: bool,
}

impl<H: DialogueHost> ChatSession<H> {
    pub fn new(interpreter: Interpreter, host: Arc<H>, delays: Delays) -> Self {
        Self {
            interpreter,
            host,
            delays,
            whatsapp: WhatsAppLink::default(),
            started: Instant::now(),
            rendered_len: 0,
            rendered: None,
            bubble_pending: false,
        }
    }

    pub fn with_whatsapp(mut self, link: WhatsAppLink) -> Self {
        self.whatsapp = link;
        self
    }

    /// Announce the direct-contact link once, shortly after the session starts.
    pub fn with_contact_bubble(mut self) -> Self {
        self.bubble_pending = true;
        self
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Open the widget and process input until it ends or `/quit`.
    ///
    /// Returns the interpreter so callers can inspect the final transcript.
    pub async fn run<S>(mut self, mut input: S) -> Result<Interpreter, HostError>
    where
        S: Stream<Item = String> + Unpin,
    {
        info!(host = self.host.name(), "Chat session started");
        self.interpreter.open();
        self.sync().await?;

        loop {
            let due = self.interpreter.next_due().map(|due| self.started + due);
            let bubble = self.bubble_pending.then(|| self.started + BUBBLE_DELAY);
            let deadline = match (due, bubble) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
            tokio::select! {
                line = input.next() => {
                    let Some(line) = line else {
                        debug!("Input ended");
                        break;
                    };
                    // Delays count from when the input arrived.
                    self.sync().await?;
                    if self.handle_line(&line).await? == Flow::Quit {
                        break;
                    }
                }
                _ = wait_until(deadline) => {}
            }
            self.sync().await?;
        }

        // Unmount: anything still pending is discarded with the timeline.
        self.interpreter.close();
        info!(
            messages = self.interpreter.transcript().len(),
            "Chat session ended"
        );
        Ok(self.interpreter)
    }

    /// Apply one line of input.
    pub async fn handle_line(&mut self, line: &str) -> Result<Flow, HostError> {
        if let Some(command) = Command::parse(line) {
            return self.handle_command(command).await;
        }

        let result = match self.interpreter.input_mode() {
            InputMode::Choices => self.select(line.trim()),
            InputMode::FreeText => self.interpreter.submit_free_text(line, self.delays),
            mode => Err(if self.interpreter.is_open() {
                DialogueError::InputUnavailable { mode }
            } else {
                DialogueError::Closed
            }),
        };
        match result {
            Ok(transition) => debug!(?transition, "Visitor input applied"),
            Err(e) => debug!(error = %e, "Visitor input ignored"),
        }

        let effects = self.interpreter.take_effects();
        self.apply_effects(effects).await?;
        Ok(Flow::Continue)
    }

    async fn handle_command(&mut self, command: Command) -> Result<Flow, HostError> {
        debug!(?command, "Session command");
        match command {
            Command::Open => {
                self.interpreter.open();
            }
            Command::Close => {
                self.interpreter.close();
                self.host.apply(&HostEffect::Close).await?;
            }
            Command::Reset => {
                self.interpreter.reset();
                self.rendered_len = 0;
                self.rendered = None;
            }
            Command::WhatsApp => {
                let effect = HostEffect::OpenUrl {
                    url: self.whatsapp.url(),
                };
                self.host.apply(&effect).await?;
            }
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Pick a choice by 1-based number or by label.
    fn select(&mut self, input: &str) -> Result<Transition, DialogueError> {
        if let Ok(n) = input.parse::<usize>() {
            if n >= 1 {
                return self.interpreter.select_choice_at(n - 1, self.delays);
            }
        }
        let index = self
            .interpreter
            .choices()
            .iter()
            .position(|c| c.label.eq_ignore_ascii_case(input))
            .ok_or_else(|| DialogueError::UnknownLabel {
                label: input.to_string(),
            })?;
        self.interpreter.select_choice_at(index, self.delays)
    }

    /// Fire due deferred work and bring the host up to date.
    async fn sync(&mut self) -> Result<(), HostError> {
        let elapsed = self.started.elapsed();
        let effects = self.interpreter.advance_to(elapsed);
        self.apply_effects(effects).await?;
        if self.bubble_pending && ContactButton::bubble_visible(elapsed) {
            self.bubble_pending = false;
            let bubble = HostEffect::Notify {
                text: BUBBLE_TEXT.to_string(),
            };
            self.host.apply(&bubble).await?;
        }
        self.flush().await
    }

    async fn apply_effects(&mut self, effects: Vec<HostEffect>) -> Result<(), HostError> {
        for effect in effects {
            info!(%effect, "Host effect");
            if effect == HostEffect::Close {
                self.interpreter.close();
            }
            self.host.apply(&effect).await?;
        }
        Ok(())
    }

    /// Render if anything visible changed since the last render.
    async fn flush(&mut self) -> Result<(), HostError> {
        if !self.interpreter.is_open() {
            return Ok(());
        }
        let state = RenderedState {
            step: self.interpreter.current_step().clone(),
            input_mode: self.interpreter.input_mode(),
            attachment: self.interpreter.attachment().cloned(),
        };
        let has_new = self.interpreter.transcript().len() > self.rendered_len;
        if !has_new && self.rendered.as_ref() == Some(&state) {
            return Ok(());
        }

        let update = WidgetUpdate::capture(&self.interpreter, self.rendered_len);
        self.host.render(&update).await?;
        self.rendered_len = self.interpreter.transcript().len();
        self.rendered = Some(state);
        Ok(())
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}
