//! Host shell abstraction. Whatever displays the widget and owns the page.

pub mod cli;

use async_trait::async_trait;
use serde::Serialize;

use crate::dialogue::{Attachment, Choice, HostEffect, InputMode, Interpreter, Message, StepId};
use crate::error::HostError;

pub use cli::{CliHost, InputStream, spawn_stdin_reader};

/// Everything a host needs to redraw the widget after a change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetUpdate {
    /// Messages appended since the previous update.
    pub messages: Vec<Message>,
    pub step: StepId,
    pub attachment: Option<Attachment>,
    pub choices: Vec<Choice>,
    pub input_mode: InputMode,
}

impl WidgetUpdate {
    /// Snapshot the interpreter, including messages from `since` onwards.
    pub fn capture(interpreter: &Interpreter, since: usize) -> Self {
        Self {
            messages: interpreter.transcript().since(since).to_vec(),
            step: interpreter.current_step().clone(),
            attachment: interpreter.attachment().cloned(),
            choices: interpreter.choices().to_vec(),
            input_mode: interpreter.input_mode(),
        }
    }
}

/// The surrounding page: renders the widget and carries out page-level
/// effects. Effects are fire-and-forget; the dialogue never waits on them
/// beyond the call itself.
#[async_trait]
pub trait DialogueHost: Send + Sync {
    /// Host name, for logging.
    fn name(&self) -> &str;

    /// Redraw the widget.
    async fn render(&self, update: &WidgetUpdate) -> Result<(), HostError>;

    /// Carry out a page-level effect.
    async fn apply(&self, effect: &HostEffect) -> Result<(), HostError>;
}
