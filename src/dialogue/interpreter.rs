//! Dialogue interpreter. Walks the step graph for one widget instance.
//!
//! The interpreter owns the transcript and the current input affordance.
//! Visitor actions are applied immediately; the target step's messages are
//! deferred on the [`Timeline`] and land when the driver advances it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::graph::StepGraph;
use super::model::{
    Attachment, Choice, DeliveryStatus, FreeTextHandler, InputMode, Message, StepId,
};
use super::navigation::HostEffect;
use super::timeline::{Clock, DeferredAction, Delays, SystemClock, Timeline};
use super::transcript::Transcript;
use crate::error::DialogueError;

/// Placeholder in scripted text replaced by the visitor's name.
const NAME_PLACEHOLDER: &str = "{name}";
/// Used for the placeholder before the visitor has introduced themselves.
const ANONYMOUS_NAME: &str = "friend";

/// Outcome of a visitor action that was not a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Moved to `target`; its messages arrive after the reveal delay.
    Advanced { target: StepId },
    /// Free text was echoed but not accepted; the same step asks again.
    Reprompt,
    /// Resolving the transition faulted; the echoed message is marked failed.
    Failed { message_id: Uuid },
}

/// Finite-state dialogue interpreter.
pub struct Interpreter {
    graph: Arc<StepGraph>,
    clock: Arc<dyn Clock>,
    current: StepId,
    transcript: Transcript,
    input_mode: InputMode,
    attachment: Option<Attachment>,
    visitor_name: Option<String>,
    timeline: Timeline,
    is_open: bool,
    /// Reveals cancelled by `close`, replayed on the next `open`.
    interrupted: Vec<StepId>,
    last_delays: Delays,
    outbox: Vec<HostEffect>,
}

impl Interpreter {
    pub fn new(graph: Arc<StepGraph>) -> Self {
        Self::with_clock(graph, Arc::new(SystemClock))
    }

    pub fn with_clock(graph: Arc<StepGraph>, clock: Arc<dyn Clock>) -> Self {
        let current = graph.entry().clone();
        Self {
            graph,
            clock,
            current,
            transcript: Transcript::new(),
            input_mode: InputMode::None,
            attachment: None,
            visitor_name: None,
            timeline: Timeline::new(),
            is_open: false,
            interrupted: Vec::new(),
            last_delays: Delays::default(),
            outbox: Vec::new(),
        }
    }

    /// Open the widget.
    ///
    /// The entry step is loaded only when the transcript is empty, so
    /// reopening a populated widget never repeats the greeting. Returns true
    /// if the entry step was loaded.
    pub fn open(&mut self) -> bool {
        self.is_open = true;

        if !self.transcript.is_empty() {
            let reveal = self.last_delays.reveal;
            for step in std::mem::take(&mut self.interrupted) {
                debug!(step = %step, "Resuming interrupted reveal");
                self.timeline.schedule(reveal, DeferredAction::Reveal(step));
            }
            return false;
        }

        self.current = self.graph.entry().clone();
        match self.graph.get(&self.current) {
            Some(step) => {
                self.attachment = step.attachment.clone();
                info!(step = %self.current, "Dialogue opened");
            }
            None => warn!(step = %self.current, "Entry step missing from graph"),
        }
        self.reveal(&self.current.clone());
        true
    }

    /// Close the widget. Pending deferred work is cancelled; an interrupted
    /// reveal is replayed on the next `open`.
    pub fn close(&mut self) {
        if !self.is_open {
            return;
        }
        self.is_open = false;
        for action in self.timeline.cancel_all() {
            match action {
                DeferredAction::Reveal(step) => self.interrupted.push(step),
                DeferredAction::Navigate(shortcut) => {
                    debug!(?shortcut, "Dropping navigation cancelled by close");
                }
            }
        }
        debug!(step = %self.current, "Dialogue closed");
    }

    /// Throw away the conversation and start again from the entry step.
    pub fn reset(&mut self) {
        self.timeline.cancel_all();
        self.interrupted.clear();
        self.outbox.clear();
        self.transcript.clear();
        self.attachment = None;
        self.visitor_name = None;
        self.input_mode = InputMode::None;
        self.current = self.graph.entry().clone();
        info!("Dialogue reset");
        if self.is_open {
            self.open();
        }
    }

    /// Follow the choice leading to `target`.
    pub fn select_choice(
        &mut self,
        target: &StepId,
        delays: Delays,
    ) -> Result<Transition, DialogueError> {
        self.ensure_input(InputMode::Choices)?;
        let step = self
            .graph
            .get(&self.current)
            .ok_or_else(|| DialogueError::MissingStep(self.current.clone()))?;
        let choice = step
            .choice_for(target)
            .cloned()
            .ok_or_else(|| DialogueError::NotOffered {
                current: self.current.clone(),
                target: target.clone(),
            })?;
        self.follow(choice, delays)
    }

    /// Follow the choice at `index` (0-based) among the offered choices.
    pub fn select_choice_at(
        &mut self,
        index: usize,
        delays: Delays,
    ) -> Result<Transition, DialogueError> {
        self.ensure_input(InputMode::Choices)?;
        let choice = self
            .choices()
            .get(index)
            .cloned()
            .ok_or(DialogueError::NoSuchChoice { index })?;
        self.follow(choice, delays)
    }

    /// Echo the picked label and enter its target.
    fn follow(&mut self, choice: Choice, delays: Delays) -> Result<Transition, DialogueError> {
        if !self.graph.contains(&choice.target) {
            return Err(DialogueError::MissingStep(choice.target));
        }
        let now = self.clock.now();
        self.transcript
            .push(Message::visitor(choice.label, DeliveryStatus::Delivered, now));
        self.enter(choice.target.clone(), delays);
        Ok(Transition::Advanced {
            target: choice.target,
        })
    }

    /// Submit typed text on a free-text step.
    pub fn submit_free_text(
        &mut self,
        text: &str,
        delays: Delays,
    ) -> Result<Transition, DialogueError> {
        self.ensure_input(InputMode::FreeText)?;
        let step = self
            .graph
            .get(&self.current)
            .ok_or_else(|| DialogueError::MissingStep(self.current.clone()))?;
        let handler = step.on_free_text.clone();

        let blank = text.trim().is_empty();
        if blank && !handler.as_ref().is_some_and(FreeTextHandler::accepts_blank) {
            return Err(DialogueError::EmptyInput(self.current.clone()));
        }

        let now = self.clock.now();
        let message_id = self
            .transcript
            .push(Message::visitor(text, DeliveryStatus::Sending, now));

        let Some(handler) = handler else {
            warn!(step = %self.current, "Free-text step has no handler");
            self.transcript.set_status(message_id, DeliveryStatus::Failed);
            return Ok(Transition::Failed { message_id });
        };

        match handler.resolve(text) {
            None => {
                self.transcript
                    .set_status(message_id, DeliveryStatus::Delivered);
                debug!(step = %self.current, "Free text not accepted, re-prompting");
                Ok(Transition::Reprompt)
            }
            Some(target) if !self.graph.contains(&target) => {
                warn!(
                    step = %self.current,
                    target = %target,
                    "Free-text handler resolved to a missing step"
                );
                self.transcript.set_status(message_id, DeliveryStatus::Failed);
                Ok(Transition::Failed { message_id })
            }
            Some(target) => {
                self.transcript
                    .set_status(message_id, DeliveryStatus::Delivered);
                if matches!(handler, FreeTextHandler::CaptureName { .. }) {
                    let name = text.trim().to_string();
                    self.outbox.push(HostEffect::Notify {
                        text: format!("Welcome, {name}!"),
                    });
                    self.visitor_name = Some(name);
                }
                self.enter(target.clone(), delays);
                Ok(Transition::Advanced { target })
            }
        }
    }

    /// Advance the timeline to `elapsed` (time since the interpreter was
    /// created) and apply deferred work. Returns host effects produced since
    /// the last call.
    pub fn advance_to(&mut self, elapsed: Duration) -> Vec<HostEffect> {
        for action in self.timeline.advance_to(elapsed) {
            match action {
                DeferredAction::Reveal(step) => self.reveal(&step),
                DeferredAction::Navigate(shortcut) => {
                    info!(step = %self.current, ?shortcut, "Navigation shortcut fired");
                    self.outbox.extend(shortcut.effects());
                }
            }
        }
        self.take_effects()
    }

    /// Advance the timeline by `delta`.
    pub fn advance_by(&mut self, delta: Duration) -> Vec<HostEffect> {
        let at = self.timeline.now() + delta;
        self.advance_to(at)
    }

    /// Host effects queued by visitor actions that have not been collected.
    pub fn take_effects(&mut self) -> Vec<HostEffect> {
        std::mem::take(&mut self.outbox)
    }

    /// When the next deferred action falls due, on the interpreter timeline.
    pub fn next_due(&self) -> Option<Duration> {
        self.timeline.next_due()
    }

    pub fn current_step(&self) -> &StepId {
        &self.current
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    /// Choices currently offered. Empty unless the input mode is `Choices`.
    pub fn choices(&self) -> &[Choice] {
        if self.input_mode != InputMode::Choices {
            return &[];
        }
        self.graph
            .get(&self.current)
            .map(|s| s.choices.as_slice())
            .unwrap_or(&[])
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub fn visitor_name(&self) -> Option<&str> {
        self.visitor_name.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Whether a transition is waiting for its reveal.
    pub fn is_busy(&self) -> bool {
        !self.timeline.is_idle()
    }

    fn ensure_input(&self, expected: InputMode) -> Result<(), DialogueError> {
        if !self.is_open {
            return Err(DialogueError::Closed);
        }
        if self.input_mode != expected {
            return Err(DialogueError::InputUnavailable {
                mode: self.input_mode,
            });
        }
        Ok(())
    }

    /// Move to `target` and schedule its reveal. Affordances stay hidden
    /// until the reveal lands.
    fn enter(&mut self, target: StepId, delays: Delays) {
        info!(from = %self.current, to = %target, "Dialogue transition");
        self.current = target;
        self.input_mode = InputMode::None;
        self.last_delays = delays;

        let step = self.graph.get(&self.current);
        self.attachment = step.and_then(|s| s.attachment.clone());
        let navigate = step.and_then(|s| s.navigate.clone());

        self.timeline
            .schedule(delays.reveal, DeferredAction::Reveal(self.current.clone()));
        if let Some(shortcut) = navigate {
            self.timeline
                .schedule(delays.navigation, DeferredAction::Navigate(shortcut));
        }
    }

    /// Append a step's scripted messages and recompute the input mode.
    fn reveal(&mut self, id: &StepId) {
        let Some(step) = self.graph.get(id) else {
            self.input_mode = InputMode::None;
            return;
        };
        let name = self.visitor_name.as_deref().unwrap_or(ANONYMOUS_NAME);
        let now = self.clock.now();
        for text in &step.messages {
            let text = text.replace(NAME_PLACEHOLDER, name);
            self.transcript.push(Message::subject(text, now));
        }
        self.input_mode = step.input_mode();
        debug!(step = %id, mode = %self.input_mode, "Step revealed");
    }
}
