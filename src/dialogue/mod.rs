//! Dialogue engine. The scripted chat assistant behind the portfolio widget.
//!
//! A static [`StepGraph`] describes what the assistant says and which moves
//! follow each batch of messages. An [`Interpreter`] walks that graph for one
//! widget instance, keeping the transcript and the current input affordance.

pub mod graph;
pub mod interpreter;
pub mod model;
pub mod navigation;
pub mod script;
pub mod timeline;
pub mod transcript;

pub use graph::{GraphIssue, StepGraph};
pub use interpreter::{Interpreter, Transition};
pub use model::{
    Attachment, Choice, DeliveryStatus, FreeTextHandler, InputMode, KeywordRoute, Message,
    Sender, Step, StepId,
};
pub use navigation::{HostEffect, NavigationShortcut};
pub use timeline::{Clock, DeferredAction, Delays, FixedClock, SystemClock, Timeline};
pub use transcript::Transcript;
