//! Dialogue data model. Step graph nodes, transcript messages, statuses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::navigation::NavigationShortcut;

/// Opaque identifier of a step in the dialogue graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StepId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for StepId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Who authored a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// The portfolio owner's scripted assistant.
    Subject,
    /// The person browsing the site.
    Visitor,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Subject => write!(f, "subject"),
            Self::Visitor => write!(f, "visitor"),
        }
    }
}

/// Delivery status shown next to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sending,
    Sent,
    Delivered,
    Seen,
    Failed,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Seen => "seen",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// A message in the transcript.
///
/// Everything except `status` is fixed once the message is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Stable identity, assigned at append time.
    pub id: Uuid,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub status: DeliveryStatus,
}

impl Message {
    pub fn new(
        text: impl Into<String>,
        sender: Sender,
        status: DeliveryStatus,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            sender,
            timestamp,
            status,
        }
    }

    /// A scripted message from the assistant. These are always `Seen`.
    pub fn subject(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(text, Sender::Subject, DeliveryStatus::Seen, timestamp)
    }

    /// A message typed or clicked by the visitor.
    pub fn visitor(
        text: impl Into<String>,
        status: DeliveryStatus,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(text, Sender::Visitor, status, timestamp)
    }
}

/// A labelled, selectable transition out of a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    pub target: StepId,
}

impl Choice {
    pub fn new(label: impl Into<String>, target: impl Into<StepId>) -> Self {
        Self {
            label: label.into(),
            target: target.into(),
        }
    }
}

/// Media shown alongside a step (an animated image on the site).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl Attachment {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt: None,
        }
    }
}

/// A keyword that routes free text to a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRoute {
    pub keyword: String,
    pub target: StepId,
}

/// What a free-text step does with the visitor's input.
///
/// A closed set of policies selected by tag, so graphs stay plain data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FreeTextHandler {
    /// Any non-blank text moves on to `target`.
    AcceptNonEmpty { target: StepId },
    /// Like `AcceptNonEmpty`, and remembers the text as the visitor's name.
    CaptureName { target: StepId },
    /// Everything, blank text included, moves on to `target`.
    Forward { target: StepId },
    /// The first keyword contained in the text (case-insensitive) picks the
    /// target; otherwise `fallback`, or a re-prompt when there is none.
    Keywords {
        routes: Vec<KeywordRoute>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fallback: Option<StepId>,
    },
}

impl FreeTextHandler {
    /// Whether blank input is handed to this handler at all.
    pub fn accepts_blank(&self) -> bool {
        matches!(self, Self::Forward { .. })
    }

    /// Resolve `input` to a target step, or `None` to re-prompt.
    pub fn resolve(&self, input: &str) -> Option<StepId> {
        let trimmed = input.trim();
        match self {
            Self::AcceptNonEmpty { target } | Self::CaptureName { target } => {
                (!trimmed.is_empty()).then(|| target.clone())
            }
            Self::Forward { target } => Some(target.clone()),
            Self::Keywords { routes, fallback } => {
                let lowered = trimmed.to_lowercase();
                routes
                    .iter()
                    .find(|r| !r.keyword.is_empty() && lowered.contains(&r.keyword.to_lowercase()))
                    .map(|r| r.target.clone())
                    .or_else(|| {
                        if trimmed.is_empty() {
                            None
                        } else {
                            fallback.clone()
                        }
                    })
            }
        }
    }

    /// Every step this handler can resolve to.
    pub fn targets(&self) -> Vec<&StepId> {
        match self {
            Self::AcceptNonEmpty { target }
            | Self::CaptureName { target }
            | Self::Forward { target } => vec![target],
            Self::Keywords { routes, fallback } => routes
                .iter()
                .map(|r| &r.target)
                .chain(fallback.iter())
                .collect(),
        }
    }
}

/// One node of the dialogue graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    /// Scripted lines, revealed in order. `{name}` is replaced with the
    /// visitor's name when known.
    #[serde(default)]
    pub messages: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub requires_free_text: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_free_text: Option<FreeTextHandler>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigate: Option<NavigationShortcut>,
}

impl Step {
    pub fn new(id: impl Into<StepId>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
            choices: Vec::new(),
            requires_free_text: false,
            on_free_text: None,
            attachment: None,
            navigate: None,
        }
    }

    pub fn with_messages<I, S>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.messages = messages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_choice(mut self, label: impl Into<String>, target: impl Into<StepId>) -> Self {
        self.choices.push(Choice::new(label, target));
        self
    }

    pub fn with_free_text(mut self, handler: FreeTextHandler) -> Self {
        self.requires_free_text = true;
        self.on_free_text = Some(handler);
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn with_navigation(mut self, shortcut: NavigationShortcut) -> Self {
        self.navigate = Some(shortcut);
        self
    }

    /// The input affordance this step offers once revealed.
    pub fn input_mode(&self) -> InputMode {
        if self.requires_free_text {
            InputMode::FreeText
        } else if !self.choices.is_empty() {
            InputMode::Choices
        } else {
            InputMode::None
        }
    }

    /// A step offering neither choices nor free text.
    pub fn is_terminal(&self) -> bool {
        self.input_mode() == InputMode::None
    }

    /// Find the choice leading to `target`.
    pub fn choice_for(&self, target: &StepId) -> Option<&Choice> {
        self.choices.iter().find(|c| &c.target == target)
    }
}

/// Which input affordance the widget currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    Choices,
    FreeText,
    None,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Choices => write!(f, "choices"),
            Self::FreeText => write!(f, "free_text"),
            Self::None => write!(f, "none"),
        }
    }
}
