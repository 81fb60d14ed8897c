//! Terminal host. Renders the widget on stdout and reads visitor input
//! from stdin.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use futures::stream;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::{DialogueHost, WidgetUpdate};
use crate::dialogue::{DeliveryStatus, HostEffect, InputMode, Message, Sender};
use crate::error::HostError;

/// Stream of raw input lines.
pub type InputStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Renders the chat widget as plain text.
pub struct CliHost {
    assistant_name: String,
}

impl CliHost {
    pub fn new(assistant_name: impl Into<String>) -> Self {
        Self {
            assistant_name: assistant_name.into(),
        }
    }

    fn format_message(&self, message: &Message) -> String {
        let time = message.timestamp.format("%-I:%M %p");
        let line = match message.sender {
            Sender::Subject => format!("[{time}] {}: {}", self.assistant_name, message.text),
            Sender::Visitor => format!("[{time}] You: {}", message.text),
        };
        if message.status == DeliveryStatus::Failed {
            format!("{line}  (failed to send)")
        } else {
            line
        }
    }

    /// Text for one widget update.
    pub fn format_update(&self, update: &WidgetUpdate) -> String {
        let mut lines: Vec<String> = update
            .messages
            .iter()
            .map(|m| self.format_message(m))
            .collect();

        if let Some(attachment) = &update.attachment {
            let alt = attachment.alt.as_deref().unwrap_or("image");
            lines.push(format!("  [{alt}: {}]", attachment.src));
        }

        match update.input_mode {
            InputMode::Choices => {
                for (i, choice) in update.choices.iter().enumerate() {
                    lines.push(format!("  {}. {}", i + 1, choice.label));
                }
                lines.push("Pick a number:".to_string());
            }
            InputMode::FreeText => lines.push("Type your message:".to_string()),
            InputMode::None => {}
        }
        lines.join("\n")
    }

    /// Text for one host effect.
    pub fn format_effect(effect: &HostEffect) -> String {
        match effect {
            HostEffect::ScrollTo { anchor } => format!("↪ Scrolling to #{anchor}"),
            HostEffect::Navigate { route } => format!("↪ Navigating to {route}"),
            HostEffect::Close => "(chat closed, type /open to reopen)".to_string(),
            HostEffect::OpenUrl { url } => format!("↗ Open {url}"),
            HostEffect::Notify { text } => format!("★ {text}"),
        }
    }

    async fn write_line(text: &str) -> Result<(), HostError> {
        let mut out = tokio::io::stdout();
        out.write_all(text.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl DialogueHost for CliHost {
    fn name(&self) -> &str {
        "cli"
    }

    async fn render(&self, update: &WidgetUpdate) -> Result<(), HostError> {
        let text = self.format_update(update);
        if text.is_empty() {
            return Ok(());
        }
        Self::write_line(&text).await
    }

    async fn apply(&self, effect: &HostEffect) -> Result<(), HostError> {
        Self::write_line(&Self::format_effect(effect)).await
    }
}

/// Read stdin lines on a background task.
pub fn spawn_stdin_reader() -> InputStream {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    tokio::spawn(async move {
        let stdin = tokio::io::stdin();
        let reader = BufReader::new(stdin);
        let mut lines = reader.lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => break, // EOF
                Err(e) => {
                    tracing::error!("Error reading stdin: {}", e);
                    break;
                }
            }
        }
    });

    Box::pin(stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|line| (line, rx))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::{Attachment, Choice, StepId};
    use chrono::{TimeZone, Utc};

    fn update(messages: Vec<Message>, input_mode: InputMode) -> WidgetUpdate {
        WidgetUpdate {
            messages,
            step: StepId::from("s"),
            attachment: None,
            choices: vec![Choice::new("Story Mode", "story-mode")],
            input_mode,
        }
    }

    #[test]
    fn formats_messages_with_time_and_sender() {
        let at = Utc.with_ymd_and_hms(2024, 4, 2, 15, 4, 0).unwrap();
        let host = CliHost::new("DenisBot");
        let text = host.format_update(&update(
            vec![
                Message::subject("Hello there! 👋", at),
                Message::visitor("Alice", DeliveryStatus::Failed, at),
            ],
            InputMode::None,
        ));
        assert_eq!(
            text,
            "[3:04 PM] DenisBot: Hello there! 👋\n[3:04 PM] You: Alice  (failed to send)"
        );
    }

    #[test]
    fn numbers_choices_from_one() {
        let host = CliHost::new("DenisBot");
        let text = host.format_update(&update(vec![], InputMode::Choices));
        assert!(text.contains("  1. Story Mode"));
    }

    #[test]
    fn shows_attachment() {
        let host = CliHost::new("DenisBot");
        let mut u = update(vec![], InputMode::None);
        u.attachment = Some(Attachment::new("/RomanticLaugh.gif"));
        assert_eq!(host.format_update(&u), "  [image: /RomanticLaugh.gif]");
    }

    #[test]
    fn formats_effects() {
        assert_eq!(
            CliHost::format_effect(&HostEffect::ScrollTo {
                anchor: "projects-section".into()
            }),
            "↪ Scrolling to #projects-section"
        );
        assert_eq!(
            CliHost::format_effect(&HostEffect::Notify {
                text: "Welcome, Alice!".into()
            }),
            "★ Welcome, Alice!"
        );
    }
}
