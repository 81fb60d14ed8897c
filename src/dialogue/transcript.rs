//! Transcript. The ordered message history shown in the widget.

use serde::Serialize;
use uuid::Uuid;

use super::model::{DeliveryStatus, Message, Sender};

/// Append-only message history. Delivery status is the only field that
/// changes after append, and it is updated by message id.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its id.
    pub fn push(&mut self, message: Message) -> Uuid {
        let id = message.id;
        self.messages.push(message);
        id
    }

    /// Update the delivery status of the message with `id`.
    /// Returns false if no such message exists.
    pub fn set_status(&mut self, id: Uuid, status: DeliveryStatus) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.status = status;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Messages appended at or after position `index`.
    pub fn since(&self, index: usize) -> &[Message] {
        self.messages.get(index..).unwrap_or(&[])
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Messages from one sender, in order.
    pub fn from_sender(&self, sender: Sender) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(move |m| m.sender == sender)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.messages.clear();
    }
}
