//! Direct contact launcher. The WhatsApp button next to the chat widget.

use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left as-is in a URI component, matching browser
/// `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const DEFAULT_PHONE: &str = "254798750585";
const DEFAULT_MESSAGE: &str = "Hi Mwaki Denis👋! I saw your amazing✨ portfolio and I'm interested in working together🤝 on a project. When would be a good time to chat?";

/// Scroll offset under which the button always shows.
const ALWAYS_VISIBLE_BELOW: f64 = 300.0;
/// How long after page load the speech bubble appears.
pub const BUBBLE_DELAY: Duration = Duration::from_secs(2);
/// Speech bubble text beside the button.
pub const BUBBLE_TEXT: &str = "Chat directly with me on WhatsApp! ✓";

/// A click-to-chat link with a pre-filled message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhatsAppLink {
    /// Phone number in international format. Non-digits are ignored.
    pub phone: String,
    pub message: String,
}

impl Default for WhatsAppLink {
    fn default() -> Self {
        Self {
            phone: DEFAULT_PHONE.to_string(),
            message: DEFAULT_MESSAGE.to_string(),
        }
    }
}

impl WhatsAppLink {
    pub fn new(phone: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            message: message.into(),
        }
    }

    /// The `wa.me` URL that opens a chat with the message pre-filled.
    pub fn url(&self) -> String {
        let digits: String = self.phone.chars().filter(char::is_ascii_digit).collect();
        format!(
            "https://wa.me/{}?text={}",
            digits,
            utf8_percent_encode(&self.message, URI_COMPONENT)
        )
    }
}

/// Visibility of the floating contact button.
///
/// Hidden while scrolling down past the fold, shown again on any upward
/// scroll. The speech bubble appears once, shortly after load. Scroll
/// tracking only applies to hosts with a scrolling page; the terminal
/// session uses the bubble timing alone.
#[derive(Debug, Clone)]
pub struct ContactButton {
    last_scroll_y: f64,
    visible: bool,
}

impl Default for ContactButton {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactButton {
    pub fn new() -> Self {
        Self {
            last_scroll_y: 0.0,
            visible: true,
        }
    }

    /// Record a scroll position and return whether the button is visible.
    pub fn on_scroll(&mut self, y: f64) -> bool {
        self.visible = y <= ALWAYS_VISIBLE_BELOW || y < self.last_scroll_y;
        self.last_scroll_y = y;
        self.visible
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether the speech bubble shows, `since_load` after the page loaded.
    pub fn bubble_visible(since_load: Duration) -> bool {
        since_load >= BUBBLE_DELAY
    }
}
