//! Session driver tests.
//!
//! Each test runs on tokio's paused clock, so reveal and navigation delays
//! elapse instantly but in order.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;

use portfolio_chat::contact::{BUBBLE_TEXT, WhatsAppLink};
use portfolio_chat::dialogue::{
    Delays, DeliveryStatus, HostEffect, InputMode, Interpreter, Sender, script,
};
use portfolio_chat::error::HostError;
use portfolio_chat::host::{DialogueHost, InputStream, WidgetUpdate};
use portfolio_chat::session::ChatSession;

/// Host that records everything it is asked to do.
#[derive(Default)]
struct RecordingHost {
    updates: Mutex<Vec<WidgetUpdate>>,
    effects: Mutex<Vec<HostEffect>>,
}

impl RecordingHost {
    fn updates(&self) -> Vec<WidgetUpdate> {
        self.updates.lock().unwrap().clone()
    }

    fn effects(&self) -> Vec<HostEffect> {
        self.effects.lock().unwrap().clone()
    }
}

#[async_trait]
impl DialogueHost for RecordingHost {
    fn name(&self) -> &str {
        "recording"
    }

    async fn render(&self, update: &WidgetUpdate) -> Result<(), HostError> {
        self.updates.lock().unwrap().push(update.clone());
        Ok(())
    }

    async fn apply(&self, effect: &HostEffect) -> Result<(), HostError> {
        self.effects.lock().unwrap().push(effect.clone());
        Ok(())
    }
}

fn lines(rx: mpsc::UnboundedReceiver<String>) -> InputStream {
    Box::pin(futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|line| (line, rx))
    }))
}

fn session(host: Arc<RecordingHost>) -> ChatSession<RecordingHost> {
    let interpreter = Interpreter::new(Arc::new(script::builtin()));
    ChatSession::new(interpreter, host, Delays::default())
}

/// Feed `input` one line at a time, `gap` apart. Input ends a little
/// later so trailing deferred work can fire.
fn scripted_input(input: &[&str], gap: Duration) -> InputStream {
    let (tx, rx) = mpsc::unbounded_channel();
    let input: Vec<String> = input.iter().map(|s| s.to_string()).collect();
    tokio::spawn(async move {
        for line in input {
            tokio::time::sleep(gap).await;
            if tx.send(line).is_err() {
                return;
            }
        }
        tokio::time::sleep(gap * 3).await;
    });
    lines(rx)
}

#[tokio::test(start_paused = true)]
async fn greeting_is_rendered_on_start() {
    let host = Arc::new(RecordingHost::default());
    let interp = session(Arc::clone(&host))
        .run(futures::stream::empty::<String>().boxed())
        .await
        .unwrap();

    let updates = host.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].messages.len(), 3);
    assert_eq!(updates[0].input_mode, InputMode::FreeText);
    assert_eq!(interp.transcript().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn name_then_story_mode_walks_the_script() {
    let host = Arc::new(RecordingHost::default());
    let input = scripted_input(&["Alice", "1"], Duration::from_secs(1));
    let interp = session(Arc::clone(&host)).run(input).await.unwrap();

    assert_eq!(interp.current_step().as_str(), "story-mode");
    assert_eq!(interp.visitor_name(), Some("Alice"));

    let visitor: Vec<_> = interp
        .transcript()
        .from_sender(Sender::Visitor)
        .map(|m| (m.text.as_str(), m.status))
        .collect();
    assert_eq!(
        visitor,
        vec![
            ("Alice", DeliveryStatus::Delivered),
            ("Story Mode", DeliveryStatus::Delivered),
        ]
    );

    assert_eq!(
        host.effects(),
        vec![HostEffect::Notify {
            text: "Welcome, Alice!".into()
        }]
    );

    let last = host.updates().pop().unwrap();
    assert_eq!(last.input_mode, InputMode::Choices);
    assert_eq!(last.choices.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn choices_can_be_picked_by_label() {
    let host = Arc::new(RecordingHost::default());
    let input = scripted_input(&["Alice", "website pricing"], Duration::from_secs(1));
    let interp = session(host).run(input).await.unwrap();
    assert_eq!(interp.current_step().as_str(), "pricing-mode");
}

#[tokio::test(start_paused = true)]
async fn input_during_reveal_is_ignored() {
    let host = Arc::new(RecordingHost::default());
    // The second line arrives before the first transition's reveal lands.
    let input = scripted_input(&["Alice", "2"], Duration::from_millis(100));
    let interp = session(host).run(input).await.unwrap();

    assert_eq!(interp.current_step().as_str(), "profile-created");
    assert_eq!(interp.transcript().from_sender(Sender::Visitor).count(), 1);
}

#[tokio::test(start_paused = true)]
async fn projects_shortcut_reaches_host_and_closes_widget() {
    let host = Arc::new(RecordingHost::default());
    let input = scripted_input(&["Alice", "2", "1"], Duration::from_secs(1));
    let interp = session(Arc::clone(&host)).run(input).await.unwrap();

    assert_eq!(interp.current_step().as_str(), script::shortcuts::PROJECTS);
    assert!(!interp.is_open());
    assert_eq!(
        host.effects(),
        vec![
            HostEffect::Notify {
                text: "Welcome, Alice!".into()
            },
            HostEffect::ScrollTo {
                anchor: "projects-section".into()
            },
            HostEffect::Close,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn closing_mid_transition_defers_reveal_until_reopen() {
    let host = Arc::new(RecordingHost::default());
    let (tx, rx) = mpsc::unbounded_channel();
    let driver = tokio::spawn(
        session(Arc::clone(&host)).run(lines(rx)),
    );

    tokio::time::sleep(Duration::from_millis(10)).await;
    tx.send("Alice".to_string()).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    tx.send("/close".to_string()).unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    // Nothing was revealed while closed.
    let closed_len = host
        .updates()
        .iter()
        .map(|u| u.messages.len())
        .sum::<usize>();
    assert_eq!(closed_len, 4);

    tx.send("/open".to_string()).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    drop(tx);

    let interp = driver.await.unwrap().unwrap();
    assert_eq!(interp.current_step().as_str(), "profile-created");
    assert_eq!(interp.transcript().len(), 6);
    assert_eq!(host.updates().last().unwrap().input_mode, InputMode::Choices);
}

#[tokio::test(start_paused = true)]
async fn reset_and_whatsapp_commands() {
    let host = Arc::new(RecordingHost::default());
    let input = scripted_input(&["Alice", "/whatsapp", "/reset"], Duration::from_secs(1));
    let link = WhatsAppLink::new("+1 555 0100", "Hi!");
    let interp = session(Arc::clone(&host))
        .with_whatsapp(link.clone())
        .run(input)
        .await
        .unwrap();

    assert_eq!(interp.current_step().as_str(), "start");
    assert_eq!(interp.transcript().len(), 3);
    assert!(interp.visitor_name().is_none());
    assert!(host.effects().contains(&HostEffect::OpenUrl { url: link.url() }));

    // After reset the greeting is rendered again from scratch.
    let last = host.updates().pop().unwrap();
    assert_eq!(last.messages.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn quit_stops_the_session() {
    let host = Arc::new(RecordingHost::default());
    let input = scripted_input(&["/quit", "Alice"], Duration::from_secs(1));
    let interp = session(host).run(input).await.unwrap();
    assert_eq!(interp.current_step().as_str(), "start");
    assert_eq!(interp.transcript().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn contact_bubble_appears_once_after_delay() {
    let host = Arc::new(RecordingHost::default());
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let driver = tokio::spawn(session(Arc::clone(&host)).with_contact_bubble().run(lines(rx)));
    let bubble = HostEffect::Notify {
        text: BUBBLE_TEXT.to_string(),
    };

    tokio::time::sleep(Duration::from_millis(1900)).await;
    assert!(!host.effects().contains(&bubble));

    tokio::time::sleep(Duration::from_secs(5)).await;
    drop(tx);
    driver.await.unwrap().unwrap();
    assert_eq!(host.effects(), vec![bubble]);
}

#[tokio::test(start_paused = true)]
async fn label_picks_its_own_choice() {
    let host = Arc::new(RecordingHost::default());
    let input = scripted_input(&["Alice", "story mode", "go back ↩"], Duration::from_secs(1));
    let interp = session(host).run(input).await.unwrap();

    let echoes: Vec<_> = interp
        .transcript()
        .from_sender(Sender::Visitor)
        .map(|m| m.text.as_str())
        .collect();
    assert_eq!(echoes, ["Alice", "Story Mode", "Go Back ↩"]);
    assert_eq!(interp.current_step().as_str(), "profile-created");
}
