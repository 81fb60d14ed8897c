//! Logical timeline for deferred dialogue work.
//!
//! The interpreter never sleeps. It queues deferred actions on a timeline
//! measured from when the widget was created, and the driver advances the
//! timeline with elapsed time. Tests advance it by hand.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::model::StepId;
use super::navigation::NavigationShortcut;

/// Source of wall-clock timestamps for transcript messages.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Delays applied to one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delays {
    /// Time before the target step's messages appear.
    pub reveal: Duration,
    /// Time before navigation shortcut effects reach the host.
    pub navigation: Duration,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            reveal: Duration::from_millis(500),
            navigation: Duration::from_millis(1000),
        }
    }
}

impl Delays {
    /// Zero delays, for hosts that render everything at once.
    pub fn immediate() -> Self {
        Self {
            reveal: Duration::ZERO,
            navigation: Duration::ZERO,
        }
    }
}

/// Work the interpreter has deferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredAction {
    /// Append the step's messages and recompute the input affordance.
    Reveal(StepId),
    /// Hand a navigation shortcut to the host.
    Navigate(NavigationShortcut),
}

#[derive(Debug, Clone)]
struct Scheduled {
    seq: u64,
    due: Duration,
    action: DeferredAction,
}

/// Pending deferred actions on a single logical timeline.
#[derive(Debug, Default)]
pub struct Timeline {
    now: Duration,
    next_seq: u64,
    pending: Vec<Scheduled>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current position on the timeline.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Queue `action` to fire `delay` from now.
    pub fn schedule(&mut self, delay: Duration, action: DeferredAction) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Scheduled {
            seq,
            due: self.now + delay,
            action,
        });
        seq
    }

    /// Move the timeline to `at` and drain everything due by then, ordered by
    /// due time and then by scheduling order. Moving backwards is ignored.
    pub fn advance_to(&mut self, at: Duration) -> Vec<DeferredAction> {
        if at > self.now {
            self.now = at;
        }
        let now = self.now;
        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|s| s.due <= now);
        self.pending = rest;
        due.sort_by_key(|s| (s.due, s.seq));
        due.into_iter().map(|s| s.action).collect()
    }

    /// When the earliest pending action falls due.
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.iter().map(|s| s.due).min()
    }

    /// Drop every pending action, returning them in scheduling order.
    pub fn cancel_all(&mut self) -> Vec<DeferredAction> {
        let mut cancelled: Vec<_> = self.pending.drain(..).collect();
        cancelled.sort_by_key(|s| s.seq);
        cancelled.into_iter().map(|s| s.action).collect()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reveal(id: &str) -> DeferredAction {
        DeferredAction::Reveal(id.into())
    }

    #[test]
    fn nothing_fires_before_due() {
        let mut timeline = Timeline::new();
        timeline.schedule(Duration::from_millis(500), reveal("a"));
        assert!(timeline.advance_to(Duration::from_millis(499)).is_empty());
        assert_eq!(timeline.next_due(), Some(Duration::from_millis(500)));
        assert_eq!(timeline.advance_to(Duration::from_millis(500)), vec![reveal("a")]);
        assert!(timeline.is_idle());
    }

    #[test]
    fn fires_in_due_then_schedule_order() {
        let mut timeline = Timeline::new();
        timeline.schedule(Duration::from_millis(1000), reveal("late"));
        timeline.schedule(Duration::from_millis(500), reveal("first"));
        timeline.schedule(Duration::from_millis(500), reveal("second"));
        let fired = timeline.advance_to(Duration::from_secs(2));
        assert_eq!(fired, vec![reveal("first"), reveal("second"), reveal("late")]);
    }

    #[test]
    fn delays_are_relative_to_current_position() {
        let mut timeline = Timeline::new();
        timeline.advance_to(Duration::from_secs(10));
        timeline.schedule(Duration::from_millis(500), reveal("a"));
        assert_eq!(timeline.next_due(), Some(Duration::from_millis(10_500)));
    }

    #[test]
    fn going_backwards_is_ignored() {
        let mut timeline = Timeline::new();
        timeline.advance_to(Duration::from_secs(5));
        timeline.advance_to(Duration::from_secs(1));
        assert_eq!(timeline.now(), Duration::from_secs(5));
    }

    #[test]
    fn cancel_all_empties_the_queue() {
        let mut timeline = Timeline::new();
        timeline.schedule(Duration::from_millis(500), reveal("a"));
        timeline.schedule(Duration::from_millis(100), reveal("b"));
        assert!(!timeline.is_idle());
        assert_eq!(timeline.cancel_all(), vec![reveal("a"), reveal("b")]);
        assert!(timeline.advance_to(Duration::from_secs(60)).is_empty());
        assert_eq!(timeline.next_due(), None);
    }
}
