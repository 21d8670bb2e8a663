//! Status events published by the click loop.
//!
//! The worker never touches host state; it pushes [`StatusEvent`]s into a
//! channel that the host drains on its own task.

use crate::position::Position;
use std::fmt;
use tokio::sync::mpsc;

pub type StatusSender = mpsc::UnboundedSender<StatusEvent>;
pub type StatusReceiver = mpsc::UnboundedReceiver<StatusEvent>;

pub fn channel() -> (StatusSender, StatusReceiver) {
    mpsc::unbounded_channel()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    Ready,
    PositionSet(Position),
    Started,
    Progress { done: u64, budget: Option<u64> },
    /// Stop was requested; the worker exits at its next check.
    Stopped,
    /// The worker exited, on request or because the budget ran out.
    Finished,
    Error(String),
}

impl StatusEvent {
    pub fn is_error(&self) -> bool {
        matches!(self, StatusEvent::Error(_))
    }

    /// Remaining clicks for budgeted progress.
    pub fn remaining(&self) -> Option<u64> {
        match self {
            StatusEvent::Progress {
                done,
                budget: Some(total),
            } => Some(total.saturating_sub(*done)),
            _ => None,
        }
    }
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusEvent::Ready => f.write_str("Ready - configure position and frequency"),
            StatusEvent::PositionSet(p) => write!(f, "Position configured: {}", p),
            StatusEvent::Started => f.write_str("Clicking in progress..."),
            StatusEvent::Progress {
                done,
                budget: Some(total),
            } => write!(
                f,
                "Clicks: {}/{} (Remaining: {})",
                done,
                total,
                total.saturating_sub(*done)
            ),
            StatusEvent::Progress { done, budget: None } => {
                write!(f, "Clicks performed: {}", done)
            }
            StatusEvent::Stopped => f.write_str("Stopped"),
            StatusEvent::Finished => f.write_str("Finished"),
            StatusEvent::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}
