//! Click strategies.
//!
//! Each strategy injects exactly one press/release pair through an
//! [`InputBackend`]. Failures stay inside the strategy: [`Strategy::click`]
//! logs them and returns `false`.

use crate::backend::{ButtonAction, Delivery, InputBackend};
use crate::config::{ClickMethod, JitterRanges};
use crate::error::Result;
use crate::position::{Position, WindowHandle};
use rand::Rng;
use std::fmt;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// One concrete injection mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Cursor move plus input events, with position and timing jitter.
    HumanizedDirectInput,
    /// Cursor move plus input events at the exact point with a fixed press.
    SimpleDirectInput,
    /// Button messages delivered synchronously to the target window.
    SyncMessage,
    /// Button messages queued on the target window.
    AsyncMessage,
}

/// What a successful click actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickOutcome {
    /// Screen position the click landed on after jitter.
    pub screen: Position,
    /// Client position for message strategies.
    pub client: Option<Position>,
    /// Window the messages were sent to.
    pub window: Option<WindowHandle>,
    /// Delay between the down and up events.
    pub press: Duration,
}

impl Strategy {
    /// Picks the strategy for a method; `humanize` only affects direct input.
    pub fn select(method: ClickMethod, humanize: bool) -> Self {
        match method {
            ClickMethod::DirectInput if humanize => Strategy::HumanizedDirectInput,
            ClickMethod::DirectInput => Strategy::SimpleDirectInput,
            ClickMethod::SendMessage => Strategy::SyncMessage,
            ClickMethod::PostMessage => Strategy::AsyncMessage,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Strategy::HumanizedDirectInput => "humanized direct-input",
            Strategy::SimpleDirectInput => "simple direct-input",
            Strategy::SyncMessage => "send-message",
            Strategy::AsyncMessage => "post-message",
        }
    }

    /// Performs one click and reports success.
    ///
    /// Errors are logged with their cause and never propagated.
    pub fn click<R: Rng + ?Sized>(
        self,
        backend: &dyn InputBackend,
        target: Position,
        window: Option<WindowHandle>,
        jitter: &JitterRanges,
        rng: &mut R,
    ) -> bool {
        match self.try_click(backend, target, window, jitter, rng) {
            Ok(outcome) => {
                debug!(strategy = self.name(), ?outcome, "click injected");
                true
            }
            Err(e) => {
                warn!(strategy = self.name(), %target, error = %e, "click failed");
                false
            }
        }
    }

    /// Performs one click, returning what was injected or the first failure.
    pub fn try_click<R: Rng + ?Sized>(
        self,
        backend: &dyn InputBackend,
        target: Position,
        window: Option<WindowHandle>,
        jitter: &JitterRanges,
        rng: &mut R,
    ) -> Result<ClickOutcome> {
        match self {
            Strategy::HumanizedDirectInput => {
                let (dx, dy) = jitter.sample_offset(rng);
                let reaction = jitter.sample_reaction(rng);
                let press = jitter.sample_press(rng);
                direct_click(backend, target.offset(dx, dy), Some(reaction), press)
            }
            Strategy::SimpleDirectInput => {
                direct_click(backend, target, None, jitter.simple_press())
            }
            Strategy::SyncMessage => {
                let press = jitter.sample_press(rng);
                message_click(backend, target, window, press, Delivery::Sync)
            }
            Strategy::AsyncMessage => {
                let press = jitter.sample_press(rng);
                message_click(backend, target, window, press, Delivery::Async)
            }
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn direct_click(
    backend: &dyn InputBackend,
    point: Position,
    reaction: Option<Duration>,
    press: Duration,
) -> Result<ClickOutcome> {
    backend.move_cursor(point)?;
    if let Some(reaction) = reaction {
        thread::sleep(reaction);
    }

    backend.mouse_button(ButtonAction::Down, point)?;
    thread::sleep(press);
    backend.mouse_button(ButtonAction::Up, point)?;

    Ok(ClickOutcome {
        screen: point,
        client: None,
        window: None,
        press,
    })
}

fn message_click(
    backend: &dyn InputBackend,
    target: Position,
    window: Option<WindowHandle>,
    press: Duration,
    delivery: Delivery,
) -> Result<ClickOutcome> {
    let window = match window {
        Some(w) => w,
        None => backend.foreground_window()?,
    };
    let client = backend.screen_to_client(window, target)?;

    backend.button_message(window, ButtonAction::Down, client, delivery)?;
    thread::sleep(press);
    backend.button_message(window, ButtonAction::Up, client, delivery)?;

    Ok(ClickOutcome {
        screen: target,
        client: Some(client),
        window: Some(window),
        press,
    })
}
