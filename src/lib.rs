//! # Auto Clicker
//!
//! Repeats left clicks at a chosen screen position on a background thread,
//! using one of several injection mechanisms.
//!
//! ## Features
//!
//! - Direct input clicks, optionally humanized with position and timing jitter
//! - Synchronous (`SendMessage`) and asynchronous (`PostMessage`) window-message clicks
//! - Fixed or randomized intervals and an optional click budget
//! - Global start/stop hotkeys
//! - JSON configuration file support
//!
//! ## Example
//!
//! ```no_run
//! use auto_clicker::{status, ClickConfig, ClickController, Position, Win32Backend};
//! use std::sync::Arc;
//!
//! let (tx, mut rx) = status::channel();
//! let config = ClickConfig {
//!     position: Some(Position::new(640, 480)),
//!     click_budget: 10,
//!     ..Default::default()
//! };
//! let controller = ClickController::new(Arc::new(Win32Backend::new()), config, tx);
//!
//! controller.start().unwrap();
//! controller.join();
//! while let Ok(event) = rx.try_recv() {
//!     println!("{}", event);
//! }
//! ```

pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod hotkey;
pub mod position;
pub mod process_finder;
pub mod status;
pub mod strategy;

pub use backend::{InputBackend, RecordingBackend, Win32Backend};
pub use config::{ClickConfig, ClickMethod, IntervalPreset, JitterRanges};
pub use controller::{ClickController, StartOutcome};
pub use error::{ClickerError, Result};
pub use hotkey::{HotkeyAction, HotkeyManager};
pub use position::{Position, WindowHandle};
pub use process_finder::ProcessFinder;
pub use status::StatusEvent;
pub use strategy::{ClickOutcome, Strategy};
