//! Screen coordinates and window handles.

use crate::error::{ClickerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Absolute screen coordinate in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns this position shifted by `(dx, dy)`, saturating at the i32 bounds.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X={}, Y={}", self.x, self.y)
    }
}

impl FromStr for Position {
    type Err = ClickerError;

    /// Parses manual entry in the form `x,y` or `x y`.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let parts: Vec<&str> = trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();

        if parts.len() != 2 {
            return Err(ClickerError::invalid_position(
                s,
                "expected two integers separated by ',' or a space",
            ));
        }

        let x = parts[0]
            .parse::<i32>()
            .map_err(|e| ClickerError::invalid_position(s, format!("x: {}", e)))?;
        let y = parts[1]
            .parse::<i32>()
            .map_err(|e| ClickerError::invalid_position(s, format!("y: {}", e)))?;

        Ok(Self { x, y })
    }
}

/// Opaque top-level window handle.
///
/// Stored as an integer so configs and the worker thread can carry it
/// across threads; it is only turned back into an `HWND` inside the
/// Windows backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(pub u64);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

impl FromStr for WindowHandle {
    type Err = ClickerError;

    /// Accepts decimal or `0x`-prefixed hexadecimal.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => trimmed.parse::<u64>(),
        };

        match parsed {
            Ok(0) => Err(ClickerError::window("window handle cannot be zero")),
            Ok(raw) => Ok(Self(raw)),
            Err(e) => Err(ClickerError::window(format!(
                "invalid window handle '{}': {}",
                s, e
            ))),
        }
    }
}
