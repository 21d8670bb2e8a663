//! Click configuration, JSON persistence and duration parsing.
//!
//! A [`ClickConfig`] can be loaded from a JSON file such as:
//!
//! ```json
//! {
//!   "position": { "x": 640, "y": 480 },
//!   "method": "direct-input",
//!   "humanize": true,
//!   "randomize_interval": true,
//!   "interval": "500ms",
//!   "click_budget": 100
//! }
//! ```
//!
//! Omitted fields fall back to the same defaults the CLI uses.

use crate::error::{ClickerError, Result};
use crate::position::{Position, WindowHandle};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Injection mechanism selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ClickMethod {
    /// Move the system cursor and inject button events through the input stream.
    #[default]
    DirectInput,
    /// Deliver button messages to the window and wait for them to be handled.
    SendMessage,
    /// Queue button messages on the window without waiting.
    PostMessage,
}

impl fmt::Display for ClickMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClickMethod::DirectInput => "direct-input",
            ClickMethod::SendMessage => "send-message",
            ClickMethod::PostMessage => "post-message",
        };
        f.write_str(name)
    }
}

/// Named interval presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum IntervalPreset {
    Slow,
    Normal,
    Fast,
    Ultra,
}

impl IntervalPreset {
    pub fn interval(self) -> Duration {
        match self {
            IntervalPreset::Slow => Duration::from_secs(2),
            IntervalPreset::Normal => Duration::from_secs(1),
            IntervalPreset::Fast => Duration::from_millis(500),
            IntervalPreset::Ultra => Duration::from_millis(100),
        }
    }
}

/// Inclusive millisecond range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsRange {
    pub min: u64,
    pub max: u64,
}

impl MsRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, d: Duration) -> bool {
        d >= Duration::from_millis(self.min) && d <= Duration::from_millis(self.max)
    }

    /// Uniform sample with microsecond resolution.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let micros = rng.gen_range(self.min * 1_000..=self.max * 1_000);
        Duration::from_micros(micros)
    }
}

/// Inclusive multiplier range applied to the base interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorRange {
    pub min: f64,
    pub max: f64,
}

/// Jitter applied to humanized clicks and randomized intervals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterRanges {
    /// Maximum absolute pixel offset on each axis.
    pub position_px: i32,
    /// Pause between moving the cursor and pressing the button.
    pub reaction_ms: MsRange,
    /// How long the button stays down on humanized and message clicks.
    pub press_ms: MsRange,
    /// Fixed press duration for simple clicks.
    pub simple_press_ms: u64,
    pub interval_factor: FactorRange,
}

impl Default for JitterRanges {
    fn default() -> Self {
        Self {
            position_px: 2,
            reaction_ms: MsRange::new(1, 3),
            press_ms: MsRange::new(10, 50),
            simple_press_ms: 10,
            interval_factor: FactorRange { min: 0.5, max: 1.5 },
        }
    }
}

impl JitterRanges {
    pub fn sample_offset<R: Rng + ?Sized>(&self, rng: &mut R) -> (i32, i32) {
        let r = self.position_px;
        (rng.gen_range(-r..=r), rng.gen_range(-r..=r))
    }

    pub fn sample_reaction<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        self.reaction_ms.sample(rng)
    }

    pub fn sample_press<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        self.press_ms.sample(rng)
    }

    pub fn simple_press(&self) -> Duration {
        Duration::from_millis(self.simple_press_ms)
    }

    /// Scales `base` by a uniform factor from `interval_factor`.
    ///
    /// Fails if the product is not representable as a `Duration`.
    pub fn sample_interval<R: Rng + ?Sized>(&self, base: Duration, rng: &mut R) -> Result<Duration> {
        let factor = rng.gen_range(self.interval_factor.min..=self.interval_factor.max);
        Duration::try_from_secs_f64(base.as_secs_f64() * factor).map_err(|e| {
            ClickerError::loop_fatal(format!(
                "cannot scale interval {:?} by {}: {}",
                base, factor, e
            ))
        })
    }
}

/// Everything the click loop reads at the top of each iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickConfig {
    #[serde(default)]
    pub position: Option<Position>,

    #[serde(default)]
    pub method: ClickMethod,

    /// Only meaningful for [`ClickMethod::DirectInput`].
    #[serde(default = "default_true")]
    pub humanize: bool,

    #[serde(default = "default_true")]
    pub randomize_interval: bool,

    #[serde(default = "default_interval", with = "duration_format")]
    pub interval: Duration,

    /// Number of successful clicks before the run ends; 0 means unbounded.
    #[serde(default)]
    pub click_budget: u64,

    /// Window for the message strategies; the foreground window when unset.
    #[serde(default)]
    pub target_window: Option<WindowHandle>,

    #[serde(default)]
    pub jitter: JitterRanges,

    #[serde(default = "default_start_hotkey")]
    pub start_hotkey: String,

    #[serde(default = "default_stop_hotkey")]
    pub stop_hotkey: String,

    #[serde(default)]
    pub verbose: bool,
}

fn default_true() -> bool {
    true
}

fn default_interval() -> Duration {
    IntervalPreset::Normal.interval()
}

fn default_start_hotkey() -> String {
    "f6".to_string()
}

fn default_stop_hotkey() -> String {
    "f7".to_string()
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            position: None,
            method: ClickMethod::default(),
            humanize: true,
            randomize_interval: true,
            interval: default_interval(),
            click_budget: 0,
            target_window: None,
            jitter: JitterRanges::default(),
            start_hotkey: default_start_hotkey(),
            stop_hotkey: default_stop_hotkey(),
            verbose: false,
        }
    }
}

impl ClickConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClickerError::config_load(path, e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ClickerError::config_load(path, e.to_string()))
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ClickerError::config_save(path, e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(ClickerError::config_validation(
                "interval must be greater than zero",
            ));
        }

        let j = &self.jitter;
        if j.position_px < 0 {
            return Err(ClickerError::config_validation(
                "position jitter cannot be negative",
            ));
        }
        if j.press_ms.min > j.press_ms.max {
            return Err(ClickerError::config_validation(
                "press duration range is inverted",
            ));
        }
        if j.reaction_ms.min > j.reaction_ms.max {
            return Err(ClickerError::config_validation(
                "reaction delay range is inverted",
            ));
        }
        let f = j.interval_factor;
        if !(f.min.is_finite() && f.max.is_finite()) || f.min <= 0.0 || f.min > f.max {
            return Err(ClickerError::config_validation(
                "interval factor range must be positive and ordered",
            ));
        }

        if self.start_hotkey.trim().is_empty() || self.stop_hotkey.trim().is_empty() {
            return Err(ClickerError::config_validation("hotkeys cannot be empty"));
        }
        if self.start_hotkey.trim().eq_ignore_ascii_case(self.stop_hotkey.trim()) {
            return Err(ClickerError::config_validation(
                "start and stop hotkeys must differ",
            ));
        }

        Ok(())
    }

    pub fn budget(&self) -> Option<u64> {
        (self.click_budget > 0).then_some(self.click_budget)
    }

    pub fn clicks_per_minute(&self) -> f64 {
        60.0 / self.interval.as_secs_f64()
    }
}

/// Parses `"500ms"`, `"2s"`, `"1m"` or a bare number of milliseconds.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();
    if s.is_empty() {
        return Err(ClickerError::invalid_duration(s, "empty string"));
    }

    let (digits, unit_ms) = if let Some(v) = s.strip_suffix("ms") {
        (v, 1u64)
    } else if let Some(v) = s.strip_suffix('s') {
        (v, 1_000)
    } else if let Some(v) = s.strip_suffix('m') {
        (v, 60_000)
    } else {
        (s.as_str(), 1)
    };

    let value: u64 = digits.trim().parse().map_err(|_| {
        ClickerError::invalid_duration(
            s.clone(),
            "expected a non-negative integer with ms, s or m suffix",
        )
    })?;

    let millis = value
        .checked_mul(unit_ms)
        .ok_or_else(|| ClickerError::invalid_duration(s.clone(), "value too large"))?;

    Ok(Duration::from_millis(millis))
}

/// Formats a duration the way [`parse_duration`] reads it back.
pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms != 0 && ms % 60_000 == 0 {
        format!("{}m", ms / 60_000)
    } else if ms != 0 && ms % 1_000 == 0 {
        format!("{}s", ms / 1_000)
    } else {
        format!("{}ms", ms)
    }
}

mod duration_format {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_duration(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
