use anyhow::{anyhow, Result};
use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// What a registered hotkey asks the controller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    Start,
    Stop,
}

/// Owns the OS hotkey registrations for start and stop.
///
/// Registrations live as long as this value; dropping it unregisters them.
pub struct HotkeyManager {
    manager: GlobalHotKeyManager,
    bindings: HashMap<u32, HotkeyAction>,
}

impl HotkeyManager {
    pub fn new() -> Result<Self> {
        let manager = GlobalHotKeyManager::new()
            .map_err(|e| anyhow!("Failed to create GlobalHotKeyManager: {}", e))?;

        Ok(Self {
            manager,
            bindings: HashMap::new(),
        })
    }

    pub fn register(&mut self, hotkey_str: &str, action: HotkeyAction) -> Result<()> {
        let hotkey = parse_hotkey(hotkey_str)?;

        self.manager
            .register(hotkey)
            .map_err(|e| anyhow!("Failed to register hotkey '{}': {}", hotkey_str, e))?;
        self.bindings.insert(hotkey.id(), action);

        info!(hotkey = hotkey_str, ?action, "global hotkey registered");
        Ok(())
    }

    /// Registers the start and stop keys in one go.
    pub fn register_controls(&mut self, start: &str, stop: &str) -> Result<()> {
        self.register(start, HotkeyAction::Start)?;
        self.register(stop, HotkeyAction::Stop)
    }

    /// Forwards presses of registered hotkeys as [`HotkeyAction`]s.
    ///
    /// The listener runs on tokio's blocking pool and exits once the
    /// returned receiver is dropped.
    pub fn spawn_listener(&self) -> mpsc::UnboundedReceiver<HotkeyAction> {
        let (tx, rx) = mpsc::unbounded_channel();
        let bindings = self.bindings.clone();
        let events = GlobalHotKeyEvent::receiver();

        tokio::task::spawn_blocking(move || {
            while !tx.is_closed() {
                let event = match events.recv_timeout(Duration::from_millis(50)) {
                    Ok(event) => event,
                    Err(e) if e.is_timeout() => continue,
                    Err(_) => break,
                };
                if event.state != HotKeyState::Pressed {
                    continue;
                }

                match bindings.get(&event.id) {
                    Some(action) => {
                        debug!(?action, "hotkey pressed");
                        if tx.send(*action).is_err() {
                            break;
                        }
                    }
                    None => warn!(id = event.id, "press from unknown hotkey"),
                }
            }
            debug!("hotkey listener stopped");
        });

        rx
    }
}

/// Parses strings such as `"f6"`, `"ctrl+alt+s"` or `"shift+pageup"`.
pub fn parse_hotkey(hotkey_str: &str) -> Result<HotKey> {
    let binding = hotkey_str.to_lowercase();
    let parts: Vec<&str> = binding
        .split('+')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if parts.is_empty() {
        return Err(anyhow!("Empty hotkey string"));
    }

    let mut modifiers = Modifiers::empty();
    let mut key_code = None;

    for part in &parts {
        match *part {
            "ctrl" | "control" => modifiers |= Modifiers::CONTROL,
            "alt" => modifiers |= Modifiers::ALT,
            "shift" => modifiers |= Modifiers::SHIFT,
            "meta" | "cmd" | "super" | "win" => modifiers |= Modifiers::SUPER,
            key => {
                if key_code.is_some() {
                    return Err(anyhow!("Multiple keys specified in hotkey: {}", hotkey_str));
                }
                key_code = Some(parse_key_code(key)?);
            }
        }
    }

    let code = key_code.ok_or_else(|| anyhow!("No key specified in hotkey: {}", hotkey_str))?;
    let modifiers = (!modifiers.is_empty()).then_some(modifiers);

    Ok(HotKey::new(modifiers, code))
}

/// Maps a lowercase key name onto its W3C `Code`.
fn parse_key_code(key: &str) -> Result<Code> {
    let mut chars = key.chars();
    let name = match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_lowercase() => format!("Key{}", c.to_ascii_uppercase()),
        (Some(c), None) if c.is_ascii_digit() => format!("Digit{}", c),
        _ => match key {
            "space" => "Space".to_string(),
            "enter" | "return" => "Enter".to_string(),
            "tab" => "Tab".to_string(),
            "escape" | "esc" => "Escape".to_string(),
            "backspace" => "Backspace".to_string(),
            "delete" | "del" => "Delete".to_string(),
            "insert" | "ins" => "Insert".to_string(),
            "home" => "Home".to_string(),
            "end" => "End".to_string(),
            "pageup" => "PageUp".to_string(),
            "pagedown" => "PageDown".to_string(),
            "up" | "arrowup" => "ArrowUp".to_string(),
            "down" | "arrowdown" => "ArrowDown".to_string(),
            "left" | "arrowleft" => "ArrowLeft".to_string(),
            "right" | "arrowright" => "ArrowRight".to_string(),
            "pause" => "Pause".to_string(),
            "scrolllock" => "ScrollLock".to_string(),
            f if is_function_key(f) => f.to_uppercase(),
            _ => return Err(anyhow!("Unsupported key: {}", key)),
        },
    };

    Code::from_str(&name).map_err(|_| anyhow!("Unsupported key: {}", key))
}

fn is_function_key(key: &str) -> bool {
    key.strip_prefix('f')
        .and_then(|n| n.parse::<u8>().ok())
        .is_some_and(|n| (1..=24).contains(&n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_function_keys() {
        assert_eq!(parse_hotkey("f6").unwrap(), HotKey::new(None, Code::F6));
        assert_eq!(parse_hotkey("F7").unwrap(), HotKey::new(None, Code::F7));
        assert_eq!(parse_hotkey("f12").unwrap(), HotKey::new(None, Code::F12));
        assert!(parse_hotkey("f25").is_err());
    }

    #[test]
    fn test_parse_combinations() {
        let hotkey = parse_hotkey("ctrl+alt+s").unwrap();
        assert_eq!(
            hotkey,
            HotKey::new(Some(Modifiers::CONTROL | Modifiers::ALT), Code::KeyS)
        );

        let hotkey = parse_hotkey("Shift + PageUp").unwrap();
        assert_eq!(hotkey, HotKey::new(Some(Modifiers::SHIFT), Code::PageUp));

        assert_eq!(
            parse_hotkey("ctrl+1").unwrap(),
            HotKey::new(Some(Modifiers::CONTROL), Code::Digit1)
        );
    }

    #[test]
    fn test_parse_rejects_bad_hotkeys() {
        assert!(parse_hotkey("").is_err());
        assert!(parse_hotkey("ctrl+alt").is_err());
        assert!(parse_hotkey("a+b").is_err());
        assert!(parse_hotkey("ctrl+banana").is_err());
    }
}
