//! Input injection backends.
//!
//! Strategies talk to the OS only through [`InputBackend`]. [`Win32Backend`]
//! performs real injection on Windows; everywhere else it reports
//! [`ClickerError::UnsupportedPlatform`]. [`RecordingBackend`] keeps every
//! call in memory and backs the test suite and `--dry-run`.

use crate::error::{ClickerError, Result};
use crate::position::{Position, WindowHandle};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Which half of a click is being injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Down,
    Up,
}

/// How a window message is handed to the target window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Blocks until the window procedure has handled the message.
    Sync,
    /// Queues the message and returns immediately.
    Async,
}

/// OS primitives needed by the click strategies.
pub trait InputBackend: Send + Sync {
    /// Moves the system cursor to an absolute screen position.
    fn move_cursor(&self, pos: Position) -> Result<()>;

    /// Injects a left-button event at the current cursor position.
    /// `pos` is where the caller placed the cursor.
    fn mouse_button(&self, action: ButtonAction, pos: Position) -> Result<()>;

    fn foreground_window(&self) -> Result<WindowHandle>;

    /// Converts a screen coordinate into `window`'s client-area coordinates.
    fn screen_to_client(&self, window: WindowHandle, pos: Position) -> Result<Position>;

    /// Sends a left-button message carrying client coordinates to `window`.
    fn button_message(
        &self,
        window: WindowHandle,
        action: ButtonAction,
        client: Position,
        delivery: Delivery,
    ) -> Result<()>;
}

/// Backend that talks to the Win32 input and messaging APIs.
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32Backend;

impl Win32Backend {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(windows)]
mod win32 {
    use super::{ButtonAction, Delivery, InputBackend, Win32Backend};
    use crate::error::{ClickerError, Result};
    use crate::position::{Position, WindowHandle};
    use std::io;
    use std::mem;
    use winapi::shared::minwindef::{LPARAM, MAKELONG, WPARAM};
    use winapi::shared::windef::{HWND, POINT};
    use winapi::um::winuser::{
        self, INPUT, INPUT_MOUSE, MK_LBUTTON, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP,
        MOUSEINPUT, WM_LBUTTONDOWN, WM_LBUTTONUP,
    };

    fn to_hwnd(window: WindowHandle) -> HWND {
        window.0 as usize as HWND
    }

    fn last_error() -> String {
        io::Error::last_os_error().to_string()
    }

    fn ensure_window(window: WindowHandle) -> Result<HWND> {
        let hwnd = to_hwnd(window);
        if unsafe { winuser::IsWindow(hwnd) } == 0 {
            return Err(ClickerError::window(format!(
                "{} is not a valid window",
                window
            )));
        }
        Ok(hwnd)
    }

    impl InputBackend for Win32Backend {
        fn move_cursor(&self, pos: Position) -> Result<()> {
            if unsafe { winuser::SetCursorPos(pos.x, pos.y) } == 0 {
                return Err(ClickerError::injection(
                    "SetCursorPos",
                    format!("cannot move cursor to {}: {}", pos, last_error()),
                ));
            }
            Ok(())
        }

        fn mouse_button(&self, action: ButtonAction, pos: Position) -> Result<()> {
            let flags = match action {
                ButtonAction::Down => MOUSEEVENTF_LEFTDOWN,
                ButtonAction::Up => MOUSEEVENTF_LEFTUP,
            };

            let mut input: INPUT = unsafe { mem::zeroed() };
            input.type_ = INPUT_MOUSE;
            unsafe {
                *input.u.mi_mut() = MOUSEINPUT {
                    dx: 0,
                    dy: 0,
                    mouseData: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                };
            }

            let sent =
                unsafe { winuser::SendInput(1, &mut input, mem::size_of::<INPUT>() as i32) };
            if sent != 1 {
                return Err(ClickerError::injection(
                    "SendInput",
                    format!("button {:?} at {} was blocked: {}", action, pos, last_error()),
                ));
            }
            Ok(())
        }

        fn foreground_window(&self) -> Result<WindowHandle> {
            let hwnd = unsafe { winuser::GetForegroundWindow() };
            if hwnd.is_null() {
                return Err(ClickerError::window("no foreground window"));
            }
            Ok(WindowHandle(hwnd as usize as u64))
        }

        fn screen_to_client(&self, window: WindowHandle, pos: Position) -> Result<Position> {
            let hwnd = ensure_window(window)?;
            let mut point = POINT { x: pos.x, y: pos.y };
            if unsafe { winuser::ScreenToClient(hwnd, &mut point) } == 0 {
                return Err(ClickerError::window(format!(
                    "ScreenToClient failed for {}: {}",
                    window,
                    last_error()
                )));
            }
            Ok(Position::new(point.x, point.y))
        }

        fn button_message(
            &self,
            window: WindowHandle,
            action: ButtonAction,
            client: Position,
            delivery: Delivery,
        ) -> Result<()> {
            let hwnd = ensure_window(window)?;
            let (msg, wparam) = match action {
                ButtonAction::Down => (WM_LBUTTONDOWN, MK_LBUTTON as WPARAM),
                ButtonAction::Up => (WM_LBUTTONUP, 0),
            };
            // Low word x, high word y; negative client coordinates wrap like MAKELPARAM.
            let lparam = MAKELONG(client.x as u16, client.y as u16) as LPARAM;

            match delivery {
                Delivery::Sync => {
                    unsafe { winuser::SendMessageW(hwnd, msg, wparam, lparam) };
                }
                Delivery::Async => {
                    if unsafe { winuser::PostMessageW(hwnd, msg, wparam, lparam) } == 0 {
                        return Err(ClickerError::injection(
                            "PostMessage",
                            format!("queueing {:?} to {} failed: {}", action, window, last_error()),
                        ));
                    }
                }
            }
            Ok(())
        }
    }
}

#[cfg(not(windows))]
impl InputBackend for Win32Backend {
    fn move_cursor(&self, _pos: Position) -> Result<()> {
        Err(unsupported())
    }

    fn mouse_button(&self, _action: ButtonAction, _pos: Position) -> Result<()> {
        Err(unsupported())
    }

    fn foreground_window(&self) -> Result<WindowHandle> {
        Err(unsupported())
    }

    fn screen_to_client(&self, _window: WindowHandle, _pos: Position) -> Result<Position> {
        Err(unsupported())
    }

    fn button_message(
        &self,
        _window: WindowHandle,
        _action: ButtonAction,
        _client: Position,
        _delivery: Delivery,
    ) -> Result<()> {
        Err(unsupported())
    }
}

#[cfg(not(windows))]
fn unsupported() -> ClickerError {
    ClickerError::unsupported_platform("click injection requires Windows; use --dry-run")
}

/// A call observed by [`RecordingBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEventKind {
    CursorMoved(Position),
    Button {
        action: ButtonAction,
        pos: Position,
    },
    Message {
        window: WindowHandle,
        action: ButtonAction,
        client: Position,
        delivery: Delivery,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct InputEvent {
    pub kind: InputEventKind,
    pub at: Instant,
}

/// In-memory backend that records every call instead of injecting it.
///
/// The foreground window and its client origin are configurable so message
/// strategies can be exercised; [`RecordingBackend::set_failing`] makes every
/// call fail with an injection error.
#[derive(Debug)]
pub struct RecordingBackend {
    events: Mutex<Vec<InputEvent>>,
    foreground: Option<WindowHandle>,
    client_origin: Position,
    failing: AtomicBool,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            foreground: Some(WindowHandle(0x1000)),
            client_origin: Position::new(0, 0),
            failing: AtomicBool::new(false),
        }
    }

    /// Sets the foreground window; `None` simulates a desktop with no active window.
    pub fn with_foreground(mut self, window: Option<WindowHandle>) -> Self {
        self.foreground = window;
        self
    }

    /// Screen position of the client area's top-left corner.
    pub fn with_client_origin(mut self, origin: Position) -> Self {
        self.client_origin = origin;
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    pub fn events(&self) -> Vec<InputEvent> {
        self.events.lock().clone()
    }

    /// Number of button-down events, direct or message based.
    pub fn down_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| {
                matches!(
                    e.kind,
                    InputEventKind::Button { action: ButtonAction::Down, .. }
                        | InputEventKind::Message { action: ButtonAction::Down, .. }
                )
            })
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn record(&self, kind: InputEventKind) -> Result<()> {
        if self.failing.load(Ordering::Acquire) {
            return Err(ClickerError::injection("recording", "simulated OS failure"));
        }
        self.events.lock().push(InputEvent {
            kind,
            at: Instant::now(),
        });
        Ok(())
    }
}

impl InputBackend for RecordingBackend {
    fn move_cursor(&self, pos: Position) -> Result<()> {
        self.record(InputEventKind::CursorMoved(pos))
    }

    fn mouse_button(&self, action: ButtonAction, pos: Position) -> Result<()> {
        self.record(InputEventKind::Button { action, pos })
    }

    fn foreground_window(&self) -> Result<WindowHandle> {
        self.foreground
            .ok_or_else(|| ClickerError::window("no foreground window"))
    }

    fn screen_to_client(&self, _window: WindowHandle, pos: Position) -> Result<Position> {
        Ok(pos.offset(-self.client_origin.x, -self.client_origin.y))
    }

    fn button_message(
        &self,
        window: WindowHandle,
        action: ButtonAction,
        client: Position,
        delivery: Delivery,
    ) -> Result<()> {
        self.record(InputEventKind::Message {
            window,
            action,
            client,
            delivery,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_backend_records_in_order() {
        let backend = RecordingBackend::new();
        backend.move_cursor(Position::new(1, 2)).unwrap();
        backend
            .mouse_button(ButtonAction::Down, Position::new(1, 2))
            .unwrap();

        let events = backend.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, InputEventKind::CursorMoved(Position::new(1, 2)));
        assert_eq!(backend.down_count(), 1);
    }

    #[test]
    fn test_recording_backend_failure_mode() {
        let backend = RecordingBackend::new();
        backend.set_failing(true);
        assert!(backend.move_cursor(Position::new(0, 0)).is_err());
        assert!(backend.events().is_empty());
    }

    #[test]
    fn test_screen_to_client_uses_origin() {
        let backend = RecordingBackend::new().with_client_origin(Position::new(100, 50));
        let client = backend
            .screen_to_client(WindowHandle(1), Position::new(150, 80))
            .unwrap();
        assert_eq!(client, Position::new(50, 30));
    }

    #[test]
    fn test_missing_foreground_window() {
        let backend = RecordingBackend::new().with_foreground(None);
        assert!(matches!(
            backend.foreground_window(),
            Err(ClickerError::Window(_))
        ));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_win32_backend_unsupported_off_windows() {
        let backend = Win32Backend::new();
        assert!(matches!(
            backend.move_cursor(Position::new(0, 0)),
            Err(ClickerError::UnsupportedPlatform(_))
        ));
    }
}
