//! Resolving a target window from a process name.
//!
//! The message strategies click into a specific window. Instead of a raw
//! handle the user can name a process; [`ProcessFinder`] finds it with
//! `sysinfo` and returns its first visible top-level window.

use crate::position::WindowHandle;
use anyhow::Result;
use sysinfo::{Pid, ProcessesToUpdate, System};

/// Finds processes by name and maps them to window handles.
///
/// # Example
///
/// ```no_run
/// use auto_clicker::ProcessFinder;
///
/// let mut finder = ProcessFinder::new();
/// match finder.find_process_window("notepad") {
///     Ok(Some(window)) => println!("Clicking into window {}", window),
///     Ok(None) => println!("No visible window for that process"),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub struct ProcessFinder {
    system: System,
}

impl Default for ProcessFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessFinder {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    /// PIDs of every running process whose name contains `process_name`,
    /// compared case-insensitively.
    pub fn find_pids(&mut self, process_name: &str) -> Vec<Pid> {
        self.system.refresh_processes(ProcessesToUpdate::All, true);

        let needle = process_name.to_lowercase();
        let mut pids: Vec<Pid> = self
            .system
            .processes()
            .iter()
            .filter(|(_, process)| {
                process
                    .name()
                    .to_string_lossy()
                    .to_lowercase()
                    .contains(&needle)
            })
            .map(|(pid, _)| *pid)
            .collect();
        pids.sort();
        pids
    }

    /// First visible top-level window owned by a matching process.
    pub fn find_process_window(&mut self, process_name: &str) -> Result<Option<WindowHandle>> {
        let pids = self.find_pids(process_name);
        if pids.is_empty() {
            return Ok(None);
        }

        for pid in pids {
            if let Some(window) = top_level_window(pid.as_u32())? {
                tracing::debug!(process = process_name, pid = pid.as_u32(), %window, "resolved target window");
                return Ok(Some(window));
            }
        }
        Ok(None)
    }
}

#[cfg(windows)]
fn top_level_window(pid: u32) -> Result<Option<WindowHandle>> {
    use winapi::shared::minwindef::{BOOL, DWORD, FALSE, LPARAM, TRUE};
    use winapi::shared::windef::HWND;
    use winapi::um::winuser::{self, GW_OWNER};

    struct Search {
        pid: DWORD,
        found: Option<WindowHandle>,
    }

    unsafe extern "system" fn visit(hwnd: HWND, lparam: LPARAM) -> BOOL {
        let search = &mut *(lparam as *mut Search);
        let mut owner_pid: DWORD = 0;
        winuser::GetWindowThreadProcessId(hwnd, &mut owner_pid);

        let is_main = winuser::IsWindowVisible(hwnd) != 0
            && winuser::GetWindow(hwnd, GW_OWNER).is_null();
        if owner_pid == search.pid && is_main {
            search.found = Some(WindowHandle(hwnd as usize as u64));
            return FALSE;
        }
        TRUE
    }

    let mut search = Search { pid, found: None };
    // EnumWindows reports failure when the callback stops early, so only the
    // search result matters.
    unsafe {
        winuser::EnumWindows(Some(visit), &mut search as *mut Search as LPARAM);
    }
    Ok(search.found)
}

#[cfg(not(windows))]
fn top_level_window(_pid: u32) -> Result<Option<WindowHandle>> {
    Err(crate::error::ClickerError::unsupported_platform(
        "window lookup by process requires Windows",
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonexistent_process() {
        let mut finder = ProcessFinder::new();
        let result = finder.find_process_window("nonexistent_process_xyz_123456");
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_finds_own_process() {
        let mut finder = ProcessFinder::default();
        let me = std::process::id();
        let exe = std::env::current_exe().unwrap();
        let name = exe.file_stem().unwrap().to_string_lossy().to_string();
        // sysinfo truncates names on some platforms
        let prefix: String = name.chars().take(8).collect();
        let pids = finder.find_pids(&prefix);
        assert!(pids.iter().any(|p| p.as_u32() == me));
    }
}
