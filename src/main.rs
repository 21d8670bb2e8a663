use anyhow::{Context, Result};
use auto_clicker::config::parse_duration;
use auto_clicker::status::{self, StatusEvent};
use auto_clicker::{
    ClickConfig, ClickController, ClickMethod, HotkeyAction, HotkeyManager, InputBackend,
    IntervalPreset, Position, ProcessFinder, RecordingBackend, Win32Backend, WindowHandle,
};
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "acp", version, about = "Automated clicking with humanized and window-message injection")]
struct Cli {
    /// JSON config file; flags below override its values
    #[arg(short, long)]
    config: Option<String>,

    /// Write the effective config to this file and exit
    #[arg(long)]
    save_config: Option<String>,

    /// Click position as "x,y" in screen pixels
    #[arg(short, long)]
    position: Option<Position>,

    /// Base interval between clicks (e.g. 500ms, 1s)
    #[arg(short, long, value_parser = parse_duration, conflicts_with = "preset")]
    interval: Option<Duration>,

    /// Named interval: slow (2s), normal (1s), fast (500ms), ultra (100ms)
    #[arg(long, value_enum)]
    preset: Option<IntervalPreset>,

    /// Injection method
    #[arg(short, long, value_enum)]
    method: Option<ClickMethod>,

    /// Click the exact position with a fixed press (direct input only)
    #[arg(long)]
    no_humanize: bool,

    /// Use the base interval without random variation
    #[arg(long)]
    no_random_interval: bool,

    /// Stop after this many successful clicks (0 = until stopped)
    #[arg(short = 'n', long)]
    count: Option<u64>,

    /// Target window handle for message methods (decimal or 0x hex)
    #[arg(long, conflicts_with = "target_process")]
    window: Option<WindowHandle>,

    /// Resolve the target window from a process name
    #[arg(long)]
    target_process: Option<String>,

    /// Hotkey that starts clicking
    #[arg(long)]
    start_hotkey: Option<String>,

    /// Hotkey that stops clicking
    #[arg(long)]
    stop_hotkey: Option<String>,

    /// Start clicking immediately instead of waiting for the start hotkey
    #[arg(long)]
    autostart: bool,

    /// Record clicks in memory instead of injecting them
    #[arg(long)]
    dry_run: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn build_config(&self) -> Result<ClickConfig> {
        let mut config = match &self.config {
            Some(path) => ClickConfig::from_file(path)?,
            None => ClickConfig::default(),
        };

        if let Some(position) = self.position {
            config.position = Some(position);
        }
        if let Some(preset) = self.preset {
            config.interval = preset.interval();
        }
        if let Some(interval) = self.interval {
            config.interval = interval;
        }
        if let Some(method) = self.method {
            config.method = method;
        }
        if self.no_humanize {
            config.humanize = false;
        }
        if self.no_random_interval {
            config.randomize_interval = false;
        }
        if let Some(count) = self.count {
            config.click_budget = count;
        }
        if let Some(window) = self.window {
            config.target_window = Some(window);
        }
        if let Some(name) = &self.target_process {
            let window = ProcessFinder::new()
                .find_process_window(name)?
                .with_context(|| format!("no visible window found for process '{}'", name))?;
            config.target_window = Some(window);
        }
        if let Some(key) = &self.start_hotkey {
            config.start_hotkey = key.clone();
        }
        if let Some(key) = &self.stop_hotkey {
            config.stop_hotkey = key.clone();
        }
        config.verbose |= self.verbose;

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "auto_clicker=debug,acp=debug"
    } else {
        "auto_clicker=info,acp=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn print_summary(config: &ClickConfig, dry_run: bool) {
    println!("{}", "Auto Clicker".bold().cyan());
    match config.position {
        Some(p) => println!("  Position:  {}", p.to_string().green()),
        None => println!("  Position:  {}", "not set (use --position x,y)".red()),
    }
    println!(
        "  Method:    {}{}",
        config.method,
        if config.method == ClickMethod::DirectInput && config.humanize {
            " (humanized)"
        } else {
            ""
        }
    );
    println!(
        "  Interval:  {:?}{} ({:.1} clicks/minute)",
        config.interval,
        if config.randomize_interval {
            " randomized"
        } else {
            ""
        },
        config.clicks_per_minute()
    );
    match config.budget() {
        Some(n) => println!("  Budget:    {} clicks", n),
        None => println!("  Budget:    unbounded"),
    }
    if let Some(window) = config.target_window {
        println!("  Window:    {}", window);
    }
    println!(
        "  Hotkeys:   {} start | {} stop",
        config.start_hotkey.to_uppercase().bold(),
        config.stop_hotkey.to_uppercase().bold()
    );
    if dry_run {
        println!("  {}", "Dry run: no input will be injected".yellow());
    }
}

fn print_status(event: &StatusEvent) {
    let text = event.to_string();
    let line = match event {
        StatusEvent::Error(_) => text.red().bold(),
        StatusEvent::Stopped => text.red(),
        StatusEvent::Finished | StatusEvent::Ready | StatusEvent::PositionSet(_) => text.green(),
        StatusEvent::Started | StatusEvent::Progress { .. } => text.yellow(),
    };
    println!("{}", line);
}

fn handle_action(controller: &ClickController, action: HotkeyAction) {
    match action {
        HotkeyAction::Start => {
            if let Err(e) = controller.start() {
                warn!(error = %e, "start refused");
            }
        }
        HotkeyAction::Stop => controller.stop(),
    }
}

/// Pumps this thread's Win32 message queue, where hotkey presses arrive.
#[cfg(windows)]
fn pump_messages() {
    use winapi::um::winuser::{DispatchMessageW, PeekMessageW, TranslateMessage, MSG, PM_REMOVE};

    unsafe {
        let mut msg: MSG = std::mem::zeroed();
        while PeekMessageW(&mut msg, std::ptr::null_mut(), 0, 0, PM_REMOVE) != 0 {
            TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}

#[cfg(not(windows))]
fn pump_messages() {}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.build_config()?;

    if let Some(path) = &cli.save_config {
        config.save_to_file(path)?;
        println!("{} {}", "Config saved to".green(), path);
        return Ok(());
    }

    print_summary(&config, cli.dry_run);

    let backend: Arc<dyn InputBackend> = if cli.dry_run {
        Arc::new(RecordingBackend::new())
    } else {
        Arc::new(Win32Backend::new())
    };

    let (status_tx, mut status_rx) = status::channel();
    let start_key = config.start_hotkey.clone();
    let stop_key = config.stop_hotkey.clone();
    let controller = ClickController::new(backend, config, status_tx);

    // Kept alive for the whole session; dropping it unregisters the keys.
    let hotkeys = match HotkeyManager::new().and_then(|mut m| {
        m.register_controls(&start_key, &stop_key)?;
        Ok(m)
    }) {
        Ok(manager) => Some(manager),
        Err(e) => {
            warn!(error = %e, "global hotkeys unavailable; use Ctrl+C to quit");
            None
        }
    };
    let mut hotkey_rx = match &hotkeys {
        Some(manager) => manager.spawn_listener(),
        None => mpsc::unbounded_channel().1,
    };

    print_status(&StatusEvent::Ready);
    if cli.autostart || hotkeys.is_none() {
        if let Err(e) = controller.start() {
            error!(error = %e, "cannot start clicking");
            if hotkeys.is_none() {
                return Err(e.into());
            }
        }
    }

    let mut pump = tokio::time::interval(Duration::from_millis(15));
    loop {
        tokio::select! {
            Some(event) = status_rx.recv() => {
                print_status(&event);
                if event == StatusEvent::Finished && hotkeys.is_none() {
                    break;
                }
            }
            Some(action) = hotkey_rx.recv() => handle_action(&controller, action),
            _ = tokio::signal::ctrl_c() => {
                controller.stop();
                break;
            }
            _ = pump.tick() => pump_messages(),
        }
    }

    controller.stop();
    let waiter = controller.clone();
    tokio::task::spawn_blocking(move || waiter.join()).await?;
    drop(hotkeys);
    Ok(())
}
