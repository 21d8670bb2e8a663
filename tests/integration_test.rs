use anyhow::Result;
use auto_clicker::backend::{ButtonAction, InputEventKind};
use auto_clicker::config::{parse_duration, MsRange};
use auto_clicker::status::{self, StatusEvent};
use auto_clicker::{
    ClickConfig, ClickController, ClickMethod, ClickerError, JitterRanges, Position,
    RecordingBackend, StartOutcome, Strategy, WindowHandle,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

#[test]
fn test_full_config() {
    let json = r#"
    {
        "position": { "x": 640, "y": 480 },
        "method": "post-message",
        "humanize": false,
        "randomize_interval": false,
        "interval": "250ms",
        "click_budget": 25,
        "target_window": 4660,
        "start_hotkey": "ctrl+f6",
        "stop_hotkey": "ctrl+f7",
        "verbose": true
    }
    "#;

    let config: ClickConfig = serde_json::from_str(json).unwrap();

    assert_eq!(config.position, Some(Position::new(640, 480)));
    assert_eq!(config.method, ClickMethod::PostMessage);
    assert!(!config.humanize);
    assert!(!config.randomize_interval);
    assert_eq!(config.interval, Duration::from_millis(250));
    assert_eq!(config.click_budget, 25);
    assert_eq!(config.target_window, Some(WindowHandle(4660)));
    assert_eq!(config.start_hotkey, "ctrl+f6");
    assert_eq!(config.stop_hotkey, "ctrl+f7");
    assert!(config.verbose);
    assert_eq!(config.jitter, JitterRanges::default());

    assert!(config.validate().is_ok());
}

#[test]
fn test_default_values() {
    let config: ClickConfig = serde_json::from_str("{}").unwrap();

    assert_eq!(config.position, None);
    assert_eq!(config.method, ClickMethod::DirectInput);
    assert!(config.humanize);
    assert!(config.randomize_interval);
    assert_eq!(config.interval, Duration::from_secs(1));
    assert_eq!(config.click_budget, 0);
    assert_eq!(config.start_hotkey, "f6");
    assert_eq!(config.stop_hotkey, "f7");

    let jitter = config.jitter;
    assert_eq!(jitter.position_px, 2);
    assert_eq!(jitter.reaction_ms, MsRange::new(1, 3));
    assert_eq!(jitter.press_ms, MsRange::new(10, 50));
    assert_eq!(jitter.simple_press_ms, 10);
    assert_eq!(jitter.interval_factor.min, 0.5);
    assert_eq!(jitter.interval_factor.max, 1.5);

    // A missing position is a start-time error, not a config error
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_jitter_override() {
    let json = r#"
    {
        "jitter": { "position_px": 5, "press_ms": { "min": 20, "max": 30 } }
    }
    "#;

    let config: ClickConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.jitter.position_px, 5);
    assert_eq!(config.jitter.press_ms, MsRange::new(20, 30));
    assert_eq!(config.jitter.reaction_ms, MsRange::new(1, 3));
}

#[test]
fn test_invalid_interval_rejected_on_load() {
    let json = r#"{ "interval": "soon" }"#;
    assert!(serde_json::from_str::<ClickConfig>(json).is_err());
}

#[test]
fn test_config_file_operations() -> Result<()> {
    let mut temp_file = NamedTempFile::new()?;
    temp_file.write_all(
        br#"{ "position": { "x": 10, "y": 20 }, "interval": "2s", "click_budget": 3 }"#,
    )?;

    let config = ClickConfig::from_file(temp_file.path().to_str().unwrap())?;
    assert_eq!(config.position, Some(Position::new(10, 20)));
    assert_eq!(config.interval, Duration::from_secs(2));
    assert_eq!(config.click_budget, 3);

    Ok(())
}

#[test]
fn test_missing_config_file() {
    let err = ClickConfig::from_file("/nonexistent/dir/clicker.json").unwrap_err();
    assert!(matches!(err, ClickerError::ConfigLoad { .. }));
}

#[test]
fn test_config_save_load_roundtrip() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let config_path = temp_dir.path().join("clicker.json");

    let original = ClickConfig {
        position: Some(Position::new(-100, 300)),
        method: ClickMethod::SendMessage,
        humanize: false,
        randomize_interval: true,
        interval: Duration::from_millis(1500),
        click_budget: 50,
        target_window: Some(WindowHandle(0xABCD)),
        start_hotkey: "ctrl+shift+s".to_string(),
        stop_hotkey: "ctrl+shift+x".to_string(),
        ..Default::default()
    };

    original.save_to_file(config_path.to_str().unwrap())?;
    let loaded = ClickConfig::from_file(config_path.to_str().unwrap())?;

    assert_eq!(loaded, original);
    Ok(())
}

#[test]
fn test_duration_parsing_edge_cases() {
    assert_eq!(parse_duration("0ms").unwrap(), Duration::from_millis(0));
    assert_eq!(parse_duration("100").unwrap(), Duration::from_millis(100));
    assert_eq!(parse_duration("5S").unwrap(), Duration::from_secs(5));
    assert_eq!(parse_duration(" 2m ").unwrap(), Duration::from_secs(120));

    assert!(parse_duration("").is_err());
    assert!(parse_duration("abc").is_err());
    assert!(parse_duration("1000x").is_err());
    assert!(parse_duration("-1000ms").is_err());
}

#[test]
fn test_manual_position_entry() {
    assert_eq!("800,600".parse::<Position>().unwrap(), Position::new(800, 600));

    let err = "eight hundred,600".parse::<Position>().unwrap_err();
    assert!(matches!(err, ClickerError::InvalidPosition { .. }));
}

// Strategy properties against the recording backend

const ALL_STRATEGIES: [Strategy; 4] = [
    Strategy::HumanizedDirectInput,
    Strategy::SimpleDirectInput,
    Strategy::SyncMessage,
    Strategy::AsyncMessage,
];

fn is_down(kind: &InputEventKind) -> bool {
    matches!(
        kind,
        InputEventKind::Button { action: ButtonAction::Down, .. }
            | InputEventKind::Message { action: ButtonAction::Down, .. }
    )
}

fn is_up(kind: &InputEventKind) -> bool {
    matches!(
        kind,
        InputEventKind::Button { action: ButtonAction::Up, .. }
            | InputEventKind::Message { action: ButtonAction::Up, .. }
    )
}

#[test]
fn test_every_strategy_issues_one_down_then_one_up() {
    let jitter = JitterRanges::default();
    let mut rng = StdRng::seed_from_u64(1);

    for strategy in ALL_STRATEGIES {
        for target in [Position::new(0, 0), Position::new(1920, 1080), Position::new(-50, 75)] {
            let backend = RecordingBackend::new();
            assert!(
                strategy.click(&backend, target, None, &jitter, &mut rng),
                "{} failed",
                strategy
            );

            let events = backend.events();
            let downs: Vec<_> = events.iter().filter(|e| is_down(&e.kind)).collect();
            let ups: Vec<_> = events.iter().filter(|e| is_up(&e.kind)).collect();
            assert_eq!(downs.len(), 1, "{}", strategy);
            assert_eq!(ups.len(), 1, "{}", strategy);

            let down_idx = events.iter().position(|e| is_down(&e.kind)).unwrap();
            let up_idx = events.iter().position(|e| is_up(&e.kind)).unwrap();
            assert!(down_idx < up_idx);
            assert!(ups[0].at >= downs[0].at);
        }
    }
}

#[test]
fn test_humanized_offsets_and_press_stay_in_range() {
    let jitter = JitterRanges::default();
    let backend = RecordingBackend::new();
    let target = Position::new(500, 500);
    let mut rng = StdRng::seed_from_u64(99);

    for _ in 0..40 {
        backend.clear();
        let outcome = Strategy::HumanizedDirectInput
            .try_click(&backend, target, None, &jitter, &mut rng)
            .unwrap();

        assert!((outcome.screen.x - target.x).abs() <= 2);
        assert!((outcome.screen.y - target.y).abs() <= 2);
        assert!(outcome.press >= Duration::from_millis(10));
        assert!(outcome.press <= Duration::from_millis(50));

        let events = backend.events();
        let down = events.iter().find(|e| is_down(&e.kind)).unwrap();
        let up = events.iter().find(|e| is_up(&e.kind)).unwrap();
        assert!(up.at.duration_since(down.at) >= outcome.press);
    }
}

#[test]
fn test_message_strategy_without_window_fails_softly() {
    let backend = RecordingBackend::new().with_foreground(None);
    let mut rng = StdRng::seed_from_u64(3);
    assert!(!Strategy::AsyncMessage.click(
        &backend,
        Position::new(10, 10),
        None,
        &JitterRanges::default(),
        &mut rng,
    ));
}

// Controller behaviour

fn clicker(config: ClickConfig) -> (ClickController, Arc<RecordingBackend>, status::StatusReceiver) {
    let backend = Arc::new(RecordingBackend::new());
    let (tx, rx) = status::channel();
    (ClickController::new(backend.clone(), config, tx), backend, rx)
}

fn quick_config() -> ClickConfig {
    ClickConfig {
        position: Some(Position::new(100, 100)),
        humanize: false,
        randomize_interval: false,
        interval: Duration::from_millis(5),
        ..Default::default()
    }
}

#[test]
fn test_budget_is_exact() {
    for budget in [1u64, 4, 7] {
        let (controller, backend, mut rx) = clicker(ClickConfig {
            click_budget: budget,
            ..quick_config()
        });

        controller.start().unwrap();
        controller.join();

        assert_eq!(controller.clicks_done(), budget);
        assert_eq!(backend.down_count() as u64, budget);
        assert!(!controller.is_running());

        let mut last_done = 0;
        while let Ok(event) = rx.try_recv() {
            if let StatusEvent::Progress { done, budget: Some(total) } = event {
                assert!(done <= total);
                assert!(done >= last_done);
                last_done = done;
            }
        }
        assert_eq!(last_done, budget);
    }
}

#[test]
fn test_unbounded_run_until_stop() {
    let (controller, backend, _rx) = clicker(ClickConfig {
        interval: Duration::from_millis(15),
        ..quick_config()
    });

    controller.start().unwrap();
    thread::sleep(Duration::from_millis(150));
    assert!(controller.is_running());

    controller.stop();
    let at_stop = backend.down_count();
    controller.join();

    assert!(!controller.is_running());
    assert!(at_stop > 1);
    // at most the in-flight iteration finishes after stop
    assert!(backend.down_count() <= at_stop + 1);
}

#[test]
fn test_restart_resets_click_count() {
    let (controller, _backend, _rx) = clicker(ClickConfig {
        click_budget: 2,
        ..quick_config()
    });

    controller.start().unwrap();
    controller.join();
    assert_eq!(controller.clicks_done(), 2);

    controller.update_config(|c| c.click_budget = 1);
    assert_eq!(controller.start().unwrap(), StartOutcome::Started);
    controller.join();
    assert_eq!(controller.clicks_done(), 1);
}

#[test]
fn test_start_without_position_reports_error() {
    let (controller, backend, mut rx) = clicker(ClickConfig {
        position: None,
        ..quick_config()
    });

    assert!(matches!(controller.start(), Err(ClickerError::NoPosition)));
    assert!(!controller.is_running());
    assert_eq!(backend.down_count(), 0);
    assert!(matches!(rx.try_recv(), Ok(StatusEvent::Error(_))));
}

#[test]
fn test_randomized_interval_spacing() {
    let base = Duration::from_millis(20);
    let (controller, backend, _rx) = clicker(ClickConfig {
        randomize_interval: true,
        interval: base,
        click_budget: 8,
        ..quick_config()
    });

    let started = Instant::now();
    controller.start().unwrap();
    controller.join();

    let downs: Vec<Instant> = backend
        .events()
        .iter()
        .filter(|e| is_down(&e.kind))
        .map(|e| e.at)
        .collect();
    assert_eq!(downs.len(), 8);

    // each gap is the fixed 10ms press plus at least half the base interval
    for pair in downs.windows(2) {
        assert!(pair[1].duration_since(pair[0]) >= Duration::from_millis(10) + base / 2);
    }
    assert!(started.elapsed() >= base / 2 * 7);
}
