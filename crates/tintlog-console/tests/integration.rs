//! Integration tests for tintlog-console component interoperability.
//!
//! These tests drive records through detection, rendering and a sink:
//! - Environment detection choosing the render path
//! - Presets and themes producing distinct output per target
//! - TestConsole capture of what a terminal would receive

use tintlog_console::color::ColorCapability;
use tintlog_console::console::ConsoleSink;
use tintlog_console::detection::{OutputMode, OutputTarget, StaticEnvironment};
use tintlog_console::render::{Preset, RenderSettings, Renderer};
use tintlog_console::style::{Part, StyleConfig};
use tintlog_console::testing::TestConsole;
use tintlog_console::theme::Theme;
use tintlog_core::{Level, LogRecord, SourceLocation, Value};

fn no_timestamp() -> RenderSettings {
    RenderSettings {
        style: StyleConfig::default().show(Part::Timestamp, false),
        ..RenderSettings::default()
    }
}

fn emit(console: &TestConsole, renderer: &Renderer, settings: &RenderSettings, target: OutputTarget, record: &LogRecord) {
    let rendered = renderer.render(record, settings, target);
    console.emit(record.level, &rendered);
}

// ============================================================================
// Detection-Renderer Integration Tests
// ============================================================================

#[test]
fn test_truecolor_terminal_gets_24bit_codes() {
    let env = StaticEnvironment::truecolor_terminal();
    let target = OutputTarget::resolve(OutputMode::Auto, &env);
    assert_eq!(target, OutputTarget::Ansi(ColorCapability::Full));

    let tc = TestConsole::new();
    emit(&tc, &Renderer::new(), &no_timestamp(), target, &LogRecord::new(Level::Error, "disk full"));

    assert!(tc.raw_output()[0].contains("\x1b[38;2;"));
    assert_eq!(tc.output(), vec!["ERROR disk full".to_string()]);
}

#[test]
fn test_piped_output_is_plain() {
    let env = StaticEnvironment::new().terminal(false);
    let target = OutputTarget::resolve(OutputMode::Auto, &env);
    assert_eq!(target, OutputTarget::Plain);

    let tc = TestConsole::new();
    emit(&tc, &Renderer::new(), &no_timestamp(), target, &LogRecord::new(Level::Warn, "slow query"));
    assert_eq!(tc.raw_output(), tc.output());
}

#[test]
fn test_no_color_overrides_truecolor_hints() {
    let env = StaticEnvironment::truecolor_terminal().with_var("NO_COLOR", "1");
    assert_eq!(OutputTarget::resolve(OutputMode::Auto, &env), OutputTarget::Plain);
    assert_eq!(
        OutputTarget::resolve(OutputMode::Basic, &env),
        OutputTarget::Ansi(ColorCapability::Basic)
    );
}

#[test]
fn test_browser_output_keeps_css_args() {
    let env = StaticEnvironment::new().browser(true);
    let target = OutputTarget::resolve(OutputMode::Auto, &env);

    let tc = TestConsole::new();
    let record = LogRecord::new(Level::Info, "loaded 3 of 4").with_prefix("ui");
    emit(&tc, &Renderer::new(), &no_timestamp(), target, &record);

    let rendered = &tc.rendered()[0];
    assert_eq!(rendered.format.matches("%c").count(), rendered.style_args.len());
    assert!(rendered.style_args.iter().any(|css| css.contains("border-radius")));
    tc.assert_contains("INFO  [ui] loaded 3 of 4");
}

// ============================================================================
// Preset-Theme Integration Tests
// ============================================================================

#[test]
fn test_production_preset_hides_prefix_and_location() {
    let settings = RenderSettings {
        preset: Some(Preset::Production),
        ..RenderSettings::default()
    };
    let record = LogRecord::new(Level::Info, "request served")
        .with_prefix("http")
        .with_location(SourceLocation::new("src/server.rs", 10, 4));

    let tc = TestConsole::new();
    emit(&tc, &Renderer::new(), &settings, OutputTarget::Plain, &record);

    tc.assert_contains("request served");
    tc.assert_not_contains("[http]");
    tc.assert_not_contains("src/server.rs");
}

#[test]
fn test_debug_preset_shows_location() {
    let settings = RenderSettings {
        preset: Some(Preset::Debug),
        ..no_timestamp()
    };
    let record = LogRecord::new(Level::Debug, "cache miss")
        .with_location(SourceLocation::new("src/cache.rs", 88, 12));

    let tc = TestConsole::new();
    emit(&tc, &Renderer::new(), &settings, OutputTarget::Ansi(ColorCapability::Basic), &record);
    tc.assert_contains("src/cache.rs:88:12");
}

#[test]
fn test_every_theme_renders_every_level() {
    let renderer = Renderer::new();
    let tc = TestConsole::new();
    for name in Theme::NAMES {
        let settings = RenderSettings {
            theme: Theme::by_name(name),
            ..no_timestamp()
        };
        for level in Level::ALL {
            let record = LogRecord::new(level, format!("{name} sample"));
            emit(&tc, &renderer, &settings, OutputTarget::Ansi(ColorCapability::Full), &record);
        }
    }
    tc.assert_line_count(Theme::NAMES.len() * Level::ALL.len());
    assert!(tc.contains_all(&["dracula sample", "CRITICAL", "DEBUG"]));
    assert_eq!(renderer.cache_stats().size, Theme::NAMES.len() * Level::ALL.len());
}

#[test]
fn test_unknown_theme_falls_back_to_default() {
    assert_eq!(Theme::by_name("no-such-theme"), Theme::default());
}

// ============================================================================
// Cache Behavior Tests
// ============================================================================

#[test]
fn test_repeated_shape_hits_cache_but_text_varies() {
    let renderer = Renderer::new();
    let tc = TestConsole::new();
    let settings = no_timestamp();
    for i in 0..10 {
        let record = LogRecord::new(Level::Info, format!("tick {i}"))
            .with_arg(Value::from(i));
        emit(&tc, &renderer, &settings, OutputTarget::Plain, &record);
    }
    let stats = renderer.cache_stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 9);
    assert!(tc.output().iter().any(|line| line.ends_with("tick 7 7")));
}

#[test]
fn test_output_mode_deserializes_from_config_names() {
    let mode: OutputMode = serde_json::from_str("\"full\"").unwrap();
    assert_eq!(mode, OutputMode::TrueColor);
    let mode: OutputMode = serde_json::from_str("\"plain\"").unwrap();
    assert_eq!(mode, OutputMode::Plain);
}
