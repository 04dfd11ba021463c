//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `threatwatch watch`: interactive, auto-refreshing dashboard
//! - `threatwatch show <section>`: load one section once and print it
//! - `threatwatch detect`: submit a detection request
//! - `threatwatch delete <id>`: delete a threat and refresh dependent views
//! - `threatwatch samples`: list canned detection requests
//! - `threatwatch ping`: check backend reachability and local state
//! - `threatwatch beacon <url>`: fire the navigation beacon
//! - `threatwatch activity`: show the activity log
//! - `threatwatch config show|set|reset`: settings management

use std::io::BufRead;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use colored::Colorize;

use crate::activity::{self, ActivityEntry};
use crate::api::types::{DetectRequest, Severity};
use crate::api::{ApiGateway, UreqTransport};
use crate::beacon;
use crate::charts::TextSurface;
use crate::controller::{
    Command, Controller, ControllerContext, Event, Filters, InlineSpawner, Section, Spawner,
    ThreadSpawner, parse_line,
};
use crate::display::{Renderer, TerminalRenderer};
use crate::samples;
use crate::settings::{self, Settings, SettingsStore, store};

/// Upper bound on waiting for one-shot requests to finish.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Output format for the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

fn build_controller(spawner: Box<dyn Spawner>, renderer: Box<dyn Renderer>) -> Controller {
    Controller::new(ControllerContext {
        store: SettingsStore::open_default(),
        transport: Arc::new(UreqTransport::default()),
        spawner,
        renderer,
        surface: Box::new(TextSurface::new()),
        env_overrides: true,
    })
}

fn one_shot_controller() -> Controller {
    build_controller(
        Box::new(InlineSpawner),
        Box::new(TerminalRenderer::one_shot()),
    )
}

/// Effective settings: stored record plus environment overrides.
fn effective_settings() -> Settings {
    let mut settings = SettingsStore::open_default().load();
    settings::apply_env_overrides(&mut settings);
    settings
}

fn gateway() -> ApiGateway {
    ApiGateway::new(
        &effective_settings().api_base_url,
        Arc::new(UreqTransport::default()),
    )
}

/// Wait for outstanding requests and turn request failures into an error
/// exit. The failures themselves were already shown as notifications.
fn finish(mut controller: Controller) -> Result<()> {
    if !controller.settle(SETTLE_TIMEOUT) {
        bail!("timed out waiting for the backend");
    }
    if controller.had_errors() {
        bail!(
            "{} request(s) to {} failed",
            controller.failures(),
            controller.settings().api_base_url
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// threatwatch watch
// ---------------------------------------------------------------------------

/// Run the interactive dashboard until `quit` or end of input.
pub fn run_watch(section: Section) -> Result<()> {
    let mut controller = build_controller(
        Box::new(ThreadSpawner),
        Box::new(TerminalRenderer::interactive()),
    );
    spawn_input_reader(controller.sender())?;
    controller.start(section, Instant::now());
    controller.run();
    Ok(())
}

/// Read commands from stdin on a separate thread. End of input quits.
fn spawn_input_reader(events: Sender<Event>) -> Result<()> {
    thread::Builder::new()
        .name("threatwatch-input".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                match parse_line(&line) {
                    Ok(Some(command)) => {
                        if events.send(Event::Input(command)).is_err() {
                            return;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => eprintln!("{} {e:#}", "✗".red().bold()),
                }
            }
            let _ = events.send(Event::Input(Command::Quit));
        })
        .context("failed to start input thread")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// threatwatch show
// ---------------------------------------------------------------------------

/// Load `section` once and print it.
pub fn run_show(section: Section, severity: Option<Severity>, search: Option<String>) -> Result<()> {
    let mut filters = Filters::default();
    match section {
        Section::Alerts => filters.alert_severity = severity,
        Section::Logs => {
            filters.log_severity = severity;
            filters.log_search = search.unwrap_or_default();
        }
        _ if severity.is_some() || search.is_some() => {
            eprintln!(
                "{}",
                format!("Filters apply to alerts and logs only; ignored for {section}.").yellow()
            );
        }
        _ => {}
    }

    let mut controller = one_shot_controller();
    controller.set_filters(filters);
    controller.show(section);
    finish(controller)
}

// ---------------------------------------------------------------------------
// threatwatch detect | delete | samples
// ---------------------------------------------------------------------------

/// Submit a detection request (or a named sample) and print the results
/// with the refreshed dashboard.
pub fn run_detect(request: DetectRequest, sample: Option<&str>) -> Result<()> {
    if let Some(name) = sample {
        if samples::find(name).is_none() {
            bail!("unknown sample '{name}' (see `threatwatch samples`)");
        }
    } else if request == DetectRequest::default() {
        bail!("nothing to analyze: pass --sample or at least one request field");
    }

    let mut controller = one_shot_controller();
    match sample {
        Some(name) => controller.submit_sample(Some(name)),
        None => controller.detect(request),
    }
    finish(controller)
}

/// Delete a threat by id.
pub fn run_delete(id: &str) -> Result<()> {
    let mut controller = one_shot_controller();
    controller.delete_threat(id);
    finish(controller)
}

pub fn run_samples() -> Result<()> {
    println!("{}", "Detection Samples".bold().cyan());
    println!("{}", "=".repeat(60));
    for sample in &samples::SAMPLES {
        let request = serde_json::to_string(&sample.request())?;
        println!("  {:<6} {}", sample.key.bold(), sample.name);
        println!("         {}", truncate(&request, 70).dimmed());
    }
    println!();
    println!(
        "  {} threatwatch detect --sample <key>",
        "Usage:".dimmed()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// threatwatch ping
// ---------------------------------------------------------------------------

/// Check backend reachability and local state.
pub fn run_ping() -> Result<()> {
    println!("{}", "threatwatch Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let settings = effective_settings();
    print_health_item("API URL", true, &settings.api_base_url);

    let gateway = gateway();
    let backend_ok = match gateway.health() {
        Ok(health) => {
            let detail = match (&health.service, &health.version) {
                (Some(service), Some(version)) => {
                    format!("{} ({service} {version})", health.status)
                }
                _ => health.status.clone(),
            };
            print_health_item("Backend", true, &detail);
            true
        }
        Err(e) => {
            print_health_item("Backend", false, &e.to_string());
            false
        }
    };

    print_health_item(
        "Auto-refresh",
        settings.auto_refresh,
        &if settings.auto_refresh {
            format!("every {}ms", settings.refresh_interval_ms)
        } else {
            "off".to_string()
        },
    );

    let storage = store::storage_path();
    let storage_exists = storage.as_ref().map(|p| p.exists()).unwrap_or(false);
    print_health_item(
        "Settings file",
        storage_exists,
        &match storage {
            Some(path) if storage_exists => path.display().to_string(),
            Some(_) => "not saved yet (defaults in use)".to_string(),
            None => "no home directory".to_string(),
        },
    );

    let log_exists = activity::activity_log_path()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Activity log",
        log_exists,
        &if log_exists {
            format!("{} entries", activity::read_all_entries().len())
        } else {
            "no log file yet".to_string()
        },
    );

    if !backend_ok {
        bail!("backend at {} is not reachable", settings.api_base_url);
    }
    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<16} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// threatwatch beacon
// ---------------------------------------------------------------------------

pub fn run_beacon(url: &str, user_agent: &str) -> Result<()> {
    if beacon::report_navigation(&gateway(), url, user_agent) {
        println!("{} Beacon sent for {}", "✓".green().bold(), url);
    } else {
        println!(
            "{}",
            format!("Skipped {url}: only http(s) pages are reported").yellow()
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// threatwatch activity
// ---------------------------------------------------------------------------

/// Show the most recent `limit` activity records.
pub fn run_activity(limit: usize, format: OutputFormat) -> Result<()> {
    let entries = activity::read_all_entries();
    let recent = &entries[entries.len().saturating_sub(limit)..];

    if recent.is_empty() {
        println!("{}", "No activity recorded yet.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(recent)?),
        OutputFormat::Csv => print_activity_csv(recent),
        OutputFormat::Table => print_activity_table(recent),
    }
    Ok(())
}

fn print_activity_table(entries: &[ActivityEntry]) {
    println!("{}", "threatwatch Activity".bold().cyan());
    println!("{}", "=".repeat(78));
    for entry in entries {
        let level = match entry.level.as_str() {
            "error" => entry.level.red().bold(),
            "warn" => entry.level.yellow(),
            _ => entry.level.dimmed(),
        };
        let time = entry.timestamp.get(..19).unwrap_or(&entry.timestamp);
        println!(
            "  {} {:<5} {:<24} {}",
            time.dimmed(),
            level,
            entry.event,
            truncate(&entry.detail, 60)
        );
    }
}

fn print_activity_csv(entries: &[ActivityEntry]) {
    println!("timestamp,level,event,detail");
    for entry in entries {
        println!(
            "{},{},{},\"{}\"",
            entry.timestamp,
            entry.level,
            entry.event,
            entry.detail.replace('"', "\"\"")
        );
    }
}

// ---------------------------------------------------------------------------
// threatwatch config show | set | reset
// ---------------------------------------------------------------------------

/// Show the effective settings as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = effective_settings().to_toml()?;
    println!("{}", "Effective threatwatch Settings".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    match store::storage_path() {
        Some(path) if path.exists() => {
            println!("  {} {}", "✓".green(), path.display().to_string().dimmed())
        }
        Some(path) => println!(
            "  {} {}",
            "·".dimmed(),
            format!("{} (not found)", path.display()).dimmed()
        ),
        None => println!("  {} {}", "·".dimmed(), "no home directory".dimmed()),
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "THREATWATCH_* environment variables".dimmed()
    );
    Ok(())
}

/// Set a single settings value.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    SettingsStore::open_default().set_value(key, value)?;
    activity::info("settings.set", &format!("{key}={value}"));
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset settings to defaults.
pub fn run_config_reset() -> Result<()> {
    let defaults = SettingsStore::open_default().reset();
    activity::info("settings.reset", "");
    println!(
        "{} Settings reset to defaults (API URL {})",
        "✓".green().bold(),
        defaults.api_base_url
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Truncate to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("ab", 2), "ab");
        assert_eq!(truncate("ééééé", 3), "éé…");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Csv);
        assert_eq!(
            OutputFormat::from_str_opt(Some("unknown")),
            OutputFormat::Table
        );
    }

    #[test]
    fn detect_rejects_empty_request_before_any_io() {
        let err = run_detect(DetectRequest::default(), None).unwrap_err();
        assert!(err.to_string().contains("nothing to analyze"));

        let err = run_detect(DetectRequest::default(), Some("ransomware")).unwrap_err();
        assert!(err.to_string().contains("unknown sample"));
    }
}
