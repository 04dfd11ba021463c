//! Terminal presentation of the dashboard.
//!
//! The controller hands a [`RenderContext`] to a [`Renderer`] whenever the
//! visible state settles. [`TerminalRenderer`] prints it with `colored`;
//! [`NullRenderer`] discards it.

use colored::{ColoredString, Colorize};

use crate::api::types::Severity;
use crate::charts::{ChartRegistry, ChartSlot};
use crate::controller::{DashboardState, HELP, Section};
use crate::settings::Settings;
use crate::views::{
    DetectionView, HealthSlot, Listing, Notification, NotificationKind, Placeholder, ThreatEntry,
    format_rate,
};

/// Borrowed snapshot of everything a renderer may show.
pub struct RenderContext<'a> {
    pub section: Section,
    pub settings: &'a Settings,
    /// Whether the poll schedule is active.
    pub polling: bool,
    pub state: &'a DashboardState,
    pub charts: &'a ChartRegistry,
}

pub trait Renderer {
    fn render(&mut self, ctx: &RenderContext<'_>);
    fn notify(&mut self, notification: &Notification);
    fn help(&mut self) {}
}

/// Renders nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _ctx: &RenderContext<'_>) {}
    fn notify(&mut self, _notification: &Notification) {}
}

/// Prints sections to stdout and notifications to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalRenderer {
    /// Clear the screen before each render (interactive mode).
    pub clear_screen: bool,
}

impl TerminalRenderer {
    pub fn interactive() -> Self {
        Self { clear_screen: true }
    }

    pub fn one_shot() -> Self {
        Self {
            clear_screen: false,
        }
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, ctx: &RenderContext<'_>) {
        if self.clear_screen {
            print!("\x1B[2J\x1B[H");
        }
        print_header(ctx);
        match ctx.section {
            Section::Dashboard => print_dashboard(ctx.state),
            Section::Analytics => print_analytics(ctx.state, ctx.charts),
            Section::Alerts => print_alerts(ctx.state),
            Section::Logs => print_logs(ctx.state),
            Section::Settings => print_settings(ctx.settings, ctx.polling),
        }
        if self.clear_screen {
            println!();
            println!("{}", "Type 'help' for commands.".dimmed());
        }
    }

    fn notify(&mut self, notification: &Notification) {
        eprintln!("{}", format_notification(notification));
    }

    fn help(&mut self) {
        println!("{}", "Commands".bold().cyan());
        for (usage, what) in HELP {
            println!("  {:<50} {}", usage, what.dimmed());
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

fn print_header(ctx: &RenderContext<'_>) {
    println!(
        "{} {}",
        format!("Threat Detection · {}", ctx.section.title()).bold().cyan(),
        ctx.settings.api_base_url.dimmed()
    );
    println!("{}", "=".repeat(60));
}

fn print_dashboard(state: &DashboardState) {
    match &state.stats {
        Some(stats) => {
            println!(
                "  {} {}   {} {}   {} {}   {} {}",
                "Total threats:".bold(),
                stats.total_threats,
                "Active alerts:".bold(),
                stats.active_alerts,
                "Threats today:".bold(),
                stats.threats_today,
                "Avg response:".bold(),
                stats.avg_response,
            );
        }
        None => println!("  {}", "Stats not loaded".dimmed()),
    }
    println!();

    println!("{}", "System Health".bold().cyan());
    for slot in HealthSlot::ALL {
        let status = state.health.status(slot);
        println!("  {:<20} {}", slot.label(), colorize_status(status));
    }
    println!();

    println!("{}", "Recent Threats".bold().cyan());
    match &state.feed {
        Some(Listing::Entries(entries)) => {
            for entry in entries {
                println!(
                    "  {} {} {}",
                    "▲".yellow(),
                    entry.description,
                    format!("({})", entry.time).dimmed()
                );
            }
        }
        Some(Listing::Placeholder(placeholder)) => print_placeholder(placeholder),
        None => println!("  {}", "Loading…".dimmed()),
    }

    if let Some(detection) = &state.detection {
        println!();
        print_detection(detection);
    }
}

fn print_analytics(state: &DashboardState, charts: &ChartRegistry) {
    for slot in ChartSlot::ALL {
        let mut lines = charts.draw(slot).into_iter();
        if let Some(title) = lines.next() {
            println!("{}", title.bold().cyan());
        }
        for line in lines {
            println!("{line}");
        }
        println!();
    }

    println!("{}", "Real-time Metrics".bold().cyan());
    match &state.metrics {
        Some(m) => {
            println!("  {:<22} {}", "Threats / minute", format_rate(m.threats_per_minute));
            println!("  {:<22} {}", "Requests / minute", format_rate(m.requests_per_minute));
            println!("  {:<22} {}%", "Avg confidence", m.avg_confidence_pct);
            println!("  {:<22} {}", "Uptime", m.uptime);
        }
        None => println!("  {}", "Loading…".dimmed()),
    }
}

fn print_alerts(state: &DashboardState) {
    print_filter("Severity", state.filters.alert_severity);
    match &state.alerts {
        Some(Listing::Entries(alerts)) => {
            for alert in alerts {
                println!(
                    "  {} {} {}",
                    colorize_severity(alert.severity),
                    alert.title.bold(),
                    format!("({})", alert.time).dimmed()
                );
                println!("      {}", alert.description);
            }
        }
        Some(Listing::Placeholder(placeholder)) => print_placeholder(placeholder),
        None => println!("  {}", "Loading…".dimmed()),
    }
}

fn print_logs(state: &DashboardState) {
    print_filter("Severity", state.filters.log_severity);
    if !state.filters.log_search.is_empty() {
        println!("  {} {}", "Search:".dimmed(), state.filters.log_search);
    }
    match &state.logs {
        Some(Listing::Placeholder(placeholder)) => print_placeholder(placeholder),
        Some(Listing::Entries(_)) => {
            let visible = state.visible_logs();
            if visible.is_empty() {
                println!(
                    "  {}",
                    format!("No entries match '{}'", state.filters.log_search).yellow()
                );
            }
            for entry in visible {
                print_threat(entry, true);
            }
        }
        None => println!("  {}", "Loading…".dimmed()),
    }
}

fn print_settings(settings: &Settings, polling: bool) {
    println!("  {:<20} {}", "API URL".bold(), settings.api_base_url);
    println!(
        "  {:<20} {}ms",
        "Refresh interval".bold(),
        settings.refresh_interval_ms
    );
    println!(
        "  {:<20} {}",
        "Auto-refresh".bold(),
        if settings.auto_refresh {
            "on".green()
        } else {
            "off".yellow()
        }
    );
    println!("  {:<20} {}", "Max log entries".bold(), settings.max_log_entries);
    println!(
        "  {:<20} {}",
        "Polling".bold(),
        if polling { "active".green() } else { "stopped".dimmed() }
    );
}

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

/// Print the results panel of a detection request.
pub fn print_detection(detection: &DetectionView) {
    println!(
        "{} {}",
        "Detection Results".bold().cyan(),
        format!("[{}]", detection.badge).bold()
    );
    match &detection.results {
        Listing::Entries(entries) => {
            for entry in entries {
                print_threat(entry, false);
            }
        }
        Listing::Placeholder(placeholder) => print_placeholder(placeholder),
    }
}

fn print_threat(entry: &ThreatEntry, with_time: bool) {
    let id = if entry.id.is_empty() {
        String::new()
    } else {
        format!("#{}", entry.id)
    };
    println!(
        "  {} {} {}",
        colorize_severity(entry.severity),
        entry.threat_type.bold(),
        id.dimmed()
    );
    println!("      {}", entry.description);
    if let Some(note) = entry.annotation {
        println!("      {}", note.magenta());
    }
    let mut meta = format!(
        "Confidence: {}%  Method: {}  Source: {}",
        entry.confidence_pct, entry.method, entry.source
    );
    if with_time {
        meta.push_str(&format!("  Time: {}", entry.time));
    }
    println!("      {}", meta.dimmed());
}

fn print_placeholder(placeholder: &Placeholder) {
    match placeholder.badge {
        Some(badge) => println!(
            "  {} {}",
            placeholder.title.bold(),
            format!("[{badge}]").green()
        ),
        None => println!("  {}", placeholder.title.bold()),
    }
    println!("      {}", placeholder.message.dimmed());
    for meta in placeholder.meta {
        println!("      {}", meta.dimmed());
    }
}

fn print_filter(label: &str, severity: Option<Severity>) {
    let value = severity.map_or("all", Severity::as_str);
    println!("  {} {}", format!("{label}:").dimmed(), value);
    println!();
}

pub fn format_notification(notification: &Notification) -> String {
    let icon = match notification.kind {
        NotificationKind::Success => "✓".green().bold(),
        NotificationKind::Error => "✗".red().bold(),
        NotificationKind::Warning => "!".yellow().bold(),
        NotificationKind::Info => "i".blue().bold(),
    };
    format!("{icon} {}", notification.message)
}

pub fn colorize_severity(severity: Severity) -> ColoredString {
    let label = format!("{:<8}", severity.as_str());
    match severity {
        Severity::Critical => label.red().bold(),
        Severity::High => label.red(),
        Severity::Medium => label.yellow(),
        Severity::Low => label.green(),
        Severity::Info => label.blue(),
        Severity::Unknown => label.normal(),
    }
}

fn colorize_status(status: &str) -> ColoredString {
    match status {
        "healthy" | "ok" | "active" => status.green(),
        "warning" | "degraded" => status.yellow(),
        "critical" | "error" | "down" => status.red(),
        _ => status.dimmed(),
    }
}
