use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use threatwatch::api::types::{DetectRequest, Severity};
use threatwatch::cli;
use threatwatch::controller::Section;

const DEFAULT_USER_AGENT: &str = concat!("threatwatch/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Parser)]
#[command(name = "threatwatch")]
#[command(about = "Terminal dashboard for an AI threat-detection backend")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Interactive dashboard with auto-refresh; type `help` for commands
    Watch {
        /// Section to open: dashboard, analytics, alerts, logs, settings
        #[arg(long, default_value = "dashboard")]
        section: Section,
    },
    /// Load one section once and print it
    Show {
        /// dashboard, analytics, alerts, logs or settings
        section: Section,
        /// Severity filter for alerts and logs
        #[arg(long)]
        severity: Option<Severity>,
        /// Text filter for logs
        #[arg(long)]
        search: Option<String>,
    },
    /// Submit traffic for threat analysis
    Detect(DetectArgs),
    /// Delete a logged threat by id
    Delete { id: String },
    /// List canned detection samples
    Samples,
    /// Check backend reachability and local state
    Ping,
    /// Report a visited page to the backend (fire-and-forget)
    Beacon {
        url: String,
        #[arg(long, default_value = DEFAULT_USER_AGENT)]
        user_agent: String,
    },
    /// Show recent activity log entries
    Activity {
        /// Number of entries to show
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Manage settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective settings
    Show,
    /// Set one value: api_url, refresh_interval, auto_refresh, max_logs
    Set { key: String, value: String },
    /// Restore the defaults
    Reset,
}

#[derive(Debug, Args)]
struct DetectArgs {
    /// Use a canned sample (see `threatwatch samples`)
    #[arg(long, conflicts_with_all = ["source_ip", "dest_ip", "port", "protocol", "user_agent", "url", "message"])]
    sample: Option<String>,
    #[arg(long)]
    source_ip: Option<String>,
    #[arg(long)]
    dest_ip: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    protocol: Option<String>,
    #[arg(long)]
    user_agent: Option<String>,
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    message: Option<String>,
}

impl DetectArgs {
    fn request(&self) -> DetectRequest {
        DetectRequest {
            source_ip: self.source_ip.clone(),
            dest_ip: self.dest_ip.clone(),
            port: self.port,
            protocol: self.protocol.clone(),
            user_agent: self.user_agent.clone(),
            url: self.url.clone(),
            message: self.message.clone(),
        }
    }
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Watch { section } => cli::run_watch(section),
        Commands::Show {
            section,
            severity,
            search,
        } => cli::run_show(section, severity, search),
        Commands::Detect(args) => cli::run_detect(args.request(), args.sample.as_deref()),
        Commands::Delete { id } => cli::run_delete(&id),
        Commands::Samples => cli::run_samples(),
        Commands::Ping => cli::run_ping(),
        Commands::Beacon { url, user_agent } => cli::run_beacon(&url, &user_agent),
        Commands::Activity { limit, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_activity(limit, fmt)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
