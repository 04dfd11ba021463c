//! Controller commands and the line syntax of `threatwatch watch`.

use anyhow::{Context, Result, bail};

use super::Section;
use crate::api::types::Severity;

/// What caused a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Scheduled poll tick: reloads the dashboard quietly.
    Poll,
    /// User request: reloads the current section and confirms.
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Refresh(Trigger),
    Show(Section),
    /// `None` clears the filter.
    AlertFilter(Option<Severity>),
    LogFilter(Option<Severity>),
    Search(String),
    Delete(String),
    /// Submit a canned detection request; `None` cycles through the samples.
    Sample(Option<String>),
    AutoRefresh(bool),
    Interval(u64),
    ResetSettings,
    Help,
    Quit,
}

pub const HELP: &[(&str, &str)] = &[
    ("r, refresh", "reload the current section"),
    ("dashboard | analytics | alerts | logs | settings", "switch section"),
    ("filter alerts|logs <severity|all>", "set a severity filter"),
    ("search <text>", "filter logs by text (empty clears)"),
    ("delete <id>", "delete a threat"),
    ("sample [name]", "submit a sample detection request"),
    ("auto on|off", "toggle auto-refresh"),
    ("interval <ms>", "set the refresh interval"),
    ("reset", "restore default settings"),
    ("q, quit", "leave"),
];

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "r" | "refresh" => Command::Refresh(Trigger::Manual),
        "show" | "go" => Command::Show(rest.parse().map_err(anyhow::Error::msg)?),
        "filter" => parse_filter(rest)?,
        "search" | "/" => Command::Search(rest.to_string()),
        "delete" | "rm" => {
            if rest.is_empty() {
                bail!("usage: delete <id>");
            }
            Command::Delete(rest.to_string())
        }
        "sample" => Command::Sample((!rest.is_empty()).then(|| rest.to_string())),
        "auto" => match rest.to_ascii_lowercase().as_str() {
            "on" | "true" | "1" => Command::AutoRefresh(true),
            "off" | "false" | "0" => Command::AutoRefresh(false),
            _ => bail!("usage: auto on|off"),
        },
        "interval" => {
            let ms: u64 = rest
                .parse()
                .with_context(|| format!("expected milliseconds, got '{rest}'"))?;
            if ms == 0 {
                bail!("interval must be greater than zero");
            }
            Command::Interval(ms)
        }
        "reset" => Command::ResetSettings,
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        other => match other.parse::<Section>() {
            Ok(section) => Command::Show(section),
            Err(_) => bail!("unknown command '{other}' (type 'help')"),
        },
    };
    Ok(Some(command))
}

fn parse_filter(rest: &str) -> Result<Command> {
    let mut parts = rest.split_whitespace();
    let (Some(target), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
        bail!("usage: filter alerts|logs <severity|all>");
    };

    let severity = match value.to_ascii_lowercase().as_str() {
        "all" | "none" | "-" => None,
        other => Some(other.parse::<Severity>().map_err(anyhow::Error::msg)?),
    };

    match target.to_ascii_lowercase().as_str() {
        "alerts" => Ok(Command::AlertFilter(severity)),
        "logs" => Ok(Command::LogFilter(severity)),
        other => bail!("cannot filter '{other}' (expected alerts or logs)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        parse_line(line).unwrap().unwrap()
    }

    #[test]
    fn blank_line_is_no_command() {
        assert!(parse_line("   ").unwrap().is_none());
    }

    #[test]
    fn section_names_switch_sections() {
        assert_eq!(parse("logs"), Command::Show(Section::Logs));
        assert_eq!(parse("show Analytics"), Command::Show(Section::Analytics));
        assert!(parse_line("show nowhere").is_err());
    }

    #[test]
    fn filters_accept_all_to_clear() {
        assert_eq!(
            parse("filter alerts high"),
            Command::AlertFilter(Some(Severity::High))
        );
        assert_eq!(parse("filter logs all"), Command::LogFilter(None));
        assert!(parse_line("filter logs severe").is_err());
        assert!(parse_line("filter feed high").is_err());
        assert!(parse_line("filter logs").is_err());
    }

    #[test]
    fn search_keeps_the_rest_of_the_line() {
        assert_eq!(
            parse("search  sql injection "),
            Command::Search("sql injection".to_string())
        );
        assert_eq!(parse("search"), Command::Search(String::new()));
    }

    #[test]
    fn settings_commands_validate_arguments() {
        assert_eq!(parse("auto off"), Command::AutoRefresh(false));
        assert_eq!(parse("interval 5000"), Command::Interval(5000));
        assert!(parse_line("interval 0").is_err());
        assert!(parse_line("interval soon").is_err());
        assert!(parse_line("auto maybe").is_err());
    }

    #[test]
    fn delete_requires_an_id() {
        assert_eq!(parse("delete abc123"), Command::Delete("abc123".to_string()));
        assert!(parse_line("delete").is_err());
    }

    #[test]
    fn misc_commands() {
        assert_eq!(parse("r"), Command::Refresh(Trigger::Manual));
        assert_eq!(parse("sample"), Command::Sample(None));
        assert_eq!(parse("sample xss"), Command::Sample(Some("xss".to_string())));
        assert_eq!(parse("QUIT"), Command::Quit);
        assert!(parse_line("launch").is_err());
    }
}
