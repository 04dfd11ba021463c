//! Dashboard sections and the loader each one runs when shown.

use std::str::FromStr;

use super::Controller;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    Dashboard,
    Analytics,
    Alerts,
    Logs,
    Settings,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Self::Dashboard,
        Self::Analytics,
        Self::Alerts,
        Self::Logs,
        Self::Settings,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Analytics => "analytics",
            Self::Alerts => "alerts",
            Self::Logs => "logs",
            Self::Settings => "settings",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Analytics => "Analytics",
            Self::Alerts => "Alerts",
            Self::Logs => "Threat Logs",
            Self::Settings => "Settings",
        }
    }

    /// Notification shown after a manual refresh of this section.
    pub fn refreshed_message(self) -> Option<&'static str> {
        match self {
            Self::Dashboard => Some("Threat feed refreshed"),
            Self::Alerts => Some("Alerts refreshed"),
            Self::Logs => Some("Threat logs refreshed"),
            Self::Analytics | Self::Settings => None,
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| {
                format!("unknown section '{s}' (expected dashboard, analytics, alerts, logs or settings)")
            })
    }
}

// ---------------------------------------------------------------------------
// Loader table
// ---------------------------------------------------------------------------

pub(super) type Loader = fn(&mut Controller);

const LOADERS: [(Section, Loader); 5] = [
    (Section::Dashboard, Controller::load_dashboard),
    (Section::Analytics, Controller::load_analytics),
    (Section::Alerts, Controller::load_alerts),
    (Section::Logs, Controller::load_logs),
    (Section::Settings, Controller::reload_settings),
];

pub(super) fn loader_for(section: Section) -> Loader {
    LOADERS
        .iter()
        .find(|(s, _)| *s == section)
        .map(|(_, loader)| *loader)
        .unwrap_or(Controller::load_dashboard)
}
