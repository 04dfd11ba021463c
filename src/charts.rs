//! Chart slots with singleton occupancy.
//!
//! A [`ChartSurface`] owns the actual chart instances (for the terminal, a
//! pre-rendered block of text). The [`ChartRegistry`] guarantees that each
//! [`ChartSlot`] holds at most one live instance: replacing a chart always
//! disposes the previous instance before the new one is created.

use std::collections::{BTreeMap, HashMap};

use crate::api::types::{AnalyticsSnapshot, Counts};

/// Label of the single category rendered when a chart has no data.
pub const NO_DATA_LABEL: &str = "No Data";

const BAR_WIDTH: usize = 24;

// ---------------------------------------------------------------------------
// Specs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChartSlot {
    ThreatDistribution,
    SeverityBreakdown,
}

impl ChartSlot {
    pub const ALL: [ChartSlot; 2] = [Self::ThreatDistribution, Self::SeverityBreakdown];

    pub fn name(self) -> &'static str {
        match self {
            Self::ThreatDistribution => "threatDistribution",
            Self::SeverityBreakdown => "severityBreakdown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Share of a whole per category (doughnut).
    Distribution,
    /// One bar per category.
    GroupedBars,
}

/// Everything needed to construct one chart instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub labels: Vec<String>,
    /// Same order and length as `labels`.
    pub values: Vec<f64>,
    /// True when the chart carries the synthetic "No Data" category.
    pub placeholder: bool,
}

impl ChartSpec {
    /// Build from category counts. Labels and values keep the order the
    /// backend sent. Empty counts yield the placeholder.
    pub fn from_mapping(kind: ChartKind, title: &str, mapping: &Counts) -> Self {
        if mapping.is_empty() {
            return Self::empty(kind, title);
        }
        Self {
            kind,
            title: title.to_string(),
            labels: mapping.iter().map(|(label, _)| label.to_string()).collect(),
            values: mapping.iter().map(|(_, value)| value).collect(),
            placeholder: false,
        }
    }

    /// Single "No Data" category: a full ring for distributions, a zero bar
    /// for bar charts.
    pub fn empty(kind: ChartKind, title: &str) -> Self {
        let value = match kind {
            ChartKind::Distribution => 1.0,
            ChartKind::GroupedBars => 0.0,
        };
        Self {
            kind,
            title: title.to_string(),
            labels: vec![NO_DATA_LABEL.to_string()],
            values: vec![value],
            placeholder: true,
        }
    }
}

/// Placeholder specs for every slot, used before the first analytics load.
pub fn initial_specs() -> Vec<(ChartSlot, ChartSpec)> {
    vec![
        (
            ChartSlot::ThreatDistribution,
            ChartSpec::empty(ChartKind::Distribution, "Threat Distribution"),
        ),
        (
            ChartSlot::SeverityBreakdown,
            ChartSpec::empty(ChartKind::GroupedBars, "Threats by Severity"),
        ),
    ]
}

/// Chart specs derived from an analytics snapshot.
pub fn analytics_specs(snapshot: &AnalyticsSnapshot) -> Vec<(ChartSlot, ChartSpec)> {
    let analytics = &snapshot.threat_analytics;
    vec![
        (
            ChartSlot::ThreatDistribution,
            ChartSpec::from_mapping(
                ChartKind::Distribution,
                "Threat Distribution",
                &analytics.threats_by_type,
            ),
        ),
        (
            ChartSlot::SeverityBreakdown,
            ChartSpec::from_mapping(
                ChartKind::GroupedBars,
                "Threats by Severity",
                &analytics.threats_by_severity,
            ),
        ),
    ]
}

// ---------------------------------------------------------------------------
// Surface
// ---------------------------------------------------------------------------

/// Opaque id of a chart instance owned by a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChartHandle(pub u64);

/// Constructs and disposes chart instances.
pub trait ChartSurface {
    fn create(&mut self, slot: ChartSlot, spec: &ChartSpec) -> ChartHandle;
    fn dispose(&mut self, handle: ChartHandle);
    /// Rendered lines of a live instance; empty for unknown handles.
    fn draw(&self, handle: ChartHandle) -> Vec<String>;
}

/// Terminal surface: each instance is a pre-rendered block of text.
#[derive(Debug, Default)]
pub struct TextSurface {
    next_id: u64,
    instances: HashMap<u64, Vec<String>>,
}

impl TextSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of instances not yet disposed.
    pub fn live(&self) -> usize {
        self.instances.len()
    }
}

impl ChartSurface for TextSurface {
    fn create(&mut self, _slot: ChartSlot, spec: &ChartSpec) -> ChartHandle {
        self.next_id += 1;
        self.instances.insert(self.next_id, render_text(spec));
        ChartHandle(self.next_id)
    }

    fn dispose(&mut self, handle: ChartHandle) {
        self.instances.remove(&handle.0);
    }

    fn draw(&self, handle: ChartHandle) -> Vec<String> {
        self.instances.get(&handle.0).cloned().unwrap_or_default()
    }
}

/// Render a chart spec as plain-text bars.
pub fn render_text(spec: &ChartSpec) -> Vec<String> {
    let label_width = spec.labels.iter().map(|l| l.len()).max().unwrap_or(0);
    let mut lines = vec![spec.title.clone()];

    if spec.placeholder {
        lines.push(format!("  {NO_DATA_LABEL}"));
        return lines;
    }

    let total: f64 = spec.values.iter().sum();
    let max = spec.values.iter().copied().fold(0.0_f64, f64::max);

    for (label, value) in spec.labels.iter().zip(&spec.values) {
        let (ratio, suffix) = match spec.kind {
            ChartKind::Distribution => {
                let share = if total > 0.0 { value / total } else { 0.0 };
                (share, format!("{:>3.0}% ({value})", share * 100.0))
            }
            ChartKind::GroupedBars => {
                let ratio = if max > 0.0 { value / max } else { 0.0 };
                (ratio, format!("{value}"))
            }
        };
        let filled = (ratio * BAR_WIDTH as f64).round() as usize;
        lines.push(format!(
            "  {label:<label_width$} {}{} {suffix}",
            "█".repeat(filled.min(BAR_WIDTH)),
            "·".repeat(BAR_WIDTH - filled.min(BAR_WIDTH)),
        ));
    }
    lines
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

struct ChartInstance {
    handle: ChartHandle,
    spec: ChartSpec,
}

/// Owns at most one live chart instance per slot.
pub struct ChartRegistry {
    surface: Box<dyn ChartSurface>,
    slots: BTreeMap<ChartSlot, ChartInstance>,
}

impl ChartRegistry {
    pub fn new(surface: Box<dyn ChartSurface>) -> Self {
        Self {
            surface,
            slots: BTreeMap::new(),
        }
    }

    /// Replace the chart in `slot`: dispose the old instance, then create
    /// the new one.
    pub fn upsert(&mut self, slot: ChartSlot, spec: ChartSpec) -> ChartHandle {
        if let Some(old) = self.slots.remove(&slot) {
            self.surface.dispose(old.handle);
        }
        let handle = self.surface.create(slot, &spec);
        self.slots.insert(slot, ChartInstance { handle, spec });
        handle
    }

    pub fn spec(&self, slot: ChartSlot) -> Option<&ChartSpec> {
        self.slots.get(&slot).map(|i| &i.spec)
    }

    pub fn handle(&self, slot: ChartSlot) -> Option<ChartHandle> {
        self.slots.get(&slot).map(|i| i.handle)
    }

    pub fn draw(&self, slot: ChartSlot) -> Vec<String> {
        self.handle(slot)
            .map(|h| self.surface.draw(h))
            .unwrap_or_default()
    }

    /// Number of occupied slots.
    pub fn occupied(&self) -> usize {
        self.slots.len()
    }

    /// Dispose every instance.
    pub fn clear(&mut self) {
        for (_, instance) in std::mem::take(&mut self.slots) {
            self.surface.dispose(instance.handle);
        }
    }
}

impl Drop for ChartRegistry {
    fn drop(&mut self) {
        self.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
