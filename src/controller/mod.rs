//! Dashboard controller.
//!
//! The [`Controller`] is an explicit context object: it owns the settings,
//! the poller, the API gateway, the dashboard view state and the chart
//! registry. Requests run as jobs on a [`Spawner`]; their completions come
//! back as [`Event`]s on a channel and are applied on the thread that owns
//! the controller, one at a time.
//!
//! Overlapping requests for the same view are allowed. Each request is
//! stamped by the [`ViewSequencer`] and a completion older than the last
//! applied one is dropped.

mod input;
mod section;
mod sequence;
mod spawn;

pub use input::{Command, HELP, Trigger, parse_line};
pub use section::Section;
pub use sequence::{View, ViewSequencer};
pub use spawn::{InlineSpawner, Job, QueueSpawner, Spawner, ThreadSpawner};

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use anyhow::anyhow;
use chrono::Utc;

use crate::activity;
use crate::api::types::{
    Alert, AnalyticsSnapshot, DeleteResponse, DetectRequest, DetectResponse, Severity,
    StatsResponse, ThreatsResponse,
};
use crate::api::{ApiError, ApiGateway, Transport};
use crate::charts::{self, ChartRegistry, ChartSurface};
use crate::display::{RenderContext, Renderer};
use crate::poller::{FireReport, Poller};
use crate::samples;
use crate::settings::{self, Settings, SettingsStore};
use crate::views::{
    AlertEntry, DetectionView, FEED_SIZE, FeedEntry, HealthView, Listing, MetricsView,
    Notification, NotificationKind, StatsView, ThreatEntry, alerts_view, detection_view,
    feed_view, filter_logs, logs_view,
};

/// Longest wait for an event when no poll tick is scheduled.
const IDLE_WAIT: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Decoded body of a successful fetch.
#[derive(Debug, Clone)]
pub enum Payload {
    Stats(StatsResponse),
    Analytics(AnalyticsSnapshot),
    Feed(ThreatsResponse),
    Alerts(Vec<Alert>),
    Logs(ThreatsResponse),
    Detection(DetectResponse),
}

#[derive(Debug)]
pub enum Event {
    /// A fetch for `view`, stamped `seq`, finished.
    Fetched {
        view: View,
        seq: u64,
        result: Result<Payload, ApiError>,
    },
    /// A delete request finished.
    Deleted {
        id: String,
        result: Result<DeleteResponse, ApiError>,
    },
    /// User input or a poll tick.
    Input(Command),
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub alert_severity: Option<Severity>,
    pub log_severity: Option<Severity>,
    /// Client-side text filter over the loaded logs.
    pub log_search: String,
}

/// Everything the display layer shows. `None` means not loaded yet.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub stats: Option<StatsView>,
    pub health: HealthView,
    pub metrics: Option<MetricsView>,
    pub feed: Option<Listing<FeedEntry>>,
    pub alerts: Option<Listing<AlertEntry>>,
    pub logs: Option<Listing<ThreatEntry>>,
    pub detection: Option<DetectionView>,
    pub filters: Filters,
    /// Live notifications, oldest first.
    pub notifications: Vec<Notification>,
}

impl DashboardState {
    /// Loaded log entries that match the current search term.
    pub fn visible_logs(&self) -> Vec<&ThreatEntry> {
        self.logs
            .as_ref()
            .map(|logs| filter_logs(logs, &self.filters.log_search))
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Collaborators handed to [`Controller::new`].
pub struct ControllerContext {
    pub store: SettingsStore,
    pub transport: Arc<dyn Transport>,
    pub spawner: Box<dyn Spawner>,
    pub renderer: Box<dyn Renderer>,
    pub surface: Box<dyn ChartSurface>,
    /// Layer `THREATWATCH_*` environment overrides over stored settings.
    pub env_overrides: bool,
}

pub struct Controller {
    store: SettingsStore,
    settings: Settings,
    env_overrides: bool,
    transport: Arc<dyn Transport>,
    gateway: ApiGateway,
    spawner: Box<dyn Spawner>,
    renderer: Box<dyn Renderer>,
    charts: ChartRegistry,
    poller: Poller,
    sequencer: ViewSequencer,
    state: DashboardState,
    section: Section,
    events_tx: Sender<Event>,
    events_rx: Receiver<Event>,
    in_flight: usize,
    failures: usize,
    sample_cursor: usize,
    quit: bool,
}

impl Controller {
    /// Load settings and put placeholder charts in every slot. Nothing is
    /// fetched and no schedule runs until [`Controller::start`] or
    /// [`Controller::show`].
    pub fn new(ctx: ControllerContext) -> Self {
        let mut settings = ctx.store.load();
        if ctx.env_overrides {
            settings::apply_env_overrides(&mut settings);
        }
        let gateway = ApiGateway::new(&settings.api_base_url, ctx.transport.clone());

        let mut charts = ChartRegistry::new(ctx.surface);
        for (slot, spec) in charts::initial_specs() {
            charts.upsert(slot, spec);
        }

        let (events_tx, events_rx) = mpsc::channel();
        Self {
            store: ctx.store,
            settings,
            env_overrides: ctx.env_overrides,
            transport: ctx.transport,
            gateway,
            spawner: ctx.spawner,
            renderer: ctx.renderer,
            charts,
            poller: Poller::new(),
            sequencer: ViewSequencer::new(),
            state: DashboardState::default(),
            section: Section::Dashboard,
            events_tx,
            events_rx,
            in_flight: 0,
            failures: 0,
            sample_cursor: 0,
            quit: false,
        }
    }

    // -- Accessors --

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn charts(&self) -> &ChartRegistry {
        &self.charts
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    pub fn sequencer(&self) -> &ViewSequencer {
        &self.sequencer
    }

    pub fn section(&self) -> Section {
        self.section
    }

    /// Requests issued whose completion has not been handled yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Number of failed requests since creation.
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn had_errors(&self) -> bool {
        self.failures > 0
    }

    pub fn is_quitting(&self) -> bool {
        self.quit
    }

    /// Sender for feeding [`Event::Input`] from another thread.
    pub fn sender(&self) -> Sender<Event> {
        self.events_tx.clone()
    }

    // -- Lifecycle --

    /// Start the poll schedule (if auto-refresh is on) and show `section`.
    pub fn start(&mut self, section: Section, now: Instant) {
        activity::info(
            "controller.started",
            &format!("{} ({section})", self.settings.api_base_url),
        );
        self.sync_poller(now);
        self.show(section);
    }

    /// Event loop for interactive use. Returns after [`Command::Quit`].
    pub fn run(&mut self) {
        while !self.quit {
            let now = Instant::now();
            self.poller.fire_due(now);
            let wait = self.poller.time_until_next(now).unwrap_or(IDLE_WAIT);
            match self.events_rx.recv_timeout(wait) {
                Ok(event) => self.handle(event),
                Err(RecvTimeoutError::Timeout) => self.expire_notifications(Instant::now()),
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        activity::info("controller.stopped", "");
    }

    /// Fire the poll tick due at `now`, then apply every queued event.
    pub fn tick(&mut self, now: Instant) -> FireReport {
        let report = self.poller.fire_due(now);
        self.pump();
        report
    }

    /// Apply queued events without blocking. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Block until no request is in flight or `timeout` elapses. Returns
    /// whether everything settled.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            if self.in_flight == 0 {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            match self.events_rx.recv_timeout(deadline - now) {
                Ok(event) => self.handle(event),
                Err(_) => return self.in_flight == 0,
            }
        }
    }

    pub fn handle(&mut self, event: Event) {
        match event {
            Event::Fetched { view, seq, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.on_fetched(view, seq, result);
                self.render();
            }
            Event::Deleted { id, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.on_deleted(&id, result);
                self.render();
            }
            Event::Input(command) => self.execute(command),
        }
    }

    pub fn execute(&mut self, command: Command) {
        match command {
            Command::Refresh(trigger) => self.refresh(trigger),
            Command::Show(section) => self.show(section),
            Command::AlertFilter(severity) => self.set_alert_filter(severity),
            Command::LogFilter(severity) => self.set_log_filter(severity),
            Command::Search(term) => self.set_search(&term),
            Command::Delete(id) => self.delete_threat(&id),
            Command::Sample(name) => self.submit_sample(name.as_deref()),
            Command::AutoRefresh(enabled) => self.set_auto_refresh(enabled),
            Command::Interval(ms) => self.set_refresh_interval(ms),
            Command::ResetSettings => self.reset_settings(),
            Command::Help => self.renderer.help(),
            Command::Quit => self.quit = true,
        }
    }

    // -- Sections --

    /// Switch to `section` and run its loader.
    pub fn show(&mut self, section: Section) {
        self.section = section;
        section::loader_for(section)(self);
        self.render();
    }

    pub fn refresh(&mut self, trigger: Trigger) {
        match trigger {
            Trigger::Poll => self.load_dashboard(),
            Trigger::Manual => {
                section::loader_for(self.section)(self);
                if let Some(message) = self.section.refreshed_message() {
                    self.notify(NotificationKind::Info, message);
                }
            }
        }
    }

    /// Stats, health/charts/metrics and the recent-threat feed.
    pub fn load_dashboard(&mut self) {
        self.fetch_stats();
        self.load_analytics();
        self.fetch_feed();
    }

    pub fn load_analytics(&mut self) {
        self.fetch(View::Analytics, |api| api.analytics().map(Payload::Analytics));
    }

    pub fn load_alerts(&mut self) {
        let severity = self.state.filters.alert_severity;
        self.fetch(View::Alerts, move |api| api.alerts(severity).map(Payload::Alerts));
    }

    pub fn load_logs(&mut self) {
        let limit = self.settings.max_log_entries;
        let severity = self.state.filters.log_severity;
        self.fetch(View::Logs, move |api| {
            api.threats(Some(limit), severity).map(Payload::Logs)
        });
    }

    /// Re-read stored settings (plus overrides) and apply them.
    pub fn reload_settings(&mut self) {
        let stored = self.store.load();
        self.apply_settings(self.effective(stored), Instant::now());
    }

    fn fetch_stats(&mut self) {
        self.fetch(View::Stats, |api| api.stats().map(Payload::Stats));
    }

    fn fetch_feed(&mut self) {
        self.fetch(View::Feed, |api| {
            api.threats(Some(FEED_SIZE as u32), None).map(Payload::Feed)
        });
    }

    /// Stamp a request for `view` and run it on the spawner.
    fn fetch<F>(&mut self, view: View, request: F)
    where
        F: FnOnce(&ApiGateway) -> Result<Payload, ApiError> + Send + 'static,
    {
        let seq = self.sequencer.issue(view);
        let gateway = self.gateway.clone();
        let events = self.events_tx.clone();
        self.in_flight += 1;
        let spawned = self.spawner.spawn(Box::new(move || {
            let result = request(&gateway);
            let _ = events.send(Event::Fetched { view, seq, result });
        }));
        if let Err(err) = spawned {
            self.spawn_failed(view.failure_message(), &err);
        }
    }

    // -- Actions --

    /// Submit a detection request. The results panel, a confirmation and a
    /// dashboard refresh follow once the backend answers.
    pub fn detect(&mut self, request: DetectRequest) {
        let target = request
            .url
            .as_deref()
            .or(request.source_ip.as_deref())
            .unwrap_or("-")
            .to_string();
        activity::info("detect.submitted", &target);
        self.fetch(View::Detection, move |api| {
            api.detect(&request).map(Payload::Detection)
        });
    }

    /// Submit a canned sample by name, or the next one in rotation.
    pub fn submit_sample(&mut self, name: Option<&str>) {
        let sample = match name {
            Some(name) => match samples::find(name) {
                Some(sample) => sample,
                None => {
                    self.notify(NotificationKind::Error, format!("Unknown sample: {name}"));
                    return;
                }
            },
            None => {
                let sample = &samples::SAMPLES[self.sample_cursor % samples::SAMPLES.len()];
                self.sample_cursor += 1;
                sample
            }
        };
        self.notify(
            NotificationKind::Info,
            format!("Loaded sample: {}", sample.name),
        );
        self.detect(sample.request());
    }

    /// Ask the backend to delete a threat. Nothing is removed locally; on
    /// confirmation the dependent views are re-fetched.
    pub fn delete_threat(&mut self, id: &str) {
        let gateway = self.gateway.clone();
        let events = self.events_tx.clone();
        let id = id.to_string();
        self.in_flight += 1;
        let spawned = self.spawner.spawn(Box::new(move || {
            let result = gateway.delete_threat(&id);
            let _ = events.send(Event::Deleted { id, result });
        }));
        if let Err(err) = spawned {
            self.spawn_failed("Failed to delete threat", &err);
        }
    }

    pub fn set_alert_filter(&mut self, severity: Option<Severity>) {
        self.state.filters.alert_severity = severity;
        self.load_alerts();
    }

    pub fn set_log_filter(&mut self, severity: Option<Severity>) {
        self.state.filters.log_severity = severity;
        self.load_logs();
    }

    /// Replace all filters without loading anything.
    pub fn set_filters(&mut self, filters: Filters) {
        self.state.filters = filters;
    }

    /// Client-side filter; no request is made.
    pub fn set_search(&mut self, term: &str) {
        self.state.filters.log_search = term.trim().to_string();
        self.render();
    }

    // -- Settings --

    /// Persist `settings` and bring the gateway and poller in line with them.
    pub fn save_settings(&mut self, settings: Settings) {
        self.store.save(&settings);
        activity::info(
            "settings.saved",
            &serde_json::to_string(&settings).unwrap_or_default(),
        );
        self.apply_settings(self.effective(settings), Instant::now());
        self.notify(NotificationKind::Success, "Settings saved successfully!");
    }

    pub fn reset_settings(&mut self) {
        let defaults = self.store.reset();
        activity::info("settings.reset", "");
        self.apply_settings(self.effective(defaults), Instant::now());
        self.notify(NotificationKind::Info, "Settings reset to defaults");
    }

    pub fn set_auto_refresh(&mut self, enabled: bool) {
        let mut stored = self.store.load();
        stored.auto_refresh = enabled;
        self.save_settings(stored);
    }

    pub fn set_refresh_interval(&mut self, ms: u64) {
        if ms == 0 {
            self.notify(
                NotificationKind::Error,
                "Refresh interval must be greater than zero",
            );
            return;
        }
        let mut stored = self.store.load();
        stored.refresh_interval_ms = ms;
        self.save_settings(stored);
    }

    fn effective(&self, mut settings: Settings) -> Settings {
        if self.env_overrides {
            settings::apply_env_overrides(&mut settings);
        }
        settings
    }

    fn apply_settings(&mut self, settings: Settings, now: Instant) {
        if settings.api_base_url != self.settings.api_base_url {
            self.gateway = ApiGateway::new(&settings.api_base_url, self.transport.clone());
        }
        self.settings = settings;
        self.sync_poller(now);
        self.render();
    }

    /// Make the poll schedule match the settings: stopped when auto-refresh
    /// is off, otherwise exactly one schedule at the configured interval.
    fn sync_poller(&mut self, now: Instant) {
        if !self.settings.auto_refresh {
            if self.poller.stop() {
                activity::info("poll.stopped", "");
            }
            return;
        }

        let interval = self.settings.refresh_interval();
        if self.poller.interval() == Some(interval) {
            return;
        }

        let events = self.events_tx.clone();
        let id = self.poller.start(interval, now, move |_tick| {
            events
                .send(Event::Input(Command::Refresh(Trigger::Poll)))
                .map_err(|_| anyhow!("controller event channel closed"))
        });
        activity::info(
            "poll.started",
            &format!("schedule {id} every {}ms", self.settings.refresh_interval_ms),
        );
    }

    // -- Completions --

    fn on_fetched(&mut self, view: View, seq: u64, result: Result<Payload, ApiError>) {
        let payload = match result {
            Ok(payload) => payload,
            Err(err) => {
                self.report_failure(view.failure_message(), &err);
                return;
            }
        };

        if !self.sequencer.accept(view, seq) {
            activity::info(
                "view.stale_dropped",
                &format!(
                    "{} #{seq} (applied #{})",
                    view.name(),
                    self.sequencer.last_applied(view)
                ),
            );
            return;
        }

        let now = Utc::now();
        match payload {
            Payload::Stats(stats) => self.state.stats = Some(StatsView::from_response(&stats)),
            Payload::Analytics(snapshot) => self.apply_analytics(&snapshot),
            Payload::Feed(response) => self.state.feed = Some(feed_view(&response.threats, now)),
            Payload::Alerts(alerts) => self.state.alerts = Some(alerts_view(&alerts, now)),
            Payload::Logs(response) => self.state.logs = Some(logs_view(&response.threats, now)),
            Payload::Detection(response) => {
                self.state.detection = Some(detection_view(&response, now));
                activity::info(
                    "detect.completed",
                    &format!("{} threats", response.threats_detected),
                );
                self.notify(
                    NotificationKind::Success,
                    format!(
                        "Analysis complete: {} threats detected",
                        response.threats_detected
                    ),
                );
                self.load_dashboard();
            }
        }
    }

    fn apply_analytics(&mut self, snapshot: &AnalyticsSnapshot) {
        self.state.health = HealthView::from_health(&snapshot.system_health);
        self.state.metrics = Some(MetricsView::from_snapshot(snapshot));
        for (slot, spec) in charts::analytics_specs(snapshot) {
            self.charts.upsert(slot, spec);
        }
    }

    fn on_deleted(&mut self, id: &str, result: Result<DeleteResponse, ApiError>) {
        match result {
            Ok(response) if response.message.is_some() => {
                activity::info("threat.deleted", id);
                self.notify(NotificationKind::Success, "Threat deleted successfully");
                self.refresh_after_delete();
            }
            Ok(_) => activity::warn("threat.delete_unconfirmed", id),
            Err(err) => self.report_failure("Failed to delete threat", &err),
        }
    }

    /// Logs, stats, feed and analytics: once each.
    fn refresh_after_delete(&mut self) {
        self.load_logs();
        self.fetch_stats();
        self.fetch_feed();
        self.load_analytics();
    }

    fn report_failure(&mut self, message: &str, err: &ApiError) {
        self.failures += 1;
        activity::error(
            "request.failed",
            &format!("{} [{}]: {err}", err.url(), err.kind()),
        );
        self.notify(NotificationKind::Error, message);
    }

    /// The job never ran, so no completion will arrive for it.
    fn spawn_failed(&mut self, message: &str, err: &anyhow::Error) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.failures += 1;
        activity::error("spawn.failed", &format!("{err:#}"));
        self.notify(NotificationKind::Error, message);
        self.render();
    }

    // -- Output --

    pub fn notify(&mut self, kind: NotificationKind, message: impl Into<String>) {
        let now = Instant::now();
        self.expire_notifications(now);
        let notification = Notification::new(kind, message, now);
        self.renderer.notify(&notification);
        self.state.notifications.push(notification);
    }

    fn expire_notifications(&mut self, now: Instant) {
        self.state.notifications.retain(|n| !n.is_expired(now));
    }

    /// Render once nothing is in flight, so a batch of fetches draws once.
    fn render(&mut self) {
        if self.in_flight > 0 {
            return;
        }
        self.renderer.render(&RenderContext {
            section: self.section,
            settings: &self.settings,
            polling: self.poller.is_running(),
            state: &self.state,
            charts: &self.charts,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{HttpRequest, HttpResponse};
    use crate::charts::{ChartSlot, NO_DATA_LABEL, TextSurface};
    use crate::display::NullRenderer;
    use crate::settings::MemoryStore;
    use std::sync::Mutex;

    /// Answers by path with canned JSON and records every request.
    #[derive(Default)]
    struct Backend {
        seen: Mutex<Vec<(String, String)>>,
        fail_all: bool,
    }

    impl Backend {
        fn calls(&self) -> Vec<(String, String)> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Transport for Backend {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
            let path = request
                .url
                .trim_start_matches("http://backend")
                .to_string();
            self.seen
                .lock()
                .unwrap()
                .push((request.method.to_string(), path.clone()));
            if self.fail_all {
                return Err("Connection refused".to_string());
            }
            let body = match path.split('?').next().unwrap_or("") {
                "/api/stats" => r#"{"threats":{"total":7},"alerts":{"total":2}}"#,
                "/api/analytics" => {
                    r#"{"system_health":{"checks":{"threat_detection":{"status":"healthy"}}},
                        "threat_analytics":{"threats_by_type":{"sql_injection":3},"threats_by_severity":{"high":3}}}"#
                }
                "/api/threats" => r#"{"threats":[{"id":"t1","type":"xss","severity":"high","description":"d","confidence":0.9,"detection_method":"pattern_matching"}]}"#,
                "/api/alerts" => "[]",
                "/api/detect" => r#"{"threats_detected":1,"threats":[{"id":"n","type":"sql_injection","severity":"critical","description":"sqli","confidence":0.95,"detection_method":"pattern_matching"}]}"#,
                p if p.starts_with("/api/threats/") => r#"{"message":"Threat deleted successfully"}"#,
                _ => "{}",
            };
            Ok(HttpResponse {
                status: 200,
                status_text: "OK".to_string(),
                body: body.to_string(),
            })
        }
    }

    fn controller(backend: Arc<Backend>, store: MemoryStore) -> Controller {
        let store = store.with(
            settings::SETTINGS_KEY,
            r#"{"apiUrl":"http://backend","refreshInterval":1000}"#,
        );
        Controller::new(ControllerContext {
            store: SettingsStore::new(Box::new(store), None),
            transport: backend,
            spawner: Box::new(InlineSpawner),
            renderer: Box::new(NullRenderer),
            surface: Box::new(TextSurface::new()),
            env_overrides: false,
        })
    }

    fn count(calls: &[(String, String)], method: &str, path: &str) -> usize {
        calls
            .iter()
            .filter(|(m, p)| m == method && p == path)
            .count()
    }

    #[test]
    fn charts_start_with_placeholders() {
        let c = controller(Arc::new(Backend::default()), MemoryStore::new());
        let spec = c.charts().spec(ChartSlot::ThreatDistribution).unwrap();
        assert_eq!(spec.labels, vec![NO_DATA_LABEL]);
        assert_eq!(c.charts().occupied(), 2);
    }

    #[test]
    fn dashboard_loads_three_views() {
        let backend = Arc::new(Backend::default());
        let mut c = controller(backend.clone(), MemoryStore::new());
        c.show(Section::Dashboard);
        c.pump();

        let calls = backend.calls();
        assert_eq!(count(&calls, "GET", "/api/stats"), 1);
        assert_eq!(count(&calls, "GET", "/api/analytics"), 1);
        assert_eq!(count(&calls, "GET", "/api/threats?limit=5"), 1);

        let state = c.state();
        assert_eq!(state.stats.as_ref().unwrap().total_threats, 7);
        assert_eq!(state.feed.as_ref().unwrap().entries().len(), 1);
        assert_eq!(
            c.charts().spec(ChartSlot::ThreatDistribution).unwrap().labels,
            vec!["sql_injection"]
        );
        assert_eq!(c.in_flight(), 0);
    }

    #[test]
    fn logs_use_max_entries_and_severity_filter() {
        let backend = Arc::new(Backend::default());
        let mut c = controller(backend.clone(), MemoryStore::new());
        c.execute(Command::LogFilter(Some(Severity::Critical)));
        c.pump();
        assert_eq!(
            backend.calls(),
            vec![("GET".to_string(), "/api/threats?severity=critical&limit=100".to_string())]
        );
    }

    #[test]
    fn delete_refetches_dependent_views_once_each() {
        let backend = Arc::new(Backend::default());
        let mut c = controller(backend.clone(), MemoryStore::new());
        c.delete_threat("abc123");
        c.pump();

        let calls = backend.calls();
        assert_eq!(calls[0], ("DELETE".to_string(), "/api/threats/abc123".to_string()));
        assert_eq!(count(&calls, "DELETE", "/api/threats/abc123"), 1);
        assert_eq!(count(&calls, "GET", "/api/threats?limit=100"), 1);
        assert_eq!(count(&calls, "GET", "/api/stats"), 1);
        assert_eq!(count(&calls, "GET", "/api/analytics"), 1);
        assert!(
            c.state()
                .notifications
                .iter()
                .any(|n| n.message == "Threat deleted successfully")
        );
    }

    #[test]
    fn detect_renders_results_and_refreshes_dashboard() {
        let backend = Arc::new(Backend::default());
        let mut c = controller(backend.clone(), MemoryStore::new());
        c.submit_sample(Some("sqli"));
        c.pump();

        let detection = c.state().detection.as_ref().unwrap();
        assert_eq!(detection.badge, "1 Threats");
        assert_eq!(detection.results.entries()[0].confidence_pct, 95);

        let messages: Vec<_> = c.state().notifications.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["Loaded sample: SQL Injection", "Analysis complete: 1 threats detected"]
        );
        assert_eq!(count(&backend.calls(), "GET", "/api/stats"), 1);
    }

    #[test]
    fn failures_become_notifications_not_panics() {
        let backend = Arc::new(Backend {
            fail_all: true,
            ..Default::default()
        });
        let mut c = controller(backend, MemoryStore::new());
        c.show(Section::Alerts);
        c.pump();

        assert!(c.had_errors());
        assert!(c.state().alerts.is_none());
        let last = c.state().notifications.last().unwrap();
        assert_eq!(last.kind, NotificationKind::Error);
        assert_eq!(last.message, "Failed to load alerts");
    }

    #[test]
    fn search_filters_without_a_request() {
        let backend = Arc::new(Backend::default());
        let mut c = controller(backend.clone(), MemoryStore::new());
        c.show(Section::Logs);
        c.pump();
        let before = backend.calls().len();

        c.execute(Command::Search("nothing like this".to_string()));
        assert!(c.state().visible_logs().is_empty());
        c.execute(Command::Search("XSS".to_string()));
        assert_eq!(c.state().visible_logs().len(), 1);
        assert_eq!(backend.calls().len(), before);
    }

    #[test]
    fn auto_refresh_toggle_stops_and_restarts_polling() {
        let mut c = controller(Arc::new(Backend::default()), MemoryStore::new());
        let t0 = Instant::now();
        c.start(Section::Settings, t0);
        assert!(c.poller().is_running());

        c.set_auto_refresh(false);
        assert!(!c.poller().is_running());
        assert!(!c.settings().auto_refresh);

        c.set_auto_refresh(true);
        assert!(c.poller().is_running());
        assert_eq!(c.poller().interval(), Some(Duration::from_millis(1000)));

        c.set_refresh_interval(2500);
        assert_eq!(c.poller().interval(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn poll_tick_refreshes_dashboard() {
        let backend = Arc::new(Backend::default());
        let mut c = controller(backend.clone(), MemoryStore::new());
        let t0 = Instant::now();
        c.start(Section::Settings, t0);
        assert!(backend.calls().is_empty());

        let report = c.tick(t0 + Duration::from_millis(1000));
        assert!(report.fired);
        assert_eq!(count(&backend.calls(), "GET", "/api/stats"), 1);
    }

    struct NoThreads;

    impl Spawner for NoThreads {
        fn spawn(&self, _job: Job) -> anyhow::Result<()> {
            Err(anyhow!("resource temporarily unavailable"))
        }
    }

    #[test]
    fn spawn_failure_is_reported_and_does_not_stall() {
        let backend = Arc::new(Backend::default());
        let mut c = controller(backend.clone(), MemoryStore::new());
        c.spawner = Box::new(NoThreads);

        c.show(Section::Alerts);
        assert_eq!(c.in_flight(), 0);
        assert_eq!(c.failures(), 1);
        let last = c.state().notifications.last().unwrap();
        assert_eq!(last.kind, NotificationKind::Error);
        assert_eq!(last.message, "Failed to load alerts");

        c.delete_threat("abc123");
        assert_eq!(c.in_flight(), 0);
        assert_eq!(
            c.state().notifications.last().unwrap().message,
            "Failed to delete threat"
        );
        assert!(c.settle(Duration::from_millis(10)));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn quit_command_sets_flag() {
        let mut c = controller(Arc::new(Backend::default()), MemoryStore::new());
        c.sender().send(Event::Input(Command::Quit)).unwrap();
        c.pump();
        assert!(c.is_quitting());
    }
}
