//! Application Shell
//!
//! Owns the client, the local store, navigation and per-screen state, and
//! dispatches the user-facing operations.
//!
//! Every screen load takes a generation ticket before it goes to the
//! network. A response is committed only if its ticket is still the
//! screen's current generation; anything older is dropped.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};

use crate::api::dto::{ActivitiesResponse, LoginResponse};
use crate::api::{ApiClient, ClientError, ClientResult};
use crate::assistant::{
    build_assistant_overview, submit_best_effort, AssistantBackend, AssistantOverviewView,
    AssistantSession, OverviewLoader,
};
use crate::config::Config;
use crate::router::{self, Location, Navigator, Route, RouteTables, Screen};
use crate::session::{SessionGuard, LOGIN_PATH};
use crate::storage::{LocalStore, OverviewCache, TOKEN_KEY};
use crate::sync::{SyncOutcome, SyncPoller};
use crate::view::activity::build_activity_detail;
use crate::view::activities::build_activities;
use crate::view::format::{format_last_update, PLACEHOLDER};
use crate::view::insights::build_insights;
use crate::view::overview::build_overview;
use crate::view::profile::build_profile;
use crate::view::trend::{build_trend, TREND_WEEKS};
use crate::view::{
    ActivitiesView, ActivityBundle, ActivityDetailView, ActivityFilter, ActivityPage,
    ActivityType, OverviewView, ProfileView, RangeMode, TrendView,
};

pub const OVERVIEW_ERROR: &str = "Failed to load dashboard data.";
pub const ACTIVITIES_ERROR: &str = "Failed to load activities.";
pub const DETAIL_ERROR: &str = "Failed to load activity.";
pub const TREND_ERROR: &str = "Failed to load trend.";

/// Number of weekly rows requested for the overview
const WEEKLY_LIMIT: usize = 4;

// ============================================
// Generations
// ============================================

/// Stamp taken when a load starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Monotonic load counter of one screen
#[derive(Debug, Default)]
pub struct Generation(u64);

impl Generation {
    /// Start a new load, making every earlier ticket stale
    pub fn next(&mut self) -> Ticket {
        self.0 += 1;
        Ticket(self.0)
    }

    /// Ticket of the load in progress, for continuations of it
    pub fn current(&self) -> Ticket {
        Ticket(self.0)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.0 == ticket.0
    }
}

#[derive(Debug, Default)]
struct Generations {
    overview: Generation,
    activities: Generation,
    detail: Generation,
    trend: Generation,
}

impl Generations {
    fn invalidate_all(&mut self) {
        self.overview.next();
        self.activities.next();
        self.detail.next();
        self.trend.next();
    }
}

// ============================================
// Screen state
// ============================================

#[derive(Debug, Clone)]
pub struct OverviewState {
    pub view: OverviewView,
    pub loading: bool,
    pub error: Option<String>,
    /// Raw freshness timestamp from `GET /health`
    pub last_update: Option<String>,
    pub last_update_label: String,
    /// A load has completed, successfully or not
    pub loaded: bool,
}

impl Default for OverviewState {
    fn default() -> Self {
        Self {
            view: OverviewView::default(),
            loading: false,
            error: None,
            last_update: None,
            last_update_label: PLACEHOLDER.to_string(),
            loaded: false,
        }
    }
}

impl OverviewState {
    fn set_last_update(&mut self, raw: Option<String>) {
        self.last_update_label = raw
            .as_deref()
            .map(format_last_update)
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        self.last_update = raw;
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActivitiesState {
    pub filter: ActivityFilter,
    pub page: ActivityPage,
    pub view: ActivitiesView,
}

#[derive(Debug, Clone, Default)]
pub struct DetailState {
    pub view: Option<ActivityDetailView>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TrendState {
    pub view: Option<TrendView>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Everything the overview load fetches, committed as one unit
#[derive(Debug, Clone)]
pub struct OverviewData {
    pub overview: OverviewView,
    pub last_update: Option<String>,
}

/// Health, weekly rows, all-time totals and insights concurrently, then the
/// totals of the latest week
pub async fn fetch_overview(client: &ApiClient) -> ClientResult<OverviewData> {
    let (health, weekly, totals_all, insights) = tokio::try_join!(
        client.health(),
        client.weekly(WEEKLY_LIMIT),
        client.activity_totals(None),
        client.insights(),
    )?;

    let week = weekly
        .weekly
        .first()
        .and_then(|row| row.week.as_deref())
        .and_then(crate::view::overview::build_week_range);
    let totals_week = match &week {
        Some(range) => {
            client
                .activity_totals(Some((range.start.as_str(), range.end.as_str())))
                .await?
                .totals
        }
        None => Vec::new(),
    };

    Ok(OverviewData {
        overview: build_overview(
            &weekly.weekly,
            &totals_all.totals,
            &totals_week,
            build_insights(&insights),
        ),
        last_update: health.last_update,
    })
}

/// The activity record and its sub-resources, all or nothing
pub async fn fetch_activity(client: &ApiClient, id: &str) -> ClientResult<ActivityBundle> {
    let (detail, summary, laps, series, route, segments_best, segments) = tokio::try_join!(
        client.activity_detail(id),
        client.activity_summary(id),
        client.activity_laps(id),
        client.activity_series(id),
        client.activity_route(id),
        client.segments_best(),
        client.activity_segments(id),
    )?;

    Ok(ActivityBundle {
        detail,
        summary,
        laps: laps.laps,
        series: series.series,
        route: route.route,
        segments_best,
        activity_segments: segments.segments,
    })
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ============================================
// App
// ============================================

pub struct App {
    config: Config,
    client: Arc<ApiClient>,
    store: LocalStore,
    navigator: Navigator,
    session: SessionGuard,
    poller: Arc<SyncPoller>,
    sync_task: Option<JoinHandle<ClientResult<SyncOutcome>>>,
    generations: Generations,
    route: Route,
    previous_screen: Screen,
    overview: OverviewState,
    activities: ActivitiesState,
    detail: DetailState,
    trend: TrendState,
    assistant: AssistantSession,
    assistant_overview: Option<AssistantOverviewView>,
    assistant_loader: Option<OverviewLoader>,
    profile: ProfileView,
}

impl App {
    /// Build the shell around an opened store, restoring any saved credential
    pub async fn new(config: Config, store: LocalStore) -> ClientResult<Self> {
        let client = Arc::new(ApiClient::new(&config.api)?);

        let token = match store.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read saved credential");
                None
            }
        };
        client.set_token(token.clone()).await;

        let poller = Arc::new(SyncPoller::new(&config.sync));
        let assistant = AssistantSession::restore(&store);
        let profile = build_profile(&config.profile);

        Ok(Self {
            client,
            store,
            navigator: Navigator::new("/dashboard"),
            session: SessionGuard::new(token),
            poller,
            sync_task: None,
            generations: Generations::default(),
            route: router::resolve(&Location::parse("/dashboard"), &RouteTables::default()),
            previous_screen: Screen::Overview,
            overview: OverviewState::default(),
            activities: ActivitiesState::default(),
            detail: DetailState::default(),
            trend: TrendState::default(),
            assistant,
            assistant_overview: None,
            assistant_loader: None,
            profile,
            config,
        })
    }

    // --------------------------------------------
    // Accessors
    // --------------------------------------------

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn session(&self) -> &SessionGuard {
        &self.session
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn screen(&self) -> Screen {
        self.route.screen
    }

    pub fn previous_screen(&self) -> Screen {
        self.previous_screen
    }

    pub fn current_path(&self) -> &str {
        self.navigator.current()
    }

    pub fn overview(&self) -> &OverviewState {
        &self.overview
    }

    pub fn activities(&self) -> &ActivitiesState {
        &self.activities
    }

    pub fn detail(&self) -> &DetailState {
        &self.detail
    }

    pub fn trend(&self) -> &TrendState {
        &self.trend
    }

    pub fn assistant(&self) -> &AssistantSession {
        &self.assistant
    }

    pub fn assistant_overview(&self) -> Option<&AssistantOverviewView> {
        self.assistant_overview.as_ref()
    }

    pub fn profile(&self) -> &ProfileView {
        &self.profile
    }

    /// Whether opening the app should kick off a background sync
    pub fn should_sync_on_open(&self) -> bool {
        self.config.sync.on_open && self.session.has_credential() && !self.session.auth_required()
    }

    // --------------------------------------------
    // Navigation
    // --------------------------------------------

    /// Initial navigation. An empty path lands on the dashboard.
    pub async fn open(&mut self, path: &str) {
        let target = self.guarded(path);
        tracing::info!(path = %target, "Opening");
        self.navigator.replace(&target);
        self.apply_location().await;
    }

    pub async fn navigate(&mut self, path: &str) {
        let target = self.guarded(path);
        self.navigator.push(&target);
        self.apply_location().await;
    }

    pub async fn go_back(&mut self) {
        self.navigator.go_back();
        let current = self.navigator.current().to_string();
        let target = self.guarded(&current);
        if target != current {
            self.navigator.push(&target);
        }
        self.apply_location().await;
    }

    fn guarded(&mut self, path: &str) -> String {
        let path = if path.trim().is_empty() {
            Location::parse(path).path
        } else {
            path.to_string()
        };
        if Location::parse(&path).path == LOGIN_PATH {
            return path;
        }
        match self.session.guard(&path) {
            Some(login) => login.to_string(),
            None => path,
        }
    }

    async fn apply_location(&mut self) {
        self.close_assistant_overview();
        let location = self.navigator.location();

        // Route tables and the week range come from the overview
        if location.path != LOGIN_PATH && !self.session.auth_required() && !self.overview.loaded {
            self.load_overview(false).await;
            if self.session.auth_required() {
                return;
            }
        }

        let week = self.overview.view.week_range();
        let route = router::resolve(
            &location,
            &RouteTables::new(&self.overview.view, week.as_ref()),
        );
        if let Some(previous) = route.previous {
            self.previous_screen = previous;
        }
        tracing::debug!(path = %location.path, screen = %route.screen, "Resolved route");
        self.route = route;

        match self.route.screen {
            Screen::Activities => {
                self.activities.filter = self.route.filter.clone().unwrap_or_default();
                self.load_activities().await;
            }
            Screen::Detail => self.load_activity_detail().await,
            Screen::Trend => self.load_trend().await,
            _ => {}
        }
    }

    // --------------------------------------------
    // Session
    // --------------------------------------------

    /// Sign in. On success the credential is saved, a forced sync starts in
    /// the background and the remembered location (or the dashboard) opens.
    pub async fn login(&mut self, username: &str, password: &str) -> bool {
        let token = match self.client.login(username, password).await {
            Ok(LoginResponse {
                access_token: Some(token),
                ..
            }) if !token.is_empty() => token,
            Ok(_) => {
                tracing::warn!("Login response carried no token");
                self.session.on_login_failure();
                return false;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Login failed");
                self.session.on_login_failure();
                return false;
            }
        };

        if let Err(e) = self.store.set(TOKEN_KEY, &token) {
            tracing::warn!(error = %e, "Could not persist credential");
        }
        self.client.set_token(Some(token.clone())).await;
        let target = self.session.on_login_success(token);
        tracing::info!(target = %target, "Signed in");

        self.overview.loaded = false;
        self.spawn_sync(true);
        self.navigator.push(&target);
        self.apply_location().await;
        true
    }

    pub async fn logout(&mut self) {
        if let Err(e) = self.client.logout().await {
            tracing::debug!(error = %e, "Logout request failed");
        }
        self.forget_credential().await;
        self.session.on_logout();
        self.clear_protected();
        tracing::info!("Signed out");

        self.navigator.push(LOGIN_PATH);
        self.route = router::resolve(&Location::parse(LOGIN_PATH), &RouteTables::default());
    }

    async fn forget_credential(&mut self) {
        if let Err(e) = self.store.remove(TOKEN_KEY) {
            tracing::warn!(error = %e, "Could not remove saved credential");
        }
        self.client.set_token(None).await;
    }

    /// A request came back 401: drop the credential and every protected
    /// view, then send the user to the login screen.
    async fn invalidate_session(&mut self) {
        tracing::warn!(path = %self.navigator.current(), "Credential rejected");
        self.forget_credential().await;
        self.session.on_unauthorized();
        self.clear_protected();

        let current = self.navigator.current().to_string();
        if self.session.guard(&current).is_some() {
            self.navigator.push(LOGIN_PATH);
        }
        self.route = router::resolve(&Location::parse(LOGIN_PATH), &RouteTables::default());
    }

    fn clear_protected(&mut self) {
        self.generations.invalidate_all();
        self.overview = OverviewState::default();
        if let Err(e) = OverviewCache::clear(&self.store) {
            tracing::warn!(error = %e, "Could not clear overview snapshot");
        }
        self.activities = ActivitiesState::default();
        self.detail = DetailState::default();
        self.trend = TrendState::default();
        self.assistant = AssistantSession::restore(&self.store);
        self.close_assistant_overview();
        self.assistant_overview = None;
    }

    /// Route a failed request: 401 runs the session policy, anything else is
    /// left to the caller. Returns `true` when the session was invalidated.
    async fn handle_unauthorized(&mut self, error: &ClientError) -> bool {
        if error.is_unauthorized() {
            self.invalidate_session().await;
            true
        } else {
            false
        }
    }

    // --------------------------------------------
    // Overview
    // --------------------------------------------

    /// Load the dashboard. Without `force`, a snapshot younger than the
    /// configured freshness window is used instead of the network.
    pub async fn load_overview(&mut self, force: bool) {
        let ticket = self.begin_overview();

        if !force {
            let ttl = self.config.storage.overview_ttl();
            if let Some(cached) = OverviewCache::load_fresh(&self.store, now_ms(), ttl) {
                tracing::debug!(saved_at_ms = cached.saved_at_ms, "Using cached overview");
                let data = OverviewData {
                    overview: cached.overview,
                    last_update: cached.last_update,
                };
                self.commit_overview(ticket, Ok(data)).await;
                return;
            }
        }

        let result = fetch_overview(&self.client).await;
        self.commit_overview(ticket, result).await;
    }

    pub fn begin_overview(&mut self) -> Ticket {
        self.overview.loading = true;
        self.generations.overview.next()
    }

    /// Apply an overview result. Returns `false` when the ticket is stale.
    pub async fn commit_overview(
        &mut self,
        ticket: Ticket,
        result: ClientResult<OverviewData>,
    ) -> bool {
        if !self.generations.overview.is_current(ticket) {
            tracing::debug!("Discarding stale overview response");
            return false;
        }
        self.overview.loading = false;
        self.overview.loaded = true;

        match result {
            Ok(data) => {
                if let Err(e) = OverviewCache::save(
                    &self.store,
                    &data.overview,
                    data.last_update.as_deref(),
                    now_ms(),
                ) {
                    tracing::warn!(error = %e, "Could not cache overview");
                }
                self.poller.set_last_update(data.last_update.clone());
                self.overview.view = data.overview;
                self.overview.set_last_update(data.last_update);
                self.overview.error = None;
            }
            Err(e) => {
                if self.handle_unauthorized(&e).await {
                    return true;
                }
                tracing::warn!(error = %e, "Overview load failed");
                self.overview.view = OverviewView::default();
                self.overview.error = Some(OVERVIEW_ERROR.to_string());
            }
        }
        true
    }

    // --------------------------------------------
    // Activities
    // --------------------------------------------

    /// First page for the current filter
    pub async fn load_activities(&mut self) {
        let ticket = self.generations.activities.next();
        self.activities.page.reset();
        self.activities.page.loading = true;

        let query = self.activities.filter.query(0);
        let result = self.client.activities(&query).await;
        self.commit_activities(ticket, 0, result, false).await;
    }

    /// Next page, if one may exist and none is loading
    pub async fn load_more_activities(&mut self) {
        if !self.activities.page.can_load_more() {
            return;
        }
        let ticket = self.generations.activities.current();
        let offset = self.activities.page.offset;
        self.activities.page.loading = true;

        let query = self.activities.filter.query(offset);
        let result = self.client.activities(&query).await;
        self.commit_activities(ticket, offset, result, true).await;
    }

    pub fn begin_activities(&mut self) -> Ticket {
        self.activities.page.reset();
        self.activities.page.loading = true;
        self.generations.activities.next()
    }

    pub async fn commit_activities(
        &mut self,
        ticket: Ticket,
        offset: usize,
        result: ClientResult<ActivitiesResponse>,
        append: bool,
    ) -> bool {
        if !self.generations.activities.is_current(ticket) {
            tracing::debug!(offset, "Discarding stale activities response");
            return false;
        }
        self.activities.page.loading = false;

        match result {
            Ok(response) => {
                self.activities
                    .page
                    .apply(offset, response.activities, append);
            }
            Err(e) => {
                if self.handle_unauthorized(&e).await {
                    return true;
                }
                tracing::warn!(error = %e, offset, "Activities load failed");
                self.activities.page.fail(ACTIVITIES_ERROR);
            }
        }
        self.activities.view = build_activities(&self.activities.filter, &self.activities.page.records);
        true
    }

    // --------------------------------------------
    // Activity detail
    // --------------------------------------------

    pub async fn load_activity_detail(&mut self) {
        let ticket = self.generations.detail.next();
        self.detail = DetailState {
            loading: true,
            ..Default::default()
        };

        let Some(id) = self.route.activity_id.clone() else {
            self.detail.loading = false;
            self.detail.error = Some(DETAIL_ERROR.to_string());
            return;
        };
        let result = fetch_activity(&self.client, &id).await;
        self.commit_detail(ticket, result).await;
    }

    pub async fn commit_detail(&mut self, ticket: Ticket, result: ClientResult<ActivityBundle>) -> bool {
        if !self.generations.detail.is_current(ticket) {
            tracing::debug!("Discarding stale activity response");
            return false;
        }
        self.detail.loading = false;

        match result {
            Ok(bundle) => match build_activity_detail(&bundle) {
                Some(view) => {
                    self.detail.view = Some(view);
                    self.detail.error = None;
                }
                None => {
                    tracing::warn!(error = ?bundle.detail.error, "Activity record reported an error");
                    self.detail.view = None;
                    self.detail.error = Some(DETAIL_ERROR.to_string());
                }
            },
            Err(e) => {
                if self.handle_unauthorized(&e).await {
                    return true;
                }
                tracing::warn!(error = %e, "Activity load failed");
                self.detail.view = None;
                self.detail.error = Some(DETAIL_ERROR.to_string());
            }
        }
        true
    }

    // --------------------------------------------
    // Trend
    // --------------------------------------------

    pub async fn load_trend(&mut self) {
        let ticket = self.generations.trend.next();
        let Some(card) = self.route.insight.clone() else {
            self.trend = TrendState::default();
            return;
        };
        self.trend = TrendState {
            view: Some(TrendView::pending(&card)),
            loading: true,
            error: None,
        };

        let result = self.client.insights_series(&card.id, TREND_WEEKS).await;
        if !self.generations.trend.is_current(ticket) {
            tracing::debug!(metric = %card.id, "Discarding stale trend response");
            return;
        }
        self.trend.loading = false;

        match result {
            Ok(series) => {
                self.trend.view = Some(build_trend(&card, series));
            }
            Err(e) => {
                if self.handle_unauthorized(&e).await {
                    return;
                }
                tracing::warn!(error = %e, metric = %card.id, "Trend load failed");
                self.trend.error = Some(TREND_ERROR.to_string());
            }
        }
    }

    // --------------------------------------------
    // Selections
    // --------------------------------------------

    /// Open the activity list behind a summary card
    pub async fn select_summary_card(&mut self, activity_type: ActivityType, range: RangeMode) {
        self.navigator.remember_previous(self.navigator.current().to_string());
        let path = match (range, self.overview.view.week_range()) {
            (RangeMode::All, _) => ActivityFilter::all_time(activity_type).path(),
            (RangeMode::Week, Some(week)) => format!(
                "/activities/{}?range=week&start={}&end={}",
                activity_type,
                urlencoding::encode(&week.start),
                urlencoding::encode(&week.end)
            ),
            (RangeMode::Week, None) => format!("/activities/{}?range=week", activity_type),
        };
        self.navigate(&path).await;
    }

    pub async fn select_insight(&mut self, id: &str) {
        self.navigate(&format!("/insights/{}", urlencoding::encode(id)))
            .await;
    }

    pub async fn select_performance(&mut self, id: &str) {
        self.navigate(&format!("/performance/{}", urlencoding::encode(id)))
            .await;
    }

    pub async fn select_activity(&mut self, id: &str) {
        self.navigator.remember_previous(self.navigator.current().to_string());
        self.navigate(&format!("/activities/{}", urlencoding::encode(id)))
            .await;
    }

    // --------------------------------------------
    // Assistant
    // --------------------------------------------

    /// Lightweight description of what the user is looking at
    pub fn assistant_context(&self) -> Value {
        let mut context = json!({
            "screen": self.route.screen.as_str(),
            "path": self.navigator.current(),
            "week_start": self.overview.view.week_start,
            "last_update": self.overview.last_update,
        });
        if let Some(id) = &self.route.activity_id {
            context["activity_id"] = json!(id);
        }
        if self.route.screen == Screen::Activities {
            context["activity_type"] = json!(self.activities.filter.activity_type.as_str());
            context["range"] = json!(self.activities.filter.range.as_str());
        }
        if let Some(card) = &self.route.insight {
            context["metric"] = json!(card.id);
        }
        context
    }

    pub async fn ask_assistant(&mut self, question: &str) -> ClientResult<()> {
        let context = self.assistant_context();
        let result = self
            .assistant
            .ask(self.client.as_ref(), &self.store, question, context)
            .await;
        if let Err(e) = &result {
            self.handle_unauthorized(e).await;
        }
        result
    }

    pub async fn select_follow_up(&mut self, index: usize) -> ClientResult<()> {
        let context = self.assistant_context();
        let result = self
            .assistant
            .select_follow_up(self.client.as_ref(), &self.store, index, context)
            .await;
        if let Err(e) = &result {
            self.handle_unauthorized(e).await;
        }
        result
    }

    pub fn new_chat(&mut self) {
        self.assistant.new_chat(&self.store);
    }

    /// Rate an answer. Failures are ignored.
    pub async fn send_feedback(&self, index: usize, helpful: bool) {
        if let Some(event) = self.assistant.feedback_event(index, helpful) {
            submit_best_effort(self.client.as_ref(), event).await;
        }
    }

    /// Fetch the assistant's daily summary, bounded by the configured timeout
    pub async fn load_assistant_overview(&mut self) {
        self.start_assistant_overview();
        self.finish_assistant_overview().await;
    }

    /// Request the daily summary in the background. A request already in
    /// flight is kept.
    pub fn start_assistant_overview(&mut self) {
        if self.assistant_loader.is_some() || self.session.auth_required() {
            return;
        }
        let backend: Arc<dyn AssistantBackend> = self.client.clone();
        self.assistant_loader = Some(OverviewLoader::spawn(
            backend,
            self.config.assistant.overview_timeout(),
        ));
    }

    pub fn assistant_overview_pending(&self) -> bool {
        self.assistant_loader.is_some()
    }

    /// Abort a pending summary request. Navigation does this implicitly.
    pub fn close_assistant_overview(&mut self) {
        if let Some(loader) = self.assistant_loader.take() {
            tracing::debug!("Closing pending assistant overview");
            loader.close();
        }
    }

    /// Wait for the summary started by [`App::start_assistant_overview`]
    pub async fn finish_assistant_overview(&mut self) {
        let Some(loader) = self.assistant_loader.take() else {
            return;
        };
        match loader.wait().await {
            Ok(overview) => {
                self.assistant_overview = Some(build_assistant_overview(&overview));
            }
            Err(e) => {
                if !self.handle_unauthorized(&e).await {
                    tracing::debug!(error = %e, "Assistant overview unavailable");
                }
                self.assistant_overview = None;
            }
        }
    }

    // --------------------------------------------
    // Sync
    // --------------------------------------------

    /// Trigger a sync and wait for it, then reload what changed
    pub async fn sync(&mut self, force: bool) -> ClientResult<SyncOutcome> {
        if self.session.auth_required() {
            return Err(ClientError::Unauthorized);
        }
        let result = self.poller.run(self.client.as_ref(), force).await;
        self.finish_sync(result).await
    }

    /// Start a sync without waiting for it. Returns `false` when signed out.
    pub fn spawn_sync(&mut self, force: bool) -> bool {
        if !self.session.has_credential() || self.session.auth_required() {
            return false;
        }
        let poller = Arc::clone(&self.poller);
        let client = Arc::clone(&self.client);
        self.sync_task = Some(tokio::spawn(async move {
            poller.run(client.as_ref(), force).await
        }));
        true
    }

    /// Wait for a sync started with [`App::spawn_sync`], if any
    pub async fn wait_for_sync(&mut self) -> Option<ClientResult<SyncOutcome>> {
        let task = self.sync_task.take()?;
        let joined = task.await;
        self.join_sync(joined).await
    }

    /// Like [`App::wait_for_sync`], but abort the sync when it is still
    /// running after `limit`
    pub async fn wait_for_sync_within(&mut self, limit: Duration) -> Option<ClientResult<SyncOutcome>> {
        let task = self.sync_task.as_mut()?;
        let joined = match tokio::time::timeout(limit, task).await {
            Ok(joined) => joined,
            Err(_) => {
                tracing::info!(waited_ms = limit.as_millis() as u64, "Sync still running, showing current data");
                if let Some(task) = self.sync_task.take() {
                    task.abort();
                }
                return None;
            }
        };
        self.sync_task = None;
        self.join_sync(joined).await
    }

    pub fn sync_pending(&self) -> bool {
        self.sync_task.is_some()
    }

    async fn join_sync(
        &mut self,
        joined: Result<ClientResult<SyncOutcome>, JoinError>,
    ) -> Option<ClientResult<SyncOutcome>> {
        match joined {
            Ok(result) => Some(self.finish_sync(result).await),
            Err(e) => {
                tracing::warn!(error = %e, "Sync task did not complete");
                None
            }
        }
    }

    async fn finish_sync(&mut self, result: ClientResult<SyncOutcome>) -> ClientResult<SyncOutcome> {
        match result {
            Ok(SyncOutcome::Skipped) => Ok(SyncOutcome::Skipped),
            Ok(outcome) => {
                if let SyncOutcome::Changed { last_update } = &outcome {
                    self.overview.set_last_update(Some(last_update.clone()));
                }
                self.on_data_changed().await;
                Ok(outcome)
            }
            Err(e) => {
                if !self.handle_unauthorized(&e).await {
                    tracing::warn!(error = %e, "Sync failed");
                }
                Err(e)
            }
        }
    }

    /// Reload the overview and whatever the current screen shows
    pub async fn on_data_changed(&mut self) {
        if self.session.auth_required() {
            return;
        }
        tracing::info!(screen = %self.route.screen, "Data changed, reloading");
        self.load_overview(true).await;
        if self.session.auth_required() {
            return;
        }
        match self.route.screen {
            Screen::Activities => self.load_activities().await,
            Screen::Detail => self.load_activity_detail().await,
            Screen::Trend => self.load_trend().await,
            _ => {}
        }
    }
}
