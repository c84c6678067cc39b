//! Routing
//!
//! Maps a location (path + query) to the active screen and the state derived
//! from it, and keeps the navigation history used for back navigation.
//!
//! # Routes
//!
//! - `/`, `/dashboard` - Overview
//! - `/login` - Login
//! - `/activities[/<type>]` - Activity list (`?range=week&start&end`)
//! - `/activities/<id>`, `/activities/<type>/<id>`, `/activity/<id>` - Detail
//! - `/insights`, `/insights/<id>` - Insight list / trend
//! - `/performance`, `/performance/<id>` - Performance list / trend
//! - `/profile` - Profile
//!
//! Anything else renders the overview.

use serde::Serialize;
use std::fmt;

use crate::view::{ActivityFilter, ActivityType, InsightCard, OverviewView, RangeMode, WeekRange};

/// Named screens, exactly one of which is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    Overview,
    Login,
    Activities,
    Detail,
    Insights,
    Performance,
    Trend,
    Profile,
}

impl Screen {
    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::Overview => "overview",
            Screen::Login => "login",
            Screen::Activities => "activities",
            Screen::Detail => "detail",
            Screen::Insights => "insights",
            Screen::Performance => "performance",
            Screen::Trend => "trend",
            Screen::Profile => "profile",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `path?query`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Location {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (path, query) = match raw.split_once('?') {
            Some((path, query)) => (path, query),
            None => (raw, ""),
        };
        let path = if path.is_empty() { "/dashboard" } else { path };

        let query = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode(key), decode(value))
            })
            .collect();

        Self {
            path: path.to_string(),
            query,
        }
    }

    /// First value of a query parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

fn decode(s: &str) -> String {
    let s = s.replace('+', " ");
    match urlencoding::decode(&s) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => s.clone(),
    }
}

/// Lookup tables available when a location is resolved
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteTables<'a> {
    pub insights: &'a [InsightCard],
    pub performance: &'a [InsightCard],
    pub week: Option<&'a WeekRange>,
}

impl<'a> RouteTables<'a> {
    pub fn new(overview: &'a OverviewView, week: Option<&'a WeekRange>) -> Self {
        Self {
            insights: &overview.insights,
            performance: &overview.performance,
            week,
        }
    }
}

/// Result of resolving a location
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub screen: Screen,
    /// Screen to fall back to on back navigation. `None` leaves the previous
    /// value untouched.
    pub previous: Option<Screen>,
    pub activity_id: Option<String>,
    pub insight: Option<InsightCard>,
    pub filter: Option<ActivityFilter>,
}

impl Route {
    fn screen(screen: Screen, previous: Screen) -> Self {
        Self {
            screen,
            previous: Some(previous),
            activity_id: None,
            insight: None,
            filter: None,
        }
    }

    fn detail(id: Option<String>) -> Self {
        Self {
            activity_id: id,
            ..Self::screen(Screen::Detail, Screen::Activities)
        }
    }

    fn trend(card: &InsightCard, previous: Screen) -> Self {
        Self {
            insight: Some(card.clone()),
            ..Self::screen(Screen::Trend, previous)
        }
    }
}

/// Resolve a location, rules evaluated in order
pub fn resolve(location: &Location, tables: &RouteTables<'_>) -> Route {
    let path = location.path.as_str();

    if path == "/" || path == "/dashboard" {
        return Route::screen(Screen::Overview, Screen::Overview);
    }
    if path == "/login" {
        return Route::screen(Screen::Login, Screen::Overview);
    }
    if path == "/activities" || path.starts_with("/activities/") {
        return resolve_activities(path, location, tables);
    }
    if let Some(id) = path.strip_prefix("/activity/") {
        let id = id.trim();
        return Route::detail((!id.is_empty()).then(|| id.to_string()));
    }
    if let Some(id) = path.strip_prefix("/insights/") {
        if let Some(card) = find(tables.insights, id.trim()) {
            return Route::trend(card, Screen::Insights);
        }
    }
    if path == "/insights" {
        return Route::screen(Screen::Insights, Screen::Overview);
    }
    if let Some(id) = path.strip_prefix("/performance/") {
        if let Some(card) = find(tables.performance, id.trim()) {
            return Route::trend(card, Screen::Performance);
        }
    }
    if path == "/performance" {
        return Route::screen(Screen::Performance, Screen::Overview);
    }
    if path == "/profile" {
        return Route::screen(Screen::Profile, Screen::Overview);
    }

    Route {
        previous: None,
        ..Route::screen(Screen::Overview, Screen::Overview)
    }
}

fn resolve_activities(path: &str, location: &Location, tables: &RouteTables<'_>) -> Route {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    let segment = parts.get(1).copied().unwrap_or("run");

    if let Some(id) = parts.get(2) {
        return Route::detail(Some(id.to_string()));
    }
    let Some(activity_type) = ActivityType::parse(segment) else {
        return Route::detail(Some(segment.to_string()));
    };

    let filter = ActivityFilter::resolve(
        activity_type,
        RangeMode::parse(location.param("range")),
        location.param("start").filter(|s| !s.is_empty()),
        location.param("end").filter(|s| !s.is_empty()),
        tables.week,
    );
    Route {
        filter: Some(filter),
        ..Route::screen(Screen::Activities, Screen::Overview)
    }
}

fn find<'a>(cards: &'a [InsightCard], id: &str) -> Option<&'a InsightCard> {
    if id.is_empty() {
        return None;
    }
    cards.iter().find(|c| c.id == id)
}

/// In-memory navigation history
#[derive(Debug, Clone)]
pub struct Navigator {
    current: String,
    history: Vec<String>,
    previous_path: Option<String>,
}

impl Navigator {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            current: initial.into(),
            history: Vec::new(),
            previous_path: None,
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn location(&self) -> Location {
        Location::parse(&self.current)
    }

    /// Push a new entry. Returns `false` (and does nothing) when `path` is
    /// already current.
    pub fn push(&mut self, path: &str) -> bool {
        if self.current == path {
            return false;
        }
        let previous = std::mem::replace(&mut self.current, path.to_string());
        self.history.push(previous);
        true
    }

    /// Replace the current entry without growing the history
    pub fn replace(&mut self, path: &str) {
        self.current = path.to_string();
    }

    /// Pop the last history entry, if any
    pub fn back(&mut self) -> Option<&str> {
        let previous = self.history.pop()?;
        self.current = previous;
        Some(&self.current)
    }

    /// Remember the path to return to when there is no history
    pub fn remember_previous(&mut self, path: impl Into<String>) {
        self.previous_path = Some(path.into());
    }

    pub fn previous_path(&self) -> Option<&str> {
        self.previous_path.as_deref()
    }

    /// History entry if any, otherwise the remembered path, otherwise the
    /// activity list
    pub fn go_back(&mut self) -> &str {
        if self.back().is_none() {
            let target = self
                .previous_path
                .clone()
                .unwrap_or_else(|| "/activities".to_string());
            self.push(&target);
        }
        &self.current
    }

    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::dto::InsightsPayload;
    use crate::view::insights::build_insights;

    fn resolve_path(path: &str) -> Route {
        resolve(&Location::parse(path), &RouteTables::default())
    }

    #[test]
    fn test_location_parse() {
        let loc = Location::parse("/activities/run?range=week&start=2024-03-04T00%3A00%3A00.000Z&x");
        assert_eq!(loc.path, "/activities/run");
        assert_eq!(loc.param("range"), Some("week"));
        assert_eq!(loc.param("start"), Some("2024-03-04T00:00:00.000Z"));
        assert_eq!(loc.param("x"), Some(""));
        assert_eq!(loc.param("end"), None);

        assert_eq!(Location::parse("").path, "/dashboard");
    }

    #[test]
    fn test_simple_screens() {
        assert_eq!(resolve_path("/").screen, Screen::Overview);
        assert_eq!(resolve_path("/dashboard").screen, Screen::Overview);
        assert_eq!(resolve_path("/login").screen, Screen::Login);
        assert_eq!(resolve_path("/insights").screen, Screen::Insights);
        assert_eq!(resolve_path("/performance").screen, Screen::Performance);

        let profile = resolve_path("/profile");
        assert_eq!(profile.screen, Screen::Profile);
        assert_eq!(profile.previous, Some(Screen::Overview));
    }

    #[test]
    fn test_fallback_keeps_previous() {
        let route = resolve_path("/nowhere");
        assert_eq!(route.screen, Screen::Overview);
        assert_eq!(route.previous, None);
    }

    #[test]
    fn test_activities_routes() {
        let list = resolve_path("/activities");
        assert_eq!(list.screen, Screen::Activities);
        assert_eq!(list.previous, Some(Screen::Overview));
        let filter = list.filter.unwrap();
        assert_eq!(filter.activity_type, ActivityType::Run);
        assert_eq!(filter.range, RangeMode::All);

        let golf = resolve_path("/activities/golf");
        assert_eq!(golf.filter.unwrap().activity_type, ActivityType::Golf);

        let by_id = resolve_path("/activities/12345");
        assert_eq!(by_id.screen, Screen::Detail);
        assert_eq!(by_id.activity_id.as_deref(), Some("12345"));
        assert_eq!(by_id.previous, Some(Screen::Activities));

        let nested = resolve_path("/activities/run/987");
        assert_eq!(nested.screen, Screen::Detail);
        assert_eq!(nested.activity_id.as_deref(), Some("987"));

        let legacy = resolve_path("/activity/55");
        assert_eq!(legacy.screen, Screen::Detail);
        assert_eq!(legacy.activity_id.as_deref(), Some("55"));
    }

    #[test]
    fn test_week_filter_preserves_bounds() {
        let route = resolve_path("/activities/run?range=week&start=S&end=E");
        let filter = route.filter.unwrap();
        assert_eq!(filter.range, RangeMode::Week);
        assert_eq!(filter.start.as_deref(), Some("S"));
        assert_eq!(filter.end.as_deref(), Some("E"));
    }

    #[test]
    fn test_week_filter_uses_known_week() {
        let week = WeekRange {
            start: "2024-03-04T00:00:00.000Z".into(),
            end: "2024-03-10T23:59:59.999Z".into(),
        };
        let tables = RouteTables {
            week: Some(&week),
            ..Default::default()
        };
        let route = resolve(&Location::parse("/activities/walk?range=week"), &tables);
        let filter = route.filter.unwrap();
        assert_eq!(filter.range, RangeMode::Week);
        assert_eq!(filter.end.as_deref(), Some("2024-03-10T23:59:59.999Z"));

        let without = resolve_path("/activities/walk?range=week").filter.unwrap();
        assert_eq!(without.range, RangeMode::All);
    }

    #[test]
    fn test_trend_routes_resolve_against_tables() {
        let set = build_insights(&InsightsPayload::default());
        let tables = RouteTables {
            insights: &set.insights,
            performance: &set.performance,
            week: None,
        };

        let insight = resolve(&Location::parse("/insights/decoupling"), &tables);
        assert_eq!(insight.screen, Screen::Trend);
        assert_eq!(insight.previous, Some(Screen::Insights));
        assert_eq!(insight.insight.unwrap().id, "decoupling");

        let perf = resolve(&Location::parse("/performance/pb_5k_all"), &tables);
        assert_eq!(perf.screen, Screen::Trend);
        assert_eq!(perf.previous, Some(Screen::Performance));

        // Unknown ids fall through to the fallback
        let unknown = resolve(&Location::parse("/insights/nope"), &tables);
        assert_eq!(unknown.screen, Screen::Overview);
        assert_eq!(unknown.previous, None);

        // Nothing loaded yet
        let cold = resolve_path("/insights/decoupling");
        assert_eq!(cold.screen, Screen::Overview);
    }

    #[test]
    fn test_navigator_push_and_back() {
        let mut nav = Navigator::new("/dashboard");
        assert!(!nav.push("/dashboard"));
        assert!(!nav.can_go_back());

        assert!(nav.push("/activities/run"));
        assert!(nav.push("/activities/42"));
        assert_eq!(nav.go_back(), "/activities/run");
        assert_eq!(nav.go_back(), "/dashboard");
    }

    #[test]
    fn test_navigator_fallbacks() {
        let mut nav = Navigator::new("/activities/42");
        assert_eq!(nav.go_back(), "/activities");

        let mut nav = Navigator::new("/activities/42");
        nav.remember_previous("/activities/golf");
        assert_eq!(nav.go_back(), "/activities/golf");
        assert_eq!(nav.previous_path(), Some("/activities/golf"));

        nav.replace("/login");
        assert_eq!(nav.current(), "/login");
    }
}
