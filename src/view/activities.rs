//! Activity list: filter, display rows and paging state

use serde::{Deserialize, Serialize};

use super::format::{km_or_placeholder, prefix, time_or_placeholder};
use super::overview::WeekRange;
use super::{Accent, ActivityType};
use crate::api::dto::{ActivitiesQuery, ActivityRecord};

/// Fixed page size of `GET /activities`
pub const PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeMode {
    All,
    Week,
}

impl RangeMode {
    /// Anything other than `week` is all-time
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("week") => RangeMode::Week,
            _ => RangeMode::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RangeMode::All => "all",
            RangeMode::Week => "week",
        }
    }
}

/// Which activities the list shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityFilter {
    pub activity_type: ActivityType,
    pub range: RangeMode,
    pub start: Option<String>,
    pub end: Option<String>,
    pub label: String,
}

impl Default for ActivityFilter {
    fn default() -> Self {
        Self {
            activity_type: ActivityType::Run,
            range: RangeMode::All,
            start: None,
            end: None,
            label: "All activities".to_string(),
        }
    }
}

impl ActivityFilter {
    pub fn all_time(activity_type: ActivityType) -> Self {
        Self {
            activity_type,
            range: RangeMode::All,
            start: None,
            end: None,
            label: format!("All time • {}", activity_type),
        }
    }

    /// Resolve a filter. Week mode needs either explicit bounds or the latest
    /// known week; without either it degrades to all-time.
    pub fn resolve(
        activity_type: ActivityType,
        range: RangeMode,
        start: Option<&str>,
        end: Option<&str>,
        week: Option<&WeekRange>,
    ) -> Self {
        if range == RangeMode::Week {
            let explicit = start.zip(end);
            if explicit.is_some() || week.is_some() {
                let start = start.or(week.map(|w| w.start.as_str()));
                let end = end.or(week.map(|w| w.end.as_str()));
                return Self {
                    activity_type,
                    range: RangeMode::Week,
                    start: start.map(str::to_string),
                    end: end.map(str::to_string),
                    label: format!("This week • {}", activity_type),
                };
            }
        }
        Self::all_time(activity_type)
    }

    pub fn query(&self, offset: usize) -> ActivitiesQuery {
        ActivitiesQuery {
            activity_type: self.activity_type.as_str().to_string(),
            limit: PAGE_SIZE,
            offset,
            start: self.start.clone(),
            end: self.end.clone(),
        }
    }

    /// Path that reproduces this filter
    pub fn path(&self) -> String {
        match (self.range, &self.start, &self.end) {
            (RangeMode::Week, Some(start), Some(end)) => format!(
                "/activities/{}?range=week&start={}&end={}",
                self.activity_type,
                urlencoding::encode(start),
                urlencoding::encode(end)
            ),
            (RangeMode::Week, _, _) => format!("/activities/{}?range=week", self.activity_type),
            (RangeMode::All, _, _) => format!("/activities/{}", self.activity_type),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityRow {
    pub id: String,
    pub title: String,
    pub date: String,
    /// `[distance, moving time]`
    pub stats: [String; 2],
    pub accent: Accent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitiesView {
    pub title: String,
    pub filter_label: String,
    pub items: Vec<ActivityRow>,
}

impl Default for ActivitiesView {
    fn default() -> Self {
        Self {
            title: "Activities".to_string(),
            filter_label: "All activities".to_string(),
            items: Vec::new(),
        }
    }
}

/// Keep records whose accent matches the filter's, then shape them into rows
pub fn build_activities(filter: &ActivityFilter, records: &[ActivityRecord]) -> ActivitiesView {
    let wanted = filter.activity_type.accent();
    let items = records
        .iter()
        .filter(|r| Accent::of(r.activity_type.as_deref()) == wanted)
        .map(|r| ActivityRow {
            id: r.activity_id.clone(),
            title: r
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Activity".to_string()),
            date: prefix(r.start_time.as_deref(), 10),
            stats: [
                km_or_placeholder(r.distance_m, 1),
                time_or_placeholder(r.moving_s),
            ],
            accent: Accent::of(r.activity_type.as_deref()),
        })
        .collect();

    ActivitiesView {
        title: "Activities".to_string(),
        filter_label: filter.label.clone(),
        items,
    }
}

/// Accumulated pages of the activity list
#[derive(Debug, Clone, Default)]
pub struct ActivityPage {
    pub records: Vec<ActivityRecord>,
    /// Offset of the next page
    pub offset: usize,
    pub has_more: bool,
    pub loading: bool,
    pub error: Option<String>,
}

impl ActivityPage {
    pub fn reset(&mut self) {
        *self = Self {
            has_more: true,
            ..Default::default()
        };
    }

    /// Apply a fetched page. `offset` is the offset it was requested at.
    pub fn apply(&mut self, offset: usize, page: Vec<ActivityRecord>, append: bool) {
        let count = page.len();
        if append {
            self.records.extend(page);
        } else {
            self.records = page;
        }
        self.offset = offset + count;
        self.has_more = count == PAGE_SIZE;
        self.error = None;
    }

    pub fn fail(&mut self, message: &str) {
        self.records.clear();
        self.error = Some(message.to_string());
        self.has_more = false;
    }

    /// Whether a further page may be requested
    pub fn can_load_more(&self) -> bool {
        !self.loading && self.has_more
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::format::PLACEHOLDER;

    fn record(id: &str, kind: &str) -> ActivityRecord {
        ActivityRecord {
            activity_id: id.to_string(),
            activity_type: Some(kind.to_string()),
            ..Default::default()
        }
    }

    fn week() -> WeekRange {
        WeekRange {
            start: "2024-03-04T00:00:00.000Z".into(),
            end: "2024-03-10T23:59:59.999Z".into(),
        }
    }

    #[test]
    fn test_filter_resolution() {
        let all = ActivityFilter::resolve(ActivityType::Golf, RangeMode::All, None, None, Some(&week()));
        assert_eq!(all.range, RangeMode::All);
        assert_eq!(all.start, None);
        assert_eq!(all.label, "All time • golf");

        let from_week =
            ActivityFilter::resolve(ActivityType::Run, RangeMode::Week, None, None, Some(&week()));
        assert_eq!(from_week.range, RangeMode::Week);
        assert_eq!(from_week.start.as_deref(), Some("2024-03-04T00:00:00.000Z"));
        assert_eq!(from_week.label, "This week • run");

        let explicit = ActivityFilter::resolve(
            ActivityType::Walk,
            RangeMode::Week,
            Some("S"),
            Some("E"),
            None,
        );
        assert_eq!(explicit.start.as_deref(), Some("S"));
        assert_eq!(explicit.end.as_deref(), Some("E"));
    }

    #[test]
    fn test_week_without_dates_degrades_to_all_time() {
        let filter = ActivityFilter::resolve(ActivityType::Run, RangeMode::Week, None, None, None);
        assert_eq!(filter.range, RangeMode::All);
        assert_eq!(filter.label, "All time • run");
        assert_eq!(filter.query(0).start, None);
    }

    #[test]
    fn test_filter_path() {
        assert_eq!(ActivityFilter::all_time(ActivityType::Golf).path(), "/activities/golf");
        let week = ActivityFilter::resolve(
            ActivityType::Run,
            RangeMode::Week,
            Some("2024-03-04T00:00:00.000Z"),
            Some("2024-03-10T23:59:59.999Z"),
            None,
        );
        assert_eq!(
            week.path(),
            "/activities/run?range=week&start=2024-03-04T00%3A00%3A00.000Z&end=2024-03-10T23%3A59%3A59.999Z"
        );
    }

    #[test]
    fn test_build_rows() {
        let mut run = record("run-1", "run");
        run.name = Some("Lunch Run".into());
        run.start_time = Some("2024-03-05T12:01:00".into());
        run.distance_m = Some(10234.0);
        run.moving_s = Some(3005.4);

        let mut unnamed = record("run-2", "trail");
        unnamed.name = Some(String::new());

        let records = vec![run, record("walk-1", "walk"), unnamed];
        let view = build_activities(&ActivityFilter::all_time(ActivityType::Run), &records);

        assert_eq!(view.title, "Activities");
        assert_eq!(view.filter_label, "All time • run");
        assert_eq!(view.items.len(), 2);

        let first = &view.items[0];
        assert_eq!(first.title, "Lunch Run");
        assert_eq!(first.date, "2024-03-05");
        assert_eq!(first.stats, ["10.2 km".to_string(), "50:05".to_string()]);
        assert_eq!(first.accent, Accent::Run);

        let second = &view.items[1];
        assert_eq!(second.id, "run-2");
        assert_eq!(second.title, "Activity");
        assert_eq!(second.date, "");
        assert_eq!(second.stats, [PLACEHOLDER.to_string(), PLACEHOLDER.to_string()]);
    }

    #[test]
    fn test_walk_filter_matches_neutral_accent() {
        let records = vec![record("run-1", "run"), record("walk-1", "walk")];
        let view = build_activities(&ActivityFilter::all_time(ActivityType::Walk), &records);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].id, "walk-1");
        assert_eq!(view.items[0].accent, Accent::Neutral);
    }

    #[test]
    fn test_paging() {
        let mut page = ActivityPage::default();
        page.reset();
        assert!(page.can_load_more());

        let full: Vec<_> = (0..PAGE_SIZE).map(|i| record(&i.to_string(), "run")).collect();
        page.apply(0, full, false);
        assert_eq!(page.offset, 20);
        assert!(page.has_more);

        let partial: Vec<_> = (0..7).map(|i| record(&format!("p{}", i), "run")).collect();
        page.apply(page.offset, partial, true);
        assert_eq!(page.records.len(), 27);
        assert_eq!(page.offset, 27);
        assert!(!page.has_more);
        assert!(!page.can_load_more());

        page.fail("Failed to load activities.");
        assert!(page.records.is_empty());
        assert_eq!(page.error.as_deref(), Some("Failed to load activities."));
    }
}
