//! Overview screen: summary cards per activity type and the current week

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::format::{km_or_placeholder, PLACEHOLDER};
use super::insights::{InsightCard, InsightSet};
use super::{Accent, ActivityType};
use crate::api::dto::{ActivityTotal, WeeklyRow};

/// One activity-type card, e.g. `25.3 km • 4 runs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryCard {
    pub id: ActivityType,
    pub label: String,
    pub value: String,
    pub accent: Accent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewView {
    pub week_label: String,
    /// `YYYY-MM-DD` of the most recent weekly period
    pub week_start: Option<String>,
    pub all_time_cards: Vec<SummaryCard>,
    pub weekly_cards: Vec<SummaryCard>,
    pub insights: Vec<InsightCard>,
    pub performance: Vec<InsightCard>,
}

impl Default for OverviewView {
    fn default() -> Self {
        Self {
            week_label: PLACEHOLDER.to_string(),
            week_start: None,
            all_time_cards: Vec::new(),
            weekly_cards: Vec::new(),
            insights: Vec::new(),
            performance: Vec::new(),
        }
    }
}

impl OverviewView {
    pub fn find_insight(&self, id: &str) -> Option<&InsightCard> {
        self.insights.iter().find(|c| c.id == id)
    }

    pub fn find_performance(&self, id: &str) -> Option<&InsightCard> {
        self.performance.iter().find(|c| c.id == id)
    }

    /// Range of the latest known week, if any
    pub fn week_range(&self) -> Option<WeekRange> {
        self.week_start.as_deref().and_then(build_week_range)
    }
}

/// Inclusive UTC bounds of a seven-day week
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekRange {
    pub start: String,
    pub end: String,
}

/// `YYYY-MM-DD` to `[start 00:00:00.000Z, start+6d 23:59:59.999Z]`
pub fn build_week_range(week_start: &str) -> Option<WeekRange> {
    let start = NaiveDate::parse_from_str(week_start.get(..10)?, "%Y-%m-%d").ok()?;
    let end = start.checked_add_signed(Duration::days(6))?;
    Some(WeekRange {
        start: format!("{}T00:00:00.000Z", start.format("%Y-%m-%d")),
        end: format!("{}T23:59:59.999Z", end.format("%Y-%m-%d")),
    })
}

/// Always three cards in run, golf, walk order
pub fn build_summary_cards(totals: &[ActivityTotal]) -> Vec<SummaryCard> {
    let by_type: HashMap<&str, &ActivityTotal> = totals
        .iter()
        .map(|t| (t.activity_type.as_str(), t))
        .collect();

    ActivityType::ALL
        .iter()
        .map(|&kind| {
            let value = match by_type.get(kind.as_str()) {
                Some(entry) => format!(
                    "{} • {} {}",
                    km_or_placeholder(entry.distance_m, 1),
                    entry.count,
                    kind.count_noun()
                ),
                None => PLACEHOLDER.to_string(),
            };
            SummaryCard {
                id: kind,
                label: kind.label().to_string(),
                value,
                accent: kind.accent(),
            }
        })
        .collect()
}

pub fn build_overview(
    weekly: &[WeeklyRow],
    totals_all: &[ActivityTotal],
    totals_week: &[ActivityTotal],
    insights: InsightSet,
) -> OverviewView {
    let week_start = weekly.first().and_then(|row| row.week.clone());
    OverviewView {
        week_label: week_start
            .clone()
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        week_start,
        all_time_cards: build_summary_cards(totals_all),
        weekly_cards: build_summary_cards(totals_week),
        insights: insights.insights,
        performance: insights.performance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(kind: &str, count: u32, distance_m: f64) -> ActivityTotal {
        ActivityTotal {
            activity_type: kind.to_string(),
            count,
            distance_m: Some(distance_m),
        }
    }

    #[test]
    fn test_summary_cards_order_and_labels() {
        let totals = vec![
            total("walk", 2, 5200.0),
            total("run", 4, 25300.0),
            total("golf", 1, 0.0),
        ];
        let cards = build_summary_cards(&totals);

        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].id, ActivityType::Run);
        assert_eq!(cards[0].label, "Running");
        assert_eq!(cards[0].value, "25.3 km • 4 runs");
        assert_eq!(cards[1].id, ActivityType::Golf);
        assert_eq!(cards[1].value, "— • 1 rounds");
        assert_eq!(cards[1].accent, Accent::Golf);
        assert_eq!(cards[2].id, ActivityType::Walk);
        assert_eq!(cards[2].label, "Walking");
        assert_eq!(cards[2].value, "5.2 km • 2 walks");
        assert_eq!(cards[2].accent, Accent::Neutral);
    }

    #[test]
    fn test_missing_types_render_placeholder() {
        let cards = build_summary_cards(&[total("run", 1, 5000.0)]);
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[1].value, PLACEHOLDER);
        assert_eq!(cards[2].value, PLACEHOLDER);

        let empty = build_summary_cards(&[]);
        assert!(empty.iter().all(|c| c.value == PLACEHOLDER));
    }

    #[test]
    fn test_week_range() {
        let range = build_week_range("2024-02-26").unwrap();
        assert_eq!(range.start, "2024-02-26T00:00:00.000Z");
        assert_eq!(range.end, "2024-03-03T23:59:59.999Z");

        assert!(build_week_range("not-a-date").is_none());
        assert!(build_week_range("").is_none());
    }

    #[test]
    fn test_build_overview() {
        let weekly = vec![
            WeeklyRow {
                week: Some("2024-03-04".into()),
                distance_m: Some(12000.0),
            },
            WeeklyRow {
                week: Some("2024-02-26".into()),
                distance_m: None,
            },
        ];
        let view = build_overview(&weekly, &[], &[], InsightSet::default());
        assert_eq!(view.week_label, "2024-03-04");
        assert_eq!(view.week_start.as_deref(), Some("2024-03-04"));
        assert_eq!(view.all_time_cards.len(), 3);
        assert_eq!(view.week_range().unwrap().start, "2024-03-04T00:00:00.000Z");

        let empty = build_overview(&[], &[], &[], InsightSet::default());
        assert_eq!(empty.week_label, PLACEHOLDER);
        assert!(empty.week_range().is_none());
    }
}
