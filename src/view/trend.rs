//! Weekly trend of one insight or performance metric

use serde::Serialize;

use super::format::{finite, format_value};
use super::insights::{InsightCard, Tooltip};
use crate::api::dto::{InsightSeriesPoint, InsightSeriesResponse};

/// Weeks requested from `GET /insights/series`
pub const TREND_WEEKS: u32 = 52;

pub const MISSING_HR_MESSAGE: &str = "HR stream data missing. Unable to compute this metric.";
pub const NO_DATA_MESSAGE: &str = "No data available for this metric yet.";

/// Summary of the non-null values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendStats {
    pub min: String,
    pub max: String,
    pub avg: String,
    pub latest: String,
    pub latest_week: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendView {
    pub metric: String,
    pub label: String,
    /// Current value as shown on the card
    pub value: String,
    pub tooltip: Option<Tooltip>,
    pub points: Vec<InsightSeriesPoint>,
    pub stats: Option<TrendStats>,
    /// Shown instead of the chart
    pub message: Option<String>,
}

impl TrendView {
    /// Header-only view while the series is loading
    pub fn pending(card: &InsightCard) -> Self {
        Self {
            metric: card.id.clone(),
            label: card.label.clone(),
            value: card.value.clone(),
            tooltip: Some(card.tooltip.clone()),
            points: Vec::new(),
            stats: None,
            message: None,
        }
    }
}

/// Message for a server-reported reason, if it is one we explain
pub fn reason_message(reason: Option<&str>) -> Option<&'static str> {
    match reason {
        Some("missing_hr_streams") => Some(MISSING_HR_MESSAGE),
        Some("no_data") => Some(NO_DATA_MESSAGE),
        _ => None,
    }
}

pub fn build_trend(card: &InsightCard, response: InsightSeriesResponse) -> TrendView {
    let reason = response
        .series_meta
        .as_ref()
        .and_then(|m| m.reason.as_deref());
    let message = reason_message(reason).map(str::to_string);

    let values: Vec<(&str, f64)> = response
        .series
        .iter()
        .filter_map(|p| finite(p.value).map(|v| (p.week.as_str(), v)))
        .collect();

    let stats = match (message.is_none(), values.last()) {
        (true, Some(&(week, latest))) => {
            let min = values.iter().map(|v| v.1).fold(f64::INFINITY, f64::min);
            let max = values.iter().map(|v| v.1).fold(f64::NEG_INFINITY, f64::max);
            let avg = values.iter().map(|v| v.1).sum::<f64>() / values.len() as f64;
            Some(TrendStats {
                min: format_value(Some(min)),
                max: format_value(Some(max)),
                avg: format_value(Some(avg)),
                latest: format_value(Some(latest)),
                latest_week: week.to_string(),
            })
        }
        _ => None,
    };

    let mut view = TrendView::pending(card);
    view.stats = stats;
    view.message = message;
    view.points = response.series;
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::dto::SeriesMeta;
    use crate::view::insights::build_insights;
    use crate::api::dto::InsightsPayload;

    fn card() -> InsightCard {
        build_insights(&InsightsPayload::default())
            .insights
            .into_iter()
            .find(|c| c.id == "hr_trend")
            .unwrap()
    }

    fn point(week: &str, value: Option<f64>) -> InsightSeriesPoint {
        InsightSeriesPoint {
            week: week.to_string(),
            value,
        }
    }

    #[test]
    fn test_stats_ignore_nulls() {
        let response = InsightSeriesResponse {
            metric: Some("hr_trend".into()),
            series: vec![
                point("2024-01-01", Some(150.0)),
                point("2024-01-08", None),
                point("2024-01-15", Some(146.0)),
                point("2024-01-22", None),
            ],
            series_meta: None,
        };
        let view = build_trend(&card(), response);

        assert_eq!(view.label, "HR trend (12w)");
        assert!(view.message.is_none());
        assert_eq!(view.points.len(), 4);
        let stats = view.stats.unwrap();
        assert_eq!(stats.min, "146.0");
        assert_eq!(stats.max, "150.0");
        assert_eq!(stats.avg, "148.0");
        assert_eq!(stats.latest, "146.0");
        assert_eq!(stats.latest_week, "2024-01-15");
    }

    #[test]
    fn test_reason_messages() {
        let response = InsightSeriesResponse {
            series_meta: Some(SeriesMeta {
                reason: Some("missing_hr_streams".into()),
            }),
            ..Default::default()
        };
        let view = build_trend(&card(), response);
        assert_eq!(view.message.as_deref(), Some(MISSING_HR_MESSAGE));
        assert!(view.stats.is_none());

        assert_eq!(reason_message(Some("no_data")), Some(NO_DATA_MESSAGE));
        assert_eq!(reason_message(Some("other")), None);
        assert_eq!(reason_message(None), None);
    }

    #[test]
    fn test_empty_series() {
        let view = build_trend(&card(), InsightSeriesResponse::default());
        assert!(view.stats.is_none());
        assert!(view.message.is_none());
        assert!(view.tooltip.is_some());
    }
}
