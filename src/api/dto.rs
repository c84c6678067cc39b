//! Data Transfer Objects
//!
//! Request and response shapes of the dashboard API.
//! Every response field is optional or defaulted so partial payloads decode.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ============================================
// AUTH DTOs
// ============================================

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

// ============================================
// SYNC / HEALTH DTOs
// ============================================

/// Response of `POST /sync`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncResponse {
    /// "started" or "skipped"
    #[serde(default)]
    pub status: Option<String>,
    /// Freshness timestamp observed when the refresh was requested
    #[serde(default)]
    pub last_update: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Response of `GET /health`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub last_update: Option<String>,
}

// ============================================
// OVERVIEW DTOs
// ============================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeeklyResponse {
    #[serde(default)]
    pub weekly: Vec<WeeklyRow>,
}

/// One weekly-period row, newest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeeklyRow {
    /// Week start as `YYYY-MM-DD`
    #[serde(default)]
    pub week: Option<String>,
    #[serde(default)]
    pub distance_m: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityTotalsResponse {
    #[serde(default)]
    pub totals: Vec<ActivityTotal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityTotal {
    pub activity_type: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub distance_m: Option<f64>,
}

/// Flat analytics payload of `GET /insights`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightsPayload {
    #[serde(default)]
    pub vdot_best: Option<f64>,
    #[serde(default)]
    pub pace_trend_sec_per_week: Option<f64>,
    #[serde(default)]
    pub hr_trend_bpm_per_week: Option<f64>,
    #[serde(default)]
    pub eff_trend_per_week: Option<f64>,
    #[serde(default)]
    pub efficiency_trend_12w: Option<f64>,
    /// Percentage
    #[serde(default)]
    pub decoupling_28d: Option<f64>,
    #[serde(default)]
    pub monotony: Option<f64>,
    #[serde(default)]
    pub strain: Option<f64>,
    #[serde(default)]
    pub dist_7d_km: Option<f64>,
    #[serde(default)]
    pub dist_28d_km: Option<f64>,
    #[serde(default)]
    pub fatigue_last_week: Option<f64>,
    #[serde(default)]
    pub fatigue_4w_avg: Option<f64>,
    #[serde(default)]
    pub recovery_index_28d: Option<f64>,
    /// Keyed by distance in metres ("5000", "10000")
    #[serde(default)]
    pub pb_all: HashMap<String, PersonalBest>,
    #[serde(default)]
    pub pb_12m: HashMap<String, PersonalBest>,
    #[serde(default)]
    pub est_5k_s: Option<f64>,
    #[serde(default)]
    pub est_10k_s: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonalBest {
    #[serde(default)]
    pub time_s: Option<f64>,
    #[serde(default)]
    pub date: Option<String>,
}

// ============================================
// ACTIVITY DTOs
// ============================================

/// Query of `GET /activities`
#[derive(Debug, Clone, PartialEq)]
pub struct ActivitiesQuery {
    pub activity_type: String,
    pub limit: usize,
    pub offset: usize,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivitiesResponse {
    #[serde(default)]
    pub activities: Vec<ActivityRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub activity_id: String,
    #[serde(default)]
    pub activity_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub distance_m: Option<f64>,
    #[serde(default)]
    pub moving_s: Option<f64>,
}

/// `GET /activity/:id`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityDetail {
    #[serde(default)]
    pub activity_id: Option<String>,
    #[serde(default)]
    pub activity_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub weather: Option<Weather>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Weather {
    #[serde(default)]
    pub temp_c: Option<f64>,
    #[serde(default)]
    pub avg_temp_c: Option<f64>,
}

/// `GET /activity/:id/summary`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivitySummary {
    #[serde(default)]
    pub distance_m: Option<f64>,
    #[serde(default)]
    pub moving_s: Option<f64>,
    #[serde(default)]
    pub elev_gain: Option<f64>,
    #[serde(default)]
    pub avg_pace_sec: Option<f64>,
    #[serde(default)]
    pub flat_pace_sec: Option<f64>,
    #[serde(default)]
    pub best_pace_sec: Option<f64>,
    #[serde(default)]
    pub avg_hr_norm: Option<f64>,
    #[serde(default)]
    pub avg_hr_raw: Option<f64>,
    #[serde(default)]
    pub max_hr: Option<f64>,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub cadence_avg: Option<f64>,
    /// Metres
    #[serde(default)]
    pub stride_len: Option<f64>,
    /// `missing_streams`, `missing_hr_streams`
    #[serde(default)]
    pub summary_notes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesResponse {
    #[serde(default)]
    pub series: ActivitySeries,
}

/// Multi-channel time series sampled on a shared time axis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivitySeries {
    #[serde(default)]
    pub time: Vec<f64>,
    #[serde(default)]
    pub pace: Vec<Option<f64>>,
    #[serde(default)]
    pub hr: Vec<Option<f64>>,
    #[serde(default)]
    pub cadence: Vec<Option<f64>>,
    #[serde(default)]
    pub elevation: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteResponse {
    /// `[lat, lon, ...]` rows
    #[serde(default)]
    pub route: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LapsResponse {
    #[serde(default)]
    pub laps: Vec<Lap>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lap {
    #[serde(default)]
    pub lap: Option<u32>,
    /// Lap duration in seconds
    #[serde(default)]
    pub time: Option<f64>,
    #[serde(default)]
    pub distance_m: Option<f64>,
    #[serde(default)]
    pub pace_sec: Option<f64>,
    #[serde(default)]
    pub elev_change_m: Option<f64>,
    #[serde(default)]
    pub flat_pace_sec: Option<f64>,
}

/// `GET /activity/:id/segments`, keyed by segment distance in metres
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivitySegmentsResponse {
    #[serde(default)]
    pub segments: HashMap<String, f64>,
}

/// `GET /segments_best`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentsBestResponse {
    #[serde(default)]
    pub best_all: HashMap<String, SegmentBest>,
    #[serde(default)]
    pub best_12w: HashMap<String, SegmentBest>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentBest {
    #[serde(default)]
    pub time_s: Option<f64>,
    #[serde(default)]
    pub activity_id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

// ============================================
// INSIGHT TREND DTOs
// ============================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightSeriesResponse {
    #[serde(default)]
    pub metric: Option<String>,
    #[serde(default)]
    pub series: Vec<InsightSeriesPoint>,
    #[serde(default)]
    pub series_meta: Option<SeriesMeta>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightSeriesPoint {
    pub week: String,
    #[serde(default)]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesMeta {
    /// `missing_hr_streams` or `no_data`
    #[serde(default)]
    pub reason: Option<String>,
}

// ============================================
// ASSISTANT DTOs
// ============================================

/// `POST /insights/evaluate`
#[derive(Debug, Clone, Serialize)]
pub struct EvaluateRequest {
    pub question: String,
    pub context: serde_json::Value,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluateResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub follow_ups: Vec<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub today_recommendation: Option<String>,
    #[serde(default)]
    pub trend_insight: Option<String>,
    #[serde(default)]
    pub predicted_5k_time_s: Option<f64>,
    #[serde(default)]
    pub predicted_10k_time_s: Option<f64>,
}

/// `POST /insights/context`
#[derive(Debug, Clone, Serialize)]
pub struct ContextEvent {
    pub event_type: String,
    pub payload: serde_json::Value,
    pub source: String,
}

/// `GET /assistant/overview`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantOverview {
    #[serde(default)]
    pub today: Option<String>,
    #[serde(default)]
    pub trend: Option<String>,
    /// Predicted race times in seconds keyed by distance label ("5k", "10k")
    #[serde(default)]
    pub predictions: BTreeMap<String, Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_payloads_decode() {
        let insights: InsightsPayload =
            serde_json::from_str(r#"{"vdot_best": 48.2, "pb_all": {"5000": {"time_s": 1225}}}"#)
                .unwrap();
        assert_eq!(insights.vdot_best, Some(48.2));
        assert_eq!(insights.pb_all["5000"].time_s, Some(1225.0));
        assert!(insights.decoupling_28d.is_none());

        let health: HealthResponse = serde_json::from_str("{}").unwrap();
        assert!(health.last_update.is_none());
    }

    #[test]
    fn test_series_with_nulls() {
        let series: SeriesResponse = serde_json::from_str(
            r#"{"series": {"time": [0, 1], "hr": [null, 140.0]}}"#,
        )
        .unwrap();
        assert_eq!(series.series.hr, vec![None, Some(140.0)]);
        assert!(series.series.pace.is_empty());
    }
}
