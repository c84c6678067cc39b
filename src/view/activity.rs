//! Activity detail: hero stats, laps with derived totals, charts, route and
//! segment bests

use serde::Serialize;
use std::collections::HashMap;

use super::format::{
    finite, format_pace, format_time, km_or_placeholder, pace_or_placeholder, positive, prefix,
    time_or_placeholder, PLACEHOLDER,
};
use crate::api::dto::{
    ActivityDetail, ActivitySeries, ActivitySummary, Lap, SegmentBest, SegmentsBestResponse,
};

/// Segment distances shown in the segments table, in metres
pub const SEGMENT_DISTANCES: [u32; 7] = [400, 800, 1000, 1500, 3000, 5000, 10000];

pub const TABS: [&str; 3] = ["Overview", "Laps", "Charts"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeroStat {
    pub label: String,
    pub value: String,
}

fn stat(label: &str, value: String) -> HeroStat {
    HeroStat {
        label: label.to_string(),
        value,
    }
}

/// One lap table row; the totals row uses `lap = "Total"`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LapRow {
    pub lap: String,
    pub time: String,
    /// Kilometres, two decimals, no unit
    pub distance: String,
    pub pace: String,
    pub elev: String,
    pub flat: String,
}

/// A non-empty channel of the time series, nulls dropped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    /// `(seconds, value)`
    pub points: Vec<(f64, f64)>,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl ChartSeries {
    pub fn from_channel(time: &[f64], values: &[Option<f64>]) -> Option<Self> {
        let points: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| {
                let v = finite(*v)?;
                let t = time.get(i).copied().unwrap_or(i as f64);
                Some((t, v))
            })
            .collect();
        if points.is_empty() {
            return None;
        }
        let min = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
        let avg = points.iter().map(|p| p.1).sum::<f64>() / points.len() as f64;
        Some(Self {
            points,
            min,
            max,
            avg,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartBundle {
    pub pace: Option<ChartSeries>,
    pub hr: Option<ChartSeries>,
    pub cadence: Option<ChartSeries>,
    pub elevation: Option<ChartSeries>,
}

impl ChartBundle {
    pub fn from_series(series: &ActivitySeries) -> Self {
        Self {
            pace: ChartSeries::from_channel(&series.time, &series.pace),
            hr: ChartSeries::from_channel(&series.time, &series.hr),
            cadence: ChartSeries::from_channel(&series.time, &series.cadence),
            elevation: ChartSeries::from_channel(&series.time, &series.elevation),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoutePoint {
    pub lat: f64,
    pub lon: f64,
}

/// One row of the segments table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentRow {
    pub distance: String,
    pub this_activity: String,
    pub best_all: String,
    pub best_all_date: String,
    pub best_12w: String,
    pub best_12w_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActivityDetailView {
    pub id: Option<String>,
    pub activity_type: Option<String>,
    pub title: String,
    /// `YYYY-MM-DD @ HH:MM`
    pub date: String,
    pub location: String,
    pub weather: String,
    pub hero_stats: Vec<HeroStat>,
    pub key_stats: Vec<HeroStat>,
    pub notes: Vec<String>,
    pub tabs: Vec<String>,
    pub laps: Vec<LapRow>,
    pub lap_totals: Option<LapRow>,
    pub charts: ChartBundle,
    pub route: Vec<RoutePoint>,
    pub segments: Vec<SegmentRow>,
}

/// Everything fetched for one activity
#[derive(Debug, Clone, Default)]
pub struct ActivityBundle {
    pub detail: ActivityDetail,
    pub summary: ActivitySummary,
    pub laps: Vec<Lap>,
    pub series: ActivitySeries,
    pub route: Vec<Vec<f64>>,
    pub segments_best: SegmentsBestResponse,
    pub activity_segments: HashMap<String, f64>,
}

/// Merge the sub-resources into one view. `None` when the detail record
/// carries an error.
pub fn build_activity_detail(bundle: &ActivityBundle) -> Option<ActivityDetailView> {
    let detail = &bundle.detail;
    if detail.error.is_some() {
        return None;
    }
    let summary = &bundle.summary;

    Some(ActivityDetailView {
        id: detail.activity_id.clone(),
        activity_type: detail.activity_type.clone(),
        title: detail
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Activity".to_string()),
        date: prefix(detail.start_time.as_deref(), 16).replacen('T', " @ ", 1),
        location: detail.location.clone().unwrap_or_default(),
        weather: weather_label(detail),
        hero_stats: hero_stats(summary),
        key_stats: key_stats(summary),
        notes: summary_notes(summary),
        tabs: TABS.iter().map(|t| t.to_string()).collect(),
        laps: bundle.laps.iter().map(lap_row).collect(),
        lap_totals: build_lap_totals(&bundle.laps),
        charts: ChartBundle::from_series(&bundle.series),
        route: bundle
            .route
            .iter()
            .filter_map(|p| match p.as_slice() {
                [lat, lon, ..] => Some(RoutePoint { lat: *lat, lon: *lon }),
                _ => None,
            })
            .collect(),
        segments: build_segment_rows(&bundle.segments_best, &bundle.activity_segments),
    })
}

fn weather_label(detail: &ActivityDetail) -> String {
    let weather = detail.weather.as_ref();
    let temp = weather
        .and_then(|w| finite(w.temp_c))
        .or_else(|| weather.and_then(|w| finite(w.avg_temp_c)));
    match temp {
        Some(t) => format!("{}°C", t),
        None => "n/a".to_string(),
    }
}

/// Rounded to a whole number without a negative zero
fn whole(v: f64) -> f64 {
    v.round() + 0.0
}

fn bpm(value: Option<f64>) -> String {
    finite(value)
        .map(|v| format!("{} bpm", whole(v)))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn hero_stats(s: &ActivitySummary) -> Vec<HeroStat> {
    vec![
        stat("Distance", km_or_placeholder(s.distance_m, 2)),
        stat("Avg Pace", pace_or_placeholder(s.avg_pace_sec)),
        stat("Moving Time", time_or_placeholder(s.moving_s)),
        stat(
            "Elevation",
            finite(s.elev_gain)
                .map(|v| format!("{} m", v))
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        ),
        stat(
            "Calories",
            finite(s.calories)
                .map(|v| v.to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        ),
        stat("Avg HR", bpm(s.avg_hr_norm)),
    ]
}

/// Overview tab rows
fn key_stats(s: &ActivitySummary) -> Vec<HeroStat> {
    vec![
        stat("Avg Pace", pace_or_placeholder(s.avg_pace_sec)),
        stat("Avg Flat Pace", pace_or_placeholder(s.flat_pace_sec)),
        stat("Best Pace", pace_or_placeholder(s.best_pace_sec)),
        stat("Moving Time", time_or_placeholder(s.moving_s)),
        stat("Avg HR (norm)", bpm(positive(s.avg_hr_norm))),
        stat("Avg HR (raw)", bpm(positive(s.avg_hr_raw))),
        stat(
            "Cadence",
            positive(s.cadence_avg)
                .map(|v| format!("{} spm", whole(v)))
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        ),
        stat(
            "Avg Stride Length",
            positive(s.stride_len)
                .map(|v| format!("{:.2} m", v))
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        ),
        stat(
            "Calories",
            finite(s.calories)
                .map(|v| v.to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        ),
    ]
}

fn summary_notes(s: &ActivitySummary) -> Vec<String> {
    let mut notes = Vec::new();
    if s.summary_notes.iter().any(|n| n == "missing_streams") {
        notes.push("No stream data available for this activity.".to_string());
    }
    if s.summary_notes.iter().any(|n| n == "missing_hr_streams") {
        notes.push("HR stream missing; HR-based stats may be unavailable.".to_string());
    }
    notes
}

fn lap_row(lap: &Lap) -> LapRow {
    LapRow {
        lap: lap.lap.map(|n| n.to_string()).unwrap_or_default(),
        time: time_or_placeholder(lap.time),
        distance: format!("{:.2}", lap.distance_m.unwrap_or(0.0) / 1000.0),
        pace: pace_or_placeholder(lap.pace_sec),
        elev: finite(lap.elev_change_m)
            .map(|v| format!("{} m", whole(v)))
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        flat: pace_or_placeholder(lap.flat_pace_sec),
    }
}

/// Totals row derived from the laps. Time, distance and elevation are plain
/// sums; flat pace is distance-weighted over laps that have both a flat pace
/// and a distance.
pub fn build_lap_totals(laps: &[Lap]) -> Option<LapRow> {
    if laps.is_empty() {
        return None;
    }
    let total_time: f64 = laps.iter().filter_map(|l| finite(l.time)).sum();
    let total_dist_m: f64 = laps.iter().filter_map(|l| finite(l.distance_m)).sum();
    let total_elev: f64 = laps.iter().filter_map(|l| finite(l.elev_change_m)).sum();
    let total_km = total_dist_m / 1000.0;

    let avg_pace = if total_km > 0.0 {
        Some(total_time / total_km)
    } else {
        None
    };

    let flat_time: f64 = laps
        .iter()
        .filter_map(|l| Some(positive(l.flat_pace_sec)? * (positive(l.distance_m)? / 1000.0)))
        .sum();
    let flat_pace = if total_km > 0.0 && flat_time > 0.0 {
        Some(flat_time / total_km)
    } else {
        None
    };

    Some(LapRow {
        lap: "Total".to_string(),
        time: format_time(total_time),
        distance: format!("{:.2}", total_km),
        pace: pace_or_placeholder(avg_pace),
        elev: format!("{} m", whole(total_elev)),
        flat: flat_pace
            .map(format_pace)
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
    })
}

fn segment_distance_label(metres: u32) -> String {
    if metres >= 1000 {
        format!("{} km", f64::from(metres) / 1000.0)
    } else {
        format!("{} m", metres)
    }
}

fn best_time(best: Option<&SegmentBest>) -> String {
    time_or_placeholder(best.and_then(|b| b.time_s))
}

fn best_date(best: Option<&SegmentBest>) -> Option<String> {
    best.and_then(|b| b.date.as_deref())
        .filter(|d| !d.is_empty())
        .map(|d| prefix(Some(d), 10))
}

pub fn build_segment_rows(
    bests: &SegmentsBestResponse,
    activity_segments: &HashMap<String, f64>,
) -> Vec<SegmentRow> {
    SEGMENT_DISTANCES
        .iter()
        .map(|&metres| {
            let key = metres.to_string();
            let all = bests.best_all.get(&key);
            let recent = bests.best_12w.get(&key);
            SegmentRow {
                distance: segment_distance_label(metres),
                this_activity: time_or_placeholder(activity_segments.get(&key).copied()),
                best_all: best_time(all),
                best_all_date: best_date(all).unwrap_or_else(|| PLACEHOLDER.to_string()),
                best_12w: best_time(recent),
                best_12w_date: best_date(recent),
            }
        })
        .collect()
}
