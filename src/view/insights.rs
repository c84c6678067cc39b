//! Insight and performance cards built from the analytics payload

use serde::{Deserialize, Serialize};

use super::format::{
    finite, fixed, format_compact, format_signed, positive, prefix, time_or_placeholder,
    PLACEHOLDER,
};
use super::Tone;
use crate::api::dto::{InsightsPayload, PersonalBest};
use std::collections::HashMap;

/// Explanatory text shown with a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tooltip {
    pub summary: String,
    pub calc: String,
    pub improve: String,
}

fn tooltip(summary: &str, calc: &str, improve: &str) -> Tooltip {
    Tooltip {
        summary: summary.to_string(),
        calc: calc.to_string(),
        improve: improve.to_string(),
    }
}

/// A single insight or performance card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightCard {
    pub id: String,
    pub label: String,
    pub value: String,
    pub tone: Tone,
    pub hint: String,
    pub tooltip: Tooltip,
}

impl InsightCard {
    fn new(
        id: &str,
        label: &str,
        value: String,
        tone: Tone,
        hint: impl Into<String>,
        tooltip: Tooltip,
    ) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            value,
            tone,
            hint: hint.into(),
            tooltip,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightSet {
    pub insights: Vec<InsightCard>,
    pub performance: Vec<InsightCard>,
}

/// Sign-based tone of a per-week delta
pub fn tone_for_trend(value: Option<f64>, better_lower: bool) -> Tone {
    match finite(value) {
        None => Tone::Neutral,
        Some(v) if better_lower => {
            if v < 0.0 {
                Tone::Good
            } else {
                Tone::Warn
            }
        }
        Some(v) => {
            if v > 0.0 {
                Tone::Good
            } else {
                Tone::Warn
            }
        }
    }
}

/// Decoupling is already a percentage. Bounds are inclusive.
pub fn tone_for_decoupling(value: Option<f64>) -> Tone {
    match finite(value).map(f64::abs) {
        None => Tone::Neutral,
        Some(pct) if pct <= 5.0 => Tone::Good,
        Some(pct) if pct <= 10.0 => Tone::Warn,
        Some(_) => Tone::Bad,
    }
}

/// Recovery index on a 0-100 scale
pub fn tone_for_recovery(value: Option<f64>) -> Tone {
    match finite(value) {
        None => Tone::Neutral,
        Some(v) if v >= 70.0 => Tone::Good,
        Some(v) if v >= 50.0 => Tone::Warn,
        Some(_) => Tone::Bad,
    }
}

/// Build the eleven insight cards and six performance cards
pub fn build_insights(payload: &InsightsPayload) -> InsightSet {
    InsightSet {
        insights: insight_cards(payload),
        performance: performance_cards(payload),
    }
}

fn insight_cards(p: &InsightsPayload) -> Vec<InsightCard> {
    let vdot = finite(p.vdot_best);
    let volume = match (finite(p.dist_7d_km), finite(p.dist_28d_km)) {
        (Some(d7), Some(d28)) => format!("{:.1} / {:.1} km", d7, d28),
        _ => PLACEHOLDER.to_string(),
    };
    let fatigue_hint = match finite(p.fatigue_last_week) {
        Some(last) => format!("Last week: {}", format_compact(Some(last))),
        None => "Load = moving_s × avg HR".to_string(),
    };
    let decoupling = finite(p.decoupling_28d)
        .map(|v| format!("{:.1}%", v))
        .unwrap_or_else(|| PLACEHOLDER.to_string());

    vec![
        InsightCard::new(
            "vdot",
            "VDOT (best 12m)",
            fixed(vdot, 1),
            if vdot.is_some() { Tone::Good } else { Tone::Neutral },
            "Performance-based estimate",
            tooltip(
                "Estimated aerobic performance based on your best 12-month race-equivalent effort.",
                "Calculated using VDOT from the fastest eligible run ≥5K in the last 12 months.",
                "Higher is better.",
            ),
        ),
        InsightCard::new(
            "pace_trend",
            "Pace trend (12w)",
            format_signed(p.pace_trend_sec_per_week, " sec/km/wk"),
            tone_for_trend(p.pace_trend_sec_per_week, true),
            "Lower is better",
            tooltip(
                "Weekly change in average pace over the last 12 weeks.",
                "Linear slope of weekly average pace (sec/km).",
                "More negative = improving.",
            ),
        ),
        InsightCard::new(
            "hr_trend",
            "HR trend (12w)",
            format_signed(p.hr_trend_bpm_per_week, " bpm/wk"),
            tone_for_trend(p.hr_trend_bpm_per_week, true),
            "Lower is better",
            tooltip(
                "Weekly change in average heart rate over the last 12 weeks.",
                "Linear slope of weekly average HR (bpm).",
                "More negative = improving.",
            ),
        ),
        InsightCard::new(
            "eff_trend",
            "Efficiency trend (12w)",
            format_signed(p.eff_trend_per_week, " /wk"),
            tone_for_trend(p.eff_trend_per_week, false),
            "Higher is better",
            tooltip(
                "Change in efficiency index over the last 12 weeks.",
                "Linear slope of weekly efficiency index.",
                "Positive = improving.",
            ),
        ),
        InsightCard::new(
            "decoupling",
            "Decoupling (28d)",
            decoupling,
            tone_for_decoupling(p.decoupling_28d),
            "Closer to 0 is better",
            tooltip(
                "How much pace and HR drift apart during runs.",
                "Average decoupling across recent runs (last 28 days).",
                "Closer to 0 = better aerobic efficiency.",
            ),
        ),
        InsightCard::new(
            "monotony",
            "Monotony (wk)",
            fixed(p.monotony, 2),
            Tone::Neutral,
            "Higher = less variation",
            tooltip(
                "Training variety indicator.",
                "Mean daily load ÷ standard deviation of daily load (weekly).",
                "Lower usually indicates healthier variation.",
            ),
        ),
        InsightCard::new(
            "strain",
            "Strain (wk)",
            fixed(p.strain, 1),
            Tone::Neutral,
            "Monotony × volume",
            tooltip(
                "Overall training stress for the week.",
                "Weekly load × monotony.",
                "Higher can indicate more stress; watch for spikes.",
            ),
        ),
        InsightCard::new(
            "volume",
            "Run volume",
            volume,
            Tone::Neutral,
            "7d / 28d",
            tooltip(
                "Total running distance.",
                "Sum of run distance over the last 7 and 28 days.",
                "Higher usually indicates more training volume.",
            ),
        ),
        InsightCard::new(
            "fatigue_load",
            "Weekly fatigue (4w avg)",
            format_compact(p.fatigue_4w_avg),
            Tone::Neutral,
            fatigue_hint,
            tooltip(
                "Weekly training load proxy.",
                "moving_s × avg HR (weekly), averaged over 4 weeks.",
                "Higher = more load; watch for sudden spikes.",
            ),
        ),
        InsightCard::new(
            "recovery_index",
            "Recovery index (28d)",
            fixed(p.recovery_index_28d, 1),
            tone_for_recovery(p.recovery_index_28d),
            "Median efficiency vs best (0–100)",
            tooltip(
                "How close your typical efficiency is to your best.",
                "Median efficiency ÷ max efficiency (last 28 days) × 100.",
                "Higher = better recovery/readiness.",
            ),
        ),
        InsightCard::new(
            "eff_trend_phr",
            "Pace/HR efficiency trend",
            format_signed(p.efficiency_trend_12w, " /wk"),
            tone_for_trend(p.efficiency_trend_12w, false),
            "Higher is better",
            tooltip(
                "Trend in pace per bpm.",
                "(1000/pace_sec) ÷ avg HR, trended over 12 weeks.",
                "Positive = improving.",
            ),
        ),
    ]
}

const SEGMENT_BEST: &str = "Best segment time over the distance.";
const RUN_BEST: &str = "Moving time of the fastest-paced run at least this long.";

fn performance_cards(p: &InsightsPayload) -> Vec<InsightCard> {
    let pb = |table: &HashMap<String, PersonalBest>, id: &str, label: &str, distance: &str, calc: &str| {
        let entry = table.get(distance);
        InsightCard::new(
            id,
            label,
            time_or_placeholder(entry.and_then(|e| e.time_s)),
            Tone::Neutral,
            pb_date(entry),
            tooltip(&format!("{}.", label), calc, "Lower is better."),
        )
    };
    let estimate = |id: &str, label: &str, value: Option<f64>| {
        InsightCard::new(
            id,
            label,
            time_or_placeholder(positive(value)),
            Tone::Neutral,
            "Segment-based",
            tooltip(&format!("{}.", label), "Riegel projection of a segment best.", "Lower is better."),
        )
    };

    vec![
        pb(&p.pb_all, "pb_5k_all", "PB 5K (all time)", "5000", SEGMENT_BEST),
        pb(&p.pb_all, "pb_10k_all", "PB 10K (all time)", "10000", SEGMENT_BEST),
        pb(&p.pb_12m, "pb_5k_12m", "PB 5K (12m)", "5000", RUN_BEST),
        pb(&p.pb_12m, "pb_10k_12m", "PB 10K (12m)", "10000", RUN_BEST),
        estimate("est_5k", "Estimated 5K", p.est_5k_s),
        estimate("est_10k", "Estimated 10K", p.est_10k_s),
    ]
}

fn pb_date(entry: Option<&PersonalBest>) -> String {
    match entry.and_then(|e| e.date.as_deref()).filter(|d| !d.is_empty()) {
        Some(date) => prefix(Some(date), 10),
        None => PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card<'a>(cards: &'a [InsightCard], id: &str) -> &'a InsightCard {
        cards.iter().find(|c| c.id == id).unwrap()
    }

    #[test]
    fn test_decoupling_boundaries() {
        assert_eq!(tone_for_decoupling(Some(5.0)), Tone::Good);
        assert_eq!(tone_for_decoupling(Some(5.01)), Tone::Warn);
        assert_eq!(tone_for_decoupling(Some(10.0)), Tone::Warn);
        assert_eq!(tone_for_decoupling(Some(10.01)), Tone::Bad);
        assert_eq!(tone_for_decoupling(Some(-4.0)), Tone::Good);
        assert_eq!(tone_for_decoupling(None), Tone::Neutral);
        assert_eq!(tone_for_decoupling(Some(f64::NAN)), Tone::Neutral);
    }

    #[test]
    fn test_trend_tones() {
        assert_eq!(tone_for_trend(Some(-1.2), true), Tone::Good);
        assert_eq!(tone_for_trend(Some(0.0), true), Tone::Warn);
        assert_eq!(tone_for_trend(Some(0.3), false), Tone::Good);
        assert_eq!(tone_for_trend(Some(-0.3), false), Tone::Warn);
        assert_eq!(tone_for_trend(None, false), Tone::Neutral);
    }

    #[test]
    fn test_recovery_tones() {
        assert_eq!(tone_for_recovery(Some(70.0)), Tone::Good);
        assert_eq!(tone_for_recovery(Some(69.9)), Tone::Warn);
        assert_eq!(tone_for_recovery(Some(50.0)), Tone::Warn);
        assert_eq!(tone_for_recovery(Some(49.9)), Tone::Bad);
    }

    #[test]
    fn test_empty_payload_renders_placeholders() {
        let set = build_insights(&InsightsPayload::default());
        assert_eq!(set.insights.len(), 11);
        assert_eq!(set.performance.len(), 6);

        for c in set.insights.iter().chain(set.performance.iter()) {
            assert_eq!(c.value, PLACEHOLDER, "card {}", c.id);
            assert_eq!(c.tone, Tone::Neutral, "card {}", c.id);
        }
        assert_eq!(card(&set.insights, "fatigue_load").hint, "Load = moving_s × avg HR");
        assert_eq!(card(&set.performance, "pb_5k_all").hint, PLACEHOLDER);
    }

    #[test]
    fn test_nan_renders_placeholder() {
        let payload = InsightsPayload {
            vdot_best: Some(f64::NAN),
            monotony: Some(f64::NAN),
            pace_trend_sec_per_week: Some(f64::NAN),
            ..Default::default()
        };
        let set = build_insights(&payload);
        assert_eq!(card(&set.insights, "vdot").value, PLACEHOLDER);
        assert_eq!(card(&set.insights, "monotony").value, PLACEHOLDER);
        assert_eq!(card(&set.insights, "pace_trend").value, PLACEHOLDER);
    }

    #[test]
    fn test_populated_payload() {
        let payload: InsightsPayload = serde_json::from_value(serde_json::json!({
            "vdot_best": 48.27,
            "pace_trend_sec_per_week": -1.234,
            "hr_trend_bpm_per_week": 0.5,
            "decoupling_28d": 6.26,
            "monotony": 1.457,
            "dist_7d_km": 21.04,
            "dist_28d_km": 80.0,
            "fatigue_4w_avg": 1_250_000.0,
            "fatigue_last_week": 980_500.0,
            "recovery_index_28d": 72.0,
            "pb_all": {"5000": {"time_s": 1225.0, "date": "2024-05-01T08:00:00"}},
            "est_10k_s": 2700.0
        }))
        .unwrap();
        let set = build_insights(&payload);

        let vdot = card(&set.insights, "vdot");
        assert_eq!(vdot.value, "48.3");
        assert_eq!(vdot.tone, Tone::Good);

        let pace = card(&set.insights, "pace_trend");
        assert_eq!(pace.value, "-1.23 sec/km/wk");
        assert_eq!(pace.tone, Tone::Good);

        let hr = card(&set.insights, "hr_trend");
        assert_eq!(hr.value, "+0.50 bpm/wk");
        assert_eq!(hr.tone, Tone::Warn);

        let decoupling = card(&set.insights, "decoupling");
        assert_eq!(decoupling.value, "6.3%");
        assert_eq!(decoupling.tone, Tone::Warn);

        assert_eq!(card(&set.insights, "monotony").value, "1.46");
        assert_eq!(card(&set.insights, "volume").value, "21.0 / 80.0 km");

        let fatigue = card(&set.insights, "fatigue_load");
        assert_eq!(fatigue.value, "1.25M");
        assert_eq!(fatigue.hint, "Last week: 980.5k");

        assert_eq!(card(&set.insights, "recovery_index").tone, Tone::Good);

        let pb = card(&set.performance, "pb_5k_all");
        assert_eq!(pb.value, "20:25");
        assert_eq!(pb.hint, "2024-05-01");
        assert_eq!(card(&set.performance, "est_10k").value, "45:00");
        assert_eq!(card(&set.performance, "est_5k").hint, "Segment-based");
    }

    #[test]
    fn test_performance_tooltips_describe_source() {
        let set = build_insights(&InsightsPayload::default());
        let tip = &card(&set.performance, "pb_10k_12m").tooltip;
        assert_eq!(tip.summary, "PB 10K (12m).");
        assert_eq!(tip.calc, RUN_BEST);
        assert_eq!(card(&set.performance, "pb_5k_all").tooltip.calc, SEGMENT_BEST);
        assert_eq!(
            card(&set.performance, "est_5k").tooltip.calc,
            "Riegel projection of a segment best."
        );
    }
}
