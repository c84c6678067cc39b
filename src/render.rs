//! Text rendering of the active screen
//!
//! Table output mirrors the headings of the web dashboard so the same
//! screens read the same way in a terminal. JSON output dumps the view model
//! of the active screen.

use serde_json::{json, Value};
use std::fmt::Write;

use crate::app::App;
use crate::assistant::{AssistantOverviewView, AssistantSession, Role};
use crate::router::Screen;
use crate::view::format::PLACEHOLDER;
use crate::view::{ActivityDetailView, HeroStat, InsightCard, SummaryCard, TrendView};

/// Output format of the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub fn render(app: &App, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => render_table(app),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&snapshot(app)).unwrap_or_else(|e| e.to_string())
        }
    }
}

/// Machine-readable view of the active screen
pub fn snapshot(app: &App) -> Value {
    let screen = app.screen();
    let body = match screen {
        Screen::Login => json!({
            "error": app.session().error(),
        }),
        Screen::Overview => json!({
            "last_update": app.overview().last_update_label,
            "error": app.overview().error,
            "overview": app.overview().view,
        }),
        Screen::Activities => json!({
            "filter": app.activities().view.filter_label,
            "error": app.activities().page.error,
            "has_more": app.activities().page.has_more,
            "activities": app.activities().view,
        }),
        Screen::Detail => json!({
            "error": app.detail().error,
            "activity": app.detail().view,
        }),
        Screen::Insights => json!({ "insights": app.overview().view.insights }),
        Screen::Performance => json!({ "performance": app.overview().view.performance }),
        Screen::Trend => json!({
            "error": app.trend().error,
            "trend": app.trend().view,
        }),
        Screen::Profile => json!({ "profile": app.profile() }),
    };
    json!({
        "screen": screen,
        "path": app.current_path(),
        "data": body,
    })
}

fn render_table(app: &App) -> String {
    let mut out = String::new();
    match app.screen() {
        Screen::Login => render_login(&mut out, app),
        Screen::Overview => render_overview(&mut out, app),
        Screen::Activities => render_activities(&mut out, app),
        Screen::Detail => render_detail(&mut out, app),
        Screen::Insights => {
            heading(&mut out, "Insights");
            render_cards(&mut out, &app.overview().view.insights);
        }
        Screen::Performance => {
            heading(&mut out, "Performance");
            render_cards(&mut out, &app.overview().view.performance);
        }
        Screen::Trend => render_trend(&mut out, app),
        Screen::Profile => render_profile(&mut out, app),
    }
    out
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "=".repeat(title.chars().count().max(8)));
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "-".repeat(60));
}

fn render_login(out: &mut String, app: &App) {
    heading(out, "Sign in");
    if let Some(error) = app.session().error() {
        let _ = writeln!(out, "{}", error);
    }
    let _ = writeln!(out, "Run `fitdash login <username>` to continue.");
}

fn render_overview(out: &mut String, app: &App) {
    let state = app.overview();
    heading(out, "Dashboard");
    let _ = writeln!(out, "This Week: {}", state.view.week_label);
    if state.last_update.is_some() {
        let _ = writeln!(out, "Last updated: {}", state.last_update_label);
    }
    if let Some(error) = &state.error {
        let _ = writeln!(out, "{}", error);
    }

    section(out, "All Time");
    render_summary(out, &state.view.all_time_cards);
    section(out, "This Week");
    render_summary(out, &state.view.weekly_cards);
    section(out, "Fitness Insights");
    render_cards(out, &state.view.insights);
    section(out, "Performance (5K / 10K)");
    render_cards(out, &state.view.performance);
}

fn render_summary(out: &mut String, cards: &[SummaryCard]) {
    if cards.is_empty() {
        let _ = writeln!(out, "  {}", PLACEHOLDER);
    }
    for card in cards {
        let _ = writeln!(out, "  {:<12} {}", card.label, card.value);
    }
}

fn render_cards(out: &mut String, cards: &[InsightCard]) {
    if cards.is_empty() {
        let _ = writeln!(out, "  {}", PLACEHOLDER);
    }
    for card in cards {
        let _ = writeln!(
            out,
            "  {:<28} {:>10}  [{}]  {}",
            card.label,
            card.value,
            card.tone.as_str(),
            card.hint
        );
    }
}

fn render_activities(out: &mut String, app: &App) {
    let state = app.activities();
    heading(out, &state.view.title);
    let _ = writeln!(out, "{}", state.view.filter_label);
    let _ = writeln!(out);

    if let Some(error) = &state.page.error {
        let _ = writeln!(out, "{}", error);
    }
    if state.view.items.is_empty() {
        if state.page.loading {
            let _ = writeln!(out, "Loading activities…");
        } else {
            let _ = writeln!(out, "No activities found for this filter.");
        }
        return;
    }

    let _ = writeln!(out, "{:<12} {:<28} {:>10} {:>10}  {}", "Date", "Title", "Distance", "Time", "ID");
    let _ = writeln!(out, "{}", "-".repeat(76));
    for row in &state.view.items {
        let _ = writeln!(
            out,
            "{:<12} {:<28} {:>10} {:>10}  {}",
            row.date, row.title, row.stats[0], row.stats[1], row.id
        );
    }
    if state.page.has_more {
        let _ = writeln!(out, "More available (offset {}).", state.page.offset);
    } else {
        let _ = writeln!(out, "End of list.");
    }
}

fn render_stats(out: &mut String, stats: &[HeroStat]) {
    for stat in stats {
        let _ = writeln!(out, "  {:<20} {}", stat.label, stat.value);
    }
}

fn render_detail(out: &mut String, app: &App) {
    let state = app.detail();
    let Some(view) = &state.view else {
        heading(out, "Activity");
        let message = state
            .error
            .as_deref()
            .unwrap_or(if state.loading { "Loading activity…" } else { PLACEHOLDER });
        let _ = writeln!(out, "{}", message);
        return;
    };
    render_activity(out, view);
}

fn render_activity(out: &mut String, view: &ActivityDetailView) {
    heading(out, &view.title);
    let _ = writeln!(out, "{}", view.date);
    let _ = writeln!(out, "Location: {}   Weather: {}", view.location, view.weather);
    let _ = writeln!(out, "Tabs: {}", view.tabs.join(" | "));

    section(out, "Overview");
    render_stats(out, &view.hero_stats);
    render_stats(out, &view.key_stats);
    for note in &view.notes {
        let _ = writeln!(out, "  • {}", note);
    }

    if !view.laps.is_empty() {
        section(out, "Laps");
        let _ = writeln!(
            out,
            "  {:<6} {:>8} {:>8} {:>8} {:>8} {:>8}",
            "Lap", "Time", "Km", "Pace", "Elev", "Flat"
        );
        for lap in view.laps.iter().chain(view.lap_totals.iter()) {
            let _ = writeln!(
                out,
                "  {:<6} {:>8} {:>8} {:>8} {:>8} {:>8}",
                lap.lap, lap.time, lap.distance, lap.pace, lap.elev, lap.flat
            );
        }
    }

    let charts = [
        ("Pace", &view.charts.pace),
        ("Heart rate", &view.charts.hr),
        ("Cadence", &view.charts.cadence),
        ("Elevation", &view.charts.elevation),
    ];
    if charts.iter().any(|(_, c)| c.is_some()) {
        section(out, "Charts");
        for (label, chart) in charts {
            if let Some(chart) = chart {
                let _ = writeln!(
                    out,
                    "  {:<12} {} points  min {:.1}  avg {:.1}  max {:.1}",
                    label,
                    chart.points.len(),
                    chart.min,
                    chart.avg,
                    chart.max
                );
            }
        }
    }

    if !view.route.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Route: {} points", view.route.len());
    }

    if !view.segments.is_empty() {
        section(out, "Segments");
        let _ = writeln!(
            out,
            "  {:<8} {:>10} {:>10} {:>12} {:>10} {:>12}",
            "Dist", "This", "Best", "Date", "Best 12w", "Date"
        );
        for row in &view.segments {
            let _ = writeln!(
                out,
                "  {:<8} {:>10} {:>10} {:>12} {:>10} {:>12}",
                row.distance,
                row.this_activity,
                row.best_all,
                row.best_all_date,
                row.best_12w,
                row.best_12w_date.as_deref().unwrap_or(PLACEHOLDER)
            );
        }
    }
}

fn render_trend(out: &mut String, app: &App) {
    let state = app.trend();
    let Some(view) = &state.view else {
        heading(out, "Metric Trend");
        let _ = writeln!(out, "{}", PLACEHOLDER);
        return;
    };
    render_trend_view(out, view, state.loading, state.error.as_deref());
}

fn render_trend_view(out: &mut String, view: &TrendView, loading: bool, error: Option<&str>) {
    heading(out, &view.label);
    let _ = writeln!(out, "Last 12 months · weekly");
    let _ = writeln!(out, "Current: {}", view.value);
    let _ = writeln!(out);

    if loading {
        let _ = writeln!(out, "Loading…");
    } else if let Some(error) = error {
        let _ = writeln!(out, "{}", error);
    } else if let Some(message) = &view.message {
        let _ = writeln!(out, "{}", message);
    } else if let Some(stats) = &view.stats {
        let _ = writeln!(
            out,
            "Min {}   Avg {}   Max {}   Latest {} ({})",
            stats.min, stats.avg, stats.max, stats.latest, stats.latest_week
        );
        let _ = writeln!(out);
        for point in &view.points {
            let value = point
                .value
                .map(|v| format!("{:.2}", v))
                .unwrap_or_else(|| PLACEHOLDER.to_string());
            let _ = writeln!(out, "  {:<12} {:>10}", point.week, value);
        }
    }

    if let Some(tooltip) = &view.tooltip {
        section(out, "About this metric");
        let _ = writeln!(out, "{}", tooltip.summary);
        let _ = writeln!(out, "Calculation: {}", tooltip.calc);
        let _ = writeln!(out, "Improving: {}", tooltip.improve);
    }
}

fn render_profile(out: &mut String, app: &App) {
    let profile = app.profile();
    heading(out, "Profile");
    let _ = writeln!(out, "{}", profile.name);
    render_stats(out, &profile.stats);
}

/// Chat transcript with the follow-ups of the latest answer
pub fn render_transcript(session: &AssistantSession) -> String {
    render_transcript_since(session, 0)
}

/// Render the turns from `start` on, then the error and follow-ups
pub fn render_transcript_since(session: &AssistantSession, start: usize) -> String {
    let mut out = String::new();
    for message in session.transcript().iter().skip(start) {
        match message.role {
            Role::User => {
                let _ = writeln!(out, "> {}", message.text);
            }
            Role::Assistant => {
                let _ = writeln!(out, "{}", message.text);
                if let Some(extras) = &message.extras {
                    if let Some(today) = &extras.today {
                        let _ = writeln!(out, "Today: {}", today);
                    }
                    if let Some(trend) = &extras.trend {
                        let _ = writeln!(out, "Trend: {}", trend);
                    }
                    if extras.predicted_5k.is_some() || extras.predicted_10k.is_some() {
                        let _ = writeln!(
                            out,
                            "Predicted: 5K {}  10K {}",
                            extras.predicted_5k.as_deref().unwrap_or(PLACEHOLDER),
                            extras.predicted_10k.as_deref().unwrap_or(PLACEHOLDER)
                        );
                    }
                }
                for rec in &message.recommendations {
                    let _ = writeln!(out, "  • {}", rec);
                }
            }
        }
        let _ = writeln!(out);
    }
    if let Some(error) = session.error() {
        let _ = writeln!(out, "{}", error);
    }
    let follow_ups = session.follow_ups();
    if !follow_ups.is_empty() {
        let _ = writeln!(out, "Follow-ups:");
        for (i, question) in follow_ups.iter().enumerate() {
            let _ = writeln!(out, "  [{}] {}", i, question);
        }
    }
    out
}

pub fn render_assistant_overview(view: &AssistantOverviewView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Today: {}", view.today);
    let _ = writeln!(out, "Trend: {}", view.trend);
    for (distance, time) in &view.predictions {
        let _ = writeln!(out, "Predicted {}: {}", distance, time);
    }
    out
}
