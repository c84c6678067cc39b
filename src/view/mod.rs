//! View Models
//!
//! Pure builders that turn API payloads into display-ready structures:
//!
//! - **format**: Number/time formatting with placeholder fallbacks
//! - **overview**: Summary cards and week range
//! - **insights**: Insight and performance cards
//! - **activities**: Activity filter, list rows and paging state
//! - **activity**: Activity detail, laps and segments
//! - **trend**: Weekly trend of a single metric
//! - **profile**: Profile fields

pub mod activities;
pub mod activity;
pub mod format;
pub mod insights;
pub mod overview;
pub mod profile;
pub mod trend;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use activities::{
    ActivitiesView, ActivityFilter, ActivityPage, ActivityRow, RangeMode, PAGE_SIZE,
};
pub use activity::{ActivityBundle, ActivityDetailView, HeroStat, LapRow};
pub use insights::{InsightCard, InsightSet, Tooltip};
pub use overview::{OverviewView, SummaryCard, WeekRange};
pub use profile::{Profile, ProfileView};
pub use trend::TrendView;

/// The three activity types the dashboard knows about, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Run,
    Golf,
    Walk,
}

impl ActivityType {
    pub const ALL: [ActivityType; 3] = [ActivityType::Run, ActivityType::Golf, ActivityType::Walk];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "run" => Some(ActivityType::Run),
            "golf" => Some(ActivityType::Golf),
            "walk" => Some(ActivityType::Walk),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Run => "run",
            ActivityType::Golf => "golf",
            ActivityType::Walk => "walk",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivityType::Run => "Running",
            ActivityType::Golf => "Golf",
            ActivityType::Walk => "Walking",
        }
    }

    /// Count noun, always plural ("1 rounds")
    pub fn count_noun(&self) -> &'static str {
        match self {
            ActivityType::Run => "runs",
            ActivityType::Golf => "rounds",
            ActivityType::Walk => "walks",
        }
    }

    pub fn accent(&self) -> Accent {
        Accent::of(Some(self.as_str()))
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual accent of a card or row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accent {
    Run,
    Golf,
    Neutral,
}

impl Accent {
    /// Golf stays golf, walk is neutral, everything else (including unknown
    /// types) is run
    pub fn of(activity_type: Option<&str>) -> Self {
        match activity_type {
            Some("golf") => Accent::Golf,
            Some("walk") => Accent::Neutral,
            _ => Accent::Run,
        }
    }
}

/// Qualitative tone of an insight card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Good,
    Warn,
    Bad,
    Neutral,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Good => "good",
            Tone::Warn => "warn",
            Tone::Bad => "bad",
            Tone::Neutral => "neutral",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accent_normalization() {
        assert_eq!(Accent::of(Some("golf")), Accent::Golf);
        assert_eq!(Accent::of(Some("walk")), Accent::Neutral);
        assert_eq!(Accent::of(Some("run")), Accent::Run);
        assert_eq!(Accent::of(Some("ride")), Accent::Run);
        assert_eq!(Accent::of(None), Accent::Run);
    }

    #[test]
    fn test_activity_type_parse() {
        for t in ActivityType::ALL {
            assert_eq!(ActivityType::parse(t.as_str()), Some(t));
        }
        assert_eq!(ActivityType::parse("Run"), None);
        assert_eq!(ActivityType::parse("123"), None);
    }
}
