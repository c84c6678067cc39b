//! Profile screen

use serde::{Deserialize, Serialize};

use super::format::{finite, PLACEHOLDER};
use super::HeroStat;

/// Athlete profile fields used by the performance metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: Option<f64>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub resting_hr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileView {
    pub name: String,
    pub stats: Vec<HeroStat>,
}

fn field(label: &str, value: Option<f64>, unit: &str) -> HeroStat {
    HeroStat {
        label: label.to_string(),
        value: finite(value)
            .map(|v| format!("{}{}", v, unit))
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
    }
}

pub fn build_profile(profile: &Profile) -> ProfileView {
    ProfileView {
        name: if profile.name.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            profile.name.clone()
        },
        stats: vec![
            field("Age", profile.age, ""),
            field("Height", profile.height_cm, " cm"),
            field("Weight", profile.weight_kg, " kg"),
            field("Resting HR", profile.resting_hr, " bpm"),
        ],
    }
}
