//! Display formatting shared by the view-model builders
//!
//! Every formatter takes optional input and falls back to [`PLACEHOLDER`]
//! for missing or non-finite values, never `"0"` or `"NaN"`.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

/// Rendered in place of any missing value
pub const PLACEHOLDER: &str = "—";

/// Drop missing, NaN and infinite values
pub fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Like [`finite`], additionally treating zero as missing (JS truthiness on
/// distances, durations and paces)
pub fn positive(value: Option<f64>) -> Option<f64> {
    finite(value).filter(|v| *v != 0.0)
}

/// Seconds as `m:ss`; minutes are not folded into hours
pub fn format_time(seconds: f64) -> String {
    let total = seconds.round() as i64;
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();
    format!("{}{}:{:02}", sign, total / 60, total % 60)
}

/// Seconds per kilometre as `m:ss /km`
pub fn format_pace(sec_per_km: f64) -> String {
    format!("{} /km", format_time(sec_per_km))
}

/// Optional duration, placeholder when missing or zero
pub fn time_or_placeholder(seconds: Option<f64>) -> String {
    positive(seconds)
        .map(format_time)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Optional pace, placeholder when missing or zero
pub fn pace_or_placeholder(sec_per_km: Option<f64>) -> String {
    positive(sec_per_km)
        .map(format_pace)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Metres as kilometres with `decimals` places and a ` km` suffix
pub fn format_km(distance_m: f64, decimals: usize) -> String {
    format!("{:.*} km", decimals, distance_m / 1000.0)
}

/// Optional distance, placeholder when missing or zero
pub fn km_or_placeholder(distance_m: Option<f64>, decimals: usize) -> String {
    positive(distance_m)
        .map(|d| format_km(d, decimals))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Fixed decimals, placeholder when missing
pub fn fixed(value: Option<f64>, decimals: usize) -> String {
    finite(value)
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Per-week delta with explicit sign and two decimals, e.g. `+0.42 bpm/wk`
pub fn format_signed(value: Option<f64>, suffix: &str) -> String {
    match finite(value) {
        Some(v) => {
            let sign = if v > 0.0 { "+" } else { "" };
            format!("{}{:.2}{}", sign, v, suffix)
        }
        None => PLACEHOLDER.to_string(),
    }
}

/// Large magnitudes with `k` / `M` suffixes
pub fn format_compact(value: Option<f64>) -> String {
    let Some(v) = finite(value) else {
        return PLACEHOLDER.to_string();
    };
    let abs = v.abs();
    if abs >= 1_000_000.0 {
        format!("{:.2}M", v / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.1}k", v / 1_000.0)
    } else {
        format!("{:.0}", v)
    }
}

/// Magnitude-aware precision for chart values
pub fn format_value(value: Option<f64>) -> String {
    let Some(v) = finite(value) else {
        return PLACEHOLDER.to_string();
    };
    let abs = v.abs();
    if abs >= 1000.0 {
        format!("{:.0}", v)
    } else if abs >= 10.0 {
        format!("{:.1}", v)
    } else {
        format!("{:.2}", v)
    }
}

/// First `n` characters of an optional string
pub fn prefix(value: Option<&str>, n: usize) -> String {
    value.unwrap_or_default().chars().take(n).collect()
}

/// Freshness timestamp as `dd/mm/yyyy - HH:MM` in local time
pub fn format_last_update(raw: &str) -> String {
    format_last_update_in(raw, &Local)
}

/// [`format_last_update`] in an explicit time zone. Unparsable input is
/// returned verbatim.
pub fn format_last_update_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    const DISPLAY: &str = "%d/%m/%Y - %H:%M";

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(tz).format(DISPLAY).to_string();
    }
    // Timestamps without an offset are already local
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return naive.format(DISPLAY).to_string();
        }
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(268.4), "4:28");
        assert_eq!(format_time(242.2), "4:02");
        assert_eq!(format_time(1.8), "0:02");
        assert_eq!(format_time(983.0), "16:23");
        // Rounding carries into the minute instead of printing 4:60
        assert_eq!(format_time(299.6), "5:00");
        assert_eq!(format_time(4512.0), "75:12");
    }

    #[test]
    fn test_format_pace() {
        assert_eq!(format_pace(245.0), "4:05 /km");
        assert_eq!(pace_or_placeholder(None), PLACEHOLDER);
        assert_eq!(pace_or_placeholder(Some(0.0)), PLACEHOLDER);
    }

    #[test]
    fn test_distance() {
        assert_eq!(format_km(25300.0, 1), "25.3 km");
        assert_eq!(format_km(4010.0, 2), "4.01 km");
        assert_eq!(km_or_placeholder(Some(0.0), 1), PLACEHOLDER);
        assert_eq!(km_or_placeholder(Some(f64::NAN), 1), PLACEHOLDER);
    }

    #[test]
    fn test_format_signed() {
        assert_eq!(format_signed(Some(0.4219), " bpm/wk"), "+0.42 bpm/wk");
        assert_eq!(format_signed(Some(-1.5), " sec/km/wk"), "-1.50 sec/km/wk");
        assert_eq!(format_signed(Some(0.0), " /wk"), "0.00 /wk");
        assert_eq!(format_signed(None, " /wk"), PLACEHOLDER);
        assert_eq!(format_signed(Some(f64::NAN), " /wk"), PLACEHOLDER);
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(Some(950.0)), "950");
        assert_eq!(format_compact(Some(45_250.0)), "45.3k");
        assert_eq!(format_compact(Some(2_500_000.0)), "2.50M");
        assert_eq!(format_compact(Some(-12_000.0)), "-12.0k");
        assert_eq!(format_compact(Some(f64::NAN)), PLACEHOLDER);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(Some(1234.5)), "1235");
        assert_eq!(format_value(Some(52.34)), "52.3");
        assert_eq!(format_value(Some(3.14159)), "3.14");
        assert_eq!(format_value(None), PLACEHOLDER);
    }

    #[test]
    fn test_format_last_update() {
        assert_eq!(
            format_last_update_in("2026-02-01T14:12:06.216132+00:00", &Utc),
            "01/02/2026 - 14:12"
        );
        assert_eq!(
            format_last_update_in("2026-02-01T14:12:06", &Utc),
            "01/02/2026 - 14:12"
        );
        assert_eq!(format_last_update_in("yesterday", &Utc), "yesterday");
    }

    #[test]
    fn test_prefix() {
        assert_eq!(prefix(Some("2026-02-01T12:16:07Z"), 10), "2026-02-01");
        assert_eq!(prefix(None, 10), "");
    }
}
