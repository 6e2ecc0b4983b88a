//! Display formatting for prices, dates, durations and relative times
//!
//! Prices and long dates follow Mexican Spanish conventions (the market the
//! backend serves); short dates and clock times use the compact English
//! forms shown in result lists. Unparseable date input is returned unchanged.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};

use crate::locale::{self, Locale};
use crate::types::FlightDuration;

const MONTHS_ES: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sept", "oct", "nov", "dic",
];
const MONTHS_EN: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Whole-unit currency amount, e.g. `$18,250` or `USD 1,299`
pub fn format_price(price: f64, currency: &str) -> String {
    let rounded = price.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = group_thousands(rounded.abs() as u64);

    if currency.eq_ignore_ascii_case("MXN") {
        format!("{}${}", sign, digits)
    } else {
        format!("{}{} {}", sign, currency.to_uppercase(), digits)
    }
}

fn group_thousands(value: u64) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, ch) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Wall-clock date/time as written in the string
pub(crate) fn parse_naive(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Absolute instant; strings without an offset are taken as UTC
pub(crate) fn parse_utc(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value.trim()) {
        return Some(dt.with_timezone(&Utc));
    }
    parse_naive(value).map(|naive| naive.and_utc())
}

/// `"27 dic 2024"`
pub fn format_date(value: &str) -> String {
    match parse_naive(value) {
        Some(dt) => format!(
            "{} {} {}",
            dt.day(),
            MONTHS_ES[dt.month0() as usize],
            dt.year()
        ),
        None => value.to_string(),
    }
}

/// `"Dec 27"`, or empty for empty input
pub fn format_short_date(value: &str) -> String {
    if value.trim().is_empty() {
        return String::new();
    }
    match parse_naive(value) {
        Some(dt) => format!("{} {}", MONTHS_EN[dt.month0() as usize], dt.day()),
        None => value.to_string(),
    }
}

/// `"27 dic, 14:30"`
pub fn format_date_time(value: &str) -> String {
    match parse_naive(value) {
        Some(dt) => format!(
            "{} {}, {:02}:{:02}",
            dt.day(),
            MONTHS_ES[dt.month0() as usize],
            dt.hour(),
            dt.minute()
        ),
        None => value.to_string(),
    }
}

/// 24-hour `"14:30"`, `"N/A"` when absent
pub fn format_time(value: Option<&str>) -> String {
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        return "N/A".to_string();
    };
    match parse_naive(value) {
        Some(dt) => format!("{:02}:{:02}", dt.hour(), dt.minute()),
        None => value.to_string(),
    }
}

/// `"2h 30m"` from minutes or an ISO-8601 duration; `"N/A"` when absent
pub fn format_duration(duration: Option<&FlightDuration>) -> String {
    match duration {
        None | Some(FlightDuration::Minutes(0)) => "N/A".to_string(),
        Some(FlightDuration::Minutes(minutes)) => {
            format!("{}h {}m", minutes / 60, minutes % 60)
        }
        Some(FlightDuration::Iso8601(iso)) if iso.trim().is_empty() => "N/A".to_string(),
        Some(FlightDuration::Iso8601(iso)) => iso
            .replacen("PT", "", 1)
            .replacen('H', "h ", 1)
            .replacen('M', "m", 1)
            .trim_end()
            .to_string(),
    }
}

/// Stop count as a short label, `"nonstop"` / `"directo"` for zero
pub fn format_stops_in(stops: u32, locale: Locale) -> String {
    match (stops, locale) {
        (0, Locale::En) => "nonstop".to_string(),
        (0, Locale::Es) => "directo".to_string(),
        (1, Locale::En) => "1 stop".to_string(),
        (1, Locale::Es) => "1 escala".to_string(),
        (n, Locale::En) => format!("{} stops", n),
        (n, Locale::Es) => format!("{} escalas", n),
    }
}

pub fn format_stops(stops: u32) -> String {
    format_stops_in(stops, locale::current())
}

/// Relative age of `value` as seen at `now`
///
/// Minutes within the last hour, hours within the last day, days otherwise.
/// Missing or unparseable input reads as "Never". Timestamps in the future
/// count as zero minutes.
pub fn format_time_ago_at(value: Option<&str>, now: DateTime<Utc>, locale: Locale) -> String {
    let Some(then) = value.and_then(parse_utc) else {
        return match locale {
            Locale::En => "Never".to_string(),
            Locale::Es => "Nunca".to_string(),
        };
    };

    let minutes = (now - then).num_minutes().max(0);
    let hours = minutes / 60;
    let days = hours / 24;

    let (amount, unit) = if minutes < 60 {
        (minutes, "m")
    } else if hours < 24 {
        (hours, "h")
    } else {
        (days, "d")
    };

    match locale {
        Locale::En => format!("{}{} ago", amount, unit),
        Locale::Es => format!("hace {}{}", amount, unit),
    }
}

/// [`format_time_ago_at`] against the current time in the active locale
pub fn format_time_ago(value: Option<&str>) -> String {
    format_time_ago_at(value, Utc::now(), locale::current())
}
