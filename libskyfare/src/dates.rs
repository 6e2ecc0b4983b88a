//! Default travel dates for the search form

use chrono::{Days, Local, NaiveDate};

/// Departure defaults to one month out
pub const DEPARTURE_OFFSET_DAYS: u64 = 30;
/// Return defaults to a week after departure
pub const RETURN_OFFSET_DAYS: u64 = 37;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn offset(today: NaiveDate, days: u64) -> String {
    today
        .checked_add_days(Days::new(days))
        .unwrap_or(today)
        .format(DATE_FORMAT)
        .to_string()
}

/// `today + 30` as `YYYY-MM-DD`
pub fn default_departure_date_from(today: NaiveDate) -> String {
    offset(today, DEPARTURE_OFFSET_DAYS)
}

/// `today + 37` as `YYYY-MM-DD`
pub fn default_return_date_from(today: NaiveDate) -> String {
    offset(today, RETURN_OFFSET_DAYS)
}

pub fn default_departure_date() -> String {
    default_departure_date_from(Local::now().date_naive())
}

pub fn default_return_date() -> String {
    default_return_date_from(Local::now().date_naive())
}

/// Whether `value` is a calendar date in `YYYY-MM-DD` form
pub fn is_valid_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, DATE_FORMAT).is_ok()
}
