use chrono::{Datelike, Months, NaiveDate};

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Moves a month-start date forward by `months` whole months.
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    first_day_of_month(date)
        .checked_add_months(Months::new(months))
        .unwrap_or(date)
}

/// Formats a date as "YYYY-MM".
pub fn month_label(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// `part / whole * 100`, or `None` when `whole` is zero.
pub fn percent_of(part: f64, whole: f64) -> Option<f64> {
    if whole == 0.0 {
        None
    } else {
        Some(part / whole * 100.0)
    }
}

/// Percentage change from `base` to `new`, or `None` when `base` is zero.
pub fn percent_change(base: f64, new: f64) -> Option<f64> {
    percent_of(new - base, base)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn round2_opt(value: Option<f64>) -> Option<f64> {
    value.map(round2)
}

pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
