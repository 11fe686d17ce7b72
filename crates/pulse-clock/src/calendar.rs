use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// The calendar-aware breakdown shown on the detail panel. Years and months
/// count completed anniversaries plus the elapsed fraction toward the next
/// one; days, hours and minutes are flat ratios of elapsed time to fixed
/// unit sizes with no calendar awareness. All five are pre-truncated to one
/// decimal; render with `{:.1}`. Seconds is the flat floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetailedElapsed {
    pub years: f64,
    pub months: f64,
    pub days: f64,
    pub hours: f64,
    pub minutes: f64,
    pub seconds: i64,
}

pub fn detailed_elapsed<Tz: TimeZone>(start: &DateTime<Tz>, now: &DateTime<Tz>) -> DetailedElapsed {
    let total_ms = now
        .clone()
        .signed_duration_since(start.clone())
        .num_milliseconds();
    let s = start.naive_local();
    let n = now.naive_local();

    // Completed year anniversaries, minus one if this year's hasn't
    // occurred yet, plus the fraction elapsed between the surrounding
    // anniversaries.
    let mut completed_years = n.year() - s.year();
    if with_year(s, n.year()) > n {
        completed_years -= 1;
    }
    let last = with_year(s, s.year() + completed_years);
    let next = with_year(s, s.year() + completed_years + 1);
    let total_years = completed_years as f64 + ms_between(last, n) / ms_between(last, next);

    // Same construction on month boundaries.
    let mut completed_months =
        (n.year() - s.year()) * 12 + (n.month0() as i32 - s.month0() as i32);
    if add_months(s, completed_months) > n {
        completed_months -= 1;
    }
    let last = add_months(s, completed_months);
    let next = add_months(s, completed_months + 1);
    let total_months = completed_months as f64 + ms_between(last, n) / ms_between(last, next);

    let total_seconds = total_ms as f64 / 1000.0;
    let total_minutes = total_seconds / 60.0;
    let total_hours = total_minutes / 60.0;
    let total_days = total_hours / 24.0;

    DetailedElapsed {
        years: floor_to_one_decimal(total_years),
        months: floor_to_one_decimal(total_months),
        days: floor_to_one_decimal(total_days),
        hours: floor_to_one_decimal(total_hours),
        minutes: floor_to_one_decimal(total_minutes),
        seconds: total_seconds.floor() as i64,
    }
}

/// Truncate, not round: 1.59 displays as 1.5.
fn floor_to_one_decimal(n: f64) -> f64 {
    (n * 10.0).floor() / 10.0
}

fn ms_between(a: NaiveDateTime, b: NaiveDateTime) -> f64 {
    (b - a).num_milliseconds() as f64
}

fn with_year(dt: NaiveDateTime, year: i32) -> NaiveDateTime {
    shift(dt, year, dt.month0())
}

fn add_months(dt: NaiveDateTime, months: i32) -> NaiveDateTime {
    let total = dt.year() * 12 + dt.month0() as i32 + months;
    shift(dt, total.div_euclid(12), total.rem_euclid(12) as u32)
}

/// Rebuild `dt` at the given year/month, letting day-of-month overflow roll
/// into the following month (Jan 31 shifted to February lands on Mar 2 or
/// Mar 3). Anniversary dates in the shipped display behave this way.
fn shift(dt: NaiveDateTime, year: i32, month0: u32) -> NaiveDateTime {
    let first = NaiveDate::from_ymd_opt(year, month0 + 1, 1)
        .expect("first of month is always constructible");
    (first + Duration::days(dt.day() as i64 - 1)).and_time(dt.time())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn exact_two_year_anniversary_reads_two_point_zero() {
        let start = at("2022-06-15T12:00:00Z");
        let now = at("2024-06-15T12:00:00Z");
        let d = detailed_elapsed(&start, &now);
        assert_eq!(d.years, 2.0);
        assert_eq!(format!("{:.1}", d.years), "2.0");
        assert_eq!(d.months, 24.0);
    }

    #[test]
    fn half_year_fractions() {
        // 184 days; the surrounding year window spans the 2024 leap day.
        let start = at("2023-03-10T00:00:00Z");
        let now = at("2023-09-10T00:00:00Z");
        let d = detailed_elapsed(&start, &now);
        assert_eq!(d.years, 0.5);
        assert_eq!(d.months, 6.0);
        assert_eq!(d.days, 184.0);
        assert_eq!(d.hours, 4416.0);
        assert_eq!(d.minutes, 264_960.0);
        assert_eq!(d.seconds, 15_897_600);
    }

    #[test]
    fn fractions_truncate_rather_than_round() {
        let now = at("2024-06-15T12:00:00Z");
        // 1.59 days elapsed: truncates to 1.5, never rounds to 1.6.
        let start = now - chrono::Duration::milliseconds(137_376_000);
        let d = detailed_elapsed(&start, &now);
        assert_eq!(d.days, 1.5);
    }

    #[test]
    fn year_count_decrements_before_this_years_anniversary() {
        let start = at("2020-09-01T00:00:00Z");
        let now = at("2024-06-15T00:00:00Z");
        let d = detailed_elapsed(&start, &now);
        // Fourth anniversary hasn't happened yet: 3 complete years plus
        // 288 of the 366 days toward the next one.
        assert_eq!(d.years, 3.7);
    }

    #[test]
    fn month_anniversaries_roll_over_short_months() {
        // Starting on Jan 31, the February anniversary lands on Mar 3
        // (2023 is not a leap year), so mid-March is 1 complete month plus
        // 12 of the 28 days toward the rolled-over March anniversary.
        let start = at("2023-01-31T00:00:00Z");
        let now = at("2023-03-15T00:00:00Z");
        let d = detailed_elapsed(&start, &now);
        assert_eq!(d.months, 1.4);
        assert_eq!(d.years, 0.1);
    }

    #[test]
    fn seconds_floor_flat() {
        let now = at("2024-06-15T12:00:00Z");
        let start = now - chrono::Duration::milliseconds(90_061_999);
        assert_eq!(detailed_elapsed(&start, &now).seconds, 90_061);
    }
}
