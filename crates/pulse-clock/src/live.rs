use chrono::{DateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

const MS_PER_DAY: i64 = 86_400_000;

/// The live counter shown on an event card, recomputed every second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveElapsed {
    pub total_days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

/// Compute the live counter for a moment that started at `start`, sampled
/// at `now`.
///
/// Not a pure duration decomposition. `total_days` is the floored
/// elapsed-millisecond day count, while hours/minutes/seconds are a
/// clock-face difference with borrow propagation: seconds borrows from
/// minutes, minutes from hours, and hours wraps mod 24 without ever
/// borrowing from `total_days`. The two halves can disagree around
/// daylight-saving shifts or month-length anomalies; downstream displays
/// depend on this exact decomposition.
pub fn live_elapsed<Tz: TimeZone>(start: &DateTime<Tz>, now: &DateTime<Tz>) -> LiveElapsed {
    let total_ms = now
        .clone()
        .signed_duration_since(start.clone())
        .num_milliseconds();
    let total_days = total_ms.div_euclid(MS_PER_DAY);

    let mut hours = now.time().hour() as i64 - start.time().hour() as i64;
    let mut minutes = now.time().minute() as i64 - start.time().minute() as i64;
    let mut seconds = now.time().second() as i64 - start.time().second() as i64;

    if seconds < 0 {
        seconds += 60;
        minutes -= 1;
    }
    if minutes < 0 {
        minutes += 60;
        hours -= 1;
    }
    if hours < 0 {
        hours += 24;
    }

    LiveElapsed {
        total_days,
        hours,
        minutes,
        seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn one_day_one_hour_one_minute_one_second() {
        let now = at("2024-06-15T12:00:00Z");
        let start = now - Duration::milliseconds(90_061_000);
        let elapsed = live_elapsed(&start, &now);
        assert_eq!(
            elapsed,
            LiveElapsed {
                total_days: 1,
                hours: 1,
                minutes: 1,
                seconds: 1
            }
        );
    }

    #[test]
    fn zero_at_the_starting_instant() {
        let now = at("2024-06-15T12:00:00Z");
        assert_eq!(
            live_elapsed(&now, &now),
            LiveElapsed {
                total_days: 0,
                hours: 0,
                minutes: 0,
                seconds: 0
            }
        );
    }

    #[test]
    fn seconds_borrow_from_minutes() {
        let start = at("2024-06-15T12:00:30Z");
        let now = at("2024-06-15T12:01:10Z");
        let elapsed = live_elapsed(&start, &now);
        assert_eq!((elapsed.minutes, elapsed.seconds), (0, 40));
    }

    #[test]
    fn borrow_cascades_across_midnight_without_touching_total_days() {
        // 1h 20m 30s elapsed but spanning a midnight boundary: the day count
        // stays at the floored total while the clock face wraps.
        let start = at("2024-01-01T23:50:00Z");
        let now = at("2024-01-02T01:10:30Z");
        let elapsed = live_elapsed(&start, &now);
        assert_eq!(
            elapsed,
            LiveElapsed {
                total_days: 0,
                hours: 1,
                minutes: 20,
                seconds: 30
            }
        );
    }

    #[test]
    fn day_count_floors_partial_days() {
        let start = at("2024-06-01T00:00:00Z");
        let now = at("2024-06-03T23:59:59Z");
        assert_eq!(live_elapsed(&start, &now).total_days, 2);
    }

    #[test]
    fn clock_face_can_disagree_with_duration_day_count() {
        // 23 hours elapsed: zero full days, but the clock-face hours wrap
        // to 23 rather than borrowing a day.
        let start = at("2024-06-14T23:00:00Z");
        let now = at("2024-06-15T22:00:00Z");
        let elapsed = live_elapsed(&start, &now);
        assert_eq!((elapsed.total_days, elapsed.hours), (0, 23));
    }
}
