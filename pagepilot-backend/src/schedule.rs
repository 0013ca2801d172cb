//! Posting-schedule arithmetic
//!
//! A schedule is a comma-separated list of minutes of the hour ("00,15,30,45").
//! Everything here is pure and works in UTC.

use chrono::{DateTime, Duration, Timelike, Utc};

/// Used when a schedule has no valid minutes
const FALLBACK_MINUTES: i64 = 60;
/// How far ahead `next_available_slot` searches
const SLOT_SEARCH_HOURS: i64 = 24;
/// A slot within this many seconds of an existing scheduled post is taken
const SLOT_CONFLICT_SECS: i64 = 60;

/// Parse a schedule spec into sorted, deduplicated minutes in [0, 60).
/// Items that aren't integers in range are dropped.
pub fn parse_schedule_minutes(spec: &str) -> Vec<u32> {
    let mut minutes: Vec<u32> = spec
        .split(',')
        .filter_map(|item| item.trim().parse::<u32>().ok())
        .filter(|m| *m < 60)
        .collect();
    minutes.sort_unstable();
    minutes.dedup();
    minutes
}

fn truncate_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts - Duration::seconds(i64::from(ts.minute() * 60 + ts.second()))
        - Duration::nanoseconds(i64::from(ts.nanosecond()))
}

/// Next wall-clock time whose minute is in the schedule, strictly after `now`'s minute.
///
/// Wraps to the first scheduled minute of the next hour (and day) when the
/// current minute is past every scheduled one. An empty schedule yields
/// `now + 60 minutes`.
pub fn next_scheduled_time(schedule_spec: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let minutes = parse_schedule_minutes(schedule_spec);
    let Some(&first) = minutes.first() else {
        return now + Duration::minutes(FALLBACK_MINUTES);
    };

    let hour_start = truncate_to_hour(now);
    let current = now.minute();

    match minutes.iter().find(|m| **m > current) {
        Some(&minute) => hour_start + Duration::minutes(i64::from(minute)),
        None => hour_start + Duration::hours(1) + Duration::minutes(i64::from(first)),
    }
}

/// First scheduled slot at least `min_lead` after `now` that is not within a
/// minute of an already-scheduled post (`taken`, Unix seconds).
///
/// Searches the current hour and the following 23. Falls back to
/// `now + 60 minutes` when the schedule is empty or every slot is taken.
pub fn next_available_slot(
    schedule_spec: &str,
    now: DateTime<Utc>,
    taken: &[i64],
    min_lead: Duration,
) -> DateTime<Utc> {
    let fallback = now + Duration::minutes(FALLBACK_MINUTES);
    let minutes = parse_schedule_minutes(schedule_spec);
    if minutes.is_empty() {
        return fallback;
    }

    let earliest = now + min_lead;
    let hour_start = truncate_to_hour(now);

    for hour_offset in 0..SLOT_SEARCH_HOURS {
        for &minute in &minutes {
            let candidate =
                hour_start + Duration::hours(hour_offset) + Duration::minutes(i64::from(minute));
            if candidate < earliest {
                continue;
            }

            let ts = candidate.timestamp();
            if taken.iter().any(|t| (t - ts).abs() < SLOT_CONFLICT_SECS) {
                continue;
            }

            return candidate;
        }
    }

    fallback
}
