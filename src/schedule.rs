use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime};

use crate::models::ClassEntry;

/// Used when an entry carries no usable lead value.
pub const DEFAULT_LEAD_MINUTES: u32 = 10;

/// A reminder up to this far in the future counts as due on a poll.
const DUE_FORWARD_MS: i64 = 30 * 60 * 1000;
/// A reminder at most this far in the past still counts as due; anything
/// staler is dropped rather than re-fired.
const DUE_BACKWARD_MS: i64 = 60 * 1000;

/// Parses a "HH:MM" wall-clock string. Anything unparseable, including an
/// empty string or out-of-range fields, is treated as midnight.
pub fn parse_start_time(raw: &str) -> NaiveTime {
    let mut parts = raw.split(':');
    parts
        .next()
        .zip(parts.next())
        .and_then(|(h, m)| Some((h.trim().parse().ok()?, m.trim().parse().ok()?)))
        .and_then(|(h, m)| NaiveTime::from_hms_opt(h, m, 0))
        .unwrap_or(NaiveTime::MIN)
}

pub fn lead_minutes(entry: &ClassEntry) -> i64 {
    entry
        .reminder_lead_minutes
        .map_or(i64::from(DEFAULT_LEAD_MINUTES), i64::from)
}

/// Next local instant at which the entry's weekly slot begins, strictly after
/// `reference` and at most 7 days later. A slot starting exactly at
/// `reference` counts as already occurred and resolves to next week.
pub fn next_occurrence(entry: &ClassEntry, reference: NaiveDateTime) -> NaiveDateTime {
    let start = parse_start_time(&entry.start_time);
    let reference_day = i64::from(reference.weekday().num_days_from_sunday());
    let days_ahead = (i64::from(entry.day) - reference_day + 7) % 7;
    let mut candidate = reference.date().and_time(start) + Duration::days(days_ahead);
    if candidate <= reference {
        candidate += Duration::days(7);
    }
    candidate
}

pub fn reminder_fire_time(entry: &ClassEntry, reference: NaiveDateTime) -> NaiveDateTime {
    next_occurrence(entry, reference) - Duration::minutes(lead_minutes(entry))
}

/// Window-policy due test used by the background poll: due iff the fire time
/// is at most 30 minutes ahead of `now` or at most 1 minute behind it. The
/// asymmetry tolerates trigger jitter without re-firing stale reminders; the
/// narrowing window is the only de-duplication across polls.
pub fn reminder_due(entry: &ClassEntry, now: NaiveDateTime) -> bool {
    let diff = (reminder_fire_time(entry, now) - now).num_milliseconds();
    (-DUE_BACKWARD_MS..=DUE_FORWARD_MS).contains(&diff)
}

/// The entry whose next occurrence is soonest, with that occurrence.
pub fn next_class(
    entries: &[ClassEntry],
    now: NaiveDateTime,
) -> Option<(&ClassEntry, NaiveDateTime)> {
    entries
        .iter()
        .map(|entry| (entry, next_occurrence(entry, now)))
        .min_by_key(|(_, starts_at)| *starts_at)
}

/// 12-hour display form of a "HH:MM" string, e.g. "14:05" -> "02:05 PM".
/// Empty input stays empty; unparseable input is passed through.
pub fn nice_time(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let mut parts = raw.split(':');
    let parsed = parts
        .next()
        .zip(parts.next())
        .and_then(|(h, m)| Some((h.trim().parse::<u32>().ok()?, m.trim().parse::<u32>().ok()?)));
    match parsed {
        Some((hh, mm)) if hh < 24 && mm < 60 => {
            let suffix = if hh >= 12 { "PM" } else { "AM" };
            let hh12 = ((hh + 11) % 12) + 1;
            format!("{hh12:02}:{mm:02} {suffix}")
        }
        _ => raw.to_string(),
    }
}

pub fn day_short(day: u8) -> &'static str {
    match day {
        0 => "Sun",
        1 => "Mon",
        2 => "Tue",
        3 => "Wed",
        4 => "Thu",
        5 => "Fri",
        6 => "Sat",
        _ => "?",
    }
}
