use chrono::{Duration, NaiveDateTime, NaiveTime};
use icalendar::{Calendar, Component, Event, EventLike};

use crate::models::ClassEntry;
use crate::schedule;

#[derive(Clone, Default)]
pub struct TimetableExporter;

impl TimetableExporter {
    pub fn new() -> Self {
        Self
    }

    /// One VEVENT per entry, placed at its next occurrence relative to
    /// `reference`. Weekly recurrence is left to re-export; the calendar is a
    /// snapshot of the coming week.
    pub fn generate(&self, classes: &[ClassEntry], reference: NaiveDateTime) -> Vec<u8> {
        if classes.is_empty() {
            return Vec::new();
        }

        let mut calendar = Calendar::new();
        calendar.name("Unit Timetable");

        for entry in classes {
            let start = schedule::next_occurrence(entry, reference);
            let end = Self::end_for(entry, start);

            let mut event = Event::new();
            event.summary(&entry.unit);
            event.starts(start);
            event.ends(end);
            if !entry.venue.is_empty() {
                event.location(&entry.venue);
            }
            let lecturer = if entry.lecturer.is_empty() {
                "Lecturer"
            } else {
                entry.lecturer.as_str()
            };
            event.description(&format!("Class\nLecturer: {lecturer}"));
            event.uid(&format!("{}-unit-timetable", entry.id));
            calendar.push(event);
        }

        calendar.to_string().into_bytes()
    }

    /// End of the event: the entry's end time on the same day when it parses
    /// to something after the start, otherwise one hour after the start.
    fn end_for(entry: &ClassEntry, start: NaiveDateTime) -> NaiveDateTime {
        NaiveTime::parse_from_str(&entry.end_time, "%H:%M")
            .ok()
            .map(|t| start.date().and_time(t))
            .filter(|end| *end > start)
            .unwrap_or(start + Duration::hours(1))
    }
}
