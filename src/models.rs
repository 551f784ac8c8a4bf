use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// A weekly-recurring class slot. `day` is a 0-6 day-of-week index with
/// 0 = Sunday; times are local wall-clock "HH:MM" strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ClassEntry {
    pub id: String,
    pub unit: String,
    pub day: u8,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub lecturer: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default, deserialize_with = "lenient_lead_minutes")]
    pub reminder_lead_minutes: Option<u32>,
    #[serde(default)]
    pub notes: String,
}

/// Create/update body for a class entry. The store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ClassPayload {
    pub unit: String,
    pub day: u8,
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub lecturer: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default, deserialize_with = "lenient_lead_minutes")]
    pub reminder_lead_minutes: Option<u32>,
    /// When absent on update, existing notes are kept.
    pub notes: Option<String>,
}

impl ClassPayload {
    pub fn into_entry(self, id: String) -> ClassEntry {
        ClassEntry {
            id,
            unit: self.unit,
            day: self.day,
            start_time: self.start_time,
            end_time: self.end_time,
            lecturer: self.lecturer,
            venue: self.venue,
            reminder_lead_minutes: self.reminder_lead_minutes,
            notes: self.notes.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct UnitSummary {
    pub unit: String,
    pub lecturer: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct NextClass {
    pub class: ClassEntry,
    #[schema(value_type = String, format = "date-time", example = "2026-01-07T09:00:00")]
    pub starts_at: NaiveDateTime,
    pub day: String,
    pub minutes_until: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct UnitNotes {
    pub unit: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct NotesPayload {
    pub text: String,
}

/// Lead minutes survive round-trips from loosely-typed clients: numbers and
/// numeric strings are accepted, everything else (null, "", objects) collapses
/// to unset. An explicit 0 is kept; only unset falls back to the default later.
fn lenient_lead_minutes<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_lead))
}

fn coerce_lead(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
