use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use thiserror::Error;
use uuid::Uuid;

use crate::models::{ClassEntry, ClassPayload, UnitSummary};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("class {0} not found")]
    NotFound(String),
}

/// In-memory timetable owned by the service. Everything hands out snapshots;
/// the scheduling code never holds a reference into the store across an await.
#[derive(Default)]
pub struct TimetableStore {
    classes: RwLock<Vec<ClassEntry>>,
    unit_notes: RwLock<HashMap<String, String>>,
}

impl TimetableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, payload: ClassPayload) -> ClassEntry {
        let entry = payload.into_entry(Uuid::new_v4().to_string());
        self.classes
            .write()
            .expect("timetable lock poisoned")
            .push(entry.clone());
        entry
    }

    pub fn update(&self, id: &str, payload: ClassPayload) -> Result<ClassEntry, StoreError> {
        let mut classes = self.classes.write().expect("timetable lock poisoned");
        let slot = classes
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let notes = payload
            .notes
            .clone()
            .unwrap_or_else(|| slot.notes.clone());
        *slot = ClassPayload { notes: Some(notes), ..payload }.into_entry(id.to_string());
        Ok(slot.clone())
    }

    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut classes = self.classes.write().expect("timetable lock poisoned");
        let before = classes.len();
        classes.retain(|entry| entry.id != id);
        if classes.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<ClassEntry> {
        self.classes
            .read()
            .expect("timetable lock poisoned")
            .iter()
            .find(|entry| entry.id == id)
            .cloned()
    }

    /// Unordered snapshot of every entry.
    pub fn all(&self) -> Vec<ClassEntry> {
        self.classes.read().expect("timetable lock poisoned").clone()
    }

    /// Entries ordered by day, then start time, then unit name. "HH:MM"
    /// strings compare chronologically as plain strings.
    pub fn all_sorted(&self) -> Vec<ClassEntry> {
        let mut classes = self.all();
        classes.sort_by(|a, b| {
            (a.day, &a.start_time, &a.unit).cmp(&(b.day, &b.start_time, &b.unit))
        });
        classes
    }

    pub fn classes_for_day(&self, day: u8) -> Vec<ClassEntry> {
        let mut classes: Vec<ClassEntry> = self
            .all()
            .into_iter()
            .filter(|entry| entry.day == day)
            .collect();
        classes.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        classes
    }

    /// One summary per distinct (trimmed) unit name, sorted by unit. The
    /// lecturer shown is the first one encountered for that unit.
    pub fn unique_units(&self) -> Vec<UnitSummary> {
        let mut units: BTreeMap<String, UnitSummary> = BTreeMap::new();
        for entry in self.all() {
            let key = entry.unit.trim().to_string();
            units
                .entry(key.clone())
                .or_insert_with(|| UnitSummary {
                    unit: key,
                    lecturer: entry.lecturer.clone(),
                    count: 0,
                })
                .count += 1;
        }
        units.into_values().collect()
    }

    pub fn classes_for_unit(&self, unit: &str) -> Vec<ClassEntry> {
        let wanted = unit.trim();
        let mut classes: Vec<ClassEntry> = self
            .all()
            .into_iter()
            .filter(|entry| entry.unit.trim() == wanted)
            .collect();
        classes.sort_by(|a, b| (a.day, &a.start_time).cmp(&(b.day, &b.start_time)));
        classes
    }

    pub fn notes_for_unit(&self, unit: &str) -> String {
        self.unit_notes
            .read()
            .expect("notes lock poisoned")
            .get(unit.trim())
            .cloned()
            .unwrap_or_default()
    }

    pub fn save_notes_for_unit(&self, unit: &str, text: String) {
        self.unit_notes
            .write()
            .expect("notes lock poisoned")
            .insert(unit.trim().to_string(), text);
    }

    pub fn update_entry_notes(&self, id: &str, text: String) -> Result<(), StoreError> {
        let mut classes = self.classes.write().expect("timetable lock poisoned");
        let slot = classes
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        slot.notes = text;
        Ok(())
    }
}
