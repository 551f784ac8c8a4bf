use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Local};
use tokio::task::AbortHandle;
use tracing::debug;

use crate::notify::{ClassNotification, NotificationSink};
use crate::schedule;
use crate::store::TimetableStore;

/// Foreground reminder timers: at most one outstanding timer per entry id,
/// all registry mutation behind one mutex. Arming replaces, deletion cancels,
/// a fired timer re-arms itself for the following week.
pub struct ReminderScheduler {
    store: Arc<TimetableStore>,
    sink: Arc<dyn NotificationSink>,
    timers: Mutex<HashMap<String, AbortHandle>>,
}

impl ReminderScheduler {
    pub fn new(store: Arc<TimetableStore>, sink: Arc<dyn NotificationSink>) -> Arc<Self> {
        Arc::new(Self {
            store,
            sink,
            timers: Mutex::new(HashMap::new()),
        })
    }

    /// Replaces any outstanding timer for the entry with a fresh one. Called
    /// on create and on every edit so a pending fire never acts on stale
    /// data. Replace-and-abort happens under one lock acquisition, so two
    /// racing arms for the same id cannot both survive as live timers.
    pub fn arm(self: &Arc<Self>, id: &str) {
        let scheduler = Arc::clone(self);
        let entry_id = id.to_string();
        let mut timers = self.timers.lock().expect("timer registry poisoned");
        let handle = tokio::spawn(async move {
            scheduler.run_entry_timer(entry_id).await;
        });
        if let Some(old) = timers.insert(id.to_string(), handle.abort_handle()) {
            old.abort();
        }
    }

    pub fn cancel(&self, id: &str) {
        if let Some(handle) = self
            .timers
            .lock()
            .expect("timer registry poisoned")
            .remove(id)
        {
            handle.abort();
        }
    }

    /// Cancels every outstanding timer, then arms one per current entry.
    /// Leaves no timer behind for entries that no longer exist.
    pub fn reschedule_all(self: &Arc<Self>) {
        {
            let mut timers = self.timers.lock().expect("timer registry poisoned");
            for (_, handle) in timers.drain() {
                handle.abort();
            }
        }
        for entry in self.store.all() {
            self.arm(&entry.id);
        }
    }

    pub fn armed_count(&self) -> usize {
        self.timers.lock().expect("timer registry poisoned").len()
    }

    async fn run_entry_timer(self: Arc<Self>, id: String) {
        let mut reference = Local::now().naive_local();
        loop {
            let Some(entry) = self.store.get(&id) else {
                break;
            };
            let occurrence = schedule::next_occurrence(&entry, reference);
            let fire_at = occurrence - Duration::minutes(schedule::lead_minutes(&entry));

            // Lead times longer than the wait until the occurrence clamp to
            // an immediate fire instead of being skipped.
            let delay = (fire_at - Local::now().naive_local())
                .to_std()
                .unwrap_or_default();
            tokio::time::sleep(delay).await;

            // Reread the entry: edits between arming and firing must show up
            // in the notification, and a deleted entry must not fire at all.
            let Some(current) = self.store.get(&id) else {
                break;
            };
            self.sink.deliver(&ClassNotification::for_entry(&current));
            debug!(entry = %id, "reminder fired, re-arming for next week");

            // Re-arm from the occurrence instant. The fire moment still
            // precedes the occurrence, so computing from wall-clock "now"
            // would select the same slot again; from the occurrence the next
            // one lands exactly a week ahead.
            reference = occurrence;
        }
    }
}
