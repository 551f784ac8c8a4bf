use crate::models::ClassEntry;
use crate::schedule;

/// What gets shown to the user. The tag doubles as a replacement key: a sink
/// receiving the same tag twice should update the existing notification
/// rather than stack a second one.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassNotification {
    pub title: String,
    pub body: String,
    pub tag: String,
    pub entry_id: String,
}

impl ClassNotification {
    pub fn for_entry(entry: &ClassEntry) -> Self {
        let lecturer = if entry.lecturer.is_empty() {
            "Lecturer"
        } else {
            entry.lecturer.as_str()
        };
        let mut body = format!(
            "{} by {} at {}",
            entry.unit,
            lecturer,
            schedule::nice_time(&entry.start_time)
        );
        if !entry.venue.is_empty() {
            body.push_str(" · ");
            body.push_str(&entry.venue);
        }
        Self {
            title: format!("{} — starting soon", entry.unit),
            body,
            tag: entry.id.clone(),
            entry_id: entry.id.clone(),
        }
    }
}

/// Delivery seam. Implementations must swallow their own failures (denied
/// permissions and the like); scheduling keeps re-arming no matter what a
/// sink does.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notification: &ClassNotification);
}

/// Default sink: reminders land in the log.
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn deliver(&self, notification: &ClassNotification) {
        tracing::info!(
            tag = %notification.tag,
            title = %notification.title,
            body = %notification.body,
            "class reminder"
        );
    }
}
