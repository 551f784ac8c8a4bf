use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::models::ClassEntry;
use crate::notify::{ClassNotification, NotificationSink};
use crate::schedule;
use crate::store::TimetableStore;

/// A request for the current timetable, answered with a snapshot by whichever
/// foreground context picks it up.
pub type SnapshotRequest = oneshot::Sender<Vec<ClassEntry>>;

/// Source of timetable snapshots for the background poller. `None` means no
/// context answered in time and is never conflated with an empty timetable.
pub trait SnapshotProvider: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Option<Vec<ClassEntry>>> + Send;
}

/// Cross-context fetch: the poller has no shared memory with the foreground,
/// so it sends a request over a channel and waits for the reply under a fixed
/// timeout. Timeout, a closed channel, or a dropped reply all resolve to
/// "unavailable".
pub struct ChannelSnapshotProvider {
    requests: mpsc::Sender<SnapshotRequest>,
    timeout: Duration,
}

impl ChannelSnapshotProvider {
    pub fn new(requests: mpsc::Sender<SnapshotRequest>, timeout: Duration) -> Self {
        Self { requests, timeout }
    }
}

impl SnapshotProvider for ChannelSnapshotProvider {
    async fn fetch(&self) -> Option<Vec<ClassEntry>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.requests.send(reply_tx).await.is_err() {
            return None;
        }
        match tokio::time::timeout(self.timeout, reply_rx).await {
            Ok(Ok(classes)) => Some(classes),
            _ => None,
        }
    }
}

/// Foreground side of the cross-context fetch: answers each request with a
/// fresh store snapshot. Returns the sender half for providers.
pub fn spawn_snapshot_responder(store: Arc<TimetableStore>) -> mpsc::Sender<SnapshotRequest> {
    let (tx, mut rx) = mpsc::channel::<SnapshotRequest>(8);
    tokio::spawn(async move {
        while let Some(reply) = rx.recv().await {
            // The requester may have timed out already; that is its problem.
            let _ = reply.send(store.all());
        }
    });
    tx
}

/// One background check: apply the window policy to every entry of the
/// snapshot and deliver a notification per due entry. An unavailable snapshot
/// is a logged no-op, never an error. Returns the number of reminders fired.
pub fn poll_once(
    snapshot: Option<Vec<ClassEntry>>,
    sink: &dyn NotificationSink,
    now: NaiveDateTime,
) -> usize {
    let Some(classes) = snapshot else {
        debug!("timetable snapshot unavailable, skipping poll");
        return 0;
    };
    let mut fired = 0;
    for entry in &classes {
        if schedule::reminder_due(entry, now) {
            sink.deliver(&ClassNotification::for_entry(entry));
            fired += 1;
        }
    }
    fired
}

/// Periodic background trigger. Cadence is best-effort; overlapping or missed
/// ticks only shift which reminders land in the due window, and the window
/// itself is the sole de-duplication across ticks.
pub async fn run_background_poller(
    provider: impl SnapshotProvider,
    sink: Arc<dyn NotificationSink>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let snapshot = provider.fetch().await;
        let fired = poll_once(snapshot, sink.as_ref(), Local::now().naive_local());
        if fired > 0 {
            debug!(fired, "background poll delivered reminders");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::NaiveDate;

    use super::*;

    struct RecordingSink {
        delivered: Mutex<Vec<ClassNotification>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                delivered: Mutex::new(Vec::new()),
            }
        }
    }

    impl NotificationSink for RecordingSink {
        fn deliver(&self, notification: &ClassNotification) {
            self.delivered.lock().unwrap().push(notification.clone());
        }
    }

    fn entry(id: &str, day: u8, start_time: &str, lead: Option<u32>) -> ClassEntry {
        ClassEntry {
            id: id.to_string(),
            unit: "MATH101".to_string(),
            day,
            start_time: start_time.to_string(),
            end_time: String::new(),
            lecturer: String::new(),
            venue: String::new(),
            reminder_lead_minutes: lead,
            notes: String::new(),
        }
    }

    fn wed_morning(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 7)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_unavailable_snapshot_is_a_noop() {
        let sink = RecordingSink::new();
        assert_eq!(poll_once(None, &sink, wed_morning(8, 0)), 0);
        assert!(sink.delivered.lock().unwrap().is_empty());
    }

    #[test]
    fn test_empty_snapshot_fires_nothing() {
        let sink = RecordingSink::new();
        assert_eq!(poll_once(Some(Vec::new()), &sink, wed_morning(8, 0)), 0);
    }

    #[test]
    fn test_due_entries_fire_and_others_do_not() {
        let sink = RecordingSink::new();
        // Wed 09:00 with default lead: fire time 08:50, well inside the
        // window at 08:45. The Friday entry is days away.
        let snapshot = vec![
            entry("due", 3, "09:00", None),
            entry("far", 5, "09:00", None),
        ];
        assert_eq!(poll_once(Some(snapshot), &sink, wed_morning(8, 45)), 1);
        let delivered = sink.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].tag, "due");
    }

    #[test]
    fn test_stale_fire_time_is_skipped() {
        let sink = RecordingSink::new();
        // Fire time 08:50; by 08:52 it has drifted past the 1-minute
        // backward tolerance.
        let snapshot = vec![entry("stale", 3, "09:00", None)];
        assert_eq!(poll_once(Some(snapshot), &sink, wed_morning(8, 52)), 0);
    }

    #[test]
    fn test_one_bad_entry_does_not_block_the_rest() {
        let sink = RecordingSink::new();
        let snapshot = vec![
            entry("weird", 3, "not a time", None),
            entry("due", 3, "09:00", None),
        ];
        assert_eq!(poll_once(Some(snapshot), &sink, wed_morning(8, 45)), 1);
    }

    #[tokio::test]
    async fn test_channel_provider_round_trip() {
        let store = Arc::new(TimetableStore::new());
        store.add(crate::models::ClassPayload {
            unit: "MATH101".to_string(),
            day: 3,
            start_time: "09:00".to_string(),
            end_time: String::new(),
            lecturer: String::new(),
            venue: String::new(),
            reminder_lead_minutes: None,
            notes: None,
        });

        let requests = spawn_snapshot_responder(store);
        let provider = ChannelSnapshotProvider::new(requests, Duration::from_millis(3000));
        let snapshot = provider.fetch().await;
        assert_eq!(snapshot.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_channel_provider_times_out_without_responder() {
        // A request sits in the channel with nobody answering; the bounded
        // wait resolves to "unavailable" instead of hanging.
        let (tx, _rx) = mpsc::channel::<SnapshotRequest>(8);
        let provider = ChannelSnapshotProvider::new(tx, Duration::from_millis(50));
        assert_eq!(provider.fetch().await, None);
    }

    #[tokio::test]
    async fn test_channel_provider_closed_channel_is_unavailable() {
        let (tx, rx) = mpsc::channel::<SnapshotRequest>(8);
        drop(rx);
        let provider = ChannelSnapshotProvider::new(tx, Duration::from_millis(100));
        assert_eq!(provider.fetch().await, None);
    }
}
