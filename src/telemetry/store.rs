use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

/// The most recent decoded telemetry payload for one boiler.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    pub device_id: String,
    pub received_at: DateTime<Utc>,
    /// Envelope as received: `{"Data": [{...fields...}]}`.
    pub payload: Value,
}

impl TelemetrySnapshot {
    pub fn new(device_id: &str, payload: Value) -> Self {
        Self {
            device_id: device_id.to_owned(),
            received_at: Utc::now(),
            payload,
        }
    }

    /// Field map of the first `Data` entry, if the envelope has one.
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        self.payload.get("Data")?.get(0)?.as_object()
    }
}

/// Called after every snapshot replace, on the task that received the frame.
/// Implementations must not block.
pub trait SnapshotObserver: Send + Sync {
    fn on_snapshot_updated(&self, device_id: &str, snapshot: &TelemetrySnapshot);
}

/// In-memory store of the latest `TelemetrySnapshot` per device.
///
/// Wrapped in `Arc` so it can be cheaply cloned and shared across tasks.
/// Each frame swaps in a whole new `Arc<TelemetrySnapshot>` under the write
/// lock, so readers see the previous or the new snapshot, never a mix.
#[derive(Clone, Default)]
pub struct TelemetryStore {
    inner: Arc<RwLock<HashMap<String, Arc<TelemetrySnapshot>>>>,
    observers: Arc<Vec<Arc<dyn SnapshotObserver>>>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observers(observers: Vec<Arc<dyn SnapshotObserver>>) -> Self {
        Self {
            inner: Arc::default(),
            observers: Arc::new(observers),
        }
    }

    /// Replace the snapshot for `device_id`, then notify observers.
    pub async fn update(&self, device_id: &str, payload: Value) -> Arc<TelemetrySnapshot> {
        let snapshot = Arc::new(TelemetrySnapshot::new(device_id, payload));
        self.inner
            .write()
            .await
            .insert(device_id.to_owned(), Arc::clone(&snapshot));

        for observer in self.observers.iter() {
            observer.on_snapshot_updated(device_id, &snapshot);
        }
        snapshot
    }

    /// Return the latest snapshot for a specific device, if one has arrived.
    pub async fn get(&self, device_id: &str) -> Option<Arc<TelemetrySnapshot>> {
        self.inner.read().await.get(device_id).cloned()
    }

    /// Return the latest snapshot of every device seen so far.
    pub async fn all(&self) -> Vec<Arc<TelemetrySnapshot>> {
        self.inner.read().await.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(String, Value)>>,
    }

    impl SnapshotObserver for Recorder {
        fn on_snapshot_updated(&self, device_id: &str, snapshot: &TelemetrySnapshot) {
            self.seen
                .lock()
                .unwrap()
                .push((device_id.to_owned(), snapshot.payload.clone()));
        }
    }

    #[tokio::test]
    async fn empty_store_returns_nothing() {
        let store = TelemetryStore::new();
        assert!(store.all().await.is_empty());
        assert!(store.get("b1").await.is_none());
    }

    #[tokio::test]
    async fn update_replaces_wholesale() {
        let store = TelemetryStore::new();
        store.update("b1", json!({"Data": [{"State": 1, "SetTemp": 55}]})).await;
        store.update("b1", json!({"Data": [{"State": 0}]})).await;

        let got = store.get("b1").await.unwrap();
        assert_eq!(got.payload, json!({"Data": [{"State": 0}]}));
        assert!(got.fields().unwrap().get("SetTemp").is_none());
        assert_eq!(store.all().await.len(), 1);
    }

    #[tokio::test]
    async fn devices_are_independent_slots() {
        let store = TelemetryStore::new();
        store.update("b1", json!({"Data": [{"SetTemp": 50}]})).await;
        store.update("b2", json!({"Data": [{"SetTemp": 70}]})).await;

        assert_eq!(store.all().await.len(), 2);
        assert_eq!(store.get("b1").await.unwrap().fields().unwrap()["SetTemp"], 50);
        assert_eq!(store.get("b2").await.unwrap().fields().unwrap()["SetTemp"], 70);
    }

    #[tokio::test]
    async fn readers_keep_their_snapshot_across_replace() {
        let store = TelemetryStore::new();
        store.update("b1", json!({"Data": [{"SetTemp": 50}]})).await;
        let held = store.get("b1").await.unwrap();

        store.update("b1", json!({"Data": [{"SetTemp": 60}]})).await;

        assert_eq!(held.fields().unwrap()["SetTemp"], 50);
        assert_eq!(store.get("b1").await.unwrap().fields().unwrap()["SetTemp"], 60);
    }

    #[tokio::test]
    async fn observers_are_notified_in_order() {
        let recorder = Arc::new(Recorder::default());
        let store =
            TelemetryStore::with_observers(vec![recorder.clone() as Arc<dyn SnapshotObserver>]);

        store.update("b1", json!({"n": 1})).await;
        store.update("b2", json!({"n": 2})).await;

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                ("b1".to_owned(), json!({"n": 1})),
                ("b2".to_owned(), json!({"n": 2})),
            ]
        );
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let store = TelemetryStore::new();
        let clone = store.clone();
        store.update("b1", json!({"Data": []})).await;
        assert!(clone.get("b1").await.is_some());
    }

    #[test]
    fn fields_tolerates_odd_envelopes() {
        for payload in [
            json!({}),
            json!({"Data": []}),
            json!({"Data": "nope"}),
            json!({"Data": [42]}),
            json!([1, 2]),
        ] {
            assert!(TelemetrySnapshot::new("b1", payload).fields().is_none());
        }
    }
}
