use std::sync::Arc;

use futures::Stream;
use tokio::sync::{watch, Mutex};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, error, info, instrument, warn};

use crate::{storage::KeyValueStore, utils::clock::Clock};

use super::entities::{decode_events, encode_events, EventId, TimeEvent};

/// Namespace the store is expected to be opened with.
pub const EVENTS_NAMESPACE: &str = "time_event_repository";
const EVENTS_KEY: &str = "events";

/// The full collection at one instant, in insertion order.
pub type Snapshot = Arc<Vec<TimeEvent>>;

struct MutationState {
    initialized: bool,
}

/// Holds the event log in memory, mirrors it into a [KeyValueStore] on every change and
/// publishes each new version to subscribers.
///
/// Mutations are serialized: read-modify-persist-publish happens under one lock, so two
/// callers interleaving on the same runtime can't lose each other's writes. Persisting is best
/// effort, a failed write is logged and the in-memory change still goes through.
pub struct EventStore<S> {
    storage: S,
    clock: Arc<dyn Clock>,
    sender: watch::Sender<Snapshot>,
    state: Mutex<MutationState>,
}

impl<S: KeyValueStore> EventStore<S> {
    pub fn new(storage: S, clock: Arc<dyn Clock>) -> Self {
        let (sender, _) = watch::channel(Snapshot::default());
        Self {
            storage,
            clock,
            sender,
            state: Mutex::new(MutationState { initialized: false }),
        }
    }

    /// Loads previously saved events. Only the first call does anything; mutations also load
    /// first so a write can never replace history that wasn't read yet.
    pub async fn initialize(&self) {
        let mut state = self.state.lock().await;
        self.load_if_needed(&mut state).await;
    }

    async fn load_if_needed(&self, state: &mut MutationState) {
        if state.initialized {
            return;
        }
        let events = match self.storage.get(EVENTS_KEY).await {
            Ok(Some(value)) => decode_events(value),
            Ok(None) => vec![],
            Err(e) => {
                warn!("Failed to load events, starting empty {e:?}");
                vec![]
            }
        };
        info!("Loaded {} events", events.len());
        state.initialized = true;
        self.sender.send_replace(Arc::new(events));
    }

    async fn commit(&self, events: Vec<TimeEvent>) {
        let encoded = encode_events(&events);
        if let Err(e) = self.storage.put(vec![(EVENTS_KEY.into(), encoded)]).await {
            error!("Failed to persist {} events {e:?}", events.len());
        }
        self.sender.send_replace(Arc::new(events));
    }

    /// Records a new event starting now.
    #[instrument(skip(self))]
    pub async fn append(&self, label: &str) -> TimeEvent {
        let mut state = self.state.lock().await;
        self.load_if_needed(&mut state).await;

        let mut events = self.snapshot().as_ref().clone();
        let mut event = TimeEvent::new(self.clock.time(), label);
        while events.iter().any(|v| v.id == event.id) {
            event.id = EventId::generate();
        }
        debug!("Appending {event:?}");
        events.push(event.clone());
        self.commit(events).await;
        event
    }

    /// Replaces the label of the event with `id`. Returns whether such an event exists.
    #[instrument(skip(self))]
    pub async fn update_label(&self, id: &EventId, label: &str) -> bool {
        let mut state = self.state.lock().await;
        self.load_if_needed(&mut state).await;

        let mut found = false;
        let events = self
            .snapshot()
            .iter()
            .cloned()
            .map(|event| {
                if &event.id == id {
                    found = true;
                    event.with_label(label)
                } else {
                    event
                }
            })
            .collect::<Vec<_>>();
        if !found {
            debug!("No event with id {id}");
        }
        self.commit(events).await;
        found
    }

    /// Forgets the whole history.
    #[instrument(skip(self))]
    pub async fn clear_all(&self) {
        let mut state = self.state.lock().await;
        self.load_if_needed(&mut state).await;
        info!("Clearing {} events", self.snapshot().len());
        self.commit(vec![]).await;
    }

    pub fn snapshot(&self) -> Snapshot {
        self.sender.borrow().clone()
    }

    /// Receiver observing the log. It holds the current snapshot right away and sees every
    /// later one. Dropping it unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.sender.subscribe()
    }

    /// [Self::subscribe] as a stream. The current snapshot is yielded first.
    pub fn stream(&self) -> impl Stream<Item = Snapshot> {
        WatchStream::new(self.subscribe())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Arc, time::Duration};

    use anyhow::{anyhow, Result};
    use chrono::{DateTime, TimeZone, Utc};
    use futures::StreamExt;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    use crate::{
        storage::{file::JsonFileStore, memory::MemoryStore, KeyValueStore},
        store::entities::EventId,
        utils::{clock::ManualClock, logging::TEST_LOGGING},
    };

    use super::{EventStore, EVENTS_NAMESPACE};

    fn test_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 7, 4, 9, 0, 0).unwrap()
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<Value>> {
            Err(anyhow!("disk on fire"))
        }

        async fn put(&self, _entries: Vec<(String, Value)>) -> Result<()> {
            Err(anyhow!("disk on fire"))
        }

        async fn remove(&self, _keys: &[&str]) -> Result<()> {
            Err(anyhow!("disk on fire"))
        }
    }

    #[tokio::test]
    async fn test_append_creates_unique_events() {
        *TEST_LOGGING;
        let clock = Arc::new(ManualClock::new(test_start()));
        let store = EventStore::new(MemoryStore::new(), clock.clone());
        store.initialize().await;

        let first = store.append("focus").await;
        clock.advance(Duration::from_secs(60));
        let second = store.append("").await;
        store.update_label(&first.id, "deep focus").await;
        let third = store.append("break").await;

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 3);
        let ids = snapshot.iter().map(|v| v.id.clone()).collect::<HashSet<_>>();
        assert_eq!(ids.len(), 3);

        assert_eq!(snapshot[0].label, "deep focus");
        assert_eq!(snapshot[0].start, test_start());
        assert_eq!(snapshot[1], second);
        assert_eq!(snapshot[1].start, test_start() + chrono::Duration::minutes(1));
        assert_eq!(snapshot[2], third);
    }

    #[tokio::test]
    async fn test_update_label_of_missing_event() {
        let store = EventStore::new(MemoryStore::new(), Arc::new(ManualClock::new(test_start())));
        let event = store.append("work").await;

        assert!(!store.update_label(&EventId::from("missing"), "x").await);
        assert_eq!(store.snapshot().as_ref(), &vec![event]);
    }

    #[tokio::test]
    async fn test_clear_all() {
        let store = EventStore::new(MemoryStore::new(), Arc::new(ManualClock::new(test_start())));
        store.append("a").await;
        store.append("b").await;

        store.clear_all().await;

        assert!(store.snapshot().is_empty());
        assert_eq!(store.storage().get("events").await.unwrap(), Some(json!([])));
    }

    #[tokio::test]
    async fn test_reload_reproduces_events() -> Result<()> {
        let dir = tempdir()?;
        let clock = Arc::new(ManualClock::new(test_start()));

        let saved = {
            let store = EventStore::new(
                JsonFileStore::open(dir.path(), EVENTS_NAMESPACE)?,
                clock.clone(),
            );
            store.initialize().await;
            store.append("first").await;
            clock.advance(Duration::from_millis(90_500));
            let second = store.append("").await;
            store.update_label(&second.id, "renamed").await;
            store.snapshot()
        };

        let reloaded = EventStore::new(
            JsonFileStore::open(dir.path(), EVENTS_NAMESPACE)?,
            clock.clone(),
        );
        reloaded.initialize().await;

        let as_set = |events: &[crate::store::TimeEvent]| {
            events
                .iter()
                .map(|v| (v.id.clone(), v.start, v.label.clone()))
                .collect::<HashSet<_>>()
        };
        assert_eq!(as_set(&saved[..]), as_set(&reloaded.snapshot()[..]));
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let storage = MemoryStore::with_values([(
            "events".to_string(),
            json!([{ "id": "a", "start": 0, "label": "old" }]),
        )]);
        let store = EventStore::new(storage, Arc::new(ManualClock::new(test_start())));
        store.initialize().await;
        store.append("new").await;

        store.initialize().await;

        assert_eq!(store.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn test_append_before_initialize_keeps_history() {
        let storage = MemoryStore::with_values([(
            "events".to_string(),
            json!([{ "id": "a", "start": 0, "label": "old" }]),
        )]);
        let store = EventStore::new(storage, Arc::new(ManualClock::new(test_start())));

        store.append("new").await;
        store.initialize().await;

        let labels = store
            .snapshot()
            .iter()
            .map(|v| v.label.clone())
            .collect::<Vec<_>>();
        assert_eq!(labels, vec!["old", "new"]);
    }

    #[tokio::test]
    async fn test_corrupt_storage_loads_empty() {
        let storage = MemoryStore::with_values([("events".to_string(), json!("{{{"))]);
        let store = EventStore::new(storage, Arc::new(ManualClock::new(test_start())));
        store.initialize().await;
        assert!(store.snapshot().is_empty());

        let store = EventStore::new(FailingStore, Arc::new(ManualClock::new(test_start())));
        store.initialize().await;
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_failed_persist_still_publishes() {
        let store = EventStore::new(FailingStore, Arc::new(ManualClock::new(test_start())));
        let mut receiver = store.subscribe();

        store.append("kept in memory").await;

        assert!(receiver.has_changed().unwrap());
        assert_eq!(receiver.borrow_and_update().len(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_current_and_later_snapshots() {
        let store = EventStore::new(MemoryStore::new(), Arc::new(ManualClock::new(test_start())));
        store.append("before subscribe").await;

        let receiver = store.subscribe();
        assert_eq!(receiver.borrow().len(), 1);

        let mut stream = Box::pin(store.stream());
        assert_eq!(stream.next().await.unwrap().len(), 1);

        store.append("after subscribe").await;
        assert_eq!(stream.next().await.unwrap().len(), 2);
        assert_eq!(receiver.borrow().len(), 2);

        store.clear_all().await;
        assert!(stream.next().await.unwrap().is_empty());
    }
}
