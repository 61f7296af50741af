//! In-memory fakes shared by the unit tests of this crate.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use watchcast_models::{MediaIds, MediaKind, MediaRef, Metadata, WatchEvent, WebhookMessage};
use watchcast_sources::{Enricher, HistoryFetcher, Notifier, SourceError};
use crate::error::StoreError;
use crate::history_store::{HistoryStore, StoreProvider};

pub fn watched_on(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day.clamp(1, 28), 20, 0, 0).unwrap()
}

pub fn movie_event(id: &str, day: u32) -> WatchEvent {
    let media = MediaRef::movie(format!("Movie {}", id), Some(2020)).with_ids(MediaIds {
        slug: Some(format!("movie-{}", id)),
        tmdb: id.parse().ok(),
        ..MediaIds::default()
    });
    WatchEvent::new(id, MediaKind::Movie, media, watched_on(day))
}

pub fn episode_event(id: &str, season: u32, episode: u32) -> WatchEvent {
    let media = MediaRef::episode("Show", season, episode).with_ids(MediaIds {
        slug: Some("show".to_string()),
        tmdb: Some(500),
        ..MediaIds::default()
    });
    WatchEvent::new(id, MediaKind::Episode, media, watched_on(1))
}

#[derive(Default)]
struct StoreState {
    records: BTreeMap<String, DateTime<Utc>>,
    fail_contains: HashSet<String>,
    fail_commits: bool,
    fail_prune: bool,
    commit_calls: Vec<String>,
}

/// Store whose clones share state, with switchable failures
#[derive(Clone, Default)]
pub struct FakeStore {
    state: Arc<Mutex<StoreState>>,
}

impl FakeStore {
    pub fn with_ids(ids: &[&str]) -> Self {
        let store = Self::default();
        for id in ids {
            store.insert_at(id, Utc::now());
        }
        store
    }

    pub fn insert_at(&self, id: &str, at: DateTime<Utc>) {
        self.state.lock().unwrap().records.insert(id.to_string(), at);
    }

    pub fn fail_contains_for(&self, id: &str) {
        self.state.lock().unwrap().fail_contains.insert(id.to_string());
    }

    pub fn set_fail_commits(&self, fail: bool) {
        self.state.lock().unwrap().fail_commits = fail;
    }

    pub fn set_fail_prune(&self, fail: bool) {
        self.state.lock().unwrap().fail_prune = fail;
    }

    pub fn has(&self, id: &str) -> bool {
        self.state.lock().unwrap().records.contains_key(id)
    }

    pub fn commit_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().commit_calls.clone()
    }
}

impl HistoryStore for FakeStore {
    fn contains(&self, event_id: &str) -> Result<bool, StoreError> {
        let state = self.state.lock().unwrap();
        if state.fail_contains.contains(event_id) {
            return Err(StoreError::Unavailable("injected read failure".to_string()));
        }
        Ok(state.records.contains_key(event_id))
    }

    fn commit(&mut self, event_id: &str, recorded_at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.commit_calls.push(event_id.to_string());
        if state.fail_commits {
            return Err(StoreError::Unavailable("injected write failure".to_string()));
        }
        state.records.entry(event_id.to_string()).or_insert(recorded_at);
        Ok(())
    }

    fn prune(&mut self, older_than: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_prune {
            return Err(StoreError::Unavailable("injected prune failure".to_string()));
        }
        let before = state.records.len();
        state.records.retain(|_, at| *at >= older_than);
        Ok(before - state.records.len())
    }

    fn forget(&mut self, event_id: &str) -> Result<bool, StoreError> {
        Ok(self.state.lock().unwrap().records.remove(event_id).is_some())
    }

    fn records(&self) -> Result<Vec<watchcast_models::SeenRecord>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .records
            .iter()
            .map(|(id, at)| watchcast_models::SeenRecord {
                event_id: id.clone(),
                recorded_at: *at,
            })
            .collect())
    }
}

#[derive(Default)]
pub struct FakeProvider {
    pub store: FakeStore,
    pub fail_open: bool,
    pub opens: AtomicUsize,
    pub read_only_opens: AtomicUsize,
}

impl FakeProvider {
    pub fn new(store: FakeStore) -> Self {
        Self {
            store,
            ..Self::default()
        }
    }
}

impl StoreProvider for FakeProvider {
    type Store = FakeStore;

    fn open(&self) -> Result<FakeStore, StoreError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail_open {
            return Err(StoreError::Unavailable("injected open failure".to_string()));
        }
        Ok(self.store.clone())
    }

    fn open_read_only(&self) -> Result<FakeStore, StoreError> {
        self.read_only_opens.fetch_add(1, Ordering::SeqCst);
        if self.fail_open {
            return Err(StoreError::Unavailable("injected open failure".to_string()));
        }
        Ok(self.store.clone())
    }
}

#[derive(Default)]
struct FetcherState {
    events: Vec<WatchEvent>,
    failing: bool,
    calls: usize,
}

#[derive(Clone, Default)]
pub struct FakeFetcher {
    state: Arc<Mutex<FetcherState>>,
}

impl FakeFetcher {
    pub fn returning(events: Vec<WatchEvent>) -> Self {
        let fetcher = Self::default();
        fetcher.set_events(events);
        fetcher
    }

    pub fn set_events(&self, events: Vec<WatchEvent>) {
        self.state.lock().unwrap().events = events;
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }
}

#[async_trait]
impl HistoryFetcher for FakeFetcher {
    fn source_name(&self) -> &str {
        "fake-tracker"
    }

    async fn fetch_history(&self, _since: DateTime<Utc>) -> Result<Vec<WatchEvent>, SourceError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if state.failing {
            return Err(SourceError::Status {
                service: "fake-tracker",
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        Ok(state.events.clone())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum EnrichMode {
    Returns,
    Missing,
    Fails,
    Hangs,
}

#[derive(Clone)]
pub struct FakeEnricher {
    mode: EnrichMode,
    metadata: Metadata,
    calls: Arc<AtomicUsize>,
}

impl FakeEnricher {
    pub fn new(mode: EnrichMode) -> Self {
        Self {
            mode,
            metadata: Metadata {
                overview: Some("A fine film.".to_string()),
                poster_path: Some("/poster.jpg".to_string()),
                image_path: Some("/backdrop.jpg".to_string()),
                rating: Some(8.3),
                runtime_minutes: Some(125),
                genres: vec!["Drama".to_string()],
            },
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Enricher for FakeEnricher {
    fn source_name(&self) -> &str {
        "fake-metadata"
    }

    async fn enrich(&self, _kind: MediaKind, _media: &MediaRef) -> Result<Option<Metadata>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            EnrichMode::Returns => Ok(Some(self.metadata.clone())),
            EnrichMode::Missing => Ok(None),
            EnrichMode::Fails => Err(SourceError::Status {
                service: "fake-metadata",
                status: 500,
                body: String::new(),
            }),
            EnrichMode::Hangs => std::future::pending().await,
        }
    }
}

#[derive(Default)]
struct NotifierState {
    delivered: Vec<WebhookMessage>,
    attempts: usize,
    fail_titles: HashSet<String>,
    hang: bool,
}

/// Notifier that records every confirmed message. Failures are keyed by the
/// movie or show title of the event.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    state: Arc<Mutex<NotifierState>>,
}

impl RecordingNotifier {
    pub fn fail_for(&self, title: &str) {
        self.state.lock().unwrap().fail_titles.insert(title.to_string());
    }

    pub fn recover(&self) {
        self.state.lock().unwrap().fail_titles.clear();
    }

    pub fn set_hang(&self, hang: bool) {
        self.state.lock().unwrap().hang = hang;
    }

    pub fn attempts(&self) -> usize {
        self.state.lock().unwrap().attempts
    }

    pub fn delivered(&self) -> Vec<WebhookMessage> {
        self.state.lock().unwrap().delivered.clone()
    }

    pub fn delivered_titles(&self) -> Vec<String> {
        self.delivered()
            .iter()
            .flat_map(|m| m.embeds.iter().map(|e| e.title.clone()))
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn destination_name(&self) -> &str {
        "recording"
    }

    async fn deliver(&self, message: &WebhookMessage) -> Result<(), SourceError> {
        let hang = {
            let mut state = self.state.lock().unwrap();
            state.attempts += 1;
            let title = message.embeds.first().map(|e| e.title.as_str()).unwrap_or_default();
            if state.fail_titles.iter().any(|t| title.contains(t.as_str())) {
                return Err(SourceError::Status {
                    service: "recording",
                    status: 500,
                    body: String::new(),
                });
            }
            if !state.hang {
                state.delivered.push(message.clone());
            }
            state.hang
        };
        if hang {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}
