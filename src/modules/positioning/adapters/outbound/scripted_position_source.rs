// Scriptable implementation of the platform location ports.
//
// Purpose
// - Drive the geolocation adapter and the tracker in tests without real hardware.
// - Replay recorded fixes from a JSON script in the CLI.
//
// Responsibilities
// - Answer one-shot requests from a queue of scripted outcomes.
// - Hand out watch channels and push emitted events into every open one.
// - Record every request so tests can assert on the options that reached the platform.

use crate::modules::positioning::core::errors::{POSITION_UNAVAILABLE, RawPositionError};
use crate::modules::positioning::core::options::PositionOptions;
use crate::modules::positioning::core::permission::PermissionState;
use crate::modules::positioning::core::ports::{
    PermissionQuery, PermissionQueryError, Platform, PositionSource, RawWatchEvent, WatchId,
};
use crate::modules::positioning::core::position::RawFix;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRequest {
    Current(PositionOptions),
    Watch(WatchId, PositionOptions),
    Clear(WatchId),
}

/// One scripted outcome, either a fix or `{"error": {"code": 3}}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScriptedEvent {
    Fix(RawFix),
    Error { error: RawPositionError },
}

impl From<ScriptedEvent> for RawWatchEvent {
    fn from(event: ScriptedEvent) -> Self {
        match event {
            ScriptedEvent::Fix(fix) => Ok(fix),
            ScriptedEvent::Error { error } => Err(error),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PositionScript {
    /// Answers to one-shot requests, in order.
    #[serde(default)]
    pub current: Vec<ScriptedEvent>,
    /// Events pushed into open watches, in order.
    #[serde(default)]
    pub watch: Vec<ScriptedEvent>,
    /// Answer to permission queries. Absent means the platform has no permissions query.
    #[serde(default)]
    pub permission: Option<PermissionState>,
}

#[derive(Default)]
pub struct ScriptedPositionSource {
    current: Mutex<VecDeque<RawWatchEvent>>,
    watchers: Mutex<HashMap<WatchId, UnboundedSender<RawWatchEvent>>>,
    requests: Mutex<Vec<SourceRequest>>,
    next_id: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedPositionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preloads the one-shot answers. Watch events are left to the caller to `emit`.
    pub fn from_script(script: &PositionScript) -> Self {
        let source = Self::new();
        for event in &script.current {
            source.push_current(event.clone().into());
        }
        source
    }

    /// A platform backed by the script: a scripted source plus the scripted permission answer.
    pub fn platform(script: &PositionScript) -> (Arc<Self>, Platform) {
        let source = Arc::new(Self::from_script(script));
        let permissions = script
            .permission
            .map(|state| Arc::new(StaticPermissionQuery::new(state)) as Arc<dyn PermissionQuery>);
        (source.clone(), Platform::new(Some(source), permissions))
    }

    pub fn push_current(&self, outcome: RawWatchEvent) {
        lock(&self.current).push_back(outcome);
    }

    /// Sends `event` to every open watch and returns how many received it.
    pub fn emit(&self, event: RawWatchEvent) -> usize {
        let mut watchers = lock(&self.watchers);
        watchers.retain(|_, tx| !tx.is_closed());
        watchers
            .values()
            .filter(|tx| tx.send(event.clone()).is_ok())
            .count()
    }

    pub fn active_watches(&self) -> usize {
        lock(&self.watchers).len()
    }

    pub fn requests(&self) -> Vec<SourceRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl PositionSource for ScriptedPositionSource {
    async fn current_position(&self, options: PositionOptions) -> Result<RawFix, RawPositionError> {
        lock(&self.requests).push(SourceRequest::Current(options));
        lock(&self.current).pop_front().unwrap_or_else(|| {
            Err(RawPositionError::new(
                POSITION_UNAVAILABLE,
                "no scripted fix left",
            ))
        })
    }

    fn watch_position(&self, options: PositionOptions) -> (WatchId, UnboundedReceiver<RawWatchEvent>) {
        let id = WatchId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.watchers).insert(id, tx);
        lock(&self.requests).push(SourceRequest::Watch(id, options));
        (id, rx)
    }

    fn clear_watch(&self, id: WatchId) {
        lock(&self.requests).push(SourceRequest::Clear(id));
        lock(&self.watchers).remove(&id);
    }
}

/// Permissions query with a fixed answer.
pub struct StaticPermissionQuery {
    outcome: Result<PermissionState, PermissionQueryError>,
}

impl StaticPermissionQuery {
    pub fn new(state: PermissionState) -> Self {
        Self { outcome: Ok(state) }
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            outcome: Err(PermissionQueryError(reason.into())),
        }
    }
}

#[async_trait]
impl PermissionQuery for StaticPermissionQuery {
    async fn geolocation_permission(&self) -> Result<PermissionState, PermissionQueryError> {
        self.outcome.clone()
    }
}
