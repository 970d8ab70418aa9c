//! In-memory reference engine.
//!
//! A deterministic, single-process implementation of the engine traits. It
//! keeps real identity, friend, group, transfer and call state, round-trips
//! that state through `savedata`, and produces properly encoded event
//! batches. No networking: peers and remote actions are simulated through a
//! [`MemoryProbe`].
//!
//! The probe is shared by the provider and every engine it builds. It logs
//! engine calls by name, queues events for the next `iterate`, and can force a
//! status for the next call of a named operation.

mod av;
mod engine;
mod state;

pub use av::MemoryAv;
pub use engine::MemoryEngine;

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, Weak};

use tox4rs_protocol::{
    encode_batch, AvEvent, CoreEvent, EventRecord, FileNumber, FriendNumber, GroupNumber,
    GroupRole, PeerId,
};

use crate::codes::NewCode;
use crate::engine::EngineProvider;
use crate::error::{ErrorCode, Status};
use crate::lock;
use crate::options::{Savedata, SessionOptions};

use self::state::MemoryState;

const DEFAULT_INTERVAL_MS: u32 = 50;
const DEFAULT_AV_INTERVAL_MS: u32 = 20;

pub struct MemoryProvider {
    probe: MemoryProbe,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self {
            probe: MemoryProbe::default(),
        }
    }

    pub fn probe(&self) -> MemoryProbe {
        self.probe.clone()
    }
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineProvider for MemoryProvider {
    type Engine = MemoryEngine;

    fn construct(&self, options: &SessionOptions, savedata: &Savedata) -> Status<MemoryEngine> {
        self.probe.enter("construct")?;

        let state = match savedata {
            Savedata::None => MemoryState::fresh(rand::random(), options),
            Savedata::SecretKey(secret_key) => MemoryState::fresh(*secret_key, options),
            Savedata::ToxSave(blob) => MemoryState::restore(blob, options)?,
        };
        if options.proxy.host.ends_with(".invalid") {
            return Err(NewCode::ProxyNotFound.status());
        }

        let state = Arc::new(Mutex::new(state));
        self.probe.attach(&state);
        Ok(MemoryEngine::new(state, self.probe.clone()))
    }
}

#[derive(Default)]
struct ProbeState {
    calls: Vec<&'static str>,
    forced: HashMap<&'static str, u32>,
    core_events: Vec<CoreEvent>,
    av_events: Vec<AvEvent>,
    raw_batches: VecDeque<Vec<u8>>,
    interval_ms: Option<u32>,
    av_interval_ms: Option<u32>,
    /// State of the most recently constructed engine.
    current: Weak<Mutex<MemoryState>>,
}

/// Observation and simulation handle for memory engines.
#[derive(Clone, Default)]
pub struct MemoryProbe {
    inner: Arc<Mutex<ProbeState>>,
}

impl MemoryProbe {
    // ------------------------------------------------------------------
    // Call log
    // ------------------------------------------------------------------

    /// Engine calls in order. AV calls are prefixed with `av.`.
    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.inner).calls.clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.inner).calls.len()
    }

    pub fn calls_named(&self, name: &str) -> usize {
        lock(&self.inner).calls.iter().filter(|c| **c == name).count()
    }

    pub fn clear_calls(&self) {
        lock(&self.inner).calls.clear();
    }

    /// Make the next call of `operation` fail with `status`.
    pub fn force_status(&self, operation: &'static str, status: u32) {
        lock(&self.inner).forced.insert(operation, status);
    }

    // ------------------------------------------------------------------
    // Event injection
    // ------------------------------------------------------------------

    pub fn push_event(&self, event: impl Into<CoreEvent>) {
        lock(&self.inner).core_events.push(event.into());
    }

    pub fn push_av_event(&self, event: impl Into<AvEvent>) {
        lock(&self.inner).av_events.push(event.into());
    }

    /// Hand `bytes` to the next core `iterate` verbatim, ahead of queued events.
    pub fn push_raw_batch(&self, bytes: Vec<u8>) {
        lock(&self.inner).raw_batches.push_back(bytes);
    }

    pub fn set_iteration_interval(&self, ms: u32) {
        lock(&self.inner).interval_ms = Some(ms);
    }

    pub fn set_av_iteration_interval(&self, ms: u32) {
        lock(&self.inner).av_interval_ms = Some(ms);
    }

    // ------------------------------------------------------------------
    // Remote simulation (acts on the most recently constructed engine)
    // ------------------------------------------------------------------

    /// A friend's connection changes. Queues the matching event.
    pub fn set_friend_connection(
        &self,
        friend: FriendNumber,
        connection: tox4rs_protocol::Connection,
    ) -> bool {
        self.with_state(|state| state.set_friend_connection(friend, connection, self))
            .unwrap_or(false)
    }

    /// A peer joins one of our groups. Queues the matching event.
    pub fn add_group_peer(&self, group: GroupNumber, name: &[u8], role: GroupRole) -> Option<PeerId> {
        self.with_state(|state| state.add_group_peer(group, name, role, self))
            .flatten()
    }

    /// Override our own role in a group.
    pub fn set_self_role(&self, group: GroupNumber, role: GroupRole) -> bool {
        self.with_state(|state| state.set_self_role(group, role))
            .unwrap_or(false)
    }

    /// A friend offers us a file. Queues the matching event.
    pub fn offer_file(&self, friend: FriendNumber, file_size: u64, filename: &[u8]) -> Option<FileNumber> {
        self.with_state(|state| state.offer_file(friend, file_size, filename, self))
            .flatten()
    }

    /// Kind of a live transfer, as given to `file_send` or offered by a peer.
    pub fn transfer_kind(&self, friend: FriendNumber, file: FileNumber) -> Option<u32> {
        self.with_state(|state| state.transfer_kind(friend, file))
            .flatten()
    }

    /// The receiver of one of our files resumes it.
    pub fn accept_file(&self, friend: FriendNumber, file: FileNumber) -> bool {
        self.with_state(|state| state.accept_file(friend, file))
            .unwrap_or(false)
    }

    /// A friend calls us. Queues the matching AV event.
    pub fn ring(&self, friend: FriendNumber, audio: bool, video: bool) -> bool {
        self.with_state(|state| state.ring(friend, audio, video, self))
            .unwrap_or(false)
    }

    /// The friend we are calling answers. Queues the matching AV event.
    pub fn pick_up(&self, friend: FriendNumber) -> bool {
        self.with_state(|state| state.pick_up(friend, self))
            .unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // Engine side
    // ------------------------------------------------------------------

    /// Log a fallible call, failing it if a status was forced.
    pub(crate) fn enter(&self, operation: &'static str) -> Status<()> {
        let mut inner = lock(&self.inner);
        inner.calls.push(operation);
        match inner.forced.remove(operation) {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }

    /// Log an infallible call.
    pub(crate) fn record(&self, operation: &'static str) {
        lock(&self.inner).calls.push(operation);
    }

    fn attach(&self, state: &Arc<Mutex<MemoryState>>) {
        lock(&self.inner).current = Arc::downgrade(state);
    }

    /// Run `f` on the current engine state. The probe lock is released
    /// first: engine code locks state before probe, never the reverse.
    fn with_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> Option<T> {
        let current = lock(&self.inner).current.upgrade()?;
        let mut state = lock(&current);
        Some(f(&mut state))
    }

    pub(crate) fn interval(&self) -> u32 {
        lock(&self.inner).interval_ms.unwrap_or(DEFAULT_INTERVAL_MS)
    }

    pub(crate) fn av_interval(&self) -> u32 {
        lock(&self.inner).av_interval_ms.unwrap_or(DEFAULT_AV_INTERVAL_MS)
    }

    pub(crate) fn take_core_batch(&self) -> Vec<u8> {
        let mut inner = lock(&self.inner);
        if let Some(raw) = inner.raw_batches.pop_front() {
            return raw;
        }
        let events = std::mem::take(&mut inner.core_events);
        drop(inner);
        encode_events(&events)
    }

    pub(crate) fn take_av_batch(&self) -> Vec<u8> {
        let events = std::mem::take(&mut lock(&self.inner).av_events);
        encode_events(&events)
    }
}

/// An empty queue is the zero-length "no events" result.
fn encode_events<Ev: EventRecord>(events: &[Ev]) -> Vec<u8> {
    if events.is_empty() {
        return Vec::new();
    }
    match encode_batch(events) {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            tracing::error!(error = %e, records = events.len(), "memory engine could not encode events");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tox4rs_protocol::events::session::SelfConnectionStatus;
    use tox4rs_protocol::{decode_batch, Connection};

    #[test]
    fn test_forced_status_is_one_shot() {
        let probe = MemoryProbe::default();
        probe.force_status("set_name", 2);
        assert_eq!(probe.enter("set_name"), Err(2));
        assert_eq!(probe.enter("set_name"), Ok(()));
        assert_eq!(probe.calls_named("set_name"), 2);
    }

    #[test]
    fn test_no_events_is_zero_length() {
        let probe = MemoryProbe::default();
        assert!(probe.take_core_batch().is_empty());
        assert!(probe.take_av_batch().is_empty());
    }

    #[test]
    fn test_queued_events_encoded_once() {
        let probe = MemoryProbe::default();
        probe.push_event(SelfConnectionStatus {
            connection_status: Connection::Udp,
        });
        let bytes = probe.take_core_batch();
        let batch = decode_batch::<CoreEvent>(&bytes).unwrap();
        assert_eq!(batch.len(), 1);
        assert!(probe.take_core_batch().is_empty());
    }

    #[test]
    fn test_raw_batch_first() {
        let probe = MemoryProbe::default();
        probe.push_event(SelfConnectionStatus {
            connection_status: Connection::Tcp,
        });
        probe.push_raw_batch(vec![9, 9]);
        assert_eq!(probe.take_core_batch(), vec![9, 9]);
        assert!(!probe.take_core_batch().is_empty());
    }

    #[test]
    fn test_construct_failure_forced() {
        let provider = MemoryProvider::new();
        provider
            .probe()
            .force_status("construct", NewCode::Malloc.status());
        let result = provider.construct(&SessionOptions::default(), &Savedata::None);
        assert_eq!(result.err(), Some(NewCode::Malloc.status()));
    }

    #[test]
    fn test_unresolvable_proxy() {
        let provider = MemoryProvider::new();
        let mut opts = SessionOptions::default();
        opts.proxy.kind = tox4rs_protocol::ProxyType::Http;
        opts.proxy.host = "proxy.invalid".into();
        opts.proxy.port = 3128;
        let result = provider.construct(&opts, &Savedata::None);
        assert_eq!(result.err(), Some(NewCode::ProxyNotFound.status()));
    }
}
