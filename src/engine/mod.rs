//! The queue engine: point-to-point channels, topic pub/sub fan-out, and
//! the visibility-timeout / linger timers that drive message lifecycle.
//!
//! All mutable state lives behind one `parking_lot::Mutex`, held only for
//! the duration of a synchronous state transition — no `.await` happens
//! while it's locked. Long-poll waiting and timer delays happen outside
//! the lock; see `waiter` and the timer-spawning helpers below.

pub mod channel;
pub mod clock;
pub mod error;
pub mod message;
pub mod topic;
mod waiter;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use channel::{Channel, HeapEntry};
pub use error::{EngineError, EngineResult};
pub use message::{Message, State};
pub use topic::Subscription;
use topic::Topic;
use waiter::{Delivery, Waiter};

struct Shared {
    state: Mutex<EngineState>,
}

#[derive(Default)]
struct EngineState {
    next_id: u64,
    store: FxHashMap<u64, Message>,
    channels: FxHashMap<String, Channel>,
    topics: FxHashMap<String, Topic>,
}

impl EngineState {
    fn alloc_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Copy)]
enum TimerKind {
    Hide,
    Purge,
}

struct TimerSpec {
    channel: String,
    id: u64,
    generation: u64,
    at: f64,
    kind: TimerKind,
}

/// Handle to the broker core. Cheap to clone — clones share the same
/// underlying state and may be handed to background timer tasks freely.
#[derive(Clone)]
pub struct Engine(Arc<Shared>);

impl Engine {
    pub fn new() -> Self {
        Self(Arc::new(Shared {
            state: Mutex::new(EngineState::default()),
        }))
    }

    // ---- message ingestion -------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub fn add_message(
        &self,
        channel: &str,
        body: Vec<u8>,
        mimetype: String,
        priority: i64,
        timeout: f64,
        linger: Option<f64>,
        deliver: u32,
    ) -> EngineResult<Message> {
        validate_channel_name(channel)?;
        validate_timeout(timeout)?;
        validate_linger(linger)?;
        let (message, timers) = {
            let mut state = self.0.state.lock();
            enqueue_locked(
                &mut state, channel, body, mimetype, None, priority, timeout, linger, deliver,
            )
        };
        self.spawn_timers(timers);
        Ok(message)
    }

    /// Publish to every channel currently subscribed to `topic`, applying
    /// each subscription's own delivery defaults. Fan-out happens under a
    /// single lock acquisition so that no subscriber can be added or removed
    /// mid-publish. A topic with no subscribers is a silent no-op.
    pub fn publish_message(&self, topic: &str, body: Vec<u8>, mimetype: String) -> Vec<Message> {
        let (messages, timers) = {
            let mut state = self.0.state.lock();
            let Some(t) = state.topics.get(topic) else {
                return Vec::new();
            };
            let subs: Vec<(String, Subscription)> = t
                .subscribers
                .iter()
                .map(|(c, s)| (c.clone(), *s))
                .collect();

            let mut messages = Vec::with_capacity(subs.len());
            let mut timers = Vec::new();
            for (chan_name, sub) in subs {
                let (message, mut ts) = enqueue_locked(
                    &mut state,
                    &chan_name,
                    body.clone(),
                    mimetype.clone(),
                    Some(topic.to_string()),
                    sub.priority,
                    sub.timeout,
                    sub.linger,
                    sub.deliver,
                );
                timers.append(&mut ts);
                messages.push(message);
            }
            (messages, timers)
        };
        self.spawn_timers(timers);
        messages
    }

    // ---- consumption --------------------------------------------------------

    /// Fetch the next ready message on `channel`, long-polling up to `wait`
    /// if none is immediately available. Returns `None` on long-poll
    /// exhaustion (maps to HTTP 204 at the adapter).
    ///
    /// If this future is dropped before it resolves — the caller's long
    /// poll times out at the HTTP layer, or the client disconnects — and a
    /// message had already raced into delivery, `WaiterGuard` restores it
    /// to `Ready` with its pre-delivery `dcount`/`show` rather than letting
    /// it sit silently consumed against the delivery cap.
    pub async fn get_message(&self, channel: &str, wait: Duration) -> Option<Message> {
        let (waiter, rx) = {
            let mut state = self.0.state.lock();
            let chan = state.channels.entry(channel.to_string()).or_default();

            if let Some(id) = pop_ready_valid(chan, &state.store) {
                let now = clock::now();
                let message = state.store.get_mut(&id).expect("id came from the store");
                message.dcount += 1;
                message.generation += 1;
                message.show = now + message.timeout;
                message.state = if message.is_delivery_exhausted() {
                    State::TerminalHidden
                } else {
                    State::Hidden
                };
                let result = message.clone();
                let spec = TimerSpec {
                    channel: channel.to_string(),
                    id,
                    generation: result.generation,
                    at: result.show,
                    kind: TimerKind::Hide,
                };
                drop(state);
                self.spawn_timers(vec![spec]);
                return Some(result);
            }

            if wait.is_zero() {
                return None;
            }

            let (waiter, rx) = Waiter::new();
            chan.waiters.push_back(waiter.clone());
            (waiter, rx)
        };

        let mut guard = WaiterGuard {
            engine: self.clone(),
            channel: channel.to_string(),
            waiter,
            rx: Some(rx),
            settled: false,
        };
        guard.recv(wait).await
    }

    pub fn touch_message_from_id(
        &self,
        id: u64,
        timeout: Option<f64>,
    ) -> EngineResult<Message> {
        let (message, spec) = {
            let mut state = self.0.state.lock();
            let msg = state.store.get_mut(&id).ok_or(EngineError::NotFound)?;
            if msg.state == State::Ready {
                // Not hidden: treated the same as an absent id — a
                // boolean "nothing to touch" — so the HTTP adapter can
                // map both to 404 uniformly.
                return Err(EngineError::NotFound);
            }
            if let Some(t) = timeout {
                msg.timeout = t;
            }
            msg.generation += 1;
            msg.show = clock::now() + msg.timeout;
            let result = msg.clone();
            let spec = TimerSpec {
                channel: result.channel.clone(),
                id,
                generation: result.generation,
                at: result.show,
                kind: TimerKind::Hide,
            };
            (result, spec)
        };
        self.spawn_timers(vec![spec]);
        Ok(message)
    }

    pub fn delete_message_from_id(&self, id: u64) -> EngineResult<()> {
        let mut state = self.0.state.lock();
        let removed = state.store.remove(&id).ok_or(EngineError::NotFound)?;
        release_message_slot(&mut state, &removed.channel);
        Ok(())
    }

    /// Remove every message currently owned by `channel`, ready or hidden,
    /// and wake any parked long-polls with an immediate empty result.
    /// Returns the number of messages removed.
    pub fn drain_channel(&self, channel: &str) -> usize {
        let mut state = self.0.state.lock();
        let ids: Vec<u64> = state
            .store
            .iter()
            .filter(|(_, m)| m.channel == channel)
            .map(|(id, _)| *id)
            .collect();
        for id in &ids {
            state.store.remove(id);
        }
        if let Some(chan) = state.channels.get_mut(channel) {
            chan.ready.clear();
            chan.message_count = 0;
            for waiter in chan.waiters.drain(..) {
                waiter.cancel();
            }
        }
        maybe_remove_channel(&mut state, channel);
        ids.len()
    }

    // ---- subscriptions --------------------------------------------------------

    pub fn add_subscription(
        &self,
        channel: &str,
        topic: &str,
        sub: Subscription,
    ) -> EngineResult<()> {
        validate_channel_name(channel)?;
        validate_channel_name(topic).map_err(|_| {
            EngineError::InvalidArgument("topic name must not be empty".to_string())
        })?;
        validate_timeout(sub.timeout)?;
        validate_linger(sub.linger)?;
        let mut state = self.0.state.lock();
        state
            .channels
            .entry(channel.to_string())
            .or_default()
            .topics
            .insert(topic.to_string());
        state
            .topics
            .entry(topic.to_string())
            .or_default()
            .subscribers
            .insert(channel.to_string(), sub);
        Ok(())
    }

    /// Removes the `(channel, topic)` subscription. Returns whether it
    /// actually existed, matching `delete_message_from_id`/
    /// `touch_message_from_id`'s found/not-found reporting.
    pub fn delete_subscription(&self, channel: &str, topic: &str) -> bool {
        let mut state = self.0.state.lock();
        let existed = state
            .topics
            .get_mut(topic)
            .is_some_and(|t| t.subscribers.remove(channel).is_some());
        maybe_remove_topic(&mut state, topic);
        if let Some(c) = state.channels.get_mut(channel) {
            c.topics.remove(topic);
        }
        maybe_remove_channel(&mut state, channel);
        existed
    }

    // ---- enumeration & stats --------------------------------------------------

    pub fn list_channels(&self) -> Vec<String> {
        let state = self.0.state.lock();
        let mut names: Vec<String> = state
            .channels
            .iter()
            .filter(|(_, c)| c.exists())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn list_topics(&self) -> Vec<String> {
        let state = self.0.state.lock();
        let mut names: Vec<String> = state
            .topics
            .iter()
            .filter(|(_, t)| !t.subscribers.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn list_topics_for_channel(&self, channel: &str) -> Vec<String> {
        let state = self.0.state.lock();
        let mut names: Vec<String> = state
            .channels
            .get(channel)
            .filter(|c| c.exists())
            .map(|c| c.topics.iter().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn list_topic_subscribers(&self, topic: &str) -> Vec<String> {
        let state = self.0.state.lock();
        let mut names: Vec<String> = state
            .topics
            .get(topic)
            .map(|t| t.subscribers.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// `(ready, hidden)` counts for `channel`. Unknown channels report zero.
    pub fn channel_stats(&self, channel: &str) -> (usize, usize) {
        let state = self.0.state.lock();
        state.store.values().filter(|m| m.channel == channel).fold(
            (0usize, 0usize),
            |(ready, hidden), m| match m.state {
                State::Ready => (ready + 1, hidden),
                State::Hidden | State::TerminalHidden => (ready, hidden + 1),
            },
        )
    }

    /// Total live message count, across every channel.
    pub fn stats(&self) -> usize {
        self.0.state.lock().store.len()
    }

    // ---- timers -----------------------------------------------------------

    fn spawn_timers(&self, specs: Vec<TimerSpec>) {
        for spec in specs {
            let engine = self.clone();
            tokio::spawn(async move {
                let delay = (spec.at - clock::now()).max(0.0);
                tokio::time::sleep(Duration::from_secs_f64(delay)).await;
                engine.on_timer_fire(spec);
            });
        }
    }

    fn on_timer_fire(&self, spec: TimerSpec) {
        let timers = {
            let mut state = self.0.state.lock();
            match spec.kind {
                TimerKind::Purge => {
                    if state.store.remove(&spec.id).is_some() {
                        release_message_slot(&mut state, &spec.channel);
                    }
                    Vec::new()
                }
                TimerKind::Hide => {
                    let still_current = state
                        .store
                        .get(&spec.id)
                        .is_some_and(|m| m.generation == spec.generation);
                    if !still_current {
                        Vec::new()
                    } else {
                        match state.store.get(&spec.id).map(|m| m.state) {
                            Some(State::TerminalHidden) => {
                                state.store.remove(&spec.id);
                                release_message_slot(&mut state, &spec.channel);
                                Vec::new()
                            }
                            Some(State::Hidden) => {
                                let mut message =
                                    state.store.remove(&spec.id).expect("checked above");
                                message.state = State::Ready;
                                let (_, timers) =
                                    dispatch_locked(&mut state, &spec.channel, message);
                                timers
                            }
                            _ => Vec::new(),
                        }
                    }
                }
            }
        };
        self.spawn_timers(timers);
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Validates a channel or topic name: must be non-empty. Caller errors are
/// rejected before any state is touched, per the engine's failure contract.
fn validate_channel_name(name: &str) -> EngineResult<()> {
    if name.is_empty() {
        return Err(EngineError::InvalidArgument(
            "channel name must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_timeout(timeout: f64) -> EngineResult<()> {
    if !timeout.is_finite() || timeout < 0.0 {
        return Err(EngineError::InvalidArgument(
            "timeout must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

fn validate_linger(linger: Option<f64>) -> EngineResult<()> {
    if let Some(l) = linger {
        if !l.is_finite() || l < 0.0 {
            return Err(EngineError::InvalidArgument(
                "linger must be a non-negative number".to_string(),
            ));
        }
    }
    Ok(())
}

/// Accounts for one message leaving `channel_name` (delete, drain, or
/// timer-driven purge) and drops the channel's registry entry once nothing
/// keeps it alive (no messages, no subscriptions, no parked waiter).
fn release_message_slot(state: &mut EngineState, channel_name: &str) {
    if let Some(chan) = state.channels.get_mut(channel_name) {
        chan.message_count = chan.message_count.saturating_sub(1);
    }
    maybe_remove_channel(state, channel_name);
}

/// Wraps a parked waiter's receive half so that, however `get_message`'s
/// await is unwound — a clean timeout, or the future simply being dropped
/// (client disconnect) — the waiter is accounted for exactly once: either
/// the delivery is handed back to the caller, or it's undone.
struct WaiterGuard {
    engine: Engine,
    channel: String,
    waiter: Waiter,
    rx: Option<tokio::sync::oneshot::Receiver<Delivery>>,
    settled: bool,
}

impl WaiterGuard {
    async fn recv(&mut self, wait: Duration) -> Option<Message> {
        let rx = self.rx.as_mut().expect("rx taken only in Drop");
        match tokio::time::timeout(wait, rx).await {
            Ok(Ok(delivery)) => {
                self.settled = true;
                Some(delivery.delivered)
            }
            Ok(Err(_)) => {
                // Sender was dropped without sending — something else
                // (e.g. `drain_channel`) already claimed and evicted this
                // waiter, so there's nothing left for us to undo.
                self.settled = true;
                None
            }
            Err(_) => None,
        }
    }
}

impl Drop for WaiterGuard {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        // We lost interest before a delivery arrived. Race `cancel()`
        // against a concurrent `try_deliver`: if we win, nothing was ever
        // handed out. If we lose, a `Delivery` is already sitting in the
        // channel — claim it and restore the message to `Ready`.
        let lost_race = !self.waiter.cancel();
        let delivery = if lost_race {
            self.rx.take().and_then(|mut rx| rx.try_recv().ok())
        } else {
            None
        };
        restore_or_evict(&self.engine, &self.channel, self.waiter.id(), delivery);
    }
}

/// Undoes an in-flight delivery that nobody will ever observe (`delivery`
/// present) and/or evicts a now-stale waiter from the channel's FIFO so it
/// doesn't keep the channel alive forever (spec.md §3's existence rule).
fn restore_or_evict(engine: &Engine, channel_name: &str, waiter_id: usize, delivery: Option<Delivery>) {
    let mut state = engine.0.state.lock();
    if let Some(Delivery { pre, .. }) = delivery {
        if let Some(msg) = state.store.get_mut(&pre.id) {
            msg.dcount = pre.dcount;
            msg.show = pre.show;
            msg.state = State::Ready;
            // Bump past the generation the now-aborted delivery's Hide
            // timer was scheduled against, so that timer is a no-op.
            msg.generation += 1;
            let entry = HeapEntry {
                priority: msg.priority,
                show: msg.show,
                id: msg.id,
                generation: msg.generation,
            };
            state
                .channels
                .entry(channel_name.to_string())
                .or_default()
                .ready
                .push(entry);
        }
    }
    if let Some(chan) = state.channels.get_mut(channel_name) {
        chan.remove_waiter(waiter_id);
    }
    maybe_remove_channel(&mut state, channel_name);
}

/// A parked waiter keeps the registry entry alive even with zero messages
/// and zero subscriptions — destroying it here would strand that waiter's
/// `oneshot` sender with nothing left to deliver to it.
fn maybe_remove_channel(state: &mut EngineState, channel_name: &str) {
    let remove = state
        .channels
        .get(channel_name)
        .is_some_and(|c| !c.exists() && c.waiters.is_empty());
    if remove {
        state.channels.remove(channel_name);
    }
}

fn maybe_remove_topic(state: &mut EngineState, topic_name: &str) {
    let remove = state
        .topics
        .get(topic_name)
        .is_some_and(|t| t.subscribers.is_empty());
    if remove {
        state.topics.remove(topic_name);
    }
}

/// Pop ready-heap entries until a live one is found, silently discarding
/// tombstones left behind by deletes or purges.
fn pop_ready_valid(chan: &mut Channel, store: &FxHashMap<u64, Message>) -> Option<u64> {
    while let Some(entry) = chan.ready.pop() {
        match store.get(&entry.id) {
            Some(m) if m.state == State::Ready && m.generation == entry.generation => {
                return Some(entry.id);
            }
            _ => continue,
        }
    }
    None
}

/// Place a fresh `Ready` message: hand it directly to a parked waiter if one
/// exists (counting as a delivery), otherwise enqueue it on the ready heap.
fn dispatch_locked(
    state: &mut EngineState,
    channel_name: &str,
    mut message: Message,
) -> (Message, Vec<TimerSpec>) {
    let chan = state.channels.entry(channel_name.to_string()).or_default();
    let mut handed = false;
    while let Some(waiter) = chan.waiters.pop_front() {
        let mut candidate = message.clone();
        candidate.dcount += 1;
        candidate.generation += 1;
        candidate.show = clock::now() + candidate.timeout;
        candidate.state = if candidate.is_delivery_exhausted() {
            State::TerminalHidden
        } else {
            State::Hidden
        };
        let delivery = Delivery {
            pre: message.clone(),
            delivered: candidate.clone(),
        };
        match waiter.try_deliver(delivery) {
            Ok(()) => {
                message = candidate;
                handed = true;
                break;
            }
            Err(_) => continue,
        }
    }

    let mut timers = Vec::new();
    if handed {
        timers.push(TimerSpec {
            channel: channel_name.to_string(),
            id: message.id,
            generation: message.generation,
            at: message.show,
            kind: TimerKind::Hide,
        });
    } else {
        chan.ready.push(HeapEntry {
            priority: message.priority,
            show: message.show,
            id: message.id,
            generation: message.generation,
        });
    }
    state.store.insert(message.id, message.clone());
    (message, timers)
}

#[allow(clippy::too_many_arguments)]
fn enqueue_locked(
    state: &mut EngineState,
    channel_name: &str,
    body: Vec<u8>,
    mimetype: String,
    topic: Option<String>,
    priority: i64,
    timeout: f64,
    linger: Option<f64>,
    deliver: u32,
) -> (Message, Vec<TimerSpec>) {
    let id = state.alloc_id();
    let ts = clock::now();
    let purge = linger.map(|l| ts + l);
    let message = Message {
        id,
        channel: channel_name.to_string(),
        body,
        mimetype,
        topic,
        priority,
        ts,
        purge,
        timeout,
        deliver,
        dcount: 0,
        show: ts,
        state: State::Ready,
        generation: 0,
    };
    state
        .channels
        .entry(channel_name.to_string())
        .or_default()
        .message_count += 1;
    let (message, mut timers) = dispatch_locked(state, channel_name, message);
    if let Some(p) = purge {
        timers.push(TimerSpec {
            channel: channel_name.to_string(),
            id: message.id,
            generation: message.generation,
            at: p,
            kind: TimerKind::Purge,
        });
    }
    (message, timers)
}
