//! The message record and its lifecycle state.

/// Logical position of a message within its channel.
///
/// `Purged` is never observed outside the store: a purge removes the
/// record entirely rather than leaving a tombstone the caller can see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Sitting in the ready heap, eligible for delivery.
    Ready,
    /// Delivered at least once; invisible until `show`, may be delivered again.
    Hidden,
    /// Delivered its last allowed time; invisible until `show`, at which
    /// point it is purged rather than re-enqueued.
    TerminalHidden,
}

/// A message owned by the broker.
///
/// `generation` is bumped on every state transition that reschedules a
/// timer (delivery, touch) so that a stale `tokio::time::sleep` firing
/// against an old generation is a safe no-op rather than a use of
/// out-of-date state (see the channel module for the timer loop).
#[derive(Debug, Clone)]
pub struct Message {
    pub id: u64,
    pub channel: String,
    pub body: Vec<u8>,
    pub mimetype: String,
    /// Topic this message was fanned out from, if any.
    pub topic: Option<String>,
    pub priority: i64,
    /// Creation time, Unix epoch seconds.
    pub ts: f64,
    /// Absolute purge time, Unix epoch seconds. `None` means never purge.
    pub purge: Option<f64>,
    /// Visibility timeout applied on each delivery, seconds.
    pub timeout: f64,
    /// Maximum number of deliveries. `0` means unlimited.
    pub deliver: u32,
    /// Number of times this message has been delivered so far.
    pub dcount: u32,
    /// Absolute time the message becomes visible again, Unix epoch seconds.
    /// Meaningful only while `state != Ready`.
    pub show: f64,
    pub state: State,
    pub generation: u64,
}

impl Message {
    pub fn is_delivery_exhausted(&self) -> bool {
        self.deliver != 0 && self.dcount >= self.deliver
    }
}
