//! Long-poll consumer handoff.
//!
//! A parked `get_message` call is represented by a [`Waiter`]: a FIFO slot
//! holding a one-shot sender wrapped in a mutex so that exactly one side —
//! the producer delivering a message, or the consumer's wait timing out —
//! can claim it. `oneshot::Sender::send` returning `Err` tells the producer
//! its claim lost the race (the consumer already gave up), at which point
//! the producer must try the next waiter rather than dropping the message.
//!
//! A successful `try_deliver` still isn't the end of the story: the HTTP
//! layer can drop the `get_message` future (client disconnect) after the
//! producer already committed the delivery but before the consumer ever
//! observed it. `Delivery` carries both the pre-delivery snapshot and the
//! delivered message so the caller can restore the former if that race is
//! lost — see `WaiterGuard` in `mod.rs`.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::oneshot;

use super::message::Message;

/// A message handoff in flight to a waiter: the message as it looked right
/// before delivery (for restoration) and as it looks after (for the caller).
#[derive(Clone)]
pub struct Delivery {
    pub pre: Message,
    pub delivered: Message,
}

#[derive(Clone)]
pub struct Waiter {
    slot: Arc<Mutex<Option<oneshot::Sender<Delivery>>>>,
}

impl Waiter {
    /// Create a parked waiter and the receiver the caller should await.
    pub fn new() -> (Self, oneshot::Receiver<Delivery>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                slot: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    /// Attempt to hand `delivery` to this waiter. Returns it back if the
    /// waiter already gave up (timed out or was cancelled), so the caller
    /// can try the next waiter in the FIFO.
    pub fn try_deliver(&self, delivery: Delivery) -> Result<(), Delivery> {
        let tx = self.slot.lock().take();
        match tx {
            Some(tx) => tx.send(delivery),
            None => Err(delivery),
        }
    }

    /// Claim this waiter for cancellation (e.g. on long-poll timeout),
    /// preventing a concurrent `try_deliver` from succeeding afterwards.
    /// Returns `true` if the cancellation won the race.
    pub fn cancel(&self) -> bool {
        self.slot.lock().take().is_some()
    }

    /// Stable identity for this waiter's underlying slot, for locating and
    /// evicting it from a channel's waiter queue after it goes stale.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.slot) as usize
    }
}
