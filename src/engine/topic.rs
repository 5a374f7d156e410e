//! Topic pub/sub overlay: a topic fans a published message out onto every
//! channel subscribed to it, applying that subscription's delivery
//! defaults.

use std::collections::HashMap;

/// Delivery defaults applied to messages fanned out from a topic to a
/// particular channel.
#[derive(Debug, Clone, Copy)]
pub struct Subscription {
    pub timeout: f64,
    pub linger: Option<f64>,
    pub deliver: u32,
    pub priority: i64,
}

impl Default for Subscription {
    fn default() -> Self {
        Self {
            timeout: 60.0,
            linger: None,
            deliver: 0,
            priority: 0,
        }
    }
}

#[derive(Default)]
pub struct Topic {
    /// Channel name -> subscription defaults.
    pub subscribers: HashMap<String, Subscription>,
}
