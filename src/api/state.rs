//! Shared axum handler state.

use crate::core::config::EngineDefaults;
use crate::engine::Engine;

#[derive(Clone)]
pub struct ApiState {
    pub engine: Engine,
    pub defaults: EngineDefaults,
}
