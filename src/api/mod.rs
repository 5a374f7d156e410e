//! API server and routes

pub mod middleware;
pub mod routes;
mod server;
pub mod sns;
pub mod state;
pub mod types;

pub use server::ApiServer;
