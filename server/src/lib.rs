//! xrate Server
//!
//! Wires the rate service, the conversion ledger and the background refresh
//! into one process, and serves them over HTTP.

pub mod app;
pub mod config;
pub mod dto;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;

pub use app::App;
pub use config::{LogFormat, ServerConfig};
pub use error::{AppError, AppResult};
pub use routes::router;
pub use state::AppState;
