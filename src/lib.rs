//! Ecotech: register, log in and look up Chilean financial indicators
//! (UF, dólar, euro, UTM, IPC, IVP), optionally logging each lookup.

pub mod auth;
pub mod cli;
pub mod config;
pub mod indicators;
pub mod query_log;
pub mod session;
pub mod state;
pub mod storage;
pub mod validation;

pub use session::{Session, SessionError, SessionState};
pub use state::AppState;
