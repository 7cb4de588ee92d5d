//! sockmon: live system metrics from a WebSocket agent, normalized into a
//! stable snapshot and kept on screen while the connection comes and goes.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod store;
pub mod types;
pub mod ui;
pub mod ws;
