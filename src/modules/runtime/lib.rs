//! Runtime side of Portico configuration
//!
//! This crate owns the configuration snapshot handed to the gateway: it runs
//! load sessions, publishes each accepted configuration atomically and keeps
//! it current by watching the configuration files.

pub mod reloader;
pub mod store;

pub use reloader::{shutdown_signal, Reloader, DEFAULT_DEBOUNCE};
pub use store::{ConfigStore, LoadReport, Rejection, Snapshot};
