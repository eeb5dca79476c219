//! Water quality dashboard library.
//!
//! Gateway module (EMBP): the binary and the integration tests only reach
//! the crate through the items re-exported here.
//! - `processor` – timestamp parsing, batch cleaning, aggregation, statistics
//! - `fetcher`   – token-authenticated client for the sensor API
//! - `poller`    – background refresh loop
//! - `state`     – the single shared snapshot guarded by one lock
//! - `routes`    – axum router for the dashboard and its JSON endpoints

mod config;
mod models;
mod state;

pub mod fetcher;
pub mod poller;
pub mod processor;
pub mod routes;

pub use config::{load_from_env, Config};
pub use fetcher::{FetchError, Fetcher, ReadingSource};
pub use models::{Dataset, RawReading, Reading, Statistics};
pub use processor::{aggregate, preprocess, statistics, Period};
pub use state::{SharedState, Snapshot};
