//! Core library for `wundercast`.
//!
//! This crate defines:
//! - Shared domain models (location samples, queries, results)
//! - Abstractions over weather providers and location sources
//! - The orchestrator merging location and city lookups into one result stream
//! - View binding for whatever screen renders those results
//! - Configuration & credentials handling
//!
//! It is used by `wundercast-cli`, but can also be embedded by other front ends.

pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod replay;
pub mod view;

pub use config::{Config, LocationConfig, ProviderConfig};
pub use error::QueryError;
pub use location::{LocationProvider, ManualLocationProvider};
pub use model::{ACCURACY_THRESHOLD_METERS, LocationSample, WeatherQuery, WeatherResult};
pub use orchestrator::Orchestrator;
pub use provider::{ProviderId, WeatherProvider};
pub use replay::{Replay, Subscription};
pub use view::{MapToggle, ViewBinding, ViewSink, WeatherLabels};
