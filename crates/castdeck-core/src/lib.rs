//! # CastDeck Core
//!
//! Shared vocabulary for the CastDeck workspace: the stream data model,
//! the error type, configuration, the clock abstraction, and the traits
//! for collaborators that live outside the scheduler (notification sink,
//! connected-account directory, key-value storage).

pub mod accounts;
pub mod clock;
pub mod config;
pub mod error;
pub mod kv;
pub mod traits;
pub mod types;

pub use accounts::ConnectedAccounts;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CastDeckConfig, NotificationConfig, SchedulerConfig};
pub use error::{CastDeckError, Result};
pub use kv::MemoryStore;
pub use traits::{AccountDirectory, KeyValueStore, NotificationSink};
pub use types::*;
