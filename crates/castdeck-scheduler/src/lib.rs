//! # CastDeck Scheduler
//!
//! Versioned stream collection, broadcast lifecycle, and the clock-driven
//! "starts soon" warnings for simulated multi-destination broadcasts.
//!
//! ## Architecture
//! ```text
//! StreamManager
//!   ├── History<Snapshot>     save / delete / status change → commit; undo / redo move the cursor
//!   ├── status::transition    Scheduled → Live | Error, Live → Ended (pure, returns effects)
//!   ├── TimerQueue            (fire_at, EndStream) entries from the Live transition
//!   ├── UpcomingEvaluator     one-time streams entering the lookahead window, once per id
//!   └── NotificationSink      receives every emitted event (NotificationCenter by default)
//!
//! spawn_scheduler (tokio interval) → StreamManager::on_tick(now)
//!   ├── fire due timers → transition(.., Ended)
//!   └── evaluate upcoming warnings
//! ```

pub mod dashboard;
pub mod engine;
pub mod history;
pub mod manager;
pub mod notify;
pub mod status;
pub mod timers;
pub mod upcoming;

pub use dashboard::{DashboardSummary, DestinationStatus, ResolvedDestination, StreamFilter};
pub use engine::spawn_scheduler;
pub use history::{History, Snapshot};
pub use manager::{StatusChange, StreamManager, TickReport};
pub use notify::NotificationCenter;
pub use status::{Effect, Rejection, TransitionOutcome};
pub use timers::{TimerAction, TimerQueue};
pub use upcoming::{UpcomingEvaluator, UpcomingWarning};
