//! Seams to collaborators that live outside the scheduler.

pub mod directory;
pub mod notify;
pub mod store;

pub use directory::AccountDirectory;
pub use notify::NotificationSink;
pub use store::KeyValueStore;
