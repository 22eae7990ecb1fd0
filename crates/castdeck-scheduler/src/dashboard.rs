//! Read-only dashboard queries over the current snapshot.

use serde::Serialize;

use castdeck_core::traits::NotificationSink;
use castdeck_core::types::{Destination, Platform, StreamRecord, StreamStatus};

use crate::manager::StreamManager;

/// Streams without auto-stop count this long in the summary.
const DEFAULT_DURATION_MINUTES: u64 = 90;

/// Title search plus optional status filter. Empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct StreamFilter {
    pub query: Option<String>,
    pub status: Option<StreamStatus>,
}

impl StreamFilter {
    pub fn query(query: &str) -> Self {
        Self {
            query: Some(query.to_string()),
            status: None,
        }
    }

    pub fn status(status: StreamStatus) -> Self {
        Self {
            query: None,
            status: Some(status),
        }
    }

    pub fn matches(&self, stream: &StreamRecord) -> bool {
        let title_ok = match &self.query {
            Some(q) => stream.title.to_lowercase().contains(&q.to_lowercase()),
            None => true,
        };
        let status_ok = self.status.is_none_or(|s| s == stream.status);
        title_ok && status_ok
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub scheduled: usize,
    pub live: usize,
    pub ended: usize,
    pub errored: usize,
    pub total_duration_minutes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationStatus {
    /// Stream key entered by hand.
    Manual,
    /// Bound to a connected account on the same platform.
    Linked,
    /// The account is no longer connected.
    AccountMissing,
    /// The account exists but is on a different platform.
    PlatformMismatch,
}

/// A destination ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDestination {
    pub id: String,
    pub platform: Platform,
    pub label: String,
    pub status: DestinationStatus,
}

impl<S: NotificationSink> StreamManager<S> {
    /// Current streams matching `filter`, in display order.
    pub fn filter(&self, filter: &StreamFilter) -> Vec<&StreamRecord> {
        self.streams().iter().filter(|s| filter.matches(s)).collect()
    }

    pub fn summary(&self) -> DashboardSummary {
        let mut summary = DashboardSummary::default();
        for stream in self.streams() {
            summary.total += 1;
            match stream.status {
                StreamStatus::Scheduled => summary.scheduled += 1,
                StreamStatus::Live => summary.live += 1,
                StreamStatus::Ended => summary.ended += 1,
                StreamStatus::Error => summary.errored += 1,
            }
            summary.total_duration_minutes += stream
                .schedule
                .auto_stop
                .map(|a| a.duration_minutes as u64)
                .unwrap_or(DEFAULT_DURATION_MINUTES);
        }
        summary
    }

    /// Destinations of a stream with their current account names.
    /// Without an account directory, stored names are trusted as-is.
    pub fn resolve_destinations(&self, stream_id: &str) -> Option<Vec<ResolvedDestination>> {
        let stream = self.stream(stream_id)?;
        let resolved = stream
            .destinations
            .iter()
            .map(|destination| match destination {
                Destination::Manual { id, platform, .. } => ResolvedDestination {
                    id: id.clone(),
                    platform: *platform,
                    label: format!("{platform} (stream key)"),
                    status: DestinationStatus::Manual,
                },
                Destination::Integrated {
                    id,
                    platform,
                    account_id,
                    account_name,
                } => {
                    let account = self.accounts.as_ref().map(|dir| dir.lookup_account(account_id));
                    let (label, status) = match account {
                        None => (account_name.clone(), DestinationStatus::Linked),
                        Some(None) => (account_name.clone(), DestinationStatus::AccountMissing),
                        Some(Some(a)) if a.platform != *platform => {
                            (account_name.clone(), DestinationStatus::PlatformMismatch)
                        }
                        Some(Some(a)) => (a.name, DestinationStatus::Linked),
                    };
                    ResolvedDestination {
                        id: id.clone(),
                        platform: *platform,
                        label,
                        status,
                    }
                }
            })
            .collect();
        Some(resolved)
    }
}
