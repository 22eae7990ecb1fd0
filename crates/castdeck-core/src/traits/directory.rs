use crate::types::ConnectedAccount;

/// Read-only view of the user's connected platform accounts.
pub trait AccountDirectory: Send + Sync {
    fn lookup_account(&self, id: &str) -> Option<ConnectedAccount>;
}
