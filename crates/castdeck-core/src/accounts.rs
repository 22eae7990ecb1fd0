//! Connected platform accounts, persisted through a [`KeyValueStore`].
//!
//! Accounts are stored as one JSON array under the `connected_accounts` key.
//! Every change is written back immediately.

use std::sync::{Arc, RwLock};

use crate::error::Result;
use crate::traits::{AccountDirectory, KeyValueStore};
use crate::types::{ConnectedAccount, Platform};

pub const ACCOUNTS_KEY: &str = "connected_accounts";

/// Directory of connected accounts.
pub struct ConnectedAccounts {
    store: Arc<dyn KeyValueStore>,
    accounts: RwLock<Vec<ConnectedAccount>>,
}

impl ConnectedAccounts {
    /// Load the directory from `store`. A missing or unreadable entry
    /// yields an empty directory.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let accounts = match store.get(ACCOUNTS_KEY) {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("⚠️ Failed to parse {ACCOUNTS_KEY}: {e}");
                Vec::new()
            }),
            None => Vec::new(),
        };
        tracing::debug!("🔗 Loaded {} connected accounts", accounts.len());
        Self {
            store,
            accounts: RwLock::new(accounts),
        }
    }

    /// Add an account, replacing any existing entry with the same id.
    pub fn connect(&self, account: ConnectedAccount) -> Result<()> {
        let mut accounts = self.accounts.write().unwrap_or_else(|e| e.into_inner());
        match accounts.iter_mut().find(|a| a.id == account.id) {
            Some(existing) => *existing = account.clone(),
            None => accounts.push(account.clone()),
        }
        tracing::info!("🔗 Connected {} account '{}'", account.platform, account.name);
        self.persist(&accounts)
    }

    /// Remove an account. Returns `Ok(false)` if it was not connected.
    pub fn disconnect(&self, id: &str) -> Result<bool> {
        let mut accounts = self.accounts.write().unwrap_or_else(|e| e.into_inner());
        let len = accounts.len();
        accounts.retain(|a| a.id != id);
        if accounts.len() == len {
            return Ok(false);
        }
        tracing::info!("🔌 Disconnected account {id}");
        self.persist(&accounts)?;
        Ok(true)
    }

    pub fn list(&self) -> Vec<ConnectedAccount> {
        self.accounts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn by_platform(&self, platform: Platform) -> Vec<ConnectedAccount> {
        self.accounts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|a| a.platform == platform)
            .cloned()
            .collect()
    }

    fn persist(&self, accounts: &[ConnectedAccount]) -> Result<()> {
        let json = serde_json::to_string(accounts)?;
        self.store.set(ACCOUNTS_KEY, &json);
        Ok(())
    }
}

impl AccountDirectory for ConnectedAccounts {
    fn lookup_account(&self, id: &str) -> Option<ConnectedAccount> {
        self.accounts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;

    #[test]
    fn test_connect_persists_and_reloads() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let accounts = ConnectedAccounts::load(store.clone());
        accounts
            .connect(ConnectedAccount::new("yt-gaming", Platform::YouTube, "My Gaming Channel"))
            .unwrap();
        accounts
            .connect(ConnectedAccount::new("twitch-main", Platform::Twitch, "Main Twitch"))
            .unwrap();

        let reloaded = ConnectedAccounts::load(store);
        assert_eq!(reloaded.list().len(), 2);
        assert_eq!(
            reloaded.lookup_account("twitch-main").map(|a| a.name),
            Some("Main Twitch".to_string())
        );
        assert_eq!(reloaded.by_platform(Platform::YouTube).len(), 1);
    }

    #[test]
    fn test_connect_replaces_same_id() {
        let accounts = ConnectedAccounts::load(Arc::new(MemoryStore::new()));
        accounts
            .connect(ConnectedAccount::new("fb-page", Platform::Facebook, "Old Name"))
            .unwrap();
        accounts
            .connect(ConnectedAccount::new("fb-page", Platform::Facebook, "New Name"))
            .unwrap();

        let list = accounts.list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "New Name");
    }

    #[test]
    fn test_disconnect() {
        let accounts = ConnectedAccounts::load(Arc::new(MemoryStore::new()));
        accounts
            .connect(ConnectedAccount::new("tt-biz", Platform::TikTok, "Business"))
            .unwrap();

        assert!(accounts.disconnect("tt-biz").unwrap());
        assert!(!accounts.disconnect("tt-biz").unwrap());
        assert!(accounts.lookup_account("tt-biz").is_none());
    }

    #[test]
    fn test_corrupt_entry_loads_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(ACCOUNTS_KEY, "{not json");
        let accounts = ConnectedAccounts::load(store);
        assert!(accounts.list().is_empty());
    }
}
