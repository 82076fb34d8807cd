//! In-memory user, report and waitlist store for testing and offline mode

use async_trait::async_trait;
use idea_validator_domain::{
    ReportStore, StoreError, UserRecord, UserStore, ValidationReport, WaitlistEntry, WaitlistStore,
};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory store implementation
pub struct InMemoryStore {
    users: RwLock<HashMap<String, UserRecord>>,
    reports: RwLock<HashMap<String, Vec<ValidationReport>>>,
    waitlist: RwLock<HashMap<String, WaitlistEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            reports: RwLock::new(HashMap::new()),
            waitlist: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn get_user(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let users = self
            .users
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(users.get(email).cloned())
    }

    async fn upsert_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        let mut users = self
            .users
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        users.insert(user.email.clone(), user.clone());
        Ok(())
    }
}

#[async_trait]
impl ReportStore for InMemoryStore {
    async fn append_report(&self, email: &str, report: &ValidationReport) -> Result<(), StoreError> {
        let mut reports = self
            .reports
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        reports
            .entry(email.to_string())
            .or_default()
            .push(report.clone());
        Ok(())
    }

    async fn list_reports(&self, email: &str) -> Result<Vec<ValidationReport>, StoreError> {
        let reports = self
            .reports
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(reports
            .get(email)
            .map(|list| list.iter().rev().cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl WaitlistStore for InMemoryStore {
    async fn add_to_waitlist(&self, entry: &WaitlistEntry) -> Result<bool, StoreError> {
        let mut waitlist = self
            .waitlist
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        if waitlist.contains_key(&entry.email) {
            return Ok(false);
        }
        waitlist.insert(entry.email.clone(), entry.clone());
        Ok(true)
    }

    async fn waitlist_entry(&self, email: &str) -> Result<Option<WaitlistEntry>, StoreError> {
        let waitlist = self
            .waitlist
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(waitlist.get(email).cloned())
    }

    async fn waitlist_len(&self) -> Result<u64, StoreError> {
        let waitlist = self
            .waitlist
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(waitlist.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idea_validator_domain::assemble::assemble_report;
    use idea_validator_domain::normalize::normalize_fields;
    use serde_json::json;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn user(email: &str, credits: u32) -> UserRecord {
        UserRecord {
            email: email.to_string(),
            name: "Ada".to_string(),
            avatar_url: None,
            credits,
            is_pro: false,
            preferences: json!({}),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[tokio::test]
    async fn test_user_upsert_roundtrip() {
        let store = InMemoryStore::new();

        store.upsert_user(&user("ada@example.com", 3)).await.unwrap();
        store.upsert_user(&user("ada@example.com", 2)).await.unwrap();

        let retrieved = store.get_user("ada@example.com").await.unwrap();
        assert_eq!(retrieved.unwrap().credits, 2);
        assert!(store.get_user("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reports_newest_first_per_user() {
        let store = InMemoryStore::new();

        for idea in ["first", "second"] {
            let report = assemble_report(
                normalize_fields(&json!({})),
                Some(idea),
                Uuid::new_v4(),
                OffsetDateTime::UNIX_EPOCH,
            );
            store.append_report("ada@example.com", &report).await.unwrap();
        }

        let reports = store.list_reports("ada@example.com").await.unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].original_idea, "second");
        assert!(store.list_reports("bob@example.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_waitlist_keeps_first_entry() {
        let store = InMemoryStore::new();
        let entry = WaitlistEntry {
            email: "ada@example.com".to_string(),
            name: Some("Ada".to_string()),
            joined_at: OffsetDateTime::UNIX_EPOCH,
        };

        assert!(store.add_to_waitlist(&entry).await.unwrap());
        let renamed = WaitlistEntry {
            name: None,
            ..entry.clone()
        };
        assert!(!store.add_to_waitlist(&renamed).await.unwrap());

        assert_eq!(store.waitlist_entry("ada@example.com").await.unwrap(), Some(entry));
        assert_eq!(store.waitlist_len().await.unwrap(), 1);
    }
}
