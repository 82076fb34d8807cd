//! SQLite user, report and waitlist store implementation

use async_trait::async_trait;
use idea_validator_domain::{
    ReportStore, StoreError, UserRecord, UserStore, ValidationReport, WaitlistEntry, WaitlistStore,
};
use serde_json::Value;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// SQLite-backed store
pub struct SqliteStore {
    pool: SqlitePool,
}

type UserRow = (String, String, Option<String>, i64, bool, String, String, String);

impl SqliteStore {
    /// Open the database file, creating it and its tables if needed
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Database(format!("Failed to create directory: {}", e))
                })?;
            }
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                email TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                avatar_url TEXT,
                credits INTEGER NOT NULL DEFAULT 0,
                is_pro INTEGER NOT NULL DEFAULT 0,
                preferences TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reports (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL,
                created_at TEXT NOT NULL,
                report TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_reports_email ON reports(email, seq)")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS waitlist (
                email TEXT PRIMARY KEY,
                name TEXT,
                joined_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}

fn format_time(at: OffsetDateTime) -> Result<String, StoreError> {
    at.format(&Rfc3339)
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

fn parse_time(raw: &str) -> Result<OffsetDateTime, StoreError> {
    OffsetDateTime::parse(raw, &Rfc3339).map_err(|e| StoreError::Serialization(e.to_string()))
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn get_user(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT email, name, avatar_url, credits, is_pro, preferences, created_at, updated_at
            FROM users WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        let Some((email, name, avatar_url, credits, is_pro, preferences, created_at, updated_at)) =
            row
        else {
            return Ok(None);
        };

        let preferences: Value = serde_json::from_str(&preferences)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        Ok(Some(UserRecord {
            email,
            name,
            avatar_url,
            credits: u32::try_from(credits.max(0)).unwrap_or(u32::MAX),
            is_pro,
            preferences,
            created_at: parse_time(&created_at)?,
            updated_at: parse_time(&updated_at)?,
        }))
    }

    async fn upsert_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        let preferences = serde_json::to_string(&user.preferences)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO users (email, name, avatar_url, credits, is_pro, preferences, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(email) DO UPDATE SET
                name = excluded.name,
                avatar_url = excluded.avatar_url,
                credits = excluded.credits,
                is_pro = excluded.is_pro,
                preferences = excluded.preferences,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.avatar_url)
        .bind(i64::from(user.credits))
        .bind(user.is_pro)
        .bind(&preferences)
        .bind(format_time(user.created_at)?)
        .bind(format_time(user.updated_at)?)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl ReportStore for SqliteStore {
    async fn append_report(&self, email: &str, report: &ValidationReport) -> Result<(), StoreError> {
        let body =
            serde_json::to_string(report).map_err(|e| StoreError::Serialization(e.to_string()))?;

        sqlx::query("INSERT INTO reports (id, email, created_at, report) VALUES (?, ?, ?, ?)")
            .bind(report.id.to_string())
            .bind(email)
            .bind(format_time(report.created_at)?)
            .bind(&body)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    async fn list_reports(&self, email: &str) -> Result<Vec<ValidationReport>, StoreError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT report FROM reports WHERE email = ? ORDER BY seq DESC")
                .bind(email)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|(body,)| {
                serde_json::from_str(&body).map_err(|e| StoreError::Serialization(e.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl WaitlistStore for SqliteStore {
    async fn add_to_waitlist(&self, entry: &WaitlistEntry) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO waitlist (email, name, joined_at) VALUES (?, ?, ?) ON CONFLICT(email) DO NOTHING",
        )
        .bind(&entry.email)
        .bind(&entry.name)
        .bind(format_time(entry.joined_at)?)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn waitlist_entry(&self, email: &str) -> Result<Option<WaitlistEntry>, StoreError> {
        let row: Option<(String, Option<String>, String)> =
            sqlx::query_as("SELECT email, name, joined_at FROM waitlist WHERE email = ?")
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Database(e.to_string()))?;

        row.map(|(email, name, joined_at)| {
            Ok(WaitlistEntry {
                email,
                name,
                joined_at: parse_time(&joined_at)?,
            })
        })
        .transpose()
    }

    async fn waitlist_len(&self) -> Result<u64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM waitlist")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idea_validator_domain::assemble::assemble_report;
    use idea_validator_domain::normalize::normalize_fields;
    use serde_json::json;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn user(credits: u32, is_pro: bool) -> UserRecord {
        UserRecord {
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
            avatar_url: Some("https://example.com/ada.png".to_string()),
            credits,
            is_pro,
            preferences: json!({"theme": "dark"}),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn report(idea: &str) -> ValidationReport {
        assemble_report(
            normalize_fields(&json!({"summaryVerdict": "Risky", "viabilityScore": 40})),
            Some(idea),
            Uuid::new_v4(),
            OffsetDateTime::UNIX_EPOCH,
        )
    }

    #[tokio::test]
    async fn test_user_roundtrip() {
        let store = SqliteStore::in_memory().await.unwrap();

        store.upsert_user(&user(3, false)).await.unwrap();
        let retrieved = store.get_user("ada@example.com").await.unwrap().unwrap();
        assert_eq!(retrieved, user(3, false));
    }

    #[tokio::test]
    async fn test_upsert_updates_existing_user() {
        let store = SqliteStore::in_memory().await.unwrap();

        store.upsert_user(&user(3, false)).await.unwrap();
        store.upsert_user(&user(13, true)).await.unwrap();

        let retrieved = store.get_user("ada@example.com").await.unwrap().unwrap();
        assert_eq!(retrieved.credits, 13);
        assert!(retrieved.is_pro);
    }

    #[tokio::test]
    async fn test_get_missing_user() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert!(store.get_user("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reports_newest_first() {
        let store = SqliteStore::in_memory().await.unwrap();
        let first = report("first idea");
        let second = report("second idea");

        store.append_report("ada@example.com", &first).await.unwrap();
        store.append_report("ada@example.com", &second).await.unwrap();
        store.append_report("bob@example.com", &report("other")).await.unwrap();

        let reports = store.list_reports("ada@example.com").await.unwrap();
        assert_eq!(reports, vec![second, first]);
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("ideas.db");

        {
            let store = SqliteStore::new(&path).await.unwrap();
            store.upsert_user(&user(5, false)).await.unwrap();
        }

        let reopened = SqliteStore::new(&path).await.unwrap();
        let retrieved = reopened.get_user("ada@example.com").await.unwrap().unwrap();
        assert_eq!(retrieved.credits, 5);
    }

    #[tokio::test]
    async fn test_rejected_report_does_not_spend_credit() {
        use idea_validator_domain::IdentityProfile;
        use idea_validator_domain::usecases::{AccountsConfig, AccountsUseCase};

        let accounts = AccountsUseCase::new(
            SqliteStore::in_memory().await.unwrap(),
            AccountsConfig {
                starting_credits: 3,
            },
        );
        accounts
            .sign_in(&IdentityProfile {
                subject_id: "sub-1".to_string(),
                email: "ada@example.com".to_string(),
                name: "Ada".to_string(),
                picture_url: None,
            })
            .await
            .unwrap();

        let saved = report("Chef marketplace");
        accounts.charge_and_save("ada@example.com", &saved).await.unwrap();
        // Same report id violates the unique constraint
        assert!(accounts.charge_and_save("ada@example.com", &saved).await.is_err());

        let user = accounts.get_user("ada@example.com").await.unwrap().unwrap();
        assert_eq!(user.credits, 2);
        assert_eq!(accounts.reports("ada@example.com").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_waitlist_ignores_duplicate_email() {
        let store = SqliteStore::in_memory().await.unwrap();
        let entry = WaitlistEntry {
            email: "ada@example.com".to_string(),
            name: None,
            joined_at: OffsetDateTime::UNIX_EPOCH,
        };

        assert!(store.add_to_waitlist(&entry).await.unwrap());
        assert!(!store.add_to_waitlist(&entry).await.unwrap());

        assert_eq!(store.waitlist_entry("ada@example.com").await.unwrap(), Some(entry));
        assert_eq!(store.waitlist_entry("bob@example.com").await.unwrap(), None);
        assert_eq!(store.waitlist_len().await.unwrap(), 1);
    }
}
