//! Waitlist signup use case

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::model::WaitlistEntry;
use crate::ports::{Clock, Mailer, StoreError, SystemClock, WaitlistStore};
use crate::usecases::notify::{send_best_effort, waitlist_email};

#[derive(Debug, Error)]
pub enum WaitlistError {
    #[error("Invalid email address: '{0}'")]
    InvalidEmail(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a join request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistJoin {
    pub entry: WaitlistEntry,
    /// False when the email was already on the list
    pub newly_joined: bool,
    pub confirmation_sent: bool,
}

pub struct WaitlistUseCase<S> {
    store: S,
    mailer: Option<Arc<dyn Mailer>>,
    clock: Arc<dyn Clock>,
}

impl<S: WaitlistStore> WaitlistUseCase<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            mailer: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Send confirmations through this mailer; without one, none are sent
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Add an email to the waitlist, confirming by mail on first signup only
    pub async fn join(&self, email: &str, name: Option<&str>) -> Result<WaitlistJoin, WaitlistError> {
        let email = email.trim().to_ascii_lowercase();
        if !looks_like_email(&email) {
            return Err(WaitlistError::InvalidEmail(email));
        }

        let candidate = WaitlistEntry {
            email: email.clone(),
            name: name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(ToString::to_string),
            joined_at: self.clock.now(),
        };

        if !self.store.add_to_waitlist(&candidate).await? {
            let entry = self.store.waitlist_entry(&email).await?.unwrap_or(candidate);
            tracing::info!(email = %email, "Already on the waitlist");
            return Ok(WaitlistJoin {
                entry,
                newly_joined: false,
                confirmation_sent: false,
            });
        }

        tracing::info!(email = %email, "Joined the waitlist");
        let confirmation_sent = match &self.mailer {
            Some(mailer) => send_best_effort(mailer.as_ref(), &waitlist_email(&candidate)).await,
            None => {
                tracing::debug!(email = %email, "No mailer configured, skipping confirmation");
                false
            }
        };

        Ok(WaitlistJoin {
            entry: candidate,
            newly_joined: true,
            confirmation_sent,
        })
    }

    pub async fn count(&self) -> Result<u64, WaitlistError> {
        Ok(self.store.waitlist_len().await?)
    }
}

/// One `@` with a non-empty local part and a dotted domain, no whitespace
fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OutboundEmail;
    use crate::ports::MailError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use time::OffsetDateTime;

    #[derive(Default)]
    struct MemWaitlist {
        entries: Mutex<HashMap<String, WaitlistEntry>>,
    }

    #[async_trait]
    impl WaitlistStore for MemWaitlist {
        async fn add_to_waitlist(&self, entry: &WaitlistEntry) -> Result<bool, StoreError> {
            let mut entries = self.entries.lock().unwrap();
            if entries.contains_key(&entry.email) {
                return Ok(false);
            }
            entries.insert(entry.email.clone(), entry.clone());
            Ok(true)
        }

        async fn waitlist_entry(&self, email: &str) -> Result<Option<WaitlistEntry>, StoreError> {
            Ok(self.entries.lock().unwrap().get(email).cloned())
        }

        async fn waitlist_len(&self) -> Result<u64, StoreError> {
            Ok(self.entries.lock().unwrap().len() as u64)
        }
    }

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutboundEmail>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
            if self.fail {
                return Err(MailError::Delivery("smtp down".to_string()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> OffsetDateTime {
            OffsetDateTime::UNIX_EPOCH
        }
    }

    fn waitlist(mailer: Arc<RecordingMailer>) -> WaitlistUseCase<MemWaitlist> {
        WaitlistUseCase::new(MemWaitlist::default())
            .with_mailer(mailer)
            .with_clock(Arc::new(FixedClock))
    }

    #[tokio::test]
    async fn test_join_dedupes_by_lowercased_email() {
        let mailer = Arc::new(RecordingMailer::default());
        let waitlist = waitlist(mailer.clone());

        let first = waitlist.join(" Ada@Example.com ", Some("Ada")).await.unwrap();
        assert!(first.newly_joined);
        assert!(first.confirmation_sent);
        assert_eq!(first.entry.email, "ada@example.com");
        assert_eq!(first.entry.joined_at, OffsetDateTime::UNIX_EPOCH);

        let again = waitlist.join("ADA@example.com", None).await.unwrap();
        assert!(!again.newly_joined);
        assert!(!again.confirmation_sent);
        assert_eq!(again.entry.name.as_deref(), Some("Ada"));

        assert_eq!(waitlist.count().await.unwrap(), 1);
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ada@example.com");
    }

    #[tokio::test]
    async fn test_mail_failure_does_not_fail_join() {
        let waitlist = waitlist(Arc::new(RecordingMailer {
            fail: true,
            ..Default::default()
        }));

        let joined = waitlist.join("ada@example.com", None).await.unwrap();

        assert!(joined.newly_joined);
        assert!(!joined.confirmation_sent);
        assert_eq!(waitlist.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_join_without_mailer() {
        let waitlist = WaitlistUseCase::new(MemWaitlist::default());

        let joined = waitlist.join("ada@example.com", None).await.unwrap();

        assert!(joined.newly_joined);
        assert!(!joined.confirmation_sent);
    }

    #[tokio::test]
    async fn test_rejects_malformed_email() {
        let waitlist = waitlist(Arc::new(RecordingMailer::default()));

        for bad in ["", "ada", "ada@", "@example.com", "ada@example", "a da@example.com", "a@b@c.com"] {
            let err = waitlist.join(bad, None).await.unwrap_err();
            assert!(matches!(err, WaitlistError::InvalidEmail(_)), "accepted {:?}", bad);
        }
        assert_eq!(waitlist.count().await.unwrap(), 0);
    }
}
