//! idea-validator adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `llm`: provider adapters (Google, OpenAI, Anthropic, OpenRouter) plus HTTP and stub transports
//! - `store`: SQLite and in-memory user/report stores
//! - `outbox`: JSONL outbox mailer

pub mod outbox;
mod store_memory;
mod store_sqlite;

pub mod llm;

/// Re-exports for store adapters
pub mod store {
    pub use crate::store_memory::InMemoryStore;
    pub use crate::store_sqlite::SqliteStore;
}
