//! idea-validator domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `recovery`: Pulling a JSON object out of free-form model output
//! - `normalize`: Mapping loosely-shaped JSON onto the report fields
//! - `assemble`: Attaching identity and timestamp to a report
//! - `prompts`: Analysis and chat prompts
//! - `usecases`: Application use cases / business logic

pub mod assemble;
pub mod model;
pub mod normalize;
pub mod ports;
pub mod prompts;
pub mod recovery;
pub mod usecases;

pub use model::*;
pub use ports::*;
