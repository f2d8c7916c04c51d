//! Infrastructure layer: document storage, locking, configuration and the
//! application services that coordinate the course and user aggregates.

pub mod config;
pub mod locks;
pub mod seed;
pub mod services;
pub mod store;

pub use config::{AppConfig, ConfigError, LogFormat};
pub use locks::KeyedLocks;
pub use store::{DocumentStore, InMemoryDocumentStore, StoreError, Versioned};
