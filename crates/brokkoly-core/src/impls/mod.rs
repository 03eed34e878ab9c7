//! Impls - 開発用の実装
//!
//! - **InMemoryBroker** / **InMemoryConnector**: `memory://` のブローカー

pub mod inmem_broker;

pub use self::inmem_broker::{InMemoryBroker, InMemoryConnector, JobRecord, MEMORY_SCHEME, Retention};
