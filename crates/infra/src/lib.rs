//! Infrastructure layer: configuration, record storage, and the service
//! facade that wires the domain crates together.

pub mod config;
pub mod service;
pub mod store;

pub use config::{ConfigError, CrmConfig};
pub use service::CrmService;
pub use store::{CrmStore, InMemoryStore, Tables};
