pub mod config;
pub mod error;
pub mod events;
pub mod id;
pub mod record;
pub mod roles;

// Re-export the main types for convenience
pub use config::LedgerConfig;
pub use error::{ErrorKind, LedgerError};
pub use events::{EventLog, EventRecord, EventSink, LedgerEvent};
pub use id::Identity;
pub use record::{TokenId, TokenRecord};
pub use roles::{Role, RoleSet};
