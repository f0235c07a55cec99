pub mod access_control;
pub mod contract;
pub mod issuance;
pub mod roster;

// Re-export the main types for convenience
pub use access_control::{AccessControl, RoleAuthority};
pub use contract::ChecksContract;
pub use issuance::IssuanceLedger;
pub use roster::{snapshot_minters, sync_minters, MinterEntry, MinterStatus, SyncReport};
