//! Audit logging for expense-vault
//!
//! Security events (registration, key provisioning, logins, lockouts,
//! password changes) and data changes are appended to a JSON-lines log.
//!
//! - `AuditEntry`: one event with optional before/after snapshots of the
//!   stored entity.
//! - `AuditLogger`: appends entries to `audit.log` and reads them back.

mod entry;
mod logger;

pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
