//! # opsdesk-database
//!
//! PostgreSQL database connection management and concrete repository
//! implementations for Opsdesk entities, including the [`AuditSink`] and
//! [`ReferenceLookup`] implementations the change-tracking pipeline
//! consumes.
//!
//! [`AuditSink`]: opsdesk_audit::AuditSink
//! [`ReferenceLookup`]: opsdesk_audit::ReferenceLookup

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
