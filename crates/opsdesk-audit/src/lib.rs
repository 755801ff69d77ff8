//! # opsdesk-audit
//!
//! Change-tracking pipeline for project edits. An edit operation hands this
//! crate the fully-loaded pre-mutation and post-mutation state of a project;
//! the pipeline turns that into one append-only audit log entry:
//!
//! 1. [`snapshot::normalize`] projects each state into a stable,
//!    JSON-comparable snapshot (whitelisted fields, RFC 3339 timestamps,
//!    relation names beside IDs, sorted per-role assignment name lists).
//! 2. [`diff::diff`] computes a structural diff between the two snapshots.
//! 3. [`changeset::finalize`] rewrites the raw diff into a display-ready
//!    change set: per-role assignment pairs and foreign-key IDs resolved
//!    into human-readable labels.
//! 4. [`recorder::AuditRecorder`] packages the change set with actor and
//!    request metadata and appends it through an [`AuditSink`].
//!
//! The pipeline is best-effort by contract: it runs after the primary
//! mutation has committed, and its failure must never surface to the caller.
//! [`pipeline::AuditPipeline::spawn_project_updated`] enforces that by
//! running the whole sequence on a detached task that only logs its errors.

pub mod changeset;
pub mod diff;
pub mod pipeline;
pub mod recorder;
pub mod snapshot;
pub mod traits;

pub use changeset::ChangeSet;
pub use diff::DiffNode;
pub use pipeline::AuditPipeline;
pub use recorder::{AuditRecorder, RequestMeta};
pub use snapshot::Snapshot;
pub use traits::{AuditSink, ReferenceKind, ReferenceLookup};
