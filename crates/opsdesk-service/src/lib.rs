//! # opsdesk-service
//!
//! Business logic services for Opsdesk. Services hold `Arc`-shared
//! repositories, validate input, run the primary mutation, and hand the
//! before/after state to the change-tracking pipeline as a detached
//! side-effect.

pub mod context;
pub mod project;
pub mod store;

pub use context::RequestContext;
pub use project::{AssignmentRequest, ProjectService, UpdateProjectRequest};
pub use store::ProjectStore;
