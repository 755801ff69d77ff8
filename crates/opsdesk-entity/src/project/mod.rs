//! Project entity and related value objects.

pub mod assignment;
pub mod model;
pub mod status;

pub use assignment::RoleAssignment;
pub use model::{Project, ProjectDetail};
pub use status::ProjectStatus;
