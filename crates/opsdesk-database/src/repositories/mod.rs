//! Concrete repository implementations.

pub mod audit;
pub mod project;
pub mod reference;

pub use audit::AuditLogRepository;
pub use project::ProjectRepository;
pub use reference::ReferenceRepository;
