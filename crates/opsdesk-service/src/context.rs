//! Request context carrying the authenticated user and request origin.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use opsdesk_audit::RequestMeta;

/// Context for the current authenticated request.
///
/// Extracted by the surrounding application's auth layer and passed into
/// service methods so that every operation knows *who* is acting and
/// from *where*.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: Uuid,
    /// The username (convenience field for log lines).
    pub username: String,
    /// IP address of the request origin, empty when unavailable.
    pub ip_address: String,
    /// User-Agent header value.
    pub user_agent: Option<String>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(
        user_id: Uuid,
        username: String,
        ip_address: String,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            user_id,
            username,
            ip_address,
            user_agent,
            request_time: Utc::now(),
        }
    }

    /// Request metadata in the shape the audit pipeline records.
    pub fn audit_meta(&self) -> RequestMeta {
        RequestMeta {
            ip: self.ip_address.clone(),
            user_agent: self.user_agent.clone().unwrap_or_default(),
        }
    }
}
