//! Project workflow status enumeration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use opsdesk_core::error::AppError;

/// Workflow states a project moves through, from intake to delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Accepted but not yet started.
    Planned,
    /// Actively being worked on.
    InProgress,
    /// Awaiting team-lead review.
    TlCheck,
    /// Work finished, handed over to the client.
    Delivered,
    /// Paused at client or management request.
    OnHold,
    /// Abandoned before delivery.
    Cancelled,
}

impl ProjectStatus {
    /// Human-readable label shown in activity feeds and change logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Planned => "Planned",
            Self::InProgress => "In progress",
            Self::TlCheck => "TL check",
            Self::Delivered => "Delivered",
            Self::OnHold => "On hold",
            Self::Cancelled => "Cancelled",
        }
    }

    /// The snake_case string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::InProgress => "in_progress",
            Self::TlCheck => "tl_check",
            Self::Delivered => "delivered",
            Self::OnHold => "on_hold",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the project has reached a terminal state.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planned" => Ok(Self::Planned),
            "in_progress" => Ok(Self::InProgress),
            "tl_check" => Ok(Self::TlCheck),
            "delivered" => Ok(Self::Delivered),
            "on_hold" => Ok(Self::OnHold),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(AppError::validation(format!(
                "Unknown project status: {other}"
            ))),
        }
    }
}
