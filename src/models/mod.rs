//! Row and payload types for the catalog entities.

pub mod device;
pub mod problem;
pub mod remote;
pub mod session;
pub mod step;
pub mod tv_interface;

use serde::Deserialize;

/// One element of a bulk-update request body.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkUpdate<T> {
    pub id: i64,
    pub data: T,
}

/// Outcome of a soft-delete dependency check.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DeleteCheck {
    pub can_delete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl DeleteCheck {
    pub fn allowed() -> Self {
        DeleteCheck {
            can_delete: true,
            reason: None,
            suggestion: None,
        }
    }

    pub fn blocked(reason: impl Into<String>, suggestion: impl Into<String>) -> Self {
        DeleteCheck {
            can_delete: false,
            reason: Some(reason.into()),
            suggestion: Some(suggestion.into()),
        }
    }
}
