//! Standard response envelope helpers.
//!
//! Every endpoint answers with `{success, data, message?, timestamp}`;
//! list endpoints add a `pagination` block.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct PagedEnvelope<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: Pagination,
    pub timestamp: String,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(limit as u64) as u32
        };
        Pagination {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (
        StatusCode::OK,
        Json(Envelope {
            success: true,
            data,
            message: None,
            timestamp: now(),
        }),
    )
}

pub fn ok_with_message<T: Serialize>(data: T, message: impl Into<String>) -> (StatusCode, Json<Envelope<T>>) {
    (
        StatusCode::OK,
        Json(Envelope {
            success: true,
            data,
            message: Some(message.into()),
            timestamp: now(),
        }),
    )
}

pub fn created<T: Serialize>(data: T, message: impl Into<String>) -> (StatusCode, Json<Envelope<T>>) {
    (
        StatusCode::CREATED,
        Json(Envelope {
            success: true,
            data,
            message: Some(message.into()),
            timestamp: now(),
        }),
    )
}

pub fn paged<T: Serialize>(data: Vec<T>, pagination: Pagination) -> (StatusCode, Json<PagedEnvelope<T>>) {
    (
        StatusCode::OK,
        Json(PagedEnvelope {
            success: true,
            data,
            pagination,
            timestamp: now(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_math() {
        let p = Pagination::new(1, 20, 45);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next);
        assert!(!p.has_prev);

        let last = Pagination::new(3, 20, 45);
        assert!(!last.has_next);
        assert!(last.has_prev);

        let empty = Pagination::new(1, 20, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
    }

    #[test]
    fn envelope_serializes_camel_case_pagination() {
        let (_, body) = paged(vec![1, 2, 3], Pagination::new(1, 20, 3));
        let v = serde_json::to_value(&body.0).unwrap();
        assert_eq!(v["success"], true);
        assert_eq!(v["pagination"]["totalPages"], 1);
        assert_eq!(v["pagination"]["hasNext"], false);
        assert!(v["timestamp"].is_string());
    }

    #[test]
    fn message_is_omitted_when_absent() {
        let (_, body) = ok(serde_json::json!({"a": 1}));
        let v = serde_json::to_value(&body.0).unwrap();
        assert!(v.get("message").is_none());
    }
}
