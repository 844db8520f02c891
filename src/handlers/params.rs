//! Query-string parsing shared by the list endpoints.
//!
//! Listings take `Query<HashMap<String, String>>` and parse explicitly;
//! unknown or malformed parameters are ignored rather than rejected.

use crate::sql::{ListOptions, SortOrder};
use std::collections::HashMap;

pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

pub fn parse_bool(map: &HashMap<String, String>, key: &str) -> Option<bool> {
    map.get(key).and_then(|v| match v.as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    })
}

pub fn parse_u32(map: &HashMap<String, String>, key: &str) -> Option<u32> {
    map.get(key).and_then(|v| v.parse().ok())
}

pub fn parse_i64(map: &HashMap<String, String>, key: &str) -> Option<i64> {
    map.get(key).and_then(|v| v.parse().ok())
}

pub fn parse_string(map: &HashMap<String, String>, key: &str) -> Option<String> {
    map.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()).map(String::from)
}

#[derive(Debug, Default)]
pub struct ListParams {
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub order: Option<String>,
    /// Admin listings see archived rows unless `is_active` narrows them.
    pub admin: bool,
}

impl ListParams {
    pub fn from_query(map: &HashMap<String, String>) -> Self {
        ListParams {
            search: parse_string(map, "search"),
            is_active: parse_bool(map, "is_active"),
            page: parse_u32(map, "page"),
            limit: parse_u32(map, "limit"),
            sort: parse_string(map, "sort"),
            order: parse_string(map, "order"),
            admin: parse_bool(map, "admin").unwrap_or(false),
        }
    }

    /// Resolve into builder options plus the (page, limit) echoed in the
    /// pagination block. Soft-deleted rows are excluded by default.
    pub fn resolve(&self) -> (ListOptions, u32, u32) {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let page = self.page.unwrap_or(1).max(1);
        let is_active = match (self.admin, self.is_active) {
            (_, Some(explicit)) => Some(explicit),
            (true, None) => None,
            (false, None) => Some(true),
        };
        let opts = ListOptions {
            search: self.search.clone(),
            is_active,
            filters: Vec::new(),
            sort: self.sort.clone(),
            order: self.order.as_deref().map(SortOrder::parse).unwrap_or_default(),
            limit,
            offset: (page - 1) * limit,
        };
        (opts, page, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_exclude_archived_rows() {
        let (opts, page, limit) = ListParams::from_query(&query(&[])).resolve();
        assert_eq!(opts.is_active, Some(true));
        assert_eq!((page, limit), (1, DEFAULT_LIMIT));
        assert_eq!(opts.offset, 0);
    }

    #[test]
    fn admin_listing_sees_everything() {
        let p = ListParams::from_query(&query(&[("admin", "true")]));
        assert_eq!(p.resolve().0.is_active, None);
    }

    #[test]
    fn explicit_is_active_wins_over_admin() {
        let p = ListParams::from_query(&query(&[("admin", "true"), ("is_active", "false")]));
        assert_eq!(p.resolve().0.is_active, Some(false));
    }

    #[test]
    fn limit_is_clamped_and_offset_derived() {
        let p = ListParams::from_query(&query(&[("page", "3"), ("limit", "500")]));
        let (opts, page, limit) = p.resolve();
        assert_eq!(limit, MAX_LIMIT);
        assert_eq!(page, 3);
        assert_eq!(opts.offset, 2 * MAX_LIMIT);
    }

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        let p = ListParams::from_query(&query(&[("page", "first"), ("is_active", "yes")]));
        let (opts, page, _) = p.resolve();
        assert_eq!(page, 1);
        assert_eq!(opts.is_active, Some(true));
    }

    #[test]
    fn blank_search_is_dropped() {
        let p = ListParams::from_query(&query(&[("search", "   ")]));
        assert_eq!(p.resolve().0.search, None);
    }
}
