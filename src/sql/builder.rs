//! Builds parameterized list/count/update SQL for the catalog tables.
//!
//! Identifiers (table and column names) come from static whitelists in the
//! services; request input only ever becomes `$n` parameters.

use crate::sql::params::{QueryBuf, SqlParam};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> SortOrder {
        if s.eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }

    fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Static description of a listable table.
pub struct ListSpec {
    pub table: &'static str,
    /// Columns matched by the `search` filter (ILIKE).
    pub searchable: &'static [&'static str],
    /// Columns accepted for `sort`; anything else falls back to `default_sort`.
    pub sortable: &'static [&'static str],
    pub default_sort: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub search: Option<String>,
    pub is_active: Option<bool>,
    /// Exact-match column filters, e.g. `("device_id", Int(3))`.
    pub filters: Vec<(&'static str, SqlParam)>,
    pub sort: Option<String>,
    pub order: SortOrder,
    pub limit: u32,
    pub offset: u32,
}

/// Escape LIKE wildcards in a user-supplied search term.
pub fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

fn where_clause(buf: &mut QueryBuf, spec: &ListSpec, opts: &ListOptions) -> String {
    let mut parts: Vec<String> = Vec::new();
    for (col, param) in &opts.filters {
        let n = buf.push_param(param.clone());
        parts.push(format!("{col} = ${n}"));
    }
    if let Some(active) = opts.is_active {
        let n = buf.push_param(SqlParam::Bool(active));
        parts.push(format!("is_active = ${n}"));
    }
    if let Some(term) = opts.search.as_deref() {
        let n = buf.push_param(SqlParam::Text(format!("%{}%", escape_like(term))));
        let ors: Vec<String> = spec
            .searchable
            .iter()
            .map(|col| format!("{col} ILIKE ${n}"))
            .collect();
        parts.push(format!("({})", ors.join(" OR ")));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

fn sort_column<'a>(spec: &'a ListSpec, opts: &'a ListOptions) -> &'a str {
    match opts.sort.as_deref() {
        Some(col) if spec.sortable.contains(&col) => col,
        _ => spec.default_sort,
    }
}

pub fn select_list(spec: &ListSpec, opts: &ListOptions) -> QueryBuf {
    let mut buf = QueryBuf::new();
    let where_sql = where_clause(&mut buf, spec, opts);
    let limit = buf.push_param(SqlParam::Int(opts.limit as i64));
    let offset = buf.push_param(SqlParam::Int(opts.offset as i64));
    buf.sql = format!(
        "SELECT * FROM {}{} ORDER BY {} {}, id ASC LIMIT ${} OFFSET ${}",
        spec.table,
        where_sql,
        sort_column(spec, opts),
        opts.order.as_sql(),
        limit,
        offset
    );
    buf
}

pub fn count_list(spec: &ListSpec, opts: &ListOptions) -> QueryBuf {
    let mut buf = QueryBuf::new();
    let where_sql = where_clause(&mut buf, spec, opts);
    buf.sql = format!("SELECT COUNT(*) FROM {}{}", spec.table, where_sql);
    buf
}

/// Accumulates `SET` assignments for a partial UPDATE. Empty means the
/// request body carried no updatable field.
pub struct UpdateBuf {
    buf: QueryBuf,
    sets: Vec<String>,
}

impl UpdateBuf {
    pub fn new() -> Self {
        UpdateBuf {
            buf: QueryBuf::new(),
            sets: Vec::new(),
        }
    }

    pub fn set(&mut self, col: &str, v: SqlParam) {
        let n = self.buf.push_param(v);
        self.sets.push(format!("{col} = ${n}"));
    }

    pub fn set_opt_text(&mut self, col: &str, v: &Option<String>) {
        if let Some(s) = v {
            self.set(col, SqlParam::Text(s.clone()));
        }
    }

    pub fn set_opt_int(&mut self, col: &str, v: Option<i64>) {
        if let Some(n) = v {
            self.set(col, SqlParam::Int(n));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Finish as `UPDATE <table> SET ..., updated_at = NOW() WHERE id = $n RETURNING *`.
    pub fn finish(mut self, table: &str, id: i64) -> QueryBuf {
        let n = self.buf.push_param(SqlParam::Int(id));
        self.buf.sql = format!(
            "UPDATE {} SET {}, updated_at = NOW() WHERE id = ${} RETURNING *",
            table,
            self.sets.join(", "),
            n
        );
        self.buf
    }
}

impl Default for UpdateBuf {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICES: ListSpec = ListSpec {
        table: "devices",
        searchable: &["name", "brand", "model"],
        sortable: &["name", "order_index", "created_at"],
        default_sort: "order_index",
    };

    #[test]
    fn bare_list_has_no_where_clause() {
        let q = select_list(&DEVICES, &ListOptions { limit: 20, ..Default::default() });
        assert_eq!(
            q.sql,
            "SELECT * FROM devices ORDER BY order_index ASC, id ASC LIMIT $1 OFFSET $2"
        );
        assert_eq!(q.params.len(), 2);
    }

    #[test]
    fn search_reuses_one_parameter_across_columns() {
        let opts = ListOptions {
            search: Some("open".into()),
            is_active: Some(true),
            limit: 20,
            ..Default::default()
        };
        let q = select_list(&DEVICES, &opts);
        assert!(q.sql.contains("is_active = $1"));
        assert!(q.sql.contains("(name ILIKE $2 OR brand ILIKE $2 OR model ILIKE $2)"));
        assert_eq!(q.params.len(), 4);
        assert_eq!(q.params[1], SqlParam::Text("%open%".into()));
    }

    #[test]
    fn unknown_sort_falls_back_to_default() {
        let opts = ListOptions {
            sort: Some("id; DROP TABLE devices".into()),
            limit: 10,
            ..Default::default()
        };
        let q = select_list(&DEVICES, &opts);
        assert!(q.sql.contains("ORDER BY order_index ASC"));
    }

    #[test]
    fn whitelisted_sort_and_desc_are_applied() {
        let opts = ListOptions {
            sort: Some("name".into()),
            order: SortOrder::parse("DESC"),
            limit: 10,
            ..Default::default()
        };
        let q = select_list(&DEVICES, &opts);
        assert!(q.sql.contains("ORDER BY name DESC"));
    }

    #[test]
    fn count_shares_the_where_clause() {
        let opts = ListOptions {
            is_active: Some(false),
            filters: vec![("device_id", SqlParam::Int(7))],
            ..Default::default()
        };
        let q = count_list(&DEVICES, &opts);
        assert_eq!(q.sql, "SELECT COUNT(*) FROM devices WHERE device_id = $1 AND is_active = $2");
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
    }

    #[test]
    fn update_buf_builds_partial_set() {
        let mut u = UpdateBuf::new();
        u.set_opt_text("name", &Some("HDBox".into()));
        u.set_opt_text("brand", &None);
        u.set_opt_int("order_index", Some(4));
        assert!(!u.is_empty());
        let q = u.finish("devices", 9);
        assert_eq!(
            q.sql,
            "UPDATE devices SET name = $1, order_index = $2, updated_at = NOW() WHERE id = $3 RETURNING *"
        );
        assert_eq!(q.params.len(), 3);
    }

    #[test]
    fn update_buf_with_no_fields_is_empty() {
        let u = UpdateBuf::new();
        assert!(u.is_empty());
    }
}
