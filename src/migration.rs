//! Linear apply-once-and-record migration runner.
//!
//! Migrations are an ordered, embedded list of `(name, sql)` pairs. Applied
//! names are recorded in `schema_migrations`; each pending migration runs
//! together with its record insert in one transaction.

use crate::error::AppError;
use sqlx::PgPool;
use std::collections::HashSet;

struct Migration {
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "0001_catalog_tables",
        sql: r#"
CREATE TABLE IF NOT EXISTS devices (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    brand TEXT,
    model TEXT,
    description TEXT,
    image_url TEXT,
    order_index INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'active',
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS problems (
    id BIGSERIAL PRIMARY KEY,
    device_id BIGINT NOT NULL REFERENCES devices(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT,
    category TEXT NOT NULL DEFAULT 'other',
    icon TEXT,
    color TEXT,
    tags JSONB NOT NULL DEFAULT '[]',
    priority INTEGER NOT NULL DEFAULT 0,
    estimated_time INTEGER,
    difficulty TEXT NOT NULL DEFAULT 'beginner',
    success_rate INTEGER,
    completed_count INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'draft',
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS diagnostic_steps (
    id BIGSERIAL PRIMARY KEY,
    problem_id BIGINT NOT NULL REFERENCES problems(id) ON DELETE CASCADE,
    device_id BIGINT REFERENCES devices(id) ON DELETE CASCADE,
    step_number INTEGER NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    instruction TEXT,
    estimated_time INTEGER,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS diagnostic_sessions (
    id BIGSERIAL PRIMARY KEY,
    device_id BIGINT NOT NULL REFERENCES devices(id) ON DELETE CASCADE,
    problem_id BIGINT NOT NULL REFERENCES problems(id) ON DELETE CASCADE,
    session_key TEXT NOT NULL UNIQUE,
    start_time TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    end_time TIMESTAMPTZ,
    total_steps INTEGER NOT NULL DEFAULT 0,
    completed_steps INTEGER NOT NULL DEFAULT 0,
    success BOOLEAN NOT NULL DEFAULT FALSE,
    duration INTEGER,
    user_agent TEXT,
    ip_address TEXT,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS tv_interfaces (
    id BIGSERIAL PRIMARY KEY,
    device_id BIGINT NOT NULL REFERENCES devices(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    description TEXT,
    kind TEXT NOT NULL DEFAULT 'custom',
    screenshot_url TEXT,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS tv_interface_marks (
    id BIGSERIAL PRIMARY KEY,
    tv_interface_id BIGINT NOT NULL REFERENCES tv_interfaces(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    shape TEXT NOT NULL DEFAULT 'rectangle',
    position_x INTEGER NOT NULL DEFAULT 0,
    position_y INTEGER NOT NULL DEFAULT 0,
    width INTEGER,
    height INTEGER,
    color TEXT,
    order_index INTEGER NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS remotes (
    id BIGSERIAL PRIMARY KEY,
    device_id BIGINT REFERENCES devices(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    manufacturer TEXT,
    model TEXT,
    image_url TEXT,
    is_default BOOLEAN NOT NULL DEFAULT FALSE,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT,
    role TEXT NOT NULL DEFAULT 'viewer',
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS site_settings (
    id BIGSERIAL PRIMARY KEY,
    site_name TEXT NOT NULL DEFAULT 'ANT Support',
    default_language TEXT NOT NULL DEFAULT 'ru',
    settings JSONB NOT NULL DEFAULT '{}',
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS change_logs (
    id BIGSERIAL PRIMARY KEY,
    entity_type TEXT NOT NULL,
    entity_id BIGINT NOT NULL,
    action TEXT NOT NULL,
    old_value JSONB,
    new_value JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#,
    },
    Migration {
        // Uniqueness among active rows lives in the database, not in
        // check-then-act application code. The index names are part of the
        // error-translation contract (see error::duplicate_message).
        name: "0002_uniqueness_and_lookup_indexes",
        sql: r#"
CREATE UNIQUE INDEX IF NOT EXISTS devices_active_name_key
    ON devices (name) WHERE is_active;
CREATE UNIQUE INDEX IF NOT EXISTS problems_active_title_key
    ON problems (device_id, title) WHERE is_active;
CREATE UNIQUE INDEX IF NOT EXISTS tv_interfaces_active_name_key
    ON tv_interfaces (device_id, name) WHERE is_active;

CREATE INDEX IF NOT EXISTS problems_device_id_idx ON problems (device_id);
CREATE INDEX IF NOT EXISTS diagnostic_steps_problem_id_idx
    ON diagnostic_steps (problem_id, step_number);
CREATE INDEX IF NOT EXISTS diagnostic_sessions_device_id_idx
    ON diagnostic_sessions (device_id);
CREATE INDEX IF NOT EXISTS diagnostic_sessions_problem_id_idx
    ON diagnostic_sessions (problem_id);
CREATE INDEX IF NOT EXISTS tv_interface_marks_interface_idx
    ON tv_interface_marks (tv_interface_id, order_index);
CREATE INDEX IF NOT EXISTS change_logs_entity_idx
    ON change_logs (entity_type, entity_id);
"#,
    },
];

/// Apply all pending migrations. Returns how many were applied.
pub async fn run_migrations(pool: &PgPool) -> Result<u32, AppError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            executed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await?;

    let applied: HashSet<String> = sqlx::query_scalar("SELECT name FROM schema_migrations ORDER BY id")
        .fetch_all(pool)
        .await?
        .into_iter()
        .collect();

    let mut ran = 0;
    for m in MIGRATIONS {
        if applied.contains(m.name) {
            tracing::debug!(name = m.name, "migration already applied");
            continue;
        }
        tracing::info!(name = m.name, "applying migration");
        let mut tx = pool.begin().await?;
        sqlx::raw_sql(m.sql).execute(&mut *tx).await?;
        sqlx::query("INSERT INTO schema_migrations (name) VALUES ($1)")
            .bind(m.name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        ran += 1;
    }
    Ok(ran)
}

/// Tables owned by the migrations, children first. Shared with the cleanup
/// endpoint so truncation order always respects foreign keys.
pub const TABLES_CHILD_FIRST: &[&str] = &[
    "diagnostic_sessions",
    "diagnostic_steps",
    "tv_interface_marks",
    "tv_interfaces",
    "remotes",
    "problems",
    "devices",
    "change_logs",
    "users",
    "site_settings",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_names_are_unique_and_ordered() {
        let names: Vec<&str> = MIGRATIONS.iter().map(|m| m.name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(names, sorted, "migrations must be unique and in apply order");
    }

    #[test]
    fn every_truncated_table_is_created_by_a_migration() {
        let ddl = MIGRATIONS.iter().map(|m| m.sql).collect::<String>();
        for table in TABLES_CHILD_FIRST {
            assert!(
                ddl.contains(&format!("CREATE TABLE IF NOT EXISTS {table}")),
                "{table} missing from DDL"
            );
        }
    }

    #[test]
    fn unique_index_names_match_error_translation() {
        let ddl = MIGRATIONS.iter().map(|m| m.sql).collect::<String>();
        for idx in [
            "devices_active_name_key",
            "problems_active_title_key",
            "tv_interfaces_active_name_key",
        ] {
            assert!(ddl.contains(idx), "{idx} missing from DDL");
        }
    }
}
