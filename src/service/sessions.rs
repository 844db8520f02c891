//! Diagnostic session CRUD and completion.

use crate::error::AppError;
use crate::models::session::{
    CompleteSession, CreateSession, DiagnosticSession, SessionStats, UpdateSession,
};
use crate::service::validate_session_create;
use crate::sql::{count_list, select_list, ListOptions, ListSpec, UpdateBuf};
use sqlx::PgPool;
use uuid::Uuid;

const LIST: ListSpec = ListSpec {
    table: "diagnostic_sessions",
    searchable: &["session_key", "user_agent"],
    sortable: &["start_time", "end_time", "duration", "created_at"],
    default_sort: "start_time",
};

pub struct SessionService;

impl SessionService {
    pub async fn list(
        pool: &PgPool,
        opts: &ListOptions,
    ) -> Result<(Vec<DiagnosticSession>, u64), AppError> {
        let q = select_list(&LIST, opts);
        tracing::debug!(sql = %q.sql, "query");
        let rows = q.query_as::<DiagnosticSession>().fetch_all(pool).await?;
        let total = count_list(&LIST, opts).query_scalar_i64().fetch_one(pool).await?;
        Ok((rows, total as u64))
    }

    pub async fn get(pool: &PgPool, id: i64) -> Result<Option<DiagnosticSession>, AppError> {
        let row = sqlx::query_as::<_, DiagnosticSession>(
            "SELECT * FROM diagnostic_sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    pub async fn create(pool: &PgPool, p: &CreateSession) -> Result<DiagnosticSession, AppError> {
        validate_session_create(p)?;
        let session_key = Uuid::new_v4().to_string();
        let row = sqlx::query_as::<_, DiagnosticSession>(
            "INSERT INTO diagnostic_sessions (device_id, problem_id, session_key, total_steps,
                                              user_agent, ip_address)
             VALUES ($1, $2, $3, COALESCE($4, 0), $5, $6)
             RETURNING *",
        )
        .bind(p.device_id)
        .bind(p.problem_id)
        .bind(&session_key)
        .bind(p.total_steps)
        .bind(&p.user_agent)
        .bind(&p.ip_address)
        .fetch_one(pool)
        .await?;
        Ok(row)
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        p: &UpdateSession,
    ) -> Result<Option<DiagnosticSession>, AppError> {
        let mut u = UpdateBuf::new();
        u.set_opt_int("completed_steps", p.completed_steps.map(i64::from));
        u.set_opt_int("total_steps", p.total_steps.map(i64::from));
        if let Some(success) = p.success {
            u.set("success", crate::sql::SqlParam::Bool(success));
        }
        if u.is_empty() {
            return Err(AppError::Validation("No fields to update".into()));
        }
        let q = u.finish("diagnostic_sessions", id);
        let row = q.query_as::<DiagnosticSession>().fetch_optional(pool).await?;
        Ok(row)
    }

    /// Close a session: stamp `end_time`, derive `duration` from
    /// `start_time`, and bump the problem's completion counter on success.
    pub async fn complete(
        pool: &PgPool,
        id: i64,
        p: &CompleteSession,
    ) -> Result<Option<DiagnosticSession>, AppError> {
        let mut tx = pool.begin().await?;
        let row = sqlx::query_as::<_, DiagnosticSession>(
            "UPDATE diagnostic_sessions
             SET end_time = NOW(),
                 duration = EXTRACT(EPOCH FROM (NOW() - start_time))::int,
                 completed_steps = COALESCE($2, completed_steps),
                 success = $3,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(p.completed_steps)
        .bind(p.success)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        if p.success {
            sqlx::query("UPDATE problems SET completed_count = completed_count + 1 WHERE id = $1")
                .bind(row.problem_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(Some(row))
    }

    /// Aggregates, optionally narrowed to one device and/or problem.
    pub async fn stats(
        pool: &PgPool,
        device_id: Option<i64>,
        problem_id: Option<i64>,
    ) -> Result<SessionStats, AppError> {
        let stats = sqlx::query_as::<_, SessionStats>(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE end_time IS NOT NULL) AS completed,
                    COUNT(*) FILTER (WHERE success) AS successful,
                    AVG(duration)::float8 AS avg_duration
             FROM diagnostic_sessions
             WHERE ($1::bigint IS NULL OR device_id = $1)
               AND ($2::bigint IS NULL OR problem_id = $2)",
        )
        .bind(device_id)
        .bind(problem_id)
        .fetch_one(pool)
        .await?;
        Ok(stats)
    }
}
