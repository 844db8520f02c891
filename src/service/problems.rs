//! Problem CRUD against PostgreSQL.

use crate::error::AppError;
use crate::models::problem::{CreateProblem, Problem, ProblemStats, UpdateProblem};
use crate::models::{BulkUpdate, DeleteCheck};
use crate::service::change_log;
use crate::service::{validate_problem_create, validate_problem_update};
use crate::sql::{count_list, select_list, ListOptions, ListSpec, UpdateBuf, SqlParam};
use sqlx::PgPool;

const LIST: ListSpec = ListSpec {
    table: "problems",
    searchable: &["title", "description"],
    sortable: &["title", "category", "priority", "status", "created_at", "updated_at"],
    default_sort: "priority",
};

const BULK_LIMIT: usize = 100;

pub struct ProblemService;

impl ProblemService {
    pub async fn list(pool: &PgPool, opts: &ListOptions) -> Result<(Vec<Problem>, u64), AppError> {
        let q = select_list(&LIST, opts);
        tracing::debug!(sql = %q.sql, "query");
        let rows = q.query_as::<Problem>().fetch_all(pool).await?;
        let total = count_list(&LIST, opts).query_scalar_i64().fetch_one(pool).await?;
        Ok((rows, total as u64))
    }

    pub async fn get(pool: &PgPool, id: i64) -> Result<Option<Problem>, AppError> {
        let row = sqlx::query_as::<_, Problem>("SELECT * FROM problems WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    pub async fn create(pool: &PgPool, p: &CreateProblem) -> Result<Problem, AppError> {
        validate_problem_create(p)?;
        let row = sqlx::query_as::<_, Problem>(
            "INSERT INTO problems (device_id, title, description, category, icon, color, tags,
                                   priority, estimated_time, difficulty, success_rate, status)
             VALUES ($1, $2, $3, COALESCE($4, 'other'), $5, $6, COALESCE($7, '[]'::jsonb),
                     COALESCE($8, 0), $9, COALESCE($10, 'beginner'), $11, COALESCE($12, 'draft'))
             RETURNING *",
        )
        .bind(p.device_id)
        .bind(p.title.trim())
        .bind(&p.description)
        .bind(&p.category)
        .bind(&p.icon)
        .bind(&p.color)
        .bind(&p.tags)
        .bind(p.priority)
        .bind(p.estimated_time)
        .bind(&p.difficulty)
        .bind(p.success_rate)
        .bind(&p.status)
        .fetch_one(pool)
        .await?;
        change_log::record(pool, "problem", row.id, "create", None, change_log::snapshot(&row)).await?;
        Ok(row)
    }

    pub async fn update(pool: &PgPool, id: i64, p: &UpdateProblem) -> Result<Option<Problem>, AppError> {
        validate_problem_update(p)?;
        let Some(old) = Self::get(pool, id).await? else {
            return Ok(None);
        };
        let mut u = UpdateBuf::new();
        u.set_opt_int("device_id", p.device_id);
        u.set_opt_text("title", &p.title);
        u.set_opt_text("description", &p.description);
        u.set_opt_text("category", &p.category);
        u.set_opt_text("icon", &p.icon);
        u.set_opt_text("color", &p.color);
        if let Some(tags) = &p.tags {
            u.set("tags", SqlParam::Json(tags.clone()));
        }
        u.set_opt_int("priority", p.priority.map(i64::from));
        u.set_opt_int("estimated_time", p.estimated_time.map(i64::from));
        u.set_opt_text("difficulty", &p.difficulty);
        u.set_opt_int("success_rate", p.success_rate.map(i64::from));
        u.set_opt_text("status", &p.status);
        if u.is_empty() {
            return Err(AppError::Validation("No fields to update".into()));
        }
        let q = u.finish("problems", id);
        let row = q.query_as::<Problem>().fetch_optional(pool).await?;
        if let Some(row) = &row {
            change_log::record(
                pool,
                "problem",
                id,
                "update",
                change_log::snapshot(&old),
                change_log::snapshot(row),
            )
            .await?;
        }
        Ok(row)
    }

    pub async fn can_delete(pool: &PgPool, id: i64) -> Result<DeleteCheck, AppError> {
        let steps: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM diagnostic_steps WHERE problem_id = $1 AND is_active",
        )
        .bind(id)
        .fetch_one(pool)
        .await?;
        if steps > 0 {
            return Ok(DeleteCheck::blocked(
                format!("Problem has {steps} active diagnostic steps"),
                "Delete its steps first, or pass force=true",
            ));
        }
        Ok(DeleteCheck::allowed())
    }

    pub async fn soft_delete(pool: &PgPool, id: i64) -> Result<Option<Problem>, AppError> {
        let row = sqlx::query_as::<_, Problem>(
            "UPDATE problems SET is_active = FALSE, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        if let Some(row) = &row {
            change_log::record(pool, "problem", id, "archive", change_log::snapshot(row), None).await?;
        }
        Ok(row)
    }

    pub async fn hard_delete(pool: &PgPool, id: i64) -> Result<Option<Problem>, AppError> {
        let row = sqlx::query_as::<_, Problem>("DELETE FROM problems WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        if let Some(row) = &row {
            change_log::record(pool, "problem", id, "delete", change_log::snapshot(row), None).await?;
        }
        Ok(row)
    }

    pub async fn restore(pool: &PgPool, id: i64) -> Result<Option<Problem>, AppError> {
        let row = sqlx::query_as::<_, Problem>(
            "UPDATE problems SET is_active = TRUE, updated_at = NOW()
             WHERE id = $1 AND NOT is_active RETURNING *",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    /// Copy a problem (and its active steps) onto another device.
    pub async fn duplicate_to_device(
        pool: &PgPool,
        id: i64,
        device_id: i64,
    ) -> Result<Problem, AppError> {
        let mut tx = pool.begin().await?;
        let copy = sqlx::query_as::<_, Problem>(
            "INSERT INTO problems (device_id, title, description, category, icon, color, tags,
                                   priority, estimated_time, difficulty, success_rate, status)
             SELECT $2, title, description, category, icon, color, tags,
                    priority, estimated_time, difficulty, success_rate, 'draft'
             FROM problems WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(device_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Problem {id} not found")))?;

        sqlx::query(
            "INSERT INTO diagnostic_steps (problem_id, device_id, step_number, title,
                                           description, instruction, estimated_time)
             SELECT $2, $3, step_number, title, description, instruction, estimated_time
             FROM diagnostic_steps WHERE problem_id = $1 AND is_active
             ORDER BY step_number",
        )
        .bind(id)
        .bind(copy.id)
        .bind(device_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        change_log::record(pool, "problem", copy.id, "duplicate", None, change_log::snapshot(&copy))
            .await?;
        Ok(copy)
    }

    pub async fn stats(pool: &PgPool) -> Result<ProblemStats, AppError> {
        let stats = sqlx::query_as::<_, ProblemStats>(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE is_active) AS active,
                    COUNT(*) FILTER (WHERE status = 'published' AND is_active) AS published,
                    COUNT(*) FILTER (WHERE category = 'critical' AND is_active) AS critical
             FROM problems",
        )
        .fetch_one(pool)
        .await?;
        Ok(stats)
    }

    pub async fn bulk_update(
        pool: &PgPool,
        updates: &[BulkUpdate<UpdateProblem>],
    ) -> Result<Vec<Problem>, AppError> {
        if updates.is_empty() {
            return Err(AppError::Validation("Update array must not be empty".into()));
        }
        if updates.len() > BULK_LIMIT {
            return Err(AppError::Validation(format!(
                "Bulk update limited to {BULK_LIMIT} items"
            )));
        }
        for item in updates {
            validate_problem_update(&item.data)?;
        }
        let mut tx = pool.begin().await?;
        let mut out = Vec::with_capacity(updates.len());
        for item in updates {
            let mut u = UpdateBuf::new();
            u.set_opt_int("device_id", item.data.device_id);
            u.set_opt_text("title", &item.data.title);
            u.set_opt_text("description", &item.data.description);
            u.set_opt_text("category", &item.data.category);
            u.set_opt_text("status", &item.data.status);
            u.set_opt_int("priority", item.data.priority.map(i64::from));
            if u.is_empty() {
                return Err(AppError::Validation(format!(
                    "Update for problem {} has no fields",
                    item.id
                )));
            }
            let q = u.finish("problems", item.id);
            let row = q
                .query_as::<Problem>()
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Problem {} not found", item.id)))?;
            out.push(row);
        }
        tx.commit().await?;
        Ok(out)
    }
}
