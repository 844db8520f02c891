//! Diagnostic step CRUD. Step numbering is owned by this service.

use crate::error::AppError;
use crate::models::step::{CreateStep, DiagnosticStep, UpdateStep};
use crate::models::BulkUpdate;
use crate::service::change_log;
use crate::service::{validate_step_create, validate_step_update};
use crate::sql::{count_list, select_list, ListOptions, ListSpec, SqlParam, UpdateBuf};
use sqlx::PgPool;

const LIST: ListSpec = ListSpec {
    table: "diagnostic_steps",
    searchable: &["title", "description", "instruction"],
    sortable: &["step_number", "title", "created_at", "updated_at"],
    default_sort: "step_number",
};

const BULK_LIMIT: usize = 100;

pub struct StepService;

impl StepService {
    pub async fn list(
        pool: &PgPool,
        opts: &ListOptions,
    ) -> Result<(Vec<DiagnosticStep>, u64), AppError> {
        let q = select_list(&LIST, opts);
        tracing::debug!(sql = %q.sql, "query");
        let rows = q.query_as::<DiagnosticStep>().fetch_all(pool).await?;
        let total = count_list(&LIST, opts).query_scalar_i64().fetch_one(pool).await?;
        Ok((rows, total as u64))
    }

    pub async fn get(pool: &PgPool, id: i64) -> Result<Option<DiagnosticStep>, AppError> {
        let row = sqlx::query_as::<_, DiagnosticStep>("SELECT * FROM diagnostic_steps WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    /// Appends at the end of the problem's sequence: number assignment and
    /// insert run in one transaction.
    pub async fn create(pool: &PgPool, p: &CreateStep) -> Result<DiagnosticStep, AppError> {
        validate_step_create(p)?;
        let mut tx = pool.begin().await?;
        let row = sqlx::query_as::<_, DiagnosticStep>(
            "INSERT INTO diagnostic_steps (problem_id, device_id, step_number, title,
                                           description, instruction, estimated_time)
             VALUES ($1, $2,
                     (SELECT COALESCE(MAX(step_number), 0) + 1
                        FROM diagnostic_steps WHERE problem_id = $1),
                     $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(p.problem_id)
        .bind(p.device_id)
        .bind(p.title.trim())
        .bind(&p.description)
        .bind(&p.instruction)
        .bind(p.estimated_time)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        change_log::record(pool, "step", row.id, "create", None, change_log::snapshot(&row)).await?;
        Ok(row)
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        p: &UpdateStep,
    ) -> Result<Option<DiagnosticStep>, AppError> {
        validate_step_update(p)?;
        let Some(old) = Self::get(pool, id).await? else {
            return Ok(None);
        };
        let mut u = UpdateBuf::new();
        u.set_opt_text("title", &p.title);
        u.set_opt_text("description", &p.description);
        u.set_opt_text("instruction", &p.instruction);
        u.set_opt_int("estimated_time", p.estimated_time.map(i64::from));
        if u.is_empty() {
            return Err(AppError::Validation("No fields to update".into()));
        }
        let q = u.finish("diagnostic_steps", id);
        let row = q.query_as::<DiagnosticStep>().fetch_optional(pool).await?;
        if let Some(row) = &row {
            change_log::record(
                pool,
                "step",
                id,
                "update",
                change_log::snapshot(&old),
                change_log::snapshot(row),
            )
            .await?;
        }
        Ok(row)
    }

    /// Soft or hard delete; with `renumber` the remaining active steps of the
    /// problem are packed back to 1..n in one transaction.
    pub async fn delete(
        pool: &PgPool,
        id: i64,
        force: bool,
        renumber: bool,
    ) -> Result<Option<DiagnosticStep>, AppError> {
        let mut tx = pool.begin().await?;
        let row = if force {
            sqlx::query_as::<_, DiagnosticStep>(
                "DELETE FROM diagnostic_steps WHERE id = $1 RETURNING *",
            )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        } else {
            sqlx::query_as::<_, DiagnosticStep>(
                "UPDATE diagnostic_steps SET is_active = FALSE, updated_at = NOW()
                 WHERE id = $1 RETURNING *",
            )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        };
        let Some(row) = row else {
            return Ok(None);
        };
        if renumber {
            sqlx::query(
                "UPDATE diagnostic_steps d SET step_number = r.rn, updated_at = NOW()
                 FROM (SELECT id, ROW_NUMBER() OVER (ORDER BY step_number, id) AS rn
                         FROM diagnostic_steps
                        WHERE problem_id = $1 AND is_active) r
                 WHERE d.id = r.id AND d.step_number <> r.rn",
            )
            .bind(row.problem_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        let action = if force { "delete" } else { "archive" };
        change_log::record(pool, "step", id, action, change_log::snapshot(&row), None).await?;
        Ok(Some(row))
    }

    /// Rewrite `step_number` to match the id array order. Every id must be an
    /// active step of the given problem; the transaction rolls back otherwise.
    pub async fn reorder(
        pool: &PgPool,
        problem_id: i64,
        step_ids: &[i64],
    ) -> Result<Vec<DiagnosticStep>, AppError> {
        if step_ids.is_empty() {
            return Err(AppError::Validation("Step id array must not be empty".into()));
        }
        let mut tx = pool.begin().await?;
        let mut out = Vec::with_capacity(step_ids.len());
        for (i, id) in step_ids.iter().enumerate() {
            let row = sqlx::query_as::<_, DiagnosticStep>(
                "UPDATE diagnostic_steps SET step_number = $1, updated_at = NOW()
                 WHERE id = $2 AND problem_id = $3 RETURNING *",
            )
            .bind((i + 1) as i32)
            .bind(id)
            .bind(problem_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Step {id} not found for problem {problem_id}"))
            })?;
            out.push(row);
        }
        tx.commit().await?;
        Ok(out)
    }

    pub async fn bulk_update(
        pool: &PgPool,
        updates: &[BulkUpdate<UpdateStep>],
    ) -> Result<Vec<DiagnosticStep>, AppError> {
        if updates.is_empty() {
            return Err(AppError::Validation("Update array must not be empty".into()));
        }
        if updates.len() > BULK_LIMIT {
            return Err(AppError::Validation(format!(
                "Bulk update limited to {BULK_LIMIT} items"
            )));
        }
        for item in updates {
            validate_step_update(&item.data)?;
        }
        let mut tx = pool.begin().await?;
        let mut out = Vec::with_capacity(updates.len());
        for item in updates {
            let mut u = UpdateBuf::new();
            u.set_opt_text("title", &item.data.title);
            u.set_opt_text("description", &item.data.description);
            u.set_opt_text("instruction", &item.data.instruction);
            u.set_opt_int("estimated_time", item.data.estimated_time.map(i64::from));
            if u.is_empty() {
                return Err(AppError::Validation(format!(
                    "Update for step {} has no fields",
                    item.id
                )));
            }
            let q = u.finish("diagnostic_steps", item.id);
            let row = q
                .query_as::<DiagnosticStep>()
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Step {} not found", item.id)))?;
            out.push(row);
        }
        tx.commit().await?;
        Ok(out)
    }

    /// List helper used by handlers filtering on a problem.
    pub fn problem_filter(problem_id: i64) -> (&'static str, SqlParam) {
        ("problem_id", SqlParam::Int(problem_id))
    }
}
