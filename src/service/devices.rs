//! Device CRUD against PostgreSQL.

use crate::error::AppError;
use crate::models::device::{CreateDevice, Device, DeviceStats, UpdateDevice};
use crate::models::{BulkUpdate, DeleteCheck};
use crate::service::change_log;
use crate::service::{validate_device_create, validate_device_update, validate_search_term};
use crate::sql::{count_list, select_list, ListOptions, ListSpec, UpdateBuf};
use sqlx::PgPool;

const LIST: ListSpec = ListSpec {
    table: "devices",
    searchable: &["name", "brand", "model"],
    sortable: &["name", "brand", "order_index", "status", "created_at", "updated_at"],
    default_sort: "order_index",
};

const BULK_LIMIT: usize = 100;

pub struct DeviceService;

impl DeviceService {
    pub async fn list(pool: &PgPool, opts: &ListOptions) -> Result<(Vec<Device>, u64), AppError> {
        let q = select_list(&LIST, opts);
        tracing::debug!(sql = %q.sql, "query");
        let rows = q.query_as::<Device>().fetch_all(pool).await?;
        let total = count_list(&LIST, opts).query_scalar_i64().fetch_one(pool).await?;
        Ok((rows, total as u64))
    }

    pub async fn get(pool: &PgPool, id: i64) -> Result<Option<Device>, AppError> {
        let row = sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    /// Uniqueness of the active name is enforced by the partial unique index;
    /// a violation surfaces as `AppError::Duplicate` via error translation.
    pub async fn create(pool: &PgPool, p: &CreateDevice) -> Result<Device, AppError> {
        validate_device_create(p)?;
        let row = sqlx::query_as::<_, Device>(
            "INSERT INTO devices (name, brand, model, description, image_url, order_index, status)
             VALUES ($1, $2, $3, $4, $5,
                     COALESCE($6, (SELECT COALESCE(MAX(order_index), 0) + 1 FROM devices)),
                     COALESCE($7, 'active'))
             RETURNING *",
        )
        .bind(p.name.trim())
        .bind(&p.brand)
        .bind(&p.model)
        .bind(&p.description)
        .bind(&p.image_url)
        .bind(p.order_index)
        .bind(&p.status)
        .fetch_one(pool)
        .await?;
        change_log::record(pool, "device", row.id, "create", None, change_log::snapshot(&row)).await?;
        Ok(row)
    }

    pub async fn update(pool: &PgPool, id: i64, p: &UpdateDevice) -> Result<Option<Device>, AppError> {
        validate_device_update(p)?;
        let Some(old) = Self::get(pool, id).await? else {
            return Ok(None);
        };
        let mut u = UpdateBuf::new();
        u.set_opt_text("name", &p.name);
        u.set_opt_text("brand", &p.brand);
        u.set_opt_text("model", &p.model);
        u.set_opt_text("description", &p.description);
        u.set_opt_text("image_url", &p.image_url);
        u.set_opt_int("order_index", p.order_index.map(i64::from));
        u.set_opt_text("status", &p.status);
        if u.is_empty() {
            return Err(AppError::Validation("No fields to update".into()));
        }
        let q = u.finish("devices", id);
        let row = q.query_as::<Device>().fetch_optional(pool).await?;
        if let Some(row) = &row {
            change_log::record(
                pool,
                "device",
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
        let dependents: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM problems WHERE device_id = $1 AND is_active")
                .bind(id)
                .fetch_one(pool)
                .await?;
        if dependents > 0 {
            return Ok(DeleteCheck::blocked(
                format!("Device has {dependents} active problems"),
                "Archive or delete its problems first, or pass force=true",
            ));
        }
        Ok(DeleteCheck::allowed())
    }

    pub async fn soft_delete(pool: &PgPool, id: i64) -> Result<Option<Device>, AppError> {
        let row = sqlx::query_as::<_, Device>(
            "UPDATE devices SET is_active = FALSE, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        if let Some(row) = &row {
            change_log::record(pool, "device", id, "archive", change_log::snapshot(row), None).await?;
        }
        Ok(row)
    }

    pub async fn hard_delete(pool: &PgPool, id: i64) -> Result<Option<Device>, AppError> {
        let row = sqlx::query_as::<_, Device>("DELETE FROM devices WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        if let Some(row) = &row {
            change_log::record(pool, "device", id, "delete", change_log::snapshot(row), None).await?;
        }
        Ok(row)
    }

    /// Reactivate an archived device. None when missing or already active.
    pub async fn restore(pool: &PgPool, id: i64) -> Result<Option<Device>, AppError> {
        let row = sqlx::query_as::<_, Device>(
            "UPDATE devices SET is_active = TRUE, updated_at = NOW()
             WHERE id = $1 AND NOT is_active RETURNING *",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        if let Some(row) = &row {
            change_log::record(pool, "device", id, "restore", None, change_log::snapshot(row)).await?;
        }
        Ok(row)
    }

    pub async fn search(
        pool: &PgPool,
        term: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Device>, AppError> {
        validate_search_term(term)?;
        let opts = ListOptions {
            search: Some(term.trim().to_string()),
            is_active: Some(true),
            limit,
            offset,
            ..Default::default()
        };
        let rows = select_list(&LIST, &opts).query_as::<Device>().fetch_all(pool).await?;
        Ok(rows)
    }

    /// Active devices ranked by diagnostic session volume.
    pub async fn popular(pool: &PgPool, limit: u32) -> Result<Vec<Device>, AppError> {
        let rows = sqlx::query_as::<_, Device>(
            "SELECT d.* FROM devices d
             LEFT JOIN diagnostic_sessions s ON s.device_id = d.id
             WHERE d.is_active
             GROUP BY d.id
             ORDER BY COUNT(s.id) DESC, d.order_index ASC
             LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn stats(pool: &PgPool) -> Result<DeviceStats, AppError> {
        let stats = sqlx::query_as::<_, DeviceStats>(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE is_active) AS active,
                    COUNT(*) FILTER (WHERE NOT is_active) AS archived,
                    (SELECT COUNT(DISTINCT device_id) FROM problems WHERE is_active) AS with_problems
             FROM devices",
        )
        .fetch_one(pool)
        .await?;
        Ok(stats)
    }

    /// Rewrite `order_index` to match the array order. All referenced
    /// devices must exist; the transaction rolls back otherwise.
    pub async fn reorder(pool: &PgPool, ids: &[i64]) -> Result<Vec<Device>, AppError> {
        if ids.is_empty() {
            return Err(AppError::Validation("Device id array must not be empty".into()));
        }
        let mut tx = pool.begin().await?;
        let mut out = Vec::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            let row = sqlx::query_as::<_, Device>(
                "UPDATE devices SET order_index = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
            )
            .bind((i + 1) as i32)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Device {id} not found")))?;
            out.push(row);
        }
        tx.commit().await?;
        Ok(out)
    }

    pub async fn bulk_update(
        pool: &PgPool,
        updates: &[BulkUpdate<UpdateDevice>],
    ) -> Result<Vec<Device>, AppError> {
        if updates.is_empty() {
            return Err(AppError::Validation("Update array must not be empty".into()));
        }
        if updates.len() > BULK_LIMIT {
            return Err(AppError::Validation(format!(
                "Bulk update limited to {BULK_LIMIT} items"
            )));
        }
        for item in updates {
            validate_device_update(&item.data)?;
        }
        let mut tx = pool.begin().await?;
        let mut out = Vec::with_capacity(updates.len());
        for item in updates {
            let mut u = UpdateBuf::new();
            u.set_opt_text("name", &item.data.name);
            u.set_opt_text("brand", &item.data.brand);
            u.set_opt_text("model", &item.data.model);
            u.set_opt_text("description", &item.data.description);
            u.set_opt_text("image_url", &item.data.image_url);
            u.set_opt_int("order_index", item.data.order_index.map(i64::from));
            u.set_opt_text("status", &item.data.status);
            if u.is_empty() {
                return Err(AppError::Validation(format!(
                    "Update for device {} has no fields",
                    item.id
                )));
            }
            let q = u.finish("devices", item.id);
            let row = q
                .query_as::<Device>()
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Device {} not found", item.id)))?;
            out.push(row);
        }
        tx.commit().await?;
        Ok(out)
    }

    /// All active devices, unpaginated, for the export endpoint.
    pub async fn export(pool: &PgPool) -> Result<Vec<Device>, AppError> {
        let rows = sqlx::query_as::<_, Device>(
            "SELECT * FROM devices WHERE is_active ORDER BY order_index ASC, id ASC",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}
