//! TV interface and mark CRUD.

use crate::error::AppError;
use crate::models::tv_interface::{
    CreateMark, CreateTvInterface, TvInterface, TvInterfaceMark, TvInterfaceStats, UpdateMark,
    UpdateTvInterface,
};
use crate::service::change_log;
use crate::service::{
    validate_mark_create, validate_mark_update, validate_tv_interface_create,
    validate_tv_interface_update,
};
use crate::sql::{count_list, select_list, ListOptions, ListSpec, UpdateBuf};
use sqlx::PgPool;

const LIST: ListSpec = ListSpec {
    table: "tv_interfaces",
    searchable: &["name", "description"],
    sortable: &["name", "kind", "created_at", "updated_at"],
    default_sort: "name",
};

pub struct TvInterfaceService;

impl TvInterfaceService {
    pub async fn list(
        pool: &PgPool,
        opts: &ListOptions,
    ) -> Result<(Vec<TvInterface>, u64), AppError> {
        let q = select_list(&LIST, opts);
        tracing::debug!(sql = %q.sql, "query");
        let rows = q.query_as::<TvInterface>().fetch_all(pool).await?;
        let total = count_list(&LIST, opts).query_scalar_i64().fetch_one(pool).await?;
        Ok((rows, total as u64))
    }

    pub async fn get(pool: &PgPool, id: i64) -> Result<Option<TvInterface>, AppError> {
        let row = sqlx::query_as::<_, TvInterface>("SELECT * FROM tv_interfaces WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    pub async fn by_device(pool: &PgPool, device_id: i64) -> Result<Vec<TvInterface>, AppError> {
        let rows = sqlx::query_as::<_, TvInterface>(
            "SELECT * FROM tv_interfaces WHERE device_id = $1 AND is_active ORDER BY name, id",
        )
        .bind(device_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn create(pool: &PgPool, p: &CreateTvInterface) -> Result<TvInterface, AppError> {
        validate_tv_interface_create(p)?;
        let row = sqlx::query_as::<_, TvInterface>(
            "INSERT INTO tv_interfaces (device_id, name, description, kind, screenshot_url)
             VALUES ($1, $2, $3, COALESCE($4, 'custom'), $5)
             RETURNING *",
        )
        .bind(p.device_id)
        .bind(p.name.trim())
        .bind(&p.description)
        .bind(&p.kind)
        .bind(&p.screenshot_url)
        .fetch_one(pool)
        .await?;
        change_log::record(pool, "tv_interface", row.id, "create", None, change_log::snapshot(&row))
            .await?;
        Ok(row)
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        p: &UpdateTvInterface,
    ) -> Result<Option<TvInterface>, AppError> {
        validate_tv_interface_update(p)?;
        let Some(old) = Self::get(pool, id).await? else {
            return Ok(None);
        };
        let mut u = UpdateBuf::new();
        u.set_opt_text("name", &p.name);
        u.set_opt_text("description", &p.description);
        u.set_opt_text("kind", &p.kind);
        u.set_opt_text("screenshot_url", &p.screenshot_url);
        if u.is_empty() {
            return Err(AppError::Validation("No fields to update".into()));
        }
        let q = u.finish("tv_interfaces", id);
        let row = q.query_as::<TvInterface>().fetch_optional(pool).await?;
        if let Some(row) = &row {
            change_log::record(
                pool,
                "tv_interface",
                id,
                "update",
                change_log::snapshot(&old),
                change_log::snapshot(row),
            )
            .await?;
        }
        Ok(row)
    }

    pub async fn soft_delete(pool: &PgPool, id: i64) -> Result<Option<TvInterface>, AppError> {
        let row = sqlx::query_as::<_, TvInterface>(
            "UPDATE tv_interfaces SET is_active = FALSE, updated_at = NOW()
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    pub async fn hard_delete(pool: &PgPool, id: i64) -> Result<Option<TvInterface>, AppError> {
        let row = sqlx::query_as::<_, TvInterface>(
            "DELETE FROM tv_interfaces WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    /// Flip `is_active` without touching anything else.
    pub async fn toggle(pool: &PgPool, id: i64) -> Result<Option<TvInterface>, AppError> {
        let row = sqlx::query_as::<_, TvInterface>(
            "UPDATE tv_interfaces SET is_active = NOT is_active, updated_at = NOW()
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    /// Copy an interface and its marks, optionally onto another device.
    /// The copy's name gets a " (copy)" suffix to clear the unique index.
    pub async fn duplicate(
        pool: &PgPool,
        id: i64,
        device_id: Option<i64>,
    ) -> Result<TvInterface, AppError> {
        let mut tx = pool.begin().await?;
        let copy = sqlx::query_as::<_, TvInterface>(
            "INSERT INTO tv_interfaces (device_id, name, description, kind, screenshot_url)
             SELECT COALESCE($2, device_id), name || ' (copy)', description, kind, screenshot_url
             FROM tv_interfaces WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(device_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("TV interface {id} not found")))?;

        sqlx::query(
            "INSERT INTO tv_interface_marks (tv_interface_id, name, shape, position_x, position_y,
                                             width, height, color, order_index)
             SELECT $2, name, shape, position_x, position_y, width, height, color, order_index
             FROM tv_interface_marks WHERE tv_interface_id = $1 AND is_active
             ORDER BY order_index",
        )
        .bind(id)
        .bind(copy.id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(copy)
    }

    pub async fn stats(pool: &PgPool) -> Result<TvInterfaceStats, AppError> {
        let stats = sqlx::query_as::<_, TvInterfaceStats>(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE is_active) AS active,
                    COUNT(DISTINCT device_id) FILTER (WHERE is_active) AS devices_covered
             FROM tv_interfaces",
        )
        .fetch_one(pool)
        .await?;
        Ok(stats)
    }

    pub async fn list_marks(
        pool: &PgPool,
        tv_interface_id: i64,
    ) -> Result<Vec<TvInterfaceMark>, AppError> {
        let rows = sqlx::query_as::<_, TvInterfaceMark>(
            "SELECT * FROM tv_interface_marks
             WHERE tv_interface_id = $1 AND is_active
             ORDER BY order_index, id",
        )
        .bind(tv_interface_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn create_mark(
        pool: &PgPool,
        tv_interface_id: i64,
        p: &CreateMark,
    ) -> Result<TvInterfaceMark, AppError> {
        validate_mark_create(p)?;
        let row = sqlx::query_as::<_, TvInterfaceMark>(
            "INSERT INTO tv_interface_marks (tv_interface_id, name, shape, position_x, position_y,
                                             width, height, color, order_index)
             VALUES ($1, $2, COALESCE($3, 'rectangle'), COALESCE($4, 0), COALESCE($5, 0),
                     $6, $7, $8,
                     COALESCE($9, (SELECT COALESCE(MAX(order_index), 0) + 1
                                     FROM tv_interface_marks WHERE tv_interface_id = $1)))
             RETURNING *",
        )
        .bind(tv_interface_id)
        .bind(p.name.trim())
        .bind(&p.shape)
        .bind(p.position_x)
        .bind(p.position_y)
        .bind(p.width)
        .bind(p.height)
        .bind(&p.color)
        .bind(p.order_index)
        .fetch_one(pool)
        .await?;
        Ok(row)
    }

    pub async fn update_mark(
        pool: &PgPool,
        id: i64,
        p: &UpdateMark,
    ) -> Result<Option<TvInterfaceMark>, AppError> {
        validate_mark_update(p)?;
        let mut u = UpdateBuf::new();
        u.set_opt_text("name", &p.name);
        u.set_opt_text("shape", &p.shape);
        u.set_opt_int("position_x", p.position_x.map(i64::from));
        u.set_opt_int("position_y", p.position_y.map(i64::from));
        u.set_opt_int("width", p.width.map(i64::from));
        u.set_opt_int("height", p.height.map(i64::from));
        u.set_opt_text("color", &p.color);
        u.set_opt_int("order_index", p.order_index.map(i64::from));
        if u.is_empty() {
            return Err(AppError::Validation("No fields to update".into()));
        }
        let q = u.finish("tv_interface_marks", id);
        let row = q.query_as::<TvInterfaceMark>().fetch_optional(pool).await?;
        Ok(row)
    }

    pub async fn delete_mark(pool: &PgPool, id: i64) -> Result<Option<TvInterfaceMark>, AppError> {
        let row = sqlx::query_as::<_, TvInterfaceMark>(
            "DELETE FROM tv_interface_marks WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    /// Rewrite mark `order_index` to match the id array order.
    pub async fn reorder_marks(
        pool: &PgPool,
        tv_interface_id: i64,
        mark_ids: &[i64],
    ) -> Result<Vec<TvInterfaceMark>, AppError> {
        if mark_ids.is_empty() {
            return Err(AppError::Validation("Mark id array must not be empty".into()));
        }
        let mut tx = pool.begin().await?;
        let mut out = Vec::with_capacity(mark_ids.len());
        for (i, id) in mark_ids.iter().enumerate() {
            let row = sqlx::query_as::<_, TvInterfaceMark>(
                "UPDATE tv_interface_marks SET order_index = $1, updated_at = NOW()
                 WHERE id = $2 AND tv_interface_id = $3 RETURNING *",
            )
            .bind((i + 1) as i32)
            .bind(id)
            .bind(tv_interface_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Mark {id} not found for interface {tv_interface_id}"))
            })?;
            out.push(row);
        }
        tx.commit().await?;
        Ok(out)
    }
}
