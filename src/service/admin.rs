//! Operational endpoints backing: cleanup, seed, test fixtures, db-info.

use crate::error::AppError;
use crate::migration::TABLES_CHILD_FIRST;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::BTreeMap;

/// Tables surfaced in db-info row counts.
const CATALOG_TABLES: &[&str] = &[
    "devices",
    "problems",
    "diagnostic_steps",
    "diagnostic_sessions",
    "tv_interfaces",
    "tv_interface_marks",
];

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyInfo {
    pub table_name: String,
    pub column_name: String,
    pub foreign_table_name: String,
    pub foreign_column_name: String,
    pub constraint_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbInfo {
    pub tables: Vec<String>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
    pub row_counts: BTreeMap<String, i64>,
    pub is_empty: bool,
}

#[derive(Debug, Serialize)]
pub struct CleanupSummary {
    pub truncated_tables: usize,
}

#[derive(Debug, Serialize)]
pub struct SeedSummary {
    pub skipped: bool,
    pub devices: u32,
    pub problems: u32,
    pub steps: u32,
}

#[derive(Debug, Serialize)]
pub struct TestDataSummary {
    pub devices: u32,
    pub problems: u32,
    pub steps: u32,
    pub sessions: u32,
}

pub struct AdminService;

impl AdminService {
    /// Empty every catalog table and restart identities. One TRUNCATE
    /// statement keeps the operation atomic and FK-safe.
    pub async fn cleanup(pool: &PgPool) -> Result<CleanupSummary, AppError> {
        let sql = format!(
            "TRUNCATE TABLE {} RESTART IDENTITY CASCADE",
            TABLES_CHILD_FIRST.join(", ")
        );
        sqlx::query(&sql).execute(pool).await?;
        tracing::info!(tables = TABLES_CHILD_FIRST.len(), "catalog truncated");
        Ok(CleanupSummary {
            truncated_tables: TABLES_CHILD_FIRST.len(),
        })
    }

    /// Insert the built-in catalog. Skips when active devices already exist,
    /// so repeated seeding is harmless.
    pub async fn seed(pool: &PgPool) -> Result<SeedSummary, AppError> {
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM devices WHERE is_active")
            .fetch_one(pool)
            .await?;
        if existing > 0 {
            return Ok(SeedSummary {
                skipped: true,
                devices: 0,
                problems: 0,
                steps: 0,
            });
        }

        let devices: &[(&str, &str, &str)] = &[
            ("Openbox", "Openbox", "Стандартная приставка"),
            ("Openbox GOLD", "Openbox", "Премиум приставка"),
            ("HDBox", "HDBox", "HD приставка"),
            ("Uclan", "Uclan", "Современная приставка"),
        ];
        // (device index, title, category, icon, priority, steps)
        let problems: &[(usize, &str, &str, &str, i32, &[&str])] = &[
            (
                0,
                "Нет сигнала",
                "critical",
                "Monitor",
                5,
                &[
                    "Проверьте соединения кабелей",
                    "Проверьте питание приставки",
                    "Перезагрузите приставку",
                ],
            ),
            (
                0,
                "Нет звука",
                "moderate",
                "VolumeX",
                4,
                &["Проверьте уровень громкости", "Проверьте аудиокабель"],
            ),
            (
                2,
                "Пульт не работает",
                "moderate",
                "Radio",
                3,
                &["Замените батарейки", "Проверьте ИК-датчик"],
            ),
        ];

        let mut tx = pool.begin().await?;
        let mut device_ids = Vec::with_capacity(devices.len());
        for (i, (name, brand, description)) in devices.iter().enumerate() {
            let id: i64 = sqlx::query_scalar(
                "INSERT INTO devices (name, brand, description, order_index, status)
                 VALUES ($1, $2, $3, $4, 'active') RETURNING id",
            )
            .bind(name)
            .bind(brand)
            .bind(description)
            .bind((i + 1) as i32)
            .fetch_one(&mut *tx)
            .await?;
            device_ids.push(id);
        }

        let mut step_count = 0u32;
        for (device_idx, title, category, icon, priority, steps) in problems {
            let problem_id: i64 = sqlx::query_scalar(
                "INSERT INTO problems (device_id, title, category, icon, priority, status)
                 VALUES ($1, $2, $3, $4, $5, 'published') RETURNING id",
            )
            .bind(device_ids[*device_idx])
            .bind(title)
            .bind(category)
            .bind(icon)
            .bind(priority)
            .fetch_one(&mut *tx)
            .await?;
            for (n, step_title) in steps.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO diagnostic_steps (problem_id, device_id, step_number, title)
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(problem_id)
                .bind(device_ids[*device_idx])
                .bind((n + 1) as i32)
                .bind(step_title)
                .execute(&mut *tx)
                .await?;
                step_count += 1;
            }
        }
        tx.commit().await?;

        Ok(SeedSummary {
            skipped: false,
            devices: devices.len() as u32,
            problems: problems.len() as u32,
            steps: step_count,
        })
    }

    /// Deterministic fixture set for integration testing: one device, one
    /// problem, two steps, three sessions with fixed keys.
    pub async fn populate_test_data(pool: &PgPool) -> Result<TestDataSummary, AppError> {
        let mut tx = pool.begin().await?;
        let device_id: i64 = sqlx::query_scalar(
            "INSERT INTO devices (name, brand, description, status)
             VALUES ('Test Device', 'TestBrand', 'Fixture device', 'active') RETURNING id",
        )
        .fetch_one(&mut *tx)
        .await?;

        let problem_id: i64 = sqlx::query_scalar(
            "INSERT INTO problems (device_id, title, category, priority, status)
             VALUES ($1, 'Test Problem', 'other', 1, 'published') RETURNING id",
        )
        .bind(device_id)
        .fetch_one(&mut *tx)
        .await?;

        for (n, title) in ["Test step one", "Test step two"].iter().enumerate() {
            sqlx::query(
                "INSERT INTO diagnostic_steps (problem_id, device_id, step_number, title)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(problem_id)
            .bind(device_id)
            .bind((n + 1) as i32)
            .bind(title)
            .execute(&mut *tx)
            .await?;
        }

        for n in 1..=3i32 {
            sqlx::query(
                "INSERT INTO diagnostic_sessions
                     (device_id, problem_id, session_key, total_steps, completed_steps,
                      success, duration, end_time, user_agent)
                 VALUES ($1, $2, $3, 2, $4, $5, $6, NOW(), 'fixture')",
            )
            .bind(device_id)
            .bind(problem_id)
            .bind(format!("test-session-{n}"))
            .bind(if n == 3 { 1 } else { 2 })
            .bind(n != 3)
            .bind(60 * n)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(TestDataSummary {
            devices: 1,
            problems: 1,
            steps: 2,
            sessions: 3,
        })
    }

    pub async fn db_info(pool: &PgPool) -> Result<DbInfo, AppError> {
        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT table_name FROM information_schema.tables
             WHERE table_schema = 'public' AND table_type = 'BASE TABLE'
             ORDER BY table_name",
        )
        .fetch_all(pool)
        .await?;

        let foreign_keys = sqlx::query_as::<_, ForeignKeyInfo>(
            "SELECT tc.table_name,
                    kcu.column_name,
                    ccu.table_name AS foreign_table_name,
                    ccu.column_name AS foreign_column_name,
                    tc.constraint_name
             FROM information_schema.table_constraints AS tc
             JOIN information_schema.key_column_usage AS kcu
               ON tc.constraint_name = kcu.constraint_name
              AND tc.table_schema = kcu.table_schema
             JOIN information_schema.constraint_column_usage AS ccu
               ON ccu.constraint_name = tc.constraint_name
              AND ccu.table_schema = tc.table_schema
             WHERE tc.constraint_type = 'FOREIGN KEY'
             ORDER BY tc.table_name, kcu.column_name",
        )
        .fetch_all(pool)
        .await?;

        let mut row_counts = BTreeMap::new();
        for table in CATALOG_TABLES {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(pool)
                .await?;
            row_counts.insert(table.to_string(), count);
        }
        let is_empty = row_counts.values().all(|&c| c == 0);

        Ok(DbInfo {
            tables,
            foreign_keys,
            row_counts,
            is_empty,
        })
    }
}
