use std::time::Duration;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use tracing::{debug, info, warn};

use super::{clamp_pagination, Page, ReadingFilter, ReadingStore};
use crate::error::StoreError;
use crate::models::CanonicalReading;
use crate::schema::{self, READINGS_TABLE};
use crate::Config;

const COLUMNS: &str = "id, equipo, so2_ppb, h2s_ppb, reaction_temp, izs_temp, pmt_temp, \
     sample_flow, pressure, uv_lamp_intensity, box_temp, hvps_v, conv_temp, ozone_flow, \
     reading_timestamp, reading_time, created_at, source";

/// PostgreSQL-backed reading store.
pub struct PgReadingStore {
    pool: PgPool,
}

impl PgReadingStore {
    // ---
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect using the loaded configuration and make sure the schema exists.
    pub async fn connect(cfg: &Config) -> Result<Self, StoreError> {
        // ---
        let timeout = Duration::from_secs(cfg.db_connect_timeout_secs);
        let pool = PgPoolOptions::new()
            .max_connections(cfg.db_pool_max)
            .acquire_timeout(timeout)
            .connect(&cfg.db_url)
            .await?;

        info!("Successfully connected to database");

        schema::create_schema(&pool).await?;
        debug!("Schema ready: {}", READINGS_TABLE);

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Append the WHERE clause for `filter` to `qb`.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ReadingFilter) {
    // ---
    qb.push(" WHERE TRUE");

    if let Some(equipo) = &filter.equipo {
        qb.push(" AND equipo = ").push_bind(equipo.clone());
    }
    if let Some(start) = &filter.start {
        qb.push(" AND reading_timestamp >= ").push_bind(start.clone());
    }
    if let Some(end) = &filter.end {
        qb.push(" AND reading_timestamp <= ").push_bind(end.clone());
    }
}

#[async_trait]
impl ReadingStore for PgReadingStore {
    async fn insert(&self, reading: &CanonicalReading) -> Result<(), StoreError> {
        // ---
        // ON CONFLICT makes check-and-insert one statement; zero rows means the
        // unique constraint already holds this key.
        let result = sqlx::query(
            r#"
            INSERT INTO cr310_readings (
                id, equipo,
                so2_ppb, h2s_ppb, reaction_temp, izs_temp, pmt_temp, sample_flow,
                pressure, uv_lamp_intensity, box_temp, hvps_v, conv_temp, ozone_flow,
                reading_timestamp, reading_time, created_at, source
            ) VALUES (
                $1, $2,
                $3, $4, $5, $6, $7, $8,
                $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18
            )
            ON CONFLICT (equipo, reading_timestamp) DO NOTHING
            "#,
        )
        .bind(reading.id)
        .bind(&reading.equipo)
        .bind(reading.so2_ppb)
        .bind(reading.h2s_ppb)
        .bind(reading.reaction_temp)
        .bind(reading.izs_temp)
        .bind(reading.pmt_temp)
        .bind(reading.sample_flow)
        .bind(reading.pressure)
        .bind(reading.uv_lamp_intensity)
        .bind(reading.box_temp)
        .bind(reading.hvps_v)
        .bind(reading.conv_temp)
        .bind(reading.ozone_flow)
        .bind(&reading.timestamp)
        .bind(reading.timestamp_dt)
        .bind(reading.created_at)
        .bind(&reading.source)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            warn!(
                "Duplicate reading rejected by constraint: {} - {}",
                reading.equipo, reading.timestamp
            );
            return Err(StoreError::DuplicateKey {
                equipo: reading.equipo.clone(),
                timestamp: reading.timestamp.clone(),
            });
        }

        info!("Reading inserted with ID: {}", reading.id);
        Ok(())
    }

    async fn exists(&self, equipo: &str, timestamp: &str) -> Result<bool, StoreError> {
        // ---
        let found: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM cr310_readings \
             WHERE equipo = $1 AND reading_timestamp = $2)",
        )
        .bind(equipo)
        .bind(timestamp)
        .fetch_one(&self.pool)
        .await?;

        Ok(found)
    }

    async fn query(
        &self,
        filter: &ReadingFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Page, StoreError> {
        // ---
        let (limit, offset) = clamp_pagination(limit, offset);

        // Count and page must agree, so both run against one snapshot
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM cr310_readings");
        push_filter(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&mut *tx)
            .await?;

        let mut page_qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM cr310_readings"));
        push_filter(&mut page_qb, filter);
        page_qb
            .push(" ORDER BY reading_timestamp DESC, equipo ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let readings = page_qb
            .build_query_as::<CanonicalReading>()
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Retrieved {} readings (total: {})", readings.len(), total);
        Ok(Page { readings, total })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        // ---
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        // ---
        self.pool.close().await;
        info!("Database connection closed");
    }
}
