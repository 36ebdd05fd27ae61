//! Database schema management for `cr310-datalogger`.
//!
//! Ensures the readings table, its uniqueness constraint and indexes exist
//! before serving requests. Applied once on startup (EMBP: single gateway call).

use sqlx::PgPool;

use crate::error::StoreError;

/// Table holding canonical readings.
pub const READINGS_TABLE: &str = "cr310_readings";

// ---

/// Create or update the database schema (idempotent).
///
/// The `(equipo, reading_timestamp)` unique constraint is the authoritative
/// duplicate guard; `PgReadingStore::insert` relies on it for `ON CONFLICT`.
/// Safe to call on every startup; no-op if objects already exist.
pub async fn create_schema(pool: &PgPool) -> Result<(), StoreError> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cr310_readings (
            id                  UUID             PRIMARY KEY,
            equipo              TEXT             NOT NULL,
            so2_ppb             DOUBLE PRECISION NOT NULL,
            h2s_ppb             DOUBLE PRECISION NOT NULL,
            reaction_temp       DOUBLE PRECISION NOT NULL,
            izs_temp            DOUBLE PRECISION NOT NULL,
            pmt_temp            DOUBLE PRECISION NOT NULL,
            sample_flow         DOUBLE PRECISION NOT NULL,
            pressure            DOUBLE PRECISION NOT NULL,
            uv_lamp_intensity   DOUBLE PRECISION NOT NULL,
            box_temp            DOUBLE PRECISION NOT NULL,
            hvps_v              DOUBLE PRECISION NOT NULL,
            conv_temp           DOUBLE PRECISION NOT NULL,
            ozone_flow          DOUBLE PRECISION NOT NULL,
            reading_timestamp   TEXT COLLATE "C" NOT NULL,
            reading_time        TIMESTAMP        NOT NULL,
            created_at          TIMESTAMPTZ      NOT NULL,
            source              TEXT             NOT NULL,
            CONSTRAINT uq_cr310_readings_equipo_timestamp
                UNIQUE (equipo, reading_timestamp)
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Range filters and the default ordering both scan by timestamp
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_cr310_readings_timestamp
            ON cr310_readings (reading_timestamp DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
