//! Append-only Postgres sink for derived records.
//!
//! One insert method per table kind. Batches for different tables are
//! independent: a failure in one never rolls back another that already
//! committed, and nothing here retries. Empty batches are skipped so a
//! run without inputs fabricates no rows.

use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::debug;

use crate::{
    config::DatabaseConfig,
    error::{PipelineError, Result},
    model::{
        ForecastEntry, HistoricalPoint, HourlyTrend, TomorrowEntry, TunnelRecord, WeatherSummary,
    },
    region::{Region, Table},
};

/// Persistence gateway, scoped to one pipeline run's lifetime.
#[derive(Debug, Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    /// Create every per-region table if missing. Idempotent; safe to run
    /// before every deployment.
    pub async fn ensure_schema(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for region in Region::all() {
            for ddl in schema_statements(*region) {
                sqlx::query(&ddl).execute(&mut *tx).await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn insert_weather_summary(
        &self,
        region: Region,
        row: &WeatherSummary,
    ) -> Result<()> {
        let table = region.table_name(Table::WeatherSummaries);
        let sql = format!(
            "INSERT INTO {table} \
             (date, location, avg_temp, avg_feels_like, total_rainfall, peak_rainfall_time, \
              suggestion, weather_alert, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        );

        sqlx::query(&sql)
            .bind(row.date)
            .bind(&row.location)
            .bind(row.avg_temp)
            .bind(row.avg_feels_like)
            .bind(row.total_rainfall)
            .bind(row.peak_rainfall_time)
            .bind(&row.suggestion)
            .bind(&row.weather_alert)
            .bind(row.created_at)
            .execute(&self.pool)
            .await
            .map_err(|source| PipelineError::Persist { table: table.clone(), source })?;

        debug!(table, "inserted weather summary");
        Ok(())
    }

    pub async fn insert_today_trends(&self, region: Region, rows: &[HourlyTrend]) -> Result<()> {
        let table = region.table_name(Table::TodayTrends);

        if rows.is_empty() {
            debug!(table, "empty batch, nothing to insert");
            return Ok(());
        }

        let sql = format!(
            "INSERT INTO {table} \
             (time, temperature, feels_like, humidity, rainfall, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|source| PipelineError::Persist { table: table.clone(), source })?;

        for row in rows {
            sqlx::query(&sql)
                .bind(row.time)
                .bind(row.temperature)
                .bind(row.feels_like)
                .bind(row.humidity)
                .bind(row.rainfall)
                .bind(row.created_at)
                .execute(&mut *tx)
                .await
                .map_err(|source| PipelineError::Persist { table: table.clone(), source })?;
        }

        tx.commit()
            .await
            .map_err(|source| PipelineError::Persist { table: table.clone(), source })?;

        debug!(table, rows = rows.len(), "inserted batch");
        Ok(())
    }

    pub async fn insert_forecast_entries(
        &self,
        region: Region,
        rows: &[ForecastEntry],
    ) -> Result<()> {
        let table = region.table_name(Table::ForecastEntries);

        if rows.is_empty() {
            debug!(table, "empty batch, nothing to insert");
            return Ok(());
        }

        let sql = format!(
            "INSERT INTO {table} \
             (date, time, temperature, feels_like, precipitation, humidity, wind_speed, \
              total_rainfall, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|source| PipelineError::Persist { table: table.clone(), source })?;

        for row in rows {
            sqlx::query(&sql)
                .bind(row.date)
                .bind(row.time)
                .bind(row.temperature)
                .bind(row.feels_like)
                .bind(row.precipitation)
                .bind(row.humidity)
                .bind(row.wind_speed)
                .bind(row.total_rainfall)
                .bind(row.created_at)
                .execute(&mut *tx)
                .await
                .map_err(|source| PipelineError::Persist { table: table.clone(), source })?;
        }

        tx.commit()
            .await
            .map_err(|source| PipelineError::Persist { table: table.clone(), source })?;

        debug!(table, rows = rows.len(), "inserted batch");
        Ok(())
    }

    pub async fn insert_tomorrow_entries(
        &self,
        region: Region,
        rows: &[TomorrowEntry],
    ) -> Result<()> {
        let table = region.table_name(Table::TomorrowEntries);

        if rows.is_empty() {
            debug!(table, "empty batch, nothing to insert");
            return Ok(());
        }

        let sql = format!(
            "INSERT INTO {table} \
             (time, temperature, feels_like, precipitation, humidity, wind_speed, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|source| PipelineError::Persist { table: table.clone(), source })?;

        for row in rows {
            sqlx::query(&sql)
                .bind(row.time)
                .bind(row.temperature)
                .bind(row.feels_like)
                .bind(row.precipitation)
                .bind(row.humidity)
                .bind(row.wind_speed)
                .bind(row.created_at)
                .execute(&mut *tx)
                .await
                .map_err(|source| PipelineError::Persist { table: table.clone(), source })?;
        }

        tx.commit()
            .await
            .map_err(|source| PipelineError::Persist { table: table.clone(), source })?;

        debug!(table, rows = rows.len(), "inserted batch");
        Ok(())
    }

    pub async fn insert_tunnel_records(&self, region: Region, rows: &[TunnelRecord]) -> Result<()> {
        let table = region.table_name(Table::TunnelRecords);

        if rows.is_empty() {
            debug!(table, "empty batch, nothing to insert");
            return Ok(());
        }

        let sql = format!(
            "INSERT INTO {table} \
             (location_name, year, latitude, longitude, precipitation_description, \
              precipitation_intensity, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|source| PipelineError::Persist { table: table.clone(), source })?;

        for row in rows {
            sqlx::query(&sql)
                .bind(&row.location_name)
                .bind(row.year)
                .bind(row.latitude)
                .bind(row.longitude)
                .bind(row.precipitation_description.label())
                .bind(row.precipitation_intensity)
                .bind(row.created_at)
                .execute(&mut *tx)
                .await
                .map_err(|source| PipelineError::Persist { table: table.clone(), source })?;
        }

        tx.commit()
            .await
            .map_err(|source| PipelineError::Persist { table: table.clone(), source })?;

        debug!(table, rows = rows.len(), "inserted batch");
        Ok(())
    }

    pub async fn insert_historical_points(
        &self,
        region: Region,
        rows: &[HistoricalPoint],
    ) -> Result<()> {
        let table = region.table_name(Table::PrecipitationTrends);

        if rows.is_empty() {
            debug!(table, "empty batch, nothing to insert");
            return Ok(());
        }

        let sql = format!(
            "INSERT INTO {table} (date, precipitation, type, created_at) \
             VALUES ($1, $2, $3, $4)"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|source| PipelineError::Persist { table: table.clone(), source })?;

        for row in rows {
            sqlx::query(&sql)
                .bind(row.date)
                .bind(row.precipitation)
                .bind(row.kind)
                .bind(row.created_at)
                .execute(&mut *tx)
                .await
                .map_err(|source| PipelineError::Persist { table: table.clone(), source })?;
        }

        tx.commit()
            .await
            .map_err(|source| PipelineError::Persist { table: table.clone(), source })?;

        debug!(table, rows = rows.len(), "inserted batch");
        Ok(())
    }
}

/// DDL for one region's six tables.
fn schema_statements(region: Region) -> Vec<String> {
    vec![
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                date DATE NOT NULL,
                location TEXT NOT NULL,
                avg_temp DOUBLE PRECISION NOT NULL,
                avg_feels_like DOUBLE PRECISION NOT NULL,
                total_rainfall DOUBLE PRECISION NOT NULL,
                peak_rainfall_time TIMESTAMP NOT NULL,
                suggestion TEXT NOT NULL,
                weather_alert TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )",
            region.table_name(Table::WeatherSummaries)
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                time TIMESTAMP NOT NULL,
                temperature DOUBLE PRECISION NOT NULL,
                feels_like DOUBLE PRECISION NOT NULL,
                humidity INTEGER NOT NULL,
                rainfall DOUBLE PRECISION NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )",
            region.table_name(Table::TodayTrends)
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                date DATE NOT NULL,
                time TIMESTAMPTZ NOT NULL,
                temperature DOUBLE PRECISION NOT NULL,
                feels_like DOUBLE PRECISION NOT NULL,
                precipitation DOUBLE PRECISION NOT NULL,
                humidity INTEGER NOT NULL,
                wind_speed DOUBLE PRECISION NOT NULL,
                total_rainfall DOUBLE PRECISION NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )",
            region.table_name(Table::ForecastEntries)
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                time TIMESTAMP NOT NULL,
                temperature DOUBLE PRECISION NOT NULL,
                feels_like DOUBLE PRECISION NOT NULL,
                precipitation DOUBLE PRECISION NOT NULL,
                humidity INTEGER NOT NULL,
                wind_speed DOUBLE PRECISION NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )",
            region.table_name(Table::TomorrowEntries)
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                location_name TEXT NOT NULL,
                year INTEGER,
                latitude DOUBLE PRECISION NOT NULL,
                longitude DOUBLE PRECISION NOT NULL,
                precipitation_description TEXT NOT NULL,
                precipitation_intensity DOUBLE PRECISION NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )",
            region.table_name(Table::TunnelRecords)
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                date DATE NOT NULL,
                precipitation DOUBLE PRECISION NOT NULL,
                type TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )",
            region.table_name(Table::PrecipitationTrends)
        ),
    ]
}
