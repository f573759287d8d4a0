use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Executor, PgPool, Row};

use super::contract::ContractReadiness;
use super::MigrationError;
use crate::database::PgStore;

/// One reversible schema step
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub name: &'static str,
    pub up: &'static str,
    pub down: &'static str,
    /// Applying requires a completed backfill
    pub requires_backfill: bool,
}

/// Every migration, in application order
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "20250929_111647_baseline",
        up: include_str!("../../migrations/20250929_111647_baseline.up.sql"),
        down: include_str!("../../migrations/20250929_111647_baseline.down.sql"),
        requires_backfill: false,
    },
    Migration {
        name: "20260212_025043_expand_tenancy",
        up: include_str!("../../migrations/20260212_025043_expand_tenancy.up.sql"),
        down: include_str!("../../migrations/20260212_025043_expand_tenancy.down.sql"),
        requires_backfill: false,
    },
    Migration {
        name: "20260301_000000_contract_tenancy",
        up: include_str!("../../migrations/20260301_000000_contract_tenancy.up.sql"),
        down: include_str!("../../migrations/20260301_000000_contract_tenancy.down.sql"),
        requires_backfill: true,
    },
];

#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    pub name: &'static str,
    pub applied_at: Option<DateTime<Utc>>,
}

/// Applies [`MIGRATIONS`] against Postgres, tracking them in `schema_migrations`
pub struct Migrator {
    pool: PgPool,
}

impl Migrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_table(&self) -> Result<(), MigrationError> {
        self.pool
            .execute(
                "CREATE TABLE IF NOT EXISTS \"schema_migrations\" (\
                 \"name\" text PRIMARY KEY, \
                 \"applied_at\" timestamptz NOT NULL DEFAULT now())",
            )
            .await?;
        Ok(())
    }

    pub async fn status(&self) -> Result<Vec<MigrationStatus>, MigrationError> {
        self.ensure_table().await?;
        let rows = sqlx::query("SELECT \"name\", \"applied_at\" FROM \"schema_migrations\"")
            .fetch_all(&self.pool)
            .await?;

        let mut applied = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get("name")?;
            let applied_at: DateTime<Utc> = row.try_get("applied_at")?;
            applied.push((name, applied_at));
        }

        Ok(MIGRATIONS
            .iter()
            .map(|m| MigrationStatus {
                name: m.name,
                applied_at: applied.iter().find(|(name, _)| name == m.name).map(|(_, at)| *at),
            })
            .collect())
    }

    /// Apply pending migrations up to and including `target` (all when `None`)
    pub async fn up(&self, target: Option<&str>) -> Result<Vec<&'static str>, MigrationError> {
        if let Some(target) = target {
            if !MIGRATIONS.iter().any(|m| m.name == target) {
                return Err(MigrationError::UnknownMigration(target.to_string()));
            }
        }

        let status = self.status().await?;
        let mut applied = Vec::new();

        for (migration, state) in MIGRATIONS.iter().zip(&status) {
            if state.applied_at.is_none() {
                if migration.requires_backfill {
                    let readiness = ContractReadiness::check(&PgStore::new(self.pool.clone())).await?;
                    if !readiness.is_ready() {
                        tracing::warn!("Refusing {}: {}", migration.name, readiness);
                        return Err(MigrationError::ContractPrecondition(readiness));
                    }
                }
                self.apply(migration).await?;
                applied.push(migration.name);
            }
            if Some(migration.name) == target {
                break;
            }
        }
        Ok(applied)
    }

    /// Revert the most recently applied migration
    pub async fn down(&self) -> Result<Option<&'static str>, MigrationError> {
        let status = self.status().await?;
        let Some(latest) = status.iter().rev().find(|s| s.applied_at.is_some()) else {
            return Ok(None);
        };
        let Some(migration) = MIGRATIONS.iter().find(|m| m.name == latest.name) else {
            return Err(MigrationError::UnknownMigration(latest.name.to_string()));
        };

        let mut tx = self.pool.begin().await?;
        (&mut *tx).execute(migration.down).await?;
        sqlx::query("DELETE FROM \"schema_migrations\" WHERE \"name\" = $1")
            .bind(migration.name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!("Reverted migration {}", migration.name);
        Ok(Some(migration.name))
    }

    async fn apply(&self, migration: &Migration) -> Result<(), MigrationError> {
        let started = std::time::Instant::now();
        let mut tx = self.pool.begin().await?;
        (&mut *tx).execute(migration.up).await?;
        sqlx::query("INSERT INTO \"schema_migrations\" (\"name\") VALUES ($1)")
            .bind(migration.name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!("Applied migration {} in {:?}", migration.name, started.elapsed());
        Ok(())
    }
}
