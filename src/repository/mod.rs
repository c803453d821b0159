//! Subscription persistence
//!
//! Defines the repository contract consumed by the service layer and the
//! Postgres implementation behind it. Driver errors are classified exactly
//! once here: constraint violations fold into `InvalidData`, timeouts and
//! cancellations into `Database`, and anything else into the calling
//! operation's failure variant.

mod record;

pub use record::SubscriptionRecord;

use async_trait::async_trait;
use sqlx::error::ErrorKind;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::{PagingBase, Subscription, SubscriptionFilter};
use crate::error::AppError;

/// Persistence contract for subscriptions
///
/// Kept as a trait so tests can substitute an in-memory double for the
/// real database. All calls are cancellable by dropping the future.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert a new subscription row
    async fn create(&self, sub: &Subscription) -> Result<(), AppError>;
    /// Fetch one subscription by id
    async fn get(&self, id: Uuid) -> Result<Subscription, AppError>;
    /// Fetch a page of subscriptions
    async fn list(&self, paging: &PagingBase) -> Result<Vec<Subscription>, AppError>;
    /// Fetch a filtered page together with the price sum over the whole
    /// filtered set
    async fn sum(&self, filter: &SubscriptionFilter) -> Result<(Vec<Subscription>, i64), AppError>;
    /// Count all subscription rows
    async fn count(&self) -> Result<i64, AppError>;
    /// Replace every column of an existing row
    async fn update(&self, sub: &Subscription) -> Result<(), AppError>;
    /// Delete one subscription by id
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

const SELECT_COLUMNS: &str =
    "SELECT id, service_name, user_id, price, start_date, end_date FROM subscriptions";

/// Postgres-backed repository
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Wrap an already-connected pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded schema migration
    pub async fn migrate(&self) -> Result<(), AppError> {
        info!("running database migrations");

        let migration_sql = include_str!("../../migrations/001_create_subscriptions.sql");

        // Strip comment lines, then execute statement by statement.
        let cleaned: String = migration_sql
            .lines()
            .filter(|line| !line.trim_start().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");

        for statement in cleaned.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::Internal(anyhow::anyhow!("migration failed: {e}")))?;
        }

        info!("database migrations completed");
        Ok(())
    }
}

/// Fold a driver error into the application taxonomy.
///
/// `fallback` is the operation-specific variant used when the driver gives
/// nothing more precise.
fn classify(err: &sqlx::Error, fallback: AppError) -> AppError {
    match err {
        sqlx::Error::RowNotFound => AppError::NotFound,
        sqlx::Error::Database(db) => match db.kind() {
            ErrorKind::UniqueViolation | ErrorKind::ForeignKeyViolation => AppError::InvalidData,
            _ => AppError::Database,
        },
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            AppError::Database
        }
        _ => fallback,
    }
}

/// Append the filter's predicates as a WHERE clause
fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &SubscriptionFilter) {
    let mut prefix = " WHERE ";

    if let Some(user_id) = filter.user_id {
        query.push(prefix).push("user_id = ").push_bind(user_id);
        prefix = " AND ";
    }
    if let Some(name) = &filter.service_name {
        query
            .push(prefix)
            .push("service_name = ")
            .push_bind(name.clone());
        prefix = " AND ";
    }
    if let Some(start) = filter.start_date {
        query
            .push(prefix)
            .push("start_date >= ")
            .push_bind(start.as_date());
        prefix = " AND ";
    }
    if let Some(end) = filter.end_date {
        query
            .push(prefix)
            .push("end_date <= ")
            .push_bind(end.as_date());
    }
}

fn records_to_domain(records: Vec<SubscriptionRecord>) -> Result<Vec<Subscription>, AppError> {
    records
        .into_iter()
        .map(|record| {
            record.into_domain().map_err(|e| {
                error!(error = %e, "stored subscription failed domain validation");
                AppError::Database
            })
        })
        .collect()
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn create(&self, sub: &Subscription) -> Result<(), AppError> {
        let record = SubscriptionRecord::from_domain(sub);

        sqlx::query(
            "INSERT INTO subscriptions (id, service_name, user_id, price, start_date, end_date) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.id)
        .bind(&record.service_name)
        .bind(record.user_id)
        .bind(record.price)
        .bind(record.start_date)
        .bind(record.end_date)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(id = %record.id, error = %e, "subscription insert failed");
            classify(&e, AppError::CreateFailed)
        })?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Subscription, AppError> {
        let record = sqlx::query_as::<_, SubscriptionRecord>(&format!(
            "{SELECT_COLUMNS} WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(id = %id, error = %e, "subscription fetch failed");
            classify(&e, AppError::Database)
        })?
        .ok_or(AppError::NotFound)?;

        record.into_domain().map_err(AppError::from)
    }

    async fn list(&self, paging: &PagingBase) -> Result<Vec<Subscription>, AppError> {
        let records = sqlx::query_as::<_, SubscriptionRecord>(&format!(
            "{SELECT_COLUMNS} LIMIT $1 OFFSET $2"
        ))
        .bind(paging.limit)
        .bind(paging.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(limit = paging.limit, offset = paging.offset, error = %e, "subscription list failed");
            classify(&e, AppError::ListFailed)
        })?;

        records_to_domain(records)
    }

    async fn sum(&self, filter: &SubscriptionFilter) -> Result<(Vec<Subscription>, i64), AppError> {
        let mut sum_query =
            QueryBuilder::<Postgres>::new("SELECT COALESCE(SUM(price), 0) FROM subscriptions");
        push_filters(&mut sum_query, filter);

        let total_sum: i64 = sum_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "subscription sum failed");
                classify(&e, AppError::Database)
            })?;

        let mut rows_query = QueryBuilder::<Postgres>::new(SELECT_COLUMNS);
        push_filters(&mut rows_query, filter);
        rows_query
            .push(" LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let records: Vec<SubscriptionRecord> = rows_query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "subscription rows fetch failed");
                classify(&e, AppError::Database)
            })?;

        Ok((records_to_domain(records)?, total_sum))
    }

    async fn count(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM subscriptions")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "subscription count failed");
                AppError::Database
            })
    }

    async fn update(&self, sub: &Subscription) -> Result<(), AppError> {
        let record = SubscriptionRecord::from_domain(sub);

        sqlx::query(
            "UPDATE subscriptions SET service_name = $2, user_id = $3, price = $4, \
             start_date = $5, end_date = $6 WHERE id = $1",
        )
        .bind(record.id)
        .bind(&record.service_name)
        .bind(record.user_id)
        .bind(record.price)
        .bind(record.start_date)
        .bind(record.end_date)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(id = %record.id, error = %e, "subscription update failed");
            classify(&e, AppError::UpdateFailed)
        })?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(id = %id, error = %e, "subscription delete failed");
                classify(&e, AppError::DeleteFailed)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }
}
