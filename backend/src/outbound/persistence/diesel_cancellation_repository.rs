//! PostgreSQL-backed `CancellationRepository`.
//!
//! The unique index on `(user_id, subscription_id)` is the serialisation
//! point for variant assignment: inserts use `ON CONFLICT DO NOTHING` and
//! then read back whichever row won.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{
    CancellationDecision, CancellationRepository, CancellationRepositoryError,
};
use crate::domain::{
    CancellationRecord, CancellationRecordDraft, DownsellVariant, SubscriptionId, UserId,
};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{CancellationDecisionUpdate, CancellationRow, NewCancellationRow};
use super::pool::{DbPool, PoolError};
use super::schema::cancellations;

/// Diesel-backed implementation of the cancellation repository port.
#[derive(Clone)]
pub struct DieselCancellationRepository {
    pool: DbPool,
}

impl DieselCancellationRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> CancellationRepositoryError {
    map_pool_error(error, CancellationRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> CancellationRepositoryError {
    map_diesel_error(
        error,
        CancellationRepositoryError::query,
        CancellationRepositoryError::connection,
    )
}

fn row_to_record(row: CancellationRow) -> Result<CancellationRecord, CancellationRepositoryError> {
    let CancellationRow {
        id,
        user_id,
        subscription_id,
        downsell_variant,
        reason,
        accepted_downsell,
        created_at,
        decided_at,
    } = row;

    let variant = downsell_variant
        .parse::<DownsellVariant>()
        .map_err(|err| CancellationRepositoryError::query(err.to_string()))?;

    Ok(CancellationRecord::from(CancellationRecordDraft {
        id,
        owner: UserId::from_uuid(user_id),
        subscription_id: SubscriptionId::from_uuid(subscription_id),
        variant,
        reason,
        accepted_downsell,
        created_at,
        decided_at,
    }))
}

async fn select_latest(
    conn: &mut AsyncPgConnection,
    owner: &UserId,
    subscription: &SubscriptionId,
) -> Result<Option<CancellationRecord>, CancellationRepositoryError> {
    let row = cancellations::table
        .filter(cancellations::user_id.eq(owner.as_uuid()))
        .filter(cancellations::subscription_id.eq(subscription.as_uuid()))
        .order((cancellations::created_at.desc(), cancellations::id.desc()))
        .select(CancellationRow::as_select())
        .first::<CancellationRow>(conn)
        .await
        .optional()
        .map_err(diesel_error)?;

    row.map(row_to_record).transpose()
}

#[async_trait]
impl CancellationRepository for DieselCancellationRepository {
    async fn latest_for(
        &self,
        owner: &UserId,
        subscription: &SubscriptionId,
    ) -> Result<Option<CancellationRecord>, CancellationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        select_latest(&mut conn, owner, subscription).await
    }

    async fn insert_or_fetch(
        &self,
        record: &CancellationRecord,
    ) -> Result<CancellationRecord, CancellationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let new_row = NewCancellationRow {
            id: record.id(),
            user_id: *record.owner().as_uuid(),
            subscription_id: *record.subscription_id().as_uuid(),
            downsell_variant: record.variant().as_str(),
            reason: record.reason(),
            accepted_downsell: record.accepted_downsell(),
            created_at: record.created_at(),
        };

        diesel::insert_into(cancellations::table)
            .values(&new_row)
            .on_conflict((cancellations::user_id, cancellations::subscription_id))
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;

        select_latest(&mut conn, record.owner(), &record.subscription_id())
            .await?
            .ok_or_else(|| {
                CancellationRepositoryError::query("inserted cancellation record not readable")
            })
    }

    async fn update_decision(
        &self,
        owner: &UserId,
        subscription: &SubscriptionId,
        decision: &CancellationDecision,
    ) -> Result<CancellationRecord, CancellationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let changes = CancellationDecisionUpdate {
            reason: decision.reason.as_deref(),
            accepted_downsell: decision.accepted,
            decided_at: Some(decision.decided_at),
        };

        let row = diesel::update(
            cancellations::table
                .filter(cancellations::user_id.eq(owner.as_uuid()))
                .filter(cancellations::subscription_id.eq(subscription.as_uuid())),
        )
        .set(&changes)
        .returning(CancellationRow::as_returning())
        .get_result::<CancellationRow>(&mut conn)
        .await
        .optional()
        .map_err(diesel_error)?;

        row.map(row_to_record)
            .transpose()?
            .ok_or_else(CancellationRepositoryError::missing)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::Utc;
    use rstest::rstest;
    use uuid::Uuid;

    fn row(variant: &str) -> CancellationRow {
        CancellationRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            subscription_id: Uuid::new_v4(),
            downsell_variant: variant.to_owned(),
            reason: None,
            accepted_downsell: false,
            created_at: Utc::now(),
            decided_at: None,
        }
    }

    #[rstest]
    #[case("A", DownsellVariant::A)]
    #[case("B", DownsellVariant::B)]
    fn converts_stored_variants(#[case] raw: &str, #[case] expected: DownsellVariant) {
        let record = row_to_record(row(raw)).expect("valid row");
        assert_eq!(record.variant(), expected);
    }

    #[rstest]
    fn rejects_unknown_variants() {
        let error = row_to_record(row("C")).expect_err("corrupt row");
        assert!(matches!(error, CancellationRepositoryError::Query { .. }));
    }
}
