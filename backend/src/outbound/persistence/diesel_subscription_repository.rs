//! PostgreSQL-backed `SubscriptionRepository`.
//!
//! Every statement filters on `user_id` as well as the primary key. The
//! compare-and-set is a single conditional `UPDATE`; zero affected rows means
//! the caller's snapshot is stale.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{SubscriptionRepository, SubscriptionRepositoryError};
use crate::domain::{
    Cents, Subscription, SubscriptionDraft, SubscriptionId, SubscriptionStatus, UserId,
};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{SubscriptionRow, SubscriptionTransition};
use super::pool::{DbPool, PoolError};
use super::schema::subscriptions;

const OPEN_STATUSES: [&str; 2] = [
    SubscriptionStatus::Active.as_str(),
    SubscriptionStatus::PendingCancellation.as_str(),
];

/// Diesel-backed implementation of the subscription repository port.
#[derive(Clone)]
pub struct DieselSubscriptionRepository {
    pool: DbPool,
}

impl DieselSubscriptionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> SubscriptionRepositoryError {
    map_pool_error(error, SubscriptionRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> SubscriptionRepositoryError {
    map_diesel_error(
        error,
        SubscriptionRepositoryError::query,
        SubscriptionRepositoryError::connection,
    )
}

fn price_to_column(price: Cents) -> Result<i32, SubscriptionRepositoryError> {
    i32::try_from(price.get())
        .map_err(|_| SubscriptionRepositoryError::query("monthly price exceeds storage range"))
}

fn row_to_subscription(row: SubscriptionRow) -> Result<Subscription, SubscriptionRepositoryError> {
    let SubscriptionRow {
        id,
        user_id,
        monthly_price,
        status,
        discount_applied,
        created_at,
        updated_at,
    } = row;

    let monthly_price = Cents::try_from(monthly_price)
        .map_err(|_| SubscriptionRepositoryError::query("stored monthly price is negative"))?;
    let status = status
        .parse::<SubscriptionStatus>()
        .map_err(|err| SubscriptionRepositoryError::query(err.to_string()))?;

    Ok(Subscription::from(SubscriptionDraft {
        id: SubscriptionId::from_uuid(id),
        owner: UserId::from_uuid(user_id),
        monthly_price,
        status,
        discount_applied,
        created_at,
        updated_at,
    }))
}

#[async_trait]
impl SubscriptionRepository for DieselSubscriptionRepository {
    async fn find_owned(
        &self,
        owner: &UserId,
        id: &SubscriptionId,
    ) -> Result<Option<Subscription>, SubscriptionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row = subscriptions::table
            .filter(subscriptions::id.eq(id.as_uuid()))
            .filter(subscriptions::user_id.eq(owner.as_uuid()))
            .select(SubscriptionRow::as_select())
            .first::<SubscriptionRow>(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(row_to_subscription).transpose()
    }

    async fn latest_open_for(
        &self,
        owner: &UserId,
    ) -> Result<Option<Subscription>, SubscriptionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row = subscriptions::table
            .filter(subscriptions::user_id.eq(owner.as_uuid()))
            .filter(subscriptions::status.eq_any(OPEN_STATUSES))
            .order((subscriptions::created_at.desc(), subscriptions::id.desc()))
            .select(SubscriptionRow::as_select())
            .first::<SubscriptionRow>(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(row_to_subscription).transpose()
    }

    async fn compare_and_set(
        &self,
        owner: &UserId,
        previous: &Subscription,
        next: &Subscription,
    ) -> Result<(), SubscriptionRepositoryError> {
        let previous_price = price_to_column(previous.monthly_price())?;
        let transition = SubscriptionTransition {
            monthly_price: price_to_column(next.monthly_price())?,
            status: next.status().as_str(),
            discount_applied: next.discount_applied(),
            updated_at: next.updated_at(),
        };
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let updated = diesel::update(
            subscriptions::table
                .filter(subscriptions::id.eq(previous.id().as_uuid()))
                .filter(subscriptions::user_id.eq(owner.as_uuid()))
                .filter(subscriptions::status.eq(previous.status().as_str()))
                .filter(subscriptions::monthly_price.eq(previous_price))
                .filter(subscriptions::discount_applied.eq(previous.discount_applied())),
        )
        .set(&transition)
        .execute(&mut conn)
        .await
        .map_err(diesel_error)?;

        if updated == 0 {
            return Err(SubscriptionRepositoryError::stale_state());
        }
        Ok(())
    }
}
