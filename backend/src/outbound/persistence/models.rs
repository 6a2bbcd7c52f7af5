//! Internal Diesel row structs.
//!
//! These types never leave the persistence layer; repositories convert them
//! into domain aggregates through the validating constructors.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{cancellations, subscriptions};

/// Row struct for reading from the subscriptions table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = subscriptions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SubscriptionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub monthly_price: i32,
    pub status: String,
    pub discount_applied: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset written by a successful compare-and-set.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = subscriptions)]
pub(crate) struct SubscriptionTransition<'a> {
    pub monthly_price: i32,
    pub status: &'a str,
    pub discount_applied: bool,
    pub updated_at: DateTime<Utc>,
}

/// Row struct for reading from the cancellations table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = cancellations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CancellationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subscription_id: Uuid,
    pub downsell_variant: String,
    pub reason: Option<String>,
    pub accepted_downsell: bool,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

/// Insertable struct for new cancellation records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = cancellations)]
pub(crate) struct NewCancellationRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subscription_id: Uuid,
    pub downsell_variant: &'a str,
    pub reason: Option<&'a str>,
    pub accepted_downsell: bool,
    pub created_at: DateTime<Utc>,
}

/// Changeset applied when the decision is recorded.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = cancellations)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct CancellationDecisionUpdate<'a> {
    pub reason: Option<&'a str>,
    pub accepted_downsell: bool,
    pub decided_at: Option<DateTime<Utc>>,
}
