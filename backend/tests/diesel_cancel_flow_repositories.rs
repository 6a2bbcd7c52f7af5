//! Integration tests for the Diesel subscription and cancellation adapters.
//!
//! These run against embedded PostgreSQL so the unique index, the
//! conditional `UPDATE` and the variant trigger are exercised as deployed.
//! Raw `postgres` clients are only used outside `block_on`.

use std::sync::Arc;

use cancel_flow::domain::ports::{
    CancelFlowCommand, CancellationDecision, CancellationRepository, DecideRequest,
    FixtureVariantSource, SubscriptionRepository, SubscriptionRepositoryError,
};
use cancel_flow::domain::{
    CancelFlowService, CancellationRecord, Cents, DownsellVariant, SubscriptionId,
    SubscriptionStatus, UserId,
};
use cancel_flow::outbound::persistence::{
    DbPool, DieselCancellationRepository, DieselSubscriptionRepository, PoolConfig,
};
use chrono::Utc;
use futures::future::join_all;
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;

mod pg_support;

use pg_support::{
    format_postgres_error, handle_cluster_setup_failure, provision_template_database, raw_client,
    seed_subscription, shared_cluster,
};

const SEEDED_PRICE: i32 = 5_000;

struct TestContext {
    runtime: Runtime,
    subscriptions: DieselSubscriptionRepository,
    cancellations: DieselCancellationRepository,
    owner: UserId,
    subscription: SubscriptionId,
    database_url: String,
    _database: TemporaryDatabase,
}

fn setup_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster()?;
    let database = provision_template_database(cluster)?;
    let database_url = database.url().to_owned();

    let owner = UserId::random();
    let subscription = SubscriptionId::random();
    seed_subscription(
        database_url.as_str(),
        *subscription.as_uuid(),
        *owner.as_uuid(),
        SEEDED_PRICE,
    )?;

    let config = PoolConfig::new(database_url.as_str()).with_max_size(8);
    let pool = runtime
        .block_on(async { DbPool::new(config).await })
        .map_err(|err| err.to_string())?;

    Ok(TestContext {
        runtime,
        subscriptions: DieselSubscriptionRepository::new(pool.clone()),
        cancellations: DieselCancellationRepository::new(pool),
        owner,
        subscription,
        database_url,
        _database: database,
    })
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    match setup_context() {
        Ok(context) => Some(context),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn cancellation_rows(url: &str, subscription: &SubscriptionId) -> i64 {
    let mut client = raw_client(url).expect("raw client connects");
    let row = client
        .query_one(
            "SELECT count(*) FROM cancellations WHERE subscription_id = $1",
            &[subscription.as_uuid()],
        )
        .expect("count cancellations");
    row.get(0)
}

#[rstest]
fn concurrent_first_inserts_converge_on_one_row(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: concurrent_first_inserts_converge_on_one_row skipped");
        return;
    };

    let stored: Vec<CancellationRecord> = context.runtime.block_on(async {
        let handles = (0..16).map(|i| {
            let repository = context.cancellations.clone();
            let variant = if i % 2 == 0 {
                DownsellVariant::A
            } else {
                DownsellVariant::B
            };
            let candidate = CancellationRecord::new(
                context.owner.clone(),
                context.subscription,
                variant,
                Utc::now(),
            );
            tokio::spawn(async move { repository.insert_or_fetch(&candidate).await })
        });
        join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.expect("task completes").expect("insert or fetch"))
            .collect()
    });

    let winner = stored.first().expect("sixteen callers");
    assert!(
        stored
            .iter()
            .all(|record| record.id() == winner.id() && record.variant() == winner.variant()),
        "every caller should observe the winning row"
    );
    assert_eq!(
        cancellation_rows(context.database_url.as_str(), &context.subscription),
        1
    );
}

#[rstest]
fn compare_and_set_rejects_stale_and_foreign_snapshots(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: compare_and_set_rejects_stale_and_foreign_snapshots skipped");
        return;
    };
    let repository = &context.subscriptions;

    context.runtime.block_on(async {
        let original = repository
            .find_owned(&context.owner, &context.subscription)
            .await
            .expect("lookup")
            .expect("seeded subscription");
        let pending = original
            .begin_cancellation(Utc::now())
            .expect("transition allowed")
            .expect("status changes");

        repository
            .compare_and_set(&context.owner, &original, &pending)
            .await
            .expect("first write wins");

        let stale = repository
            .compare_and_set(&context.owner, &original, &pending)
            .await;
        assert_eq!(stale, Err(SubscriptionRepositoryError::stale_state()));

        let cancelled = pending
            .finalize(false, Cents::new(1_000), Utc::now())
            .expect("transition allowed")
            .expect("status changes");
        let foreign = repository
            .compare_and_set(&UserId::random(), &pending, &cancelled)
            .await;
        assert_eq!(foreign, Err(SubscriptionRepositoryError::stale_state()));

        let stored = repository
            .find_owned(&context.owner, &context.subscription)
            .await
            .expect("lookup")
            .expect("still owned");
        assert_eq!(stored.status(), SubscriptionStatus::PendingCancellation);
        assert_eq!(stored.monthly_price(), Cents::new(5_000));
    });
}

#[rstest]
fn stored_variant_cannot_be_rewritten(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: stored_variant_cannot_be_rewritten skipped");
        return;
    };
    let repository = &context.cancellations;

    let inserted = context.runtime.block_on(async {
        let candidate = CancellationRecord::new(
            context.owner.clone(),
            context.subscription,
            DownsellVariant::A,
            Utc::now(),
        );
        repository
            .insert_or_fetch(&candidate)
            .await
            .expect("insert record")
    });
    assert_eq!(inserted.variant(), DownsellVariant::A);

    let mut client = raw_client(context.database_url.as_str()).expect("raw client connects");
    let error = client
        .execute(
            "UPDATE cancellations SET downsell_variant = 'B' WHERE id = $1",
            &[&inserted.id()],
        )
        .expect_err("trigger rejects variant changes");
    assert!(
        format_postgres_error(&error).contains("downsell_variant is immutable"),
        "unexpected error: {}",
        format_postgres_error(&error)
    );

    let decided = context.runtime.block_on(async {
        let decision = CancellationDecision {
            accepted: true,
            reason: Some("too expensive".to_owned()),
            decided_at: Utc::now(),
        };
        repository
            .update_decision(&context.owner, &context.subscription, &decision)
            .await
            .expect("decision recorded")
    });
    assert_eq!(decided.variant(), DownsellVariant::A);
    assert!(decided.accepted_downsell());
    assert_eq!(decided.reason(), Some("too expensive"));
}

#[rstest]
fn concurrent_accepts_discount_once_in_postgres(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: concurrent_accepts_discount_once_in_postgres skipped");
        return;
    };
    let command: Arc<dyn CancelFlowCommand> = Arc::new(CancelFlowService::new(
        Arc::new(context.subscriptions.clone()),
        Arc::new(context.cancellations.clone()),
        Arc::new(FixtureVariantSource(DownsellVariant::B)),
        Arc::new(DefaultClock),
    ));

    let stored = context.runtime.block_on(async {
        command.start(&context.owner).await.expect("flow opens");
        command
            .assign(&context.owner, &context.subscription)
            .await
            .expect("variant assigned");

        let handles = (0..8).map(|_| {
            let command = Arc::clone(&command);
            let request = DecideRequest {
                owner: context.owner.clone(),
                subscription_id: context.subscription,
                accepted: true,
                reason: None,
            };
            tokio::spawn(async move { command.decide(request).await })
        });
        for joined in join_all(handles).await {
            // Losers either observe the settled state or give up with a conflict.
            if let Ok(response) = joined.expect("task completes") {
                assert_eq!(response.status, SubscriptionStatus::Active);
            }
        }

        context
            .subscriptions
            .find_owned(&context.owner, &context.subscription)
            .await
            .expect("lookup")
            .expect("still owned")
    });

    assert_eq!(stored.status(), SubscriptionStatus::Active);
    assert_eq!(stored.monthly_price(), Cents::new(4_000));
    assert!(stored.discount_applied());
    assert_eq!(
        cancellation_rows(context.database_url.as_str(), &context.subscription),
        1
    );
}
