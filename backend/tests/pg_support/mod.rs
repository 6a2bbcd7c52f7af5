//! Embedded PostgreSQL helpers for the Diesel adapter suites.
//!
//! A single cluster is shared per test binary. Each test gets its own
//! database cloned from a template that already carries the migrations, so
//! tests never observe one another's rows.
//!
//! Set `SKIP_TEST_CLUSTER=1` where the cluster cannot start; tests then print
//! a skip marker instead of failing.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use cancel_flow::outbound::persistence::run_pending_migrations;
use pg_embedded_setup_unpriv::test_support::{hash_directory, shared_cluster_handle};
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use postgres::{Client, NoTls};
use uuid::Uuid;

const TEMPLATE_NAME_PREFIX: &str = "cancel_flow_template";
const PROVISION_RETRIES: usize = 5;
const RETRY_DELAY: Duration = Duration::from_millis(500);

static TEMPLATE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn migrations_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations")
}

fn template_database_name() -> Result<String, String> {
    let hash = hash_directory(migrations_dir()).map_err(|err| format!("hash migrations: {err}"))?;
    let short_hash = hash.get(..8).unwrap_or(&hash);
    Ok(format!("{TEMPLATE_NAME_PREFIX}_{short_hash}"))
}

/// Creates the migrated template database once per migration set.
fn ensure_template_database(cluster: &ClusterHandle) -> Result<String, String> {
    let template_name = template_database_name()?;
    let _lock = TEMPLATE_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let exists = cluster
        .database_exists(template_name.as_str())
        .map_err(|err| format!("template check: {err:?}"))?;
    if !exists {
        cluster
            .create_database(template_name.as_str())
            .map_err(|err| format!("create template: {err:?}"))?;
        let url = cluster.connection().database_url(&template_name);
        run_pending_migrations(&url).map_err(|err| err.to_string())?;
    }
    Ok(template_name)
}

/// Shared cluster for this test binary, retried while it boots.
pub fn shared_cluster() -> Result<&'static ClusterHandle, String> {
    let mut last_error = String::new();
    for attempt in 1..=PROVISION_RETRIES {
        match shared_cluster_handle() {
            Ok(handle) => return Ok(handle),
            Err(err) => last_error = format!("shared cluster attempt {attempt}: {err:?}"),
        }
        std::thread::sleep(RETRY_DELAY);
    }
    Err(last_error)
}

/// A fresh database cloned from the migrated template.
pub fn provision_template_database(cluster: &ClusterHandle) -> Result<TemporaryDatabase, String> {
    let mut last_error = String::from("template provisioning never ran");
    for attempt in 1..=PROVISION_RETRIES {
        let provisioned = ensure_template_database(cluster).and_then(|template| {
            let name = format!("test_{}", Uuid::new_v4().simple());
            cluster
                .temporary_database_from_template(name.as_str(), template.as_str())
                .map_err(|err| format!("clone template: {err:?}"))
        });
        match provisioned {
            Ok(database) => return Ok(database),
            Err(err) => last_error = format!("attempt {attempt}/{PROVISION_RETRIES}: {err}"),
        }
        std::thread::sleep(RETRY_DELAY);
    }
    Err(last_error)
}

fn skip_requested() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Returns `None` with a skip marker when skipping is allowed, else panics.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if skip_requested() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}

/// Render a `postgres` error with its SQLSTATE and message.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    match error.as_db_error() {
        Some(db_error) => format!("postgres error {:?}: {}", db_error.code(), db_error.message()),
        None => error.to_string(),
    }
}

/// Open a raw client for seeding and out-of-band assertions.
pub fn raw_client(url: &str) -> Result<Client, String> {
    Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))
}

/// Insert an `active` subscription owned by `owner`.
pub fn seed_subscription(
    url: &str,
    id: Uuid,
    owner: Uuid,
    monthly_price: i32,
) -> Result<(), String> {
    raw_client(url)?
        .execute(
            concat!(
                "INSERT INTO subscriptions (id, user_id, monthly_price, status) ",
                "VALUES ($1, $2, $3, 'active')"
            ),
            &[&id, &owner, &monthly_price],
        )
        .map(|_| ())
        .map_err(|err| format_postgres_error(&err))
}
