//! Table provisioning.
//!
//! Resets a table to a known-empty state: delete whatever is there, then
//! recreate it with the fixed observation schema. DynamoDB applies DDL
//! asynchronously, so both steps poll the reported table state until it
//! settles, bounded by a timeout.

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::info;

use crate::error::{Result, StoreError};
use crate::store::WeatherStore;

/// Partition key attribute of the observation schema.
pub const PARTITION_KEY: &str = "name";

/// Sort key attribute of the observation schema.
pub const SORT_KEY: &str = "localtime";

/// Provisioned read capacity for new tables.
pub const READ_CAPACITY_UNITS: i64 = 10;

/// Provisioned write capacity for new tables.
pub const WRITE_CAPACITY_UNITS: i64 = 10;

/// Lifecycle state a table reports while DDL is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    Creating,
    Active,
    Deleting,
    Unknown,
}

/// How often and for how long to poll for table-state transitions.
#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for ProvisionOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Ensure `table` exists, is empty, and carries the fixed observation
/// schema.
///
/// Any pre-existing table of that name is deleted first, contents included.
/// Afterwards exactly one table with this name exists and reports ACTIVE.
pub async fn reset_table<S>(store: &S, table: &str, opts: &ProvisionOptions) -> Result<()>
where
    S: WeatherStore + ?Sized,
{
    let existing = store.list_table_names().await?;
    if existing.iter().any(|name| name == table) {
        info!(table, "table already exists, deleting");
        store.delete_table(table).await?;
        wait_until_absent(store, table, opts).await?;
    }

    store.create_table(table).await?;
    wait_until_active(store, table, opts).await?;
    info!(table, "table created and active");
    Ok(())
}

async fn wait_until_absent<S>(store: &S, table: &str, opts: &ProvisionOptions) -> Result<()>
where
    S: WeatherStore + ?Sized,
{
    let deadline = Instant::now() + opts.timeout;
    loop {
        if store.table_state(table).await?.is_none() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(StoreError::Timeout {
                table: table.to_string(),
                target: "deleted",
            });
        }
        sleep(opts.poll_interval).await;
    }
}

async fn wait_until_active<S>(store: &S, table: &str, opts: &ProvisionOptions) -> Result<()>
where
    S: WeatherStore + ?Sized,
{
    let deadline = Instant::now() + opts.timeout;
    loop {
        if store.table_state(table).await? == Some(TableState::Active) {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(StoreError::Timeout {
                table: table.to_string(),
                target: "active",
            });
        }
        sleep(opts.poll_interval).await;
    }
}
