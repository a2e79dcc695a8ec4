//! Storage capability surface and the observation write/read path.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use tracing::info;

use crate::convert;
use crate::error::{Result, StoreError};
use crate::model::{WeatherItem, WeatherRecord};
use crate::table::{PARTITION_KEY, SORT_KEY, TableState};

/// What the observation store needs from the backing database: table
/// lifecycle and single-item put/get.
///
/// Implemented by [`DynamoAgent`](crate::agent::DynamoAgent) against
/// DynamoDB, and by an in-memory fake in the test suite.
#[async_trait]
pub trait WeatherStore: Send + Sync {
    async fn list_table_names(&self) -> Result<Vec<String>>;

    /// Create `table` with the fixed observation schema.
    async fn create_table(&self, table: &str) -> Result<()>;

    async fn delete_table(&self, table: &str) -> Result<()>;

    /// Current lifecycle state of `table`, or `None` when it does not
    /// exist.
    async fn table_state(&self, table: &str) -> Result<Option<TableState>>;

    async fn put_item(&self, table: &str, item: HashMap<String, AttributeValue>) -> Result<()>;

    async fn get_item(
        &self,
        table: &str,
        name: &str,
        localtime: &str,
    ) -> Result<Option<HashMap<String, AttributeValue>>>;
}

/// Flatten `record` and write it to `table`.
///
/// The write is unconditional: an existing item with the same key is
/// overwritten. A missing block or an empty key attribute aborts before
/// anything goes over the wire.
pub async fn put_record<S>(store: &S, table: &str, record: &WeatherRecord) -> Result<()>
where
    S: WeatherStore + ?Sized,
{
    let item = record.flatten()?;
    if item.name.is_empty() {
        return Err(StoreError::EmptyKey(PARTITION_KEY));
    }
    if item.localtime.is_empty() {
        return Err(StoreError::EmptyKey(SORT_KEY));
    }

    let attrs = convert::to_item(&item)?;
    store.put_item(table, attrs).await?;
    info!(
        table,
        station = %item.name,
        localtime = %item.localtime,
        "observation stored"
    );
    Ok(())
}

/// Point lookup of a stored observation by its composite key.
pub async fn get_record<S>(
    store: &S,
    table: &str,
    name: &str,
    localtime: &str,
) -> Result<Option<WeatherItem>>
where
    S: WeatherStore + ?Sized,
{
    match store.get_item(table, name, localtime).await? {
        Some(item) => Ok(Some(convert::from_item(&item)?)),
        None => Ok(None),
    }
}
