//! DynamoDB-backed implementation of the observation store.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, KeySchemaElement, KeyType, ProvisionedThroughput,
    ScalarAttributeType, TableStatus,
};

use crate::error::{Result, StoreError};
use crate::store::WeatherStore;
use crate::table::{
    PARTITION_KEY, READ_CAPACITY_UNITS, SORT_KEY, TableState, WRITE_CAPACITY_UNITS,
};

/// Handle to DynamoDB in one region.
///
/// Immutable after construction. The inner SDK client is reference-counted,
/// so cloning the agent is cheap and clones may be shared across tasks.
#[derive(Debug, Clone)]
pub struct DynamoAgent {
    client: Client,
}

impl DynamoAgent {
    /// Connect to DynamoDB in `region`.
    ///
    /// Credentials and endpoints are resolved through the SDK default
    /// configuration chain. The region value itself is passed through to
    /// the service, which rejects unknown regions.
    pub async fn connect(region: impl Into<String>) -> Result<Self> {
        Self::build(region.into(), None).await
    }

    /// Connect against a non-standard endpoint, e.g. DynamoDB Local at
    /// `http://localhost:8000`.
    pub async fn connect_with_endpoint(
        region: impl Into<String>,
        endpoint_url: impl Into<String>,
    ) -> Result<Self> {
        Self::build(region.into(), Some(endpoint_url.into())).await
    }

    /// The underlying SDK client, for operations outside the store surface.
    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn build(region: String, endpoint_url: Option<String>) -> Result<Self> {
        if region.is_empty() {
            return Err(StoreError::Config("region must not be empty".to_string()));
        }

        let shared_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let mut builder =
            aws_sdk_dynamodb::config::Builder::from(&shared_config).region(Region::new(region));
        if let Some(url) = endpoint_url {
            builder = builder.endpoint_url(url);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
        })
    }
}

#[async_trait]
impl WeatherStore for DynamoAgent {
    async fn list_table_names(&self) -> Result<Vec<String>> {
        let output = self
            .client
            .list_tables()
            .send()
            .await
            .map_err(|e| StoreError::Table(e.to_string()))?;

        Ok(output.table_names.unwrap_or_default())
    }

    async fn create_table(&self, table: &str) -> Result<()> {
        let partition = AttributeDefinition::builder()
            .attribute_name(PARTITION_KEY)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(|e| StoreError::Table(e.to_string()))?;
        let sort = AttributeDefinition::builder()
            .attribute_name(SORT_KEY)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(|e| StoreError::Table(e.to_string()))?;
        let hash_key = KeySchemaElement::builder()
            .attribute_name(PARTITION_KEY)
            .key_type(KeyType::Hash)
            .build()
            .map_err(|e| StoreError::Table(e.to_string()))?;
        let range_key = KeySchemaElement::builder()
            .attribute_name(SORT_KEY)
            .key_type(KeyType::Range)
            .build()
            .map_err(|e| StoreError::Table(e.to_string()))?;
        let throughput = ProvisionedThroughput::builder()
            .read_capacity_units(READ_CAPACITY_UNITS)
            .write_capacity_units(WRITE_CAPACITY_UNITS)
            .build()
            .map_err(|e| StoreError::Table(e.to_string()))?;

        self.client
            .create_table()
            .table_name(table)
            .attribute_definitions(partition)
            .attribute_definitions(sort)
            .key_schema(hash_key)
            .key_schema(range_key)
            .provisioned_throughput(throughput)
            .send()
            .await
            .map_err(|e| StoreError::Table(e.to_string()))?;

        Ok(())
    }

    async fn delete_table(&self, table: &str) -> Result<()> {
        self.client
            .delete_table()
            .table_name(table)
            .send()
            .await
            .map_err(|e| StoreError::Table(e.to_string()))?;

        Ok(())
    }

    async fn table_state(&self, table: &str) -> Result<Option<TableState>> {
        match self
            .client
            .describe_table()
            .table_name(table)
            .send()
            .await
        {
            Ok(output) => Ok(output
                .table
                .and_then(|t| t.table_status)
                .map(TableState::from)),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_resource_not_found_exception() {
                    Ok(None)
                } else {
                    Err(StoreError::Table(service_err.to_string()))
                }
            }
        }
    }

    async fn put_item(&self, table: &str, item: HashMap<String, AttributeValue>) -> Result<()> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;

        Ok(())
    }

    async fn get_item(
        &self,
        table: &str,
        name: &str,
        localtime: &str,
    ) -> Result<Option<HashMap<String, AttributeValue>>> {
        let output = self
            .client
            .get_item()
            .table_name(table)
            .key(PARTITION_KEY, AttributeValue::S(name.to_string()))
            .key(SORT_KEY, AttributeValue::S(localtime.to_string()))
            .send()
            .await
            .map_err(|e| StoreError::Read(e.to_string()))?;

        Ok(output.item)
    }
}

impl From<TableStatus> for TableState {
    fn from(status: TableStatus) -> Self {
        match status {
            TableStatus::Active => TableState::Active,
            TableStatus::Creating => TableState::Creating,
            TableStatus::Deleting => TableState::Deleting,
            _ => TableState::Unknown,
        }
    }
}
