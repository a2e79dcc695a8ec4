//! Provisioning and write/read behaviour, exercised against an in-memory
//! store that mimics DynamoDB's asynchronous table-state transitions: a
//! freshly created table reports CREATING for a few polls before ACTIVE,
//! and a deleted table lingers in DELETING before it disappears.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use weathervane::error::{Result, StoreError};
use weathervane::model::{Current, Location, WeatherRecord};
use weathervane::store::{self, WeatherStore};
use weathervane::table::{self, ProvisionOptions, TableState};

const TABLE: &str = "weather-test";

struct FakeTable {
    state: TableState,
    pending_polls: u32,
    items: HashMap<(String, String), HashMap<String, AttributeValue>>,
}

struct MemoryStore {
    /// Polls a table spends in CREATING or DELETING before settling.
    settle_polls: u32,
    tables: Mutex<HashMap<String, FakeTable>>,
}

impl MemoryStore {
    fn new() -> Self {
        Self {
            settle_polls: 3,
            tables: Mutex::new(HashMap::new()),
        }
    }

    /// A store whose tables never leave CREATING or DELETING.
    fn stuck() -> Self {
        Self {
            settle_polls: u32::MAX,
            tables: Mutex::new(HashMap::new()),
        }
    }

    /// Insert a table that is already ACTIVE and holds `items`.
    fn with_active_table(
        self,
        table: &str,
        items: Vec<HashMap<String, AttributeValue>>,
    ) -> Self {
        let mut stored = HashMap::new();
        for item in items {
            let name = item["name"].as_s().unwrap().clone();
            let localtime = item["localtime"].as_s().unwrap().clone();
            stored.insert((name, localtime), item);
        }
        self.tables.lock().unwrap().insert(
            table.to_string(),
            FakeTable {
                state: TableState::Active,
                pending_polls: 0,
                items: stored,
            },
        );
        self
    }

    fn item_count(&self, table: &str) -> usize {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map_or(0, |t| t.items.len())
    }
}

#[async_trait]
impl WeatherStore for MemoryStore {
    async fn list_table_names(&self) -> Result<Vec<String>> {
        Ok(self.tables.lock().unwrap().keys().cloned().collect())
    }

    async fn create_table(&self, table: &str) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        if tables.contains_key(table) {
            return Err(StoreError::Table(format!("table `{table}` already exists")));
        }
        tables.insert(
            table.to_string(),
            FakeTable {
                state: TableState::Creating,
                pending_polls: self.settle_polls,
                items: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn delete_table(&self, table: &str) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        match tables.get_mut(table) {
            Some(entry) => {
                entry.state = TableState::Deleting;
                entry.pending_polls = self.settle_polls;
                Ok(())
            }
            None => Err(StoreError::Table(format!("table `{table}` not found"))),
        }
    }

    async fn table_state(&self, table: &str) -> Result<Option<TableState>> {
        let mut tables = self.tables.lock().unwrap();
        let (state, pending) = match tables.get(table) {
            Some(entry) => (entry.state, entry.pending_polls),
            None => return Ok(None),
        };

        if pending > 0 {
            tables.get_mut(table).unwrap().pending_polls = pending - 1;
            return Ok(Some(state));
        }

        match state {
            TableState::Creating => {
                tables.get_mut(table).unwrap().state = TableState::Active;
                Ok(Some(TableState::Active))
            }
            TableState::Deleting => {
                tables.remove(table);
                Ok(None)
            }
            settled => Ok(Some(settled)),
        }
    }

    async fn put_item(&self, table: &str, item: HashMap<String, AttributeValue>) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        let entry = tables
            .get_mut(table)
            .filter(|t| t.state == TableState::Active)
            .ok_or_else(|| StoreError::Write(format!("table `{table}` is not active")))?;

        let name = item["name"].as_s().unwrap().clone();
        let localtime = item["localtime"].as_s().unwrap().clone();
        entry.items.insert((name, localtime), item);
        Ok(())
    }

    async fn get_item(
        &self,
        table: &str,
        name: &str,
        localtime: &str,
    ) -> Result<Option<HashMap<String, AttributeValue>>> {
        let tables = self.tables.lock().unwrap();
        let entry = tables
            .get(table)
            .ok_or_else(|| StoreError::Read(format!("table `{table}` not found")))?;
        Ok(entry
            .items
            .get(&(name.to_string(), localtime.to_string()))
            .cloned())
    }
}

fn fast_opts() -> ProvisionOptions {
    ProvisionOptions {
        poll_interval: Duration::from_millis(1),
        timeout: Duration::from_secs(1),
    }
}

fn observation(name: &str, localtime: &str) -> WeatherRecord {
    WeatherRecord {
        location: Some(Location {
            name: name.to_string(),
            region: "Test Region".to_string(),
            country: "Testland".to_string(),
            lat: 10.0,
            lon: 20.0,
            tz_id: "Etc/UTC".to_string(),
            localtime_epoch: 1704067200,
            localtime: localtime.to_string(),
        }),
        current: Some(Current {
            last_updated_epoch: 1704067200,
            last_updated: localtime.to_string(),
            temp_c: 21.5,
            temp_f: 70.7,
            is_day: 1,
            wind_mph: 3.1,
            wind_kph: 5.0,
            wind_degree: 180,
            wind_dir: "S".to_string(),
            pressure_mb: 1015.0,
            precip_mm: 0.0,
            humidity: 55,
            cloud: 10,
            feelslike_c: 21.5,
            feelslike_f: 70.7,
            uv: 4.0,
        }),
    }
}

#[tokio::test]
async fn reset_creates_a_missing_table() {
    let fake = MemoryStore::new();

    table::reset_table(&fake, TABLE, &fast_opts()).await.unwrap();

    let names = fake.list_table_names().await.unwrap();
    assert_eq!(names, vec![TABLE.to_string()]);
    assert_eq!(
        fake.table_state(TABLE).await.unwrap(),
        Some(TableState::Active)
    );
    assert_eq!(fake.item_count(TABLE), 0);
}

#[tokio::test]
async fn reset_replaces_an_existing_table_and_drops_its_contents() {
    let old_item = weathervane::convert::to_item(
        &observation("station-1", "2024-01-01T00:00:00Z").flatten().unwrap(),
    )
    .unwrap();
    let fake = MemoryStore::new().with_active_table(TABLE, vec![old_item]);
    assert_eq!(fake.item_count(TABLE), 1);

    table::reset_table(&fake, TABLE, &fast_opts()).await.unwrap();

    let names = fake.list_table_names().await.unwrap();
    assert_eq!(names, vec![TABLE.to_string()]);
    assert_eq!(fake.item_count(TABLE), 0);
}

#[tokio::test]
async fn written_observation_reads_back_identically() {
    let fake = MemoryStore::new();
    table::reset_table(&fake, TABLE, &fast_opts()).await.unwrap();

    let record = observation("station-1", "2024-01-01T00:00:00Z");
    store::put_record(&fake, TABLE, &record).await.unwrap();

    let read = store::get_record(&fake, TABLE, "station-1", "2024-01-01T00:00:00Z")
        .await
        .unwrap()
        .expect("item should exist");
    assert_eq!(read, record.flatten().unwrap());
}

#[tokio::test]
async fn rewriting_the_same_key_overwrites() {
    let fake = MemoryStore::new();
    table::reset_table(&fake, TABLE, &fast_opts()).await.unwrap();

    let first = observation("station-1", "2024-01-01T00:00:00Z");
    let mut second = first.clone();
    second.current.as_mut().unwrap().temp_c = -3.0;

    store::put_record(&fake, TABLE, &first).await.unwrap();
    store::put_record(&fake, TABLE, &second).await.unwrap();

    let read = store::get_record(&fake, TABLE, "station-1", "2024-01-01T00:00:00Z")
        .await
        .unwrap()
        .expect("item should exist");
    assert_eq!(read.temp_c, -3.0);
    assert_eq!(fake.item_count(TABLE), 1);
}

#[tokio::test]
async fn missing_location_block_aborts_before_any_write() {
    // No table is provisioned: if the writer reached the store, the fake
    // would answer with a Write error instead of the flattening error.
    let fake = MemoryStore::new();

    let mut record = observation("station-1", "2024-01-01T00:00:00Z");
    record.location = None;

    let err = store::put_record(&fake, TABLE, &record).await.unwrap_err();
    assert!(matches!(err, StoreError::MissingBlock("location")));
}

#[tokio::test]
async fn empty_key_attributes_are_rejected() {
    let fake = MemoryStore::new();

    let mut record = observation("station-1", "");
    let err = store::put_record(&fake, TABLE, &record).await.unwrap_err();
    assert!(matches!(err, StoreError::EmptyKey("localtime")));

    record = observation("", "2024-01-01T00:00:00Z");
    let err = store::put_record(&fake, TABLE, &record).await.unwrap_err();
    assert!(matches!(err, StoreError::EmptyKey("name")));
}

#[tokio::test]
async fn provisioning_times_out_when_the_table_never_settles() {
    let fake = MemoryStore::stuck();
    let opts = ProvisionOptions {
        poll_interval: Duration::from_millis(1),
        timeout: Duration::from_millis(20),
    };

    let err = table::reset_table(&fake, TABLE, &opts).await.unwrap_err();
    assert!(matches!(err, StoreError::Timeout { target: "active", .. }));
}
