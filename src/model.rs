use serde_derive::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Station metadata block of an observation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub region: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub tz_id: String,
    pub localtime_epoch: i64,
    pub localtime: String,
}

/// Current-conditions block of an observation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Current {
    pub last_updated_epoch: i64,
    pub last_updated: String,
    pub temp_c: f64,
    pub temp_f: f64,
    pub is_day: i64,
    pub wind_mph: f64,
    pub wind_kph: f64,
    pub wind_degree: i64,
    pub wind_dir: String,
    pub pressure_mb: f64,
    pub precip_mm: f64,
    pub humidity: i64,
    pub cloud: i64,
    pub feelslike_c: f64,
    pub feelslike_f: f64,
    pub uv: f64,
}

/// A weather observation as delivered by the upstream API: a `location`
/// block and a `current` block.
///
/// Both blocks are optional at the type level because partial and error
/// payloads deserialize without them; [`WeatherRecord::flatten`] refuses to
/// produce an item unless both are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub current: Option<Current>,
}

/// The flat item persisted per observation: the union of the [`Location`]
/// and [`Current`] fields, keyed by station `name` and `localtime`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherItem {
    pub name: String,
    pub region: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub tz_id: String,
    pub localtime_epoch: i64,
    pub localtime: String,
    pub last_updated_epoch: i64,
    pub last_updated: String,
    pub temp_c: f64,
    pub temp_f: f64,
    pub is_day: i64,
    pub wind_mph: f64,
    pub wind_kph: f64,
    pub wind_degree: i64,
    pub wind_dir: String,
    pub pressure_mb: f64,
    pub precip_mm: f64,
    pub humidity: i64,
    pub cloud: i64,
    pub feelslike_c: f64,
    pub feelslike_f: f64,
    pub uv: f64,
}

impl WeatherRecord {
    /// Flatten the nested record into a [`WeatherItem`].
    ///
    /// Location fields are listed first, current fields second; if both
    /// blocks ever carry a same-named attribute, the `current` value is the
    /// one that lands in the item. A missing block is an error and nothing
    /// is produced.
    pub fn flatten(&self) -> Result<WeatherItem> {
        let location = self
            .location
            .as_ref()
            .ok_or(StoreError::MissingBlock("location"))?;
        let current = self
            .current
            .as_ref()
            .ok_or(StoreError::MissingBlock("current"))?;

        Ok(WeatherItem {
            name: location.name.clone(),
            region: location.region.clone(),
            country: location.country.clone(),
            lat: location.lat,
            lon: location.lon,
            tz_id: location.tz_id.clone(),
            localtime_epoch: location.localtime_epoch,
            localtime: location.localtime.clone(),
            last_updated_epoch: current.last_updated_epoch,
            last_updated: current.last_updated.clone(),
            temp_c: current.temp_c,
            temp_f: current.temp_f,
            is_day: current.is_day,
            wind_mph: current.wind_mph,
            wind_kph: current.wind_kph,
            wind_degree: current.wind_degree,
            wind_dir: current.wind_dir.clone(),
            pressure_mb: current.pressure_mb,
            precip_mm: current.precip_mm,
            humidity: current.humidity,
            cloud: current.cloud,
            feelslike_c: current.feelslike_c,
            feelslike_f: current.feelslike_f,
            uv: current.uv,
        })
    }
}

impl WeatherItem {
    /// Composite key of this item: station name and local time.
    pub fn key(&self) -> (&str, &str) {
        (&self.name, &self.localtime)
    }
}
