use std::env;
use std::process;

use tracing::{error, info};
use weathervane::agent::DynamoAgent;
use weathervane::error::StoreError;
use weathervane::model::{Current, Location, WeatherRecord};
use weathervane::store;
use weathervane::table::{self, ProvisionOptions};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let region = env::var("AWS_REGION").unwrap_or_else(|_| "us-west-2".to_string());
    let table_name = env::var("WEATHER_TABLE").unwrap_or_else(|_| "weather".to_string());

    let agent = match DynamoAgent::connect(region).await {
        Ok(agent) => agent,
        Err(err) => fatal("connecting to DynamoDB", &err),
    };

    if let Err(err) = table::reset_table(&agent, &table_name, &ProvisionOptions::default()).await {
        fatal("provisioning table", &err);
    }

    let record = sample_record();
    if let Err(err) = store::put_record(&agent, &table_name, &record).await {
        fatal("storing observation", &err);
    }

    match store::get_record(&agent, &table_name, "London", "2024-01-01 12:00").await {
        Ok(Some(item)) => info!(station = %item.name, temp_c = item.temp_c, "read back stored observation"),
        Ok(None) => info!("no observation found for the written key"),
        Err(err) => fatal("reading observation", &err),
    }
}

fn fatal(context: &str, err: &StoreError) -> ! {
    error!(error = %err, "{} failed", context);
    process::exit(1);
}

fn sample_record() -> WeatherRecord {
    WeatherRecord {
        location: Some(Location {
            name: "London".to_string(),
            region: "City of London, Greater London".to_string(),
            country: "United Kingdom".to_string(),
            lat: 51.52,
            lon: -0.11,
            tz_id: "Europe/London".to_string(),
            localtime_epoch: 1704110400,
            localtime: "2024-01-01 12:00".to_string(),
        }),
        current: Some(Current {
            last_updated_epoch: 1704110100,
            last_updated: "2024-01-01 11:55".to_string(),
            temp_c: 7.0,
            temp_f: 44.6,
            is_day: 1,
            wind_mph: 12.5,
            wind_kph: 20.2,
            wind_degree: 250,
            wind_dir: "WSW".to_string(),
            pressure_mb: 1012.0,
            precip_mm: 0.1,
            humidity: 82,
            cloud: 75,
            feelslike_c: 4.3,
            feelslike_f: 39.7,
            uv: 1.0,
        }),
    }
}
