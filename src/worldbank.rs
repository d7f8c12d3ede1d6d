use crate::config::Indicator;
use crate::error::StudyError;
use async_trait::async_trait;
use reqwest::Client;
use script_kit::models::{IndicatorTable, Observation};
use script_kit::{Logger, Timer};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

pub const INDEX_NAME: &str = "country";

const PER_PAGE: u32 = 20_000;

/// Something that delivers one year of indicator values, one row per country.
#[async_trait]
pub trait IndicatorSource: Send + Sync {
    async fn fetch(
        &self,
        indicators: &[Indicator],
        year: i32,
    ) -> Result<IndicatorTable, StudyError>;
}

#[derive(Debug, Clone, Deserialize)]
struct Reference {
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct WbRecord {
    indicator: Reference,
    country: Reference,
    #[serde(default)]
    countryiso3code: Option<String>,
    value: Option<f64>,
}

impl WbRecord {
    fn row_label(&self) -> String {
        self.countryiso3code
            .as_deref()
            .filter(|code| !code.is_empty())
            .unwrap_or(&self.country.id)
            .to_string()
    }
}

/// One page of an indicator query: the records and the total page count.
#[derive(Debug)]
struct Page {
    pages: u64,
    records: Vec<WbRecord>,
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn parse_page(code: &str, body: Value) -> Result<Page, StudyError> {
    let invalid = |message: String| StudyError::ApiResponse {
        indicator: code.to_string(),
        message,
    };

    let Value::Array(mut parts) = body else {
        return Err(invalid("expected a JSON array".to_string()));
    };
    if parts.is_empty() {
        return Err(invalid("empty response".to_string()));
    }

    // Errors come back as [{"message": [{"id": .., "key": .., "value": ..}]}]
    if let Some(messages) = parts[0].get("message") {
        let text = messages
            .as_array()
            .map(|list| {
                list.iter()
                    .filter_map(|m| m.get("value").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .unwrap_or_else(|| messages.to_string());
        return Err(invalid(text));
    }

    let pages = parts[0].get("pages").and_then(as_count).unwrap_or(1);
    let records = match parts.get_mut(1).map(Value::take) {
        None | Some(Value::Null) => Vec::new(),
        Some(data) => serde_json::from_value(data).map_err(|e| invalid(e.to_string()))?,
    };

    Ok(Page { pages, records })
}

pub struct WorldBankClient {
    client: Client,
    base_url: String,
    logger: Logger,
}

impl WorldBankClient {
    pub fn new(base_url: &str) -> Result<Self, StudyError> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            logger: Logger::new("WORLD_BANK"),
        })
    }

    fn indicator_url(&self, code: &str) -> String {
        format!("{}/country/all/indicator/{}", self.base_url, code)
    }

    async fn fetch_page(&self, code: &str, year: i32, page: u64) -> Result<Page, StudyError> {
        debug!(indicator = code, year, page, "Requesting indicator page");
        let response = self
            .client
            .get(self.indicator_url(code))
            .query(&[
                ("date", year.to_string()),
                ("format", "json".to_string()),
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StudyError::ApiResponse {
                indicator: code.to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let body: Value = response.json().await?;
        parse_page(code, body)
    }

    /// All records of one indicator for one year, following pagination.
    async fn fetch_indicator(&self, code: &str, year: i32) -> Result<Vec<WbRecord>, StudyError> {
        let timer = Timer::start(&format!("{} fetch", code));
        let mut records = Vec::new();
        let mut page = 1;
        loop {
            let Page { pages, records: batch } = self.fetch_page(code, year, page).await?;
            records.extend(batch);
            if page >= pages {
                break;
            }
            page += 1;
        }
        self.logger.info(&format!(
            "{}: {} records ({:.1}ms)",
            code,
            records.len(),
            timer.elapsed_ms()
        ));
        Ok(records)
    }
}

#[async_trait]
impl IndicatorSource for WorldBankClient {
    async fn fetch(
        &self,
        indicators: &[Indicator],
        year: i32,
    ) -> Result<IndicatorTable, StudyError> {
        self.logger.info_with_data(
            &format!("Reading data for {}", year),
            indicators
                .iter()
                .map(|i| format!("{}: {}", i.code, i.name))
                .collect::<Vec<_>>(),
        );

        let mut observations = Vec::new();
        for indicator in indicators {
            for record in self.fetch_indicator(&indicator.code, year).await? {
                if record.indicator.id != indicator.code {
                    continue;
                }
                observations.push(Observation {
                    row: record.row_label(),
                    indicator: indicator.code.clone(),
                    value: record.value,
                });
            }
        }

        let codes = indicators.iter().map(|i| i.code.clone()).collect();
        let mut table = IndicatorTable::from_observations(INDEX_NAME, codes, observations);
        let names: HashMap<String, String> = indicators
            .iter()
            .map(|i| (i.code.clone(), i.name.clone()))
            .collect();
        table.rename_columns(&names);

        self.logger.info(&format!("Downloaded {} rows", table.len()));
        Ok(table)
    }
}
