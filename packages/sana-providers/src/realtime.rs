use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use sana_domain::{CandidateDocument, DocumentMetadata, REALTIME_DATA_TYPE};

const GHO_API_BASE: &str = "https://ghoapi.azureedge.net/api";
const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(300);

/// Infant mortality rate, the indicator the reference deployment tracked.
pub const DEFAULT_INDICATOR: &str = "MDG_0000000026";

/// Fetches one WHO GHO indicator for a country and converts each observation
/// into a realtime-flagged candidate document timestamped now. Retries
/// transparently on 5xx; any other failure surfaces to the caller, which
/// decides the fallback.
pub async fn fetch_health_indicator(
	country: &str,
	indicator: &str,
	year: Option<i32>,
	timeout_ms: u64,
) -> Result<Vec<CandidateDocument>> {
	let Some(iso3) = iso3_code(country) else {
		return Err(eyre::eyre!("Unknown country for realtime feed: {country}."));
	};
	let mut filters = vec![format!("COUNTRY eq '{iso3}'")];

	if let Some(year) = year {
		filters.push(format!("YEAR eq {year}"));
	}

	let url = format!("{GHO_API_BASE}/{indicator}?$filter={}", filters.join(" and "));
	let client = Client::builder().timeout(Duration::from_millis(timeout_ms)).build()?;
	let json = fetch_with_retry(&client, &url).await?;
	let now = OffsetDateTime::now_utc();

	Ok(snapshot_documents(country, indicator, &json, now))
}

async fn fetch_with_retry(client: &Client, url: &str) -> Result<Value> {
	let mut last_status = None;

	for attempt in 0..MAX_ATTEMPTS {
		if attempt > 0 {
			tokio::time::sleep(RETRY_BASE_DELAY * 2u32.pow(attempt - 1)).await;
		}

		let response = client.get(url).send().await?;
		let status = response.status();

		if status.is_server_error() {
			last_status = Some(status);

			continue;
		}

		let json = response.error_for_status()?.json().await?;

		return Ok(json);
	}

	Err(eyre::eyre!("Realtime feed request kept failing with status {last_status:?}."))
}

fn snapshot_documents(
	country: &str,
	indicator: &str,
	json: &Value,
	now: OffsetDateTime,
) -> Vec<CandidateDocument> {
	let Some(observations) = json.get("value").and_then(|value| value.as_array()) else {
		return Vec::new();
	};
	let timestamp = now.format(&Rfc3339).ok();
	let mut documents = Vec::new();

	for observation in observations {
		let Some(reading) = observation_reading(observation) else {
			continue;
		};
		let year = observation
			.get("TimeDim")
			.and_then(|value| value.as_i64())
			.map(|year| year.to_string())
			.unwrap_or_else(|| "unknown year".to_string());
		let text =
			format!("WHO indicator {indicator} for {country}, {year}: {reading}");

		documents.push(CandidateDocument::new(text, DocumentMetadata {
			source: Some("who".to_string()),
			doc_type: Some("statistic".to_string()),
			region: Some(country.to_lowercase()),
			category: Some("health_indicator".to_string()),
			timestamp: timestamp.clone(),
			priority: Some("high".to_string()),
			data_type: Some(REALTIME_DATA_TYPE.to_string()),
			..DocumentMetadata::default()
		}));
	}

	documents
}

fn observation_reading(observation: &Value) -> Option<String> {
	if let Some(numeric) = observation.get("NumericValue").and_then(|value| value.as_f64()) {
		return Some(numeric.to_string());
	}

	observation
		.get("Value")
		.and_then(|value| value.as_str())
		.filter(|value| !value.trim().is_empty())
		.map(str::to_string)
}

fn iso3_code(country: &str) -> Option<&'static str> {
	match country {
		"India" => Some("IND"),
		"Nigeria" => Some("NGA"),
		"United States" => Some("USA"),
		_ => None,
	}
}
