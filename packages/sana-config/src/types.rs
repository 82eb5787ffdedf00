use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub retrieval: Retrieval,
	pub ingestion: Ingestion,
	#[serde(default)]
	pub eviction: Eviction,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
	#[serde(default = "default_request_timeout_ms")]
	pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Fan-out partition sizes and the fused result bound. Defaults mirror the
/// reference retrieval behavior; every k is small on purpose — the fused
/// context is bounded by `top_k`, not by the sum of partitions.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub top_k: u32,
	pub realtime_k: u32,
	pub general_k: u32,
	pub region_k: u32,
	pub age_group_k: u32,
	pub practice_k: u32,
	pub general_types: Vec<String>,
	pub query_timeout_ms: u64,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			top_k: 3,
			realtime_k: 1,
			general_k: 2,
			region_k: 2,
			age_group_k: 1,
			practice_k: 2,
			general_types: vec![
				"symptom".to_string(),
				"disease".to_string(),
				"treatment".to_string(),
				"guideline".to_string(),
			],
			query_timeout_ms: 5_000,
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct Ingestion {
	/// Capacity ceiling of the vector store. Admission never pushes the
	/// stored total past this.
	pub max_vectors: u64,
	#[serde(default = "default_batch_size")]
	pub batch_size: u32,
	#[serde(default = "default_probe_k")]
	pub probe_k: u32,
	#[serde(default = "default_call_timeout_ms")]
	pub call_timeout_ms: u64,
	#[serde(default)]
	pub scoring: Scoring,
}

/// Admission scoring weights. These are carried-over heuristics, not tuned
/// values; change them in config, not in code.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Scoring {
	pub source_weights: HashMap<String, f32>,
	pub default_source_weight: f32,
	pub fresh_days: i64,
	pub fresh_bonus: f32,
	pub recent_days: i64,
	pub recent_bonus: f32,
	pub min_length: u32,
	pub length_bonus: f32,
	pub keywords: Vec<String>,
	pub keyword_bonus: f32,
}
impl Default for Scoring {
	fn default() -> Self {
		let source_weights = [
			("who", 10.0),
			("government_health", 8.0),
			("medical_journal", 7.0),
			("textbook", 6.0),
			("curated", 5.0),
			("realtime_feed", 4.0),
			("community", 2.0),
		]
		.into_iter()
		.map(|(source, weight)| (source.to_string(), weight))
		.collect();

		Self {
			source_weights,
			default_source_weight: 1.0,
			fresh_days: 30,
			fresh_bonus: 2.0,
			recent_days: 90,
			recent_bonus: 1.0,
			min_length: 500,
			length_bonus: 1.0,
			keywords: vec![
				"symptom".to_string(),
				"treatment".to_string(),
				"diagnosis".to_string(),
				"prevention".to_string(),
				"vaccination".to_string(),
				"outbreak".to_string(),
				"dosage".to_string(),
				"guideline".to_string(),
			],
			keyword_bonus: 1.5,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Eviction {
	pub page_size: u32,
	pub call_timeout_ms: u64,
}
impl Default for Eviction {
	fn default() -> Self {
		Self { page_size: 256, call_timeout_ms: 10_000 }
	}
}

fn default_request_timeout_ms() -> u64 {
	10_000
}

fn default_batch_size() -> u32 {
	100
}

fn default_probe_k() -> u32 {
	3
}

fn default_call_timeout_ms() -> u64 {
	10_000
}
