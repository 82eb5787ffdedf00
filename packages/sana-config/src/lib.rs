mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Eviction, Ingestion, Providers, Qdrant, Retrieval, Scoring,
	Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.storage.qdrant.url.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.url must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.vector_dim == 0 {
		return Err(Error::Validation {
			message: "storage.qdrant.vector_dim must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.qdrant.request_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "storage.qdrant.request_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.api_key must be non-empty.".to_string(),
		});
	}
	if cfg.retrieval.top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.query_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "retrieval.query_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.ingestion.max_vectors == 0 {
		return Err(Error::Validation {
			message: "ingestion.max_vectors must be greater than zero.".to_string(),
		});
	}
	if cfg.ingestion.batch_size == 0 {
		return Err(Error::Validation {
			message: "ingestion.batch_size must be greater than zero.".to_string(),
		});
	}
	if cfg.ingestion.probe_k == 0 {
		return Err(Error::Validation {
			message: "ingestion.probe_k must be greater than zero.".to_string(),
		});
	}
	if cfg.ingestion.call_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "ingestion.call_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.ingestion.scoring.fresh_days <= 0 {
		return Err(Error::Validation {
			message: "ingestion.scoring.fresh_days must be greater than zero.".to_string(),
		});
	}
	if cfg.ingestion.scoring.recent_days <= cfg.ingestion.scoring.fresh_days {
		return Err(Error::Validation {
			message: "ingestion.scoring.recent_days must be greater than ingestion.scoring.fresh_days."
				.to_string(),
		});
	}

	for (label, value) in [
		("default_source_weight", cfg.ingestion.scoring.default_source_weight),
		("fresh_bonus", cfg.ingestion.scoring.fresh_bonus),
		("recent_bonus", cfg.ingestion.scoring.recent_bonus),
		("length_bonus", cfg.ingestion.scoring.length_bonus),
		("keyword_bonus", cfg.ingestion.scoring.keyword_bonus),
	] {
		if !value.is_finite() {
			return Err(Error::Validation {
				message: format!("ingestion.scoring.{label} must be a finite number."),
			});
		}
		if value < 0.0 {
			return Err(Error::Validation {
				message: format!("ingestion.scoring.{label} must be zero or greater."),
			});
		}
	}

	for (source, weight) in &cfg.ingestion.scoring.source_weights {
		if !weight.is_finite() {
			return Err(Error::Validation {
				message: format!(
					"ingestion.scoring.source_weights.{source} must be a finite number."
				),
			});
		}
		if *weight < 0.0 {
			return Err(Error::Validation {
				message: format!(
					"ingestion.scoring.source_weights.{source} must be zero or greater."
				),
			});
		}
	}

	if cfg.eviction.page_size == 0 {
		return Err(Error::Validation {
			message: "eviction.page_size must be greater than zero.".to_string(),
		});
	}
	if cfg.eviction.call_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "eviction.call_timeout_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.ingestion.scoring.keywords = cfg
		.ingestion
		.scoring
		.keywords
		.iter()
		.map(|keyword| keyword.trim().to_lowercase())
		.filter(|keyword| !keyword.is_empty())
		.collect();
	cfg.retrieval.general_types = cfg
		.retrieval
		.general_types
		.iter()
		.map(|doc_type| doc_type.trim().to_string())
		.filter(|doc_type| !doc_type.is_empty())
		.collect();
}
