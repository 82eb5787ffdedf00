pub mod qdrant;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

use std::{future::Future, pin::Pin};

use sana_config::EmbeddingProviderConfig;
use sana_domain::{CandidateDocument, DocumentMetadata};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Embedding backend boundary. The store embeds query and document texts
/// through this seam so tests can substitute a deterministic provider.
pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

/// Vector similarity store boundary. One production implementation backed by
/// Qdrant lives in [`qdrant`]; tests run against an in-memory substitute.
pub trait VectorStore
where
	Self: Send + Sync,
{
	fn similarity_search<'a>(
		&'a self,
		query: &'a str,
		k: u32,
		filter: &'a MetadataFilter,
	) -> BoxFuture<'a, Result<Vec<ScoredDocument>>>;

	fn add_documents<'a>(&'a self, documents: &'a [CandidateDocument]) -> BoxFuture<'a, Result<()>>;

	fn describe_stats<'a>(&'a self) -> BoxFuture<'a, Result<StoreStats>>;

	fn delete<'a>(&'a self, ids: &'a [String]) -> BoxFuture<'a, Result<()>>;

	fn list_documents<'a>(
		&'a self,
		limit: u32,
		offset: Option<&'a str>,
	) -> BoxFuture<'a, Result<DocumentPage>>;
}

#[derive(Clone, Debug)]
pub struct ScoredDocument {
	pub document: CandidateDocument,
	pub score: f32,
}

#[derive(Clone, Debug)]
pub struct StoredDocument {
	pub id: String,
	pub document: CandidateDocument,
}

#[derive(Clone, Debug, Default)]
pub struct DocumentPage {
	pub documents: Vec<StoredDocument>,
	pub next_offset: Option<String>,
}

#[derive(Clone, Copy, Debug)]
pub struct StoreStats {
	pub total_vector_count: u64,
	pub dimension: u32,
}

/// Conjunctive filter over document metadata fields. Field names match the
/// stored payload keys, so `type` selects [`DocumentMetadata::doc_type`].
#[derive(Clone, Debug, Default)]
pub struct MetadataFilter {
	pub clauses: Vec<FilterClause>,
}

#[derive(Clone, Debug)]
pub enum FilterClause {
	Equals { field: String, value: String },
	AnyOf { field: String, values: Vec<String> },
}

impl MetadataFilter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn equals(mut self, field: &str, value: impl Into<String>) -> Self {
		self.clauses.push(FilterClause::Equals { field: field.to_string(), value: value.into() });

		self
	}

	pub fn any_of(mut self, field: &str, values: impl IntoIterator<Item = String>) -> Self {
		self.clauses
			.push(FilterClause::AnyOf { field: field.to_string(), values: values.into_iter().collect() });

		self
	}

	pub fn is_empty(&self) -> bool {
		self.clauses.is_empty()
	}

	/// Evaluates the filter against a document's metadata. A clause on a
	/// field the document does not carry never matches.
	pub fn matches(&self, metadata: &DocumentMetadata) -> bool {
		self.clauses.iter().all(|clause| match clause {
			FilterClause::Equals { field, value } => {
				metadata_field(metadata, field).is_some_and(|actual| actual == value)
			},
			FilterClause::AnyOf { field, values } => metadata_field(metadata, field)
				.is_some_and(|actual| values.iter().any(|value| value == actual)),
		})
	}
}

fn metadata_field<'a>(metadata: &'a DocumentMetadata, field: &str) -> Option<&'a str> {
	match field {
		"source" => metadata.source.as_deref(),
		"type" => metadata.doc_type.as_deref(),
		"region" => metadata.region.as_deref(),
		"age_group" => metadata.age_group.as_deref(),
		"category" => metadata.category.as_deref(),
		"timestamp" => metadata.timestamp.as_deref(),
		"priority" => metadata.priority.as_deref(),
		"data_type" => metadata.data_type.as_deref(),
		_ => None,
	}
}
