use std::{collections::HashMap, sync::Arc};

use qdrant_client::{
	Payload, Qdrant,
	qdrant::{
		Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointId,
		PointStruct, Query, QueryPointsBuilder, ScrollPointsBuilder, UpsertPointsBuilder, Value,
		VectorParamsBuilder, point_id::PointIdOptions, value::Kind,
	},
};
use uuid::Uuid;

use crate::{
	BoxFuture, DocumentPage, EmbeddingProvider, Error, FilterClause, MetadataFilter, Result,
	ScoredDocument, StoreStats, StoredDocument, VectorStore,
};
use sana_config::EmbeddingProviderConfig;
use sana_domain::{CandidateDocument, DocumentMetadata};

pub struct QdrantVectorStore {
	pub client: Qdrant,
	pub collection: String,
	pub vector_dim: u32,
	embedding_cfg: EmbeddingProviderConfig,
	embedding: Arc<dyn EmbeddingProvider>,
}
impl QdrantVectorStore {
	pub fn new(
		cfg: &sana_config::Qdrant,
		embedding_cfg: EmbeddingProviderConfig,
		embedding: Arc<dyn EmbeddingProvider>,
	) -> Result<Self> {
		let client = Qdrant::from_url(&cfg.url).build()?;

		Ok(Self {
			client,
			collection: cfg.collection.clone(),
			vector_dim: cfg.vector_dim,
			embedding_cfg,
			embedding,
		})
	}

	/// Creates the collection if it is missing. Idempotent.
	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(self.collection.clone()).await? {
			return Ok(());
		}

		self.client
			.create_collection(CreateCollectionBuilder::new(self.collection.clone()).vectors_config(
				VectorParamsBuilder::new(self.vector_dim as u64, Distance::Cosine),
			))
			.await?;

		Ok(())
	}

	async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
		let embedded = self.embedding.embed(&self.embedding_cfg, &[text.to_string()]).await?;
		let Some(vector) = embedded.into_iter().next() else {
			return Err(Error::Provider {
				message: "Embedding provider returned no vectors.".to_string(),
			});
		};

		if vector.len() != self.vector_dim as usize {
			return Err(Error::Provider {
				message: "Embedding vector dimension mismatch.".to_string(),
			});
		}

		Ok(vector)
	}
}

impl VectorStore for QdrantVectorStore {
	fn similarity_search<'a>(
		&'a self,
		query: &'a str,
		k: u32,
		filter: &'a MetadataFilter,
	) -> BoxFuture<'a, Result<Vec<ScoredDocument>>> {
		Box::pin(async move {
			let vector = self.embed_one(query).await?;
			let mut search = QueryPointsBuilder::new(self.collection.clone())
				.query(Query::new_nearest(vector))
				.with_payload(true)
				.limit(k as u64);

			if !filter.is_empty() {
				search = search.filter(to_qdrant_filter(filter));
			}

			let response = self.client.query(search).await?;
			let hits = response
				.result
				.iter()
				.map(|point| ScoredDocument {
					document: to_document(&point.payload),
					score: point.score,
				})
				.collect();

			Ok(hits)
		})
	}

	fn add_documents<'a>(
		&'a self,
		documents: &'a [CandidateDocument],
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			if documents.is_empty() {
				return Ok(());
			}

			let texts = documents.iter().map(|doc| doc.text.clone()).collect::<Vec<_>>();
			let embedded = self.embedding.embed(&self.embedding_cfg, &texts).await?;

			if embedded.len() != documents.len() {
				return Err(Error::Provider {
					message: "Embedding provider returned mismatched vector count.".to_string(),
				});
			}

			let mut points = Vec::with_capacity(documents.len());

			for (doc, vector) in documents.iter().zip(embedded) {
				if vector.len() != self.vector_dim as usize {
					return Err(Error::Provider {
						message: "Embedding vector dimension mismatch.".to_string(),
					});
				}

				points.push(PointStruct::new(
					Uuid::new_v4().to_string(),
					vector,
					to_payload(doc),
				));
			}

			self.client
				.upsert_points(UpsertPointsBuilder::new(self.collection.clone(), points).wait(true))
				.await?;

			Ok(())
		})
	}

	fn describe_stats<'a>(&'a self) -> BoxFuture<'a, Result<StoreStats>> {
		Box::pin(async move {
			let info = self.client.collection_info(self.collection.clone()).await?;
			let total_vector_count =
				info.result.and_then(|info| info.points_count).unwrap_or_default();

			Ok(StoreStats { total_vector_count, dimension: self.vector_dim })
		})
	}

	fn delete<'a>(&'a self, ids: &'a [String]) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			if ids.is_empty() {
				return Ok(());
			}

			let ids = ids.iter().map(|id| PointId::from(id.clone())).collect::<Vec<_>>();

			self.client
				.delete_points(
					DeletePointsBuilder::new(self.collection.clone()).points(ids).wait(true),
				)
				.await?;

			Ok(())
		})
	}

	fn list_documents<'a>(
		&'a self,
		limit: u32,
		offset: Option<&'a str>,
	) -> BoxFuture<'a, Result<DocumentPage>> {
		Box::pin(async move {
			let mut scroll =
				ScrollPointsBuilder::new(self.collection.clone()).limit(limit).with_payload(true);

			if let Some(offset) = offset {
				scroll = scroll.offset(PointId::from(offset.to_string()));
			}

			let response = self.client.scroll(scroll).await?;
			let documents = response
				.result
				.iter()
				.map(|point| StoredDocument {
					id: point.id.as_ref().and_then(point_id_text).unwrap_or_default(),
					document: to_document(&point.payload),
				})
				.collect();
			let next_offset = response.next_page_offset.as_ref().and_then(point_id_text);

			Ok(DocumentPage { documents, next_offset })
		})
	}
}

fn to_qdrant_filter(filter: &MetadataFilter) -> Filter {
	let mut must = Vec::new();

	for clause in &filter.clauses {
		match clause {
			FilterClause::Equals { field, value } => {
				must.push(Condition::matches(field.clone(), value.clone()));
			},
			FilterClause::AnyOf { field, values } => {
				must.push(Condition::matches(field.clone(), values.clone()));
			},
		}
	}

	Filter::must(must)
}

fn to_payload(doc: &CandidateDocument) -> Payload {
	let mut payload = Payload::new();

	payload.insert("text", doc.text.clone());

	for (key, value) in [
		("source", &doc.metadata.source),
		("type", &doc.metadata.doc_type),
		("region", &doc.metadata.region),
		("age_group", &doc.metadata.age_group),
		("category", &doc.metadata.category),
		("timestamp", &doc.metadata.timestamp),
		("priority", &doc.metadata.priority),
		("data_type", &doc.metadata.data_type),
	] {
		if let Some(value) = value {
			payload.insert(key, value.clone());
		}
	}

	payload
}

fn to_document(payload: &HashMap<String, Value>) -> CandidateDocument {
	CandidateDocument {
		text: payload_str(payload, "text").unwrap_or_default(),
		metadata: DocumentMetadata {
			source: payload_str(payload, "source"),
			doc_type: payload_str(payload, "type"),
			region: payload_str(payload, "region"),
			age_group: payload_str(payload, "age_group"),
			category: payload_str(payload, "category"),
			timestamp: payload_str(payload, "timestamp"),
			priority: payload_str(payload, "priority"),
			data_type: payload_str(payload, "data_type"),
		},
	}
}

fn payload_str(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	payload.get(key).and_then(|value| match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.clone()),
		_ => None,
	})
}

fn point_id_text(id: &PointId) -> Option<String> {
	match &id.point_id_options {
		Some(PointIdOptions::Uuid(value)) => Some(value.clone()),
		Some(PointIdOptions::Num(value)) => Some(value.to_string()),
		None => None,
	}
}
