//! Deterministic test doubles and fixtures. The in-memory store ranks by
//! token overlap, which is close enough to embedding similarity for the
//! behaviors under test and keeps every test hermetic.

use std::sync::{
	Mutex,
	atomic::{AtomicBool, AtomicU64, Ordering},
};

use sana_config::{
	Config, EmbeddingProviderConfig, Eviction, Ingestion, Providers, Qdrant, Retrieval, Scoring,
	Service, Storage,
};
use sana_domain::{CandidateDocument, DocumentMetadata, REALTIME_DATA_TYPE};
use sana_storage::{
	BoxFuture, DocumentPage, Error, MetadataFilter, Result, ScoredDocument, StoreStats,
	StoredDocument, VectorStore,
};

const TEST_VECTOR_DIM: u32 = 8;

/// A config with small, fast bounds. Tests mutate the fields they care about.
pub fn test_config() -> Config {
	Config {
		service: Service { log_level: "debug".to_string() },
		storage: Storage {
			qdrant: Qdrant {
				url: "http://127.0.0.1:6334".to_string(),
				collection: "sana_test".to_string(),
				vector_dim: TEST_VECTOR_DIM,
				request_timeout_ms: 1_000,
			},
		},
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:0".to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/embeddings".to_string(),
				model: "test-embedding".to_string(),
				dimensions: TEST_VECTOR_DIM,
				timeout_ms: 1_000,
				default_headers: serde_json::Map::new(),
			},
		},
		retrieval: Retrieval::default(),
		ingestion: Ingestion {
			max_vectors: 1_000,
			batch_size: 4,
			probe_k: 3,
			call_timeout_ms: 1_000,
			scoring: Scoring::default(),
		},
		eviction: Eviction::default(),
	}
}

pub fn doc(text: &str) -> CandidateDocument {
	CandidateDocument::new(text, DocumentMetadata::default())
}

pub fn dated_doc(text: &str, timestamp: &str) -> CandidateDocument {
	CandidateDocument::new(text, DocumentMetadata {
		timestamp: Some(timestamp.to_string()),
		..DocumentMetadata::default()
	})
}

pub fn realtime_doc(text: &str) -> CandidateDocument {
	CandidateDocument::new(text, DocumentMetadata {
		data_type: Some(REALTIME_DATA_TYPE.to_string()),
		priority: Some("high".to_string()),
		..DocumentMetadata::default()
	})
}

pub fn sourced_doc(text: &str, source: &str, timestamp: Option<&str>) -> CandidateDocument {
	CandidateDocument::new(text, DocumentMetadata {
		source: Some(source.to_string()),
		timestamp: timestamp.map(str::to_string),
		..DocumentMetadata::default()
	})
}

struct StoredRecord {
	id: String,
	document: CandidateDocument,
}

/// In-memory [`VectorStore`] with per-operation fault injection. Ranking is
/// query-token overlap with insertion order breaking ties.
#[derive(Default)]
pub struct MemoryVectorStore {
	records: Mutex<Vec<StoredRecord>>,
	next_id: AtomicU64,
	fail_search: AtomicBool,
	fail_add: AtomicBool,
	fail_next_add: AtomicBool,
	fail_stats: AtomicBool,
	hang_stats: AtomicBool,
	fail_list: AtomicBool,
	fail_delete: AtomicBool,
}
impl MemoryVectorStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_documents(documents: impl IntoIterator<Item = CandidateDocument>) -> Self {
		let store = Self::default();

		for document in documents {
			store.insert(document);
		}

		store
	}

	/// Inserts directly, bypassing any admission path, and returns the id.
	pub fn insert(&self, document: CandidateDocument) -> String {
		let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
		let mut records = self.records.lock().unwrap_or_else(|err| err.into_inner());

		records.push(StoredRecord { id: id.clone(), document });

		id
	}

	pub fn fail_searches(&self, fail: bool) {
		self.fail_search.store(fail, Ordering::SeqCst);
	}

	pub fn fail_adds(&self, fail: bool) {
		self.fail_add.store(fail, Ordering::SeqCst);
	}

	/// Fails only the next `add_documents` call, then clears itself.
	pub fn fail_next_add(&self) {
		self.fail_next_add.store(true, Ordering::SeqCst);
	}

	pub fn fail_stats(&self, fail: bool) {
		self.fail_stats.store(fail, Ordering::SeqCst);
	}

	/// Makes `describe_stats` pend forever, so callers exercise their
	/// timeout path.
	pub fn hang_stats(&self, hang: bool) {
		self.hang_stats.store(hang, Ordering::SeqCst);
	}

	pub fn fail_lists(&self, fail: bool) {
		self.fail_list.store(fail, Ordering::SeqCst);
	}

	pub fn fail_deletes(&self, fail: bool) {
		self.fail_delete.store(fail, Ordering::SeqCst);
	}

	pub fn document_count(&self) -> usize {
		self.records.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn texts(&self) -> Vec<String> {
		self.records
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.iter()
			.map(|record| record.document.text.clone())
			.collect()
	}

	fn unavailable(op: &str) -> Error {
		Error::Unavailable { message: format!("Injected {op} fault.") }
	}
}

fn overlap_score(query: &str, text: &str) -> f32 {
	let query_tokens = tokens(query);

	if query_tokens.is_empty() {
		return 0.0;
	}

	let text_tokens = tokens(text);
	let shared = query_tokens.iter().filter(|token| text_tokens.contains(*token)).count();

	shared as f32 / query_tokens.len() as f32
}

fn tokens(value: &str) -> Vec<String> {
	value.to_lowercase().split_whitespace().map(str::to_string).collect()
}

impl VectorStore for MemoryVectorStore {
	fn similarity_search<'a>(
		&'a self,
		query: &'a str,
		k: u32,
		filter: &'a MetadataFilter,
	) -> BoxFuture<'a, Result<Vec<ScoredDocument>>> {
		Box::pin(async move {
			if self.fail_search.load(Ordering::SeqCst) {
				return Err(Self::unavailable("search"));
			}

			let records = self.records.lock().unwrap_or_else(|err| err.into_inner());
			let mut hits = records
				.iter()
				.filter(|record| filter.matches(&record.document.metadata))
				.map(|record| ScoredDocument {
					document: record.document.clone(),
					score: overlap_score(query, &record.document.text),
				})
				.collect::<Vec<_>>();

			hits.sort_by(|a, b| {
				b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal)
			});
			hits.truncate(k as usize);

			Ok(hits)
		})
	}

	fn add_documents<'a>(
		&'a self,
		documents: &'a [CandidateDocument],
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			if self.fail_add.load(Ordering::SeqCst) || self.fail_next_add.swap(false, Ordering::SeqCst)
			{
				return Err(Self::unavailable("add"));
			}

			for document in documents {
				self.insert(document.clone());
			}

			Ok(())
		})
	}

	fn describe_stats<'a>(&'a self) -> BoxFuture<'a, Result<StoreStats>> {
		Box::pin(async move {
			if self.hang_stats.load(Ordering::SeqCst) {
				std::future::pending::<()>().await;
			}
			if self.fail_stats.load(Ordering::SeqCst) {
				return Err(Self::unavailable("stats"));
			}

			Ok(StoreStats {
				total_vector_count: self.document_count() as u64,
				dimension: TEST_VECTOR_DIM,
			})
		})
	}

	fn delete<'a>(&'a self, ids: &'a [String]) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			if self.fail_delete.load(Ordering::SeqCst) {
				return Err(Self::unavailable("delete"));
			}

			let mut records = self.records.lock().unwrap_or_else(|err| err.into_inner());

			records.retain(|record| !ids.contains(&record.id));

			Ok(())
		})
	}

	fn list_documents<'a>(
		&'a self,
		limit: u32,
		offset: Option<&'a str>,
	) -> BoxFuture<'a, Result<DocumentPage>> {
		Box::pin(async move {
			if self.fail_list.load(Ordering::SeqCst) {
				return Err(Self::unavailable("list"));
			}

			let records = self.records.lock().unwrap_or_else(|err| err.into_inner());
			let start = match offset {
				Some(offset) => records
					.iter()
					.position(|record| record.id == offset)
					.unwrap_or(records.len()),
				None => 0,
			};
			let end = (start + limit as usize).min(records.len());
			let documents = records[start..end]
				.iter()
				.map(|record| StoredDocument {
					id: record.id.clone(),
					document: record.document.clone(),
				})
				.collect();
			let next_offset = records.get(end).map(|record| record.id.clone());

			Ok(DocumentPage { documents, next_offset })
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn block_on<T>(future: impl std::future::Future<Output = T>) -> T {
		use std::task::{Context, Poll, Waker};

		let mut future = Box::pin(future);
		let mut context = Context::from_waker(Waker::noop());

		match future.as_mut().poll(&mut context) {
			Poll::Ready(value) => value,
			Poll::Pending => unreachable!("Memory store futures resolve immediately."),
		}
	}

	#[test]
	fn exact_text_ranks_first() {
		let store = MemoryVectorStore::with_documents([
			doc("seasonal flu guidance"),
			doc("dengue fever outbreak response"),
		]);
		let hits = block_on(store.similarity_search(
			"dengue fever outbreak response",
			2,
			&MetadataFilter::new(),
		))
		.expect("Search must succeed.");

		assert_eq!(hits[0].document.text, "dengue fever outbreak response");
		assert!(hits[0].score > hits[1].score);
	}

	#[test]
	fn pagination_walks_all_records_once() {
		let store = MemoryVectorStore::with_documents(
			(0..5).map(|index| doc(&format!("entry {index}"))),
		);
		let mut offset: Option<String> = None;
		let mut collected = Vec::new();

		loop {
			let page = block_on(store.list_documents(2, offset.as_deref()))
				.expect("List must succeed.");

			collected.extend(page.documents.into_iter().map(|stored| stored.document.text));

			match page.next_offset {
				Some(next) => offset = Some(next),
				None => break,
			}
		}

		assert_eq!(collected.len(), 5);
	}

	#[test]
	fn injected_faults_surface_as_errors() {
		let store = MemoryVectorStore::new();

		store.fail_stats(true);

		assert!(block_on(store.describe_stats()).is_err());

		store.fail_stats(false);

		assert!(block_on(store.describe_stats()).is_ok());
	}
}
