use std::{cmp::Ordering, collections::HashSet, time::Duration};

use serde::Serialize;
use time::OffsetDateTime;

use sana_domain::{CandidateDocument, admission_score};
use sana_storage::MetadataFilter;

use crate::{Error, Result, SanaService};

/// One feed's contribution to an ingestion run. The label only shows up in
/// logs.
#[derive(Clone, Debug)]
pub struct FeedBatch {
	pub feed: String,
	pub documents: Vec<CandidateDocument>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionStatus {
	Completed,
	CapacityExceeded,
	StoreUnavailable,
}

#[derive(Clone, Debug, Serialize)]
pub struct IngestionReport {
	pub status: IngestionStatus,
	pub processed: u64,
	pub inserted: u64,
	pub skipped_duplicate: u64,
	pub failed: u64,
	pub vector_count_delta: i64,
}
impl IngestionReport {
	fn aborted(status: IngestionStatus) -> Self {
		Self {
			status,
			processed: 0,
			inserted: 0,
			skipped_duplicate: 0,
			failed: 0,
			vector_count_delta: 0,
		}
	}
}

enum ProbeOutcome {
	Fresh,
	Duplicate,
	Failed,
}

fn identity_key(doc: &CandidateDocument) -> (String, String, String, String, String) {
	(
		doc.metadata.source.clone().unwrap_or_default(),
		doc.metadata.doc_type.clone().unwrap_or_default(),
		doc.metadata.data_type.clone().unwrap_or_default(),
		doc.metadata.timestamp.clone().unwrap_or_default(),
		doc.text.clone(),
	)
}

impl SanaService {
	/// Scores, capacity-bounds, dedup-probes, and batch-inserts a candidate
	/// batch. At most one run at a time; a concurrent invocation gets
	/// [`Error::IngestionInProgress`] instead of queueing.
	pub async fn refresh_knowledge_base(
		&self,
		batches: Vec<FeedBatch>,
	) -> Result<IngestionReport> {
		let Ok(_guard) = self.ingestion_lock.try_lock() else {
			return Err(Error::IngestionInProgress);
		};

		Ok(self.run_ingestion(batches).await)
	}

	async fn run_ingestion(&self, batches: Vec<FeedBatch>) -> IngestionReport {
		let ingestion = &self.cfg.ingestion;
		let bound = Duration::from_millis(ingestion.call_timeout_ms);
		let before = match tokio::time::timeout(bound, self.store.describe_stats()).await {
			Ok(Ok(stats)) => stats,
			Ok(Err(err)) => {
				tracing::warn!(error = %err, "Ingestion aborted, store stats unavailable.");

				return IngestionReport::aborted(IngestionStatus::StoreUnavailable);
			},
			Err(_) => {
				tracing::warn!("Ingestion aborted, store stats query timed out.");

				return IngestionReport::aborted(IngestionStatus::StoreUnavailable);
			},
		};
		let available_space =
			ingestion.max_vectors as i64 - before.total_vector_count as i64;

		if available_space <= 0 {
			tracing::warn!(
				current_vectors = before.total_vector_count,
				max_vectors = ingestion.max_vectors,
				"Ingestion aborted, store is at capacity."
			);

			return IngestionReport::aborted(IngestionStatus::CapacityExceeded);
		}

		for batch in &batches {
			tracing::info!(feed = %batch.feed, count = batch.documents.len(), "Ingestion feed batch received.");
		}

		let now = OffsetDateTime::now_utc();
		let mut scored = batches
			.into_iter()
			.flat_map(|batch| batch.documents)
			.map(|doc| (admission_score(&doc, &ingestion.scoring, now), doc))
			.collect::<Vec<_>>();

		scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
		scored.truncate(usize::try_from(available_space).unwrap_or(usize::MAX));

		let processed = scored.len() as u64;
		let mut inserted = 0u64;
		let mut skipped_duplicate = 0u64;
		let mut failed = 0u64;
		// Identities already staged or confirmed stored this run. Catches
		// duplicate pairs that land in the same batch, which the store probe
		// alone cannot see.
		let mut seen = HashSet::new();

		for chunk in scored.chunks(ingestion.batch_size as usize) {
			let mut staged = Vec::new();

			for (_, doc) in chunk {
				if !seen.insert(identity_key(doc)) {
					skipped_duplicate += 1;

					continue;
				}

				match self.probe_duplicate(doc, bound).await {
					ProbeOutcome::Fresh => staged.push(doc.clone()),
					ProbeOutcome::Duplicate => skipped_duplicate += 1,
					ProbeOutcome::Failed => failed += 1,
				}
			}

			if staged.is_empty() {
				continue;
			}

			let staged_len = staged.len() as u64;

			match tokio::time::timeout(bound, self.store.add_documents(&staged)).await {
				Ok(Ok(())) => inserted += staged_len,
				Ok(Err(err)) => {
					tracing::warn!(error = %err, count = staged_len, "Ingestion batch insert failed.");

					failed += staged_len;
				},
				Err(_) => {
					tracing::warn!(count = staged_len, "Ingestion batch insert timed out.");

					failed += staged_len;
				},
			}
		}

		let vector_count_delta =
			match tokio::time::timeout(bound, self.store.describe_stats()).await {
				Ok(Ok(after)) => {
					after.total_vector_count as i64 - before.total_vector_count as i64
				},
				_ => {
					tracing::warn!("Post-run store stats unavailable, reporting a zero delta.");

					0
				},
			};

		tracing::info!(
			processed,
			inserted,
			skipped_duplicate,
			failed,
			vector_count_delta,
			"Ingestion run finished."
		);

		IngestionReport {
			status: IngestionStatus::Completed,
			processed,
			inserted,
			skipped_duplicate,
			failed,
			vector_count_delta,
		}
	}

	/// Similarity probe scoped to the candidate's identifying metadata. Only
	/// an exact text match among the hits counts as a duplicate.
	async fn probe_duplicate(&self, doc: &CandidateDocument, bound: Duration) -> ProbeOutcome {
		let mut filter = MetadataFilter::new();

		for (field, value) in [
			("source", &doc.metadata.source),
			("type", &doc.metadata.doc_type),
			("data_type", &doc.metadata.data_type),
			("timestamp", &doc.metadata.timestamp),
		] {
			if let Some(value) = value {
				filter = filter.equals(field, value.clone());
			}
		}

		let probe =
			self.store.similarity_search(&doc.text, self.cfg.ingestion.probe_k, &filter);

		match tokio::time::timeout(bound, probe).await {
			Ok(Ok(hits)) => {
				if hits.iter().any(|hit| hit.document.text == doc.text) {
					ProbeOutcome::Duplicate
				} else {
					ProbeOutcome::Fresh
				}
			},
			Ok(Err(err)) => {
				tracing::warn!(error = %err, "Duplicate probe failed.");

				ProbeOutcome::Failed
			},
			Err(_) => {
				tracing::warn!("Duplicate probe timed out.");

				ProbeOutcome::Failed
			},
		}
	}
}
