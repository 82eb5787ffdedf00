use std::time::Duration;

use sana_domain::{CandidateDocument, REALTIME_DATA_TYPE, UserContext};
use sana_storage::MetadataFilter;

use crate::{RankedContext, SanaService, enrich::enrich_query, fusion};

impl SanaService {
	/// One chat turn's retrieval: enrich, fan out over the store partitions,
	/// fuse. Degrades to a smaller (possibly empty) context when the store
	/// misbehaves; it never fails the call.
	pub async fn retrieve_context(
		&self,
		query: &str,
		ctx: Option<&UserContext>,
	) -> RankedContext {
		let enriched = enrich_query(query, ctx);
		let retrieval = &self.cfg.retrieval;
		let mut hits: Vec<CandidateDocument> = Vec::new();

		let realtime_filter = MetadataFilter::new().equals("data_type", REALTIME_DATA_TYPE);

		self.run_partition("realtime", &enriched.text, retrieval.realtime_k, &realtime_filter, &mut hits)
			.await;

		let general_filter =
			MetadataFilter::new().any_of("type", retrieval.general_types.iter().cloned());

		self.run_partition("general", &enriched.text, retrieval.general_k, &general_filter, &mut hits)
			.await;

		let region = enriched.region.as_deref().unwrap_or("general");
		let region_filter = MetadataFilter::new().equals("region", region);

		self.run_partition("region", &enriched.text, retrieval.region_k, &region_filter, &mut hits)
			.await;

		if let Some(age_group) = enriched.age_group.as_deref() {
			let age_filter = MetadataFilter::new().equals("age_group", age_group);

			self.run_partition("age_group", &enriched.text, retrieval.age_group_k, &age_filter, &mut hits)
				.await;
		}
		if let Some(ctx) = ctx {
			for practice in ctx.enabled_practices() {
				let practice_query = format!("{practice} medicine {query}");

				self.run_partition(
					"practice",
					&practice_query,
					retrieval.practice_k,
					&MetadataFilter::new(),
					&mut hits,
				)
				.await;
			}
		}

		fusion::fuse(hits, retrieval.top_k as usize)
	}

	/// One fan-out sub-query. Failures and timeouts degrade to no hits.
	async fn run_partition(
		&self,
		partition: &str,
		query: &str,
		k: u32,
		filter: &MetadataFilter,
		hits: &mut Vec<CandidateDocument>,
	) {
		if k == 0 {
			return;
		}

		let bound = Duration::from_millis(self.cfg.retrieval.query_timeout_ms);

		match tokio::time::timeout(bound, self.store.similarity_search(query, k, filter)).await {
			Ok(Ok(scored)) => hits.extend(scored.into_iter().map(|hit| hit.document)),
			Ok(Err(err)) => {
				tracing::warn!(partition, error = %err, "Fan-out sub-query failed.");
			},
			Err(_) => {
				tracing::warn!(partition, "Fan-out sub-query timed out.");
			},
		}
	}
}
