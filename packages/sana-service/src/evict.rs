use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;

use crate::SanaService;

#[derive(Clone, Copy, Debug, Serialize)]
pub struct EvictionReport {
	pub scanned: u64,
	pub removed: u64,
}

impl SanaService {
	/// Removes vectors whose parsed timestamp is older than `max_age_days`.
	/// Documents with a missing or unparsable timestamp are never selected.
	/// Store failure degrades to a zero-removal report.
	pub async fn evict_stale(&self, max_age_days: i64) -> EvictionReport {
		let bound = Duration::from_millis(self.cfg.eviction.call_timeout_ms);
		let page_size = self.cfg.eviction.page_size;
		let now = OffsetDateTime::now_utc();
		let mut scanned = 0u64;
		let mut stale_ids = Vec::new();
		let mut offset: Option<String> = None;

		loop {
			let page = self.store.list_documents(page_size, offset.as_deref());
			let page = match tokio::time::timeout(bound, page).await {
				Ok(Ok(page)) => page,
				Ok(Err(err)) => {
					tracing::warn!(error = %err, "Eviction scan failed.");

					return EvictionReport { scanned, removed: 0 };
				},
				Err(_) => {
					tracing::warn!("Eviction scan timed out.");

					return EvictionReport { scanned, removed: 0 };
				},
			};

			scanned += page.documents.len() as u64;

			for stored in &page.documents {
				let Some(timestamp) = stored.document.parsed_timestamp() else {
					continue;
				};

				if (now - timestamp).whole_days() > max_age_days {
					stale_ids.push(stored.id.clone());
				}
			}

			match page.next_offset {
				Some(next) => offset = Some(next),
				None => break,
			}
		}

		if stale_ids.is_empty() {
			return EvictionReport { scanned, removed: 0 };
		}

		let removed = stale_ids.len() as u64;

		match tokio::time::timeout(bound, self.store.delete(&stale_ids)).await {
			Ok(Ok(())) => {
				tracing::info!(scanned, removed, max_age_days, "Eviction run finished.");

				EvictionReport { scanned, removed }
			},
			Ok(Err(err)) => {
				tracing::warn!(error = %err, "Eviction delete failed.");

				EvictionReport { scanned, removed: 0 }
			},
			Err(_) => {
				tracing::warn!("Eviction delete timed out.");

				EvictionReport { scanned, removed: 0 }
			},
		}
	}
}
