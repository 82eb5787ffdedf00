use std::collections::HashSet;

use time::OffsetDateTime;

use sana_domain::CandidateDocument;

/// Ranking signals of one candidate, compared descending: realtime entries
/// dominate, then the parsed timestamp (missing or unparsable sorts last),
/// then content length. Full ties keep fan-out emission order.
#[derive(Eq, Ord, PartialEq, PartialOrd)]
struct RankSignals {
	realtime: bool,
	timestamp: Option<OffsetDateTime>,
	content_length: usize,
}
impl RankSignals {
	fn of(doc: &CandidateDocument) -> Self {
		Self {
			realtime: doc.is_realtime(),
			timestamp: doc.parsed_timestamp(),
			content_length: doc.text.len(),
		}
	}
}

/// Dedup by exact text, realtime pass first, then rank and truncate to `k`.
pub(crate) fn fuse(hits: Vec<CandidateDocument>, k: usize) -> Vec<CandidateDocument> {
	let mut seen: HashSet<&str> = HashSet::new();
	let mut keep = vec![false; hits.len()];

	for (index, doc) in hits.iter().enumerate().filter(|(_, doc)| doc.is_realtime()) {
		keep[index] = seen.insert(&doc.text);
	}
	for (index, doc) in hits.iter().enumerate().filter(|(_, doc)| !doc.is_realtime()) {
		keep[index] = seen.insert(&doc.text);
	}

	let mut unique = hits
		.iter()
		.zip(&keep)
		.filter(|(_, keep)| **keep)
		.map(|(doc, _)| doc.clone())
		.collect::<Vec<_>>();

	unique.sort_by(|a, b| RankSignals::of(b).cmp(&RankSignals::of(a)));
	unique.truncate(k);

	unique
}

#[cfg(test)]
mod tests {
	use super::*;
	use sana_domain::{DocumentMetadata, REALTIME_DATA_TYPE};

	fn doc(text: &str, timestamp: Option<&str>) -> CandidateDocument {
		CandidateDocument::new(text, DocumentMetadata {
			timestamp: timestamp.map(str::to_string),
			..DocumentMetadata::default()
		})
	}

	fn realtime_doc(text: &str, timestamp: Option<&str>) -> CandidateDocument {
		CandidateDocument::new(text, DocumentMetadata {
			timestamp: timestamp.map(str::to_string),
			data_type: Some(REALTIME_DATA_TYPE.to_string()),
			..DocumentMetadata::default()
		})
	}

	#[test]
	fn realtime_outranks_everything() {
		let fused = fuse(
			vec![
				doc("long archival entry about treatment", Some("2026-08-29")),
				realtime_doc("outbreak notice", Some("2020-01-01")),
			],
			3,
		);

		assert_eq!(fused[0].text, "outbreak notice");
	}

	#[test]
	fn realtime_wins_dedup_over_a_later_duplicate() {
		let fused = fuse(
			vec![doc("shared text", Some("2026-08-29")), realtime_doc("shared text", None)],
			3,
		);

		assert_eq!(fused.len(), 1);
		assert!(fused[0].is_realtime());
	}

	#[test]
	fn duplicate_realtime_hits_collapse_to_one() {
		let fused =
			fuse(vec![realtime_doc("alert", None), realtime_doc("alert", None)], 3);

		assert_eq!(fused.len(), 1);
	}

	#[test]
	fn output_is_truncated_to_k() {
		let hits = (0..6).map(|index| doc(&format!("entry {index}"), None)).collect();
		let fused = fuse(hits, 3);

		assert_eq!(fused.len(), 3);
	}

	#[test]
	fn newer_timestamps_rank_higher_and_missing_sorts_last() {
		let fused = fuse(
			vec![
				doc("undated", None),
				doc("older", Some("2026-01-01")),
				doc("newer", Some("2026-08-01")),
			],
			3,
		);

		assert_eq!(fused[0].text, "newer");
		assert_eq!(fused[1].text, "older");
		assert_eq!(fused[2].text, "undated");
	}

	#[test]
	fn ties_keep_emission_order() {
		let fused = fuse(vec![doc("aaa", None), doc("bbb", None), doc("ccc", None)], 3);
		let texts = fused.iter().map(|doc| doc.text.as_str()).collect::<Vec<_>>();

		assert_eq!(texts, vec!["aaa", "bbb", "ccc"]);
	}

	#[test]
	fn longer_content_breaks_timestamp_ties() {
		let fused = fuse(
			vec![doc("short", Some("2026-08-01")), doc("much longer entry", Some("2026-08-01"))],
			3,
		);

		assert_eq!(fused[0].text, "much longer entry");
	}
}
