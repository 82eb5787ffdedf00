use sana_config::Scoring;
use time::OffsetDateTime;

use crate::document::CandidateDocument;

/// Admission score for a candidate. Higher scores enter the store first when
/// capacity runs short. Base weight comes from the source-reliability table;
/// recency, length, and clinical-keyword bonuses stack on top.
pub fn admission_score(doc: &CandidateDocument, weights: &Scoring, now: OffsetDateTime) -> f32 {
	let mut score = doc
		.metadata
		.source
		.as_deref()
		.and_then(|source| weights.source_weights.get(source).copied())
		.unwrap_or(weights.default_source_weight);

	if let Some(timestamp) = doc.parsed_timestamp() {
		let age_days = (now - timestamp).whole_days();

		if age_days < weights.fresh_days {
			score += weights.fresh_bonus;
		} else if age_days < weights.recent_days {
			score += weights.recent_bonus;
		}
	}
	if doc.text.len() > weights.min_length as usize {
		score += weights.length_bonus;
	}

	let lowered = doc.text.to_lowercase();

	if weights.keywords.iter().any(|keyword| lowered.contains(keyword)) {
		score += weights.keyword_bonus;
	}

	score
}
