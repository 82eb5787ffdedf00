use serde::{Deserialize, Serialize};
use time::{
	Date, OffsetDateTime, PrimitiveDateTime, format_description::well_known::Rfc3339,
	macros::format_description,
};

/// Metadata marker for snapshots taken from live feeds. Realtime entries win
/// dedup and outrank everything else during fusion.
pub const REALTIME_DATA_TYPE: &str = "realtime";

/// Stored-side metadata of a knowledge snippet. Every field is optional
/// because feeds disagree on what they annotate.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct DocumentMetadata {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source: Option<String>,
	#[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
	pub doc_type: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub region: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub age_group: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timestamp: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub priority: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data_type: Option<String>,
}

/// A knowledge snippet as produced by a feed, immutable once built.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CandidateDocument {
	pub text: String,
	#[serde(default)]
	pub metadata: DocumentMetadata,
}
impl CandidateDocument {
	pub fn new(text: impl Into<String>, metadata: DocumentMetadata) -> Self {
		Self { text: text.into(), metadata }
	}

	pub fn is_realtime(&self) -> bool {
		self.metadata.data_type.as_deref() == Some(REALTIME_DATA_TYPE)
	}

	pub fn parsed_timestamp(&self) -> Option<OffsetDateTime> {
		self.metadata.timestamp.as_deref().and_then(parse_timestamp)
	}
}

/// Accepts RFC 3339, a bare `YYYY-MM-DDTHH:MM:SS` taken as UTC, or a bare
/// date taken as midnight UTC. Anything else counts as absent; an absent
/// timestamp earns no recency bonus and is never evictable.
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
	let raw = raw.trim();

	if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
		return Some(parsed);
	}
	if let Ok(parsed) = PrimitiveDateTime::parse(
		raw,
		format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
	) {
		return Some(parsed.assume_utc());
	}
	if let Ok(parsed) = Date::parse(raw, format_description!("[year]-[month]-[day]")) {
		return Some(parsed.midnight().assume_utc());
	}

	None
}
