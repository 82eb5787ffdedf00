use sana_domain::UserContext;

/// Enriched query text plus the filter inputs derived from the same context.
#[derive(Clone, Debug)]
pub struct EnrichedQuery {
	pub text: String,
	pub region: Option<String>,
	pub age_group: Option<String>,
}

/// Appends, in fixed order, the practice clause, the condition clause, and
/// the region clause. The order front-loads the keywords most likely to match
/// the store's embedding signal.
pub fn enrich_query(raw: &str, ctx: Option<&UserContext>) -> EnrichedQuery {
	let Some(ctx) = ctx else {
		return EnrichedQuery {
			text: format!("{raw} for general region"),
			region: None,
			age_group: None,
		};
	};
	let mut text = raw.to_string();

	if !ctx.traditional_medicine_preferences.is_empty() {
		let practices = ctx
			.traditional_medicine_preferences
			.keys()
			.map(String::as_str)
			.collect::<Vec<_>>()
			.join(", ");

		text.push_str(&format!(" including {practices} approaches"));
	}
	if !ctx.chronic_conditions.is_empty() {
		text.push_str(&format!(
			" considering conditions: {}",
			ctx.chronic_conditions.join(", ")
		));
	}

	text.push_str(&format!(" for {} region", ctx.region.as_deref().unwrap_or("general")));

	EnrichedQuery { text, region: ctx.region.clone(), age_group: ctx.age_group.clone() }
}
