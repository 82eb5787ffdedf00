use std::collections::BTreeMap;

use time::Date;

/// Demographic and cultural profile as captured by the outer application.
/// Read-only input; the engine only derives a [`UserContext`] from it.
#[derive(Clone, Debug, Default)]
pub struct UserProfile {
	pub date_of_birth: Option<Date>,
	pub region: Option<String>,
	pub chronic_conditions: Vec<String>,
	pub traditional_medicine_preferences: BTreeMap<String, bool>,
}

/// The slice of a profile that retrieval actually consumes.
#[derive(Clone, Debug, Default)]
pub struct UserContext {
	pub region: Option<String>,
	pub age_group: Option<String>,
	pub chronic_conditions: Vec<String>,
	pub traditional_medicine_preferences: BTreeMap<String, bool>,
}
impl UserContext {
	pub fn from_profile(profile: &UserProfile, today: Date) -> Self {
		let age_group = profile
			.date_of_birth
			.map(|date_of_birth| age_group_label(age_on(date_of_birth, today)).to_string());

		Self {
			region: profile.region.clone(),
			age_group,
			chronic_conditions: profile.chronic_conditions.clone(),
			traditional_medicine_preferences: profile.traditional_medicine_preferences.clone(),
		}
	}

	/// Practices the user opted into, in stable name order.
	pub fn enabled_practices(&self) -> Vec<&str> {
		self.traditional_medicine_preferences
			.iter()
			.filter(|(_, enabled)| **enabled)
			.map(|(practice, _)| practice.as_str())
			.collect()
	}
}

/// Buckets an age into the labels stored document metadata uses.
pub fn age_group_label(age: i32) -> &'static str {
	if age < 35 {
		"young_adult"
	} else if age < 50 {
		"middle_adult"
	} else if age < 65 {
		"mature_adult"
	} else {
		"elderly"
	}
}

fn age_on(date_of_birth: Date, today: Date) -> i32 {
	let mut age = today.year() - date_of_birth.year();

	if (u8::from(today.month()), today.day())
		< (u8::from(date_of_birth.month()), date_of_birth.day())
	{
		age -= 1;
	}

	age
}
