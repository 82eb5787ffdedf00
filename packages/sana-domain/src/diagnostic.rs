use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// What the assistant should probe for next, driven by how many follow-up
/// questions were already asked. Clamps at `AdditionalInfo` instead of
/// cycling.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionFocus {
	DurationLocation,
	Characteristics,
	Severity,
	AssociatedSymptoms,
	AdditionalInfo,
}
impl QuestionFocus {
	pub fn for_questions_asked(questions_asked: u32) -> Self {
		match questions_asked {
			0 => Self::DurationLocation,
			1 => Self::Characteristics,
			2 => Self::Severity,
			3 => Self::AssociatedSymptoms,
			_ => Self::AdditionalInfo,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::DurationLocation => "duration_location",
			Self::Characteristics => "characteristics",
			Self::Severity => "severity",
			Self::AssociatedSymptoms => "associated_symptoms",
			Self::AdditionalInfo => "additional_info",
		}
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct DiagnosticTurn {
	pub response: String,
	pub symptoms: Vec<String>,
}

/// Per-session symptom-collection bookkeeping. Mutated only through
/// [`update`](DiagnosticState::update); there is no terminal state, the
/// machine keeps accepting turns after readiness.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DiagnosticState {
	questions_asked: u32,
	symptoms_collected: BTreeSet<String>,
	history: Vec<DiagnosticTurn>,
}
impl DiagnosticState {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn update(&mut self, response: &str, symptoms: &BTreeSet<String>) {
		self.questions_asked += 1;
		self.symptoms_collected.extend(symptoms.iter().cloned());
		self.history.push(DiagnosticTurn {
			response: response.to_string(),
			symptoms: symptoms.iter().cloned().collect(),
		});
	}

	pub fn questions_asked(&self) -> u32 {
		self.questions_asked
	}

	pub fn symptoms_collected(&self) -> &BTreeSet<String> {
		&self.symptoms_collected
	}

	pub fn history(&self) -> &[DiagnosticTurn] {
		&self.history
	}

	pub fn next_question_focus(&self) -> QuestionFocus {
		QuestionFocus::for_questions_asked(self.questions_asked)
	}

	/// True once two distinct symptoms were collected or two follow-up
	/// questions were answered, whichever comes first.
	pub fn has_sufficient_information(&self) -> bool {
		self.symptoms_collected.len() >= 2 || self.questions_asked >= 2
	}
}

/// Lowercased whitespace tokens of the message. Deliberately naive; the
/// store's embedding signal does the real symptom matching downstream.
pub fn extract_symptoms(message: &str) -> BTreeSet<String> {
	message.to_lowercase().split_whitespace().map(|token| token.to_string()).collect()
}

/// Follow-up prompt for the given focus, specialized around the collected
/// symptoms when there are any.
pub fn follow_up_question(focus: QuestionFocus, symptoms: &BTreeSet<String>) -> String {
	if let Some(first) = symptoms.iter().next() {
		match focus {
			QuestionFocus::DurationLocation => {
				return format!(
					"When did you first notice the {first} and where exactly do you experience it?"
				);
			},
			QuestionFocus::Characteristics => {
				return format!(
					"Could you describe how the {first} feels? For example, is it constant or does it come and go?"
				);
			},
			QuestionFocus::Severity => {
				return format!(
					"On a scale of 1-10, how severe is the {first}? Has this changed since it started?"
				);
			},
			QuestionFocus::AssociatedSymptoms => {
				let listed = symptoms.iter().cloned().collect::<Vec<_>>().join(", ");

				return format!("Besides {listed}, have you noticed any other symptoms?");
			},
			QuestionFocus::AdditionalInfo => {},
		}
	}

	match focus {
		QuestionFocus::DurationLocation => {
			"Could you tell me when these symptoms started and where exactly you're experiencing them?"
		},
		QuestionFocus::Characteristics => {
			"How would you describe the symptoms - their nature, pattern, and any specific triggers you've noticed?"
		},
		QuestionFocus::Severity => {
			"On a scale of 1-10, how would you rate the severity of your symptoms? Has this changed over time?"
		},
		QuestionFocus::AssociatedSymptoms => {
			"Have you noticed any other symptoms occurring alongside these main concerns?"
		},
		QuestionFocus::AdditionalInfo => {
			"Is there anything else you'd like to share about your symptoms or health concerns?"
		},
	}
	.to_string()
}
