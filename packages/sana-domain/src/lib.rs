pub mod diagnostic;
pub mod document;
pub mod profile;
pub mod scoring;

pub use diagnostic::{
	DiagnosticState, DiagnosticTurn, QuestionFocus, extract_symptoms, follow_up_question,
};
pub use document::{CandidateDocument, DocumentMetadata, REALTIME_DATA_TYPE, parse_timestamp};
pub use profile::{UserContext, UserProfile, age_group_label};
pub use scoring::admission_score;
