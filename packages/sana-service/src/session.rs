use std::{
	collections::{BTreeSet, HashMap},
	sync::{Arc, Mutex},
};

use sana_domain::{DiagnosticState, QuestionFocus, follow_up_question};

/// Process-wide diagnostic state map. Distinct sessions contend only on the
/// brief map lock; same-session read-modify-write serializes on the
/// per-session mutex held inside the handle.
#[derive(Default)]
pub(crate) struct SessionStore {
	sessions: Mutex<HashMap<String, Arc<Mutex<DiagnosticState>>>>,
}
impl SessionStore {
	pub(crate) fn get_or_create(&self, session_id: &str) -> DiagnosticHandle {
		let mut sessions = self.sessions.lock().unwrap_or_else(|err| err.into_inner());
		let state = sessions
			.entry(session_id.to_string())
			.or_insert_with(|| Arc::new(Mutex::new(DiagnosticState::new())))
			.clone();

		DiagnosticHandle { state }
	}
}

/// Shared handle to one session's diagnostic state.
#[derive(Clone)]
pub struct DiagnosticHandle {
	state: Arc<Mutex<DiagnosticState>>,
}
impl DiagnosticHandle {
	pub fn update(&self, response: &str, symptoms: &BTreeSet<String>) {
		self.state.lock().unwrap_or_else(|err| err.into_inner()).update(response, symptoms);
	}

	pub fn snapshot(&self) -> DiagnosticState {
		self.state.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn has_sufficient_information(&self) -> bool {
		self.state.lock().unwrap_or_else(|err| err.into_inner()).has_sufficient_information()
	}

	pub fn next_question_focus(&self) -> QuestionFocus {
		self.state.lock().unwrap_or_else(|err| err.into_inner()).next_question_focus()
	}

	/// Follow-up prompt for the current focus, specialized with the
	/// collected symptoms.
	pub fn follow_up_question(&self) -> String {
		let state = self.state.lock().unwrap_or_else(|err| err.into_inner());

		follow_up_question(state.next_question_focus(), state.symptoms_collected())
	}
}

#[cfg(test)]
mod tests {
	use std::thread;

	use super::*;

	fn symptoms(values: &[&str]) -> BTreeSet<String> {
		values.iter().map(|value| value.to_string()).collect()
	}

	#[test]
	fn handles_for_the_same_session_share_state() {
		let store = SessionStore::default();
		let first = store.get_or_create("s1");
		let second = store.get_or_create("s1");

		first.update("hurts here", &symptoms(&["pain"]));

		assert_eq!(second.snapshot().questions_asked(), 1);
	}

	#[test]
	fn sessions_are_isolated() {
		let store = SessionStore::default();
		let one = store.get_or_create("s1");
		let other = store.get_or_create("s2");

		one.update("hurts here", &symptoms(&["pain"]));

		assert_eq!(other.snapshot().questions_asked(), 0);
	}

	#[test]
	fn concurrent_updates_to_one_session_all_land() {
		let store = Arc::new(SessionStore::default());
		let mut workers = Vec::new();

		for index in 0..8 {
			let store = store.clone();

			workers.push(thread::spawn(move || {
				let handle = store.get_or_create("shared");

				handle.update(&format!("turn {index}"), &symptoms(&["pain"]));
			}));
		}
		for worker in workers {
			worker.join().expect("Worker thread panicked.");
		}

		let state = store.get_or_create("shared").snapshot();

		assert_eq!(state.questions_asked(), 8);
		assert_eq!(state.symptoms_collected(), &symptoms(&["pain"]));
	}
}
