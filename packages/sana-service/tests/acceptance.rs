use std::{collections::BTreeSet, sync::Arc};

use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339};

use sana_domain::{CandidateDocument, DocumentMetadata, QuestionFocus, UserContext};
use sana_service::{Error, FeedBatch, IngestionStatus, SanaService};
use sana_testkit::{MemoryVectorStore, dated_doc, doc, realtime_doc, sourced_doc, test_config};

fn service_with(store: Arc<MemoryVectorStore>) -> SanaService {
	SanaService::new(test_config(), store)
}

fn symptoms(values: &[&str]) -> BTreeSet<String> {
	values.iter().map(|value| value.to_string()).collect()
}

fn batch(documents: Vec<CandidateDocument>) -> Vec<FeedBatch> {
	vec![FeedBatch { feed: "test".to_string(), documents }]
}

fn typed_doc(text: &str, doc_type: &str) -> CandidateDocument {
	CandidateDocument::new(text, DocumentMetadata {
		doc_type: Some(doc_type.to_string()),
		..DocumentMetadata::default()
	})
}

fn regional_doc(text: &str, region: &str) -> CandidateDocument {
	CandidateDocument::new(text, DocumentMetadata {
		region: Some(region.to_string()),
		..DocumentMetadata::default()
	})
}

#[test]
fn session_s1_scenario_reaches_readiness() {
	let service = service_with(Arc::new(MemoryVectorStore::new()));
	let handle = service.diagnostic_state("s1");

	handle.update("hurts here", &symptoms(&["pain"]));
	handle.update("since monday", &symptoms(&["pain", "fever"]));

	let state = service.diagnostic_state("s1").snapshot();

	assert_eq!(state.questions_asked(), 2);
	assert_eq!(state.symptoms_collected(), &symptoms(&["pain", "fever"]));
	assert!(state.has_sufficient_information());
	assert_eq!(state.next_question_focus(), QuestionFocus::Severity);
}

#[test]
fn follow_up_question_tracks_the_session_focus() {
	let service = service_with(Arc::new(MemoryVectorStore::new()));
	let handle = service.diagnostic_state("s2");

	assert!(handle.follow_up_question().contains("when these symptoms started"));

	handle.update("it aches", &symptoms(&["backache"]));

	assert_eq!(
		handle.follow_up_question(),
		"Could you describe how the backache feels? For example, is it constant or does it come and go?"
	);
}

#[tokio::test]
async fn retrieval_is_bounded_deduplicated_and_realtime_first() {
	let store = Arc::new(MemoryVectorStore::with_documents([
		realtime_doc("dengue outbreak alert for kerala"),
		typed_doc("fever treatment basics", "treatment"),
		typed_doc("hydration guideline", "guideline"),
		regional_doc("kerala monsoon health advisory", "kerala"),
		regional_doc("kerala ayurveda clinics overview", "kerala"),
	]));
	let service = service_with(store);
	let ctx = UserContext { region: Some("kerala".to_string()), ..UserContext::default() };
	let context = service.retrieve_context("fever remedies", Some(&ctx)).await;

	assert_eq!(context.len(), 3);
	assert!(context[0].is_realtime());

	let mut texts = context.iter().map(|doc| doc.text.as_str()).collect::<Vec<_>>();

	texts.sort_unstable();
	texts.dedup();

	assert_eq!(texts.len(), 3);
}

#[tokio::test]
async fn unreachable_store_degrades_to_an_empty_context() {
	let store = Arc::new(MemoryVectorStore::with_documents([doc("anything")]));

	store.fail_searches(true);

	let service = service_with(store);
	let context = service.retrieve_context("fever remedies", None).await;

	assert!(context.is_empty());
}

#[tokio::test]
async fn ingestion_inserts_fresh_documents_and_reports_the_delta() {
	let store = Arc::new(MemoryVectorStore::new());
	let service = service_with(store.clone());
	let report = service
		.refresh_knowledge_base(batch(vec![
			sourced_doc("malaria prevention overview", "who", None),
			sourced_doc("community remedy notes", "community", None),
		]))
		.await
		.expect("Ingestion must run.");

	assert_eq!(report.status, IngestionStatus::Completed);
	assert_eq!(report.processed, 2);
	assert_eq!(report.inserted, 2);
	assert_eq!(report.skipped_duplicate, 0);
	assert_eq!(report.failed, 0);
	assert_eq!(report.vector_count_delta, 2);
	assert_eq!(store.document_count(), 2);
}

#[tokio::test]
async fn ingestion_selects_at_most_the_available_space_by_score() {
	let store = Arc::new(MemoryVectorStore::with_documents([
		doc("existing one"),
		doc("existing two"),
		doc("existing three"),
	]));
	let mut cfg = test_config();

	cfg.ingestion.max_vectors = 5;

	let service = SanaService::new(cfg, store.clone());
	let report = service
		.refresh_knowledge_base(batch(vec![
			sourced_doc("rumor roundup", "gossip", None),
			sourced_doc("cholera response playbook", "who", None),
			sourced_doc("more rumors", "gossip", None),
			sourced_doc("measles vaccination drive", "who", None),
		]))
		.await
		.expect("Ingestion must run.");

	assert_eq!(report.processed, 2);
	assert_eq!(report.inserted, 2);
	assert_eq!(store.document_count(), 5);

	let texts = store.texts();

	assert!(texts.contains(&"cholera response playbook".to_string()));
	assert!(texts.contains(&"measles vaccination drive".to_string()));
	assert!(!texts.contains(&"rumor roundup".to_string()));
}

#[tokio::test]
async fn full_store_aborts_before_any_write() {
	let store = Arc::new(MemoryVectorStore::with_documents([
		doc("existing one"),
		doc("existing two"),
	]));
	let mut cfg = test_config();

	cfg.ingestion.max_vectors = 2;

	let service = SanaService::new(cfg, store.clone());
	let report = service
		.refresh_knowledge_base(batch(vec![doc("new entry")]))
		.await
		.expect("Ingestion must run.");

	assert_eq!(report.status, IngestionStatus::CapacityExceeded);
	assert_eq!(report.processed, 0);
	assert_eq!(report.inserted, 0);
	assert_eq!(store.document_count(), 2);
}

#[tokio::test]
async fn unavailable_stats_abort_the_run() {
	let store = Arc::new(MemoryVectorStore::new());

	store.fail_stats(true);

	let service = service_with(store.clone());
	let report = service
		.refresh_knowledge_base(batch(vec![doc("new entry")]))
		.await
		.expect("Ingestion must run.");

	assert_eq!(report.status, IngestionStatus::StoreUnavailable);
	assert_eq!(report.inserted, 0);
	assert_eq!(store.document_count(), 0);
}

#[tokio::test]
async fn stored_duplicates_are_skipped_not_reinserted() {
	let store = Arc::new(MemoryVectorStore::with_documents([sourced_doc(
		"malaria prevention overview",
		"who",
		Some("2026-08-01"),
	)]));
	let service = service_with(store.clone());
	let report = service
		.refresh_knowledge_base(batch(vec![sourced_doc(
			"malaria prevention overview",
			"who",
			Some("2026-08-01"),
		)]))
		.await
		.expect("Ingestion must run.");

	assert_eq!(report.skipped_duplicate, 1);
	assert_eq!(report.inserted, 0);
	assert_eq!(store.document_count(), 1);
}

#[tokio::test]
async fn duplicate_pair_within_one_batch_inserts_only_once() {
	let store = Arc::new(MemoryVectorStore::new());
	let service = service_with(store.clone());
	let report = service
		.refresh_knowledge_base(batch(vec![
			sourced_doc("malaria prevention overview", "who", Some("2026-08-01")),
			sourced_doc("malaria prevention overview", "who", Some("2026-08-01")),
		]))
		.await
		.expect("Ingestion must run.");

	assert_eq!(report.inserted, 1);
	assert_eq!(report.skipped_duplicate, 1);
	assert_eq!(store.document_count(), 1);
}

#[tokio::test]
async fn a_failing_batch_does_not_abort_the_run() {
	let store = Arc::new(MemoryVectorStore::new());

	store.fail_next_add();

	let service = service_with(store.clone());
	let documents = (0..6).map(|index| doc(&format!("entry number {index}"))).collect();
	let report = service
		.refresh_knowledge_base(batch(documents))
		.await
		.expect("Ingestion must run.");

	assert_eq!(report.status, IngestionStatus::Completed);
	assert_eq!(report.failed, 4);
	assert_eq!(report.inserted, 2);
	assert_eq!(store.document_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn a_second_concurrent_ingestion_is_rejected() {
	let store = Arc::new(MemoryVectorStore::new());

	store.hang_stats(true);

	let service = Arc::new(service_with(store));
	let background = {
		let service = service.clone();

		tokio::spawn(async move { service.refresh_knowledge_base(batch(vec![doc("entry")])).await })
	};

	tokio::task::yield_now().await;

	let second = service
		.refresh_knowledge_base(Vec::new())
		.await
		.expect_err("Concurrent ingestion must be rejected.");

	assert!(matches!(second, Error::IngestionInProgress));
	assert_eq!(second.to_string(), "An ingestion run is already in progress.");

	let first = background
		.await
		.expect("Background ingestion must not panic.")
		.expect("Background ingestion must run.");

	assert_eq!(first.status, IngestionStatus::StoreUnavailable);
}

#[tokio::test]
async fn eviction_removes_only_old_timestamped_documents() {
	let recent = (OffsetDateTime::now_utc() - Duration::days(5))
		.format(&Rfc3339)
		.expect("Timestamp must format.");
	let store = Arc::new(MemoryVectorStore::with_documents([
		dated_doc("ancient guidance", "2020-01-01"),
		dated_doc("recent advisory", &recent),
		doc("undated reference"),
		dated_doc("not a date at all", "sometime last year"),
	]));
	let service = service_with(store.clone());
	let report = service.evict_stale(30).await;

	assert_eq!(report.scanned, 4);
	assert_eq!(report.removed, 1);

	let texts = store.texts();

	assert!(!texts.contains(&"ancient guidance".to_string()));
	assert!(texts.contains(&"recent advisory".to_string()));
	assert!(texts.contains(&"undated reference".to_string()));
	assert!(texts.contains(&"not a date at all".to_string()));
}

#[tokio::test]
async fn eviction_degrades_when_the_store_fails() {
	let store = Arc::new(MemoryVectorStore::with_documents([dated_doc(
		"ancient guidance",
		"2020-01-01",
	)]));

	store.fail_lists(true);

	let service = service_with(store.clone());
	let report = service.evict_stale(30).await;

	assert_eq!(report.removed, 0);
	assert_eq!(store.document_count(), 1);

	store.fail_lists(false);
	store.fail_deletes(true);

	let report = service.evict_stale(30).await;

	assert_eq!(report.scanned, 1);
	assert_eq!(report.removed, 0);
	assert_eq!(store.document_count(), 1);
}
