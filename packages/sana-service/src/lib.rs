pub mod enrich;
pub mod evict;
pub mod ingest;
pub mod session;

mod error;
mod fusion;
mod retrieve;

pub use enrich::EnrichedQuery;
pub use error::{Error, Result};
pub use evict::EvictionReport;
pub use ingest::{FeedBatch, IngestionReport, IngestionStatus};
pub use session::DiagnosticHandle;

use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;

use sana_config::{Config, EmbeddingProviderConfig};
use sana_domain::CandidateDocument;
use sana_providers::embedding;
use sana_storage::{BoxFuture, EmbeddingProvider, VectorStore};

/// Bounded, deduplicated, relevance-ranked context for one chat turn.
pub type RankedContext = Vec<CandidateDocument>;

/// The engine behind a conversational health-information assistant: keyed
/// diagnostic sessions, context retrieval, and the knowledge-base lifecycle.
/// The vector store and its embedding backend are constructor-injected.
pub struct SanaService {
	pub cfg: Config,
	pub store: Arc<dyn VectorStore>,
	sessions: session::SessionStore,
	ingestion_lock: AsyncMutex<()>,
}
impl SanaService {
	pub fn new(cfg: Config, store: Arc<dyn VectorStore>) -> Self {
		Self {
			cfg,
			store,
			sessions: session::SessionStore::default(),
			ingestion_lock: AsyncMutex::new(()),
		}
	}

	/// Get-or-create the diagnostic state handle for a session.
	pub fn diagnostic_state(&self, session_id: &str) -> DiagnosticHandle {
		self.sessions.get_or_create(session_id)
	}
}

/// Production provider wiring for the storage seams.
pub struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}
