pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("An ingestion run is already in progress.")]
	IngestionInProgress,
}
