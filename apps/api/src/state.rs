use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::matching::MatchingPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Wraps the provider chosen at startup from `config.provider`.
    pub pipeline: MatchingPipeline,
    /// Every supported catalog, loaded once. Read-only.
    pub catalogs: CatalogStore,
    pub config: Config,
}
