use sqlx::PgPool;

use crate::config::Config;
use crate::dropdowns::DropdownService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pool for company and employee records.
    pub db: PgPool,
    /// Lookup tables. Backed by `PgDropdownStore` in production.
    pub dropdowns: DropdownService,
    #[allow(dead_code)]
    pub config: Config,
}
