use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::dropdowns::errors::DropdownError;
use crate::dropdowns::records::{LookupRecord, QualificationRecord};
use crate::dropdowns::sync::SyncReport;
use crate::dropdowns::tables::ColumnMapping;
use crate::dropdowns::tenant::TenantScope;

/// Storage backend for lookup tables.
///
/// Sync methods must load, reconcile (via `plan_replace`), seal and write the
/// scope as one atomic unit. Reads are plain snapshot reads with no locking.
///
/// Carried in `AppState` as `Arc<dyn DropdownStore>`.
#[async_trait]
pub trait DropdownStore: Send + Sync {
    async fn sync_lookups(
        &self,
        mapping: &'static ColumnMapping,
        scope: &TenantScope,
        incoming: Vec<LookupRecord>,
    ) -> Result<SyncReport, DropdownError>;

    async fn sync_qualifications(
        &self,
        mapping: &'static ColumnMapping,
        scope: &TenantScope,
        incoming: Vec<QualificationRecord>,
    ) -> Result<SyncReport, DropdownError>;

    /// Rows owned by `tenant` plus global rows, unordered.
    async fn list_visible_lookups(
        &self,
        mapping: &'static ColumnMapping,
        tenant: &TenantScope,
    ) -> Result<Vec<LookupRecord>, DropdownError>;

    /// Visible qualification rows, optionally restricted to one category code.
    async fn list_visible_qualifications(
        &self,
        mapping: &'static ColumnMapping,
        tenant: &TenantScope,
        main_code: Option<&str>,
    ) -> Result<Vec<QualificationRecord>, DropdownError>;

    /// Latest `updated_at` across rows visible to `tenant`.
    async fn last_updated(
        &self,
        mapping: &'static ColumnMapping,
        tenant: &TenantScope,
    ) -> Result<Option<DateTime<Utc>>, DropdownError>;
}
