use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::dropdowns::errors::DropdownError;
use crate::dropdowns::import::parse_csv;
use crate::dropdowns::reader::{lookup_options, qualification_categories, qualification_sub_options};
use crate::dropdowns::records::{DropdownOption, QualificationSubOption, ReplaceBatch};
use crate::dropdowns::store::DropdownStore;
use crate::dropdowns::sync::SyncReport;
use crate::dropdowns::tables::{ColumnMapping, ColumnRegistry, LookupTable, COLUMN_MAPPINGS};
use crate::dropdowns::tenant::TenantScope;

/// Entry point for replacing and reading lookup tables.
#[derive(Clone)]
pub struct DropdownService {
    store: Arc<dyn DropdownStore>,
    registry: ColumnRegistry,
}

impl DropdownService {
    pub fn new(store: Arc<dyn DropdownStore>) -> Self {
        Self::with_registry(store, COLUMN_MAPPINGS)
    }

    pub fn with_registry(store: Arc<dyn DropdownStore>, registry: ColumnRegistry) -> Self {
        Self { store, registry }
    }

    /// Resolves the table and its column mapping. Touches no storage.
    pub fn mapping(&self, dropdown_name: &str) -> Result<&'static ColumnMapping, DropdownError> {
        let table = LookupTable::resolve(dropdown_name)?;
        self.registry.mapping(table)
    }

    /// Makes the stored rows of one tenant scope equal `batch`.
    ///
    /// The scope comes from the batch rows; `requested` only decides which
    /// scope an empty batch wipes.
    pub async fn replace_all(
        &self,
        dropdown_name: &str,
        requested: &TenantScope,
        batch: ReplaceBatch,
    ) -> Result<SyncReport, DropdownError> {
        let mapping = self.mapping(dropdown_name)?;
        let scope = TenantScope::for_batch(requested, batch.tenants())?;
        debug!("Replacing {} for {scope} with {} rows", mapping.table, batch.len());

        let wipe = batch.is_empty();
        match (batch, mapping.table.is_two_level()) {
            (ReplaceBatch::Flat(rows), false) => {
                self.store.sync_lookups(mapping, &scope, rows).await
            }
            (ReplaceBatch::Qualification(rows), true) => {
                self.store.sync_qualifications(mapping, &scope, rows).await
            }
            // An empty flat batch can still wipe a two-level table.
            (ReplaceBatch::Flat(_), true) if wipe => {
                self.store
                    .sync_qualifications(mapping, &scope, Vec::new())
                    .await
            }
            _ => Err(DropdownError::RecordShapeMismatch(
                mapping.table.public_name(),
            )),
        }
    }

    /// Parses a CSV export and replaces `tenant`'s rows with it.
    pub async fn import_csv(
        &self,
        dropdown_name: &str,
        tenant: &TenantScope,
        csv: &str,
    ) -> Result<SyncReport, DropdownError> {
        let mapping = self.mapping(dropdown_name)?;
        let batch = parse_csv(mapping, tenant, csv.as_bytes())?;
        self.replace_all(dropdown_name, tenant, batch).await
    }

    /// Options visible to `tenant` (its own rows plus global rows).
    pub async fn get_options(
        &self,
        dropdown_name: &str,
        tenant: &TenantScope,
    ) -> Result<Vec<DropdownOption>, DropdownError> {
        let mapping = self.mapping(dropdown_name)?;

        if mapping.table.is_two_level() {
            let rows = self
                .store
                .list_visible_qualifications(mapping, tenant, None)
                .await?;
            return Ok(qualification_categories(rows));
        }

        let rows = self.store.list_visible_lookups(mapping, tenant).await?;
        Ok(lookup_options(rows))
    }

    pub async fn get_qualification_sub_options(
        &self,
        main_code: &str,
        tenant: &TenantScope,
    ) -> Result<Vec<QualificationSubOption>, DropdownError> {
        let mapping = self.registry.mapping(LookupTable::Qualification)?;
        let rows = self
            .store
            .list_visible_qualifications(mapping, tenant, Some(main_code))
            .await?;
        Ok(qualification_sub_options(rows, main_code))
    }

    /// Advisory: storage failures degrade to `Ok(None)` ("unknown").
    /// Table resolution errors still propagate.
    pub async fn get_last_updated(
        &self,
        dropdown_name: &str,
        tenant: &TenantScope,
    ) -> Result<Option<DateTime<Utc>>, DropdownError> {
        let mapping = self.mapping(dropdown_name)?;
        match self.store.last_updated(mapping, tenant).await {
            Ok(ts) => Ok(ts),
            Err(e) => {
                warn!("Last-updated lookup for {} ({tenant}) failed: {e}", mapping.table);
                Ok(None)
            }
        }
    }
}
