//! In-process store used by tests. Same reconciliation path as Postgres;
//! one write lock stands in for the transaction.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::audit::Audited;
use crate::dropdowns::errors::DropdownError;
use crate::dropdowns::records::{Lookup, LookupRecord, QualificationRecord};
use crate::dropdowns::store::DropdownStore;
use crate::dropdowns::sync::{plan_replace, SyncReport};
use crate::dropdowns::tables::{ColumnMapping, LookupTable};
use crate::dropdowns::tenant::TenantScope;

#[derive(Debug, Default)]
pub struct MemoryDropdownStore {
    lookups: RwLock<HashMap<LookupTable, Vec<Audited<LookupRecord>>>>,
    qualifications: RwLock<Vec<Audited<QualificationRecord>>>,
    fail_reads: bool,
}

impl MemoryDropdownStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose reads all fail with a storage error.
    pub fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    pub fn lookup_rows(&self, table: LookupTable) -> Vec<Audited<LookupRecord>> {
        let lookups = self.lookups.read().unwrap();
        lookups.get(&table).cloned().unwrap_or_default()
    }

    pub fn qualification_rows(&self) -> Vec<Audited<QualificationRecord>> {
        self.qualifications.read().unwrap().clone()
    }

    fn check_reads(&self) -> Result<(), DropdownError> {
        if self.fail_reads {
            return Err(DropdownError::Storage(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

fn replace_scope<T: Lookup>(
    rows: &mut Vec<Audited<T>>,
    table: LookupTable,
    scope: &TenantScope,
    incoming: Vec<T>,
) -> SyncReport {
    let (existing, mut kept): (Vec<_>, Vec<_>) = std::mem::take(rows)
        .into_iter()
        .partition(|row| row.record.tenant() == scope);

    let plan = plan_replace(existing, incoming);
    let unchanged = plan.unchanged.len();
    let sealed = plan.changes.seal(Utc::now());
    let report = SyncReport::new(table, scope.clone(), &sealed, unchanged);

    kept.extend(plan.unchanged);
    kept.extend(sealed.created);
    kept.extend(sealed.modified);
    *rows = kept;

    report
}

#[async_trait]
impl DropdownStore for MemoryDropdownStore {
    async fn sync_lookups(
        &self,
        mapping: &'static ColumnMapping,
        scope: &TenantScope,
        incoming: Vec<LookupRecord>,
    ) -> Result<SyncReport, DropdownError> {
        let mut lookups = self.lookups.write().unwrap();
        let rows = lookups.entry(mapping.table).or_default();
        Ok(replace_scope(rows, mapping.table, scope, incoming))
    }

    async fn sync_qualifications(
        &self,
        mapping: &'static ColumnMapping,
        scope: &TenantScope,
        incoming: Vec<QualificationRecord>,
    ) -> Result<SyncReport, DropdownError> {
        let mut rows = self.qualifications.write().unwrap();
        Ok(replace_scope(&mut rows, mapping.table, scope, incoming))
    }

    async fn list_visible_lookups(
        &self,
        mapping: &'static ColumnMapping,
        tenant: &TenantScope,
    ) -> Result<Vec<LookupRecord>, DropdownError> {
        self.check_reads()?;
        Ok(self
            .lookup_rows(mapping.table)
            .into_iter()
            .map(|row| row.record)
            .filter(|record| tenant.can_see(&record.company_id))
            .collect())
    }

    async fn list_visible_qualifications(
        &self,
        _mapping: &'static ColumnMapping,
        tenant: &TenantScope,
        main_code: Option<&str>,
    ) -> Result<Vec<QualificationRecord>, DropdownError> {
        self.check_reads()?;
        Ok(self
            .qualification_rows()
            .into_iter()
            .map(|row| row.record)
            .filter(|record| tenant.can_see(&record.company_id))
            .filter(|record| main_code.map_or(true, |code| record.code == code))
            .collect())
    }

    async fn last_updated(
        &self,
        mapping: &'static ColumnMapping,
        tenant: &TenantScope,
    ) -> Result<Option<DateTime<Utc>>, DropdownError> {
        self.check_reads()?;
        let latest = if mapping.table.is_two_level() {
            self.qualification_rows()
                .iter()
                .filter(|row| tenant.can_see(&row.record.company_id))
                .map(|row| row.updated_at)
                .max()
        } else {
            self.lookup_rows(mapping.table)
                .iter()
                .filter(|row| tenant.can_see(&row.record.company_id))
                .map(|row| row.updated_at)
                .max()
        };
        Ok(latest)
    }
}
