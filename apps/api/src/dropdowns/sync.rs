//! Replace-all reconciliation for lookup tables.
//!
//! Given the rows currently stored for exactly one tenant scope and an
//! incoming batch for the same scope, [`plan_replace`] decides which rows
//! to insert, overwrite, delete, or leave alone. After the plan is written
//! the scope holds exactly the batch keys. Stores run load, plan, seal and
//! write inside a single transaction.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::audit::{Audited, ChangeSet, SealedChanges};
use crate::dropdowns::records::Lookup;
use crate::dropdowns::tables::LookupTable;
use crate::dropdowns::tenant::TenantScope;

/// Outcome of reconciling one scope.
#[derive(Debug)]
pub struct SyncPlan<T> {
    pub changes: ChangeSet<Audited<T>>,
    /// Stored rows the batch matched exactly.
    pub unchanged: Vec<Audited<T>>,
}

/// Reconciles `existing` (one scope only) against `incoming`.
///
/// Incoming rows sharing a key collapse to the last occurrence. An empty
/// batch deletes every existing row.
pub fn plan_replace<T: Lookup>(existing: Vec<Audited<T>>, incoming: Vec<T>) -> SyncPlan<T> {
    let mut stored: BTreeMap<T::Key, Audited<T>> = existing
        .into_iter()
        .map(|row| (row.record.key(), row))
        .collect();

    let mut wanted: BTreeMap<T::Key, T> = BTreeMap::new();
    for record in incoming {
        wanted.insert(record.key(), record);
    }

    let mut changes = ChangeSet::new();
    let mut unchanged = Vec::new();

    for (key, record) in wanted {
        match stored.remove(&key) {
            Some(mut row) => {
                if row.record.apply_update(&record) {
                    changes.modified(row);
                } else {
                    unchanged.push(row);
                }
            }
            None => changes.created(Audited::pending(record)),
        }
    }

    for (_, row) in stored {
        changes.deleted(row);
    }

    SyncPlan { changes, unchanged }
}

/// Summary returned by a replace-all call.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SyncReport {
    pub table: LookupTable,
    pub company_id: TenantScope,
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
}

impl SyncReport {
    pub fn new<T>(
        table: LookupTable,
        scope: TenantScope,
        sealed: &SealedChanges<T>,
        unchanged: usize,
    ) -> Self {
        Self {
            table,
            company_id: scope,
            inserted: sealed.created.len(),
            updated: sealed.modified.len(),
            deleted: sealed.deleted.len(),
            unchanged,
        }
    }

    /// Upserts that changed a row plus deletions.
    pub fn rows_changed(&self) -> usize {
        self.inserted + self.updated + self.deleted
    }
}
