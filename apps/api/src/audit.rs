//! Audit timestamping at the persistence boundary.
//!
//! Writers never set `created_at` / `updated_at` themselves. They collect
//! every pending change for one transaction into a [`ChangeSet`], then call
//! [`ChangeSet::seal`] exactly once before the physical write. Repositories
//! only accept [`SealedChanges`], so an unstamped write does not type-check.

use chrono::{DateTime, Utc};

/// Entities carrying creation and modification timestamps.
pub trait Auditable {
    /// Called once, when the entity is first inserted.
    fn mark_created(&mut self, now: DateTime<Utc>);
    /// Called on every modification of an existing entity.
    fn mark_modified(&mut self, now: DateTime<Utc>);
}

/// Wraps a record with its audit columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Audited<T> {
    pub record: T,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<T> Audited<T> {
    /// A record that has not been persisted yet. Timestamps are placeholders
    /// until the change set is sealed.
    pub fn pending(record: T) -> Self {
        Self {
            record,
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
        }
    }

    pub fn stored(record: T, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        Self {
            record,
            created_at,
            updated_at,
        }
    }
}

impl<T> Auditable for Audited<T> {
    fn mark_created(&mut self, now: DateTime<Utc>) {
        self.created_at = now;
        self.updated_at = now;
    }

    fn mark_modified(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[derive(Debug, Clone)]
enum PendingChange<T> {
    Created(T),
    Modified(T),
    Deleted(T),
}

/// All changes one transaction intends to write.
#[derive(Debug, Clone)]
pub struct ChangeSet<T> {
    pending: Vec<PendingChange<T>>,
}

impl<T> Default for ChangeSet<T> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<T: Auditable> ChangeSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&mut self, entity: T) {
        self.pending.push(PendingChange::Created(entity));
    }

    pub fn modified(&mut self, entity: T) {
        self.pending.push(PendingChange::Modified(entity));
    }

    pub fn deleted(&mut self, entity: T) {
        self.pending.push(PendingChange::Deleted(entity));
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Stamps every pending change with a single `now`, consuming the set.
    pub fn seal(self, now: DateTime<Utc>) -> SealedChanges<T> {
        let mut sealed = SealedChanges {
            stamped_at: now,
            created: Vec::new(),
            modified: Vec::new(),
            deleted: Vec::new(),
        };

        for change in self.pending {
            match change {
                PendingChange::Created(mut entity) => {
                    entity.mark_created(now);
                    sealed.created.push(entity);
                }
                PendingChange::Modified(mut entity) => {
                    entity.mark_modified(now);
                    sealed.modified.push(entity);
                }
                PendingChange::Deleted(entity) => sealed.deleted.push(entity),
            }
        }

        sealed
    }
}

/// Stamped changes, ready to be written.
#[derive(Debug, Clone)]
pub struct SealedChanges<T> {
    pub stamped_at: DateTime<Utc>,
    pub created: Vec<T>,
    pub modified: Vec<T>,
    pub deleted: Vec<T>,
}

impl<T> SealedChanges<T> {
    /// Rows inserted, updated or deleted.
    pub fn touched(&self) -> usize {
        self.created.len() + self.modified.len() + self.deleted.len()
    }
}
