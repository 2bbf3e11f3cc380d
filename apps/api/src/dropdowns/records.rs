use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::dropdowns::tenant::TenantScope;

/// Capability every lookup entity shares, so reconciliation is written once.
pub trait Lookup: Clone + Debug + Send + Sync + 'static {
    type Key: Ord + Clone + Debug + Send;

    /// Identity within one tenant scope.
    fn key(&self) -> Self::Key;

    fn tenant(&self) -> &TenantScope;

    /// Overwrites every non-key field from `other`.
    /// Returns `false` when nothing differed.
    fn apply_update(&mut self, other: &Self) -> bool;
}

/// A row of any single-level lookup table (salutations, races, jobs, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRecord {
    pub code: String,
    #[serde(default)]
    pub company_id: TenantScope,
    pub name: String,
}

impl LookupRecord {
    pub fn new(code: impl Into<String>, company_id: TenantScope, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            company_id,
            name: name.into(),
        }
    }
}

impl Lookup for LookupRecord {
    type Key = String;

    fn key(&self) -> String {
        self.code.clone()
    }

    fn tenant(&self) -> &TenantScope {
        &self.company_id
    }

    fn apply_update(&mut self, other: &Self) -> bool {
        if self.name == other.name {
            return false;
        }
        self.name.clone_from(&other.name);
        true
    }
}

/// A row of the two-level qualification table: category plus sub-category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationRecord {
    pub code: String,
    pub sub_code: String,
    #[serde(default)]
    pub company_id: TenantScope,
    pub name: String,
    pub sub_name: String,
}

impl QualificationRecord {
    pub fn new(
        code: impl Into<String>,
        sub_code: impl Into<String>,
        company_id: TenantScope,
        name: impl Into<String>,
        sub_name: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            sub_code: sub_code.into(),
            company_id,
            name: name.into(),
            sub_name: sub_name.into(),
        }
    }
}

impl Lookup for QualificationRecord {
    type Key = (String, String);

    fn key(&self) -> (String, String) {
        (self.code.clone(), self.sub_code.clone())
    }

    fn tenant(&self) -> &TenantScope {
        &self.company_id
    }

    fn apply_update(&mut self, other: &Self) -> bool {
        if self.name == other.name && self.sub_name == other.sub_name {
            return false;
        }
        self.name.clone_from(&other.name);
        self.sub_name.clone_from(&other.sub_name);
        true
    }
}

/// One selectable option as served to forms.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DropdownOption {
    pub code: String,
    pub name: String,
}

/// One qualification sub-category option.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QualificationSubOption {
    pub sub_code: String,
    pub sub_name: String,
}

/// Incoming rows for a replace, shaped by the target table.
#[derive(Debug, Clone)]
pub enum ReplaceBatch {
    Flat(Vec<LookupRecord>),
    Qualification(Vec<QualificationRecord>),
}

impl ReplaceBatch {
    pub fn len(&self) -> usize {
        match self {
            ReplaceBatch::Flat(rows) => rows.len(),
            ReplaceBatch::Qualification(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tenants(&self) -> Vec<&TenantScope> {
        match self {
            ReplaceBatch::Flat(rows) => rows.iter().map(Lookup::tenant).collect(),
            ReplaceBatch::Qualification(rows) => rows.iter().map(Lookup::tenant).collect(),
        }
    }
}
