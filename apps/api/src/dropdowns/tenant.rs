use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dropdowns::errors::DropdownError;

/// Owning tenant of a lookup row. `None` is the global partition, shared by
/// every company as a fallback.
///
/// Blank or whitespace-only ids mean global. Ids arriving over the wire with
/// surrounding whitespace are rejected rather than trimmed, so `" ACME "`
/// never aliases `"ACME"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Option<String>", into = "Option<String>")]
pub struct TenantScope(Option<String>);

impl TenantScope {
    pub fn global() -> Self {
        TenantScope(None)
    }

    pub fn company(id: impl Into<String>) -> Self {
        TenantScope::stored(Some(id.into()))
    }

    /// Scope of a value read back from storage, where ids are already clean.
    pub fn stored(value: Option<String>) -> Self {
        TenantScope(value.filter(|s| !s.trim().is_empty()))
    }

    pub fn company_id(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_global(&self) -> bool {
        self.0.is_none()
    }

    /// Whether a row owned by `row_scope` is visible to this tenant:
    /// its own rows plus global rows. The global scope sees only global rows.
    pub fn can_see(&self, row_scope: &TenantScope) -> bool {
        row_scope.is_global() || row_scope == self
    }

    /// Determines the scope a replace batch operates on.
    ///
    /// A non-empty batch carries its own scope, and every row must agree. An
    /// empty batch falls back to `requested`, which is then wiped.
    pub fn for_batch<'a, I>(requested: &TenantScope, batch: I) -> Result<TenantScope, DropdownError>
    where
        I: IntoIterator<Item = &'a TenantScope>,
    {
        let mut tenants = batch.into_iter();
        let Some(first) = tenants.next() else {
            return Ok(requested.clone());
        };

        if let Some(other) = tenants.find(|t| *t != first) {
            return Err(DropdownError::MixedTenantBatch {
                first: first.to_string(),
                second: other.to_string(),
            });
        }

        if first != requested {
            return Err(DropdownError::TenantScopeMismatch {
                requested: requested.to_string(),
                batch: first.to_string(),
            });
        }

        Ok(first.clone())
    }
}

impl TryFrom<Option<String>> for TenantScope {
    type Error = DropdownError;

    fn try_from(value: Option<String>) -> Result<Self, Self::Error> {
        match value {
            Some(id) if !id.trim().is_empty() && id.trim() != id => {
                Err(DropdownError::InvalidTenantId(id))
            }
            other => Ok(TenantScope::stored(other)),
        }
    }
}

impl From<TenantScope> for Option<String> {
    fn from(value: TenantScope) -> Self {
        value.0
    }
}

impl fmt::Display for TenantScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(id) => write!(f, "company '{id}'"),
            None => f.write_str("global"),
        }
    }
}
