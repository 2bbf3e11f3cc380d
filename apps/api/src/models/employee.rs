use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use crate::audit::Auditable;
use crate::dropdowns::TenantScope;

/// Review state of a candidate application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    Submitted,
    Reviewing,
    Shortlisted,
    Rejected,
    Hired,
}

impl EmployeeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EmployeeStatus::Submitted => "submitted",
            EmployeeStatus::Reviewing => "reviewing",
            EmployeeStatus::Shortlisted => "shortlisted",
            EmployeeStatus::Rejected => "rejected",
            EmployeeStatus::Hired => "hired",
        }
    }
}

impl fmt::Display for EmployeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmployeeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(EmployeeStatus::Submitted),
            "reviewing" => Ok(EmployeeStatus::Reviewing),
            "shortlisted" => Ok(EmployeeStatus::Shortlisted),
            "rejected" => Ok(EmployeeStatus::Rejected),
            "hired" => Ok(EmployeeStatus::Hired),
            other => Err(format!("unknown employee status '{other}'")),
        }
    }
}

/// Reference to a lookup row: its code plus the owning scope, since a
/// company's form may offer both its own rows and global ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRef {
    pub code: String,
    #[serde(default)]
    pub company_id: TenantScope,
}

/// One candidate's application to one position within one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Employee {
    pub candidate_id: String,
    pub company_id: String,
    pub position_code: String,
    /// Owner of the position row: the company itself, or global.
    pub position_company_id: TenantScope,
    pub full_name: String,
    pub email: Option<String>,
    pub status: EmployeeStatus,
    pub salutation: Option<LookupRef>,
    pub marital_status: Option<LookupRef>,
    pub race: Option<LookupRef>,
    pub religion: Option<LookupRef>,
    pub nationality: Option<LookupRef>,
    pub country_origin: Option<LookupRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    /// Lookup references in column order: salutation, marital status, race,
    /// religion, nationality, country of origin.
    pub fn references(&self) -> [&Option<LookupRef>; 6] {
        [
            &self.salutation,
            &self.marital_status,
            &self.race,
            &self.religion,
            &self.nationality,
            &self.country_origin,
        ]
    }

    /// First reference, position included, owned by a company other than
    /// this application's. Such references are refused.
    pub fn foreign_reference(&self) -> Option<&str> {
        let own = TenantScope::company(self.company_id.as_str());
        let foreign = |scope: &TenantScope| !scope.is_global() && *scope != own;

        if foreign(&self.position_company_id) {
            return Some(self.position_code.as_str());
        }
        self.references()
            .into_iter()
            .flatten()
            .find(|r| foreign(&r.company_id))
            .map(|r| r.code.as_str())
    }
}

fn read_ref(row: &PgRow, prefix: &str) -> sqlx::Result<Option<LookupRef>> {
    let code: Option<String> = row.try_get(format!("{prefix}_code").as_str())?;
    let company_id: Option<String> = row.try_get(format!("{prefix}_company_id").as_str())?;
    Ok(code.map(|code| LookupRef {
        code,
        company_id: TenantScope::stored(company_id),
    }))
}

impl<'r> FromRow<'r, PgRow> for Employee {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;
        Ok(Self {
            candidate_id: row.try_get("candidate_id")?,
            company_id: row.try_get("company_id")?,
            position_code: row.try_get("position_code")?,
            position_company_id: TenantScope::stored(row.try_get("position_company_id")?),
            full_name: row.try_get("full_name")?,
            email: row.try_get("email")?,
            status: status.parse().map_err(|e: String| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: e.into(),
            })?,
            salutation: read_ref(row, "salutation")?,
            marital_status: read_ref(row, "marital_status")?,
            race: read_ref(row, "race")?,
            religion: read_ref(row, "religion")?,
            nationality: read_ref(row, "nationality")?,
            country_origin: read_ref(row, "country_origin")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl Auditable for Employee {
    fn mark_created(&mut self, now: DateTime<Utc>) {
        self.created_at = now;
        self.updated_at = now;
    }

    fn mark_modified(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            EmployeeStatus::Submitted,
            EmployeeStatus::Reviewing,
            EmployeeStatus::Shortlisted,
            EmployeeStatus::Rejected,
            EmployeeStatus::Hired,
        ] {
            assert_eq!(status.as_str().parse::<EmployeeStatus>().unwrap(), status);
        }
        assert!("archived".parse::<EmployeeStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&EmployeeStatus::Shortlisted).unwrap();
        assert_eq!(json, "\"shortlisted\"");
    }

    fn application(company_id: &str) -> Employee {
        Employee {
            candidate_id: "C-1".to_string(),
            company_id: company_id.to_string(),
            position_code: "DEV".to_string(),
            position_company_id: TenantScope::global(),
            full_name: "Ada Lovelace".to_string(),
            email: None,
            status: EmployeeStatus::Submitted,
            salutation: None,
            marital_status: None,
            race: None,
            religion: None,
            nationality: None,
            country_origin: None,
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
        }
    }

    #[test]
    fn test_own_and_global_references_are_accepted() {
        let mut employee = application("ACME");
        employee.race = Some(LookupRef {
            code: "MY".to_string(),
            company_id: TenantScope::company("ACME"),
        });
        employee.salutation = Some(LookupRef {
            code: "MR".to_string(),
            company_id: TenantScope::global(),
        });
        assert_eq!(employee.foreign_reference(), None);
    }

    #[test]
    fn test_other_tenant_reference_is_reported() {
        let mut employee = application("ACME");
        employee.race = Some(LookupRef {
            code: "MY".to_string(),
            company_id: TenantScope::company("OTHER"),
        });
        assert_eq!(employee.foreign_reference(), Some("MY"));

        let mut employee = application("ACME");
        employee.position_company_id = TenantScope::company("OTHER");
        assert_eq!(employee.foreign_reference(), Some("DEV"));
    }

    #[test]
    fn test_lookup_ref_defaults_to_global() {
        let r: LookupRef = serde_json::from_str(r#"{"code":"MR"}"#).unwrap();
        assert!(r.company_id.is_global());
    }
}
