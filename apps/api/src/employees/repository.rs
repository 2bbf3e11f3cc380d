use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

use crate::audit::{ChangeSet, SealedChanges};
use crate::dropdowns::TenantScope;
use crate::errors::AppError;
use crate::models::employee::{Employee, EmployeeStatus, LookupRef};

/// Candidate-submitted application for one position.
#[derive(Debug, Clone, Deserialize)]
pub struct NewApplication {
    pub candidate_id: String,
    pub position_code: String,
    /// Owner of the chosen position; global when omitted.
    #[serde(default)]
    pub position_company_id: TenantScope,
    pub full_name: String,
    pub email: Option<String>,
    pub salutation: Option<LookupRef>,
    pub marital_status: Option<LookupRef>,
    pub race: Option<LookupRef>,
    pub religion: Option<LookupRef>,
    pub nationality: Option<LookupRef>,
    pub country_origin: Option<LookupRef>,
}

impl NewApplication {
    pub fn into_employee(self, company_id: &str) -> Employee {
        Employee {
            candidate_id: self.candidate_id,
            company_id: company_id.to_string(),
            position_code: self.position_code,
            position_company_id: self.position_company_id,
            full_name: self.full_name,
            email: self.email,
            status: EmployeeStatus::Submitted,
            salutation: self.salutation,
            marital_status: self.marital_status,
            race: self.race,
            religion: self.religion,
            nationality: self.nationality,
            country_origin: self.country_origin,
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
        }
    }
}

const INSERT_EMPLOYEE_SQL: &str = r#"
    INSERT INTO employees
        (candidate_id, company_id, position_code, position_company_id,
         full_name, email, status,
         salutation_code, salutation_company_id,
         marital_status_code, marital_status_company_id,
         race_code, race_company_id,
         religion_code, religion_company_id,
         nationality_code, nationality_company_id,
         country_origin_code, country_origin_company_id,
         created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
            $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
"#;

const UPDATE_STATUS_SQL: &str = r#"
    UPDATE employees SET status = $1, updated_at = $2
    WHERE candidate_id = $3 AND company_id = $4 AND position_code = $5
"#;

const SELECT_EMPLOYEE_SQL: &str = r#"
    SELECT * FROM employees
    WHERE candidate_id = $1 AND company_id = $2 AND position_code = $3
"#;

async fn write_created(
    pool: &PgPool,
    sealed: &SealedChanges<Employee>,
) -> Result<(), AppError> {
    for employee in &sealed.created {
        let mut query = sqlx::query(INSERT_EMPLOYEE_SQL)
            .bind(&employee.candidate_id)
            .bind(&employee.company_id)
            .bind(&employee.position_code)
            .bind(employee.position_company_id.company_id())
            .bind(&employee.full_name)
            .bind(&employee.email)
            .bind(employee.status.as_str());

        for reference in employee.references() {
            let code = reference.as_ref().map(|r| r.code.as_str());
            let owner = reference.as_ref().and_then(|r| r.company_id.company_id());
            query = query.bind(code).bind(owner);
        }

        query
            .bind(employee.created_at)
            .bind(employee.updated_at)
            .execute(pool)
            .await
            .map_err(|e| {
                AppError::from_write(
                    e,
                    &format!(
                        "Application of '{}' for position '{}'",
                        employee.candidate_id, employee.position_code
                    ),
                )
            })?;
    }
    Ok(())
}

/// Records a new application. A candidate may apply to several positions
/// of one company; each position is its own row.
///
/// Position and lookup references must be owned by `company_id` or be
/// global. Missing rows surface as `UnprocessableEntity` from the foreign
/// keys.
pub async fn submit_application(
    pool: &PgPool,
    company_id: &str,
    application: NewApplication,
) -> Result<Employee, AppError> {
    let employee = application.into_employee(company_id);
    if let Some(code) = employee.foreign_reference() {
        return Err(AppError::Validation(format!(
            "'{code}' belongs to another company and cannot be used by '{company_id}'"
        )));
    }

    let mut changes = ChangeSet::new();
    changes.created(employee);
    let sealed = changes.seal(Utc::now());

    write_created(pool, &sealed).await?;

    let employee = sealed
        .created
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("application insert produced no row")))?;
    info!(
        "Candidate {} applied to {} at {company_id}",
        employee.candidate_id, employee.position_code
    );
    Ok(employee)
}

pub async fn get_employee(
    pool: &PgPool,
    company_id: &str,
    candidate_id: &str,
    position_code: &str,
) -> Result<Employee, AppError> {
    sqlx::query_as::<_, Employee>(SELECT_EMPLOYEE_SQL)
        .bind(candidate_id)
        .bind(company_id)
        .bind(position_code)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Application of '{candidate_id}' for '{position_code}' not found"
            ))
        })
}

pub async fn list_employees(pool: &PgPool, company_id: &str) -> Result<Vec<Employee>, AppError> {
    Ok(sqlx::query_as::<_, Employee>(
        "SELECT * FROM employees WHERE company_id = $1 ORDER BY created_at DESC, candidate_id ASC",
    )
    .bind(company_id)
    .fetch_all(pool)
    .await?)
}

/// Admin status change. Rewrites `updated_at` only.
pub async fn update_status(
    pool: &PgPool,
    company_id: &str,
    candidate_id: &str,
    position_code: &str,
    status: EmployeeStatus,
) -> Result<Employee, AppError> {
    let mut tx = pool.begin().await?;

    let mut employee = sqlx::query_as::<_, Employee>(SELECT_EMPLOYEE_SQL)
        .bind(candidate_id)
        .bind(company_id)
        .bind(position_code)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Application of '{candidate_id}' for '{position_code}' not found"
            ))
        })?;

    if employee.status == status {
        return Ok(employee);
    }
    employee.status = status;

    let mut changes = ChangeSet::new();
    changes.modified(employee);
    let sealed = changes.seal(Utc::now());

    for employee in &sealed.modified {
        sqlx::query(UPDATE_STATUS_SQL)
            .bind(employee.status.as_str())
            .bind(employee.updated_at)
            .bind(&employee.candidate_id)
            .bind(&employee.company_id)
            .bind(&employee.position_code)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    info!("Application of {candidate_id} for {position_code} at {company_id} is now {status}");
    sealed
        .modified
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("status update produced no row")))
}

pub async fn delete_employee(
    pool: &PgPool,
    company_id: &str,
    candidate_id: &str,
    position_code: &str,
) -> Result<(), AppError> {
    let result = sqlx::query(
        "DELETE FROM employees WHERE candidate_id = $1 AND company_id = $2 AND position_code = $3",
    )
    .bind(candidate_id)
    .bind(company_id)
    .bind(position_code)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Application of '{candidate_id}' for '{position_code}' not found"
        )));
    }
    Ok(())
}
