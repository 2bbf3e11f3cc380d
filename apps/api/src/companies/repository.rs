use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;

use crate::audit::ChangeSet;
use crate::errors::AppError;
use crate::models::company::Company;

/// Inserts a company. Duplicate ids surface as `AppError::Conflict`.
pub async fn create_company(pool: &PgPool, id: &str, name: &str) -> Result<Company, AppError> {
    let mut changes = ChangeSet::new();
    changes.created(Company {
        id: id.to_string(),
        name: name.to_string(),
        created_at: DateTime::<Utc>::default(),
        updated_at: DateTime::<Utc>::default(),
    });
    let sealed = changes.seal(Utc::now());

    for company in &sealed.created {
        sqlx::query(
            "INSERT INTO companies (id, name, created_at, updated_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&company.id)
        .bind(&company.name)
        .bind(company.created_at)
        .bind(company.updated_at)
        .execute(pool)
        .await
        .map_err(|e| AppError::from_write(e, &format!("Company '{id}'")))?;
    }

    info!("Created company {id}");
    sealed
        .created
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("company insert produced no row")))
}

pub async fn list_companies(pool: &PgPool) -> Result<Vec<Company>, AppError> {
    Ok(
        sqlx::query_as::<_, Company>("SELECT * FROM companies ORDER BY name ASC, id ASC")
            .fetch_all(pool)
            .await?,
    )
}

/// Deletes a company; its lookup rows and applications cascade.
pub async fn delete_company(pool: &PgPool, id: &str) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM companies WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Company '{id}' not found")));
    }

    info!("Deleted company {id} and its dependent rows");
    Ok(())
}
