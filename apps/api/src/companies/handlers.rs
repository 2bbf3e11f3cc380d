use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::companies::repository::{create_company, delete_company, list_companies};
use crate::errors::AppError;
use crate::models::company::Company;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    pub id: String,
    pub name: String,
}

impl CreateCompanyRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.id.trim().is_empty() {
            return Err(AppError::Validation("company id must not be blank".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("company name must not be blank".to_string()));
        }
        Ok(())
    }
}

/// POST /api/v1/companies
pub async fn handle_create_company(
    State(state): State<AppState>,
    Json(req): Json<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<Company>), AppError> {
    req.validate()?;
    let company = create_company(&state.db, req.id.trim(), req.name.trim()).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

/// GET /api/v1/companies
pub async fn handle_list_companies(
    State(state): State<AppState>,
) -> Result<Json<Vec<Company>>, AppError> {
    Ok(Json(list_companies(&state.db).await?))
}

/// DELETE /api/v1/companies/:id
pub async fn handle_delete_company(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    delete_company(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
