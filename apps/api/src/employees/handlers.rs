use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::employees::repository::{
    delete_employee, get_employee, list_employees, submit_application, update_status,
    NewApplication,
};
use crate::errors::AppError;
use crate::models::employee::{Employee, EmployeeStatus};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: EmployeeStatus,
}

/// GET /api/v1/companies/:company_id/employees
pub async fn handle_list_employees(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
) -> Result<Json<Vec<Employee>>, AppError> {
    Ok(Json(list_employees(&state.db, &company_id).await?))
}

/// POST /api/v1/companies/:company_id/employees
pub async fn handle_submit_application(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    Json(req): Json<NewApplication>,
) -> Result<(StatusCode, Json<Employee>), AppError> {
    if req.candidate_id.trim().is_empty() || req.position_code.trim().is_empty() {
        return Err(AppError::Validation(
            "candidate_id and position_code are required".to_string(),
        ));
    }
    let employee = submit_application(&state.db, &company_id, req).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

/// GET /api/v1/companies/:company_id/employees/:candidate_id/:position_code
pub async fn handle_get_employee(
    State(state): State<AppState>,
    Path((company_id, candidate_id, position_code)): Path<(String, String, String)>,
) -> Result<Json<Employee>, AppError> {
    let employee = get_employee(&state.db, &company_id, &candidate_id, &position_code).await?;
    Ok(Json(employee))
}

/// PATCH /api/v1/companies/:company_id/employees/:candidate_id/:position_code/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path((company_id, candidate_id, position_code)): Path<(String, String, String)>,
    Json(req): Json<StatusChange>,
) -> Result<Json<Employee>, AppError> {
    let employee = update_status(
        &state.db,
        &company_id,
        &candidate_id,
        &position_code,
        req.status,
    )
    .await?;
    Ok(Json(employee))
}

/// DELETE /api/v1/companies/:company_id/employees/:candidate_id/:position_code
pub async fn handle_delete_employee(
    State(state): State<AppState>,
    Path((company_id, candidate_id, position_code)): Path<(String, String, String)>,
) -> Result<StatusCode, AppError> {
    delete_employee(&state.db, &company_id, &candidate_id, &position_code).await?;
    Ok(StatusCode::NO_CONTENT)
}
