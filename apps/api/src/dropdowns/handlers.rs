use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dropdowns::records::{
    DropdownOption, LookupRecord, QualificationRecord, QualificationSubOption, ReplaceBatch,
};
use crate::dropdowns::sync::SyncReport;
use crate::dropdowns::tenant::TenantScope;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CompanyQuery {
    #[serde(default)]
    pub company_id: TenantScope,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceRow {
    pub code: String,
    pub name: String,
    pub sub_code: Option<String>,
    pub sub_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceRequest {
    pub rows: Vec<ReplaceRow>,
}

#[derive(Debug, Serialize)]
pub struct LastUpdatedResponse {
    pub table: String,
    pub company_id: TenantScope,
    /// `null` when unknown.
    pub last_updated: Option<DateTime<Utc>>,
}

/// GET /api/v1/dropdowns/:table
pub async fn handle_get_options(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<CompanyQuery>,
) -> Result<Json<Vec<DropdownOption>>, AppError> {
    let options = state
        .dropdowns
        .get_options(&table, &params.company_id)
        .await?;
    Ok(Json(options))
}

/// GET /api/v1/qualifications/:code/sub_options
pub async fn handle_get_sub_options(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(params): Query<CompanyQuery>,
) -> Result<Json<Vec<QualificationSubOption>>, AppError> {
    let options = state
        .dropdowns
        .get_qualification_sub_options(&code, &params.company_id)
        .await?;
    Ok(Json(options))
}

/// GET /api/v1/dropdowns/:table/last_updated
pub async fn handle_last_updated(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<CompanyQuery>,
) -> Result<Json<LastUpdatedResponse>, AppError> {
    let last_updated = state
        .dropdowns
        .get_last_updated(&table, &params.company_id)
        .await?;
    Ok(Json(LastUpdatedResponse {
        table,
        company_id: params.company_id,
        last_updated,
    }))
}

/// POST /api/v1/dropdowns/:table/replace
pub async fn handle_replace(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<CompanyQuery>,
    Json(req): Json<ReplaceRequest>,
) -> Result<Json<SyncReport>, AppError> {
    let mapping = state.dropdowns.mapping(&table)?;
    let scope = params.company_id;
    let batch = if mapping.table.is_two_level() {
        ReplaceBatch::Qualification(qualification_rows(req.rows, &scope)?)
    } else {
        ReplaceBatch::Flat(
            req.rows
                .into_iter()
                .map(|row| LookupRecord::new(row.code, scope.clone(), row.name))
                .collect(),
        )
    };

    let report = state.dropdowns.replace_all(&table, &scope, batch).await?;
    Ok(Json(report))
}

/// POST /api/v1/dropdowns/:table/import
/// Body is CSV text with the table's declared headers.
pub async fn handle_import(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<CompanyQuery>,
    body: String,
) -> Result<Json<SyncReport>, AppError> {
    let report = state
        .dropdowns
        .import_csv(&table, &params.company_id, &body)
        .await?;
    Ok(Json(report))
}

fn qualification_rows(
    rows: Vec<ReplaceRow>,
    scope: &TenantScope,
) -> Result<Vec<QualificationRecord>, AppError> {
    rows.into_iter()
        .map(|row| {
            let (Some(sub_code), Some(sub_name)) = (row.sub_code, row.sub_name) else {
                return Err(AppError::Validation(format!(
                    "qualification row '{}' requires sub_code and sub_name",
                    row.code
                )));
            };
            Ok(QualificationRecord::new(
                row.code,
                sub_code,
                scope.clone(),
                row.name,
                sub_name,
            ))
        })
        .collect()
}
