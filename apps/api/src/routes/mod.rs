pub mod health;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::companies::handlers as companies;
use crate::dropdowns::handlers as dropdowns;
use crate::employees::handlers as employees;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Reference data
        .route("/api/v1/dropdowns/:table", get(dropdowns::handle_get_options))
        .route(
            "/api/v1/dropdowns/:table/last_updated",
            get(dropdowns::handle_last_updated),
        )
        .route(
            "/api/v1/dropdowns/:table/replace",
            post(dropdowns::handle_replace),
        )
        .route(
            "/api/v1/dropdowns/:table/import",
            post(dropdowns::handle_import),
        )
        .route(
            "/api/v1/qualifications/:code/sub_options",
            get(dropdowns::handle_get_sub_options),
        )
        // Tenants
        .route(
            "/api/v1/companies",
            get(companies::handle_list_companies).post(companies::handle_create_company),
        )
        .route(
            "/api/v1/companies/:company_id",
            delete(companies::handle_delete_company),
        )
        // Candidate applications
        .route(
            "/api/v1/companies/:company_id/employees",
            get(employees::handle_list_employees).post(employees::handle_submit_application),
        )
        .route(
            "/api/v1/companies/:company_id/employees/:candidate_id/:position_code",
            get(employees::handle_get_employee).delete(employees::handle_delete_employee),
        )
        .route(
            "/api/v1/companies/:company_id/employees/:candidate_id/:position_code/status",
            patch(employees::handle_update_status),
        )
        .with_state(state)
}
