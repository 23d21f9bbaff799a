// 🛠️ Maintenance endpoints - seed, ad hoc query, health
//
// /seed and /query need a session and are refused in production.

use crate::entities::invoice::fetch_invoices_with_amount;
use crate::seed::seed_database;
use crate::web::auth::CurrentUser;
use crate::web::{ApiError, AppState};
use axum::extract::State;
use axum::response::{IntoResponse, Json};
use serde::Serialize;
use serde_json::{json, Value};

/// Amount (cents) the ad hoc query looks for
const QUERY_AMOUNT: i64 = 666;

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

/// GET /api/health
pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /seed - reseed every table in one transaction
pub async fn seed(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    if !state.config.maintenance_enabled() {
        return Err(ApiError::Forbidden("Forbidden. Seeding is not allowed in production."));
    }

    match state.db(|conn| Ok(seed_database(conn)))? {
        Ok(report) => {
            state.views.clear();
            tracing::info!(user = %user.email, rows = report.collectible_rows(), "database reseeded");
            Ok(Json(json!({ "message": "Database seeded successfully", "report": report })))
        }
        Err(err) => {
            if state.config.is_development() {
                tracing::error!(error = ?err, "seed error");
            }
            Err(ApiError::Failed("Failed to seed database."))
        }
    }
}

/// GET /query - invoices with the flagged amount, joined with customer names
pub async fn query(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    if !state.config.maintenance_enabled() {
        return Err(ApiError::Forbidden(
            "Forbidden. This query endpoint is not available in production.",
        ));
    }

    let rows = state
        .db(|conn| fetch_invoices_with_amount(conn, QUERY_AMOUNT))
        .map_err(|_| ApiError::Failed("Failed to execute query."))?;

    Ok(Json(json!(rows)))
}
