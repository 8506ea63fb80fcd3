use axum::{http::StatusCode, Json};
use room_core::{build_instance, RoomError};
use serde::Serialize;
use types::Row;

#[derive(Serialize, utoipa::ToSchema)]
pub struct ValidationReport {
    pub ok: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[utoipa::path(
    post,
    path = "/v1/validate",
    request_body = Vec<Row>,
    responses((status = 200, description = "Validation result", body = ValidationReport))
)]
pub async fn validate_handler(Json(rows): Json<Vec<Row>>) -> (StatusCode, Json<ValidationReport>) {
    match build_instance(&rows) {
        Ok(_) => (
            StatusCode::OK,
            Json(ValidationReport {
                ok: true,
                errors: vec![],
            }),
        ),
        Err(RoomError::InvalidInput { row_id, reason }) => (
            StatusCode::OK,
            Json(ValidationReport {
                ok: false,
                errors: vec![format!("{row_id}: {reason}")],
            }),
        ),
        Err(other) => (
            StatusCode::OK,
            Json(ValidationReport {
                ok: false,
                errors: vec![other.to_string()],
            }),
        ),
    }
}
