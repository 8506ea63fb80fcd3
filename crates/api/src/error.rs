use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use room_core::RoomError;

#[derive(Debug)]
pub struct ApiError(pub RoomError);

impl From<RoomError> for ApiError {
    fn from(err: RoomError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RoomError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            RoomError::Canceled => StatusCode::SERVICE_UNAVAILABLE,
            RoomError::SolverError { .. } | RoomError::InternalError { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.0.to_string()).into_response()
    }
}
