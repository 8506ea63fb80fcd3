use crate::state::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use types::{Config, Row};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct OptimizeIn {
    pub rows: Vec<Row>,
    #[serde(default)]
    pub config: Config,
}

#[derive(Serialize, ToSchema)]
pub struct JobCreated {
    pub job_id: String,
    pub status: &'static str,
}

#[utoipa::path(
    post,
    path = "/v1/optimize",
    request_body = OptimizeIn,
    responses((status = 200, description = "Job enqueued", body = JobCreated))
)]
pub async fn optimize(
    State(state): State<AppState>,
    Json(body): Json<OptimizeIn>,
) -> Json<JobCreated> {
    let id = state.jobs.enqueue(body.rows, body.config);
    Json(JobCreated {
        job_id: id.0,
        status: "queued",
    })
}
