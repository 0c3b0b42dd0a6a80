use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{Method, StatusCode},
    Json,
};
use std::sync::Arc;

use super::{HealthResponse, SubmitResponse, SynthesisRequest, VoicesResponse};
use crate::api::routes::AppState;
use crate::error::AppError;
use crate::jobs::{Job, JobId};
use crate::script::Script;
use crate::tts::voice;

pub async fn submit(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SynthesisRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let Json(request) = payload?;

    let script = Script::compile(
        request.model,
        request.mode,
        &request.text,
        &request.voice_config,
    )?;

    // Background work is started, not awaited.
    let job = state.runner.submit(script);

    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { job_id: job.id })))
}

pub async fn status(
    State(state): State<Arc<AppState>>,
    job_id: Result<Path<String>, PathRejection>,
) -> Result<Json<Job>, AppError> {
    let Path(job_id) = job_id?;
    let job_id = JobId::from(job_id);

    state
        .runner
        .store()
        .get(&job_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Job".into()))
}

pub async fn list_voices() -> Json<VoicesResponse> {
    Json(VoicesResponse {
        voices: voice::list(),
    })
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        jobs: state.runner.store().len(),
    })
}

pub async fn only_get() -> AppError {
    AppError::InvalidMethod {
        allowed: Method::GET,
    }
}

pub async fn only_post() -> AppError {
    AppError::InvalidMethod {
        allowed: Method::POST,
    }
}
