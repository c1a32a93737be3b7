//! Endpoint handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::SharedState;
use crate::error::{RelayError, Result};
use crate::query::GateOutcome;

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateRequest {
    prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateResponse {
    generated_sql: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RunQueryRequest {
    sql: Option<String>,
    confirm: Option<bool>,
}

/// GET / - Service banner.
pub(crate) async fn root(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({
        "message": "TalkToDB backend is running!",
        "docs": "/docs",
        "using_model": state.generator.model(),
        "database": state.config.database.database,
    }))
}

/// GET /docs - Endpoint reference linked from the banner.
pub(crate) async fn docs() -> Json<Value> {
    Json(json!({
        "title": "TalkToDB",
        "endpoints": [
            {
                "method": "GET",
                "path": "/",
                "response": {"message": "string", "docs": "string", "using_model": "string", "database": "string"}
            },
            {
                "method": "GET",
                "path": "/health",
                "response": {"status": "ok"}
            },
            {
                "method": "POST",
                "path": "/generate-sql",
                "request": {"prompt": "string"},
                "response": {"generated_sql": "string"},
                "errors": {"400": "empty prompt", "502": "generation backend failed"}
            },
            {
                "method": "POST",
                "path": "/run-query",
                "request": {"sql": "string", "confirm": "boolean (default false)"},
                "response": [
                    {"type": "SELECT", "rows_returned": "integer", "data": "array of row objects"},
                    {"type": "INSERT | UPDATE | DELETE", "affected_rows": "integer", "message": "string"},
                    {"needs_confirmation": true, "query_type": "INSERT | UPDATE | DELETE", "message": "string"}
                ],
                "errors": {
                    "400": "empty, unsupported or failing SQL",
                    "403": "statement contains DROP, TRUNCATE, ALTER or CREATE"
                }
            }
        ],
        "errors": {"detail": "string"}
    }))
}

/// GET /health - Liveness probe; does not touch the database.
pub(crate) async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /generate-sql - Turn a question into SQL text.
pub(crate) async fn generate_sql(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>> {
    let Json(req) = payload?;
    let prompt = req.prompt.unwrap_or_default();

    let generated_sql = state.generator.generate(&prompt).await?;
    debug!("Generated SQL: {}", generated_sql);

    Ok(Json(GenerateResponse { generated_sql }))
}

/// POST /run-query - Submit SQL to the confirmation gate.
pub(crate) async fn run_query(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<RunQueryRequest>, JsonRejection>,
) -> Result<Json<GateOutcome>> {
    let Json(req) = payload?;
    let sql = req
        .sql
        .ok_or_else(|| RelayError::validation("SQL is required"))?;

    let outcome = state
        .gate
        .submit(&sql, req.confirm.unwrap_or(false))
        .await?;

    Ok(Json(outcome))
}
