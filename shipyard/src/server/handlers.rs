//! HTTP request handlers

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::Stream;
use openapi_server::{DeployRequest, ErrorResponse};
use serde::Serialize;
use tokio_stream::{wrappers::UnboundedReceiverStream, StreamExt};
use tracing::{error, info, warn};

use crate::deploy::pipeline::DeployInput;
use crate::errors::LaunchError;
use crate::progress::{ProgressEmitter, StreamItem};
use crate::server::state::ServerState;
use crate::utils::version_info;

/// Header naming the user a deployment belongs to
pub const OWNER_HEADER: &str = "x-owner-id";
pub const ANONYMOUS_OWNER: &str = "anonymous";

/// SSE event name of the end-of-stream marker
pub const END_EVENT: &str = "end";
pub const END_DATA: &str = "[DONE]";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "shipyard".to_string(),
        version: version.version,
    })
}

/// Version response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}

/// Error returned before a stream opens
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn validation(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse {
                error: "validation_error".to_string(),
                message: message.into(),
                details: None,
            },
        }
    }
}

impl From<LaunchError> for ApiError {
    fn from(err: LaunchError) -> Self {
        match err {
            LaunchError::ValidationError(message) => Self::validation(message),
            other => {
                error!("Request failed: {}", other);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: ErrorResponse {
                        error: "internal_error".to_string(),
                        message: other.to_string(),
                        details: None,
                    },
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn owner_of(headers: &HeaderMap) -> String {
    headers
        .get(OWNER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(ANONYMOUS_OWNER)
        .to_string()
}

fn to_sse(item: StreamItem) -> Result<Event, Infallible> {
    let event = match item {
        StreamItem::Event(event) => match serde_json::to_string(&event) {
            Ok(json) => Event::default().data(json),
            Err(e) => {
                error!("Cannot serialize progress event: {}", e);
                Event::default().comment("unserializable event")
            }
        },
        StreamItem::End => Event::default().event(END_EVENT).data(END_DATA),
    };
    Ok(event)
}

/// Streamed deploy handler.
///
/// Validation failures are answered with 400 before the stream opens. After
/// that every outcome is an event; the pipeline keeps running if the client
/// disconnects.
pub async fn deploy_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    payload: Result<Json<DeployRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    let input = DeployInput::from_request(&owner_of(&headers), request)?;
    info!(
        "Deploy request for {} from {} ({} files)",
        input.project_name,
        input.owner,
        input.files.len()
    );

    let (emitter, rx) = ProgressEmitter::channel();
    let pipeline = state.pipeline.clone();
    tokio::spawn(async move {
        match pipeline.run(input, &emitter).await {
            Ok(outcome) => emitter.complete(&outcome),
            Err(failure) => {
                warn!("Deployment failed ({}): {}", failure.reason(), failure);
                emitter.fail(&failure);
            }
        }
    });

    let stream = UnboundedReceiverStream::new(rx).map(to_sse);
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
