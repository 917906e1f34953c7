//! `/api/goversion_select`: greatest Go version matching a constraint
//!
//! Query parameters:
//! - `constraint` - constraint expression, defaults to `1.x`
//! - `candidates` - comma-separated versions to pick from instead of the release list
//! - `exclusive` - presence flag; never fall back to the release list

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::error;

use crate::handler::AppState;
use crate::version::error::ResolveError;
use crate::version::resolver::ResolveRequest;

#[derive(Debug, Default, Deserialize)]
pub struct SelectQuery {
    pub constraint: Option<String>,
    pub candidates: Option<String>,
    pub exclusive: Option<String>,
}

impl From<SelectQuery> for ResolveRequest {
    fn from(query: SelectQuery) -> Self {
        Self {
            constraint: query.constraint,
            candidates: query.candidates,
            exclusive: query.exclusive.is_some(),
        }
    }
}

pub async fn goversion_select(
    State(state): State<AppState>,
    Query(query): Query<SelectQuery>,
) -> Result<String, ResolveError> {
    let version = state.resolver.resolve(&query.into()).await?;
    Ok(format!("{version}\n"))
}

impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        let status = match &self {
            ResolveError::InvalidConstraint(_) | ResolveError::InvalidCandidate { .. } => {
                StatusCode::BAD_REQUEST
            }
            ResolveError::NoMatch => StatusCode::NOT_FOUND,
            ResolveError::Unavailable(e) => {
                error!("Version list unavailable: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, format!("{self}\n")).into_response()
    }
}
