//! HTTP service exposing the package cost endpoint.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use heft_core::{is_valid_package_id, CostResolver, FsArtifactStore, FsMetadataStore};
use miette::{IntoDiagnostic, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub struct ServeAction {
    pub host: String,
    pub port: u16,
    pub index: PathBuf,
    pub artifacts: PathBuf,
}

type SharedResolver = Arc<CostResolver<FsMetadataStore, FsArtifactStore>>;

#[derive(Debug, Deserialize)]
struct CostQuery {
    dependency: Option<String>,
}

pub async fn run(action: ServeAction) -> Result<()> {
    let resolver: SharedResolver =
        Arc::new(super::build_resolver(&action.index, &action.artifacts)?);

    let app = Router::new()
        .route("/packages/:id/cost", get(package_cost))
        .with_state(resolver);

    let addr = format!("{}:{}", action.host, action.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .into_diagnostic()?;
    info!(addr = %listener.local_addr().into_diagnostic()?, "cost service listening");

    axum::serve(listener, app).await.into_diagnostic()?;
    Ok(())
}

fn message_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "message": message }))).into_response()
}

/// GET /packages/:id/cost
///
/// With `?dependency=true` the report carries both `standaloneCost` and the
/// transitive `totalCost`; otherwise only `totalCost`, which then equals the
/// standalone size.
async fn package_cost(
    Path(id): Path<String>,
    Query(query): Query<CostQuery>,
    State(resolver): State<SharedResolver>,
) -> Response {
    if !is_valid_package_id(&id) {
        return message_response(StatusCode::BAD_REQUEST, "Missing or invalid PackageID");
    }

    let record = match resolver.lookup(&id) {
        Ok(Some(record)) => record,
        Ok(None) => return message_response(StatusCode::NOT_FOUND, "Package does not exist."),
        Err(e) => {
            warn!(id, error = %e, "metadata lookup failed");
            return message_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Unexpected error occurred.",
            );
        }
    };

    let include_dependencies = query.dependency.as_deref() == Some("true");
    let report = resolver.report(&record, include_dependencies).await;

    match serde_json::to_value(report) {
        Ok(value) => {
            let mut body = serde_json::Map::new();
            body.insert(id, value);
            (StatusCode::OK, Json(serde_json::Value::Object(body))).into_response()
        }
        Err(e) => {
            warn!(error = %e, "failed to serialize cost report");
            message_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Unexpected error occurred.",
            )
        }
    }
}
