use axum::{
    routing::{get, post},
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
    extract::{Query, State},
};

use chrono::{DateTime, Utc};
use tracing::{debug, error};
use serde::{Serialize, Deserialize};
use std::collections::HashMap;

use crate::state::app_state::AppState;
use windcube_reader::{
    CancellationToken, Catalog, CatalogItem, DataSource, NoProgress, ReadRequest, SampleBuffer,
    WindCubeError,
};

#[derive(Deserialize, Debug)]
pub struct PathQuery {
    pub path: String,
}

#[derive(Deserialize, Debug)]
pub struct AvailabilityQuery {
    pub path: String,
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Serialize, Debug)]
pub struct TimeRangeResponse {
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Serialize, Debug)]
pub struct AvailabilityResponse {
    pub availability: f64,
}

#[derive(Deserialize, Debug)]
pub struct ReadItem {
    pub path: String,
    pub resource: String,
}

#[derive(Deserialize, Debug)]
pub struct ReadBody {
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub items: Vec<ReadItem>,
}

#[derive(Serialize, Debug)]
pub struct ReadResponse {
    pub path: String,
    pub resource: String,
    pub data: Vec<f64>,
    pub status: Vec<u8>,
}


/// =======================
/// ROUTER
/// =======================

pub fn data_routes(state: AppState) -> Router {
    Router::new()
        .route("/catalog", get(catalog))
        .route("/time-range", get(time_range))
        .route("/availability", get(availability))
        .route("/read", post(read))
        .with_state(state)
}

fn error_response(e: WindCubeError) -> Response {
    let status = match e {
        WindCubeError::Schema(_) => StatusCode::NOT_FOUND,
        WindCubeError::InvalidWindow(_)
        | WindCubeError::BufferSize { .. }
        | WindCubeError::UnsupportedRepresentation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("request failed: {}", e);
    }

    (status, e.to_string()).into_response()
}


/// =======================
/// HANDLERS
/// =======================

async fn catalog(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> Response {
    debug!("catalog requested: {}", query.path);

    match state.source.get_catalog(&query.path).await {
        Ok(catalog) => Json(catalog).into_response(),
        Err(e) => error_response(e),
    }
}

async fn time_range(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> Response {
    match state.source.get_time_range(&query.path).await {
        Ok((begin, end)) => Json(TimeRangeResponse { begin, end }).into_response(),
        Err(e) => error_response(e),
    }
}

async fn availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Response {
    match state
        .source
        .get_availability(&query.path, query.begin, query.end)
        .await
    {
        Ok(availability) => Json(AvailabilityResponse { availability }).into_response(),
        Err(e) => error_response(e),
    }
}

async fn read(
    State(state): State<AppState>,
    Json(body): Json<ReadBody>,
) -> Response {
    debug!("read requested: {} items [{}, {})", body.items.len(), body.begin, body.end);

    let slots = match state.source.grid().slots_in_window(body.begin, body.end) {
        Ok(slots) => slots,
        Err(e) => return error_response(e),
    };

    // One catalog lookup per distinct path
    let mut catalogs: HashMap<String, Catalog> = HashMap::new();
    let mut items = Vec::with_capacity(body.items.len());

    for requested in &body.items {
        if !catalogs.contains_key(&requested.path) {
            match state.source.get_catalog(&requested.path).await {
                Ok(catalog) => {
                    catalogs.insert(requested.path.clone(), catalog);
                }
                Err(e) => return error_response(e),
            }
        }

        let catalog = &catalogs[&requested.path];
        let Some(resource) = catalog.resources.iter().find(|r| r.id == requested.resource) else {
            return (
                StatusCode::NOT_FOUND,
                format!("resource {} not found in {}", requested.resource, requested.path),
            )
                .into_response();
        };

        items.push(CatalogItem::new(catalog, resource, &resource.representations[0]));
    }

    let mut buffers: Vec<SampleBuffer> = items.iter().map(|_| SampleBuffer::new(slots)).collect();
    let mut requests: Vec<ReadRequest<'_>> = items
        .into_iter()
        .zip(buffers.iter_mut())
        .map(|(item, buffer)| ReadRequest::new(item, buffer))
        .collect();

    let result = state
        .source
        .read(body.begin, body.end, &mut requests, &NoProgress, &CancellationToken::new())
        .await;
    drop(requests);

    if let Err(e) = result {
        return error_response(e);
    }

    let response: Vec<ReadResponse> = body
        .items
        .into_iter()
        .zip(buffers)
        .map(|(item, buffer)| ReadResponse {
            path: item.path,
            resource: item.resource,
            data: buffer.data,
            status: buffer.status,
        })
        .collect();

    Json(response).into_response()
}
