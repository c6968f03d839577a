//! Request handlers.
//!
//! Bodies are read as raw bytes and decoded here so that malformed or
//! untyped JSON always yields a 400 with the decoder's message.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use spot_registry::SpotUpdate;
use spot_types::{GarageId, GaragePatch, NewGarage, SectionPatch, SectionRecord};
use tracing::info;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

type AppStateRef = State<Arc<AppState>>;

/// Body of `POST .../actions` and `POST /control`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ActionMsg {
    pub action: String,
    #[serde(default)]
    pub params: Vec<ActionParams>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ActionParams {
    pub number: i64,
    pub label: String,
    pub taken: bool,
}

impl From<ActionParams> for SpotUpdate {
    fn from(p: ActionParams) -> Self {
        SpotUpdate {
            number: p.number,
            label: p.label,
            taken: p.taken,
        }
    }
}

fn decode<T: DeserializeOwned>(body: &Bytes) -> ServerResult<T> {
    Ok(serde_json::from_slice(body)?)
}

/// Unparseable ids cannot name an existing garage.
fn garage_id(raw: &str) -> ServerResult<GarageId> {
    GarageId::parse(raw).map_err(|_| ServerError::NotFound(format!("garages/{raw}")))
}

pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ---- Garages ----

pub async fn list_garages(State(state): AppStateRef) -> Response {
    Json(state.registry.garages().await).into_response()
}

pub async fn create_garage(State(state): AppStateRef, body: Bytes) -> ServerResult<Response> {
    let new: NewGarage = decode(&body)?;
    let view = state.registry.create_garage(new).await?;
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

pub async fn get_garage(State(state): AppStateRef, Path(id): Path<String>) -> ServerResult<Response> {
    let view = state.registry.garage(&garage_id(&id)?).await?;
    Ok(Json(view).into_response())
}

pub async fn update_garage(
    State(state): AppStateRef,
    Path(id): Path<String>,
    body: Bytes,
) -> ServerResult<Response> {
    let id = garage_id(&id)?;
    let patch: GaragePatch = decode(&body)?;
    let view = state.registry.update_garage(&id, &patch).await?;
    Ok(Json(view).into_response())
}

pub async fn delete_garage(
    State(state): AppStateRef,
    Path(id): Path<String>,
) -> ServerResult<StatusCode> {
    state.registry.delete_garage(&garage_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- Sections ----

pub async fn list_sections(
    State(state): AppStateRef,
    Path(id): Path<String>,
) -> ServerResult<Response> {
    let sections = state.registry.sections(&garage_id(&id)?).await?;
    Ok(Json(sections).into_response())
}

pub async fn create_section(
    State(state): AppStateRef,
    Path(id): Path<String>,
    body: Bytes,
) -> ServerResult<Response> {
    let id = garage_id(&id)?;
    let record: SectionRecord = decode(&body)?;
    let view = state.registry.create_section(&id, record).await?;
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

pub async fn get_section(
    State(state): AppStateRef,
    Path((id, name)): Path<(String, String)>,
) -> ServerResult<Response> {
    let view = state.registry.section(&garage_id(&id)?, &name).await?;
    Ok(Json(view).into_response())
}

pub async fn update_section(
    State(state): AppStateRef,
    Path((id, name)): Path<(String, String)>,
    body: Bytes,
) -> ServerResult<Response> {
    let id = garage_id(&id)?;
    let patch: SectionPatch = decode(&body)?;
    let view = state.registry.update_section(&id, &name, &patch).await?;
    Ok(Json(view).into_response())
}

pub async fn delete_section(
    State(state): AppStateRef,
    Path((id, name)): Path<(String, String)>,
) -> ServerResult<StatusCode> {
    state.registry.delete_section(&garage_id(&id)?, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_spots(
    State(state): AppStateRef,
    Path((id, name)): Path<(String, String)>,
) -> ServerResult<Response> {
    let spots = state.registry.spots(&garage_id(&id)?, &name).await?;
    Ok(Json(spots).into_response())
}

// ---- Actions ----

pub async fn post_action(
    State(state): AppStateRef,
    Path((id, name)): Path<(String, String)>,
    body: Bytes,
) -> ServerResult<StatusCode> {
    let id = garage_id(&id)?;
    let msg: ActionMsg = decode(&body)?;
    match msg.action.as_str() {
        "update" => {
            let updates: Vec<SpotUpdate> = msg.params.into_iter().map(Into::into).collect();
            state.registry.apply_update(&id, &name, &updates).await?;
        }
        "disconnect" => {
            let positions: Vec<i64> = msg.params.iter().map(|p| p.number).collect();
            state.registry.apply_disconnect(&id, &name, &positions).await?;
        }
        _ => return Err(ServerError::UnknownAction(msg.action)),
    }
    Ok(StatusCode::OK)
}

pub async fn post_control(State(state): AppStateRef, body: Bytes) -> ServerResult<StatusCode> {
    let msg: ActionMsg = decode(&body)?;
    match msg.action.as_str() {
        "shutdown" => {
            info!("shutdown requested over control endpoint");
            state.request_shutdown();
            Ok(StatusCode::OK)
        }
        _ => Err(ServerError::UnknownAction(msg.action)),
    }
}
