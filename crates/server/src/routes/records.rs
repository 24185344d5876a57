use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use common::types::Ack;
use models::{Record, Storage};
use serde::Deserialize;

use crate::errors::JsonApiError;
use crate::state::ServerState;

/// `?name=`; a missing parameter arrives as "" and fails name validation.
#[derive(Debug, Deserialize)]
pub struct NameQuery {
    #[serde(default)]
    pub name: String,
}

/// Record bodies are decoded whatever `Content-Type` says; clients that
/// omit the header still get their JSON parsed.
fn parse_record(body: &[u8]) -> Result<Record, JsonApiError> {
    Ok(serde_json::from_slice(body)?)
}

#[derive(Debug, Deserialize)]
pub struct TypeQuery {
    #[serde(rename = "type", default)]
    pub record_type: String,
}

pub async fn get_all(State(state): State<ServerState>) -> Json<Storage> {
    Json(state.vault.get_all().await)
}

pub async fn get_by_type(
    State(state): State<ServerState>,
    Query(q): Query<TypeQuery>,
) -> Result<Json<Storage>, JsonApiError> {
    let storage = state.vault.get_by_type(&q.record_type).await?;
    Ok(Json(storage))
}

pub async fn get_by_name(
    State(state): State<ServerState>,
    Query(q): Query<NameQuery>,
) -> Result<Json<Record>, JsonApiError> {
    let record = state.vault.get_by_name(&q.name).await?;
    Ok(Json(record))
}

pub async fn record_types(State(state): State<ServerState>) -> Json<Vec<String>> {
    Json(state.vault.record_types().to_vec())
}

pub async fn add(
    State(state): State<ServerState>,
    Query(q): Query<NameQuery>,
    body: Bytes,
) -> Result<Json<Ack>, JsonApiError> {
    let record = parse_record(&body)?;
    state.vault.append(&q.name, record).await?;
    Ok(Json(Ack::ok()))
}

pub async fn update(
    State(state): State<ServerState>,
    Query(q): Query<NameQuery>,
    body: Bytes,
) -> Result<Json<Ack>, JsonApiError> {
    let record = parse_record(&body)?;
    state.vault.update_by_name(&q.name, record).await?;
    Ok(Json(Ack::ok()))
}

pub async fn delete(
    State(state): State<ServerState>,
    Query(q): Query<NameQuery>,
) -> Result<Json<Ack>, JsonApiError> {
    state.vault.delete_by_name(&q.name).await?;
    Ok(Json(Ack::ok()))
}

/// Force a full write of the current storage to the backing file.
pub async fn flush(State(state): State<ServerState>) -> Result<Json<Ack>, JsonApiError> {
    state.vault.persist_to_file().await?;
    Ok(Json(Ack::ok()))
}
