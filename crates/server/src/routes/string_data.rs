use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use common::types::Message;
use service::file::string_data::{StringDataInput, StringRecord};
use tracing::info;

use crate::errors::JsonApiError;
use crate::routes::Saved;
use crate::state::StringDataState;

pub async fn root() -> Json<Message> {
    Json(Message::new("String Data API is running"))
}

/// Save two strings as a new record.
pub async fn save_data(
    State(state): State<StringDataState>,
    payload: Result<Json<StringDataInput>, JsonRejection>,
) -> Result<Json<Saved<StringRecord>>, JsonApiError> {
    let Json(input) = payload?;
    let rec = state.store.save(input).await?;
    info!(id = %rec.id, "saved string data");
    Ok(Json(Saved::new(rec, "Data saved successfully")))
}

/// All records in the order they were saved.
pub async fn list_data(
    State(state): State<StringDataState>,
) -> Result<Json<Vec<StringRecord>>, JsonApiError> {
    let records = state.store.list().await?;
    Ok(Json(records))
}

pub async fn get_data(
    State(state): State<StringDataState>,
    Path(id): Path<String>,
) -> Result<Json<StringRecord>, JsonApiError> {
    Ok(Json(state.store.get(&id).await?))
}
