use crate::model::event::{
    CreateEventRequest, CreatedEventResponse, EventListQuery, EventResponse,
    PaginatedEventResponse, UpdateEventRequest, UpdateEventRequestWithId,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use garde::Validate;
use kernel::model::{event::event::DeleteEvent, id::EventId};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

pub async fn register_event(
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateEventRequest>,
) -> AppResult<(StatusCode, Json<CreatedEventResponse>)> {
    req.validate(&())?;

    registry
        .event_repository()
        .create(req.into())
        .await
        .map(|id| (StatusCode::CREATED, Json(CreatedEventResponse { id })))
}

pub async fn show_event_list(
    Query(query): Query<EventListQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<PaginatedEventResponse>> {
    query.validate(&())?;

    registry
        .event_repository()
        .find_all(query.into())
        .await
        .map(PaginatedEventResponse::from)
        .map(Json)
}

pub async fn show_event(
    Path(event_id): Path<EventId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<EventResponse>> {
    registry
        .event_repository()
        .find_by_id(event_id)
        .await
        .and_then(|event| match event {
            Some(event) => Ok(Json(event.into())),
            None => Err(AppError::EntityNotFound(format!(
                "event ({event_id}) not found"
            ))),
        })
}

pub async fn update_event(
    Path(event_id): Path<EventId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<UpdateEventRequest>,
) -> AppResult<StatusCode> {
    req.validate(&())?;

    let update_event = UpdateEventRequestWithId::new(event_id, req);
    let found = registry
        .event_repository()
        .update(update_event.into())
        .await?;

    if found {
        Ok(StatusCode::OK)
    } else {
        Err(AppError::EntityNotFound(format!(
            "event ({event_id}) not found"
        )))
    }
}

pub async fn delete_event(
    Path(event_id): Path<EventId>,
    State(registry): State<AppRegistry>,
) -> AppResult<StatusCode> {
    registry
        .event_repository()
        .delete(DeleteEvent { event_id })
        .await
        .map(|_| StatusCode::OK)
}
