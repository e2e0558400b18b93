use crate::model::user::{
    CreateUserRequest, CreatedUserResponse, PaginatedUserResponse, UpdateUserRequest,
    UpdateUserRequestWithId, UserListQuery, UserResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use garde::Validate;
use kernel::model::{id::UserId, user::event::DeleteUser};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

pub async fn register_user(
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<CreatedUserResponse>)> {
    req.validate(&())?;

    registry
        .user_repository()
        .create(req.into())
        .await
        .map(|id| (StatusCode::CREATED, Json(CreatedUserResponse { id })))
}

pub async fn show_user_list(
    Query(query): Query<UserListQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<PaginatedUserResponse>> {
    query.validate(&())?;

    registry
        .user_repository()
        .find_all(query.into())
        .await
        .map(PaginatedUserResponse::from)
        .map(Json)
}

pub async fn show_user(
    Path(user_id): Path<UserId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<UserResponse>> {
    registry
        .user_repository()
        .find_by_id(user_id)
        .await
        .and_then(|user| match user {
            Some(user) => Ok(Json(user.into())),
            None => Err(AppError::EntityNotFound(format!(
                "user ({user_id}) not found"
            ))),
        })
}

pub async fn update_user(
    Path(user_id): Path<UserId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<UpdateUserRequest>,
) -> AppResult<StatusCode> {
    req.validate(&())?;

    let update_user = UpdateUserRequestWithId::new(user_id, req);
    let found = registry
        .user_repository()
        .update(update_user.into())
        .await?;

    if found {
        Ok(StatusCode::OK)
    } else {
        Err(AppError::EntityNotFound(format!(
            "user ({user_id}) not found"
        )))
    }
}

pub async fn delete_user(
    Path(user_id): Path<UserId>,
    State(registry): State<AppRegistry>,
) -> AppResult<StatusCode> {
    registry
        .user_repository()
        .delete(DeleteUser { user_id })
        .await
        .map(|_| StatusCode::OK)
}
