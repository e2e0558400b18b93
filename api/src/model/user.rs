use derive_new::new;
use garde::Validate;
use kernel::model::{
    id::{EventId, UserId},
    list::{ListOptions, PaginatedList},
    user::{
        event::{CreateUser, UpdateUser},
        User, UserListOptions,
    },
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[garde(skip)]
    name: String,
}

impl From<CreateUserRequest> for CreateUser {
    fn from(value: CreateUserRequest) -> Self {
        let CreateUserRequest { name } = value;
        Self { name }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[garde(skip)]
    name: String,
}

#[derive(new)]
pub struct UpdateUserRequestWithId(UserId, UpdateUserRequest);
impl From<UpdateUserRequestWithId> for UpdateUser {
    fn from(value: UpdateUserRequestWithId) -> Self {
        let UpdateUserRequestWithId(user_id, UpdateUserRequest { name }) = value;
        Self { user_id, name }
    }
}

// limit = 0 は上限なし。eventId を指定するとそのイベントの参加者に絞り込む
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    #[garde(skip)]
    #[serde(default)]
    pub limit: u64,
    #[garde(skip)]
    #[serde(default)]
    pub offset: u64,
    #[garde(range(min = 1))]
    pub event_id: Option<i64>,
}

impl From<UserListQuery> for UserListOptions {
    fn from(value: UserListQuery) -> Self {
        let UserListQuery {
            limit,
            offset,
            event_id,
        } = value;
        Self {
            event_id: event_id.map(EventId::new),
            page: ListOptions::new(limit, offset),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUserResponse {
    pub id: UserId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(value: User) -> Self {
        let User { id, name } = value;
        Self { id, name }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedUserResponse {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub items: Vec<UserResponse>,
}

impl From<PaginatedList<User>> for PaginatedUserResponse {
    fn from(value: PaginatedList<User>) -> Self {
        let PaginatedList {
            total,
            limit,
            offset,
            items,
        } = value;
        Self {
            total,
            limit,
            offset,
            items: items.into_iter().map(UserResponse::from).collect(),
        }
    }
}
