use chrono::{DateTime, Utc};
use derive_new::new;
use garde::Validate;
use kernel::model::{
    event::{
        event::{CreateEvent, UpdateEvent},
        is_storable_timestamp, Event, EventListOptions,
    },
    id::{EventId, UserId},
    list::{ListOptions, PaginatedList},
};
use serde::{Deserialize, Serialize};

fn into_user_ids(raw: Vec<i64>) -> Vec<UserId> {
    raw.into_iter().map(UserId::new).collect()
}

// 年が 4 桁に収まらない日時は保存しても読み戻せないため受け付けない
fn storable_timestamp(value: &DateTime<Utc>, _context: &()) -> garde::Result {
    if is_storable_timestamp(value) {
        Ok(())
    } else {
        Err(garde::Error::new("year must be between 0000 and 9999"))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[garde(skip)]
    pub name: String,
    #[garde(custom(storable_timestamp))]
    pub timestamp: DateTime<Utc>,
    #[garde(inner(range(min = 1)))]
    #[serde(default)]
    pub user_ids: Vec<i64>,
}

impl From<CreateEventRequest> for CreateEvent {
    fn from(value: CreateEventRequest) -> Self {
        let CreateEventRequest {
            name,
            timestamp,
            user_ids,
        } = value;
        CreateEvent {
            name,
            timestamp,
            user_ids: into_user_ids(user_ids),
        }
    }
}

// user_ids には更新後に紐づけたいユーザーをすべて指定する
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[garde(skip)]
    pub name: String,
    #[garde(custom(storable_timestamp))]
    pub timestamp: DateTime<Utc>,
    #[garde(inner(range(min = 1)))]
    #[serde(default)]
    pub user_ids: Vec<i64>,
}

#[derive(new)]
pub struct UpdateEventRequestWithId(EventId, UpdateEventRequest);
impl From<UpdateEventRequestWithId> for UpdateEvent {
    fn from(value: UpdateEventRequestWithId) -> Self {
        let UpdateEventRequestWithId(
            event_id,
            UpdateEventRequest {
                name,
                timestamp,
                user_ids,
            },
        ) = value;
        UpdateEvent {
            event_id,
            name,
            timestamp,
            user_ids: into_user_ids(user_ids),
        }
    }
}

// limit = 0 は上限なし。userId を指定するとそのユーザーが参加するイベントに絞り込む
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EventListQuery {
    #[garde(skip)]
    #[serde(default)]
    pub limit: u64,
    #[garde(skip)]
    #[serde(default)]
    pub offset: u64,
    #[garde(range(min = 1))]
    pub user_id: Option<i64>,
}

impl From<EventListQuery> for EventListOptions {
    fn from(value: EventListQuery) -> Self {
        let EventListQuery {
            limit,
            offset,
            user_id,
        } = value;
        Self {
            user_id: user_id.map(UserId::new),
            page: ListOptions::new(limit, offset),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEventResponse {
    pub id: EventId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: EventId,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub user_ids: Vec<UserId>,
}

impl From<Event> for EventResponse {
    fn from(value: Event) -> Self {
        let Event {
            id,
            name,
            timestamp,
            user_ids,
        } = value;
        Self {
            id,
            name,
            timestamp,
            user_ids,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedEventResponse {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub items: Vec<EventResponse>,
}

impl From<PaginatedList<Event>> for PaginatedEventResponse {
    fn from(value: PaginatedList<Event>) -> Self {
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
            items: items.into_iter().map(EventResponse::from).collect(),
        }
    }
}
