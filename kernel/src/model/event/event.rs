use crate::model::id::{EventId, UserId};
use chrono::{DateTime, Utc};
use derive_new::new;

#[derive(Debug, new)]
pub struct CreateEvent {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub user_ids: Vec<UserId>,
}

// user_ids は更新後に紐づいているべきユーザーの一覧（差分ではない）
#[derive(Debug, new)]
pub struct UpdateEvent {
    pub event_id: EventId,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub user_ids: Vec<UserId>,
}

#[derive(Debug, new)]
pub struct DeleteEvent {
    pub event_id: EventId,
}
