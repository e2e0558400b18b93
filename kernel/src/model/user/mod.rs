use crate::model::{
    id::{EventId, UserId},
    list::ListOptions,
};

pub mod event;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

// event_id を指定した場合はそのイベントに参加しているユーザーだけを返す
#[derive(Debug, Clone, Copy, Default)]
pub struct UserListOptions {
    pub event_id: Option<EventId>,
    pub page: ListOptions,
}
