pub mod event;
pub mod id;
pub mod list;
pub mod user;
