pub mod event;
pub mod timestamp;
pub mod user;
