use crate::model::id::UserId;
use derive_new::new;

#[derive(Debug, new)]
pub struct CreateUser {
    pub name: String,
}

#[derive(Debug, new)]
pub struct UpdateUser {
    pub user_id: UserId,
    pub name: String,
}

#[derive(Debug, new)]
pub struct DeleteUser {
    pub user_id: UserId,
}
