use axum::{routing::get, Router};
use registry::AppRegistry;

use crate::handler::user::{delete_user, register_user, show_user, show_user_list, update_user};

pub fn build_user_routers() -> Router<AppRegistry> {
    let users_routers = Router::new()
        .route("/", get(show_user_list).post(register_user))
        .route(
            "/:user_id",
            get(show_user).put(update_user).delete(delete_user),
        );

    Router::new().nest("/users", users_routers)
}
