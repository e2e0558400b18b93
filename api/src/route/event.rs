use axum::{routing::get, Router};
use registry::AppRegistry;

use crate::handler::event::{
    delete_event, register_event, show_event, show_event_list, update_event,
};

pub fn build_event_routers() -> Router<AppRegistry> {
    let events_routers = Router::new()
        .route("/", get(show_event_list).post(register_event))
        .route(
            "/:event_id",
            get(show_event).put(update_event).delete(delete_event),
        );

    Router::new().nest("/events", events_routers)
}
