//! The /api/v1 router. Literal segments (search, stats, reorder, bulk) are
//! registered alongside /:id routes; axum matches the more specific path.

use crate::handlers::{admin, devices, problems, remotes, sessions, steps, tv_interfaces};
use crate::state::AppState;
use axum::{
    routing::{get, patch, post, put},
    Router,
};

fn device_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(devices::list).post(devices::create))
        .route("/search", get(devices::search))
        .route("/popular", get(devices::popular))
        .route("/stats", get(devices::stats))
        .route("/export", get(devices::export))
        .route("/reorder", put(devices::reorder))
        .route("/bulk", put(devices::bulk_update))
        .route("/:id", get(devices::get).put(devices::update).delete(devices::delete))
        .route("/:id/restore", post(devices::restore))
}

fn problem_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(problems::list).post(problems::create))
        .route("/stats", get(problems::stats))
        .route("/bulk", put(problems::bulk_update))
        .route("/:id", get(problems::get).put(problems::update).delete(problems::delete))
        .route("/:id/restore", post(problems::restore))
        .route("/:id/duplicate", post(problems::duplicate))
}

fn step_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(steps::list).post(steps::create))
        .route("/reorder", put(steps::reorder))
        .route("/bulk", put(steps::bulk_update))
        .route("/:id", get(steps::get).put(steps::update).delete(steps::delete))
}

fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(sessions::list).post(sessions::create))
        .route("/stats", get(sessions::stats))
        .route("/:id", get(sessions::get).put(sessions::update))
        .route("/:id/complete", post(sessions::complete))
}

fn tv_interface_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(tv_interfaces::list).post(tv_interfaces::create))
        .route("/stats", get(tv_interfaces::stats))
        .route("/device/:device_id", get(tv_interfaces::by_device))
        .route(
            "/:id",
            get(tv_interfaces::get)
                .put(tv_interfaces::update)
                .delete(tv_interfaces::delete),
        )
        .route("/:id/toggle", patch(tv_interfaces::toggle))
        .route("/:id/duplicate", post(tv_interfaces::duplicate))
        .route(
            "/:id/marks",
            get(tv_interfaces::list_marks).post(tv_interfaces::create_mark),
        )
        .route("/:id/marks/reorder", put(tv_interfaces::reorder_marks))
        .route(
            "/marks/:id",
            put(tv_interfaces::update_mark).delete(tv_interfaces::delete_mark),
        )
}

fn remote_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(remotes::list))
        .route("/:id", get(remotes::get))
}

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .nest("/devices", device_routes())
        .nest("/problems", problem_routes())
        .nest("/steps", step_routes())
        .nest("/sessions", session_routes())
        .nest("/tv-interfaces", tv_interface_routes())
        .nest("/remotes", remote_routes())
        .route("/cleanup", post(admin::cleanup))
        .route("/seed", post(admin::seed))
        .route("/test-data", post(admin::test_data))
        .route("/db-info", get(admin::db_info))
        .with_state(state)
}
