use super::{controllers, middleware, models};
use axum::{
    middleware::from_fn,
    routing::{get, post, Router},
};

#[rustfmt::skip]
pub fn get_routes() -> Router<models::AppState> {
    Router::new()
        .route("/", get(controllers::root))
        .route("/view", get(controllers::view))
        .route("/navigate", post(controllers::navigate))
        .route("/toasts", get(controllers::toasts))
        .route("/toasts/:id/dismiss", post(controllers::dismiss_toast))
        .route("/auth/sign-in", post(controllers::sign_in))
        .route("/auth/sign-out", post(controllers::sign_out))
        .route("/appointments", post(controllers::add_appointment))
        .route("/clients", post(controllers::add_client))
        .route("/invoices", post(controllers::add_invoice))
        .route("/mileage", post(controllers::add_mileage_log))
        .route("/settings", post(controllers::update_settings))
        .layer(from_fn(middleware::no_store))
}
