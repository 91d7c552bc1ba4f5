pub mod handlers;

pub use handlers::*;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{delete, get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::service::Services;

/// All routes, each group with its own service as state
pub fn router(services: Services) -> Router {
    let order_routes = Router::new()
        .route("/api/orders", get(load_orders).put(sync_orders))
        .route("/api/orders/:index", delete(delete_order))
        .with_state(services.orders);

    let report_routes = Router::new()
        .route("/api/reports/weekly", post(generate_weekly_report))
        .route("/api/reports/weekly.csv", get(export_weekly_report))
        .with_state(services.reports);

    let restaurant_routes = Router::new()
        .route("/api/restaurants", get(list_restaurants))
        .with_state(services.restaurants);

    let favorite_routes = Router::new()
        .route(
            "/api/favorites",
            get(list_favorites).put(save_favorite).delete(remove_favorite),
        )
        .with_state(services.favorites);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(health_check))
        .merge(order_routes)
        .merge(report_routes)
        .merge(restaurant_routes)
        .merge(favorite_routes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
}
