use crate::error::AppError;
use crate::models::{parse_date_or, today, Favorite, OrderInput, OrderRecord};
use crate::service::{
    FavoritesService, OrderSyncService, ReportService, RestaurantCatalog, SaveKind, SyncOutcome,
    WeeklyReport,
};
use axum::{
    extract::{Json, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: Some(data),
        })
    }
}

/// Identifies one (restaurant, date) partition; date defaults to today
#[derive(Debug, Deserialize)]
pub struct PartitionQuery {
    pub restaurant: String,
    pub date: Option<String>,
}

/// Request body: the full current order list of a partition
#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub restaurant: String,
    pub date: Option<String>,
    pub orders: Vec<OrderInput>,
}

#[derive(Debug, Deserialize)]
pub struct FavoriteKey {
    pub name: String,
    pub restaurant: String,
}

/// Health check
pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn list_restaurants(
    State(catalog): State<Arc<RestaurantCatalog>>,
) -> Json<ApiResponse<Vec<String>>> {
    let restaurants = catalog.list().await;
    ApiResponse::ok(format!("{} restaurants", restaurants.len()), restaurants)
}

/// Stored orders of one restaurant for one day
pub async fn load_orders(
    State(service): State<Arc<OrderSyncService>>,
    Query(query): Query<PartitionQuery>,
) -> Result<Json<ApiResponse<Vec<OrderRecord>>>, AppError> {
    let date = parse_date_or(query.date.as_deref(), today());
    let orders = service.load(&query.restaurant, date).await?;
    Ok(ApiResponse::ok(
        format!("Loaded {} orders for {} on {}", orders.len(), query.restaurant, date),
        orders,
    ))
}

/// Replace the stored orders of a partition with the submitted list
pub async fn sync_orders(
    State(service): State<Arc<OrderSyncService>>,
    Json(req): Json<SyncRequest>,
) -> Result<Json<ApiResponse<SyncOutcome>>, AppError> {
    let date = parse_date_or(req.date.as_deref(), today());
    let outcome = service.sync(&req.restaurant, date, req.orders).await?;
    Ok(ApiResponse::ok(
        format!(
            "Saved {} orders for {} on {}",
            outcome.written, outcome.restaurant, outcome.date
        ),
        outcome,
    ))
}

pub async fn delete_order(
    State(service): State<Arc<OrderSyncService>>,
    Path(index): Path<usize>,
    Query(query): Query<PartitionQuery>,
) -> Result<Json<ApiResponse<SyncOutcome>>, AppError> {
    let date = parse_date_or(query.date.as_deref(), today());
    let outcome = service.delete_order(&query.restaurant, date, index).await?;
    Ok(ApiResponse::ok(
        format!("Deleted order #{} for {} on {}", index, outcome.restaurant, outcome.date),
        outcome,
    ))
}

/// Regenerate the weekly report table for the current week
pub async fn generate_weekly_report(
    State(service): State<Arc<ReportService>>,
) -> Result<Json<ApiResponse<WeeklyReport>>, AppError> {
    let report = service.generate(today()).await?;
    Ok(ApiResponse::ok(
        "Weekly report generated successfully!",
        report,
    ))
}

pub async fn export_weekly_report(
    State(service): State<Arc<ReportService>>,
) -> Result<Response, AppError> {
    let csv = service.export_csv(today()).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"weekly-report.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

pub async fn list_favorites(
    State(service): State<Arc<FavoritesService>>,
) -> Result<Json<ApiResponse<Vec<Favorite>>>, AppError> {
    let favorites = service.list().await?;
    Ok(ApiResponse::ok(format!("{} favorites", favorites.len()), favorites))
}

pub async fn save_favorite(
    State(service): State<Arc<FavoritesService>>,
    Json(favorite): Json<Favorite>,
) -> Result<Json<ApiResponse<SaveKind>>, AppError> {
    let restaurant = favorite.restaurant.trim().to_string();
    let kind = service.save(favorite).await?;
    let message = match kind {
        SaveKind::Created => format!("Saved as your favorite order for {}!", restaurant),
        SaveKind::Updated => format!("Updated your favorite order for {}!", restaurant),
    };
    Ok(ApiResponse::ok(message, kind))
}

pub async fn remove_favorite(
    State(service): State<Arc<FavoritesService>>,
    Query(key): Query<FavoriteKey>,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    let removed = service.remove(&key.name, &key.restaurant).await?;
    let message = if removed {
        format!("Removed favorite for {} at {}", key.name, key.restaurant)
    } else {
        format!("No favorite for {} at {}", key.name, key.restaurant)
    };
    Ok(ApiResponse::ok(message, removed))
}
