/// HTTP handlers for the leaderboard endpoints
///
/// Thin transport glue: path/query extraction, JSON encoding and status
/// mapping. The store itself knows nothing about HTTP.
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::{ErrorResponse, Result};
use crate::store::RankStore;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Deserialize)]
pub struct NeighborhoodQuery {
    /// Neighbors ranked above the customer
    pub high: i64,
    /// Neighbors ranked below the customer
    pub low: i64,
}

/// `POST /customer/{customer_id}/score/{delta}` — apply a score delta and
/// return the new total as a bare JSON integer.
pub async fn update_score(
    store: web::Data<RankStore>,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse> {
    let (customer_id, delta) = path.into_inner();
    let total = store.update_score(customer_id, delta);
    Ok(HttpResponse::Ok().json(total))
}

/// `GET /leaderboard?start=&end=` — inclusive rank range.
pub async fn get_leaderboard(
    store: web::Data<RankStore>,
    query: web::Query<LeaderboardQuery>,
) -> Result<HttpResponse> {
    let rows = store.leaderboard(query.start, query.end);
    Ok(HttpResponse::Ok().json(rows))
}

/// `GET /leaderboard/{customer_id}?high=&low=` — the customer and its
/// ranked neighborhood, empty when the customer is unranked.
pub async fn get_customer(
    store: web::Data<RankStore>,
    path: web::Path<i64>,
    query: web::Query<NeighborhoodQuery>,
) -> Result<HttpResponse> {
    let rows = store.customer_neighborhood(path.into_inner(), query.high, query.low);
    Ok(HttpResponse::Ok().json(rows))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
}

/// Fallback for unmatched routes, mirroring the error body shape of
/// [`crate::error::ServiceError`] responses.
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse {
        error: "Not Found".to_string(),
        code: 404,
    })
}

/// Route table shared by the binary and the test harness.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route(
            "/customer/{customer_id}/score/{delta}",
            web::post().to(update_score),
        )
        .route("/leaderboard", web::get().to(get_leaderboard))
        .route("/leaderboard/{customer_id}", web::get().to(get_customer));
}
