use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};

use piestand_core::Username;
use piestand_inventory::{Budget, PurchaseForm};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_pies))
        .route("/recommend", get(recommend))
        .route("/:id", get(get_pie))
        .route("/:id/purchases", post(purchase))
}

fn host(headers: &HeaderMap) -> &str {
    headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost")
}

pub async fn list_pies(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> axum::response::Response {
    let listing = match tokio::task::spawn_blocking(move || services.list_pies()).await {
        Ok(Ok(listing)) => listing,
        Ok(Err(e)) => return errors::view_error_to_response(e),
        Err(e) => return errors::join_error_to_response(e),
    };

    let host = host(&headers);
    let body: Vec<dto::PieListing> = listing
        .into_iter()
        .map(|summary| dto::PieListing {
            permalink: dto::pie_url(host, summary.pie.id),
            summary,
        })
        .collect();

    (StatusCode::OK, Json(body)).into_response()
}

pub async fn get_pie(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let Some(pie_id) = dto::parse_pie_path(&id) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "pie not found");
    };

    match tokio::task::spawn_blocking(move || services.pie_details(pie_id)).await {
        Ok(Ok(details)) => (StatusCode::OK, Json(details)).into_response(),
        Ok(Err(e)) => errors::view_error_to_response(e),
        Err(e) => errors::join_error_to_response(e),
    }
}

pub async fn purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(form): Query<PurchaseForm>,
) -> axum::response::Response {
    let Some(pie_id) = dto::parse_pie_path(&id) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "pie not found");
    };

    match tokio::task::spawn_blocking(move || services.purchase(pie_id, &form)).await {
        Ok(Ok(receipt)) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Ok(Err(e)) => errors::purchase_error_to_response(e),
        Err(e) => errors::join_error_to_response(e),
    }
}

pub async fn recommend(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Query(query): Query<dto::RecommendQuery>,
) -> axum::response::Response {
    let username = match Username::parse(query.username.clone().unwrap_or_default()) {
        Ok(username) => username,
        Err(_) => return errors::validation_errors(vec!["missing username".to_string()]),
    };
    let budget = Budget::parse(query.budget.as_deref());
    let labels = query.labels();

    let recommendation =
        match tokio::task::spawn_blocking(move || services.recommend(&username, budget, &labels)).await {
            Ok(Ok(recommendation)) => recommendation,
            Ok(Err(e)) => return errors::recommend_error_to_response(e),
            Err(e) => return errors::join_error_to_response(e),
        };

    let body = dto::RecommendResponse {
        pie_url: dto::pie_url(host(&headers), recommendation.pie_id),
    };
    (StatusCode::OK, Json(body)).into_response()
}
