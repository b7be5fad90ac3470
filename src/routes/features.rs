use log::warn;
use rocket::http::Status;
use rocket::serde::json::{self, Json};
use rocket::{Route, State};
use serde_json::Value;

use crate::db::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::{FeatureBody, Message, Product};
use crate::store::ProductStore;
use crate::validation::{object_body, parse, require_fields};

async fn load_product(state: &State<AppState>, product_id: i64) -> ApiResult<Product> {
    state
        .products
        .find(product_id)
        .await?
        .ok_or_else(ApiError::product_not_found)
}

fn feature_not_found() -> ApiError {
    ApiError::NotFound("Feature not found".into())
}

fn feature_exists() -> ApiError {
    ApiError::Conflict("Feature already exists".into())
}

fn feature_from_body(body: Result<Json<Value>, json::Error<'_>>) -> ApiResult<String> {
    let body = object_body(body)?;
    require_fields(&body, &["feature"])?;
    let body: FeatureBody = parse(body)?;
    Ok(body.feature)
}

async fn add(state: &State<AppState>, product_id: i64, feature: &str) -> ApiResult<(Status, Json<Message>)> {
    let product = load_product(state, product_id).await?;
    if product.has_feature(feature) {
        return Err(feature_exists());
    }
    if !state.products.push_feature(product_id, feature).await? {
        return Err(feature_exists());
    }
    Ok((Status::Created, Json(Message::new("Feature created successfully"))))
}

/// Rename is remove-then-append, so the new name ends up last.
async fn rename(
    state: &State<AppState>,
    product_id: i64,
    previous: &str,
    new: &str,
) -> ApiResult<Json<Message>> {
    let product = load_product(state, product_id).await?;
    if !product.has_feature(previous) {
        return Err(feature_not_found());
    }
    if previous != new && product.has_feature(new) {
        return Err(feature_exists());
    }

    swap_feature(state.products.as_ref(), product_id, previous, new).await?;
    Ok(Json(Message::new("Feature updated successfully")))
}

/// The two writes behind a rename. If the append matches nothing, the old
/// name is put back so the list is left as it was found.
async fn swap_feature(store: &dyn ProductStore, product_id: i64, previous: &str, new: &str) -> ApiResult<()> {
    if !store.remove_feature(product_id, previous).await? {
        return Err(feature_not_found());
    }
    if store.push_feature(product_id, new).await? {
        return Ok(());
    }

    if store.push_feature(product_id, previous).await? {
        warn!("rename of '{previous}' on product {product_id} lost to a concurrent '{new}'");
        return Err(feature_exists());
    }
    match store.find(product_id).await? {
        Some(_) => Err(feature_exists()),
        None => Err(ApiError::product_not_found()),
    }
}

// GET /feature/<product_id>
#[get("/<product_id>")]
pub async fn list(state: &State<AppState>, product_id: i64) -> ApiResult<Json<Vec<String>>> {
    let product = load_product(state, product_id).await?;
    Ok(Json(product.features))
}

// POST /feature/<product_id>/<feature>
#[post("/<product_id>/<feature>")]
pub async fn create(state: &State<AppState>, product_id: i64, feature: &str) -> ApiResult<(Status, Json<Message>)> {
    add(state, product_id, feature).await
}

// POST /feature/<product_id>  {"feature": "..."}
#[post("/<product_id>", data = "<body>")]
pub async fn create_from_body(
    state: &State<AppState>,
    product_id: i64,
    body: Result<Json<Value>, json::Error<'_>>,
) -> ApiResult<(Status, Json<Message>)> {
    load_product(state, product_id).await?;
    let feature = feature_from_body(body)?;
    add(state, product_id, &feature).await
}

// DELETE /feature/<product_id>/<feature>
#[delete("/<product_id>/<feature>")]
pub async fn delete(state: &State<AppState>, product_id: i64, feature: &str) -> ApiResult<(Status, Json<Message>)> {
    let product = load_product(state, product_id).await?;
    if !product.has_feature(feature) {
        return Err(feature_not_found());
    }
    if !state.products.remove_feature(product_id, feature).await? {
        return Err(feature_not_found());
    }
    Ok((Status::NoContent, Json(Message::new("Feature deleted successfully"))))
}

// PUT /feature/<product_id>/<previous>/<new>
#[put("/<product_id>/<previous>/<new>")]
pub async fn update(state: &State<AppState>, product_id: i64, previous: &str, new: &str) -> ApiResult<Json<Message>> {
    rename(state, product_id, previous, new).await
}

// PUT /feature/<product_id>/<previous>  {"feature": "..."}
#[put("/<product_id>/<previous>", data = "<body>")]
pub async fn update_from_body(
    state: &State<AppState>,
    product_id: i64,
    previous: &str,
    body: Result<Json<Value>, json::Error<'_>>,
) -> ApiResult<Json<Message>> {
    load_product(state, product_id).await?;
    let new = feature_from_body(body)?;
    rename(state, product_id, previous, &new).await
}

pub fn routes() -> Vec<Route> {
    routes![list, create, create_from_body, delete, update, update_from_body]
}
