use log::info;
use rocket::http::Status;
use rocket::serde::json::{self, Json};
use rocket::{Route, State};
use serde_json::Value;
use uuid::Uuid;

use crate::db::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::{Message, Product, ProductUpdate};
use crate::validation::{is_present, object_body, parse, require_fields, PRODUCT_REQUIRED};

// GET /product
#[get("/")]
pub async fn list(state: &State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.products.list().await?))
}

// GET /product/<index>
#[get("/<index>")]
pub async fn read(state: &State<AppState>, index: i64) -> ApiResult<Json<Product>> {
    state
        .products
        .find(index)
        .await?
        .map(Json)
        .ok_or_else(ApiError::product_not_found)
}

// POST /product
#[post("/", data = "<body>")]
pub async fn create(
    state: &State<AppState>,
    body: Result<Json<Value>, json::Error<'_>>,
) -> ApiResult<(Status, Json<Message>)> {
    let body = object_body(body)?;
    require_fields(&body, &PRODUCT_REQUIRED)?;
    let mut product: Product = parse(body)?;

    if state.products.find(product.index).await?.is_some() {
        return Err(ApiError::Conflict("Product already exists".into()));
    }

    product.id = Some(Uuid::new_v4().to_string());
    // a concurrent create can still lose the race; the store reports it as a duplicate
    state.products.insert(&product).await?;
    info!("created product {}", product.index);

    Ok((Status::Created, Json(Message::new("Product created successfully"))))
}

// PUT /product/<index>
#[put("/<index>", data = "<body>")]
pub async fn update(
    state: &State<AppState>,
    index: i64,
    body: Result<Json<Value>, json::Error<'_>>,
) -> ApiResult<Json<Message>> {
    if state.products.find(index).await?.is_none() {
        return Err(ApiError::product_not_found());
    }

    let mut body = object_body(body)?;
    if is_present(&body, "index") {
        return Err(ApiError::Validation("Index cannot be updated".into()));
    }
    for key in ProductUpdate::IMMUTABLE_KEYS {
        body.remove(key);
    }
    let update: ProductUpdate = parse(body)?;

    if !state.products.update_fields(index, &update).await? {
        return Err(ApiError::product_not_found());
    }
    Ok(Json(Message::new("Product updated successfully")))
}

// DELETE /product/<index>
#[delete("/<index>")]
pub async fn delete(state: &State<AppState>, index: i64) -> ApiResult<(Status, Json<Message>)> {
    if !state.products.delete(index).await? {
        return Err(ApiError::product_not_found());
    }
    info!("deleted product {index}");
    Ok((Status::NoContent, Json(Message::new("Product deleted successfully"))))
}

pub fn routes() -> Vec<Route> {
    routes![list, read, create, update, delete]
}
