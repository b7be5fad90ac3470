use rocket::http::Status;
use rocket::serde::json::{self, Json};
use rocket::{Route, State};
use serde_json::Value;

use crate::db::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::{Message, Product, Review, ReviewUpdate};
use crate::validation::{is_present, object_body, parse, require_fields, REVIEW_REQUIRED};

/* ===== Helpers ===== */

async fn load_product(state: &State<AppState>, product_id: i64) -> ApiResult<Product> {
    state
        .products
        .find(product_id)
        .await?
        .ok_or_else(ApiError::product_not_found)
}

fn review_not_found() -> ApiError {
    ApiError::NotFound("Review not found".into())
}

/* ===== Handlers ===== */

// GET /review/<product_id>
#[get("/<product_id>")]
pub async fn list(state: &State<AppState>, product_id: i64) -> ApiResult<Json<Vec<Review>>> {
    let product = load_product(state, product_id).await?;
    Ok(Json(product.reviews))
}

// GET /review/<product_id>/<review_id>
#[get("/<product_id>/<review_id>")]
pub async fn read(state: &State<AppState>, product_id: i64, review_id: i64) -> ApiResult<Json<Review>> {
    let product = load_product(state, product_id).await?;
    product.review(review_id).cloned().map(Json).ok_or_else(review_not_found)
}

// POST /review/<product_id>
#[post("/<product_id>", data = "<body>")]
pub async fn create(
    state: &State<AppState>,
    product_id: i64,
    body: Result<Json<Value>, json::Error<'_>>,
) -> ApiResult<(Status, Json<Message>)> {
    let product = load_product(state, product_id).await?;

    let body = object_body(body)?;
    require_fields(&body, &REVIEW_REQUIRED)?;
    let review: Review = parse(body)?;

    if product.review(review.id).is_some() {
        return Err(ApiError::Conflict("Review already exists".into()));
    }
    // the push is guarded on the id too, so a racing duplicate lands here
    if !state.products.push_review(product_id, &review).await? {
        return Err(ApiError::Conflict("Review already exists".into()));
    }

    Ok((Status::Created, Json(Message::new("Review created successfully"))))
}

// PUT /review/<product_id>/<review_id>
#[put("/<product_id>/<review_id>", data = "<body>")]
pub async fn update(
    state: &State<AppState>,
    product_id: i64,
    review_id: i64,
    body: Result<Json<Value>, json::Error<'_>>,
) -> ApiResult<Json<Message>> {
    let product = load_product(state, product_id).await?;
    if product.review(review_id).is_none() {
        return Err(review_not_found());
    }

    let body = object_body(body)?;
    if is_present(&body, "id") {
        return Err(ApiError::Validation("Id cannot be updated".into()));
    }
    let update: ReviewUpdate = parse(body)?;

    if !state.products.update_review(product_id, review_id, &update).await? {
        return Err(review_not_found());
    }
    Ok(Json(Message::new("Review updated successfully")))
}

// DELETE /review/<product_id>/<review_id>
#[delete("/<product_id>/<review_id>")]
pub async fn delete(
    state: &State<AppState>,
    product_id: i64,
    review_id: i64,
) -> ApiResult<(Status, Json<Message>)> {
    let product = load_product(state, product_id).await?;
    if product.review(review_id).is_none() {
        return Err(review_not_found());
    }

    if !state.products.remove_review(product_id, review_id).await? {
        return Err(review_not_found());
    }
    Ok((Status::NoContent, Json(Message::new("Review deleted successfully"))))
}

pub fn routes() -> Vec<Route> {
    routes![list, read, create, update, delete]
}

#[cfg(test)]
mod tests {
    use rocket::http::Status;
    use rocket::local::asynchronous::Client;
    use serde_json::{json, Value};

    use crate::testing::{client, post_json, put_json, sample_product};

    fn review(id: i64) -> Value {
        json!({"id": id, "username": "ana", "text": "solid", "rating": 4, "date": "2024-03-02"})
    }

    async fn client_with_product() -> Client {
        let client = client().await;
        post_json(&client, "/product", &sample_product(1)).dispatch().await;
        client
    }

    #[rocket::async_test]
    async fn new_product_has_no_reviews() {
        let client = client_with_product().await;
        let res = client.get("/review/1").dispatch().await;
        assert_eq!(res.status(), Status::Ok);
        let reviews: Vec<Value> = res.into_json().await.unwrap();
        assert!(reviews.is_empty());
    }

    #[rocket::async_test]
    async fn reviews_of_missing_product_are_not_found() {
        let client = client().await;
        assert_eq!(client.get("/review/8").dispatch().await.status(), Status::NotFound);
        let res = post_json(&client, "/review/8", &review(0)).dispatch().await;
        assert_eq!(res.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn create_and_read_by_logical_id() {
        let client = client_with_product().await;
        for id in [5, 9] {
            let res = post_json(&client, "/review/1", &review(id)).dispatch().await;
            assert_eq!(res.status(), Status::Created);
        }

        let res = client.get("/review/1/9").dispatch().await;
        assert_eq!(res.status(), Status::Ok);
        let got: Value = res.into_json().await.unwrap();
        assert_eq!(got["id"], 9);
        assert_eq!(got["username"], "ana");

        // ids are not positions
        assert_eq!(client.get("/review/1/1").dispatch().await.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn create_requires_fields_and_unique_id() {
        let client = client_with_product().await;

        let mut missing = review(1);
        missing.as_object_mut().unwrap().remove("date");
        let res = post_json(&client, "/review/1", &missing).dispatch().await;
        assert_eq!(res.status(), Status::BadRequest);
        let msg: Value = res.into_json().await.unwrap();
        assert_eq!(msg["message"], "date is required");

        post_json(&client, "/review/1", &review(1)).dispatch().await;
        let res = post_json(&client, "/review/1", &review(1)).dispatch().await;
        assert_eq!(res.status(), Status::Conflict);

        let reviews: Vec<Value> = client.get("/review/1").dispatch().await.into_json().await.unwrap();
        assert_eq!(reviews.len(), 1);
    }

    #[rocket::async_test]
    async fn update_merges_and_rejects_id_change() {
        let client = client_with_product().await;
        post_json(&client, "/review/1", &review(3)).dispatch().await;

        let res = put_json(&client, "/review/1/3", &json!({"id": 4, "text": "x"})).dispatch().await;
        assert_eq!(res.status(), Status::BadRequest);

        let res = put_json(&client, "/review/1/3", &json!({"text": "changed my mind"}))
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::Ok);

        let got: Value = client.get("/review/1/3").dispatch().await.into_json().await.unwrap();
        assert_eq!(got["id"], 3);
        assert_eq!(got["text"], "changed my mind");
        assert_eq!(got["username"], "ana");

        let res = put_json(&client, "/review/1/40", &json!({"text": "x"})).dispatch().await;
        assert_eq!(res.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn delete_removes_by_id() {
        let client = client_with_product().await;
        for id in [10, 20, 30] {
            post_json(&client, "/review/1", &review(id)).dispatch().await;
        }

        assert_eq!(client.delete("/review/1/20").dispatch().await.status(), Status::NoContent);
        assert_eq!(client.delete("/review/1/20").dispatch().await.status(), Status::NotFound);

        let reviews: Vec<Value> = client.get("/review/1").dispatch().await.into_json().await.unwrap();
        let ids: Vec<i64> = reviews.iter().filter_map(|r| r["id"].as_i64()).collect();
        assert_eq!(ids, vec![10, 30]);
    }
}
