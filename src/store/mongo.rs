use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{self, doc, Document},
    error::{ErrorKind, WriteFailure},
    Collection, Database,
};

use super::{ProductStore, StoreError, StoreResult};
use crate::models::{Product, ProductUpdate, Review, ReviewUpdate};

const DUPLICATE_KEY_CODE: i32 = 11000;

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        if let ErrorKind::Write(WriteFailure::WriteError(ref we)) = *err.kind {
            if we.code == DUPLICATE_KEY_CODE {
                return StoreError::DuplicateKey(we.message.clone());
            }
        }
        StoreError::Backend(err.to_string())
    }
}

impl From<bson::ser::Error> for StoreError {
    fn from(err: bson::ser::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Products collection backed by MongoDB. Embedded arrays are changed with
/// targeted update operators, never by rewriting the whole document.
pub struct MongoProductStore {
    products: Collection<Product>,
}

impl MongoProductStore {
    pub const COLLECTION: &'static str = "Products";

    pub fn new(db: &Database) -> Self {
        Self { products: db.collection::<Product>(Self::COLLECTION) }
    }

    async fn exists(&self, filter: Document) -> StoreResult<bool> {
        Ok(self.products.find_one(filter).await?.is_some())
    }

    async fn update_matched(&self, filter: Document, update: Document) -> StoreResult<bool> {
        let res = self.products.update_one(filter, update).await?;
        Ok(res.matched_count > 0)
    }
}

/* ===== Filter / update builders ===== */

fn product_filter(index: i64) -> Document {
    doc! { "index": index }
}

/// Matches the product only while it holds a review with `review_id`.
fn review_filter(index: i64, review_id: i64) -> Document {
    doc! { "index": index, "reviews.id": review_id }
}

fn product_set(update: &ProductUpdate) -> StoreResult<Document> {
    Ok(doc! { "$set": bson::to_document(update)? })
}

/// The filter refuses a product that already has a review with this id.
fn push_review_ops(index: i64, review: &Review) -> StoreResult<(Document, Document)> {
    let review_doc = bson::to_bson(review)?;
    Ok((
        doc! { "index": index, "reviews.id": { "$ne": review.id } },
        doc! { "$push": { "reviews": review_doc } },
    ))
}

/// `$set` paths for a review update, addressed through the positional `$`.
fn review_set_doc(update: &ReviewUpdate) -> StoreResult<Document> {
    let fields = bson::to_document(update)?;
    Ok(fields
        .into_iter()
        .map(|(k, v)| (format!("reviews.$.{k}"), v))
        .collect())
}

fn pull_review_update(review_id: i64) -> Document {
    doc! { "$pull": { "reviews": { "id": review_id } } }
}

/// The filter refuses a product that already lists `feature`.
fn push_feature_ops(index: i64, feature: &str) -> (Document, Document) {
    (
        doc! { "index": index, "features": { "$ne": feature } },
        doc! { "$push": { "features": feature } },
    )
}

fn pull_feature_ops(index: i64, feature: &str) -> (Document, Document) {
    (
        doc! { "index": index, "features": feature },
        doc! { "$pull": { "features": feature } },
    )
}

#[async_trait]
impl ProductStore for MongoProductStore {
    async fn list(&self) -> StoreResult<Vec<Product>> {
        let cursor = self.products.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find(&self, index: i64) -> StoreResult<Option<Product>> {
        Ok(self.products.find_one(product_filter(index)).await?)
    }

    async fn insert(&self, product: &Product) -> StoreResult<()> {
        self.products.insert_one(product).await?;
        Ok(())
    }

    async fn update_fields(&self, index: i64, update: &ProductUpdate) -> StoreResult<bool> {
        if update.is_empty() {
            // mongo rejects an empty $set
            return self.exists(product_filter(index)).await;
        }
        self.update_matched(product_filter(index), product_set(update)?).await
    }

    async fn delete(&self, index: i64) -> StoreResult<bool> {
        let res = self.products.delete_one(product_filter(index)).await?;
        Ok(res.deleted_count > 0)
    }

    async fn push_review(&self, index: i64, review: &Review) -> StoreResult<bool> {
        let (filter, update) = push_review_ops(index, review)?;
        self.update_matched(filter, update).await
    }

    async fn update_review(&self, index: i64, review_id: i64, update: &ReviewUpdate) -> StoreResult<bool> {
        let filter = review_filter(index, review_id);
        let set_doc = review_set_doc(update)?;
        if set_doc.is_empty() {
            return self.exists(filter).await;
        }
        self.update_matched(filter, doc! { "$set": set_doc }).await
    }

    async fn remove_review(&self, index: i64, review_id: i64) -> StoreResult<bool> {
        self.update_matched(review_filter(index, review_id), pull_review_update(review_id))
            .await
    }

    async fn push_feature(&self, index: i64, feature: &str) -> StoreResult<bool> {
        let (filter, update) = push_feature_ops(index, feature);
        self.update_matched(filter, update).await
    }

    async fn remove_feature(&self, index: i64, feature: &str) -> StoreResult<bool> {
        let (filter, update) = pull_feature_ops(index, feature);
        self.update_matched(filter, update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_updates_use_positional_paths() {
        let update = ReviewUpdate {
            text: Some("better".into()),
            rating: Some(4.5),
            ..Default::default()
        };
        let set_doc = review_set_doc(&update).unwrap();
        assert_eq!(set_doc, doc! { "reviews.$.text": "better", "reviews.$.rating": 4.5 });
    }

    #[test]
    fn product_update_keeps_wire_names() {
        let update = ProductUpdate {
            image_url: Some("img".into()),
            in_stock: Some(false),
            ..Default::default()
        };
        let set_doc = bson::to_document(&update).unwrap();
        assert_eq!(set_doc, doc! { "imageUrl": "img", "inStock": false });
    }

    #[test]
    fn product_set_carries_unlisted_keys() {
        let mut update = ProductUpdate { price: Some(3.0), ..Default::default() };
        update.extra.insert("color".into(), serde_json::json!("red"));
        assert_eq!(product_set(&update).unwrap(), doc! { "$set": { "price": 3.0, "color": "red" } });
    }

    #[test]
    fn review_push_is_guarded_on_id() {
        let review = Review {
            id: 4,
            username: "ana".into(),
            text: "ok".into(),
            rating: 2.0,
            date: "2024-01-01".into(),
        };
        let (filter, update) = push_review_ops(9, &review).unwrap();
        assert_eq!(filter, doc! { "index": 9_i64, "reviews.id": { "$ne": 4_i64 } });
        assert_eq!(
            update,
            doc! { "$push": { "reviews": {
                "id": 4_i64, "username": "ana", "text": "ok", "rating": 2.0, "date": "2024-01-01"
            } } }
        );
    }

    #[test]
    fn review_update_and_pull_match_by_id() {
        assert_eq!(review_filter(9, 4), doc! { "index": 9_i64, "reviews.id": 4_i64 });
        assert_eq!(pull_review_update(4), doc! { "$pull": { "reviews": { "id": 4_i64 } } });
    }

    #[test]
    fn feature_push_is_guarded_and_pull_requires_presence() {
        let (filter, update) = push_feature_ops(2, "red");
        assert_eq!(filter, doc! { "index": 2_i64, "features": { "$ne": "red" } });
        assert_eq!(update, doc! { "$push": { "features": "red" } });

        let (filter, update) = pull_feature_ops(2, "red");
        assert_eq!(filter, doc! { "index": 2_i64, "features": "red" });
        assert_eq!(update, doc! { "$pull": { "features": "red" } });
    }
}
