use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::{ProductStore, StoreError, StoreResult};
use crate::models::{Product, ProductUpdate, Review, ReviewUpdate};

/// In-process store keyed by `index`. Used with `STORE_BACKEND=memory` and
/// by the HTTP tests.
#[derive(Clone, Default)]
pub struct MemoryProductStore {
    products: Arc<RwLock<BTreeMap<i64, Product>>>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_product<T>(
        &self,
        index: i64,
        f: impl FnOnce(&mut Product) -> T,
    ) -> StoreResult<Option<T>> {
        let mut products = self
            .products
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        Ok(products.get_mut(&index).map(f))
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn list(&self) -> StoreResult<Vec<Product>> {
        let products = self
            .products
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(products.values().cloned().collect())
    }

    async fn find(&self, index: i64) -> StoreResult<Option<Product>> {
        let products = self
            .products
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(products.get(&index).cloned())
    }

    async fn insert(&self, product: &Product) -> StoreResult<()> {
        let mut products = self
            .products
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        if products.contains_key(&product.index) {
            return Err(StoreError::DuplicateKey(format!("index {}", product.index)));
        }
        products.insert(product.index, product.clone());
        Ok(())
    }

    async fn update_fields(&self, index: i64, update: &ProductUpdate) -> StoreResult<bool> {
        Ok(self.with_product(index, |p| update.apply_to(p))?.is_some())
    }

    async fn delete(&self, index: i64) -> StoreResult<bool> {
        let mut products = self
            .products
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        Ok(products.remove(&index).is_some())
    }

    async fn push_review(&self, index: i64, review: &Review) -> StoreResult<bool> {
        let pushed = self.with_product(index, |p| {
            if p.review(review.id).is_some() {
                return false;
            }
            p.reviews.push(review.clone());
            true
        })?;
        Ok(pushed.unwrap_or(false))
    }

    async fn update_review(&self, index: i64, review_id: i64, update: &ReviewUpdate) -> StoreResult<bool> {
        let updated = self.with_product(index, |p| {
            match p.reviews.iter_mut().find(|r| r.id == review_id) {
                Some(r) => {
                    update.apply_to(r);
                    true
                }
                None => false,
            }
        })?;
        Ok(updated.unwrap_or(false))
    }

    async fn remove_review(&self, index: i64, review_id: i64) -> StoreResult<bool> {
        let removed = self.with_product(index, |p| {
            let before = p.reviews.len();
            p.reviews.retain(|r| r.id != review_id);
            p.reviews.len() != before
        })?;
        Ok(removed.unwrap_or(false))
    }

    async fn push_feature(&self, index: i64, feature: &str) -> StoreResult<bool> {
        let pushed = self.with_product(index, |p| {
            if p.has_feature(feature) {
                return false;
            }
            p.features.push(feature.to_string());
            true
        })?;
        Ok(pushed.unwrap_or(false))
    }

    async fn remove_feature(&self, index: i64, feature: &str) -> StoreResult<bool> {
        let removed = self.with_product(index, |p| {
            let before = p.features.len();
            p.features.retain(|f| f != feature);
            p.features.len() != before
        })?;
        Ok(removed.unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(index: i64) -> Product {
        Product {
            id: Some(format!("id-{index}")),
            index,
            category: "A".into(),
            image_url: "u".into(),
            in_stock: true,
            price: 10.0,
            product_name: "p".into(),
            description: "d".into(),
            rating: 4.0,
            reviews: vec![],
            features: vec![],
            extra: serde_json::Map::new(),
        }
    }

    fn review(id: i64) -> Review {
        Review {
            id,
            username: "ana".into(),
            text: "nice".into(),
            rating: 5.0,
            date: "2024-05-01".into(),
        }
    }

    #[rocket::async_test]
    async fn insert_rejects_duplicate_index() {
        let store = MemoryProductStore::new();
        store.insert(&product(1)).await.unwrap();
        let err = store.insert(&product(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(_)));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[rocket::async_test]
    async fn reviews_are_removed_by_id_not_position() {
        let store = MemoryProductStore::new();
        store.insert(&product(1)).await.unwrap();
        for id in [10, 20, 30] {
            assert!(store.push_review(1, &review(id)).await.unwrap());
        }
        assert!(!store.push_review(1, &review(20)).await.unwrap());

        assert!(store.remove_review(1, 20).await.unwrap());
        assert!(!store.remove_review(1, 1).await.unwrap());

        let ids: Vec<i64> = store.find(1).await.unwrap().unwrap().reviews.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![10, 30]);
    }

    #[rocket::async_test]
    async fn push_feature_is_idempotent_guarded() {
        let store = MemoryProductStore::new();
        store.insert(&product(2)).await.unwrap();
        assert!(store.push_feature(2, "red").await.unwrap());
        assert!(!store.push_feature(2, "red").await.unwrap());
        assert!(!store.push_feature(99, "red").await.unwrap());
        assert_eq!(store.find(2).await.unwrap().unwrap().features, vec!["red".to_string()]);
    }

    #[rocket::async_test]
    async fn mutations_on_missing_product_match_nothing() {
        let store = MemoryProductStore::new();
        assert!(!store.update_fields(5, &ProductUpdate::default()).await.unwrap());
        assert!(!store.update_review(5, 1, &ReviewUpdate::default()).await.unwrap());
        assert!(!store.remove_feature(5, "x").await.unwrap());
        assert!(!store.delete(5).await.unwrap());
    }
}
