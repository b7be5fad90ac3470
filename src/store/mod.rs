use std::fmt;

use async_trait::async_trait;

use crate::models::{Product, ProductUpdate, Review, ReviewUpdate};

pub mod memory;
pub mod mongo;

pub use memory::MemoryProductStore;
pub use mongo::MongoProductStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Unique index on `index` rejected the write.
    DuplicateKey(String),
    LockPoisoned(&'static str),
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::DuplicateKey(msg) => write!(f, "duplicate key: {}", msg),
            StoreError::LockPoisoned(op) => write!(f, "store lock poisoned during {}", op),
            StoreError::Backend(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for StoreError {}

pub type StoreResult<T> = Result<T, StoreError>;

/// Access to the Products collection. Products are addressed by their
/// business `index`; reviews and features live embedded in the product.
///
/// Mutations return `false` when nothing matched: the product is gone, the
/// review/feature is absent, or (for pushes) the element already exists.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Product>>;
    async fn find(&self, index: i64) -> StoreResult<Option<Product>>;
    async fn insert(&self, product: &Product) -> StoreResult<()>;
    async fn update_fields(&self, index: i64, update: &ProductUpdate) -> StoreResult<bool>;
    async fn delete(&self, index: i64) -> StoreResult<bool>;

    async fn push_review(&self, index: i64, review: &Review) -> StoreResult<bool>;
    async fn update_review(&self, index: i64, review_id: i64, update: &ReviewUpdate) -> StoreResult<bool>;
    async fn remove_review(&self, index: i64, review_id: i64) -> StoreResult<bool>;

    async fn push_feature(&self, index: i64, feature: &str) -> StoreResult<bool>;
    async fn remove_feature(&self, index: i64, feature: &str) -> StoreResult<bool>;
}
