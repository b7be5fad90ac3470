use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub index: i64, // business key, unique across products
    pub category: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "inStock")]
    pub in_stock: bool,
    pub price: f64,
    pub product_name: String,
    pub description: String,
    pub rating: f64,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub features: Vec<String>,
    /// Keys the client sent that have no named field; stored as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    pub fn review(&self, review_id: i64) -> Option<&Review> {
        self.reviews.iter().find(|r| r.id == review_id)
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}

/// Fields accepted by `PUT /product/<index>`. Only the supplied ones are written.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(rename = "inStock", skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<Review>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProductUpdate {
    /// Keys that identify a stored product and never appear in a `$set`.
    pub const IMMUTABLE_KEYS: [&'static str; 2] = ["index", "_id"];

    pub fn is_empty(&self) -> bool {
        *self == ProductUpdate::default()
    }

    pub fn apply_to(&self, p: &mut Product) {
        if let Some(v) = &self.category { p.category = v.clone(); }
        if let Some(v) = &self.image_url { p.image_url = v.clone(); }
        if let Some(v) = self.in_stock { p.in_stock = v; }
        if let Some(v) = self.price { p.price = v; }
        if let Some(v) = &self.product_name { p.product_name = v.clone(); }
        if let Some(v) = &self.description { p.description = v.clone(); }
        if let Some(v) = self.rating { p.rating = v; }
        if let Some(v) = &self.reviews { p.reviews = v.clone(); }
        if let Some(v) = &self.features { p.features = v.clone(); }
        for (k, v) in &self.extra {
            p.extra.insert(k.clone(), v.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64, // logical key inside the parent's review list
    pub username: String,
    pub text: String,
    pub rating: f64,
    pub date: String,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl ReviewUpdate {
    pub fn apply_to(&self, r: &mut Review) {
        if let Some(v) = &self.username { r.username = v.clone(); }
        if let Some(v) = &self.text { r.text = v.clone(); }
        if let Some(v) = self.rating { r.rating = v; }
        if let Some(v) = &self.date { r.date = v.clone(); }
    }
}

/// Body of `POST /feature/<index>` and `PUT /feature/<index>/<previous>`.
#[derive(Debug, Deserialize)]
pub struct FeatureBody {
    pub feature: String,
}

/// `{"message": "..."}` envelope used by every mutation and error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
