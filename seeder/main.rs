use anyhow::Result;
use chrono::{TimeZone, Utc};
use dotenvy::dotenv;
use fake::faker::internet::en::Username;
use fake::faker::lorem::en::{Sentence, Word, Words};
use fake::Fake;
use mongodb::{
    bson::doc,
    options::{ClientOptions, IndexOptions},
    Client, Collection, IndexModel,
};
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

const PRODUCT_COUNT: i64 = 50;

#[derive(Debug, Serialize, Deserialize)]
struct ReviewDoc {
    id: i64,
    username: String,
    text: String,
    rating: f64,
    date: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProductDoc {
    #[serde(rename = "_id")]
    id: String,
    index: i64,
    category: String,
    #[serde(rename = "imageUrl")]
    image_url: String,
    #[serde(rename = "inStock")]
    in_stock: bool,
    price: f64,
    product_name: String,
    description: String,
    rating: f64,
    reviews: Vec<ReviewDoc>,
    features: Vec<String>,
}

fn random_review(id: i64, rng: &mut impl Rng) -> ReviewDoc {
    let date = Utc
        .with_ymd_and_hms(rng.gen_range(2018..=2024), rng.gen_range(1..=12), rng.gen_range(1..=28), 0, 0, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    ReviewDoc {
        id,
        username: Username().fake(),
        text: Sentence(5..15).fake(),
        rating: rng.gen_range(1..=5) as f64,
        date,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let uri = std::env::var("MONGO_URI")?;
    let db_name = std::env::var("DATABASE_NAME")?;

    let mut client_opts = ClientOptions::parse(&uri).await?;
    client_opts.app_name = Some("products-seeder".into());
    let client = Client::with_options(client_opts)?;
    let db = client.database(&db_name);
    let products: Collection<ProductDoc> = db.collection("Products");

    let categories = ["electronics", "home", "garden", "sports", "toys", "books", "clothing"];

    let mut rng = rand::thread_rng();
    let mut docs = Vec::with_capacity(PRODUCT_COUNT as usize);

    for index in 1..=PRODUCT_COUNT {
        let reviews = (0..rng.gen_range(0..5)).map(|id| random_review(id, &mut rng)).collect();

        let mut features: Vec<String> = Words(1..6).fake();
        features.sort();
        features.dedup();

        let name: String = Word().fake();
        docs.push(ProductDoc {
            id: uuid::Uuid::new_v4().to_string(),
            index,
            category: categories.choose(&mut rng).copied().unwrap_or("misc").to_string(),
            image_url: format!("https://picsum.photos/seed/{index}/400/400"),
            in_stock: rng.gen_bool(0.8),
            price: (rng.gen_range(100..50_000) as f64) / 100.0,
            product_name: name,
            description: Sentence(8..20).fake(),
            rating: (rng.gen_range(10..=50) as f64) / 10.0,
            reviews,
            features,
        });
    }

    // Wipe and seed
    products.delete_many(doc! {}).await?;
    let unique_index = IndexModel::builder()
        .keys(doc! { "index": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    products.create_index(unique_index).await?;

    let res = products.insert_many(docs).await?;
    println!("Seeded products: {}", res.inserted_ids.len());

    Ok(())
}
