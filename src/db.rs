use std::sync::Arc;

use log::{info, warn};
use mongodb::{
    bson::doc,
    options::{ClientOptions, IndexOptions},
    Client, Database, IndexModel,
};

use crate::config::{AppConfig, StoreBackend};
use crate::models::Product;
use crate::store::{MemoryProductStore, MongoProductStore, ProductStore};

/// Handed to every route through Rocket's managed state.
pub struct AppState {
    pub products: Arc<dyn ProductStore>,
}

impl AppState {
    pub fn new(store: impl ProductStore + 'static) -> Self {
        Self { products: Arc::new(store) }
    }
}

/// Opens a client for `uri` and selects `db_name`. The ping makes a bad URI
/// or unreachable server fail here instead of on the first request.
pub async fn connect(uri: &str, db_name: &str, app_name: &str) -> anyhow::Result<Database> {
    let mut opts = ClientOptions::parse(uri).await?;
    opts.app_name = Some(app_name.into());

    let client = Client::with_options(opts)?;
    let db = client.database(db_name);
    db.run_command(doc! { "ping": 1 }).await?;
    Ok(db)
}

pub async fn ensure_indexes(db: &Database) -> mongodb::error::Result<()> {
    let products = db.collection::<Product>(MongoProductStore::COLLECTION);

    // business key, unique across products
    let index_idx = IndexModel::builder()
        .keys(doc! { "index": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    products.create_index(index_idx).await?;

    Ok(())
}

pub async fn init_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    match cfg.store_backend {
        StoreBackend::Memory => {
            warn!("using in-memory product store; data is lost on restart");
            Ok(AppState::new(MemoryProductStore::new()))
        }
        StoreBackend::Mongo => {
            let db = connect(&cfg.mongo_uri, &cfg.db_name, &cfg.app_name).await?;
            info!("connected to mongo database '{}'", cfg.db_name);

            if let Err(e) = ensure_indexes(&db).await {
                warn!("failed to create indexes: {e}");
            }

            Ok(AppState::new(MongoProductStore::new(&db)))
        }
    }
}
