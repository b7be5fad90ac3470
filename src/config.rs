use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl StoreBackend {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => StoreBackend::Memory,
            _ => StoreBackend::Mongo,
        }
    }
}

pub struct AppConfig {
    pub mongo_uri: String,
    pub db_name: String,
    pub app_name: String,
    pub port: u16,
    pub store_backend: StoreBackend,
}

impl AppConfig {
    pub const DEFAULT_PORT: u16 = 5000;

    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // .env is optional

        let get = |k: &str, d: &str| env::var(k).unwrap_or_else(|_| d.to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(Self::DEFAULT_PORT);

        Self {
            mongo_uri: get("MONGO_URI", "mongodb://localhost:27017"),
            db_name: get("DATABASE_NAME", "products"),
            app_name: get("APP_NAME", "products-api"),
            port,
            store_backend: StoreBackend::parse(&get("STORE_BACKEND", "mongo")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StoreBackend;

    #[test]
    fn unknown_backend_falls_back_to_mongo() {
        assert_eq!(StoreBackend::parse("memory"), StoreBackend::Memory);
        assert_eq!(StoreBackend::parse(" MEM "), StoreBackend::Memory);
        assert_eq!(StoreBackend::parse("mongo"), StoreBackend::Mongo);
        assert_eq!(StoreBackend::parse("postgres"), StoreBackend::Mongo);
    }
}
