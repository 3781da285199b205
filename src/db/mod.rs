pub mod memory;
pub mod postgres;
pub mod redis;

pub use memory::{InMemoryCatalog, InMemoryEventLog, InMemoryProfileStore};
pub use postgres::{create_pool, run_migrations, PgCatalog, PgEventLog, PgProfileStore};
pub use redis::create_redis_client;
pub use redis::Cache;
pub use redis::CacheKey;
pub use redis::CachedCatalog;
