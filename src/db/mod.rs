pub mod redis;
mod store;

pub use self::redis::{create_redis_client, RedisStore};
pub use store::{KeyValueStore, MemoryStore};
