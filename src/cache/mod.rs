// 缓存模块
// 包含缓存键生成和进程内 TTL 缓存

pub mod keys;
pub mod store;

pub use keys::dataset_key;
pub use store::{CacheLookup, CacheStats, CacheStore};
