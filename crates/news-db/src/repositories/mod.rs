pub mod cache;
pub mod catalog;
pub mod proxy;
pub mod stats;

pub use cache::DieselCacheRepository;
pub use catalog::{DieselSourceCatalogRepository, SourceCatalogRepository};
pub use proxy::DieselProxyRepository;
pub use stats::{DieselStatsRepository, StatsDelta, StatsRepository};
