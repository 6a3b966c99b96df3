pub mod analytics;
pub mod indexing;
pub mod inspection;
pub mod metrics;
pub mod pacer;
pub mod sitemaps;
pub mod sync;
