pub mod cache;
pub mod ttl_cache;

pub use cache::*;
pub use ttl_cache::*;
