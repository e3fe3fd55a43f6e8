pub mod active;
pub mod bucket;
pub mod pool;
pub mod token;
pub mod volume;

pub use active::ActivePool;
pub use bucket::PriceBucket;
pub use pool::{Pool, PoolType, PoolUpdate};
pub use token::{Token, TokenUpdate};
pub use volume::DailyVolume;
