mod creation;
mod swap;
mod v2;
mod v3;
mod v4;

pub use creation::handle_pool_created;
pub use v2::handle_v2_swap;
pub use v3::handle_v3_swap;
pub use v4::handle_v4_swap;

pub(crate) use swap::{apply_swap, QuoteFlow, SwapMeta, SwapObservation};
