pub mod erc20;
pub mod factory;
pub mod state_view;
pub mod v2;
pub mod v3;
pub mod v4;

pub use erc20::IERC20;
pub use factory::Create;
pub use state_view::IStateView;
pub use v2::{IUniswapV2Pair, Swap as V2Swap};
pub use v3::{IUniswapV3Pool, Swap as V3Swap};
pub use v4::{IDopplerHook, Swap as V4Swap};
