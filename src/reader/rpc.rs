use std::time::Duration;

use alloy::{
    primitives::{Address, B256, U256},
    providers::{DynProvider, ProviderBuilder},
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use url::Url;

use crate::abis::{IDopplerHook, IStateView, IUniswapV2Pair, IUniswapV3Pool, IERC20};
use crate::reader::{
    ChainReader, TokenMetadata, V2PairState, V3PoolState, V4PoolKey, V4PoolState,
};

/// Timeout for individual RPC calls (30 seconds)
const RPC_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// [`ChainReader`] over an HTTP JSON-RPC provider.
#[derive(Clone)]
pub struct RpcReader {
    provider: DynProvider,
    /// State-view lens contract for V4 singleton pools.
    state_view: Address,
}

impl RpcReader {
    pub fn new(rpc_url: &str, state_view: Address) -> Result<Self> {
        let url = Url::parse(rpc_url).context("Invalid RPC URL")?;
        let client = ProviderBuilder::new().connect_http(url);
        let provider = DynProvider::new(client);

        Ok(Self {
            provider,
            state_view,
        })
    }
}

#[async_trait]
impl ChainReader for RpcReader {
    async fn token_metadata(&self, token: Address) -> Result<TokenMetadata> {
        let contract = IERC20::new(token, &self.provider);

        // Decimals and supply are required; name and symbol degrade to empty
        // for contracts that do not implement them.
        let decimals = tokio::time::timeout(RPC_CALL_TIMEOUT, contract.decimals().call())
            .await
            .context("decimals() timeout")?
            .context("decimals() failed")?;

        let total_supply = tokio::time::timeout(RPC_CALL_TIMEOUT, contract.totalSupply().call())
            .await
            .context("totalSupply() timeout")?
            .context("totalSupply() failed")?;

        let name = tokio::time::timeout(RPC_CALL_TIMEOUT, contract.name().call())
            .await
            .ok()
            .and_then(|r| r.ok())
            .unwrap_or_default();

        let symbol = tokio::time::timeout(RPC_CALL_TIMEOUT, contract.symbol().call())
            .await
            .ok()
            .and_then(|r| r.ok())
            .unwrap_or_default();

        Ok(TokenMetadata {
            name,
            symbol,
            decimals,
            total_supply,
        })
    }

    async fn total_supply(&self, token: Address) -> Result<U256> {
        let contract = IERC20::new(token, &self.provider);
        let supply = tokio::time::timeout(RPC_CALL_TIMEOUT, contract.totalSupply().call())
            .await
            .context("totalSupply() timeout")?
            .context("totalSupply() failed")?;
        Ok(supply)
    }

    async fn balance_of(&self, token: Address, holder: Address) -> Result<U256> {
        let contract = IERC20::new(token, &self.provider);
        let balance = tokio::time::timeout(RPC_CALL_TIMEOUT, contract.balanceOf(holder).call())
            .await
            .context("balanceOf() timeout")?
            .context("balanceOf() failed")?;
        Ok(balance)
    }

    async fn v2_pair_state(&self, pair: Address) -> Result<V2PairState> {
        let contract = IUniswapV2Pair::new(pair, &self.provider);

        let token0 = tokio::time::timeout(RPC_CALL_TIMEOUT, contract.token0().call())
            .await
            .context("token0() timeout")?
            .context("token0() failed")?;
        let token1 = tokio::time::timeout(RPC_CALL_TIMEOUT, contract.token1().call())
            .await
            .context("token1() timeout")?
            .context("token1() failed")?;
        let reserves = tokio::time::timeout(RPC_CALL_TIMEOUT, contract.getReserves().call())
            .await
            .context("getReserves() timeout")?
            .context("getReserves() failed")?;

        Ok(V2PairState {
            token0,
            token1,
            reserve0: U256::from(reserves.reserve0),
            reserve1: U256::from(reserves.reserve1),
        })
    }

    async fn v3_pool_state(&self, pool: Address) -> Result<V3PoolState> {
        let contract = IUniswapV3Pool::new(pool, &self.provider);

        let token0 = tokio::time::timeout(RPC_CALL_TIMEOUT, contract.token0().call())
            .await
            .context("token0() timeout")?
            .context("token0() failed")?;
        let token1 = tokio::time::timeout(RPC_CALL_TIMEOUT, contract.token1().call())
            .await
            .context("token1() timeout")?
            .context("token1() failed")?;
        let fee = tokio::time::timeout(RPC_CALL_TIMEOUT, contract.fee().call())
            .await
            .context("fee() timeout")?
            .context("fee() failed")?;
        let liquidity = tokio::time::timeout(RPC_CALL_TIMEOUT, contract.liquidity().call())
            .await
            .context("liquidity() timeout")?
            .context("liquidity() failed")?;
        let slot0 = tokio::time::timeout(RPC_CALL_TIMEOUT, contract.slot0().call())
            .await
            .context("slot0() timeout")?
            .context("slot0() failed")?;

        Ok(V3PoolState {
            token0,
            token1,
            fee: fee.to::<u32>(),
            sqrt_price_x96: U256::from(slot0.sqrtPriceX96),
            tick: slot0.tick.as_i32(),
            liquidity: U256::from(liquidity),
        })
    }

    async fn v4_pool_key(&self, hook: Address) -> Result<V4PoolKey> {
        let contract = IDopplerHook::new(hook, &self.provider);
        let key = tokio::time::timeout(RPC_CALL_TIMEOUT, contract.poolKey().call())
            .await
            .context("poolKey() timeout")?
            .context("poolKey() failed")?;

        Ok(V4PoolKey {
            currency0: key.currency0,
            currency1: key.currency1,
            fee: key.fee.to::<u32>(),
            tick_spacing: key.tickSpacing.as_i32(),
            hooks: key.hooks,
        })
    }

    async fn v4_pool_state(&self, pool_id: B256) -> Result<V4PoolState> {
        let contract = IStateView::new(self.state_view, &self.provider);

        let slot0 = tokio::time::timeout(RPC_CALL_TIMEOUT, contract.getSlot0(pool_id).call())
            .await
            .context("getSlot0() timeout")?
            .context("getSlot0() failed")?;
        let liquidity = tokio::time::timeout(RPC_CALL_TIMEOUT, contract.getLiquidity(pool_id).call())
            .await
            .context("getLiquidity() timeout")?
            .context("getLiquidity() failed")?;

        Ok(V4PoolState {
            sqrt_price_x96: U256::from(slot0.sqrtPriceX96),
            tick: slot0.tick.as_i32(),
            liquidity: U256::from(liquidity),
        })
    }
}
