use alloy::sol;

sol! {
    event Swap(bytes32 indexed id, address indexed sender, int128 amount0, int128 amount1, uint160 sqrtPriceX96, uint128 liquidity, int24 tick, uint24 fee);

    /// The bonding-curve hook owns one singleton pool and exposes its key.
    #[sol(rpc)]
    interface IDopplerHook {
        function poolKey() external view returns (address currency0, address currency1, uint24 fee, int24 tickSpacing, address hooks);
    }
}
