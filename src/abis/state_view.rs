use alloy::sol;

sol! {
    /// Read-only accessor over the V4 pool manager's packed state,
    /// keyed by pool id (keccak of the ABI-encoded pool key).
    #[sol(rpc)]
    interface IStateView {
        function getSlot0(bytes32 poolId) external view returns (uint160 sqrtPriceX96, int24 tick, uint24 protocolFee, uint24 lpFee);
        function getLiquidity(bytes32 poolId) external view returns (uint128 liquidity);
    }
}
