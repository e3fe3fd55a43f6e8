use alloy::sol;

sol! {
    /// Emitted by the launcher/initializer contracts on pool creation.
    /// `poolOrHook` is the pair address (V2), the pool address (V3), or the
    /// hook address (V4 singleton pools).
    event Create(address poolOrHook, address indexed asset, address indexed numeraire);
}
