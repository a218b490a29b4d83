//! zkLink bridge contracts.

use alloy_sol_types::sol;

sol! {
    /// zkLink rollup contract deployed on every connected L2.
    #[sol(rpc)]
    interface IZkLink {
        /// Send the number of processed L2 requests to the primary chain.
        function syncL2Requests(uint256 _newTotalSyncedPriorityTxs) external payable;
    }

    /// Arbitrator on L1, forwards admin calls to L2 through a chain gateway.
    #[sol(rpc)]
    interface IArbitrator {
        function setValidator(
            address _chainL1Gateway,
            address _validator,
            bool _active,
            bytes calldata _adapterParams
        ) external payable;
    }
}
