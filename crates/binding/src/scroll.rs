//! Scroll L1 contracts needed to price an L1→L2 message.

use alloy_sol_types::sol;

sol! {
    #[sol(rpc)]
    interface IL1MessageQueue {
        /// Fee in wei for relaying a message with the given L2 gas limit.
        function estimateCrossDomainMessageFee(uint256 _gasLimit)
            external view returns (uint256);
    }
}
