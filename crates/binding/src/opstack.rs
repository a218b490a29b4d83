//! OP Stack bindings used to carry an L2→L1 message to finality.
//!
//! The zkLink gateway on an OP Stack L2 sends its sync point through the
//! `L2CrossDomainMessenger`, which records it in the `L2ToL1MessagePasser`
//! predeploy. Proving and relaying happen against `OptimismPortal2` on L1.

use alloy_primitives::{address, b256, Address, B256};
use alloy_sol_types::sol;

/// `L2ToL1MessagePasser` predeploy, identical on every OP Stack chain.
pub const MESSAGE_PASSER_ADDRESS: Address = address!("4200000000000000000000000000000000000016");

/// Output root version committed by dispute games.
pub const OUTPUT_VERSION_V0: B256 =
    b256!("0000000000000000000000000000000000000000000000000000000000000000");

sol! {
    #[sol(rpc)]
    interface IL2ToL1MessagePasser {
        /// Emitted for every message leaving the L2.
        event MessagePassed(
            uint256 indexed nonce,
            address indexed sender,
            address indexed target,
            uint256 value,
            uint256 gasLimit,
            bytes data,
            bytes32 withdrawalHash
        );

        function sentMessages(bytes32) external view returns (bool);
    }

    #[sol(rpc)]
    interface IOptimismPortal2 {
        #[derive(Debug)]
        struct ProvenWithdrawal {
            address disputeGameProxy;
            uint64 timestamp;
        }

        function provenWithdrawals(bytes32 withdrawalHash, address proofSubmitter)
            external view returns (ProvenWithdrawal memory);

        function finalizedWithdrawals(bytes32 withdrawalHash)
            external view returns (bool);

        /// Challenge window between proof and relay, in seconds.
        function proofMaturityDelaySeconds()
            external view returns (uint256);

        function respectedGameType()
            external view returns (uint32);

        function proveWithdrawalTransaction(
            WithdrawalTransaction calldata _tx,
            uint256 _disputeGameIndex,
            OutputRootProof calldata _outputRootProof,
            bytes[] calldata _withdrawalProof
        ) external;

        function finalizeWithdrawalTransactionExternalProof(
            WithdrawalTransaction calldata _tx,
            address _proofSubmitter
        ) external;
    }

    #[sol(rpc)]
    interface IDisputeGameFactory {
        struct GameSearchResult {
            uint256 index;
            bytes32 metadata;
            uint64 timestamp;
            bytes32 rootClaim;
            bytes extraData;
        }

        function gameCount() external view returns (uint256 gameCount_);

        /// Games of `_gameType`, newest first, starting at index `_start`.
        function findLatestGames(
            uint32 _gameType,
            uint256 _start,
            uint256 _n
        ) external view returns (GameSearchResult[] memory);
    }

    #[sol(rpc)]
    interface IFaultDisputeGame {
        function l2BlockNumber() external view returns (uint256);
    }

    #[derive(Debug)]
    struct OutputRootProof {
        bytes32 version;
        bytes32 stateRoot;
        bytes32 messagePasserStorageRoot;
        bytes32 latestBlockhash;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct WithdrawalTransaction {
        uint256 nonce;
        address sender;
        address target;
        uint256 value;
        uint256 gasLimit;
        bytes data;
    }
}
