use alloy_primitives::{keccak256, B256};
use alloy_sol_types::SolValue;
use binding::opstack::WithdrawalTransaction;

/// `Hashing.hashWithdrawal`: keccak256 over the abi-encoded fields, without
/// the struct offset `abi.encode(tx)` would add.
pub fn withdrawal_hash(tx: &WithdrawalTransaction) -> B256 {
    let encoded = (
        &tx.nonce,
        &tx.sender,
        &tx.target,
        &tx.value,
        &tx.gasLimit,
        &tx.data,
    )
        .abi_encode_sequence();

    keccak256(encoded)
}

/// Slot of `sentMessages[hash]` in the message passer (mapping at slot 0).
pub fn sent_message_slot(hash: B256) -> B256 {
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(hash.as_slice());
    keccak256(data)
}
