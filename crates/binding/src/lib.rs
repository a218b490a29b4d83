//! Solidity bindings for every contract the operations tasks touch.
//!
//! - zkLink contracts (zkLink on L2, Arbitrator on L1)
//! - OP Stack contracts (L2ToL1MessagePasser, OptimismPortal2, dispute games)
//! - Scroll L1 message queue
//!
//! All bindings are generated using alloy's `sol!` macro.

pub mod opstack;
pub mod scroll;
pub mod zklink;
