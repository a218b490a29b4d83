//! Carrying zkLink's L2→L1 messages through an OP Stack bridge.
//!
//! The sync point a zkLink gateway sends from an OP Stack L2 is an ordinary
//! withdrawal: it must be proven against a dispute game and, after the proof
//! maturity delay, finalized on `OptimismPortal2`. [`OpStackOracle`] exposes
//! that lifecycle as a [`task::BridgeOracle`].

pub mod hash;
pub mod message;
mod oracle;
pub mod portal;
pub mod proof;

pub use oracle::OpStackOracle;
