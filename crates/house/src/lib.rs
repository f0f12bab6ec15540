//! Auction-house logic for the DAO auction platform.
//!
//! This crate mirrors the platform contract's semantics so they can be
//! exercised directly by tests and served by the mock chain:
//!
//! - One live auction at a time, opened per token id
//! - Payable bid submission with minimum-raise validation
//! - Full refund of the previous highest bidder
//! - Anti-sniping end-time extension inside the time buffer
//! - Settlement history feeding the average-winning-bid statistic
//! - A typed event log consumed by the indexing manifest
//!
//! # Architecture
//!
//! - `call`: borsh-encoded message types carried in transaction data
//! - `handlers`: business logic for processing calls
//! - `queries`: read-only state access
//! - `state`: house state structures
//! - `events`: the emitted event log
//! - `genesis`: initial configuration
//! - `error`: error types

pub mod call;
pub mod error;
pub mod events;
pub mod genesis;
pub mod handlers;
pub mod queries;
pub mod state;

pub use call::HouseCall;
pub use error::HouseError;
pub use events::HouseEvent;
pub use genesis::HouseGenesisConfig;
pub use handlers::{CallContext, HandlerResult};
pub use state::HouseState;
