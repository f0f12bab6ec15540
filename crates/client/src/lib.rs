//! Client SDK for bidding in DAO auctions.
//!
//! This crate provides a high-level API for:
//! - Checking bid eligibility against on-chain auction parameters
//! - Submitting bids with a risk warning gate for anomalous amounts
//! - Awaiting transaction confirmation
//! - Querying auction state through an invalidation-aware cache

pub mod cache;
pub mod eligibility;
pub mod error;
pub mod flow;
pub mod rpc;
pub mod testing;

pub use cache::QueryCache;
pub use eligibility::{check_eligibility, BidEligibility};
pub use error::ClientError;
pub use flow::{BidFlow, SubmitOutcome};
pub use rpc::{HouseReader, HouseWriter, RpcHouseClient};
