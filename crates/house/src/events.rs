//! Events emitted by the auction house.
//!
//! The event log is the on-chain dataset the indexing manifest declares
//! handlers for; names here match the manifest's event signatures.

use borsh::{BorshDeserialize, BorshSerialize};
use dao_auction_types::{Address, TokenId, Wei};
use serde::{Deserialize, Serialize};

/// An auction-house event.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum HouseEvent {
    #[serde(rename_all = "camelCase")]
    AuctionCreated {
        token_id: TokenId,
        start_time: u64,
        end_time: u64,
    },

    #[serde(rename_all = "camelCase")]
    AuctionBid {
        token_id: TokenId,
        bidder: Address,
        amount: Wei,
        extended: bool,
    },

    #[serde(rename_all = "camelCase")]
    AuctionExtended { token_id: TokenId, end_time: u64 },

    #[serde(rename_all = "camelCase")]
    AuctionSettled {
        token_id: TokenId,
        winner: Option<Address>,
        amount: Wei,
    },
}

impl HouseEvent {
    /// Event name as declared in the indexing manifest.
    pub fn name(&self) -> &'static str {
        match self {
            HouseEvent::AuctionCreated { .. } => "AuctionCreated",
            HouseEvent::AuctionBid { .. } => "AuctionBid",
            HouseEvent::AuctionExtended { .. } => "AuctionExtended",
            HouseEvent::AuctionSettled { .. } => "AuctionSettled",
        }
    }
}
