//! Read-only state access for the auction house.

use dao_auction_types::{Auction, AuctionParams, Bid, TokenId, Wei};

use crate::state::HouseState;

/// Batched parameter read. Consumed positionally over RPC as
/// `[reserve_price, min_bid_increment]`.
pub fn get_params(state: &HouseState) -> AuctionParams {
    state.config.params
}

/// The live (or just-settled) auction.
pub fn get_auction(state: &HouseState) -> Option<Auction> {
    state.auction.clone()
}

/// Bids for an auction, most recent first.
pub fn get_bids(state: &HouseState, token_id: TokenId) -> Vec<Bid> {
    let mut bids = state.bids.get(&token_id).cloned().unwrap_or_default();
    bids.reverse();
    bids
}

/// Mean of the winning bids across settlement history.
///
/// `None` until at least one auction settled with a winner.
pub fn average_winning_bid(state: &HouseState) -> Option<Wei> {
    if state.settlements.is_empty() {
        return None;
    }
    let sum: u128 = state.settlements.iter().map(|s| s.amount.0).sum();
    Some(Wei(sum / state.settlements.len() as u128))
}

/// Number of events emitted so far.
pub fn event_count(state: &HouseState) -> usize {
    state.events.len()
}
