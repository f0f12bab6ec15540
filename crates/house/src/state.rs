//! Auction-house state structures.

use dao_auction_types::{Address, Auction, AuctionParams, Bid, TokenId, Wei};
use std::collections::HashMap;

use crate::events::HouseEvent;

/// Adjustable house configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HouseConfig {
    pub params: AuctionParams,
    /// Auction length in seconds.
    pub duration: u64,
    /// Window before the end time in which a bid extends the auction.
    pub time_buffer: u64,
    /// Account allowed to change parameters.
    pub admin: Address,
}

/// A settled auction with a winning bid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub token_id: TokenId,
    pub winner: Address,
    pub amount: Wei,
    pub settled_at: u64,
}

/// Auction-house state.
///
/// In-memory representation of the contract storage, shared by the tests
/// and the mock chain.
#[derive(Clone, Debug)]
pub struct HouseState {
    pub config: HouseConfig,

    /// The single live (or just-settled) auction.
    pub auction: Option<Auction>,

    /// All bids per auction, in submission order.
    pub bids: HashMap<TokenId, Vec<Bid>>,

    /// History of auctions settled with a winner.
    pub settlements: Vec<Settlement>,

    /// Amounts owed back to outbid bidders.
    pub refunds: HashMap<Address, Wei>,

    /// Emitted events, in order.
    pub events: Vec<HouseEvent>,

    /// Token id the next auction will carry.
    pub next_token_id: TokenId,
}

impl HouseState {
    pub fn new(config: HouseConfig) -> Self {
        Self {
            config,
            auction: None,
            bids: HashMap::new(),
            settlements: Vec::new(),
            refunds: HashMap::new(),
            events: Vec::new(),
            next_token_id: 0,
        }
    }

    /// Take the next token id and advance the counter.
    pub fn allocate_token_id(&mut self) -> TokenId {
        let id = self.next_token_id;
        self.next_token_id += 1;
        id
    }

    /// Credit a refund owed to an outbid bidder.
    pub fn credit_refund(&mut self, bidder: Address, amount: Wei) {
        let entry = self.refunds.entry(bidder).or_insert(Wei::ZERO);
        *entry = entry.checked_add(amount).unwrap_or(*entry);
    }

    /// Refund balance owed to an account.
    pub fn refund_balance(&self, bidder: &Address) -> Wei {
        self.refunds.get(bidder).copied().unwrap_or(Wei::ZERO)
    }

    pub fn emit(&mut self, event: HouseEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dao_auction_types::ETH;

    fn test_config() -> HouseConfig {
        HouseConfig {
            params: AuctionParams {
                reserve_price: Wei(ETH),
                min_bid_increment: 10,
            },
            duration: 86_400,
            time_buffer: 300,
            admin: Address([9; 20]),
        }
    }

    #[test]
    fn token_ids_are_sequential() {
        let mut state = HouseState::new(test_config());
        assert_eq!(state.allocate_token_id(), 0);
        assert_eq!(state.allocate_token_id(), 1);
        assert_eq!(state.allocate_token_id(), 2);
    }

    #[test]
    fn refunds_accumulate() {
        let mut state = HouseState::new(test_config());
        let bidder = Address([1; 20]);

        assert_eq!(state.refund_balance(&bidder), Wei::ZERO);

        state.credit_refund(bidder, Wei(100));
        state.credit_refund(bidder, Wei(50));
        assert_eq!(state.refund_balance(&bidder), Wei(150));
    }
}
