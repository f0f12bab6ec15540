//! Scriptable in-memory chain client for exercising the flow without a
//! chain.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Notify;

use dao_auction_types::{
    Auction, AuctionParams, Bid, BidTransaction, TokenId, TxHash, TxReceipt, Wei, ETH,
};

use crate::error::ClientError;
use crate::rpc::{HouseReader, HouseWriter};

/// Failure script for [`MockHouseClient`].
#[derive(Clone, Copy, Debug, Default)]
pub struct MockBehavior {
    /// `send_bid` returns an error.
    pub fail_send: bool,
    /// `wait_confirmed` returns an error.
    pub fail_confirm: bool,
    /// The receipt reports a reverted call.
    pub revert: bool,
    /// `wait_confirmed` blocks until [`MockHouseClient::release_confirm`].
    pub hold_confirm: bool,
}

/// Mock chain client for tests.
pub struct MockHouseClient {
    params: Mutex<AuctionParams>,
    auction: Mutex<Option<Auction>>,
    average: Mutex<Option<Wei>>,
    bids: Mutex<Vec<Bid>>,
    behavior: Mutex<MockBehavior>,
    sent: Mutex<Vec<BidTransaction>>,
    average_fetches: AtomicU64,
    bid_fetches: AtomicU64,
    confirm_gate: Notify,
}

impl Default for MockHouseClient {
    fn default() -> Self {
        Self {
            params: Mutex::new(AuctionParams {
                reserve_price: Wei(ETH),
                min_bid_increment: 10,
            }),
            auction: Mutex::new(Some(Auction {
                token_id: 3,
                start_time: 0,
                end_time: u64::MAX,
                highest_bid: None,
                settled: false,
            })),
            average: Mutex::new(None),
            bids: Mutex::new(Vec::new()),
            behavior: Mutex::new(MockBehavior::default()),
            sent: Mutex::new(Vec::new()),
            average_fetches: AtomicU64::new(0),
            bid_fetches: AtomicU64::new(0),
            confirm_gate: Notify::new(),
        }
    }
}

impl MockHouseClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_params(&self, params: AuctionParams) {
        *self.params.lock() = params;
    }

    pub fn set_highest_bid(&self, bid: Option<Bid>) {
        if let Some(auction) = self.auction.lock().as_mut() {
            auction.highest_bid = bid;
        }
    }

    pub fn set_average(&self, average: Option<Wei>) {
        *self.average.lock() = average;
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock() = behavior;
    }

    /// Unblock a held `wait_confirmed`.
    pub fn release_confirm(&self) {
        self.confirm_gate.notify_one();
    }

    /// Transactions passed to `send_bid`.
    pub fn sent(&self) -> Vec<BidTransaction> {
        self.sent.lock().clone()
    }

    pub fn average_fetches(&self) -> u64 {
        self.average_fetches.load(Ordering::SeqCst)
    }

    pub fn bid_fetches(&self) -> u64 {
        self.bid_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HouseReader for MockHouseClient {
    async fn auction_params(&self) -> Result<AuctionParams, ClientError> {
        Ok(*self.params.lock())
    }

    async fn current_auction(&self) -> Result<Option<Auction>, ClientError> {
        Ok(self.auction.lock().clone())
    }

    async fn recent_bids(&self, _token_id: TokenId) -> Result<Vec<Bid>, ClientError> {
        self.bid_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.bids.lock().clone())
    }

    async fn average_winning_bid(&self) -> Result<Option<Wei>, ClientError> {
        self.average_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(*self.average.lock())
    }
}

#[async_trait]
impl HouseWriter for MockHouseClient {
    async fn send_bid(&self, tx: &BidTransaction) -> Result<TxHash, ClientError> {
        if self.behavior.lock().fail_send {
            return Err(ClientError::Chain("broadcast refused".to_string()));
        }
        self.sent.lock().push(tx.clone());
        Ok(tx.hash())
    }

    async fn wait_confirmed(&self, hash: TxHash) -> Result<TxReceipt, ClientError> {
        let behavior = *self.behavior.lock();
        if behavior.hold_confirm {
            self.confirm_gate.notified().await;
        }
        if behavior.fail_confirm {
            return Err(ClientError::Chain("confirmation lost".to_string()));
        }
        Ok(TxReceipt {
            tx_hash: hash,
            block_number: 1,
            status: !behavior.revert,
        })
    }
}
