//! End-to-end tests for the DAO auction platform.
//!
//! These tests exercise the full bid lifecycle against the real house
//! logic:
//! 1. Auction creation
//! 2. Eligibility checks against on-chain parameters
//! 3. Submission through the risk warning gate
//! 4. Settlement and the average-winning-bid statistic
//! 5. Cache invalidation after confirmed bids

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use dao_auction_client::{ClientError, HouseReader, HouseWriter};
use dao_auction_house::{handlers, queries, CallContext, HouseCall, HouseGenesisConfig, HouseState};
use dao_auction_types::{
    Address, Auction, AuctionParams, Bid, BidTransaction, TokenId, TxHash, TxReceipt, Wei,
};

struct LocalChain {
    house: HouseState,
    block_height: u64,
    timestamp: u64,
    receipts: HashMap<TxHash, TxReceipt>,
}

/// In-process chain client: dispatches transactions straight into the
/// house handlers, mining each into the next simulated block.
#[derive(Clone)]
pub struct LocalHouseClient {
    chain: Arc<RwLock<LocalChain>>,
}

impl LocalHouseClient {
    pub fn new(genesis: &HouseGenesisConfig) -> Self {
        Self {
            chain: Arc::new(RwLock::new(LocalChain {
                house: genesis.initial_state(),
                block_height: 0,
                timestamp: 0,
                receipts: HashMap::new(),
            })),
        }
    }

    pub fn set_timestamp(&self, timestamp: u64) {
        self.chain.write().timestamp = timestamp;
    }

    pub fn create_auction(&self, sender: Address) -> TokenId {
        let mut chain = self.chain.write();
        let ctx = CallContext {
            sender,
            block_height: chain.block_height,
            timestamp: chain.timestamp,
            value: Wei::ZERO,
            tx_hash: TxHash::default(),
        };
        handlers::handle_create_auction(&mut chain.house, &ctx).expect("create auction")
    }

    pub fn settle(&self, sender: Address) {
        let mut chain = self.chain.write();
        let ctx = CallContext {
            sender,
            block_height: chain.block_height,
            timestamp: chain.timestamp,
            value: Wei::ZERO,
            tx_hash: TxHash::default(),
        };
        handlers::handle_settle_auction(&mut chain.house, &ctx).expect("settle auction");
    }

    pub fn end_time(&self) -> u64 {
        self.chain
            .read()
            .house
            .auction
            .as_ref()
            .expect("an auction is open")
            .end_time
    }

    /// Inspect house state.
    pub fn with_house<R>(&self, f: impl FnOnce(&HouseState) -> R) -> R {
        f(&self.chain.read().house)
    }
}

#[async_trait]
impl HouseReader for LocalHouseClient {
    async fn auction_params(&self) -> Result<AuctionParams, ClientError> {
        Ok(queries::get_params(&self.chain.read().house))
    }

    async fn current_auction(&self) -> Result<Option<Auction>, ClientError> {
        Ok(queries::get_auction(&self.chain.read().house))
    }

    async fn recent_bids(&self, token_id: TokenId) -> Result<Vec<Bid>, ClientError> {
        Ok(queries::get_bids(&self.chain.read().house, token_id))
    }

    async fn average_winning_bid(&self) -> Result<Option<Wei>, ClientError> {
        Ok(queries::average_winning_bid(&self.chain.read().house))
    }
}

#[async_trait]
impl HouseWriter for LocalHouseClient {
    async fn send_bid(&self, tx: &BidTransaction) -> Result<TxHash, ClientError> {
        let call = HouseCall::decode(&tx.data)
            .map_err(|e| ClientError::Chain(format!("malformed call data: {e}")))?;

        let mut chain = self.chain.write();
        chain.block_height += 1;
        let hash = tx.hash();
        let ctx = CallContext {
            sender: tx.from,
            block_height: chain.block_height,
            timestamp: chain.timestamp,
            value: tx.value,
            tx_hash: hash,
        };
        let status = handlers::apply_call(&mut chain.house, &ctx, call).is_ok();
        let receipt = TxReceipt {
            tx_hash: hash,
            block_number: chain.block_height,
            status,
        };
        chain.receipts.insert(hash, receipt);
        Ok(hash)
    }

    async fn wait_confirmed(&self, hash: TxHash) -> Result<TxReceipt, ClientError> {
        self.chain
            .read()
            .receipts
            .get(&hash)
            .copied()
            .ok_or_else(|| ClientError::Chain(format!("unknown transaction {hash}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dao_auction_client::{check_eligibility, BidFlow, QueryCache, SubmitOutcome};
    use dao_auction_types::{parse_ether, Address, AuctionContext, ChainId, ETH};

    const ADMIN: Address = Address([0x01; 20]);
    const ALICE: Address = Address([0x11; 20]);
    const BOB: Address = Address([0x22; 20]);
    const CAROL: Address = Address([0x33; 20]);

    fn genesis() -> HouseGenesisConfig {
        HouseGenesisConfig {
            dao_name: "Example DAO".to_string(),
            chain_id: ChainId(1),
            reserve_price: Wei(ETH),
            min_bid_increment: 10,
            duration: 86_400,
            time_buffer: 300,
            admin: ADMIN,
            ..Default::default()
        }
    }

    fn context(genesis: &HouseGenesisConfig, token_id: TokenId) -> AuctionContext {
        AuctionContext {
            chain_id: genesis.chain_id,
            dao_name: genesis.dao_name.clone(),
            house: genesis.house,
            token: genesis.token,
            token_id,
        }
    }

    fn flow_for(
        genesis: &HouseGenesisConfig,
        chain: &LocalHouseClient,
        sender: Address,
        token_id: TokenId,
        cache: Arc<QueryCache>,
    ) -> BidFlow<LocalHouseClient> {
        BidFlow::new(context(genesis, token_id), sender, chain.clone(), cache)
    }

    /// The complete lifecycle: eligibility, bidding, the warning gate,
    /// settlement, and the statistic refresh.
    #[tokio::test]
    async fn test_full_auction_flow() {
        let genesis = genesis();
        let chain = LocalHouseClient::new(&genesis);
        let cache = Arc::new(QueryCache::new());

        // ========================================
        // Phase 1: open the first auction
        // ========================================

        let token_id = chain.create_auction(ADMIN);
        assert_eq!(token_id, 0);

        // ========================================
        // Phase 2: eligibility against the reserve
        // ========================================

        let check = check_eligibility(&chain, "0.5").await.unwrap();
        assert_eq!(check.minimum, Wei(ETH));
        assert!(!check.eligible);

        let check = check_eligibility(&chain, "2").await.unwrap();
        assert!(check.eligible);

        // ========================================
        // Phase 3: a safe bid goes straight through
        // ========================================

        let ctx = context(&genesis, token_id);
        let alice = flow_for(&genesis, &chain, ALICE, token_id, Arc::clone(&cache));

        // no average yet: threshold is 5x the 1 ETH minimum
        let outcome = alice.submit(parse_ether("2").unwrap()).await;
        assert_eq!(outcome, SubmitOutcome::Completed);

        chain.with_house(|house| {
            let bid = house.auction.as_ref().unwrap().highest_bid.unwrap();
            assert_eq!(bid.bidder, ALICE);
            assert_eq!(bid.amount, Wei(2 * ETH));
        });
        assert_eq!(cache.invalidation_count(&ctx.bid_list_key()), 1);
        assert_eq!(cache.invalidation_count(&ctx.average_bid_key()), 1);

        // ========================================
        // Phase 4: the raise must clear the increment
        // ========================================

        // 2 ETH highest at 10% -> 2.2 ETH minimum
        let check = check_eligibility(&chain, "2.1").await.unwrap();
        assert_eq!(check.minimum, parse_ether("2.2").unwrap());
        assert!(!check.eligible);

        let bob = flow_for(&genesis, &chain, BOB, token_id, Arc::clone(&cache));
        let outcome = bob.submit(parse_ether("2.2").unwrap()).await;
        assert_eq!(outcome, SubmitOutcome::Completed);

        // Alice got her 2 ETH back
        chain.with_house(|house| {
            assert_eq!(house.refund_balance(&ALICE), Wei(2 * ETH));
        });

        // ========================================
        // Phase 5: an outsized bid trips the warning gate
        // ========================================

        // minimum is now 2.42 ETH; threshold 5x -> 12.1 ETH
        let carol = flow_for(&genesis, &chain, CAROL, token_id, Arc::clone(&cache));
        let outcome = carol.submit(parse_ether("13").unwrap()).await;
        assert_eq!(
            outcome,
            SubmitOutcome::NeedsConfirmation {
                amount: parse_ether("13").unwrap(),
                threshold: parse_ether("12.1").unwrap()
            }
        );

        // no transaction until the user confirms
        chain.with_house(|house| assert_eq!(house.bids[&token_id].len(), 2));

        let outcome = carol.confirm().await;
        assert_eq!(outcome, SubmitOutcome::Completed);
        chain.with_house(|house| assert_eq!(house.bids[&token_id].len(), 3));

        // ========================================
        // Phase 6: settle and observe the statistic
        // ========================================

        chain.set_timestamp(chain.end_time());
        chain.settle(ADMIN);

        // the flow invalidated the statistic after Carol's bid, so the
        // next cached read refetches and sees the settlement
        let average = cache.average_winning_bid(&ctx, &chain).await.unwrap();
        assert_eq!(average, Some(parse_ether("13").unwrap()));

        // ========================================
        // Phase 7: the next auction uses the average as reference
        // ========================================

        let next_id = chain.create_auction(ADMIN);
        assert_eq!(next_id, 1);

        let dave = flow_for(&genesis, &chain, Address([0x44; 20]), next_id, Arc::clone(&cache));
        // 13 ETH average -> threshold 65 ETH; 60 submits directly
        let outcome = dave.submit(parse_ether("60").unwrap()).await;
        assert_eq!(outcome, SubmitOutcome::Completed);
    }

    #[tokio::test]
    async fn cancelled_warning_never_reaches_the_chain() {
        let genesis = genesis();
        let chain = LocalHouseClient::new(&genesis);
        let cache = Arc::new(QueryCache::new());
        let token_id = chain.create_auction(ADMIN);

        let flow = flow_for(&genesis, &chain, ALICE, token_id, Arc::clone(&cache));

        // threshold is 5 ETH with no bids and no average
        let outcome = flow.submit(parse_ether("6").unwrap()).await;
        assert!(matches!(outcome, SubmitOutcome::NeedsConfirmation { .. }));

        flow.cancel();
        assert!(flow.is_idle());

        chain.with_house(|house| assert!(house.bids[&token_id].is_empty()));
        let ctx = context(&genesis, token_id);
        assert_eq!(cache.invalidation_count(&ctx.bid_list_key()), 0);
        assert_eq!(cache.invalidation_count(&ctx.average_bid_key()), 0);
    }

    #[tokio::test]
    async fn ineligible_bid_is_rejected_before_broadcast() {
        let genesis = genesis();
        let chain = LocalHouseClient::new(&genesis);
        let token_id = chain.create_auction(ADMIN);

        let flow = flow_for(
            &genesis,
            &chain,
            ALICE,
            token_id,
            Arc::new(QueryCache::new()),
        );

        let outcome = flow.submit(parse_ether("0.5").unwrap()).await;
        assert_eq!(outcome, SubmitOutcome::Rejected { minimum: Wei(ETH) });
        chain.with_house(|house| assert!(house.bids[&token_id].is_empty()));
    }

    #[tokio::test]
    async fn reverted_bid_is_swallowed_and_invalidates_nothing() {
        let genesis = genesis();
        let chain = LocalHouseClient::new(&genesis);
        let cache = Arc::new(QueryCache::new());
        let token_id = chain.create_auction(ADMIN);

        // a flow wired to a stale token id: the client-side checks pass,
        // but the house rejects the bid and the receipt reports a revert
        let flow = flow_for(&genesis, &chain, ALICE, token_id + 1, Arc::clone(&cache));

        let outcome = flow.submit(parse_ether("2").unwrap()).await;
        assert_eq!(outcome, SubmitOutcome::Completed);
        assert!(flow.is_idle());

        chain.with_house(|house| assert!(house.bids[&token_id].is_empty()));
        let ctx = context(&genesis, token_id + 1);
        assert_eq!(cache.invalidation_count(&ctx.bid_list_key()), 0);
        assert_eq!(cache.invalidation_count(&ctx.average_bid_key()), 0);
    }

    /// Every event the house emits is declared in the stock indexing
    /// manifest, so the off-chain dataset sees the whole lifecycle.
    #[tokio::test]
    async fn emitted_events_are_declared_in_the_manifest() {
        use dao_auction_indexer::Manifest;

        let genesis = genesis();
        let chain = LocalHouseClient::new(&genesis);
        let token_id = chain.create_auction(ADMIN);

        let flow = flow_for(
            &genesis,
            &chain,
            ALICE,
            token_id,
            Arc::new(QueryCache::new()),
        );
        flow.submit(parse_ether("2").unwrap()).await;
        chain.set_timestamp(chain.end_time());
        chain.settle(ADMIN);

        let manifest = Manifest::dao_default(
            "mainnet",
            genesis.house,
            genesis.token,
            Address([0xcc; 20]),
            1,
        );
        manifest.validate().unwrap();

        let house_source = manifest
            .data_sources
            .iter()
            .find(|s| s.name == "AuctionHouse")
            .unwrap();
        let declared: Vec<&str> = house_source
            .mapping
            .event_handlers
            .iter()
            .map(|h| h.event.split('(').next().unwrap())
            .collect();

        chain.with_house(|house| {
            for event in &house.events {
                assert!(
                    declared.contains(&event.name()),
                    "event {} missing from the manifest",
                    event.name()
                );
            }
        });
    }

    #[tokio::test]
    async fn bid_list_cache_refreshes_after_invalidation() {
        let genesis = genesis();
        let chain = LocalHouseClient::new(&genesis);
        let cache = Arc::new(QueryCache::new());
        let token_id = chain.create_auction(ADMIN);
        let ctx = context(&genesis, token_id);

        // warm the cache while the list is empty
        assert!(cache.bids(&ctx, &chain).await.unwrap().is_empty());

        let flow = flow_for(&genesis, &chain, ALICE, token_id, Arc::clone(&cache));
        flow.submit(parse_ether("2").unwrap()).await;

        // the confirmed bid invalidated the list; the refetch sees it
        let bids = cache.bids(&ctx, &chain).await.unwrap();
        assert_eq!(bids.len(), 1);
        assert_eq!(bids[0].bidder, ALICE);
    }
}
