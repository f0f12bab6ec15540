//! Invalidation-aware cache over chain query results.
//!
//! The cache holds the two datasets the bid submission flow depends on,
//! keyed by the composite [`CacheKey`]s. Invalidation drops an entry so the
//! next read refetches; per-key invalidation counts are observable so tests
//! can assert the exactly-once contract.

use parking_lot::Mutex;
use std::collections::HashMap;

use dao_auction_types::{AuctionContext, Bid, CacheKey, Wei};

use crate::error::ClientError;
use crate::rpc::HouseReader;

#[derive(Clone, Debug)]
enum CachedValue {
    Bids(Vec<Bid>),
    AverageBid(Option<Wei>),
}

#[derive(Debug, Default)]
struct CacheSlot {
    value: Option<CachedValue>,
    invalidations: u64,
}

/// Cache of chain query results.
#[derive(Debug, Default)]
pub struct QueryCache {
    slots: Mutex<HashMap<CacheKey, CacheSlot>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recent bids for the context's auction, fetched on miss.
    pub async fn bids<R: HouseReader>(
        &self,
        ctx: &AuctionContext,
        reader: &R,
    ) -> Result<Vec<Bid>, ClientError> {
        let key = ctx.bid_list_key();
        if let Some(CachedValue::Bids(bids)) = self.lookup(&key) {
            return Ok(bids);
        }
        let bids = reader.recent_bids(ctx.token_id).await?;
        self.store(key, CachedValue::Bids(bids.clone()));
        Ok(bids)
    }

    /// Average winning bid for the context's DAO, fetched on miss.
    pub async fn average_winning_bid<R: HouseReader>(
        &self,
        ctx: &AuctionContext,
        reader: &R,
    ) -> Result<Option<Wei>, ClientError> {
        let key = ctx.average_bid_key();
        if let Some(CachedValue::AverageBid(average)) = self.lookup(&key) {
            return Ok(average);
        }
        let average = reader.average_winning_bid().await?;
        self.store(key, CachedValue::AverageBid(average));
        Ok(average)
    }

    /// Mark a key stale; the next read refetches.
    pub fn invalidate(&self, key: &CacheKey) {
        let mut slots = self.slots.lock();
        let slot = slots.entry(*key).or_default();
        slot.value = None;
        slot.invalidations += 1;
    }

    /// How many times a key has been invalidated.
    pub fn invalidation_count(&self, key: &CacheKey) -> u64 {
        self.slots
            .lock()
            .get(key)
            .map(|slot| slot.invalidations)
            .unwrap_or(0)
    }

    fn lookup(&self, key: &CacheKey) -> Option<CachedValue> {
        self.slots.lock().get(key).and_then(|slot| slot.value.clone())
    }

    fn store(&self, key: CacheKey, value: CachedValue) {
        self.slots.lock().entry(key).or_default().value = Some(value);
    }
}
