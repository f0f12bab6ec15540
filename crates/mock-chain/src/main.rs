//! Mock chain server for local testing of the DAO auction platform.
//!
//! This provides a JSON-RPC server that simulates on-chain state management
//! for the auction house without requiring a real chain. Transactions are
//! mined into the next block immediately; the borsh-encoded `data` bytes
//! are decoded into house calls and dispatched with the transaction value
//! as the payable amount.

use anyhow::Result;
use borsh::BorshDeserialize;
use jsonrpsee::core::async_trait;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::Server;
use jsonrpsee::types::ErrorObjectOwned;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use dao_auction_house::queries;
use dao_auction_house::{
    handlers, CallContext, HouseCall, HouseEvent, HouseGenesisConfig, HouseState,
};
use dao_auction_types::{
    Address, Auction, Bid, BidTransaction, TxHash, TxReceipt, Wei,
};

mod types;
use types::*;

/// Seconds between simulated blocks.
const BLOCK_INTERVAL: u64 = 12;

/// Shared chain state.
struct ChainState {
    genesis: HouseGenesisConfig,
    house: HouseState,
    /// Current block height (simulated).
    block_height: u64,
    /// Current timestamp (simulated, can be advanced).
    timestamp: u64,
    /// Receipts for mined transactions.
    receipts: HashMap<TxHash, TxReceipt>,
}

impl ChainState {
    fn new(genesis: HouseGenesisConfig) -> Self {
        let house = genesis.initial_state();
        Self {
            genesis,
            house,
            block_height: 0,
            timestamp: 0,
            receipts: HashMap::new(),
        }
    }

    fn advance_block(&mut self) {
        self.block_height += 1;
        self.timestamp += BLOCK_INTERVAL;
    }

    fn set_timestamp(&mut self, ts: u64) {
        self.timestamp = ts;
    }

    fn context(&self, sender: Address, value: Wei, tx_hash: TxHash) -> CallContext {
        CallContext {
            sender,
            block_height: self.block_height,
            timestamp: self.timestamp,
            value,
            tx_hash,
        }
    }
}

/// RPC API definition for the mock chain.
#[rpc(server)]
pub trait MockChainApi {
    // ============ Admin Methods ============

    /// Reset the chain with a genesis config.
    #[method(name = "admin_init")]
    async fn admin_init(&self, genesis: HouseGenesisConfig) -> Result<bool, ErrorObjectOwned>;

    /// Advance the chain by one block.
    #[method(name = "admin_advanceBlock")]
    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Set the current timestamp (for testing time-dependent logic).
    #[method(name = "admin_setTimestamp")]
    async fn admin_set_timestamp(&self, timestamp: u64) -> Result<bool, ErrorObjectOwned>;

    // ============ Chain Methods ============

    /// Get current block info.
    #[method(name = "chain_getBlockInfo")]
    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Mine a borsh-encoded bid transaction, returning its hash.
    #[method(name = "chain_sendRawTransaction")]
    async fn chain_send_raw_transaction(&self, raw: String) -> Result<String, ErrorObjectOwned>;

    /// Get the receipt of a mined transaction.
    #[method(name = "chain_getTransactionReceipt")]
    async fn chain_get_transaction_receipt(
        &self,
        hash: String,
    ) -> Result<Option<TxReceipt>, ErrorObjectOwned>;

    // ============ Auction House Methods ============

    /// Open the next auction.
    #[method(name = "auctionHouse_createAuction")]
    async fn auction_house_create_auction(&self, sender: String) -> Result<u64, ErrorObjectOwned>;

    /// Settle the current auction.
    #[method(name = "auctionHouse_settle")]
    async fn auction_house_settle(&self, sender: String) -> Result<bool, ErrorObjectOwned>;

    // ============ Query Methods ============

    /// Get the DAO configuration.
    #[method(name = "query_getConfig")]
    async fn query_get_config(&self) -> Result<DaoConfigRpc, ErrorObjectOwned>;

    /// Batched parameter read: `[reserve_price, min_bid_increment]`.
    #[method(name = "query_getAuctionParams")]
    async fn query_get_auction_params(&self) -> Result<(Wei, u8), ErrorObjectOwned>;

    /// Get the current auction.
    #[method(name = "query_getAuction")]
    async fn query_get_auction(&self) -> Result<Option<Auction>, ErrorObjectOwned>;

    /// Get bids for an auction, most recent first.
    #[method(name = "query_getBids")]
    async fn query_get_bids(&self, token_id: u64) -> Result<Vec<Bid>, ErrorObjectOwned>;

    /// Get the historical average winning bid.
    #[method(name = "query_getAverageWinningBid")]
    async fn query_get_average_winning_bid(&self) -> Result<Option<Wei>, ErrorObjectOwned>;

    /// Get the emitted event log.
    #[method(name = "query_getEvents")]
    async fn query_get_events(&self) -> Result<Vec<HouseEvent>, ErrorObjectOwned>;
}

/// Implementation of the mock chain RPC server.
struct MockChainServer {
    state: Arc<RwLock<ChainState>>,
}

impl MockChainServer {
    fn new(genesis: HouseGenesisConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(ChainState::new(genesis))),
        }
    }

    fn rpc_error(msg: &str) -> ErrorObjectOwned {
        ErrorObjectOwned::owned(-32000, msg.to_string(), None::<()>)
    }

    fn parse_sender(s: &str) -> Result<Address, ErrorObjectOwned> {
        s.parse()
            .map_err(|e| Self::rpc_error(&format!("invalid sender address: {e}")))
    }
}

#[async_trait]
impl MockChainApiServer for MockChainServer {
    async fn admin_init(&self, genesis: HouseGenesisConfig) -> Result<bool, ErrorObjectOwned> {
        let mut state = self.state.write();
        *state = ChainState::new(genesis);
        info!("Chain reinitialized");
        Ok(true)
    }

    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        let mut state = self.state.write();
        state.advance_block();
        Ok(BlockInfo {
            height: state.block_height,
            timestamp: state.timestamp,
        })
    }

    async fn admin_set_timestamp(&self, timestamp: u64) -> Result<bool, ErrorObjectOwned> {
        let mut state = self.state.write();
        state.set_timestamp(timestamp);
        info!("Timestamp set to {}", timestamp);
        Ok(true)
    }

    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(BlockInfo {
            height: state.block_height,
            timestamp: state.timestamp,
        })
    }

    async fn chain_send_raw_transaction(&self, raw: String) -> Result<String, ErrorObjectOwned> {
        let bytes = hex::decode(raw.strip_prefix("0x").unwrap_or(&raw))
            .map_err(|e| Self::rpc_error(&format!("invalid transaction hex: {e}")))?;
        let tx = BidTransaction::try_from_slice(&bytes)
            .map_err(|e| Self::rpc_error(&format!("malformed transaction: {e}")))?;

        let mut state = self.state.write();
        if tx.chain_id != state.genesis.chain_id {
            return Err(Self::rpc_error(&format!(
                "wrong chain id: {}",
                tx.chain_id
            )));
        }
        if tx.to != state.genesis.house {
            return Err(Self::rpc_error(&format!("unknown contract: {}", tx.to)));
        }
        let call = HouseCall::decode(&tx.data)
            .map_err(|e| Self::rpc_error(&format!("malformed call data: {e}")))?;

        // mine the transaction into the next block
        state.advance_block();
        let hash = tx.hash();
        let ctx = state.context(tx.from, tx.value, hash);
        let status = match handlers::apply_call(&mut state.house, &ctx, call) {
            Ok(()) => true,
            Err(e) => {
                warn!("transaction {} reverted: {}", hash, e);
                false
            }
        };

        let receipt = TxReceipt {
            tx_hash: hash,
            block_number: state.block_height,
            status,
        };
        state.receipts.insert(hash, receipt);

        info!("Mined transaction {} (status: {})", hash, status);
        Ok(hash.to_string())
    }

    async fn chain_get_transaction_receipt(
        &self,
        hash: String,
    ) -> Result<Option<TxReceipt>, ErrorObjectOwned> {
        let hash: TxHash = hash
            .parse()
            .map_err(|e| Self::rpc_error(&format!("invalid hash: {e}")))?;
        let state = self.state.read();
        Ok(state.receipts.get(&hash).copied())
    }

    async fn auction_house_create_auction(&self, sender: String) -> Result<u64, ErrorObjectOwned> {
        let sender = Self::parse_sender(&sender)?;
        let mut state = self.state.write();
        state.advance_block();
        let ctx = state.context(sender, Wei::ZERO, TxHash::default());
        let token_id = handlers::handle_create_auction(&mut state.house, &ctx)
            .map_err(|e| Self::rpc_error(&format!("failed to create auction: {e}")))?;
        info!("Created auction for token {}", token_id);
        Ok(token_id)
    }

    async fn auction_house_settle(&self, sender: String) -> Result<bool, ErrorObjectOwned> {
        let sender = Self::parse_sender(&sender)?;
        let mut state = self.state.write();
        state.advance_block();
        let ctx = state.context(sender, Wei::ZERO, TxHash::default());
        handlers::handle_settle_auction(&mut state.house, &ctx)
            .map_err(|e| Self::rpc_error(&format!("failed to settle: {e}")))?;
        info!("Auction settled");
        Ok(true)
    }

    async fn query_get_config(&self) -> Result<DaoConfigRpc, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(DaoConfigRpc::from(&state.genesis))
    }

    async fn query_get_auction_params(&self) -> Result<(Wei, u8), ErrorObjectOwned> {
        let state = self.state.read();
        let params = queries::get_params(&state.house);
        Ok((params.reserve_price, params.min_bid_increment))
    }

    async fn query_get_auction(&self) -> Result<Option<Auction>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(queries::get_auction(&state.house))
    }

    async fn query_get_bids(&self, token_id: u64) -> Result<Vec<Bid>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(queries::get_bids(&state.house, token_id))
    }

    async fn query_get_average_winning_bid(&self) -> Result<Option<Wei>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(queries::average_winning_bid(&state.house))
    }

    async fn query_get_events(&self) -> Result<Vec<HouseEvent>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(state.house.events.clone())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mock_chain=info".parse().unwrap())
                .add_directive("jsonrpsee=warn".parse().unwrap()),
        )
        .init();

    let addr: SocketAddr = "127.0.0.1:9944".parse()?;

    info!("Starting mock chain server on {}", addr);

    let server = Server::builder().build(addr).await?;
    let handle = server.start(MockChainServer::new(HouseGenesisConfig::default()).into_rpc());

    info!("Mock chain server running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    handle.stop()?;
    handle.stopped().await;

    Ok(())
}
