//! Chain-facing interfaces and their JSON-RPC implementation.
//!
//! The traits are the seam the bid submission flow is written against; the
//! JSON-RPC client targets the mock chain (or any chain speaking the same
//! namespace).

use async_trait::async_trait;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use std::time::Duration;

use dao_auction_types::{
    Auction, AuctionParams, Bid, BidTransaction, TokenId, TxHash, TxReceipt, Wei,
};

use crate::error::ClientError;

/// Read-only access to auction-house state.
#[async_trait]
pub trait HouseReader: Send + Sync {
    /// Batched read of reserve price and minimum bid increment.
    async fn auction_params(&self) -> Result<AuctionParams, ClientError>;

    /// The live (or just-settled) auction.
    async fn current_auction(&self) -> Result<Option<Auction>, ClientError>;

    /// Recent bids for an auction, most recent first.
    async fn recent_bids(&self, token_id: TokenId) -> Result<Vec<Bid>, ClientError>;

    /// Historical average winning bid for the DAO token.
    async fn average_winning_bid(&self) -> Result<Option<Wei>, ClientError>;
}

/// Transaction submission.
#[async_trait]
pub trait HouseWriter: Send + Sync {
    /// Broadcast a prepared bid transaction, returning its hash.
    async fn send_bid(&self, tx: &BidTransaction) -> Result<TxHash, ClientError>;

    /// Wait until the transaction has a receipt.
    ///
    /// No timeout: a confirmation that never lands blocks the caller.
    async fn wait_confirmed(&self, hash: TxHash) -> Result<TxReceipt, ClientError>;
}

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// JSON-RPC implementation of the chain interfaces.
pub struct RpcHouseClient {
    http: HttpClient,
}

impl RpcHouseClient {
    pub fn new(url: &str) -> Result<Self, ClientError> {
        let http = HttpClientBuilder::default().build(url)?;
        Ok(Self { http })
    }
}

#[async_trait]
impl HouseReader for RpcHouseClient {
    async fn auction_params(&self) -> Result<AuctionParams, ClientError> {
        // raw values, consumed positionally
        let (reserve_price, min_bid_increment): (Wei, u8) = self
            .http
            .request("query_getAuctionParams", rpc_params![])
            .await?;
        Ok(AuctionParams {
            reserve_price,
            min_bid_increment,
        })
    }

    async fn current_auction(&self) -> Result<Option<Auction>, ClientError> {
        Ok(self.http.request("query_getAuction", rpc_params![]).await?)
    }

    async fn recent_bids(&self, token_id: TokenId) -> Result<Vec<Bid>, ClientError> {
        Ok(self
            .http
            .request("query_getBids", rpc_params![token_id])
            .await?)
    }

    async fn average_winning_bid(&self) -> Result<Option<Wei>, ClientError> {
        Ok(self
            .http
            .request("query_getAverageWinningBid", rpc_params![])
            .await?)
    }
}

#[async_trait]
impl HouseWriter for RpcHouseClient {
    async fn send_bid(&self, tx: &BidTransaction) -> Result<TxHash, ClientError> {
        let raw = format!(
            "0x{}",
            hex::encode(borsh::to_vec(tx).expect("borsh encoding of a transaction cannot fail"))
        );
        let hash: String = self
            .http
            .request("chain_sendRawTransaction", rpc_params![raw])
            .await?;
        hash.parse()
            .map_err(|e| ClientError::BadResponse(format!("bad tx hash {hash}: {e}")))
    }

    async fn wait_confirmed(&self, hash: TxHash) -> Result<TxReceipt, ClientError> {
        loop {
            let receipt: Option<TxReceipt> = self
                .http
                .request("chain_getTransactionReceipt", rpc_params![hash.to_string()])
                .await?;
            if let Some(receipt) = receipt {
                return Ok(receipt);
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}
