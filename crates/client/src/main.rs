//! CLI for interacting with a DAO auction house.
//!
//! This binary provides commands for:
//! - Placing bids through the submission flow (with the risk warning gate)
//! - Querying auction parameters, state, bids, and statistics
//! - Driving a local mock chain (settle, advance block, set timestamp)

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use dao_auction_client::{check_eligibility, BidFlow, QueryCache, RpcHouseClient, SubmitOutcome};
use dao_auction_types::{
    format_ether, parse_ether, Address, Auction, AuctionContext, Bid, ChainId, Wei,
};

#[derive(Parser)]
#[command(name = "house-cli")]
#[command(about = "CLI for DAO auction houses")]
struct Cli {
    /// Chain RPC endpoint
    #[arg(long, default_value = "http://127.0.0.1:9944")]
    rpc: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the on-chain auction parameters
    Params,

    /// Show the current auction
    Auction,

    /// Show recent bids for an auction
    Bids {
        /// Auction token id (defaults to the current auction)
        #[arg(long)]
        token_id: Option<u64>,
    },

    /// Show the historical average winning bid
    Average,

    /// Place a bid on the current auction
    Bid {
        /// Bid amount in ether, e.g. "2.2"
        #[arg(long)]
        amount: String,

        /// Sender address (hex)
        #[arg(long)]
        sender: String,

        /// Confirm a bid held by the risk warning without prompting
        #[arg(long)]
        yes: bool,
    },

    /// Open the next auction
    CreateAuction {
        /// Sender address (hex)
        #[arg(long)]
        sender: String,
    },

    /// Settle the current auction
    Settle {
        /// Sender address (hex)
        #[arg(long)]
        sender: String,
    },

    /// Show the emitted event log
    Events,

    /// Advance the mock chain by one block
    AdvanceBlock,

    /// Set the mock chain timestamp
    SetTimestamp {
        /// Unix timestamp to set
        #[arg(long)]
        timestamp: u64,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DaoConfigRpc {
    dao_name: String,
    chain_id: ChainId,
    house: Address,
    token: Address,
}

#[derive(Debug, Deserialize)]
struct BlockInfoRpc {
    height: u64,
    timestamp: u64,
}

async fn params_cmd(client: &HttpClient) -> Result<()> {
    let (reserve, increment): (Wei, u8) =
        client.request("query_getAuctionParams", rpc_params![]).await?;
    println!("Reserve price: {} ETH", format_ether(reserve));
    println!("Min bid increment: {increment}%");
    Ok(())
}

fn print_auction(auction: &Auction) {
    println!("Auction for token {}:", auction.token_id);
    println!("  Start: {}", auction.start_time);
    println!("  End: {}", auction.end_time);
    println!("  Settled: {}", auction.settled);
    match &auction.highest_bid {
        Some(bid) => println!(
            "  Highest bid: {} ETH by {}",
            format_ether(bid.amount),
            bid.bidder
        ),
        None => println!("  Highest bid: none"),
    }
}

async fn auction_cmd(client: &HttpClient) -> Result<()> {
    let auction: Option<Auction> = client.request("query_getAuction", rpc_params![]).await?;
    match auction {
        Some(auction) => print_auction(&auction),
        None => println!("No auction yet"),
    }
    Ok(())
}

async fn bids_cmd(client: &HttpClient, token_id: Option<u64>) -> Result<()> {
    let token_id = match token_id {
        Some(id) => id,
        None => {
            let auction: Option<Auction> =
                client.request("query_getAuction", rpc_params![]).await?;
            auction.ok_or_else(|| anyhow!("no auction yet"))?.token_id
        }
    };

    let bids: Vec<Bid> = client.request("query_getBids", rpc_params![token_id]).await?;
    if bids.is_empty() {
        println!("No bids for token {token_id}");
    } else {
        println!("Bids for token {token_id} (most recent first):");
        for bid in bids {
            println!(
                "  {} ETH by {} at {}",
                format_ether(bid.amount),
                bid.bidder,
                bid.block_timestamp
            );
        }
    }
    Ok(())
}

async fn average_cmd(client: &HttpClient) -> Result<()> {
    let average: Option<Wei> = client
        .request("query_getAverageWinningBid", rpc_params![])
        .await?;
    match average {
        Some(average) => println!("Average winning bid: {} ETH", format_ether(average)),
        None => println!("No settled auctions yet"),
    }
    Ok(())
}

async fn bid_cmd(rpc: &str, client: &HttpClient, amount: &str, sender: &str, yes: bool) -> Result<()> {
    let sender: Address = sender
        .parse()
        .map_err(|e| anyhow!("invalid sender address: {e}"))?;

    let config: DaoConfigRpc = client.request("query_getConfig", rpc_params![]).await?;
    let auction: Option<Auction> = client.request("query_getAuction", rpc_params![]).await?;
    let auction = auction.ok_or_else(|| anyhow!("no auction to bid on"))?;

    let ctx = AuctionContext {
        chain_id: config.chain_id,
        dao_name: config.dao_name,
        house: config.house,
        token: config.token,
        token_id: auction.token_id,
    };

    let house_client = RpcHouseClient::new(rpc)?;
    let eligibility = check_eligibility(&house_client, amount).await?;
    if !eligibility.eligible {
        println!(
            "Bid of {amount} ETH is below the minimum of {} ETH",
            format_ether(eligibility.minimum)
        );
        return Ok(());
    }
    let amount = eligibility.entered.expect("eligible implies parsed");

    let flow = BidFlow::new(ctx, sender, house_client, Arc::new(QueryCache::new()));

    match flow.submit(amount).await {
        SubmitOutcome::NeedsConfirmation { amount, threshold } => {
            if yes {
                flow.confirm().await;
                println!("Bid flow finished for token {}", flow.context().token_id);
            } else {
                flow.cancel();
                println!(
                    "Bid of {} ETH exceeds {} ETH ({}x the reference value); \
                     re-run with --yes to confirm",
                    format_ether(amount),
                    format_ether(threshold),
                    5
                );
            }
        }
        SubmitOutcome::Rejected { minimum } => {
            println!("Bid rejected: minimum is {} ETH", format_ether(minimum));
        }
        SubmitOutcome::Completed => {
            println!("Bid flow finished for token {}", flow.context().token_id);
        }
        SubmitOutcome::Busy => unreachable!("fresh flow cannot be busy"),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("house_cli=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let client = HttpClientBuilder::default().build(&cli.rpc)?;

    match cli.command {
        Commands::Params => params_cmd(&client).await?,

        Commands::Auction => auction_cmd(&client).await?,

        Commands::Bids { token_id } => bids_cmd(&client, token_id).await?,

        Commands::Average => average_cmd(&client).await?,

        Commands::Bid {
            amount,
            sender,
            yes,
        } => bid_cmd(&cli.rpc, &client, &amount, &sender, yes).await?,

        Commands::CreateAuction { sender } => {
            let token_id: u64 = client
                .request("auctionHouse_createAuction", rpc_params![sender])
                .await?;
            info!("auction created");
            println!("Auction opened for token {token_id}");
        }

        Commands::Settle { sender } => {
            let _: bool = client
                .request("auctionHouse_settle", rpc_params![sender])
                .await?;
            println!("Auction settled");
        }

        Commands::Events => {
            let events: Vec<serde_json::Value> =
                client.request("query_getEvents", rpc_params![]).await?;
            if events.is_empty() {
                println!("No events");
            } else {
                for event in events {
                    println!("{event}");
                }
            }
        }

        Commands::AdvanceBlock => {
            let info: BlockInfoRpc = client.request("admin_advanceBlock", rpc_params![]).await?;
            println!(
                "Block advanced: height={}, timestamp={}",
                info.height, info.timestamp
            );
        }

        Commands::SetTimestamp { timestamp } => {
            let _: bool = client
                .request("admin_setTimestamp", rpc_params![timestamp])
                .await?;
            println!("Timestamp set to {timestamp}");
        }
    }

    Ok(())
}
