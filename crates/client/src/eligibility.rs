//! Bid input validation.
//!
//! Computes the minimum acceptable bid from on-chain state and compares the
//! user-entered amount against it. Invalid or too-low input is not an
//! error: it simply leaves submission disabled.

use dao_auction_types::{minimum_bid, parse_ether, Wei};

use crate::error::ClientError;
use crate::rpc::HouseReader;

/// Result of validating a user-entered bid amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BidEligibility {
    /// Minimum acceptable bid right now.
    pub minimum: Wei,
    /// The entered amount, when it parsed.
    pub entered: Option<Wei>,
    /// Whether submission should be enabled.
    pub eligible: bool,
}

/// Validate a user-entered decimal ether amount against current on-chain
/// auction state.
pub async fn check_eligibility<R: HouseReader>(
    reader: &R,
    entered: &str,
) -> Result<BidEligibility, ClientError> {
    let params = reader.auction_params().await?;
    let auction = reader.current_auction().await?;
    let highest = auction.and_then(|a| a.highest_bid).map(|b| b.amount);

    let minimum = minimum_bid(params.reserve_price, params.min_bid_increment, highest);
    let entered = parse_ether(entered).ok();
    let eligible = entered.map(|amount| amount >= minimum).unwrap_or(false);

    Ok(BidEligibility {
        minimum,
        entered,
        eligible,
    })
}
