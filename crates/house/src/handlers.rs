//! Call handlers for the auction house.
//!
//! These functions implement the business logic for each call type.

use dao_auction_types::{minimum_bid, Address, Auction, Bid, TokenId, TxHash, Wei};

use crate::call::HouseCall;
use crate::error::HouseError;
use crate::events::HouseEvent;
use crate::state::{HouseState, Settlement};

/// Context provided by the chain for each call.
pub struct CallContext {
    /// Sender of the transaction.
    pub sender: Address,
    /// Current block height.
    pub block_height: u64,
    /// Current timestamp.
    pub timestamp: u64,
    /// Value attached to the call (the bid amount for `CreateBid`).
    pub value: Wei,
    /// Hash of the carrying transaction.
    pub tx_hash: TxHash,
}

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, HouseError>;

/// Dispatch a decoded call to its handler.
pub fn apply_call(state: &mut HouseState, ctx: &CallContext, call: HouseCall) -> HandlerResult<()> {
    match call {
        HouseCall::CreateAuction => handle_create_auction(state, ctx).map(|_| ()),
        HouseCall::CreateBid { token_id } => handle_create_bid(state, ctx, token_id),
        HouseCall::SettleAuction => handle_settle_auction(state, ctx),
        HouseCall::SetReservePrice { reserve_price } => {
            handle_set_reserve_price(state, ctx, reserve_price)
        }
        HouseCall::SetMinBidIncrement { min_bid_increment } => {
            handle_set_min_bid_increment(state, ctx, min_bid_increment)
        }
        HouseCall::SetTimeBuffer { time_buffer } => handle_set_time_buffer(state, ctx, time_buffer),
    }
}

/// Handle CreateAuction.
pub fn handle_create_auction(state: &mut HouseState, ctx: &CallContext) -> HandlerResult<TokenId> {
    // The previous auction must be settled before the next opens
    if let Some(auction) = &state.auction {
        if !auction.settled {
            return Err(HouseError::AuctionInProgress);
        }
    }

    let token_id = state.allocate_token_id();
    let end_time = ctx
        .timestamp
        .checked_add(state.config.duration)
        .ok_or(HouseError::ArithmeticOverflow)?;

    state.auction = Some(Auction {
        token_id,
        start_time: ctx.timestamp,
        end_time,
        highest_bid: None,
        settled: false,
    });
    state.bids.insert(token_id, Vec::new());

    state.emit(HouseEvent::AuctionCreated {
        token_id,
        start_time: ctx.timestamp,
        end_time,
    });

    Ok(token_id)
}

/// Handle CreateBid. Payable; `ctx.value` is the bid amount.
pub fn handle_create_bid(
    state: &mut HouseState,
    ctx: &CallContext,
    token_id: TokenId,
) -> HandlerResult<()> {
    let auction = state.auction.as_ref().ok_or(HouseError::NoActiveAuction)?;

    // Check the bid targets the live auction
    if auction.token_id != token_id {
        return Err(HouseError::WrongToken {
            expected: auction.token_id,
            got: token_id,
        });
    }
    if auction.settled || ctx.timestamp >= auction.end_time {
        return Err(HouseError::AuctionExpired);
    }

    // Check bid amount against the minimum raise
    let params = state.config.params;
    let highest = auction.highest_bid.map(|b| b.amount);
    let minimum = minimum_bid(params.reserve_price, params.min_bid_increment, highest);
    if ctx.value < minimum {
        return Err(HouseError::BidTooLow {
            minimum,
            got: ctx.value,
        });
    }

    // Refund the previous highest bidder in full
    let previous = auction.highest_bid;
    if let Some(prev) = previous {
        state.credit_refund(prev.bidder, prev.amount);
    }

    let bid = Bid {
        bidder: ctx.sender,
        amount: ctx.value,
        block_timestamp: ctx.timestamp,
        tx_hash: ctx.tx_hash,
    };

    // Extend the auction when the bid lands inside the time buffer
    let auction = state.auction.as_mut().expect("checked above");
    let remaining = auction.end_time - ctx.timestamp;
    let extended = remaining < state.config.time_buffer;
    if extended {
        auction.end_time = ctx
            .timestamp
            .checked_add(state.config.time_buffer)
            .ok_or(HouseError::ArithmeticOverflow)?;
    }
    auction.highest_bid = Some(bid);
    let end_time = auction.end_time;

    state.bids.entry(token_id).or_default().push(bid);

    state.emit(HouseEvent::AuctionBid {
        token_id,
        bidder: ctx.sender,
        amount: ctx.value,
        extended,
    });
    if extended {
        state.emit(HouseEvent::AuctionExtended { token_id, end_time });
    }

    Ok(())
}

/// Handle SettleAuction.
pub fn handle_settle_auction(state: &mut HouseState, ctx: &CallContext) -> HandlerResult<()> {
    let auction = state.auction.as_mut().ok_or(HouseError::NoActiveAuction)?;

    if auction.settled {
        return Err(HouseError::AlreadySettled);
    }
    if ctx.timestamp < auction.end_time {
        return Err(HouseError::AuctionNotOver);
    }

    auction.settled = true;
    let token_id = auction.token_id;
    let winning = auction.highest_bid;

    // Auctions that received bids enter the settlement history, which
    // backs the average-winning-bid statistic
    if let Some(bid) = winning {
        state.settlements.push(Settlement {
            token_id,
            winner: bid.bidder,
            amount: bid.amount,
            settled_at: ctx.timestamp,
        });
    }

    state.emit(HouseEvent::AuctionSettled {
        token_id,
        winner: winning.map(|b| b.bidder),
        amount: winning.map(|b| b.amount).unwrap_or(Wei::ZERO),
    });

    Ok(())
}

/// Handle SetReservePrice (admin only).
pub fn handle_set_reserve_price(
    state: &mut HouseState,
    ctx: &CallContext,
    reserve_price: Wei,
) -> HandlerResult<()> {
    require_admin(state, ctx)?;
    state.config.params.reserve_price = reserve_price;
    Ok(())
}

/// Handle SetMinBidIncrement (admin only).
pub fn handle_set_min_bid_increment(
    state: &mut HouseState,
    ctx: &CallContext,
    min_bid_increment: u8,
) -> HandlerResult<()> {
    require_admin(state, ctx)?;
    state.config.params.min_bid_increment = min_bid_increment;
    Ok(())
}

/// Handle SetTimeBuffer (admin only).
pub fn handle_set_time_buffer(
    state: &mut HouseState,
    ctx: &CallContext,
    time_buffer: u64,
) -> HandlerResult<()> {
    require_admin(state, ctx)?;
    state.config.time_buffer = time_buffer;
    Ok(())
}

fn require_admin(state: &HouseState, ctx: &CallContext) -> HandlerResult<()> {
    if ctx.sender != state.config.admin {
        return Err(HouseError::NotAuthorized);
    }
    Ok(())
}
