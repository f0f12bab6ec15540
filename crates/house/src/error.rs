//! Auction-house error types.

use dao_auction_types::{TokenId, Wei};
use thiserror::Error;

/// Errors that can occur while processing auction-house calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HouseError {
    #[error("no active auction")]
    NoActiveAuction,

    #[error("auction in progress")]
    AuctionInProgress,

    #[error("bid is for token {got}, active auction is token {expected}")]
    WrongToken { expected: TokenId, got: TokenId },

    #[error("auction expired")]
    AuctionExpired,

    #[error("auction has not ended yet")]
    AuctionNotOver,

    #[error("auction already settled")]
    AlreadySettled,

    #[error("bid below minimum: need {minimum} wei, got {got} wei")]
    BidTooLow { minimum: Wei, got: Wei },

    #[error("not authorized")]
    NotAuthorized,

    #[error("arithmetic overflow")]
    ArithmeticOverflow,
}
