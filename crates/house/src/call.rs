//! Call message types for the auction house.
//!
//! A `HouseCall` is the borsh-encoded payload of a transaction's `data`
//! bytes. For `CreateBid` the bid amount is NOT part of the message: it is
//! carried as the transaction value.

use borsh::{BorshDeserialize, BorshSerialize};
use dao_auction_types::{TokenId, Wei};

/// Call messages for the auction house.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum HouseCall {
    // === Auction lifecycle ===
    /// Open the next auction.
    CreateAuction,

    /// Bid on the active auction. Payable; the amount is the transaction
    /// value.
    CreateBid { token_id: TokenId },

    /// Settle the active auction after its end time.
    SettleAuction,

    // === Admin ===
    /// Update the reserve price.
    SetReservePrice { reserve_price: Wei },

    /// Update the minimum bid increment percentage.
    SetMinBidIncrement { min_bid_increment: u8 },

    /// Update the anti-sniping time buffer.
    SetTimeBuffer { time_buffer: u64 },
}

impl HouseCall {
    /// Encode into transaction data bytes.
    pub fn encode(&self) -> Vec<u8> {
        borsh::to_vec(self).expect("borsh encoding of a call cannot fail")
    }

    /// Decode from transaction data bytes.
    pub fn decode(data: &[u8]) -> Result<Self, borsh::io::Error> {
        Self::try_from_slice(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_bid_round_trip() {
        let call = HouseCall::CreateBid { token_id: 42 };
        let decoded = HouseCall::decode(&call.encode()).unwrap();
        assert_eq!(decoded, call);
    }

    #[test]
    fn decode_rejects_truncated_data() {
        let mut data = HouseCall::CreateBid { token_id: 42 }.encode();
        data.truncate(3);
        assert!(HouseCall::decode(&data).is_err());
    }
}
