//! Core type definitions for the DAO auction platform.
//!
//! This crate provides the shared data structures used across the client,
//! the auction-house logic, and the mock chain: account addresses,
//! fixed-point monetary amounts, auction and bid records, and the composite
//! cache keys the bid submission flow invalidates.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod amounts;

pub use amounts::{format_ether, minimum_bid, parse_ether, Wei, ETH};

// =========================
// CHAIN PRIMITIVES
// =========================

/// Auction token identifier (one auction per token).
pub type TokenId = u64;

/// Chain identifier, e.g. `1` for mainnet.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Errors from parsing hex-encoded primitives.
#[derive(Debug, Error, PartialEq)]
pub enum HexParseError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("expected {expected} bytes, got {got}")]
    BadLength { expected: usize, got: usize },
}

fn parse_fixed_hex<const N: usize>(s: &str) -> Result<[u8; N], HexParseError> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(stripped)?;
    let got = bytes.len();
    bytes
        .try_into()
        .map_err(|_| HexParseError::BadLength { expected: N, got })
}

/// 20-byte account or contract address.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize,
    BorshDeserialize,
)]
pub struct Address(pub [u8; 20]);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = HexParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed_hex(s).map(Self)
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 32-byte transaction hash.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize,
    BorshDeserialize,
)]
pub struct TxHash(pub [u8; 32]);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for TxHash {
    type Err = HexParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed_hex(s).map(Self)
    }
}

impl Serialize for TxHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =========================
// AUCTION TYPES
// =========================

/// On-chain auction-house parameters, fetched as one batched read.
///
/// The RPC layer returns these positionally as `[reserve_price, increment]`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct AuctionParams {
    /// Minimum bid floor for a fresh auction.
    pub reserve_price: Wei,
    /// Percentage by which a new bid must exceed the current highest.
    pub min_bid_increment: u8,
}

/// A recorded bid.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct Bid {
    pub bidder: Address,
    pub amount: Wei,
    pub block_timestamp: u64,
    pub tx_hash: TxHash,
}

/// State of a single auction.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Auction {
    pub token_id: TokenId,
    pub start_time: u64,
    pub end_time: u64,
    pub highest_bid: Option<Bid>,
    pub settled: bool,
}

/// Read-only auction context supplied to the bid submission flow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionContext {
    pub chain_id: ChainId,
    pub dao_name: String,
    /// Auction house contract address.
    pub house: Address,
    /// DAO token contract address.
    pub token: Address,
    /// Token up for auction.
    pub token_id: TokenId,
}

impl AuctionContext {
    /// Cache key for the recent-bids list of this auction.
    pub fn bid_list_key(&self) -> CacheKey {
        CacheKey::BidList {
            chain_id: self.chain_id,
            token: self.token,
            token_id: self.token_id,
        }
    }

    /// Cache key for the DAO's average-winning-bid statistic.
    pub fn average_bid_key(&self) -> CacheKey {
        CacheKey::AverageBid {
            chain_id: self.chain_id,
            token: self.token,
        }
    }
}

// =========================
// CACHE KEYS
// =========================

/// Composite keys for cached query results.
///
/// These two keys are the only persisted-state contract the bid submission
/// flow participates in: both are invalidated after a confirmed bid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Recent bids of one auction.
    BidList {
        chain_id: ChainId,
        token: Address,
        token_id: TokenId,
    },
    /// Historical average winning bid of one DAO token.
    AverageBid { chain_id: ChainId, token: Address },
}

// =========================
// TRANSACTIONS
// =========================

/// A prepared bid transaction.
///
/// The bid amount travels as the transaction value, not as call data; the
/// `data` bytes carry the borsh-encoded auction-house call.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct BidTransaction {
    pub from: Address,
    pub to: Address,
    pub value: Wei,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    pub chain_id: ChainId,
}

impl BidTransaction {
    /// Transaction hash: sha256 over the borsh encoding.
    pub fn hash(&self) -> TxHash {
        use sha2::{Digest, Sha256};
        let encoded = borsh::to_vec(self).expect("borsh encoding of a transaction cannot fail");
        TxHash(Sha256::digest(&encoded).into())
    }
}

/// Confirmation receipt for a broadcast transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    /// `true` when the call executed without reverting.
    pub status: bool,
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_round_trip() {
        let addr: Address = "0x00000000000000000000000000000000000000ab"
            .parse()
            .unwrap();
        assert_eq!(addr.0[19], 0xab);
        assert_eq!(addr.to_string().parse::<Address>().unwrap(), addr);
        // prefix is optional on input
        let bare: Address = "00000000000000000000000000000000000000ab".parse().unwrap();
        assert_eq!(bare, addr);
    }

    #[test]
    fn address_rejects_bad_length() {
        let err = "0xabcd".parse::<Address>().unwrap_err();
        assert_eq!(
            err,
            HexParseError::BadLength {
                expected: 20,
                got: 2
            }
        );
    }

    #[test]
    fn address_serde_as_hex_string() {
        let addr = Address([0x11; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{addr}\""));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn transaction_hash_is_stable() {
        let tx = BidTransaction {
            from: Address([1; 20]),
            to: Address([2; 20]),
            value: Wei(ETH),
            data: vec![0, 1, 2],
            chain_id: ChainId(1),
        };
        assert_eq!(tx.hash(), tx.hash());

        let mut other = tx.clone();
        other.value = Wei(2 * ETH);
        assert_ne!(tx.hash(), other.hash());
    }

    #[test]
    fn cache_keys_distinguish_token_ids() {
        let ctx = AuctionContext {
            chain_id: ChainId(1),
            dao_name: "Example DAO".to_string(),
            house: Address([3; 20]),
            token: Address([4; 20]),
            token_id: 7,
        };
        let mut later = ctx.clone();
        later.token_id = 8;

        assert_ne!(ctx.bid_list_key(), later.bid_list_key());
        // the statistic is per-DAO, not per-auction
        assert_eq!(ctx.average_bid_key(), later.average_bid_key());
    }
}
