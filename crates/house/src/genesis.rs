//! Genesis configuration for the auction house.
//!
//! This is the configuration the mock chain boots from; defaults describe a
//! local development DAO.

use dao_auction_types::{Address, AuctionParams, ChainId, Wei, ETH};
use serde::{Deserialize, Serialize};

use crate::state::{HouseConfig, HouseState};

/// Initial auction-house configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HouseGenesisConfig {
    /// Display name of the DAO.
    pub dao_name: String,

    /// Chain the house is deployed on.
    pub chain_id: ChainId,

    /// Auction house contract address.
    pub house: Address,

    /// DAO token contract address.
    pub token: Address,

    /// Minimum bid floor for a fresh auction, in wei.
    pub reserve_price: Wei,

    /// Minimum raise over the current highest bid, percent.
    pub min_bid_increment: u8,

    /// Auction length in seconds.
    pub duration: u64,

    /// Anti-sniping window in seconds.
    pub time_buffer: u64,

    /// Account allowed to change parameters.
    pub admin: Address,
}

impl Default for HouseGenesisConfig {
    fn default() -> Self {
        Self {
            dao_name: "Local DAO".to_string(),
            chain_id: ChainId(31_337),
            house: Address([0xaa; 20]),
            token: Address([0xbb; 20]),
            reserve_price: Wei(ETH / 100), // 0.01 ETH
            min_bid_increment: 5,
            duration: 86_400,
            time_buffer: 300,
            admin: Address([0x01; 20]),
        }
    }
}

impl HouseGenesisConfig {
    /// Build the initial house state.
    pub fn initial_state(&self) -> HouseState {
        HouseState::new(HouseConfig {
            params: AuctionParams {
                reserve_price: self.reserve_price,
                min_bid_increment: self.min_bid_increment,
            },
            duration: self.duration,
            time_buffer: self.time_buffer,
            admin: self.admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_genesis_builds_a_state() {
        let genesis = HouseGenesisConfig::default();
        let state = genesis.initial_state();
        assert_eq!(state.config.params.reserve_price, genesis.reserve_price);
        assert!(state.auction.is_none());
    }

    #[test]
    fn genesis_round_trips_through_json() {
        let genesis = HouseGenesisConfig::default();
        let json = serde_json::to_string(&genesis).unwrap();
        let back: HouseGenesisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.dao_name, genesis.dao_name);
        assert_eq!(back.reserve_price, genesis.reserve_price);
    }
}
