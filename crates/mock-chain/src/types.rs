//! RPC-compatible types for the mock chain.

use dao_auction_house::HouseGenesisConfig;
use dao_auction_types::{Address, ChainId};
use serde::{Deserialize, Serialize};

/// Block info response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
    pub timestamp: u64,
}

/// DAO configuration as served to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaoConfigRpc {
    pub dao_name: String,
    pub chain_id: ChainId,
    pub house: Address,
    pub token: Address,
}

impl From<&HouseGenesisConfig> for DaoConfigRpc {
    fn from(genesis: &HouseGenesisConfig) -> Self {
        Self {
            dao_name: genesis.dao_name.clone(),
            chain_id: genesis.chain_id,
            house: genesis.house,
            token: genesis.token,
        }
    }
}
