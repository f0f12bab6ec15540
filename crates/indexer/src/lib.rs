//! Declarative event-indexing manifest for the DAO auction platform.
//!
//! The manifest declares which contract events (auction creation, bids,
//! settlement, governance proposals) populate the queryable off-chain
//! dataset. It is configuration consumed by an external indexing service:
//! handlers are referenced by name only, no indexing logic lives here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use dao_auction_types::Address;

/// Errors from loading or validating a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("manifest has no data sources")]
    NoDataSources,

    #[error("data source {0} has no entities")]
    NoEntities(String),

    #[error("data source {0} has no event handlers")]
    NoEventHandlers(String),

    #[error("invalid handler name `{handler}` in data source {data_source}")]
    BadHandlerName {
        data_source: String,
        handler: String,
    },

    #[error("invalid event signature `{event}` in data source {data_source}")]
    BadEventSignature { data_source: String, event: String },

    #[error("duplicate handler for event `{event}` in data source {data_source}")]
    DuplicateEvent { data_source: String, event: String },
}

/// Top-level indexing manifest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub spec_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub schema: SchemaRef,

    pub data_sources: Vec<DataSource>,
}

/// Reference to the entity schema file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRef {
    pub file: String,
}

/// One indexed contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    pub kind: String,
    pub name: String,
    pub network: String,
    pub source: ContractSource,
    pub mapping: Mapping,
}

/// Where the contract lives and which blocks to scan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSource {
    pub address: Address,
    pub abi: String,
    pub start_block: u64,
}

/// How events map into entities.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    pub kind: String,
    pub api_version: String,
    pub language: String,
    pub entities: Vec<String>,
    pub abis: Vec<AbiRef>,
    pub event_handlers: Vec<EventHandler>,
    pub file: String,
}

/// Reference to an ABI file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiRef {
    pub name: String,
    pub file: String,
}

/// One event-to-handler declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventHandler {
    pub event: String,
    pub handler: String,
}

impl Manifest {
    /// Parse a manifest from YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ManifestError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Render the manifest as YAML.
    pub fn to_yaml_string(&self) -> Result<String, ManifestError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Structural validation: every data source declares entities and
    /// well-formed event/handler pairs, with no duplicate event signatures.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.data_sources.is_empty() {
            return Err(ManifestError::NoDataSources);
        }
        for source in &self.data_sources {
            if source.mapping.entities.is_empty() {
                return Err(ManifestError::NoEntities(source.name.clone()));
            }
            if source.mapping.event_handlers.is_empty() {
                return Err(ManifestError::NoEventHandlers(source.name.clone()));
            }
            let mut seen = std::collections::HashSet::new();
            for handler in &source.mapping.event_handlers {
                if !is_identifier(&handler.handler) {
                    return Err(ManifestError::BadHandlerName {
                        data_source: source.name.clone(),
                        handler: handler.handler.clone(),
                    });
                }
                if !is_event_signature(&handler.event) {
                    return Err(ManifestError::BadEventSignature {
                        data_source: source.name.clone(),
                        event: handler.event.clone(),
                    });
                }
                if !seen.insert(handler.event.as_str()) {
                    return Err(ManifestError::DuplicateEvent {
                        data_source: source.name.clone(),
                        event: handler.event.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// The platform's stock manifest: auction-house events plus the
    /// governance and token data sources (declaration only).
    pub fn dao_default(
        network: &str,
        house: Address,
        token: Address,
        governor: Address,
        start_block: u64,
    ) -> Self {
        let data_source = |name: &str, address: Address, abi: &str, entities: &[&str], handlers: &[(&str, &str)]| DataSource {
            kind: "ethereum/contract".to_string(),
            name: name.to_string(),
            network: network.to_string(),
            source: ContractSource {
                address,
                abi: abi.to_string(),
                start_block,
            },
            mapping: Mapping {
                kind: "ethereum/events".to_string(),
                api_version: "0.0.6".to_string(),
                language: "wasm/assemblyscript".to_string(),
                entities: entities.iter().map(|e| e.to_string()).collect(),
                abis: vec![AbiRef {
                    name: abi.to_string(),
                    file: format!("./abis/{abi}.json"),
                }],
                event_handlers: handlers
                    .iter()
                    .map(|(event, handler)| EventHandler {
                        event: event.to_string(),
                        handler: handler.to_string(),
                    })
                    .collect(),
                file: format!("./src/{}.ts", name.to_lowercase()),
            },
        };

        Self {
            spec_version: "0.0.4".to_string(),
            description: Some("DAO auction and governance indexing".to_string()),
            schema: SchemaRef {
                file: "./schema.graphql".to_string(),
            },
            data_sources: vec![
                data_source(
                    "AuctionHouse",
                    house,
                    "AuctionHouse",
                    &["Auction", "Bid"],
                    &[
                        ("AuctionCreated(uint256,uint256,uint256)", "handleAuctionCreated"),
                        ("AuctionBid(uint256,address,uint256,bool)", "handleAuctionBid"),
                        ("AuctionExtended(uint256,uint256)", "handleAuctionExtended"),
                        ("AuctionSettled(uint256,address,uint256)", "handleAuctionSettled"),
                    ],
                ),
                data_source(
                    "Governor",
                    governor,
                    "Governor",
                    &["Proposal", "Vote"],
                    &[
                        (
                            "ProposalCreated(uint256,address,uint256,uint256,string)",
                            "handleProposalCreated",
                        ),
                        ("ProposalQueued(uint256,uint256)", "handleProposalQueued"),
                        ("ProposalExecuted(uint256)", "handleProposalExecuted"),
                        ("VoteCast(address,uint256,uint8,uint256)", "handleVoteCast"),
                    ],
                ),
                data_source(
                    "Token",
                    token,
                    "Token",
                    &["Token", "Account", "Delegate"],
                    &[
                        ("Transfer(address,address,uint256)", "handleTransfer"),
                        (
                            "DelegateChanged(address,address,address)",
                            "handleDelegateChanged",
                        ),
                    ],
                ),
            ],
        }
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_event_signature(s: &str) -> bool {
    match s.split_once('(') {
        Some((name, rest)) => is_identifier(name) && rest.ends_with(')'),
        None => false,
    }
}
