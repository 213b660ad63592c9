//! # Chain Configuration
//!
//! The chain parameters fixed at genesis and the init message that
//! delivers them. The config is stored in serialized form inside the
//! system state so every node agrees on the exact bytes.

use crate::errors::StateError;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Bytes, U256};

/// Chain parameters fixed at genesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// The chain id.
    pub chain_id: U256,
    /// System state version the chain starts at.
    pub initial_version: u64,
    /// The initial chain owner; may be the zero address.
    pub initial_chain_owner: Address,
    /// Block number of the genesis block on the parent chain.
    pub genesis_block_number: u64,
    /// True on debug-mode chains (test networks).
    pub debug_mode: bool,
    /// State version from which the program execution engine is enabled,
    /// if ever.
    pub engine_from_version: Option<u64>,
}

impl ChainConfig {
    /// True when the program engine is enabled at `version`.
    #[must_use]
    pub fn engine_enabled(&self, version: u64) -> bool {
        self.engine_from_version
            .map_or(false, |from| version >= from)
    }

    /// Serializes the config to its canonical stored form.
    pub fn to_bytes(&self) -> Result<Bytes, StateError> {
        serde_json::to_vec(self).map_err(|err| StateError::BadChainConfig(err.to_string()))
    }

    /// Parses a config from its stored form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StateError> {
        serde_json::from_slice(bytes).map_err(|err| StateError::BadChainConfig(err.to_string()))
    }
}

/// The parsed genesis init message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitMessage {
    /// The serialized chain config, stored verbatim.
    pub serialized_chain_config: Bytes,
    /// Initial price per unit for the L1 pricer.
    pub initial_base_fee: U256,
}

impl InitMessage {
    /// Builds an init message carrying `config`.
    pub fn new(config: &ChainConfig, initial_base_fee: U256) -> Result<Self, StateError> {
        Ok(Self {
            serialized_chain_config: config.to_bytes()?,
            initial_base_fee,
        })
    }
}
