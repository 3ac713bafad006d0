// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{ContractAddresses, RPC};
use anyhow::{anyhow, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which FHE backend the process runs against. Selected once at startup;
/// everything downstream dispatches through the adapter trait, never by
/// inspecting the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FheMode {
    Simulated,
    Relayed,
}

impl Default for FheMode {
    fn default() -> Self {
        FheMode::Simulated
    }
}

/// What to do when the relayer authorizes only part of a decryption batch.
///
/// `Pending` hands the partial map back to the caller (absent keys mean
/// "not yet decryptable"). `Fail` turns any missing handle into a
/// decryption-denied error for that handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PartialResultPolicy {
    Pending,
    Fail,
}

impl Default for PartialResultPolicy {
    fn default() -> Self {
        PartialResultPolicy::Pending
    }
}

/// Published configuration of a relayer-backed target network.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RelayerConfig {
    pub url: String,
    pub chain_id: u64,
    pub gateway_chain_id: u64,
    pub acl_address: String,
    pub kms_address: String,
}

/// Top-level configuration for the scoring client.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub mode: FheMode,
    /// JSON-RPC endpoint of the host chain. In simulated mode this is also
    /// the endpoint backend metadata is discovered from.
    pub rpc_url: String,
    pub chain_id: u64,
    pub gateway_chain_id: u64,
    pub contracts: Option<ContractAddresses>,
    pub relayer: Option<RelayerConfig>,
    pub partial_results: PartialResultPolicy,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            mode: FheMode::Simulated,
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: 31337,
            gateway_chain_id: 55815,
            contracts: None,
            relayer: None,
            partial_results: PartialResultPolicy::default(),
        }
    }
}

impl AdapterConfig {
    pub fn rpc(&self) -> Result<RPC> {
        RPC::from_url(&self.rpc_url)
            .map_err(|e| anyhow!("Failed to parse RPC URL {}: {}", self.rpc_url, e))
    }

    /// Relayed mode requires the published network config.
    pub fn relayer(&self) -> Result<&RelayerConfig> {
        self.relayer
            .as_ref()
            .ok_or_else(|| anyhow!("mode is 'relayed' but no [relayer] section is configured"))
    }
}

/// Load configuration from a YAML file layered under `CRS_`-prefixed
/// environment overrides, on top of local-node defaults.
pub fn load_config(path: Option<&Path>) -> Result<AdapterConfig> {
    let mut figment = Figment::from(Serialized::defaults(AdapterConfig::default()));
    if let Some(path) = path {
        figment = figment.merge(Yaml::file(path));
    }
    let config = figment
        .merge(Env::prefixed("CRS_").split("__"))
        .extract()?;
    Ok(config)
}
