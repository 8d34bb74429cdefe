//! Resolution and classification of the active network.

use std::str::FromStr;

use alloy_core::primitives::Address;
use url::Url;

use crate::{Configuration, DeployError, NetworkSettings};

/// Networks backed by a local development node.
pub const LOCAL_BLOCKCHAIN_ENVIRONMENTS: [&str; 2] = ["development", "ganache-local"];

/// Networks whose chain state is thrown away between runs, launched or not.
pub const EPHEMERAL_ENVIRONMENTS: [&str; 1] = ["development"];

/// Local nodes forked from mainnet.
pub const FORKED_LOCAL_ENVIRONMENTS: [&str; 1] = ["mainnet-fork"];

/// RPC endpoint assumed for local networks that configure none.
pub const DEFAULT_LOCAL_RPC_URL: &str = "http://127.0.0.1:8545/";

/// How the active network is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum NetworkKind {
    /// A local simulator with pre-funded, unlocked accounts.
    Local,
    /// A local node forked from a live chain.
    ForkedLocal,
    /// A live network.
    Remote,
}

impl NetworkKind {
    /// Classify a network by name.
    pub fn classify(name: &str) -> Self {
        if LOCAL_BLOCKCHAIN_ENVIRONMENTS.contains(&name) {
            Self::Local
        } else if FORKED_LOCAL_ENVIRONMENTS.contains(&name) {
            Self::ForkedLocal
        } else {
            Self::Remote
        }
    }

    /// Whether mocks and unlocked test accounts are used on this kind of network.
    pub fn is_local(self) -> bool {
        matches!(self, Self::Local | Self::ForkedLocal)
    }
}

/// The active network, resolved once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkContext {
    /// Network name as it appears in the configuration.
    pub name: String,
    /// Classification of the network.
    pub kind: NetworkKind,
    /// The network's section of the configuration (defaults if absent).
    pub settings: NetworkSettings,
}

impl NetworkContext {
    /// Create a context for `name` with the given settings.
    pub fn new(name: impl Into<String>, settings: NetworkSettings) -> Self {
        let name = name.into();
        Self {
            kind: NetworkKind::classify(&name),
            name,
            settings,
        }
    }

    pub fn is_local(&self) -> bool {
        self.kind.is_local()
    }

    /// Whether this run starts its own node. Only local networks launch one.
    pub fn launches_node(&self) -> bool {
        self.is_local() && self.settings.launch.is_some()
    }

    /// Whether deployments outlive the run and should be recorded.
    ///
    /// A node launched by the tool dies with it, and `development` is always treated as
    /// throwaway, so nothing is persisted for either.
    pub fn is_persistent(&self) -> bool {
        !self.launches_node() && !EPHEMERAL_ENVIRONMENTS.contains(&self.name.as_str())
    }

    /// The JSON-RPC endpoint of this network.
    pub fn rpc_url(&self) -> Result<Url, DeployError> {
        if let (true, Some(launch)) = (self.is_local(), &self.settings.launch) {
            return launch
                .rpc_url()
                .map_err(|e| DeployError::Configuration(format!("{e:#}")));
        }

        let url = match (&self.settings.rpc_url, self.is_local()) {
            (Some(url), _) => url.as_str(),
            (None, true) => DEFAULT_LOCAL_RPC_URL,
            (None, false) => return Err(DeployError::missing_config(&self.name, "rpc_url")),
        };

        Url::parse(url).map_err(|e| {
            DeployError::Configuration(format!(
                "invalid rpc_url for network {}: {e}",
                self.name
            ))
        })
    }

    /// Statically configured address of a contract on this network.
    pub fn contract_address(&self, key: &str) -> Result<Address, DeployError> {
        let raw = self
            .settings
            .contracts
            .get(key)
            .ok_or_else(|| DeployError::missing_config(&self.name, key))?
            .as_str()
            .ok_or_else(|| {
                DeployError::Configuration(format!(
                    "networks.{}.{key} must be an address string",
                    self.name
                ))
            })?;

        Address::from_str(raw.trim()).map_err(|e| {
            DeployError::Configuration(format!(
                "invalid address for networks.{}.{key}: {e}",
                self.name
            ))
        })
    }
}

/// Resolve the active network from the configuration.
pub fn current_network(config: &Configuration) -> Result<NetworkContext, DeployError> {
    let name = config
        .network
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| DeployError::Configuration("no active network is set".to_string()))?;

    let settings = config.network_settings(name).cloned().unwrap_or_default();

    Ok(NetworkContext::new(name, settings))
}
