//! Persisted deployment records for networks that outlive a run.
//!
//! Layout under the deployments directory:
//! - `map.json`: `{ "<chain_id>": { "<contract>": ["<newest>", ..., "<oldest>"] } }`
//! - `<chain_id>/<address>.json`: one [`DeploymentRecord`] per deployment.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use alloy_core::primitives::{Address, B256, Bytes};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{ContractType, DeployedContract, VerificationStatus};

/// File name of the deployment map.
pub const DEPLOYMENT_MAP_FILENAME: &str = "map.json";

/// Addresses of every recorded deployment, newest first, per chain and contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeploymentMap(BTreeMap<String, BTreeMap<String, Vec<Address>>>);

impl DeploymentMap {
    /// Load the map, or an empty one if the file does not exist yet.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read deployment map from {}", path.display()))?;
        serde_json::from_str(&content).context("Failed to parse deployment map")
    }

    /// Write the map as formatted JSON.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize deployment map")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write deployment map to {}", path.display()))
    }

    /// Record a new deployment as the newest of its contract on `chain_id`.
    pub fn record(&mut self, chain_id: u64, contract: &str, address: Address) {
        let addresses = self
            .0
            .entry(chain_id.to_string())
            .or_default()
            .entry(contract.to_string())
            .or_default();
        addresses.retain(|known| *known != address);
        addresses.insert(0, address);
    }

    /// Recorded addresses of `contract` on `chain_id`, newest first.
    pub fn addresses(&self, chain_id: u64, contract: &str) -> &[Address] {
        self.0
            .get(&chain_id.to_string())
            .and_then(|contracts| contracts.get(contract))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Everything known about a single deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub contract_name: String,
    pub address: Address,
    pub network: String,
    pub chain_id: u64,
    pub transaction_hash: B256,
    /// ABI-encoded constructor arguments, needed to verify the source later.
    pub constructor_args: Bytes,
    /// RFC 3339 timestamp of when the deployment was recorded.
    pub deployed_at: String,
    pub verification: VerificationStatus,
}

/// Deployment records of a single chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentStore {
    root: PathBuf,
    chain_id: u64,
}

impl DeploymentStore {
    /// A store rooted at `root`, scoped to `chain_id`.
    pub fn new(root: impl Into<PathBuf>, chain_id: u64) -> Self {
        Self {
            root: root.into(),
            chain_id,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn map_path(&self) -> PathBuf {
        self.root.join(DEPLOYMENT_MAP_FILENAME)
    }

    pub fn record_path(&self, address: Address) -> PathBuf {
        self.root
            .join(self.chain_id.to_string())
            .join(format!("{}.json", address.to_checksum(None)))
    }

    /// Persist a deployment: prepend it to the map and write its record.
    pub fn record(
        &self,
        deployed: &DeployedContract,
        constructor_args: &Bytes,
    ) -> Result<DeploymentRecord> {
        let record_path = self.record_path(deployed.address);
        if let Some(parent) = record_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create deployments directory {}", parent.display())
            })?;
        }

        let record = DeploymentRecord {
            contract_name: deployed.contract_type.name().to_string(),
            address: deployed.address,
            network: deployed.network.clone(),
            chain_id: self.chain_id,
            transaction_hash: deployed.transaction_hash,
            constructor_args: constructor_args.clone(),
            deployed_at: chrono::Utc::now().to_rfc3339(),
            verification: deployed.verification,
        };

        let json =
            serde_json::to_string_pretty(&record).context("Failed to serialize deployment record")?;
        std::fs::write(&record_path, json).with_context(|| {
            format!("Failed to write deployment record to {}", record_path.display())
        })?;

        let map_path = self.map_path();
        let mut map = DeploymentMap::load_from_file(&map_path)?;
        map.record(self.chain_id, &record.contract_name, record.address);
        map.save_to_file(&map_path)?;

        tracing::debug!(
            contract = %record.contract_name,
            address = %record.address,
            path = %record_path.display(),
            "Deployment recorded"
        );

        Ok(record)
    }

    /// Load the record of the deployment at `address`.
    pub fn load_record(&self, address: Address) -> Result<DeploymentRecord> {
        let path = self.record_path(address);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read deployment record {}", path.display()))?;
        serde_json::from_str(&content).context("Failed to parse deployment record")
    }

    /// Recorded addresses of `contract_type` on this chain, newest first.
    pub fn addresses(&self, contract_type: ContractType) -> Result<Vec<Address>> {
        let map = DeploymentMap::load_from_file(&self.map_path())?;
        Ok(map.addresses(self.chain_id, contract_type.name()).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloy_core::{json_abi::JsonAbi, primitives::address};
    use tempdir::TempDir;

    fn deployed(address: Address, verification: VerificationStatus) -> DeployedContract {
        DeployedContract {
            contract_type: ContractType::MockV3Aggregator,
            address,
            abi: JsonAbi::default(),
            network: "ganache-local".to_string(),
            transaction_hash: B256::repeat_byte(0xab),
            verification,
        }
    }

    #[test]
    fn test_map_keeps_newest_first() {
        let first = address!("0x1111111111111111111111111111111111111111");
        let second = address!("0x2222222222222222222222222222222222222222");

        let mut map = DeploymentMap::default();
        map.record(1337, "MockV3Aggregator", first);
        map.record(1337, "MockV3Aggregator", second);

        assert_eq!(map.addresses(1337, "MockV3Aggregator"), &[second, first]);
        assert!(map.addresses(1, "MockV3Aggregator").is_empty());
        assert!(map.addresses(1337, "mantraCampaign").is_empty());
    }

    #[test]
    fn test_store_record_roundtrip() {
        let dir = TempDir::new("mantra-deployments").unwrap();
        let store = DeploymentStore::new(dir.path(), 1337);
        let first = address!("0x1111111111111111111111111111111111111111");
        let second = address!("0x2222222222222222222222222222222222222222");

        store
            .record(&deployed(first, VerificationStatus::NotRequested), &Bytes::new())
            .unwrap();
        let record = store
            .record(
                &deployed(second, VerificationStatus::Pending),
                &Bytes::from_static(&[0x01, 0x02]),
            )
            .unwrap();

        assert_eq!(record.chain_id, 1337);
        assert_eq!(record.verification, VerificationStatus::Pending);
        assert_eq!(store.load_record(second).unwrap(), record);
        assert_eq!(
            store.addresses(ContractType::MockV3Aggregator).unwrap(),
            vec![second, first]
        );

        let raw = std::fs::read_to_string(store.record_path(second)).unwrap();
        assert!(raw.contains("\"verification\": \"pending\""));
    }

    #[test]
    fn test_store_without_map_is_empty() {
        let dir = TempDir::new("mantra-deployments").unwrap();
        let store = DeploymentStore::new(dir.path(), 1);

        assert!(store.addresses(ContractType::MockV3Aggregator).unwrap().is_empty());
    }
}
