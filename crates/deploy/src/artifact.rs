//! Compiled contract artifacts.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use alloy_core::{
    json_abi::JsonAbi,
    primitives::{Bytes, hex},
};
use serde::Deserialize;
use strum::IntoEnumIterator;

use crate::DeployError;

/// The contract types this project deploys.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::IntoStaticStr,
)]
pub enum ContractType {
    /// The campaign contract. Constructor: `(address priceFeed)`.
    #[strum(serialize = "mantraCampaign")]
    MantraCampaign,
    /// Chainlink-style price feed mock. Constructor: `(uint8 decimals, int256 initialAnswer)`.
    #[strum(serialize = "MockV3Aggregator")]
    MockV3Aggregator,
}

impl ContractType {
    /// The contract name used by the compiler and in artifact file names.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Candidate artifact locations under `build_dir`, in lookup order.
    fn artifact_paths(self, build_dir: &Path) -> [PathBuf; 2] {
        let name = self.name();
        [
            build_dir.join("contracts").join(format!("{name}.json")),
            build_dir
                .join(format!("{name}.sol"))
                .join(format!("{name}.json")),
        ]
    }
}

/// ABI and creation bytecode of a compiled contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractArtifact {
    pub contract_type: ContractType,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

/// Artifact file as written by the compiler toolchain.
#[derive(Debug, Deserialize)]
struct RawArtifact {
    abi: JsonAbi,
    bytecode: RawBytecode,
}

/// `bytecode` is a plain hex string in `build/contracts/*.json` and an object in
/// `out/*.sol/*.json`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(String),
    Object { object: String },
}

impl RawBytecode {
    fn as_str(&self) -> &str {
        match self {
            Self::Hex(hex) | Self::Object { object: hex } => hex,
        }
    }
}

impl ContractArtifact {
    /// Parse an artifact from its JSON representation.
    pub fn from_json(contract_type: ContractType, json: &str) -> Result<Self, DeployError> {
        let raw: RawArtifact = serde_json::from_str(json).map_err(|e| {
            DeployError::Artifact(format!("failed to parse {contract_type} artifact: {e}"))
        })?;

        let code = raw.bytecode.as_str();
        if code.contains("__") {
            return Err(DeployError::Artifact(format!(
                "{contract_type} bytecode contains unlinked library placeholders"
            )));
        }

        let bytecode = hex::decode(code).map_err(|e| {
            DeployError::Artifact(format!("{contract_type} bytecode is not valid hex: {e}"))
        })?;
        if bytecode.is_empty() {
            return Err(DeployError::Artifact(format!(
                "{contract_type} has no creation bytecode (abstract contract or interface?)"
            )));
        }

        Ok(Self {
            contract_type,
            abi: raw.abi,
            bytecode: bytecode.into(),
        })
    }

    /// Load the artifact of `contract_type` from `build_dir`.
    pub fn load(build_dir: &Path, contract_type: ContractType) -> Result<Self, DeployError> {
        let candidates = contract_type.artifact_paths(build_dir);
        let path = candidates.iter().find(|path| path.is_file()).ok_or_else(|| {
            DeployError::Artifact(format!(
                "no artifact for {contract_type} under {} (is the project compiled?)",
                build_dir.display()
            ))
        })?;

        let json = std::fs::read_to_string(path).map_err(|e| {
            DeployError::Artifact(format!("failed to read {}: {e}", path.display()))
        })?;

        tracing::debug!(contract = %contract_type, path = %path.display(), "Artifact loaded");

        Self::from_json(contract_type, &json)
    }
}

/// Artifacts of every [`ContractType`], loaded once per run.
#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    artifacts: HashMap<ContractType, ContractArtifact>,
}

impl ArtifactStore {
    /// Load the artifact of every contract type from `build_dir`.
    pub fn load(build_dir: &Path) -> Result<Self, DeployError> {
        ContractType::iter()
            .map(|contract_type| ContractArtifact::load(build_dir, contract_type))
            .collect::<Result<Vec<_>, _>>()
            .map(Self::from_artifacts)
    }

    /// Build a store from already parsed artifacts.
    pub fn from_artifacts(artifacts: impl IntoIterator<Item = ContractArtifact>) -> Self {
        Self {
            artifacts: artifacts
                .into_iter()
                .map(|artifact| (artifact.contract_type, artifact))
                .collect(),
        }
    }

    /// The artifact of `contract_type`.
    pub fn get(&self, contract_type: ContractType) -> Result<&ContractArtifact, DeployError> {
        self.artifacts
            .get(&contract_type)
            .ok_or_else(|| DeployError::Artifact(format!("no artifact loaded for {contract_type}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempdir::TempDir;

    const MOCK_ARTIFACT: &str = r#"{
        "contractName": "MockV3Aggregator",
        "abi": [
            {
                "type": "constructor",
                "inputs": [
                    {"name": "_decimals", "type": "uint8", "internalType": "uint8"},
                    {"name": "_initialAnswer", "type": "int256", "internalType": "int256"}
                ],
                "stateMutability": "nonpayable"
            }
        ],
        "bytecode": "0x6080604052"
    }"#;

    #[test]
    fn test_contract_type_names() {
        assert_eq!(ContractType::MantraCampaign.name(), "mantraCampaign");
        assert_eq!(ContractType::MockV3Aggregator.to_string(), "MockV3Aggregator");
        assert_eq!(
            "mantraCampaign".parse::<ContractType>().unwrap(),
            ContractType::MantraCampaign
        );
    }

    #[test]
    fn test_from_json_hex_bytecode() {
        let artifact =
            ContractArtifact::from_json(ContractType::MockV3Aggregator, MOCK_ARTIFACT).unwrap();

        assert_eq!(artifact.bytecode.as_ref(), &[0x60, 0x80, 0x60, 0x40, 0x52]);
        let constructor = artifact.abi.constructor.as_ref().unwrap();
        assert_eq!(constructor.inputs.len(), 2);
    }

    #[test]
    fn test_from_json_object_bytecode() {
        let json = r#"{"abi": [], "bytecode": {"object": "0x6001", "linkReferences": {}}}"#;
        let artifact = ContractArtifact::from_json(ContractType::MantraCampaign, json).unwrap();

        assert_eq!(artifact.bytecode.as_ref(), &[0x60, 0x01]);
    }

    #[test]
    fn test_from_json_rejects_unusable_bytecode() {
        let unlinked = r#"{"abi": [], "bytecode": "0x6080__$SafeMath$__6040"}"#;
        let empty = r#"{"abi": [], "bytecode": "0x"}"#;

        for json in [unlinked, empty] {
            assert!(matches!(
                ContractArtifact::from_json(ContractType::MantraCampaign, json),
                Err(DeployError::Artifact(_))
            ));
        }
    }

    #[test]
    fn test_store_load_from_build_dir() {
        let build = TempDir::new("mantra-build").unwrap();
        let contracts = build.path().join("contracts");
        std::fs::create_dir_all(&contracts).unwrap();
        std::fs::write(contracts.join("MockV3Aggregator.json"), MOCK_ARTIFACT).unwrap();

        // Second layout, used for the campaign contract.
        let campaign_dir = build.path().join("mantraCampaign.sol");
        std::fs::create_dir_all(&campaign_dir).unwrap();
        std::fs::write(
            campaign_dir.join("mantraCampaign.json"),
            r#"{"abi": [], "bytecode": {"object": "0x6002"}}"#,
        )
        .unwrap();

        let store = ArtifactStore::load(build.path()).unwrap();
        assert_eq!(
            store.get(ContractType::MantraCampaign).unwrap().bytecode.as_ref(),
            &[0x60, 0x02]
        );
        assert!(store.get(ContractType::MockV3Aggregator).is_ok());
    }

    #[test]
    fn test_store_load_reports_missing_artifact() {
        let build = TempDir::new("mantra-build").unwrap();

        let err = ArtifactStore::load(build.path()).unwrap_err();
        assert!(err.to_string().contains("is the project compiled?"));
    }
}
