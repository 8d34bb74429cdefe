//! Mock contracts deployed so far, per contract type.

use std::collections::HashMap;

use crate::{ArtifactStore, Chain, ContractHandle, ContractType, DeployError, DeploymentStore};

/// Append-only list of deployed mocks per contract type. The last entry is the newest.
#[derive(Debug, Clone, Default)]
pub struct MockRegistry {
    mocks: HashMap<ContractType, Vec<ContractHandle>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` as the newest mock of its type.
    pub fn push(&mut self, handle: ContractHandle) {
        self.mocks
            .entry(handle.contract_type)
            .or_default()
            .push(handle);
    }

    /// The newest mock of `contract_type`.
    pub fn latest(&self, contract_type: ContractType) -> Option<&ContractHandle> {
        self.mocks.get(&contract_type).and_then(|mocks| mocks.last())
    }

    /// Number of mocks of `contract_type`.
    pub fn len(&self, contract_type: ContractType) -> usize {
        self.mocks.get(&contract_type).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, contract_type: ContractType) -> bool {
        self.len(contract_type) == 0
    }

    /// Rebuild a registry from the mocks recorded in `store`.
    ///
    /// Addresses without code on `chain` are skipped. The others are appended oldest
    /// first, so the newest recorded mock ends up as [`MockRegistry::latest`].
    pub async fn restore<C: Chain>(
        store: &DeploymentStore,
        chain: &C,
        artifacts: &ArtifactStore,
    ) -> Result<Self, DeployError> {
        let mut registry = Self::new();

        for contract_type in [ContractType::MockV3Aggregator] {
            let abi = &artifacts.get(contract_type)?.abi;
            let addresses = store
                .addresses(contract_type)
                .map_err(DeployError::Store)?;

            for address in addresses.into_iter().rev() {
                if !chain.code_exists(address).await? {
                    tracing::warn!(
                        contract = %contract_type,
                        address = %address,
                        "Recorded mock has no code on chain, skipping"
                    );
                    continue;
                }
                registry.push(ContractHandle::at(contract_type, address, abi.clone()));
            }

            tracing::debug!(
                contract = %contract_type,
                count = registry.len(contract_type),
                "Mocks restored"
            );
        }

        Ok(registry)
    }
}
