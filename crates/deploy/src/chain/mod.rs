//! The chain the contracts are deployed to.

mod rpc;

pub use rpc::RpcChain;

use std::future::Future;

use alloy_core::{
    json_abi::JsonAbi,
    primitives::{Address, B256, Bytes},
};
use serde::{Deserialize, Serialize};

use crate::{Account, ContractArtifact, ContractType, DeployError};

/// A contract creation to submit.
#[derive(Debug, Clone)]
pub struct DeployRequest<'a> {
    /// Compiled contract to deploy.
    pub artifact: &'a ContractArtifact,
    /// ABI-encoded constructor arguments.
    pub constructor_args: Bytes,
    /// Account the deployment is sent from.
    pub from: &'a Account,
    /// Whether to request source verification for the deployed contract.
    pub publish_source: bool,
}

impl DeployRequest<'_> {
    /// Creation bytecode followed by the encoded constructor arguments.
    pub fn creation_code(&self) -> Bytes {
        [self.artifact.bytecode.as_ref(), self.constructor_args.as_ref()]
            .concat()
            .into()
    }
}

/// Source verification state of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VerificationStatus {
    NotRequested,
    /// Recorded for submission by an external verifier.
    Pending,
}

/// The outcome of a successful deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContract {
    pub contract_type: ContractType,
    pub address: Address,
    pub abi: JsonAbi,
    /// Name of the network the contract lives on.
    pub network: String,
    pub transaction_hash: B256,
    pub verification: VerificationStatus,
}

impl DeployedContract {
    /// A handle to call the deployed contract.
    pub fn handle(&self) -> ContractHandle {
        ContractHandle::at(self.contract_type, self.address, self.abi.clone())
    }
}

/// A callable reference to a contract that already exists on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractHandle {
    pub contract_type: ContractType,
    pub address: Address,
    pub abi: JsonAbi,
}

impl ContractHandle {
    /// Wrap an existing address with the interface of `contract_type`.
    pub fn at(contract_type: ContractType, address: Address, abi: JsonAbi) -> Self {
        Self {
            contract_type,
            address,
            abi,
        }
    }
}

/// Operations the deployment pipeline needs from a chain.
///
/// Every future blocks until the chain answers: deployments resolve once mined.
pub trait Chain: Send + Sync {
    /// Pre-funded test accounts exposed by the node, in node order.
    fn dev_accounts(&self) -> impl Future<Output = Result<Vec<Address>, DeployError>> + Send;

    /// Whether contract code exists at `address`.
    fn code_exists(
        &self,
        address: Address,
    ) -> impl Future<Output = Result<bool, DeployError>> + Send;

    /// Submit a contract creation and wait for it to be mined.
    fn deploy(
        &self,
        request: DeployRequest<'_>,
    ) -> impl Future<Output = Result<DeployedContract, DeployError>> + Send;
}
