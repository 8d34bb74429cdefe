//! mantra-deploy - Deployment library for the mantra campaign contracts.
//!
//! This crate deploys the `mantraCampaign` contract together with the price feed it
//! depends on. Local development networks get a freshly deployed price feed mock;
//! remote networks use the address configured for them.

mod accounts;
pub use accounts::{Account, AccountSigner, FROM_KEY, get_account};

mod anvil;
pub use anvil::{AnvilCmdBuilder, AnvilConfig, AnvilHandler};

mod artifact;
pub use artifact::{ArtifactStore, ContractArtifact, ContractType};

mod campaign;
pub use campaign::CampaignDeployer;

mod chain;
pub use chain::{Chain, ContractHandle, DeployRequest, DeployedContract, RpcChain, VerificationStatus};

pub mod config;
pub use config::{Configuration, NetworkSettings, ProjectSettings, WalletSettings};

mod context;
pub use context::DeployContext;

mod dependency;
pub use dependency::{Dependency, DependencyResolver, MockParams};

mod deployments;
pub use deployments::{DEPLOYMENT_MAP_FILENAME, DeploymentMap, DeploymentRecord, DeploymentStore};

mod error;
pub use error::DeployError;

mod network;
pub use network::{
    DEFAULT_LOCAL_RPC_URL, EPHEMERAL_ENVIRONMENTS, FORKED_LOCAL_ENVIRONMENTS,
    LOCAL_BLOCKCHAIN_ENVIRONMENTS, NetworkContext, NetworkKind, current_network,
};

mod registry;
pub use registry::MockRegistry;

pub mod rpc;
