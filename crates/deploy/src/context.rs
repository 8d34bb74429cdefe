//! Everything a run needs to know, resolved once up front.

use std::time::Duration;

use crate::{
    AnvilHandler, ArtifactStore, Configuration, DependencyResolver, DeployError,
    DeploymentStore, MockRegistry, NetworkContext, RpcChain, current_network,
};

/// Configuration, active network and compiled artifacts of a run.
#[derive(Debug, Clone)]
pub struct DeployContext {
    pub config: Configuration,
    pub network: NetworkContext,
    pub artifacts: ArtifactStore,
}

impl DeployContext {
    /// Resolve the active network and load the artifacts from the build directory.
    pub fn new(config: Configuration) -> Result<Self, DeployError> {
        let network = current_network(&config)?;
        let artifacts = ArtifactStore::load(&config.project.build_dir)?;

        tracing::info!(
            network = %network.name,
            kind = %network.kind,
            build_dir = %config.project.build_dir.display(),
            "Network resolved"
        );

        Ok(Self::from_parts(config, network, artifacts))
    }

    pub fn from_parts(
        config: Configuration,
        network: NetworkContext,
        artifacts: ArtifactStore,
    ) -> Self {
        Self {
            config,
            network,
            artifacts,
        }
    }

    /// Start the local node of the active network, if it has a `launch` section.
    ///
    /// The node lives as long as the returned handler.
    pub async fn launch_node(&self) -> Result<Option<AnvilHandler>, DeployError> {
        let Some(launch) = self
            .network
            .settings
            .launch
            .as_ref()
            .filter(|_| self.network.launches_node())
        else {
            return Ok(None);
        };

        tracing::info!(network = %self.network.name, port = launch.port, "Launching anvil...");

        let handler = launch.start().await.map_err(DeployError::Chain)?;

        tracing::info!(
            pid = ?handler.pid(),
            rpc_url = %handler.rpc_url,
            "Anvil is ready"
        );

        Ok(Some(handler))
    }

    /// Connect to the active network. Persistent networks record their deployments.
    pub async fn connect(&self) -> Result<RpcChain, DeployError> {
        let chain = RpcChain::connect(self.network.rpc_url()?, self.network.name.clone())
            .await?
            .poll_interval(Duration::from_millis(self.config.project.poll_interval_ms));

        if !self.network.is_persistent() {
            return Ok(chain);
        }

        let store = DeploymentStore::new(self.config.deployments_dir(), chain.chain_id());
        Ok(chain.deployment_store(store))
    }

    /// A resolver whose registry holds the mocks recorded on this chain, if any.
    pub async fn dependency_resolver(&self, chain: &RpcChain) -> Result<DependencyResolver, DeployError> {
        let registry = match (self.network.is_local(), chain.store()) {
            (true, Some(store)) => MockRegistry::restore(store, chain, &self.artifacts).await?,
            _ => MockRegistry::new(),
        };

        Ok(DependencyResolver::new(registry))
    }
}
