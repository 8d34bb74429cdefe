//! Deployment of the campaign contract.

use alloy_core::sol_types::SolValue;

use crate::{
    Chain, ContractType, DeployContext, DeployError, DeployRequest, DeployedContract,
    Dependency, DependencyResolver, get_account,
};

/// Deploys `mantraCampaign` wired to its price feed.
pub struct CampaignDeployer<'a, C: Chain> {
    ctx: &'a DeployContext,
    chain: &'a C,
    resolver: DependencyResolver,
}

impl<'a, C: Chain> CampaignDeployer<'a, C> {
    /// A deployer with an empty mock registry.
    pub fn new(ctx: &'a DeployContext, chain: &'a C) -> Self {
        Self::with_resolver(ctx, chain, DependencyResolver::default())
    }

    pub fn with_resolver(ctx: &'a DeployContext, chain: &'a C, resolver: DependencyResolver) -> Self {
        Self {
            ctx,
            chain,
            resolver,
        }
    }

    pub fn resolver(&self) -> &DependencyResolver {
        &self.resolver
    }

    /// Deploy a new campaign contract.
    ///
    /// Every call deploys a fresh contract; the price feed is shared between calls.
    pub async fn deploy_campaign(&mut self) -> Result<DeployedContract, DeployError> {
        tracing::info!(network = %self.ctx.network.name, "Deploying contracts...");

        let account = get_account(self.ctx, self.chain).await?;
        let price_feed = self
            .resolver
            .resolve_dependency(self.ctx, self.chain, Dependency::EthUsdPriceFeed)
            .await?;

        let artifact = self.ctx.artifacts.get(ContractType::MantraCampaign)?;
        let deployed = self
            .chain
            .deploy(DeployRequest {
                artifact,
                constructor_args: (price_feed.address,).abi_encode_params().into(),
                from: &account,
                publish_source: self.ctx.network.settings.verify,
            })
            .await?;

        tracing::info!(
            network = %self.ctx.network.name,
            address = %deployed.address,
            price_feed = %price_feed.address,
            "Deployed contract mantraCampaign in {} network",
            self.ctx.network.name
        );

        Ok(deployed)
    }
}
