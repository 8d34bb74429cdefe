//! mantra deploys the campaign contract to the configured network.

mod cli;

use anyhow::Result;
use clap::Parser;

use cli::Cli;
use mantra_deploy::{CampaignDeployer, Configuration, DeployContext};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let config = Configuration::load(cli.config.as_deref(), cli.network.as_deref())?;
    let ctx = DeployContext::new(config)?;

    // Kept alive until the end of the run; the node is killed on drop.
    let _node = ctx.launch_node().await?;

    let chain = ctx.connect().await?;
    let resolver = ctx.dependency_resolver(&chain).await?;

    let mut deployer = CampaignDeployer::with_resolver(&ctx, &chain, resolver);
    let campaign = deployer.deploy_campaign().await?;

    tracing::info!(
        network = %campaign.network,
        address = %campaign.address,
        tx_hash = %campaign.transaction_hash,
        verification = %campaign.verification,
        "Deployment complete"
    );

    Ok(())
}
