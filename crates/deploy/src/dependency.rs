//! Resolution of the external contracts the campaign depends on.
//!
//! On local networks dependencies are mocks, deployed on first use and reused afterwards.
//! On remote networks they are addresses taken from the network's configuration section.

use std::str::FromStr;

use alloy_core::{
    primitives::{Bytes, I256, U256},
    sol_types::SolValue,
};

use crate::{
    Chain, ContractHandle, ContractType, DeployContext, DeployError, DeployRequest,
    DeployedContract, MockRegistry, get_account,
};

/// External contracts the campaign needs.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Dependency {
    /// Chainlink ETH/USD price feed.
    EthUsdPriceFeed,
}

impl Dependency {
    /// Parse a logical dependency name.
    pub fn parse(name: &str) -> Result<Self, DeployError> {
        Self::from_str(name).map_err(|_| DeployError::UnknownDependency(name.to_string()))
    }

    /// The contract type standing in for this dependency on local networks.
    pub fn mock_type(self) -> ContractType {
        match self {
            Self::EthUsdPriceFeed => ContractType::MockV3Aggregator,
        }
    }

    /// Key of the dependency's address in a network section.
    pub fn config_key(self) -> &'static str {
        self.into()
    }
}

/// Constructor parameters of a price feed mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockParams {
    pub decimals: u8,
    pub initial_value: i64,
}

impl Default for MockParams {
    fn default() -> Self {
        Self {
            decimals: 8,
            initial_value: 200_000_000_000,
        }
    }
}

impl MockParams {
    /// ABI-encoded `(uint8 decimals, int256 initialAnswer)`.
    pub fn constructor_args(&self) -> Result<Bytes, DeployError> {
        let initial_value = I256::try_from(self.initial_value)
            .map_err(|e| DeployError::Configuration(format!("invalid mock initial value: {e}")))?;
        Ok((U256::from(self.decimals), initial_value)
            .abi_encode_params()
            .into())
    }
}

/// Resolves dependencies, deploying mocks where needed. Owns the mock registry.
#[derive(Debug, Clone, Default)]
pub struct DependencyResolver {
    registry: MockRegistry,
}

impl DependencyResolver {
    pub fn new(registry: MockRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &MockRegistry {
        &self.registry
    }

    /// Return a handle to `dependency` on the active network.
    ///
    /// Local networks reuse the newest registered mock and deploy one only when none
    /// exists. Remote networks never deploy.
    pub async fn resolve_dependency<C: Chain>(
        &mut self,
        ctx: &DeployContext,
        chain: &C,
        dependency: Dependency,
    ) -> Result<ContractHandle, DeployError> {
        let mock_type = dependency.mock_type();

        if ctx.network.is_local() {
            if let Some(mock) = self.registry.latest(mock_type) {
                tracing::debug!(
                    dependency = %dependency,
                    address = %mock.address,
                    "Reusing deployed mock"
                );
                return Ok(mock.clone());
            }

            let deployed = match dependency {
                Dependency::EthUsdPriceFeed => {
                    self.deploy_mock(ctx, chain, MockParams::default()).await?
                }
            };
            return Ok(deployed.handle());
        }

        let address = ctx.network.contract_address(dependency.config_key())?;
        let abi = ctx.artifacts.get(mock_type)?.abi.clone();

        tracing::debug!(
            dependency = %dependency,
            network = %ctx.network.name,
            address = %address,
            "Using configured contract"
        );

        Ok(ContractHandle::at(mock_type, address, abi))
    }

    /// Deploy a price feed mock and register it. Nothing is registered on failure.
    pub async fn deploy_mock<C: Chain>(
        &mut self,
        ctx: &DeployContext,
        chain: &C,
        params: MockParams,
    ) -> Result<DeployedContract, DeployError> {
        tracing::info!(network = %ctx.network.name, "deploying mocks");

        let account = get_account(ctx, chain).await?;
        let artifact = ctx.artifacts.get(ContractType::MockV3Aggregator)?;

        let deployed = chain
            .deploy(DeployRequest {
                artifact,
                constructor_args: params.constructor_args()?,
                from: &account,
                publish_source: false,
            })
            .await?;

        self.registry.push(deployed.handle());

        tracing::info!(
            address = %deployed.address,
            decimals = params.decimals,
            initial_value = params.initial_value,
            "Mock price feed deployed"
        );

        Ok(deployed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dependency() {
        assert_eq!(
            Dependency::parse("eth_usd_price_feed").unwrap(),
            Dependency::EthUsdPriceFeed
        );
        assert_eq!(Dependency::EthUsdPriceFeed.config_key(), "eth_usd_price_feed");
        assert_eq!(
            Dependency::EthUsdPriceFeed.mock_type(),
            ContractType::MockV3Aggregator
        );
    }

    #[test]
    fn test_parse_unknown_dependency() {
        let err = Dependency::parse("btc_usd_price_feed").unwrap_err();
        assert!(matches!(err, DeployError::UnknownDependency(ref name) if name == "btc_usd_price_feed"));
    }

    #[test]
    fn test_default_mock_constructor_args() {
        let args = MockParams::default().constructor_args().unwrap();

        assert_eq!(args.len(), 64);
        assert_eq!(U256::from_be_slice(&args[..32]), U256::from(8u8));
        assert_eq!(U256::from_be_slice(&args[32..]), U256::from(200_000_000_000u64));
    }

    #[test]
    fn test_negative_initial_value_is_sign_extended() {
        let args = MockParams {
            decimals: 18,
            initial_value: -1,
        }
        .constructor_args()
        .unwrap();

        assert!(args[32..].iter().all(|byte| *byte == 0xff));
    }
}
