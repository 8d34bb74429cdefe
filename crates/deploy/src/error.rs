//! Error taxonomy for campaign deployments.

/// Errors surfaced by the deployment pipeline.
///
/// Nothing in this crate catches or retries these: every variant travels up to the
/// invoking process unchanged.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The configuration is unusable (no active network, unreadable file, bad value).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A key required on the active network is absent.
    #[error("missing configuration: networks.{network}.{key}")]
    MissingConfiguration { network: String, key: String },

    /// A signing secret required on the active network is absent.
    #[error("missing secret: {0}")]
    MissingSecret(&'static str),

    /// The signing secret is present but cannot be turned into a signer.
    #[error("invalid secret: {0}")]
    InvalidSecret(String),

    /// The logical dependency name is not one this project knows about.
    #[error("unknown dependency: {0}")]
    UnknownDependency(String),

    /// A compiled contract artifact is missing or malformed.
    #[error("artifact error: {0}")]
    Artifact(String),

    /// A deployment transaction was rejected, reverted or could not be submitted.
    #[error("transaction failed: {0:#}")]
    Transaction(#[source] anyhow::Error),

    /// A chain request outside of a deployment failed.
    #[error("chain request failed: {0:#}")]
    Chain(#[source] anyhow::Error),

    /// The persisted deployment records could not be read or written.
    #[error("deployment store error: {0:#}")]
    Store(#[source] anyhow::Error),
}

impl DeployError {
    pub(crate) fn missing_config(network: &str, key: impl Into<String>) -> Self {
        Self::MissingConfiguration {
            network: network.to_string(),
            key: key.into(),
        }
    }
}
