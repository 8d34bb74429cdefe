//! Layered configuration: struct defaults, `mantra.toml`, `MANTRA_*` environment
//! variables, then command-line overrides.

use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::{AnvilConfig, DeployError};

/// The default name of the configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILENAME: &str = "mantra.toml";

/// Prefix of the environment variables merged over the configuration file.
///
/// Nested keys are separated by `__`, e.g. `MANTRA_WALLETS__FROM_KEY`.
pub const ENV_PREFIX: &str = "MANTRA_";

/// Default directory holding compiled contract artifacts.
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Default interval between two receipt polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Complete tool configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Name of the active network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    /// Project layout settings.
    #[serde(default)]
    pub project: ProjectSettings,
    /// Signing secrets for remote networks.
    #[serde(default)]
    pub wallets: WalletSettings,
    /// Per-network settings, keyed by network name.
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkSettings>,
}

/// Where the project keeps its build outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    /// Directory holding compiled contract artifacts.
    pub build_dir: PathBuf,
    /// Directory holding persisted deployment records. Defaults to `<build_dir>/deployments`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployments_dir: Option<PathBuf>,
    /// Interval between two `eth_getTransactionReceipt` polls, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
            deployments_dir: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

/// Signing secrets.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSettings {
    /// Hex-encoded private key used on remote networks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_key: Option<String>,
}

impl fmt::Debug for WalletSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletSettings")
            .field("from_key", &self.from_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Settings of a single network section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// JSON-RPC endpoint of the network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
    /// Whether deployments on this network request source verification.
    #[serde(default)]
    pub verify: bool,
    /// Start a local anvil node for the duration of the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch: Option<AnvilConfig>,
    /// Remaining keys of the section. Dependency addresses are looked up here by name;
    /// other keys are kept but ignored.
    #[serde(flatten)]
    pub contracts: BTreeMap<String, serde_json::Value>,
}

impl Configuration {
    /// Build the layered [`Figment`] the configuration is extracted from.
    ///
    /// A missing file contributes nothing; environment variables always apply.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Configuration::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load the configuration.
    ///
    /// When `path` is given the file must exist; otherwise [`DEFAULT_CONFIG_FILENAME`] is
    /// read if present. `network` overrides the active network from every other layer.
    pub fn load(path: Option<&Path>, network: Option<&str>) -> Result<Self, DeployError> {
        let config_path = match path {
            Some(path) if !path.exists() => {
                return Err(DeployError::Configuration(format!(
                    "configuration file not found: {}",
                    path.display()
                )));
            }
            Some(path) if path.is_dir() => path.join(DEFAULT_CONFIG_FILENAME),
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(DEFAULT_CONFIG_FILENAME),
        };

        let mut figment = Self::figment(&config_path);
        if let Some(network) = network {
            figment = figment.merge(Serialized::default("network", network));
        }

        let config: Self = figment
            .extract()
            .map_err(|e| DeployError::Configuration(e.to_string()))?;

        tracing::debug!(
            path = %config_path.display(),
            network = ?config.network,
            networks = config.networks.len(),
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Settings of the named network, if a section exists for it.
    pub fn network_settings(&self, name: &str) -> Option<&NetworkSettings> {
        self.networks.get(name)
    }

    /// Directory holding persisted deployment records.
    pub fn deployments_dir(&self) -> PathBuf {
        self.project
            .deployments_dir
            .clone()
            .unwrap_or_else(|| self.project.build_dir.join("deployments"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use figment::Jail;

    const SAMPLE: &str = r#"
        network = "development"

        [project]
        build_dir = "out"

        [networks.development]
        verify = false

        [networks.development.launch]
        port = 8546

        [networks.mainnet]
        rpc_url = "https://mainnet.example.org"
        verify = true
        eth_usd_price_feed = "0x5f4eC3Df9cbd43714FE2740f5E3616155c5b8419"
    "#;

    #[test]
    fn test_load_from_file() {
        Jail::expect_with(|jail| {
            jail.create_file(DEFAULT_CONFIG_FILENAME, SAMPLE)?;

            let config = Configuration::load(None, None).map_err(|e| e.to_string())?;
            assert_eq!(config.network.as_deref(), Some("development"));
            assert_eq!(config.project.build_dir, PathBuf::from("out"));
            assert_eq!(config.project.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
            assert_eq!(config.deployments_dir(), PathBuf::from("out/deployments"));

            let development = config.network_settings("development").unwrap();
            assert_eq!(development.launch.as_ref().map(|l| l.port), Some(8546));
            assert!(development.contracts.is_empty());

            let mainnet = config.network_settings("mainnet").unwrap();
            assert!(mainnet.verify);
            assert_eq!(
                mainnet
                    .contracts
                    .get("eth_usd_price_feed")
                    .and_then(serde_json::Value::as_str),
                Some("0x5f4eC3Df9cbd43714FE2740f5E3616155c5b8419")
            );
            Ok(())
        });
    }

    #[test]
    fn test_unrelated_section_keys_load() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILENAME,
                r#"
                network = "mainnet"

                [networks.mainnet]
                rpc_url = "https://mainnet.example.org"
                gas_limit = 6000000
                eth_usd_price_feed = "0x5f4eC3Df9cbd43714FE2740f5E3616155c5b8419"
                "#,
            )?;

            let config = Configuration::load(None, None).map_err(|e| e.to_string())?;
            let mainnet = config.network_settings("mainnet").unwrap();
            assert_eq!(
                mainnet.contracts.get("gas_limit").and_then(serde_json::Value::as_i64),
                Some(6_000_000)
            );
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(DEFAULT_CONFIG_FILENAME, SAMPLE)?;
            jail.set_env("MANTRA_NETWORK", "mainnet");
            jail.set_env("MANTRA_WALLETS__FROM_KEY", "0xdeadbeef");
            jail.set_env("MANTRA_NETWORKS__MAINNET__VERIFY", "false");

            let config = Configuration::load(None, None).map_err(|e| e.to_string())?;
            assert_eq!(config.network.as_deref(), Some("mainnet"));
            assert_eq!(config.wallets.from_key.as_deref(), Some("0xdeadbeef"));
            assert!(!config.network_settings("mainnet").unwrap().verify);
            Ok(())
        });
    }

    #[test]
    fn test_cli_network_override_wins() {
        Jail::expect_with(|jail| {
            jail.create_file(DEFAULT_CONFIG_FILENAME, SAMPLE)?;
            jail.set_env("MANTRA_NETWORK", "ganache-local");

            let config =
                Configuration::load(None, Some("mainnet-fork")).map_err(|e| e.to_string())?;
            assert_eq!(config.network.as_deref(), Some("mainnet-fork"));
            Ok(())
        });
    }

    #[test]
    fn test_missing_default_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let config = Configuration::load(None, None).map_err(|e| e.to_string())?;
            assert_eq!(config, Configuration::default());
            Ok(())
        });
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        Jail::expect_with(|_jail| {
            let err = Configuration::load(Some(Path::new("nope.toml")), None).unwrap_err();
            assert!(matches!(err, DeployError::Configuration(_)));
            Ok(())
        });
    }

    #[test]
    fn test_debug_redacts_secret() {
        let wallets = WalletSettings {
            from_key: Some("0xsecret".to_string()),
        };
        let rendered = format!("{wallets:?}");
        assert!(!rendered.contains("0xsecret"));
        assert!(rendered.contains("<redacted>"));
    }
}
