//! Anvil node launched for local networks.

mod cmd;

use std::process::Stdio;

use alloy_core::primitives::U64;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use tokio::process::{Child, Command};
use url::Url;

pub use cmd::AnvilCmdBuilder;

use crate::rpc;

/// Default port for Anvil.
pub const DEFAULT_PORT: u16 = 8545;

/// Default number of pre-funded accounts.
pub const DEFAULT_ACCOUNTS: usize = 10;

/// Maximum time to wait for a launched node to answer RPC requests.
pub const READY_TIMEOUT_SECS: u64 = 30;

/// Configuration for a launched Anvil node (the `launch` table of a network section).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct AnvilConfig {
    /// Path or name of the anvil binary.
    pub binary: String,
    /// Host address Anvil binds to.
    pub host: String,
    /// Port Anvil listens on.
    pub port: u16,
    /// Number of pre-funded dev accounts.
    pub accounts: usize,
    /// Chain ID (Anvil's default when unset).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    /// Block time in seconds (automine when unset).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_time: Option<u64>,
    /// URL to fork from (optional, if not provided Anvil runs without forking).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fork: Option<String>,
    /// Fork block number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fork_block_number: Option<u64>,
    /// Extra arguments to pass to Anvil.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_args: Vec<String>,
}

impl Default for AnvilConfig {
    fn default() -> Self {
        Self {
            binary: "anvil".to_string(),
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            accounts: DEFAULT_ACCOUNTS,
            chain_id: None,
            block_time: None,
            fork: None,
            fork_block_number: None,
            extra_args: Vec::new(),
        }
    }
}

/// Handler for a running Anvil process. The process is killed when the handler drops.
#[derive(Debug)]
pub struct AnvilHandler {
    /// The anvil child process.
    child: Child,
    /// RPC URL of the node.
    pub rpc_url: Url,
}

impl AnvilHandler {
    /// OS process id of the node, if it is still running.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }
}

impl AnvilConfig {
    /// The RPC URL the launched node answers on.
    pub fn rpc_url(&self) -> anyhow::Result<Url> {
        Url::parse(&format!("http://{}:{}/", self.host, self.port))
            .context("Failed to parse HTTP URL")
    }

    /// Command-line arguments for this configuration.
    pub fn args(&self) -> Vec<String> {
        let mut cmd_builder = AnvilCmdBuilder::new(self.port)
            .host(&self.host)
            .accounts(self.accounts)
            .chain_id(self.chain_id)
            .block_time(self.block_time)
            .fork_block_number(self.fork_block_number)
            .extra_args(self.extra_args.clone());

        if let Some(ref fork_url) = self.fork {
            cmd_builder = cmd_builder.fork_url(fork_url);
        }

        cmd_builder.build()
    }

    /// Start an Anvil process and wait until it answers `eth_chainId`.
    pub async fn start(&self) -> anyhow::Result<AnvilHandler> {
        let rpc_url = self.rpc_url()?;
        let args = self.args();

        tracing::info!(
            binary = %self.binary,
            rpc_url = %rpc_url,
            fork = ?self.fork,
            "Starting Anvil..."
        );

        let child = Command::new(&self.binary)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.binary))?;

        let client = rpc::create_client()?;
        let url = rpc_url.to_string();

        rpc::wait_until_ready("anvil", READY_TIMEOUT_SECS, || {
            let client = client.clone();
            let url = url.clone();
            async move {
                rpc::json_rpc_call::<U64>(&client, &url, "eth_chainId", vec![])
                    .await
                    .map(|_| ())
            }
        })
        .await
        .context("Anvil did not become ready in time")?;

        tracing::info!(pid = ?child.id(), rpc_url = %rpc_url, "Anvil started");

        Ok(AnvilHandler { child, rpc_url })
    }
}
