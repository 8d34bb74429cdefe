//! [`Chain`] over an Ethereum JSON-RPC endpoint.

use std::time::Duration;

use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy_core::primitives::{Address, B256, Bytes, TxKind, U64, U128};
use alloy_eips::eip2718::Encodable2718;
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use anyhow::Context;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::{Chain, DeployRequest, DeployedContract, VerificationStatus};
use crate::{AccountSigner, DeployError, DeploymentStore, config::DEFAULT_POLL_INTERVAL_MS, rpc};

/// The fields of a transaction receipt the deployer looks at.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionReceipt {
    transaction_hash: B256,
    contract_address: Option<Address>,
    /// Absent on pre-Byzantium chains.
    status: Option<U64>,
}

/// The fields of a block header the fee estimation looks at.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestBlock {
    base_fee_per_gas: Option<U128>,
}

/// A chain reached over HTTP JSON-RPC.
#[derive(Debug, Clone)]
pub struct RpcChain {
    client: reqwest::Client,
    url: Url,
    network: String,
    chain_id: u64,
    poll_interval: Duration,
    store: Option<DeploymentStore>,
}

impl RpcChain {
    /// Connect to `url` and read its chain id.
    pub async fn connect(url: Url, network: impl Into<String>) -> Result<Self, DeployError> {
        let client = rpc::create_client().map_err(DeployError::Chain)?;
        let chain_id: U64 = rpc::json_rpc_call(&client, url.as_str(), "eth_chainId", vec![])
            .await
            .with_context(|| format!("Failed to reach {url}"))
            .map_err(DeployError::Chain)?;
        let network = network.into();

        tracing::info!(network = %network, chain_id = %chain_id, rpc_url = %url, "Connected");

        Ok(Self {
            client,
            url,
            network,
            chain_id: chain_id.to(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            store: None,
        })
    }

    /// Set the interval between two receipt polls.
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Record every deployment in `store`.
    pub fn deployment_store(mut self, store: DeploymentStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn store(&self) -> Option<&DeploymentStore> {
        self.store.as_ref()
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> anyhow::Result<T> {
        rpc::json_rpc_call(&self.client, self.url.as_str(), method, params).await
    }

    /// Let the node sign and submit the creation for an account it holds.
    async fn send_unlocked(&self, from: Address, data: &Bytes) -> anyhow::Result<B256> {
        self.call(
            "eth_sendTransaction",
            vec![json!({ "from": from, "data": data })],
        )
        .await
    }

    /// Sign the creation in-process as an EIP-1559 transaction and submit it raw.
    async fn send_signed(&self, signer: &PrivateKeySigner, data: &Bytes) -> anyhow::Result<B256> {
        let from = signer.address();

        let nonce: U64 = self
            .call("eth_getTransactionCount", vec![json!(from), json!("pending")])
            .await?;
        let gas_limit: U64 = self
            .call("eth_estimateGas", vec![json!({ "from": from, "data": data })])
            .await?;
        let priority_fee: U128 = self.call("eth_maxPriorityFeePerGas", vec![]).await?;
        let block: LatestBlock = self
            .call("eth_getBlockByNumber", vec![json!("latest"), json!(false)])
            .await?;
        let base_fee = block
            .base_fee_per_gas
            .context("Latest block has no base fee, EIP-1559 is not active")?;

        let tx = TxEip1559 {
            chain_id: self.chain_id,
            nonce: nonce.to(),
            gas_limit: gas_limit.to(),
            max_fee_per_gas: base_fee.to::<u128>() * 2 + priority_fee.to::<u128>(),
            max_priority_fee_per_gas: priority_fee.to(),
            to: TxKind::Create,
            input: data.clone(),
            ..Default::default()
        };

        tracing::debug!(
            from = %from,
            nonce = tx.nonce,
            gas_limit = tx.gas_limit,
            max_fee_per_gas = tx.max_fee_per_gas,
            "Submitting signed deployment transaction"
        );

        let raw = sign_transaction(signer, tx)?;
        self.call("eth_sendRawTransaction", vec![json!(raw)]).await
    }

    /// Poll until the transaction is mined. There is no timeout.
    async fn wait_for_receipt(&self, tx_hash: B256) -> anyhow::Result<TransactionReceipt> {
        loop {
            let receipt: Option<TransactionReceipt> = self
                .call("eth_getTransactionReceipt", vec![json!(tx_hash)])
                .await?;

            if let Some(receipt) = receipt {
                return Ok(receipt);
            }

            tracing::trace!(tx_hash = %tx_hash, "Receipt not available yet, retrying...");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Sign an EIP-1559 transaction and return its EIP-2718 encoding.
fn sign_transaction(signer: &PrivateKeySigner, tx: TxEip1559) -> anyhow::Result<Bytes> {
    let signature = signer
        .sign_hash_sync(&tx.signature_hash())
        .context("Failed to sign deployment transaction")?;
    let envelope = TxEnvelope::from(tx.into_signed(signature));
    Ok(envelope.encoded_2718().into())
}

impl Chain for RpcChain {
    async fn dev_accounts(&self) -> Result<Vec<Address>, DeployError> {
        self.call("eth_accounts", vec![])
            .await
            .map_err(DeployError::Chain)
    }

    async fn code_exists(&self, address: Address) -> Result<bool, DeployError> {
        let code: Bytes = self
            .call("eth_getCode", vec![json!(address), json!("latest")])
            .await
            .map_err(DeployError::Chain)?;
        Ok(!code.is_empty())
    }

    async fn deploy(&self, request: DeployRequest<'_>) -> Result<DeployedContract, DeployError> {
        let contract_type = request.artifact.contract_type;
        let data = request.creation_code();
        let from = request.from.address();

        tracing::debug!(
            contract = %contract_type,
            from = %from,
            bytes = data.len(),
            "Submitting deployment transaction"
        );

        let tx_hash = match request.from.signer() {
            AccountSigner::Unlocked => self.send_unlocked(from, &data).await,
            AccountSigner::Local(signer) => self.send_signed(signer, &data).await,
        }
        .map_err(DeployError::Transaction)?;

        tracing::info!(contract = %contract_type, tx_hash = %tx_hash, "Transaction sent, waiting for receipt");

        let receipt = self
            .wait_for_receipt(tx_hash)
            .await
            .map_err(DeployError::Transaction)?;

        if receipt.status == Some(U64::ZERO) {
            return Err(DeployError::Transaction(anyhow::anyhow!(
                "deployment of {contract_type} reverted in transaction {}",
                receipt.transaction_hash
            )));
        }

        let address = receipt.contract_address.ok_or_else(|| {
            DeployError::Transaction(anyhow::anyhow!(
                "receipt of transaction {} has no contract address",
                receipt.transaction_hash
            ))
        })?;

        let verification = match (request.publish_source, &self.store) {
            (false, _) => VerificationStatus::NotRequested,
            (true, Some(_)) => VerificationStatus::Pending,
            (true, None) => {
                tracing::warn!(
                    network = %self.network,
                    contract = %contract_type,
                    "Source verification is unavailable on a network launched for this run"
                );
                VerificationStatus::NotRequested
            }
        };

        let deployed = DeployedContract {
            contract_type,
            address,
            abi: request.artifact.abi.clone(),
            network: self.network.clone(),
            transaction_hash: receipt.transaction_hash,
            verification,
        };

        tracing::info!(
            contract = %contract_type,
            address = %address,
            tx_hash = %deployed.transaction_hash,
            verification = %verification,
            "Contract deployed"
        );

        // The contract is on chain whatever happens to its record.
        if let Some(Err(e)) = self
            .store
            .as_ref()
            .map(|store| store.record(&deployed, &request.constructor_args))
        {
            tracing::warn!(
                contract = %contract_type,
                address = %address,
                error = %format!("{e:#}"),
                "Failed to record deployment"
            );
        }

        Ok(deployed)
    }
}
