//! Signing accounts.

use std::str::FromStr;

use alloy_core::primitives::Address;
use alloy_signer_local::PrivateKeySigner;

use crate::{Chain, DeployContext, DeployError};

/// Configuration key of the remote signing secret.
pub const FROM_KEY: &str = "wallets.from_key";

/// How transactions from an account get signed.
#[derive(Debug, Clone)]
pub enum AccountSigner {
    /// The node holds the key (pre-funded dev accounts on local networks).
    Unlocked,
    /// Signed in-process with a configured private key.
    Local(PrivateKeySigner),
}

/// An address plus the ability to sign for it.
#[derive(Debug, Clone)]
pub struct Account {
    address: Address,
    signer: AccountSigner,
}

impl Account {
    /// An account whose key is held by the node.
    pub fn unlocked(address: Address) -> Self {
        Self {
            address,
            signer: AccountSigner::Unlocked,
        }
    }

    /// An account signed for locally.
    pub fn local(signer: PrivateKeySigner) -> Self {
        Self {
            address: signer.address(),
            signer: AccountSigner::Local(signer),
        }
    }

    /// Derive an account from a hex-encoded private key.
    pub fn from_private_key(key: &str) -> Result<Self, DeployError> {
        PrivateKeySigner::from_str(key.trim())
            .map(Self::local)
            .map_err(|e| DeployError::InvalidSecret(format!("{FROM_KEY}: {e}")))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn signer(&self) -> &AccountSigner {
        &self.signer
    }
}

/// Return the account deployments are sent from on the active network.
///
/// Local networks use the node's first pre-funded account; remote networks derive a
/// signer from `wallets.from_key`.
pub async fn get_account<C: Chain>(ctx: &DeployContext, chain: &C) -> Result<Account, DeployError> {
    if ctx.network.is_local() {
        let accounts = chain.dev_accounts().await?;
        let address = accounts.first().copied().ok_or_else(|| {
            DeployError::Configuration(format!(
                "the {} node exposes no pre-funded accounts",
                ctx.network.name
            ))
        })?;
        return Ok(Account::unlocked(address));
    }

    let key = ctx
        .config
        .wallets
        .from_key
        .as_deref()
        .filter(|key| !key.trim().is_empty())
        .ok_or(DeployError::MissingSecret(FROM_KEY))?;

    Account::from_private_key(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// First anvil/hardhat dev key.
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_from_private_key() {
        let account = Account::from_private_key(DEV_KEY).unwrap();

        assert_eq!(
            account.address(),
            Address::from_str("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap()
        );
        assert!(matches!(account.signer(), AccountSigner::Local(_)));
    }

    #[test]
    fn test_from_private_key_rejects_garbage() {
        assert!(matches!(
            Account::from_private_key("0x1234"),
            Err(DeployError::InvalidSecret(_))
        ));
    }

    #[test]
    fn test_invalid_secret_is_not_echoed() {
        let err = Account::from_private_key("not-a-key").unwrap_err();
        assert!(!err.to_string().contains("not-a-key"));
    }
}
