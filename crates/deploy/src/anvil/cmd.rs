//! Command builder for Anvil.

/// Builder for Anvil command-line arguments.
#[derive(Debug, Clone)]
pub struct AnvilCmdBuilder {
    host: String,
    port: u16,
    accounts: usize,
    chain_id: Option<u64>,
    block_time: Option<u64>,
    fork_url: Option<String>,
    fork_block_number: Option<u64>,
    extra_args: Vec<String>,
}

impl AnvilCmdBuilder {
    /// Create a new Anvil command builder listening on `port`.
    pub fn new(port: u16) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port,
            accounts: 10,
            chain_id: None,
            block_time: None,
            fork_url: None,
            fork_block_number: None,
            extra_args: Vec::new(),
        }
    }

    /// Set the host address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the number of pre-funded dev accounts.
    pub fn accounts(mut self, accounts: usize) -> Self {
        self.accounts = accounts;
        self
    }

    /// Set the chain ID. Anvil picks its own default when unset.
    pub fn chain_id(mut self, chain_id: Option<u64>) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Set the block time in seconds. Anvil automines when unset.
    pub fn block_time(mut self, block_time: Option<u64>) -> Self {
        self.block_time = block_time;
        self
    }

    /// Set the fork URL.
    pub fn fork_url(mut self, url: impl Into<String>) -> Self {
        self.fork_url = Some(url.into());
        self
    }

    /// Set the fork block number.
    pub fn fork_block_number(mut self, block_number: Option<u64>) -> Self {
        self.fork_block_number = block_number;
        self
    }

    /// Add extra arguments.
    pub fn extra_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extra_args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Build the command as a vector of strings.
    pub fn build(self) -> Vec<String> {
        let mut cmd = vec![
            "--host".to_string(),
            self.host,
            "--port".to_string(),
            self.port.to_string(),
            "--accounts".to_string(),
            self.accounts.to_string(),
        ];

        if let Some(chain_id) = self.chain_id {
            cmd.push("--chain-id".to_string());
            cmd.push(chain_id.to_string());
        }

        if let Some(block_time) = self.block_time {
            cmd.push("--block-time".to_string());
            cmd.push(block_time.to_string());
        }

        if let Some(fork_url) = self.fork_url {
            cmd.push("--fork-url".to_string());
            cmd.push(fork_url);

            // A fork block only means something with a fork URL.
            if let Some(fork_block_number) = self.fork_block_number {
                cmd.push("--fork-block-number".to_string());
                cmd.push(fork_block_number.to_string());
            }
        }

        cmd.extend(self.extra_args);

        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anvil_cmd_builder_defaults() {
        let cmd = AnvilCmdBuilder::new(8545).build();

        assert_eq!(
            cmd,
            vec!["--host", "127.0.0.1", "--port", "8545", "--accounts", "10"]
        );
    }

    #[test]
    fn test_anvil_cmd_builder_fork() {
        let cmd = AnvilCmdBuilder::new(8545)
            .chain_id(Some(1))
            .fork_url("https://ethereum-rpc.publicnode.com")
            .fork_block_number(Some(19_000_000))
            .extra_args(["--silent"])
            .build();

        assert!(cmd.contains(&"--chain-id".to_string()));
        assert!(cmd.contains(&"--fork-url".to_string()));
        assert!(cmd.contains(&"19000000".to_string()));
        assert_eq!(cmd.last().map(String::as_str), Some("--silent"));
    }

    #[test]
    fn test_fork_block_number_requires_fork_url() {
        let cmd = AnvilCmdBuilder::new(8545)
            .fork_block_number(Some(19_000_000))
            .build();

        assert!(!cmd.contains(&"--fork-block-number".to_string()));
    }
}
