use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "mantra")]
#[command(
    author,
    version,
    about = "Deploy the mantra campaign contract and its price feed"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "MANTRA_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// The network to deploy to. Overrides the `network` key of the configuration file.
    #[arg(short, long, env = "MANTRA_NETWORK")]
    pub network: Option<String>,

    /// Path to the configuration file (or the directory holding `mantra.toml`).
    ///
    /// Defaults to `mantra.toml` in the working directory, if present.
    #[arg(short, long, alias = "conf", env = "MANTRA_CONFIG")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "mantra",
            "--network",
            "mainnet-fork",
            "-c",
            "deploy/mantra.toml",
            "-v",
            "debug",
        ])
        .unwrap();

        assert_eq!(cli.network.as_deref(), Some("mainnet-fork"));
        assert_eq!(cli.config, Some(PathBuf::from("deploy/mantra.toml")));
        assert_eq!(cli.verbosity, LevelFilter::DEBUG);
    }
}
