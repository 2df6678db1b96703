//! Command-line wallet for TRON-style ledgers.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tron_types::NetworkId;
use tron_utils::LogFormat;
use tron_wallet_core::{
    create_and_broadcast_multi_signed_transfer, ClientConfig, HttpLedgerClient, LedgerService,
    PermissionSet, Token, Wallet,
};

#[derive(Parser)]
#[command(name = "tron-wallet", about = "Wallet for TRON-style ledgers", version)]
struct Cli {
    /// Network: "mainnet", "shasta" or "nile".
    /// When a config file is provided, defaults to the file's network value.
    #[arg(long, env = "TRON_NETWORK")]
    network: Option<NetworkId>,

    /// Full-node HTTP endpoint (defaults to the network's public endpoint).
    #[arg(long, env = "TRON_NODE_URL")]
    node_url: Option<String>,

    /// API key sent with every request.
    #[arg(long, env = "TRON_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, env = "TRON_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "TRON_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "TRON_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Key material for commands that sign.
#[derive(clap::Args)]
struct Signer {
    /// Hex private key of the sending account.
    #[arg(long, env = "TRON_PRIVATE_KEY", hide_env_values = true)]
    private_key: String,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Create a new mnemonic and print its first address.
    Generate {
        /// Number of mnemonic words: 12, 15, 18, 21 or 24.
        #[arg(long, default_value_t = 12)]
        words: usize,
    },
    /// Print the address for a private key or mnemonic.
    Address {
        #[arg(long, env = "TRON_PRIVATE_KEY", hide_env_values = true, conflicts_with = "mnemonic")]
        private_key: Option<String>,
        #[arg(long, env = "TRON_MNEMONIC", hide_env_values = true)]
        mnemonic: Option<String>,
        /// Derivation path (defaults to the configured path).
        #[arg(long)]
        path: Option<String>,
        #[arg(long, default_value = "")]
        passphrase: String,
    },
    /// Native balance in sun.
    Balance { address: String },
    /// Token balance in base units.
    TokenBalance {
        #[arg(long)]
        token: String,
        address: String,
    },
    /// Send sun to an address.
    Transfer {
        #[command(flatten)]
        signer: Signer,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: u64,
    },
    /// Send token base units to an address.
    TransferToken {
        #[command(flatten)]
        signer: Signer,
        #[arg(long)]
        token: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: u128,
    },
    /// Send sun from an account that needs several signatures.
    MultiTransfer {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: u64,
        /// Hex private keys, comma-separated, in signing order.
        #[arg(long, env = "TRON_SIGNING_KEYS", hide_env_values = true, value_delimiter = ',')]
        keys: Vec<String>,
    },
    /// Estimate the fee of a transfer in sun.
    EstimateFee {
        #[command(flatten)]
        signer: Signer,
        #[arg(long)]
        to: String,
        /// Sun for native transfers, base units with --token.
        #[arg(long)]
        amount: u128,
        #[arg(long)]
        token: Option<String>,
    },
    /// Replace the account's permissions: either 2-of-2 with a co-signer,
    /// or the layout in a TOML permission file.
    UpdatePermission {
        #[command(flatten)]
        signer: Signer,
        #[arg(long, required_unless_present = "permissions", conflicts_with = "permissions")]
        co_signer: Option<String>,
        #[arg(long)]
        permissions: Option<PathBuf>,
    },
}

/// Config file first, then CLI flags and env vars on top.
fn resolve_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(network) = cli.network {
        config.network = network;
    }
    if let Some(url) = &cli.node_url {
        config.node_url = Some(url.clone());
    }
    if let Some(key) = &cli.api_key {
        config.api_key = Some(key.clone());
    }
    if let Some(secs) = cli.timeout_secs {
        config.timeout_secs = secs;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = match format {
            LogFormat::Human => "human".to_string(),
            LogFormat::Json => "json".to_string(),
        };
    }
    config.validate()?;
    Ok(config)
}

fn load_permission_set(path: &Path) -> anyhow::Result<PermissionSet> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    PermissionSet::from_toml_str(&contents)
        .with_context(|| format!("invalid permission file {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    let format: LogFormat = config
        .log_format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    tron_utils::init_logging(format, &config.log_level);
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    run(cli.command, &config)
}

fn run(command: Command, config: &ClientConfig) -> anyhow::Result<()> {
    match command {
        Command::Generate { words } => {
            let mnemonic = tron_crypto::generate_mnemonic(words)?;
            let wallet = Wallet::from_mnemonic(&mnemonic, &config.derivation_path, "")?;
            println!("mnemonic: {mnemonic}");
            println!("path:     {}", config.derivation_path);
            println!("address:  {}", wallet.address_base58());
            println!("hex:      {}", wallet.address_hex());
        }
        Command::Address {
            private_key,
            mnemonic,
            path,
            passphrase,
        } => {
            let wallet = match (private_key, mnemonic) {
                (Some(key), _) => Wallet::from_private_key_hex(&key)?,
                (None, Some(phrase)) => {
                    let path = path.as_deref().unwrap_or(&config.derivation_path);
                    Wallet::from_mnemonic(&phrase, path, &passphrase)?
                }
                (None, None) => anyhow::bail!("either --private-key or --mnemonic is required"),
            };
            println!("{}", wallet.address_base58());
            println!("{}", wallet.address_hex());
        }
        Command::Balance { address } => {
            let client = HttpLedgerClient::new(config)?;
            let address = tron_crypto::from_base58(&address)?;
            println!("{}", client.get_account(&address)?.balance);
        }
        Command::TokenBalance { token, address } => {
            let client = HttpLedgerClient::new(config)?;
            let token = Token::from_base58(&token)?;
            let owner = tron_crypto::from_base58(&address)?;
            println!("{}", client.token_balance(&token.contract, &owner)?);
        }
        Command::Transfer { signer, to, amount } => {
            let client = HttpLedgerClient::new(config)?;
            let wallet = Wallet::from_private_key_hex(&signer.private_key)?;
            println!("{}", wallet.transfer(&client, &to, amount)?);
        }
        Command::TransferToken {
            signer,
            token,
            to,
            amount,
        } => {
            let client = HttpLedgerClient::new(config)?;
            let wallet = Wallet::from_private_key_hex(&signer.private_key)?;
            let token = Token::from_base58(&token)?;
            println!("{}", wallet.transfer_token(&client, &token, &to, amount)?);
        }
        Command::MultiTransfer {
            from,
            to,
            amount,
            keys,
        } => {
            let client = HttpLedgerClient::new(config)?;
            let keys = keys
                .iter()
                .map(|k| tron_crypto::keypair_from_hex(k))
                .collect::<Result<Vec<_>, _>>()?;
            let refs: Vec<_> = keys.iter().collect();
            let txid = create_and_broadcast_multi_signed_transfer(&client, &from, &to, amount, &refs)?;
            println!("{txid}");
        }
        Command::EstimateFee {
            signer,
            to,
            amount,
            token,
        } => {
            let client = HttpLedgerClient::new(config)?;
            let wallet = Wallet::from_private_key_hex(&signer.private_key)?;
            let fee = match token {
                Some(token) => {
                    let token = Token::from_base58(&token)?;
                    wallet.estimate_token_transfer_fee(&client, &token, &to, amount)?
                }
                None => {
                    let amount = u64::try_from(amount).context("amount exceeds u64 sun")?;
                    wallet.estimate_transfer_fee(&client, &to, amount)?
                }
            };
            println!("{fee}");
        }
        Command::UpdatePermission {
            signer,
            co_signer,
            permissions,
        } => {
            let client = HttpLedgerClient::new(config)?;
            let wallet = Wallet::from_private_key_hex(&signer.private_key)?;
            let txid = match (co_signer, permissions) {
                (Some(co_signer), _) => wallet.update_permission(&client, &co_signer)?,
                (None, Some(path)) => {
                    let set = load_permission_set(&path)?;
                    wallet.update_account_permission(
                        &client,
                        &set.owner,
                        set.witness.as_ref(),
                        &set.actives,
                    )?
                }
                (None, None) => anyhow::bail!("either --co-signer or --permissions is required"),
            };
            println!("{txid}");
        }
    }
    Ok(())
}
