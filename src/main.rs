use battle_arena::{
    contract::{
        EthersArena,
        resolve_binding,
    },
    deployment::{
        self,
        DeploymentStore,
    },
    network::NetworkTarget,
    wallets,
};
use clap::{
    ArgGroup,
    Parser,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use ethers::signers::LocalWallet;
use std::path::{
    Path,
    PathBuf,
};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

mod client;
mod ui;

#[derive(Parser, Debug)]
#[command(
    name = "battle-arena",
    about = "Find a Battle Arena game by id and join it",
    version,
    group(
        ArgGroup::new("network")
            .args(["testnet", "local"])
    ),
    group(
        ArgGroup::new("signer")
            .args(["keystore", "wallet"])
    )
)]
struct Args {
    /// Connect to Rootstock testnet (default)
    #[arg(long)]
    testnet: bool,

    /// Connect to a local development node
    #[arg(long)]
    local: bool,

    /// Override RPC URL
    #[arg(long)]
    rpc_url: Option<String>,

    /// BattleArena contract address (defaults to the latest recorded deployment)
    #[arg(long)]
    contract: Option<String>,

    /// Path to an Ethereum keystore file
    #[arg(long)]
    keystore: Option<String>,

    /// Keystore name inside the wallet directory
    #[arg(long)]
    wallet: Option<String>,

    /// Override keystore directory (defaults to ~/.ethereum/keystore)
    #[arg(long, requires = "wallet")]
    wallet_dir: Option<String>,

    /// Search this game id on startup
    #[arg(long)]
    game: Option<u64>,

    /// Directory for the daily log files
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

impl Args {
    fn target(&self) -> NetworkTarget {
        if self.local {
            NetworkTarget::local(self.rpc_url.clone())
        } else {
            NetworkTarget::testnet(self.rpc_url.clone())
        }
    }

    fn load_wallet(&self, target: &NetworkTarget) -> Result<Option<LocalWallet>> {
        let descriptor = match (&self.keystore, &self.wallet) {
            (Some(path), _) => wallets::descriptor_for_path(path),
            (None, Some(name)) => {
                let dir = wallets::resolve_wallet_dir(self.wallet_dir.as_deref())
                    .wrap_err("resolving wallet directory")?;
                wallets::find_wallet(&dir, name).wrap_err("locating requested wallet")?
            }
            (None, None) => return Ok(None),
        };
        let wallet = wallets::unlock_wallet(&descriptor, target.expected_chain_id())
            .wrap_err("unlocking keystore")?;
        Ok(Some(wallet))
    }
}

/// The terminal belongs to the UI, so logs go to a daily file.
fn init_tracing(log_dir: &Path) -> WorkerGuard {
    let appender = rolling::daily(log_dir, "battle-arena.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let _guard = init_tracing(&args.log_dir);
    tracing::info!("starting battle-arena client");

    deployment::ensure_structure().wrap_err("initializing deployment directories")?;
    let target = args.target();
    let store = DeploymentStore::new(target.deployment_env())
        .wrap_err("opening deployment store")?;
    let binding = resolve_binding(&target, args.contract.as_deref(), &store)?;
    tracing::info!(address = ?binding.address, url = target.url(), "using BattleArena contract");

    let wallet = args.load_wallet(&target)?;
    let gateway = EthersArena::connect(&target, &binding, wallet)?;

    client::run_app(
        client::AppConfig {
            target,
            binding,
            initial_game: args.game,
        },
        gateway,
    )
    .await
}
