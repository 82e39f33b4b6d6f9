use crate::{
    arena_types::BattleArena,
    deployment::{
        DeploymentRecord,
        DeploymentStore,
        compute_abi_hash,
    },
    game::Game,
    join::JoinRequest,
    network::NetworkTarget,
};
use color_eyre::eyre::{
    Report,
    Result,
    WrapErr,
    eyre,
};
use ethers::{
    contract::ContractError,
    middleware::SignerMiddleware,
    providers::{
        Http,
        Middleware,
        PendingTransaction,
        Provider,
    },
    signers::{
        LocalWallet,
        Signer,
    },
    types::{
        Address,
        TxHash,
        U64,
        U256,
    },
};
use std::{
    future::Future,
    str::FromStr,
    sync::Arc,
    time::Duration,
};
use tracing::{
    info,
    warn,
};

pub const ARENA_ABI: &str = include_str!("../abi/BattleArena.json");
pub const NO_WALLET_MESSAGE: &str = "Connect a wallet to join a battle";

const TESTNET_POLL_INTERVAL: Duration = Duration::from_secs(2);
const LOCAL_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// The two calls the join flow makes against the arena contract, plus the
/// connection facts it needs.
pub trait ArenaGateway: Send + Sync + 'static {
    fn chain_id(&self) -> impl Future<Output = Result<u64>> + Send;

    fn game_by_id(&self, game_id: U256) -> impl Future<Output = Result<Game>> + Send;

    /// Sends `joinGame(game_id)` with `value = stake`. Resolves once the
    /// transaction is accepted, with its hash.
    fn submit_join(
        &self,
        request: JoinRequest,
    ) -> impl Future<Output = Result<TxHash>> + Send;

    /// Resolves once the transaction is mined successfully; reverted and
    /// dropped transactions are errors.
    fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = Result<()>> + Send;

    fn account(&self) -> Option<Address>;
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BindingSource {
    CommandLine,
    DeploymentRecord { recorded_at: String },
}

/// Address of the arena contract on the selected network.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContractBinding {
    pub address: Address,
    pub source: BindingSource,
}

pub fn resolve_binding(
    target: &NetworkTarget,
    override_address: Option<&str>,
    store: &DeploymentStore,
) -> Result<ContractBinding> {
    let abi_hash = compute_abi_hash(ARENA_ABI.as_bytes());

    if let Some(raw) = override_address {
        let address = parse_address(raw)?;
        let known = store
            .load()?
            .iter()
            .any(|record| parse_address(&record.contract_address).ok() == Some(address));
        if !known {
            store
                .append(DeploymentRecord::new(
                    format!("{address:?}"),
                    abi_hash,
                    target.url(),
                    Some(target.expected_chain_id()),
                ))
                .wrap_err("Failed to record contract address")?;
            info!(?address, path = %store.path().display(), "recorded contract address");
        }
        return Ok(ContractBinding {
            address,
            source: BindingSource::CommandLine,
        });
    }

    let record = store.latest()?.ok_or_else(|| {
        eyre!(
            "No BattleArena address recorded in {}; pass --contract <ADDRESS>",
            store.path().display()
        )
    })?;
    if !record.is_compatible_with_hash(&abi_hash) {
        warn!(
            recorded = %record.abi_hash,
            current = %abi_hash,
            "deployment record was made with a different ABI"
        );
    }
    let address = parse_address(&record.contract_address)?;
    Ok(ContractBinding {
        address,
        source: BindingSource::DeploymentRecord {
            recorded_at: record.recorded_at,
        },
    })
}

pub fn parse_address(raw: &str) -> Result<Address> {
    Address::from_str(raw.trim())
        .map_err(|err| eyre!("Invalid contract address '{raw}': {err}"))
}

type SignedClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Arena contract over JSON-RPC. Without a wallet it is read-only and every
/// join is rejected.
pub struct EthersArena {
    provider: Provider<Http>,
    reader: BattleArena<Provider<Http>>,
    writer: Option<BattleArena<SignedClient>>,
    account: Option<Address>,
    poll_interval: Duration,
}

impl EthersArena {
    pub fn connect(
        target: &NetworkTarget,
        binding: &ContractBinding,
        wallet: Option<LocalWallet>,
    ) -> Result<Self> {
        let poll_interval = match target {
            NetworkTarget::Testnet { .. } => TESTNET_POLL_INTERVAL,
            NetworkTarget::Local { .. } => LOCAL_POLL_INTERVAL,
        };
        let provider = Provider::<Http>::try_from(target.url())
            .wrap_err_with(|| format!("Invalid RPC URL {}", target.url()))?
            .interval(poll_interval);
        let reader = BattleArena::new(binding.address, Arc::new(provider.clone()));
        let account = wallet.as_ref().map(|wallet| wallet.address());
        let writer = wallet.map(|wallet| {
            let client = SignerMiddleware::new(provider.clone(), wallet);
            BattleArena::new(binding.address, Arc::new(client))
        });
        Ok(Self {
            provider,
            reader,
            writer,
            account,
            poll_interval,
        })
    }
}

impl ArenaGateway for EthersArena {
    async fn chain_id(&self) -> Result<u64> {
        let id = self
            .provider
            .get_chainid()
            .await
            .wrap_err("eth_chainId failed")?;
        Ok(id.as_u64())
    }

    async fn game_by_id(&self, game_id: U256) -> Result<Game> {
        let raw = self
            .reader
            .get_game_by_id(game_id)
            .call()
            .await
            .map_err(contract_error)?;
        Ok(Game::from(raw))
    }

    async fn submit_join(&self, request: JoinRequest) -> Result<TxHash> {
        let writer = self.writer.as_ref().ok_or_else(|| eyre!(NO_WALLET_MESSAGE))?;
        let call = writer.join_game(request.game_id).value(request.stake);
        let pending = call.send().await.map_err(contract_error)?;
        Ok(pending.tx_hash())
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<()> {
        let receipt = PendingTransaction::new(tx_hash, &self.provider)
            .interval(self.poll_interval)
            .confirmations(1)
            .await
            .wrap_err("Failed to watch joinGame transaction")?
            .ok_or_else(|| eyre!("Transaction {tx_hash:?} was dropped"))?;
        if receipt.status == Some(U64::zero()) {
            return Err(eyre!("Transaction {tx_hash:?} reverted"));
        }
        Ok(())
    }

    fn account(&self) -> Option<Address> {
        self.account
    }
}

/// Flattens a contract error into one line, decoding `Error(string)` revert
/// data when present.
fn contract_error<M: Middleware>(err: ContractError<M>) -> Report {
    match err.decode_revert::<String>() {
        Some(reason) => eyre!("execution reverted: {reason}"),
        None => eyre!("{err}"),
    }
}
