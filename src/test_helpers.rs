use crate::{
    contract::{
        ArenaGateway,
        NO_WALLET_MESSAGE,
    },
    game::{
        Game,
        SENTINEL_ADDRESS,
    },
    join::JoinRequest,
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use ethers::types::{
    Address,
    TxHash,
    U256,
};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
    },
};

pub fn address(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

pub fn game(id: u64, game_type: u8, stake: U256, players: [Address; 2]) -> Game {
    Game {
        game_id: U256::from(id),
        game_type,
        stake,
        players,
        is_active: true,
    }
}

/// A game with only its creator seated.
pub fn open_game(id: u64, creator: Address, stake: U256) -> Game {
    game(id, 1, stake, [creator, SENTINEL_ADDRESS])
}

#[derive(Debug, Default)]
struct State {
    chain_id: Option<u64>,
    account: Option<Address>,
    games: HashMap<U256, Game>,
    reject_joins_with: Option<String>,
    revert_confirmations_with: Option<String>,
    fail_lookups: bool,
    lookups: Vec<U256>,
    joins: Vec<JoinRequest>,
    pending: HashMap<TxHash, JoinRequest>,
    next_tx: u64,
}

/// In-memory arena contract. A confirmed join seats the account in the
/// second slot, the way the deployed contract does.
#[derive(Clone, Debug, Default)]
pub struct FakeArena {
    state: Arc<Mutex<State>>,
}

impl FakeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(account: Address) -> Self {
        let arena = Self::new();
        arena.lock().account = Some(account);
        arena
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.lock().chain_id = Some(chain_id);
    }

    pub fn insert_game(&self, game: Game) {
        self.lock().games.insert(game.game_id, game);
    }

    pub fn reject_joins_with(&self, message: impl Into<String>) {
        self.lock().reject_joins_with = Some(message.into());
    }

    pub fn revert_confirmations_with(&self, message: impl Into<String>) {
        self.lock().revert_confirmations_with = Some(message.into());
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.lock().fail_lookups = fail;
    }

    pub fn lookups(&self) -> Vec<U256> {
        self.lock().lookups.clone()
    }

    pub fn joins(&self) -> Vec<JoinRequest> {
        self.lock().joins.clone()
    }

    pub fn stored_game(&self, game_id: u64) -> Option<Game> {
        self.lock().games.get(&U256::from(game_id)).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ArenaGateway for FakeArena {
    async fn chain_id(&self) -> Result<u64> {
        self.lock()
            .chain_id
            .ok_or_else(|| eyre!("connection refused"))
    }

    async fn game_by_id(&self, game_id: U256) -> Result<Game> {
        let mut state = self.lock();
        state.lookups.push(game_id);
        if state.fail_lookups {
            return Err(eyre!("connection refused"));
        }
        Ok(state
            .games
            .get(&game_id)
            .cloned()
            .unwrap_or_else(|| Game::vacant(game_id)))
    }

    async fn submit_join(&self, request: JoinRequest) -> Result<TxHash> {
        let mut state = self.lock();
        if state.account.is_none() {
            return Err(eyre!(NO_WALLET_MESSAGE));
        }
        state.joins.push(request);
        if let Some(message) = state.reject_joins_with.clone() {
            return Err(eyre!(message));
        }
        state.next_tx += 1;
        let tx_hash = TxHash::from_low_u64_be(state.next_tx);
        state.pending.insert(tx_hash, request);
        Ok(tx_hash)
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<()> {
        let mut state = self.lock();
        let request = state
            .pending
            .remove(&tx_hash)
            .ok_or_else(|| eyre!("Transaction {tx_hash:?} was dropped"))?;
        if let Some(message) = state.revert_confirmations_with.clone() {
            return Err(eyre!(message));
        }
        let account = state.account.unwrap_or(SENTINEL_ADDRESS);
        let game = state
            .games
            .get_mut(&request.game_id)
            .ok_or_else(|| eyre!("execution reverted: Game does not exist"))?;
        if game.stake != request.stake {
            return Err(eyre!("execution reverted: Incorrect stake amount"));
        }
        if game.players[1] != SENTINEL_ADDRESS {
            return Err(eyre!("execution reverted: Game is full"));
        }
        game.players[1] = account;
        Ok(())
    }

    fn account(&self) -> Option<Address> {
        self.lock().account
    }
}
