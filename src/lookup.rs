use crate::{
    contract::ArenaGateway,
    game::Game,
};
use chrono::Utc;
use ethers::types::U256;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{
    debug,
    warn,
};

/// Opaque value whose change forces the game query to run again.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RefreshToken(i64);

impl RefreshToken {
    /// Current time in milliseconds, bumped past the previous value when the
    /// clock has not moved.
    pub fn advance(&mut self) {
        let now = Utc::now().timestamp_millis();
        self.0 = now.max(self.0.saturating_add(1));
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct LookupKey {
    pub game_id: u64,
    pub refresh: RefreshToken,
}

/// Absent or unparsable input searches game 0.
pub fn parse_game_id(input: &str) -> u64 {
    input.trim().parse().unwrap_or(0)
}

/// Query state for the game card: which key was last issued and what the
/// last resolved query returned.
#[derive(Debug, Default)]
pub struct GameLookup {
    game_id: u64,
    refresh: RefreshToken,
    searched: bool,
    last_issued: Option<LookupKey>,
    pending: usize,
    result: Option<Game>,
}

impl GameLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(&self) -> LookupKey {
        LookupKey {
            game_id: self.game_id,
            refresh: self.refresh,
        }
    }

    pub fn refresh_token(&self) -> RefreshToken {
        self.refresh
    }

    pub fn has_searched(&self) -> bool {
        self.searched
    }

    pub fn is_loading(&self) -> bool {
        self.pending > 0
    }

    /// Result of the last query to resolve; `None` after a failed query.
    pub fn game(&self) -> Option<&Game> {
        self.result.as_ref()
    }

    /// Explicit search: always issues, even for an unchanged id.
    pub fn search(&mut self, game_id: u64) -> LookupKey {
        self.game_id = game_id;
        self.searched = true;
        self.issue()
    }

    /// Advances the refresh token, re-issuing the query if one was ever made.
    pub fn invalidate(&mut self) -> Option<LookupKey> {
        self.refresh.advance();
        self.poll()
    }

    /// Issues the current key if it differs from the last one issued.
    pub fn poll(&mut self) -> Option<LookupKey> {
        if !self.searched || self.last_issued == Some(self.key()) {
            return None;
        }
        Some(self.issue())
    }

    /// Last to resolve wins.
    pub fn resolve(&mut self, key: LookupKey, game: Option<Game>) {
        debug!(game_id = key.game_id, found = game.is_some(), "game lookup resolved");
        self.pending = self.pending.saturating_sub(1);
        self.result = game;
    }

    fn issue(&mut self) -> LookupKey {
        let key = self.key();
        self.last_issued = Some(key);
        self.pending += 1;
        key
    }
}

pub enum LookupCommand {
    Fetch(LookupKey),
    Shutdown,
}

#[derive(Clone, Debug)]
pub struct LookupEvent {
    pub key: LookupKey,
    pub game: Option<Game>,
}

/// Serves `getGameById` queries until told to stop or the command channel
/// closes. Query failures resolve to `None`.
pub async fn lookup_worker<G: ArenaGateway>(
    gateway: Arc<G>,
    mut cmd_rx: mpsc::UnboundedReceiver<LookupCommand>,
    event_tx: mpsc::UnboundedSender<LookupEvent>,
) {
    while let Some(cmd) = cmd_rx.recv().await {
        let key = match cmd {
            LookupCommand::Fetch(key) => key,
            LookupCommand::Shutdown => break,
        };
        let game = match gateway.game_by_id(U256::from(key.game_id)).await {
            Ok(game) => Some(game),
            Err(err) => {
                warn!(game_id = key.game_id, error = %format!("{err:#}"), "game lookup failed");
                None
            }
        };
        if event_tx.send(LookupEvent { key, game }).is_err() {
            break;
        }
    }
}
