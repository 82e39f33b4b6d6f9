use crate::arena_types;
use ethers::types::{
    Address,
    H160,
    U256,
};

/// The all-zero address the arena contract uses for an unoccupied player slot.
pub const SENTINEL_ADDRESS: Address = H160([0u8; 20]);

/// Decimals of the network's native token.
pub const NATIVE_DECIMALS: u32 = 18;

/// Read-only projection of a game record held by the arena contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Game {
    pub game_id: U256,
    pub game_type: u8,
    pub stake: U256,
    pub players: [Address; 2],
    pub is_active: bool,
}

impl Game {
    /// What `getGameById` returns for an id the contract never assigned.
    pub fn vacant(game_id: U256) -> Self {
        Self {
            game_id,
            game_type: 0,
            stake: U256::zero(),
            players: [SENTINEL_ADDRESS; 2],
            is_active: false,
        }
    }

    pub fn is_vacant(&self) -> bool {
        self.players
            .iter()
            .all(|player| *player == SENTINEL_ADDRESS)
    }

    pub fn has_second_player(&self) -> bool {
        self.players[1] != SENTINEL_ADDRESS
    }

    pub fn is_seated(&self, who: Address) -> bool {
        who != SENTINEL_ADDRESS && self.players.contains(&who)
    }

    pub fn kind(&self) -> GameKind {
        GameKind::from_raw(self.game_type)
    }
}

impl From<arena_types::Game> for Game {
    fn from(raw: arena_types::Game) -> Self {
        Self {
            game_id: raw.game_id,
            game_type: raw.game_type,
            stake: raw.stake,
            players: raw.players,
            is_active: raw.is_active,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GameKind {
    LightningDuel,
    WarriorClash,
    EpicTournament,
    Unknown,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GameTypeInfo {
    pub kind: GameKind,
    pub label: &'static str,
    pub rounds: u8,
}

impl GameKind {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => GameKind::LightningDuel,
            1 => GameKind::WarriorClash,
            2 => GameKind::EpicTournament,
            _ => GameKind::Unknown,
        }
    }

    pub fn info(self) -> GameTypeInfo {
        let (label, rounds) = match self {
            GameKind::LightningDuel => ("LIGHTNING DUEL", 1),
            GameKind::WarriorClash => ("WARRIOR CLASH", 2),
            GameKind::EpicTournament => ("EPIC TOURNAMENT", 5),
            GameKind::Unknown => ("Unknown", 0),
        };
        GameTypeInfo {
            kind: self,
            label,
            rounds,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            GameKind::LightningDuel => "🎮",
            GameKind::WarriorClash => "⚔️",
            GameKind::EpicTournament => "🏆",
            GameKind::Unknown => "❔",
        }
    }
}

/// Scales an amount in the token's smallest unit to display units, trimming
/// trailing fractional zeros. Falls back to the raw amount when `decimals`
/// is out of range.
pub fn format_units(amount: U256, decimals: u32) -> String {
    match ethers::utils::format_units(amount, decimals) {
        Ok(formatted) if formatted.contains('.') => formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string(),
        Ok(formatted) => formatted,
        Err(_) => amount.to_string(),
    }
}

pub fn format_stake(stake: U256) -> String {
    format_units(stake, NATIVE_DECIMALS)
}
