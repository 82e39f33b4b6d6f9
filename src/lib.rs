pub mod card;
pub mod contract;
pub mod deployment;
pub mod errors;
pub mod game;
pub mod join;
pub mod lookup;
pub mod network;
pub mod notifications;
pub mod test_helpers;
pub mod wallets;

pub mod arena_types {
    use ethers::contract::abigen;

    abigen!(BattleArena, "abi/BattleArena.json");
}

pub use game::{
    Game,
    GameKind,
    GameTypeInfo,
};
pub use join::JoinRequest;
