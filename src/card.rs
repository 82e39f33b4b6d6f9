use crate::{
    game::{
        Game,
        GameTypeInfo,
        format_stake,
    },
    join::JoinRequest,
};
use ethers::types::{
    Address,
    U256,
};

pub const NOT_FOUND_MESSAGE: &str = "Game not found. Please check the game ID.";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GameStatus {
    Live,
    Ended,
}

impl GameStatus {
    pub fn label(self) -> &'static str {
        match self {
            GameStatus::Live => "LIVE",
            GameStatus::Ended => "ENDED",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CardAction {
    /// The current user holds a seat; leads to the game's detail view.
    EnterArena { game_id: U256 },
    /// Both seats are taken by other players.
    ArenaFull,
    Join {
        game_id: U256,
        stake: U256,
        enabled: bool,
    },
}

impl CardAction {
    pub fn label(&self) -> &'static str {
        match self {
            CardAction::EnterArena { .. } => "ENTER BATTLE ARENA",
            CardAction::ArenaFull => "ARENA FULL",
            CardAction::Join { enabled: true, .. } => "JOIN BATTLE",
            CardAction::Join { enabled: false, .. } => "JOINING...",
        }
    }

    pub fn is_enabled(&self) -> bool {
        match self {
            CardAction::EnterArena { .. } => true,
            CardAction::ArenaFull => false,
            CardAction::Join { enabled, .. } => *enabled,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CardView {
    pub game_id: U256,
    pub title: String,
    pub type_info: GameTypeInfo,
    pub formatted_stake: String,
    pub token_symbol: String,
    pub has_second_player: bool,
    pub occupancy: &'static str,
    pub status: GameStatus,
    pub action: CardAction,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GameCard {
    NotFound,
    Found(Box<CardView>),
}

impl GameCard {
    pub fn build(
        game: Option<&Game>,
        user: Option<Address>,
        join_in_flight: bool,
        token_symbol: &str,
    ) -> Self {
        let Some(game) = game.filter(|game| !game.is_vacant()) else {
            return GameCard::NotFound;
        };

        let has_second_player = game.has_second_player();
        let user_is_seated =
            has_second_player && user.is_some_and(|user| game.is_seated(user));

        let action = if user_is_seated {
            CardAction::EnterArena {
                game_id: game.game_id,
            }
        } else if has_second_player {
            CardAction::ArenaFull
        } else {
            CardAction::Join {
                game_id: game.game_id,
                stake: game.stake,
                enabled: !join_in_flight,
            }
        };

        GameCard::Found(Box::new(CardView {
            game_id: game.game_id,
            title: format!("Battle #{}", game.game_id),
            type_info: game.kind().info(),
            formatted_stake: format_stake(game.stake),
            token_symbol: token_symbol.to_string(),
            has_second_player,
            occupancy: if has_second_player {
                "2 WARRIORS"
            } else {
                "1 WARRIOR"
            },
            status: if game.is_active {
                GameStatus::Live
            } else {
                GameStatus::Ended
            },
            action,
        }))
    }

    pub fn view(&self) -> Option<&CardView> {
        match self {
            GameCard::NotFound => None,
            GameCard::Found(view) => Some(&**view),
        }
    }

    /// The join call to make when the join affordance is activated, if it is
    /// present and enabled.
    pub fn activate_join(&self) -> Option<JoinRequest> {
        match self.view()?.action {
            CardAction::Join {
                game_id,
                stake,
                enabled: true,
            } => Some(JoinRequest { game_id, stake }),
            _ => None,
        }
    }

    /// Detail route for a seated user.
    pub fn arena_route(&self) -> Option<String> {
        match self.view()?.action {
            CardAction::EnterArena { game_id } => Some(format!("/game/{game_id}")),
            _ => None,
        }
    }

    pub fn clipboard_text(&self) -> Option<String> {
        self.view().map(|view| view.game_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::game::SENTINEL_ADDRESS;
    use proptest::prelude::*;

    fn address(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn game(players: [Address; 2]) -> Game {
        Game {
            game_id: U256::from(42),
            game_type: 1,
            stake: U256::exp10(18),
            players,
            is_active: true,
        }
    }

    #[test]
    fn build__open_game_without_user_offers_join() {
        // given
        let game = game([address(0xA), SENTINEL_ADDRESS]);

        // when
        let card = GameCard::build(Some(&game), None, false, "tRBTC");

        // then
        let view = card.view().expect("found");
        assert_eq!(view.title, "Battle #42");
        assert_eq!(view.type_info.label, "WARRIOR CLASH");
        assert_eq!(view.formatted_stake, "1");
        assert_eq!(view.occupancy, "1 WARRIOR");
        assert_eq!(view.status, GameStatus::Live);
        assert_eq!(view.action.label(), "JOIN BATTLE");
        assert_eq!(
            card.activate_join(),
            Some(JoinRequest {
                game_id: U256::from(42),
                stake: U256::exp10(18),
            })
        );
    }

    #[test]
    fn build__seated_user_gets_arena_navigation() {
        // given
        let b = address(0xB);
        let game = game([address(0xA), b]);

        // when
        let card = GameCard::build(Some(&game), Some(b), false, "tRBTC");

        // then
        let view = card.view().expect("found");
        assert_eq!(view.occupancy, "2 WARRIORS");
        assert_eq!(view.action.label(), "ENTER BATTLE ARENA");
        assert_eq!(card.activate_join(), None);
        assert_eq!(card.arena_route().as_deref(), Some("/game/42"));
    }

    #[test]
    fn build__full_game_for_outsider_is_disabled() {
        let game = game([address(0xA), address(0xB)]);
        let card = GameCard::build(Some(&game), Some(address(0xC)), false, "tRBTC");
        let view = card.view().expect("found");
        assert_eq!(view.action, CardAction::ArenaFull);
        assert!(!view.action.is_enabled());
        assert_eq!(card.activate_join(), None);
    }

    #[test]
    fn build__first_player_waiting_alone_can_still_join_own_game() {
        // seat check only applies once the game is full
        let a = address(0xA);
        let game = game([a, SENTINEL_ADDRESS]);
        let card = GameCard::build(Some(&game), Some(a), false, "tRBTC");
        assert!(card.activate_join().is_some());
    }

    #[test]
    fn build__join_disabled_while_in_flight() {
        let game = game([address(0xA), SENTINEL_ADDRESS]);
        let card = GameCard::build(Some(&game), None, true, "tRBTC");
        let view = card.view().expect("found");
        assert!(!view.action.is_enabled());
        assert_eq!(card.activate_join(), None);
    }

    #[test]
    fn build__missing_game_is_not_found() {
        let card = GameCard::build(None, Some(address(1)), false, "tRBTC");
        assert_eq!(card, GameCard::NotFound);
        assert_eq!(card.clipboard_text(), None);
    }

    #[test]
    fn clipboard_text__is_decimal_game_id() {
        let game = game([address(0xA), SENTINEL_ADDRESS]);
        let card = GameCard::build(Some(&game), None, false, "tRBTC");
        assert_eq!(card.clipboard_text().as_deref(), Some("42"));
    }

    fn any_address() -> impl Strategy<Value = Address> {
        prop_oneof![Just(SENTINEL_ADDRESS), (1u8..=4).prop_map(address)]
    }

    proptest! {
        #[test]
        fn build__vacant_games_never_offer_join(
            id in any::<u64>(),
            stake in any::<u128>(),
            game_type in any::<u8>(),
            user in proptest::option::of(any_address()),
        ) {
            let game = Game {
                game_id: U256::from(id),
                game_type,
                stake: U256::from(stake),
                players: [SENTINEL_ADDRESS; 2],
                is_active: true,
            };
            let card = GameCard::build(Some(&game), user, false, "tRBTC");
            prop_assert_eq!(card, GameCard::NotFound);
        }

        #[test]
        fn build__full_games_never_offer_enabled_join(
            first in any_address(),
            second in (1u8..=4).prop_map(address),
            user in proptest::option::of(any_address()),
            in_flight in any::<bool>(),
        ) {
            let game = game([first, second]);
            let card = GameCard::build(Some(&game), user, in_flight, "tRBTC");
            let view = card.view().expect("occupied game is found");
            match view.action {
                CardAction::EnterArena { .. } => {
                    prop_assert!(user.is_some_and(|u| game.is_seated(u)));
                }
                CardAction::ArenaFull => prop_assert!(!view.action.is_enabled()),
                CardAction::Join { .. } => prop_assert!(false, "join offered on a full game"),
            }
            prop_assert_eq!(card.activate_join(), None);
        }

        #[test]
        fn build__open_games_join_with_exact_id_and_stake(
            id in any::<u64>(),
            stake in any::<u128>(),
            first in (1u8..=4).prop_map(address),
            user in proptest::option::of(any_address()),
        ) {
            let game = Game {
                game_id: U256::from(id),
                game_type: 0,
                stake: U256::from(stake),
                players: [first, SENTINEL_ADDRESS],
                is_active: true,
            };
            let card = GameCard::build(Some(&game), user, false, "tRBTC");
            prop_assert_eq!(
                card.activate_join(),
                Some(JoinRequest { game_id: U256::from(id), stake: U256::from(stake) })
            );
        }
    }
}
