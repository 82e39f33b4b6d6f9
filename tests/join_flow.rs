#![allow(non_snake_case)]
use battle_arena::{
    card::GameCard,
    contract::{
        ArenaGateway,
        NO_WALLET_MESSAGE,
    },
    errors::USER_REJECTED_MESSAGE,
    game::SENTINEL_ADDRESS,
    join::{
        CONFIRMED_MESSAGE,
        JoinOrchestrator,
        JoinPhase,
        drive_join,
    },
    lookup::{
        GameLookup,
        LookupCommand,
        LookupEvent,
        LookupKey,
        lookup_worker,
    },
    notifications::{
        ToastKind,
        Toasts,
    },
    test_helpers::{
        FakeArena,
        address,
        open_game,
    },
};
use ethers::types::{
    Address,
    U256,
};
use std::{
    sync::Arc,
    time::Instant,
};
use tokio::sync::mpsc;

const GAME_ID: u64 = 42;

/// The pieces the controller owns, wired to a fake arena the same way the
/// event loop wires them.
struct Session {
    arena: FakeArena,
    user: Option<Address>,
    lookup: GameLookup,
    join: JoinOrchestrator,
    toasts: Toasts,
    cmd_tx: mpsc::UnboundedSender<LookupCommand>,
    event_rx: mpsc::UnboundedReceiver<LookupEvent>,
}

impl Session {
    fn start(arena: FakeArena) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        tokio::spawn(lookup_worker(Arc::new(arena.clone()), cmd_rx, event_tx));
        Self {
            user: arena.account(),
            arena,
            lookup: GameLookup::new(),
            join: JoinOrchestrator::new(),
            toasts: Toasts::new(),
            cmd_tx,
            event_rx,
        }
    }

    async fn fetch(&mut self, key: LookupKey) {
        self.cmd_tx.send(LookupCommand::Fetch(key)).unwrap();
        let LookupEvent { key, game } = self.event_rx.recv().await.unwrap();
        self.lookup.resolve(key, game);
    }

    async fn search(&mut self, game_id: u64) {
        let key = self.lookup.search(game_id);
        self.fetch(key).await;
    }

    fn card(&self) -> GameCard {
        GameCard::build(self.lookup.game(), self.user, self.join.in_flight(), "tRBTC")
    }

    /// Activates the join affordance and runs the submission to settlement.
    async fn join(&mut self) {
        let request = self.card().activate_join().expect("join offered");
        assert!(self.join.begin(request, &mut self.toasts));
        assert!(self.card().activate_join().is_none());

        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
        drive_join(Arc::new(self.arena.clone()), request, progress_tx).await;

        let mut reissued = Vec::new();
        while let Some(progress) = progress_rx.recv().await {
            let now = Instant::now();
            if let Some(key) =
                self.join
                    .apply(progress, &mut self.toasts, &mut self.lookup, now)
            {
                reissued.push(key);
            }
        }
        assert_eq!(reissued.len(), 1, "a settled join re-issues the lookup once");
        self.fetch(reissued[0]).await;
    }
}

fn arena_with_open_game(user: Option<Address>) -> FakeArena {
    let arena = match user {
        Some(user) => FakeArena::with_account(user),
        None => FakeArena::new(),
    };
    arena.insert_game(open_game(GAME_ID, address(0xA), U256::exp10(18)));
    arena
}

#[tokio::test]
async fn join__confirmed_join_seats_user_and_offers_arena() {
    // given
    let player = address(0xB);
    let mut session = Session::start(arena_with_open_game(Some(player)));
    session.search(GAME_ID).await;
    let token_before = session.lookup.refresh_token();

    // when
    session.join().await;

    // then
    assert!(matches!(session.join.phase(), JoinPhase::Confirmed { .. }));
    assert!(session.lookup.refresh_token() > token_before);
    assert_eq!(session.arena.lookups().len(), 2);
    assert_eq!(session.arena.joins().len(), 1);
    assert_eq!(session.arena.joins()[0].stake, U256::exp10(18));
    assert_eq!(session.toasts.visible().len(), 1);
    assert!(
        session
            .toasts
            .visible()
            .iter()
            .any(|t| t.kind == ToastKind::Success && t.message == CONFIRMED_MESSAGE)
    );
    let card = session.card();
    assert_eq!(card.view().unwrap().occupancy, "2 WARRIORS");
    assert_eq!(card.arena_route().as_deref(), Some("/game/42"));
}

#[tokio::test]
async fn join__wallet_rejection_leaves_game_unchanged_and_reenables_join() {
    // given
    let arena = arena_with_open_game(Some(address(0xB)));
    arena.reject_joins_with("MetaMask Tx Signature: User denied transaction signature.");
    let mut session = Session::start(arena);
    session.search(GAME_ID).await;

    // when
    session.join().await;

    // then
    let error = session
        .toasts
        .visible()
        .iter()
        .find(|t| t.kind == ToastKind::Error)
        .expect("error toast");
    assert_eq!(error.message, USER_REJECTED_MESSAGE);
    assert_eq!(session.toasts.visible().len(), 1);
    assert_eq!(
        session.arena.stored_game(GAME_ID).unwrap().players[1],
        SENTINEL_ADDRESS
    );
    assert!(session.card().activate_join().is_some());
}

#[tokio::test]
async fn join__reverted_confirmation_surfaces_revert_reason() {
    // given
    let arena = arena_with_open_game(Some(address(0xB)));
    arena.revert_confirmations_with("execution reverted: Game is full");
    let mut session = Session::start(arena);
    session.search(GAME_ID).await;

    // when
    session.join().await;

    // then
    assert_eq!(
        session.join.phase(),
        &JoinPhase::Failed {
            request: session.arena.joins()[0],
            message: "Game is full".to_string(),
        }
    );
    assert_eq!(session.arena.lookups().len(), 2);
}

#[tokio::test]
async fn join__without_wallet_asks_to_connect() {
    // given
    let mut session = Session::start(arena_with_open_game(None));
    session.search(GAME_ID).await;

    // when
    session.join().await;

    // then
    assert_eq!(session.toasts.visible()[0].message, NO_WALLET_MESSAGE);
    assert!(session.arena.joins().is_empty());
}

#[tokio::test]
async fn join__second_activation_while_in_flight_never_reaches_contract() {
    // given
    let arena = arena_with_open_game(Some(address(0xB)));
    let mut session = Session::start(arena);
    session.search(GAME_ID).await;
    let request = session.card().activate_join().unwrap();
    assert!(session.join.begin(request, &mut session.toasts));

    // when
    let accepted = session.join.begin(request, &mut session.toasts);

    // then
    assert!(!accepted);
    assert!(session.arena.joins().is_empty());
    assert_eq!(session.toasts.visible().len(), 1);
}
