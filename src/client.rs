use crate::ui;
use battle_arena::{
    card::GameCard,
    contract::{
        ArenaGateway,
        ContractBinding,
    },
    join::{
        JoinOrchestrator,
        JoinProgress,
        drive_join,
    },
    lookup::{
        GameLookup,
        LookupCommand,
        LookupEvent,
        LookupKey,
        lookup_worker,
    },
    network::{
        NetworkContext,
        NetworkTarget,
    },
    notifications::Toasts,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use ethers::types::Address;
use std::{
    sync::Arc,
    time::{
        Duration,
        Instant,
    },
};
use tokio::{
    sync::{
        mpsc,
        oneshot,
    },
    time,
};
use tracing::{
    info,
    warn,
};

const TOAST_TICK: Duration = Duration::from_millis(250);

pub struct AppConfig {
    pub target: NetworkTarget,
    pub binding: ContractBinding,
    pub initial_game: Option<u64>,
}

struct AppController<G: ArenaGateway> {
    gateway: Arc<G>,
    target: NetworkTarget,
    binding: ContractBinding,
    network: NetworkContext,
    account: Option<Address>,
    lookup: GameLookup,
    join: JoinOrchestrator,
    toasts: Toasts,
    status: String,
    lookup_tx: mpsc::UnboundedSender<LookupCommand>,
    progress_tx: mpsc::UnboundedSender<JoinProgress>,
}

impl<G: ArenaGateway> AppController<G> {
    fn card(&self) -> GameCard {
        GameCard::build(
            self.lookup.game(),
            self.account,
            self.join.in_flight(),
            self.network.info().token_symbol,
        )
    }

    fn draw(&self, ui_state: &mut ui::UiState) -> Result<()> {
        let card = self.card();
        let view = ui::ArenaView {
            network: self.network.info(),
            network_mismatch: self.network.mismatches(&self.target),
            contract: self.binding.address,
            account: self.account,
            has_searched: self.lookup.has_searched(),
            loading: self.lookup.is_loading(),
            card: &card,
            toasts: self.toasts.visible(),
            status: &self.status,
        };
        ui::draw(ui_state, &view)
    }

    fn fetch(&mut self, key: LookupKey) {
        if self.lookup_tx.send(LookupCommand::Fetch(key)).is_err() {
            warn!(game_id = key.game_id, "lookup worker is gone");
            self.lookup.resolve(key, None);
        }
    }

    fn search(&mut self, game_id: u64) {
        self.status.clear();
        let key = self.lookup.search(game_id);
        self.fetch(key);
    }

    fn apply_chain_id(&mut self, chain: Result<u64>) {
        match chain {
            Ok(chain_id) => self.set_network(chain_id),
            Err(err) => warn!(error = %format!("{err:#}"), "fetching chain id failed"),
        }
    }

    fn set_network(&mut self, chain_id: u64) {
        self.network = NetworkContext::resolved(chain_id);
        if self.network.mismatches(&self.target) {
            warn!(
                chain_id,
                expected = self.target.expected_chain_id(),
                "connected chain differs from the selected target"
            );
        } else {
            info!(chain_id, network = self.network.info().name, "network resolved");
        }
    }

    fn join(&mut self) {
        let Some(request) = self.card().activate_join() else {
            return;
        };
        if !self.join.begin(request, &mut self.toasts) {
            return;
        }
        tokio::spawn(drive_join(
            self.gateway.clone(),
            request,
            self.progress_tx.clone(),
        ));
    }

    fn apply_progress(&mut self, progress: JoinProgress) {
        let reissue = self.join.apply(
            progress,
            &mut self.toasts,
            &mut self.lookup,
            Instant::now(),
        );
        if let Some(key) = reissue {
            self.fetch(key);
        }
    }

    fn copy_id(&mut self) {
        if let Some(text) = self.card().clipboard_text() {
            ui::copy_to_clipboard(&text);
            self.status = format!("Copied game id {text}");
        }
    }

    fn enter_arena(&mut self) {
        if let Some(route) = self.card().arena_route() {
            info!(%route, "entering battle arena");
            self.status = format!("Entering battle arena at {route}");
        }
    }
}

pub async fn run_app<G: ArenaGateway>(config: AppConfig, gateway: G) -> Result<()> {
    let initial_input = config
        .initial_game
        .map(|id| id.to_string())
        .unwrap_or_default();
    let mut ui_state = ui::UiState::with_search_input(initial_input);
    let mut input_events = ui::input_event_stream();

    tracing::info!("Starting UI");
    ui::terminal_enter(&mut ui_state)?;
    tracing::info!("UI ready");
    let res = run_loop(config, Arc::new(gateway), &mut ui_state, &mut input_events).await;
    ui::terminal_exit()?;
    res
}

async fn run_loop<G: ArenaGateway>(
    config: AppConfig,
    gateway: Arc<G>,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEventReceiver,
) -> Result<()> {
    tracing::info!("Running app loop");
    let (lookup_tx, lookup_rx) = mpsc::unbounded_channel();
    let (lookup_event_tx, mut lookup_event_rx) = mpsc::unbounded_channel::<LookupEvent>();
    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
    tokio::spawn(lookup_worker(gateway.clone(), lookup_rx, lookup_event_tx));

    let (chain_tx, mut chain_rx) = oneshot::channel();
    let chain_gateway = gateway.clone();
    tokio::spawn(async move {
        let _ = chain_tx.send(chain_gateway.chain_id().await);
    });
    let mut chain_pending = true;

    let mut controller = AppController {
        account: gateway.account(),
        gateway,
        target: config.target,
        binding: config.binding,
        network: NetworkContext::pending(),
        lookup: GameLookup::new(),
        join: JoinOrchestrator::new(),
        toasts: Toasts::new(),
        status: String::new(),
        lookup_tx,
        progress_tx,
    };
    if let Some(game_id) = config.initial_game {
        controller.search(game_id);
    }
    controller.draw(ui_state).wrap_err("initial draw failed")?;

    let mut ticker = time::interval(TOAST_TICK);

    loop {
        tokio::select! {
            maybe_event = lookup_event_rx.recv() => {
                let Some(LookupEvent { key, game }) = maybe_event else {
                    warn!("lookup worker channel closed");
                    break;
                };
                controller.lookup.resolve(key, game);
                controller.draw(ui_state).wrap_err("draw after lookup failed")?;
            }
            Some(progress) = progress_rx.recv() => {
                controller.apply_progress(progress);
                controller.draw(ui_state).wrap_err("draw after join progress failed")?;
            }
            chain = &mut chain_rx, if chain_pending => {
                chain_pending = false;
                match chain {
                    Ok(chain) => controller.apply_chain_id(chain),
                    Err(_) => warn!("chain id task dropped"),
                }
                controller.draw(ui_state).wrap_err("draw after chain id failed")?;
            }
            _ = ticker.tick() => {
                if controller.toasts.expire(Instant::now()) {
                    controller.draw(ui_state).wrap_err("draw after toast expiry failed")?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
            raw_ev = ui::next_raw_event(input_events) => {
                let event = raw_ev?;
                let Some(ev) = ui::interpret_event(ui_state, event) else {
                    continue;
                };
                match ev {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::Search(game_id) => controller.search(game_id),
                    ui::UserEvent::Join => controller.join(),
                    ui::UserEvent::CopyId => controller.copy_id(),
                    ui::UserEvent::EnterArena => controller.enter_arena(),
                    ui::UserEvent::Redraw => {}
                }
                controller.draw(ui_state).wrap_err("draw after input failed")?;
            }
        }
    }

    let _ = controller.lookup_tx.send(LookupCommand::Shutdown);
    Ok(())
}
