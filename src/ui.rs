use battle_arena::{
    card::{
        CardAction,
        GameCard,
        GameStatus,
        NOT_FOUND_MESSAGE,
    },
    lookup::parse_game_id,
    network::NetworkInfo,
    notifications::{
        Toast,
        ToastKind,
    },
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use crossterm::{
    clipboard::CopyToClipboard,
    event::{
        Event,
        EventStream,
        KeyCode,
        KeyEventKind,
        KeyModifiers,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use ethers::types::Address;
use futures::StreamExt;
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::{
    io::stdout,
    panic::{
        self,
        AssertUnwindSafe,
    },
};
use tracing::{
    error,
    warn,
};

const MAX_ID_DIGITS: usize = 20;
pub const EMPTY_STATE_MESSAGE: &str = "No active battles found";
pub const FALLBACK_MESSAGE: &str = "Something went wrong";

pub type InputEventReceiver = EventStream;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UserEvent {
    Quit,
    Search(u64),
    Join,
    CopyId,
    EnterArena,
    Redraw,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum Mode {
    #[default]
    Normal,
    QuitModal,
}

#[derive(Default)]
pub struct UiState {
    mode: Mode,
    search_input: String,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

impl UiState {
    pub fn with_search_input(input: impl Into<String>) -> Self {
        Self {
            search_input: input.into(),
            ..Self::default()
        }
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }
}

/// Everything the frame shows, assembled by the controller.
pub struct ArenaView<'a> {
    pub network: NetworkInfo,
    pub network_mismatch: bool,
    pub contract: Address,
    pub account: Option<Address>,
    pub has_searched: bool,
    pub loading: bool,
    pub card: &'a GameCard,
    pub toasts: &'a [Toast],
    pub status: &'a str,
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(stdout(), crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    state.terminal = Some(Terminal::new(backend)?);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}

pub fn input_event_stream() -> InputEventReceiver {
    EventStream::new()
}

pub async fn next_raw_event(input: &mut InputEventReceiver) -> Result<Event> {
    input
        .next()
        .await
        .ok_or_else(|| eyre!("terminal input closed"))?
        .wrap_err("reading terminal input failed")
}

pub fn interpret_event(state: &mut UiState, event: Event) -> Option<UserEvent> {
    let key = match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => key,
        Event::Resize(..) => return Some(UserEvent::Redraw),
        _ => return None,
    };

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(UserEvent::Quit);
    }

    if state.mode == Mode::QuitModal {
        return match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(UserEvent::Quit),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            state.mode = Mode::QuitModal;
            Some(UserEvent::Redraw)
        }
        KeyCode::Char(c) if c.is_ascii_digit() => {
            if state.search_input.len() < MAX_ID_DIGITS {
                state.search_input.push(c);
            }
            Some(UserEvent::Redraw)
        }
        KeyCode::Backspace => {
            state.search_input.pop();
            Some(UserEvent::Redraw)
        }
        KeyCode::Enter => Some(UserEvent::Search(parse_game_id(&state.search_input))),
        KeyCode::Char('j') => Some(UserEvent::Join),
        KeyCode::Char('y') => Some(UserEvent::CopyId),
        KeyCode::Char('e') => Some(UserEvent::EnterArena),
        _ => None,
    }
}

pub fn draw(state: &mut UiState, view: &ArenaView) -> Result<()> {
    if let Some(mut term) = state.terminal.take() {
        let res = term.draw(|f| frame(f, state, view)).map(|_| ());
        state.terminal = Some(term);
        res?;
    }
    Ok(())
}

/// Writes `text` to the system clipboard through an OSC 52 sequence.
/// Failures are logged and otherwise ignored.
pub fn copy_to_clipboard(text: &str) {
    if let Err(err) =
        crossterm::execute!(stdout(), CopyToClipboard::to_clipboard_from(text))
    {
        warn!(error = %err, "copying game id to clipboard failed");
    }
}

fn frame(f: &mut Frame, state: &UiState, view: &ArenaView) {
    render_guarded(f, |f| ui(f, state, view));
}

/// Runs `body`; a panic while laying out the arena is replaced by the
/// fallback screen.
fn render_guarded(f: &mut Frame, body: impl FnOnce(&mut Frame)) {
    let area = f.area();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(f)));
    if let Err(payload) = outcome {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_default();
        error!(%reason, "rendering failed");
        f.render_widget(Clear, area);
        let fallback = Paragraph::new(FALLBACK_MESSAGE)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL).title("Battle Arena"));
        f.render_widget(fallback, area);
    }
}

fn ui(f: &mut Frame, state: &UiState, view: &ArenaView) {
    f.render_widget(Clear, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),  // network + wallet
            Constraint::Length(3),  // search
            Constraint::Min(9),     // card
            Constraint::Length(5),  // toasts + status
            Constraint::Length(3),  // help
        ])
        .split(f.area());

    draw_header(f, chunks[0], view);
    draw_search(f, chunks[1], state);
    draw_card(f, chunks[2], view);
    draw_notifications(f, chunks[3], view);
    draw_help(f, chunks[4]);
    draw_modals(f, state);
}

fn draw_header(f: &mut Frame, area: Rect, view: &ArenaView) {
    let mut network = format!("Network: {}", view.network.name);
    if view.network.is_testnet {
        network.push_str(" (testnet)");
    }
    if view.network_mismatch {
        network.push_str(" | unexpected chain for the selected target");
    }
    let account = match view.account {
        Some(account) => format!("{account:?}"),
        None => "not connected (read-only)".to_string(),
    };
    let lines = vec![
        Line::from(network),
        Line::from(format!("Contract: {:?} | Wallet: {}", view.contract, account)),
    ];
    let style = if view.network_mismatch {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let widget = Paragraph::new(lines)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title("Battle Arena"));
    f.render_widget(widget, area);
}

fn draw_search(f: &mut Frame, area: Rect, state: &UiState) {
    let text = if state.search_input.is_empty() {
        Line::from(Span::styled(
            "Enter game ID",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(state.search_input.as_str())
    };
    let widget = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Search Battle"));
    f.render_widget(widget, area);
}

fn draw_card(f: &mut Frame, area: Rect, view: &ArenaView) {
    let block = Block::default().borders(Borders::ALL).title("Battle");
    let Some(card) = view.card.view() else {
        let message = if !view.has_searched {
            EMPTY_STATE_MESSAGE
        } else if view.loading {
            "Searching the battlefield..."
        } else {
            NOT_FOUND_MESSAGE
        };
        let widget = Paragraph::new(message)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(widget, area);
        return;
    };

    let status_style = match card.status {
        GameStatus::Live => Style::default().fg(Color::Green),
        GameStatus::Ended => Style::default().fg(Color::DarkGray),
    };
    let action_style = match card.action {
        CardAction::EnterArena { .. } => Style::default().fg(Color::Cyan),
        _ if card.action.is_enabled() => {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        }
        _ => Style::default().fg(Color::DarkGray),
    };
    let occupancy_style = if card.has_second_player {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Green)
    };

    let lines = vec![
        Line::from(vec![
            Span::styled(
                card.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(card.status.label(), status_style),
        ]),
        Line::from(format!(
            "{} {} | {} round(s)",
            card.type_info.kind.emoji(),
            card.type_info.label,
            card.type_info.rounds
        )),
        Line::from(format!(
            "Stake: {} {}",
            card.formatted_stake, card.token_symbol
        )),
        Line::from(Span::styled(card.occupancy, occupancy_style)),
        Line::from(""),
        Line::from(Span::styled(
            format!(" {} ", card.action.label()),
            action_style,
        )),
    ];
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(block);
    f.render_widget(widget, area);
}

fn draw_notifications(f: &mut Frame, area: Rect, view: &ArenaView) {
    let mut lines: Vec<Line> = view
        .toasts
        .iter()
        .map(|toast| {
            let color = match toast.kind {
                ToastKind::Loading => Color::Yellow,
                ToastKind::Success => Color::Green,
                ToastKind::Error => Color::Red,
            };
            let text = match toast.icon {
                Some(icon) => format!("{icon} {}", toast.message),
                None => toast.message.clone(),
            };
            Line::from(Span::styled(text, Style::default().fg(color)))
        })
        .collect();
    if !view.status.trim().is_empty() {
        lines.push(Line::from(view.status.to_string()));
    }
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(widget, area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help = Paragraph::new(
        "0-9 game id | Enter search | j join | y copy id | e enter arena | q/Esc quit",
    )
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, area);
}

fn draw_modals(f: &mut Frame, state: &UiState) {
    if state.mode == Mode::QuitModal {
        let area = centered_rect(40, 20, f.area());
        let block = Block::default().borders(Borders::ALL).title("Confirm Quit");
        let p = Paragraph::new("Leave the arena? (Y/N)");
        f.render_widget(Clear, area);
        f.render_widget(block.clone(), area);
        f.render_widget(p, block.inner(area));
    }
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use battle_arena::{
        network::NetworkContext,
        test_helpers::{
            address,
            open_game,
        },
    };
    use crossterm::event::KeyEvent;
    use ethers::types::U256;
    use ratatui::backend::TestBackend;

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn view<'a>(card: &'a GameCard, has_searched: bool) -> ArenaView<'a> {
        ArenaView {
            network: NetworkContext::resolved(31).info(),
            network_mismatch: false,
            contract: address(0xCC),
            account: None,
            has_searched,
            loading: false,
            card,
            toasts: &[],
            status: "",
        }
    }

    fn render(state: &UiState, view: &ArenaView) -> String {
        render_with(|f| frame(f, state, view))
    }

    fn render_with(body: impl FnOnce(&mut Frame)) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(body).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn interpret_event__digits_build_the_search() {
        // given
        let mut state = UiState::default();

        // when
        for c in ['4', 'x', '2'] {
            interpret_event(&mut state, press(KeyCode::Char(c)));
        }
        let event = interpret_event(&mut state, press(KeyCode::Enter));

        // then
        assert_eq!(state.search_input(), "42");
        assert_eq!(event, Some(UserEvent::Search(42)));
    }

    #[test]
    fn interpret_event__empty_search_looks_up_game_zero() {
        let mut state = UiState::default();
        assert_eq!(
            interpret_event(&mut state, press(KeyCode::Enter)),
            Some(UserEvent::Search(0))
        );
    }

    #[test]
    fn interpret_event__quit_requires_confirmation() {
        // given
        let mut state = UiState::with_search_input("7");

        // when
        let first = interpret_event(&mut state, press(KeyCode::Char('q')));
        let cancel = interpret_event(&mut state, press(KeyCode::Char('n')));
        interpret_event(&mut state, press(KeyCode::Esc));
        let confirm = interpret_event(&mut state, press(KeyCode::Char('y')));

        // then
        assert_eq!(first, Some(UserEvent::Redraw));
        assert_eq!(cancel, Some(UserEvent::Redraw));
        assert_eq!(confirm, Some(UserEvent::Quit));
    }

    #[test]
    fn interpret_event__action_keys() {
        let mut state = UiState::default();
        assert_eq!(
            interpret_event(&mut state, press(KeyCode::Char('j'))),
            Some(UserEvent::Join)
        );
        assert_eq!(
            interpret_event(&mut state, press(KeyCode::Char('y'))),
            Some(UserEvent::CopyId)
        );
        assert_eq!(
            interpret_event(&mut state, press(KeyCode::Char('e'))),
            Some(UserEvent::EnterArena)
        );
        assert_eq!(interpret_event(&mut state, press(KeyCode::Char('z'))), None);
    }

    #[test]
    fn interpret_event__ctrl_c_quits_without_confirmation() {
        // given
        let mut state = UiState::default();
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));

        // when
        let event = interpret_event(&mut state, ctrl_c);

        // then
        assert_eq!(event, Some(UserEvent::Quit));
        assert_eq!(state.mode, Mode::Normal);
        assert_eq!(
            interpret_event(&mut state, press(KeyCode::Char('c'))),
            None
        );
    }

    #[test]
    fn render_guarded__panicking_body_renders_fallback() {
        // when
        let screen = render_with(|f| {
            render_guarded(f, |f| {
                f.render_widget(Paragraph::new("half drawn"), f.area());
                panic!("layout exploded");
            })
        });

        // then
        assert!(screen.contains(FALLBACK_MESSAGE));
        assert!(!screen.contains("half drawn"));
    }

    #[test]
    fn render_guarded__healthy_body_is_left_alone() {
        let screen = render_with(|f| {
            render_guarded(f, |f| f.render_widget(Paragraph::new("arena"), f.area()))
        });
        assert!(screen.contains("arena"));
        assert!(!screen.contains(FALLBACK_MESSAGE));
    }

    #[test]
    fn frame__shows_empty_state_before_any_search() {
        let card = GameCard::NotFound;
        let screen = render(&UiState::default(), &view(&card, false));
        assert!(screen.contains(EMPTY_STATE_MESSAGE));
        assert!(screen.contains("RSK Testnet"));
    }

    #[test]
    fn frame__shows_not_found_after_search() {
        let card = GameCard::NotFound;
        let screen = render(&UiState::default(), &view(&card, true));
        assert!(screen.contains("Game not found"));
    }

    #[test]
    fn frame__renders_open_game_card() {
        // given
        let game = open_game(42, address(0xA), U256::exp10(18));
        let card = GameCard::build(Some(&game), None, false, "tRBTC");

        // when
        let screen = render(&UiState::default(), &view(&card, true));

        // then
        assert!(screen.contains("Battle #42"));
        assert!(screen.contains("Stake: 1 tRBTC"));
        assert!(screen.contains("1 WARRIOR"));
        assert!(screen.contains("JOIN BATTLE"));
    }
}
