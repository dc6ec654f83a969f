use std::env;
use std::io::{self, Stdout};
use std::process::Command;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::cursor::SetCursorStyle;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{error, info, trace};

use crate::backend;
use crate::backend::gateway::BackendGateway;
use crate::config::AccountConfig;
use crate::event::AppEvent;
use crate::input;
use crate::intent::Mode;
use crate::intent_handler::{Flow, IntentHandler};
use crate::state::AppState;
use crate::ui::Renderer;

const EVENT_BUS_CAPACITY: usize = 1024;
const REDRAW_TICK: Duration = Duration::from_secs(1);

type Term = Terminal<CrosstermBackend<Stdout>>;

pub struct App {
    state: AppState,
    renderer: Renderer,
    handler: IntentHandler,
    gateway: BackendGateway,
    event_tx: flume::Sender<AppEvent>,
    event_rx: flume::Receiver<AppEvent>,
}

impl App {
    pub fn new(config: AccountConfig) -> Result<Self> {
        let (event_tx, event_rx) = flume::bounded(EVENT_BUS_CAPACITY);
        let adapter = backend::connect(&config.protocol, &config.auth, event_tx.clone())
            .context("construct backend adapter")?;
        let gateway = BackendGateway::start(adapter, event_tx.clone());

        let mut state = AppState::new();
        state.lobby_line(format!("mm, protocol {}", config.protocol));

        Ok(Self {
            state,
            renderer: Renderer::new(),
            handler: IntentHandler::new(),
            gateway,
            event_tx,
            event_rx,
        })
    }

    /// The single-threaded cooperative core: draw, wait for the next event,
    /// apply it to completion, repeat. Keys queue on the bus while the loop
    /// is busy, so nothing is lost across suspensions.
    pub fn run(mut self) -> Result<()> {
        input::start_input_pump(self.event_tx.clone());
        Self::start_redraw_tick(self.event_tx.clone());

        let mut terminal = enter_terminal().context("enter terminal session")?;
        if let Ok(size) = terminal.size() {
            self.state.viewport = (size.width, size.height);
        }

        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal);
        result
    }

    fn event_loop(&mut self, terminal: &mut Term) -> Result<()> {
        loop {
            terminal
                .draw(|frame| self.renderer.render(frame, &mut self.state))
                .context("draw frame")?;
            execute!(terminal.backend_mut(), cursor_style(self.state.mode))
                .context("sync cursor style")?;
            trace!("redraw");

            let event = self
                .event_rx
                .recv()
                .context("event bus disconnected while waiting for next event")?;
            match self.handler.apply(&mut self.state, &self.gateway, event) {
                Flow::Continue => {}
                Flow::Quit => return Ok(()),
                Flow::Suspend => {
                    restore_terminal(terminal);
                    Self::run_shell();
                    *terminal = enter_terminal().context("re-enter terminal session")?;
                    terminal.clear().context("redraw after suspend")?;
                }
            }
        }
    }

    fn start_redraw_tick(event_tx: flume::Sender<AppEvent>) {
        thread::spawn(move || {
            loop {
                thread::sleep(REDRAW_TICK);
                if event_tx.send(AppEvent::Tick).is_err() {
                    break;
                }
            }
        });
    }

    /// Out-of-band suspension target: the terminal is already restored when
    /// this runs.
    fn run_shell() {
        let shell = env::var("SHELL").unwrap_or_else(|_| "sh".to_string());
        info!("suspending to shell: {}", shell);
        match Command::new(&shell).status() {
            Ok(status) => info!("shell exited: {}", status),
            Err(err) => error!("failed to spawn {}: {}", shell, err),
        }
    }
}

fn enter_terminal() -> Result<Term> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, SetTitle("mm")).context("enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("create terminal backend")
}

fn restore_terminal(terminal: &mut Term) {
    let _ = disable_raw_mode();
    let _ = execute!(
        terminal.backend_mut(),
        SetCursorStyle::DefaultUserShape,
        LeaveAlternateScreen
    );
}

fn cursor_style(mode: Mode) -> SetCursorStyle {
    match mode {
        Mode::Insert => SetCursorStyle::SteadyBar,
        Mode::Replace => SetCursorStyle::SteadyUnderScore,
        Mode::Normal | Mode::Visual => SetCursorStyle::SteadyBlock,
    }
}
