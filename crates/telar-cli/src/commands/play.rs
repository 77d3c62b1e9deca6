use std::io::{self, Stdout};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tokio::task::LocalSet;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

use telar_core::story::Narrative;
use telar_core::{AppConfig, SessionEvent};
use telar_tui::{
    app::{App, Mode},
    event::{AppEvent, EventHandler},
    input::{handle_key_event, handle_mouse_event},
    widgets::{NarrativeWidget, PanelWidget, PopupWidget, StageWidget, StatusBarWidget},
    Theme,
};

type Backend = CrosstermBackend<Stdout>;

pub async fn run(config: AppConfig, story: &Path) -> Result<()> {
    let narrative = Narrative::load(story)
        .with_context(|| format!("Failed to load story {}", story.display()))?;
    for issue in narrative.issues() {
        warn!("{}", issue);
    }
    // Refuse to take over the terminal for a story that cannot start
    narrative.validate()?;

    info!(story = %story.display(), "Playing story");
    LocalSet::new()
        .run_until(run_app(config, Rc::new(narrative)))
        .await
}

async fn run_app(config: AppConfig, narrative: Rc<Narrative>) -> Result<()> {
    let (session_tx, mut session_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let mut app = App::new(&config, narrative, session_tx, Theme::default())?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    let title = format!("Telar - {}", app.title());
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, SetTitle(title))?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app, &config, &mut session_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    app.session.teardown();
    result
}

async fn event_loop(
    terminal: &mut Terminal<Backend>,
    app: &mut App,
    config: &AppConfig,
    session_rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
) -> Result<()> {
    let size = terminal.size()?;
    app.resize(size.width, size.height);
    app.start();

    let mut input = EventHandler::new(config.ui.tick_rate_ms).spawn();
    let frame_interval = Duration::from_millis(1000 / u64::from(config.ui.animation_fps.max(1)));
    let mut frames = tokio::time::interval(frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        terminal.draw(|frame| render(frame, app))?;

        tokio::select! {
            Some(event) = input.recv() => match event {
                AppEvent::Key(key) => {
                    let action = handle_key_event(key, app);
                    app.handle_action(action);
                }
                AppEvent::Mouse(mouse) => {
                    let action = handle_mouse_event(mouse, app.wheel_line_delta);
                    app.handle_action(action);
                }
                AppEvent::Resize(width, height) => app.resize(width, height),
                AppEvent::Tick => {}
            },
            Some(event) = session_rx.recv() => app.apply_session_event(event),
            _ = frames.tick() => {
                app.tick(Instant::now());
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn render(frame: &mut Frame, app: &App) {
    let size = frame.area();

    // Main layout: content + status bar
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(size);

    // Narrative column and viewer stage with 2:3 ratio
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(2, 5), Constraint::Ratio(3, 5)])
        .split(main_layout[0]);

    NarrativeWidget::render(frame, columns[0], app);
    StageWidget::render(frame, columns[1], app);
    PanelWidget::render(frame, columns[1], app);
    StatusBarWidget::render(frame, main_layout[1], app);

    if app.mode == Mode::Help {
        PopupWidget::render_help(frame, &app.theme);
    }
}
