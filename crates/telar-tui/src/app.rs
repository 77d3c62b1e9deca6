use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use telar_core::navigation::{NavKey, WheelOutcome};
use telar_core::story::Narrative;
use telar_core::viewer::{CardSnapshot, CardVisual};
use telar_core::{AppConfig, SessionEvent, Session};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

use crate::input::Action;
use crate::overlay::TerminalOverlay;
use crate::theme::Theme;
use crate::viewer::{TerminalViewer, TerminalViewerWidget};

/// Nominal pixel height of one terminal row, used to size the wheel threshold
const ROW_HEIGHT_PX: f64 = 20.0;

/// Lines moved by one panel scroll action
const PANEL_SCROLL_STEP: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Help,
}

/// Terminal application state. Rendering is a projection of the session.
pub struct App {
    pub session: Session,
    pub viewer: TerminalViewerWidget,
    pub overlay: Rc<TerminalOverlay>,
    pub theme: Theme,
    pub mode: Mode,
    pub status_message: Option<String>,
    pub should_quit: bool,
    /// Scroll offset of the top panel's text
    pub panel_scroll: u16,
    pub wheel_line_delta: f64,
}

impl App {
    pub fn new(
        config: &AppConfig,
        narrative: Rc<Narrative>,
        events: mpsc::UnboundedSender<SessionEvent>,
        theme: Theme,
    ) -> Result<Self> {
        let viewer = TerminalViewerWidget::new(
            Duration::from_millis(config.ui.viewer_ready_delay_ms),
            config.ui.camera_easing,
        );
        let overlay = Rc::new(TerminalOverlay::new());
        let session = Session::mount(
            config,
            narrative,
            Rc::new(viewer.clone()),
            overlay.clone(),
        )?
        .with_event_sender(events);

        Ok(Self {
            session,
            viewer,
            overlay,
            theme,
            mode: Mode::Normal,
            status_message: None,
            should_quit: false,
            panel_scroll: 0,
            wheel_line_delta: config.ui.wheel_line_delta,
        })
    }

    /// Show the first step. Must run inside a `LocalSet`.
    pub fn start(&mut self) -> bool {
        let started = self.session.start();
        if !started {
            self.status_message = Some("Story has no steps or first object".to_string());
        }
        started
    }

    pub fn title(&self) -> &str {
        self.session.narrative().title().unwrap_or("Telar")
    }

    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::NextStep => self.navigate(NavKey::Next),
            Action::PrevStep => self.navigate(NavKey::Previous),
            Action::FirstStep => self.navigate(NavKey::First),
            Action::LastStep => self.navigate(NavKey::Last),
            Action::Wheel(delta) => {
                if self.session.on_wheel(delta) == WheelOutcome::Blocked {
                    self.status_message = Some("No more steps that way".to_string());
                }
            }
            Action::OpenPanel => {
                if self.session.open_current_panel().is_some() {
                    self.panel_scroll = 0;
                }
            }
            Action::GoDeeper => match self.session.go_deeper() {
                Some(_) => self.panel_scroll = 0,
                None => self.status_message = Some("Open a step's panel first".to_string()),
            },
            Action::OpenGlossary(n) => {
                let link = self
                    .overlay
                    .top()
                    .and_then(|(_, content)| content.glossary_links.get(n).cloned());
                match link {
                    Some(link) => {
                        self.session.open_glossary(&link.term_id);
                        self.panel_scroll = 0;
                    }
                    None => self.status_message = Some(format!("No glossary term {}", n + 1)),
                }
            }
            Action::PanelBack => {
                if self.session.panel_back().is_some() {
                    self.panel_scroll = 0;
                }
            }
            Action::CloseAllPanels => self.session.close_all_panels(),
            Action::ScrollPanelDown => {
                self.panel_scroll = self.panel_scroll.saturating_add(PANEL_SCROLL_STEP);
            }
            Action::ScrollPanelUp => {
                self.panel_scroll = self.panel_scroll.saturating_sub(PANEL_SCROLL_STEP);
            }
            Action::ToggleHelp => self.mode = Mode::Help,
            Action::ExitMode => self.mode = Mode::Normal,
            Action::None => {}
        }
    }

    fn navigate(&mut self, key: NavKey) {
        if self.session.on_key(key) {
            self.status_message = None;
        }
    }

    pub fn apply_session_event(&mut self, event: SessionEvent) {
        debug!(event = ?event, "Session event");
        match event {
            SessionEvent::StepChanged { .. } => {}
            SessionEvent::ActiveObjectChanged { object_id } => {
                self.status_message = object_id
                    .map(|id| format!("Now showing {}", self.session.narrative().object_title(&id)));
            }
            SessionEvent::PanelStateChanged { open } => {
                if !open {
                    self.panel_scroll = 0;
                }
            }
            SessionEvent::CardReady { .. } | SessionEvent::CardEvicted { .. } => {}
        }
    }

    pub fn resize(&mut self, _width: u16, height: u16) {
        self.session
            .set_viewport_height(f64::from(height) * ROW_HEIGHT_PX);
    }

    /// Advance viewer cameras. Returns true while any glide is running.
    pub fn tick(&self, now: Instant) -> bool {
        self.viewer.tick(now)
    }

    /// Front-most visible card
    pub fn front_card(&self) -> Option<CardSnapshot> {
        self.session
            .pool()
            .cards()
            .into_iter()
            .filter(|card| card.visual == CardVisual::Active)
            .max_by_key(|card| card.z_order)
    }

    pub fn front_viewer(&self) -> Option<Rc<TerminalViewer>> {
        self.front_card()
            .and_then(|card| self.viewer.viewer(&card.container_id))
    }
}
