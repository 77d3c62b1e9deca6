//! Session-scoped context wiring the engine components together.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::events::{EventSink, SessionEvent};
use crate::navigation::{NavKey, NavigationState, SharedNavigation, StepController, WheelOutcome};
use crate::panel::{LayerKind, OverlayWidget, PanelContent, PanelStack, ScrollLock};
use crate::story::{ManifestResolver, Narrative, ObjectResolver};
use crate::viewer::{PositionAnimator, ViewerCardPool, ViewerWidget};
use crate::Result;

/// One mounted story. Created on mount, torn down when the reader leaves.
///
/// Everything runs on a single thread; `start` and most input handlers
/// spawn local tasks and must be called inside a `tokio::task::LocalSet`.
pub struct Session {
    narrative: Rc<Narrative>,
    nav: SharedNavigation,
    pool: ViewerCardPool,
    controller: StepController,
    panels: PanelStack,
    scroll_lock: ScrollLock,
    events: EventSink,
    started: bool,
}

impl Session {
    /// Mount with the manifest resolver derived from `site.page_url`
    pub fn mount(
        config: &AppConfig,
        narrative: Rc<Narrative>,
        viewer: Rc<dyn ViewerWidget>,
        overlay: Rc<dyn OverlayWidget>,
    ) -> Result<Self> {
        let resolver = ManifestResolver::new(&config.site.page_url, Rc::clone(&narrative))?;
        Ok(Self::with_resolver(
            config,
            narrative,
            viewer,
            overlay,
            Rc::new(resolver),
        ))
    }

    pub fn with_resolver(
        config: &AppConfig,
        narrative: Rc<Narrative>,
        viewer: Rc<dyn ViewerWidget>,
        overlay: Rc<dyn OverlayWidget>,
        resolver: Rc<dyn ObjectResolver>,
    ) -> Self {
        let events = EventSink::new();
        let nav: SharedNavigation = Rc::new(RefCell::new(NavigationState::new()));
        let animator = Rc::new(PositionAnimator::new(config.animation.clone()));
        let pool = ViewerCardPool::new(
            &config.viewer,
            viewer,
            Rc::clone(&resolver),
            animator,
            events.clone(),
        );
        let controller = StepController::new(
            Rc::clone(&nav),
            pool.clone(),
            config.viewer.clone(),
            config.navigation.clone(),
            events.clone(),
        );
        let panels = PanelStack::new(
            overlay,
            Rc::clone(&narrative),
            resolver,
            Rc::clone(&nav),
            events.clone(),
            Duration::from_millis(config.panels.hide_settle_ms),
        );
        let scroll_lock = ScrollLock::new(
            Rc::clone(&nav),
            panels.clone(),
            Duration::from_millis(config.panels.scroll_close_idle_ms),
        );

        Self {
            narrative,
            nav,
            pool,
            controller,
            panels,
            scroll_lock,
            events,
            started: false,
        }
    }

    /// Set the event sender for UI notifications
    pub fn with_event_sender(self, tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        self.events.connect(tx);
        self
    }

    /// Show the first step. A story without steps or a first object is
    /// logged and leaves the session inert.
    pub fn start(&mut self) -> bool {
        if self.started {
            return true;
        }
        if let Err(e) = self.narrative.validate() {
            error!("Story not started: {}", e);
            return false;
        }

        info!(
            title = self.narrative.title().unwrap_or("untitled"),
            steps = self.narrative.len(),
            "Starting story"
        );
        self.controller.initialize(self.narrative.steps().to_vec());
        self.started = true;
        true
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn narrative(&self) -> &Rc<Narrative> {
        &self.narrative
    }

    pub fn controller(&self) -> &StepController {
        &self.controller
    }

    pub fn pool(&self) -> &ViewerCardPool {
        &self.pool
    }

    pub fn panels(&self) -> &PanelStack {
        &self.panels
    }

    /// Snapshot of the navigation state
    pub fn navigation(&self) -> NavigationState {
        self.nav.borrow().clone()
    }

    pub fn current_step(&self) -> Option<usize> {
        self.nav.borrow().current_step
    }

    pub fn active_object(&self) -> Option<String> {
        self.nav.borrow().active_object.clone()
    }

    pub fn is_panel_open(&self) -> bool {
        self.nav.borrow().panel_open
    }

    pub fn open_panel(&self, kind: LayerKind, content_id: &str) -> PanelContent {
        self.panels.open(kind, content_id)
    }

    /// Open layer 1 for the current step
    pub fn open_current_panel(&self) -> Option<PanelContent> {
        let step = self.current_step().and_then(|i| self.narrative.step(i))?;
        Some(self.panels.open(LayerKind::Primary, &step.content_id))
    }

    /// Open layer 2 for the step shown in layer 1
    pub fn go_deeper(&self) -> Option<PanelContent> {
        let top = self.panels.top()?;
        if top.kind != LayerKind::Primary {
            return None;
        }
        Some(self.panels.open(LayerKind::Secondary, &top.content_id))
    }

    /// Open a glossary term over whatever layers are showing
    pub fn open_glossary(&self, term_id: &str) -> PanelContent {
        self.panels.open(LayerKind::Glossary, term_id)
    }

    pub fn close_panel(&self, kind: LayerKind) {
        self.panels.close(kind);
    }

    pub fn panel_back(&self) -> Option<LayerKind> {
        self.panels.back()
    }

    pub fn close_all_panels(&self) {
        self.panels.close_all();
    }

    /// Wheel input. While a panel is open it counts as continued scrolling.
    pub fn on_wheel(&self, delta: f64) -> WheelOutcome {
        if self.scroll_lock.is_engaged() {
            self.scroll_lock.on_narrative_scroll();
            return WheelOutcome::Ignored;
        }
        self.controller.on_wheel(delta)
    }

    pub fn on_key(&self, key: NavKey) -> bool {
        if self.scroll_lock.is_engaged() {
            self.scroll_lock.on_narrative_scroll();
            return false;
        }
        self.controller.on_key(key)
    }

    pub fn on_narrative_scroll(&self) -> bool {
        self.scroll_lock.on_narrative_scroll()
    }

    pub fn on_step_enter(&self, index: usize) -> bool {
        self.controller.on_step_enter(index)
    }

    pub fn on_step_exit(&self, index: usize) {
        self.controller.on_step_exit(index);
    }

    pub fn set_viewport_height(&self, height: f64) {
        self.controller.set_viewport_height(height);
    }

    /// Release every card and timer
    pub fn teardown(&mut self) {
        self.scroll_lock.cancel();
        self.panels.cancel();
        self.pool.destroy_all();
        self.events.disconnect();
        self.started = false;
        info!("Session torn down");
    }
}

#[cfg(test)]
mod tests {
    use tokio::task::LocalSet;

    use super::*;
    use crate::navigation::Direction;
    use crate::testing::{settle, FakeOverlay, FakeViewerWidget, SAMPLE_PAGE_URL, SAMPLE_STORY};
    use crate::viewer::CardVisual;

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.site.page_url = SAMPLE_PAGE_URL.to_string();
        config
    }

    fn session(
        json: &str,
    ) -> (
        Session,
        Rc<FakeViewerWidget>,
        mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        let narrative = Rc::new(Narrative::from_json(json).unwrap());
        let widget = FakeViewerWidget::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Session::mount(&config(), narrative, widget.clone(), FakeOverlay::new())
            .unwrap()
            .with_event_sender(tx);
        (session, widget, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_configuration_stays_inert() {
        LocalSet::new()
            .run_until(async {
                let (mut inert, widget, _rx) = session(r#"{"steps": [{"step": 0}]}"#);
                assert!(!inert.start());
                assert_eq!(inert.current_step(), None);
                assert_eq!(widget.total_mounts(), 0);

                let (mut empty, _widget, _rx) = session(r#"{"steps": []}"#);
                assert!(!empty.start());
                assert!(!empty.is_started());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_events() {
        LocalSet::new()
            .run_until(async {
                let (mut session, widget, mut rx) = session(SAMPLE_STORY);
                assert!(session.start());
                assert_eq!(
                    drain(&mut rx),
                    vec![SessionEvent::StepChanged { index: 0, total: 6 }]
                );

                // Local manifests are derived from the page's base path
                assert!(widget.fire_ready("obj-a"));
                settle().await;
                assert_eq!(
                    drain(&mut rx),
                    vec![SessionEvent::CardReady { object_id: "obj-a".into() }]
                );

                session.controller().go_to_step(1, Direction::Forward);
                assert_eq!(
                    drain(&mut rx),
                    vec![
                        SessionEvent::ActiveObjectChanged { object_id: Some("obj-a".into()) },
                        SessionEvent::StepChanged { index: 1, total: 6 },
                    ]
                );
                assert_eq!(
                    session.pool().card("obj-a").map(|c| c.visual),
                    Some(CardVisual::Active)
                );
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_wheel_with_open_panel_closes_panels() {
        LocalSet::new()
            .run_until(async {
                let (mut session, _widget, _rx) = session(SAMPLE_STORY);
                session.start();
                tokio::time::sleep(Duration::from_secs(1)).await;

                session.open_current_panel();
                assert!(session.is_panel_open());

                assert_eq!(session.on_wheel(500.0), WheelOutcome::Ignored);
                assert!(!session.on_key(NavKey::Next));
                assert_eq!(session.current_step(), Some(0));

                tokio::time::sleep(Duration::from_millis(350)).await;
                assert!(!session.is_panel_open());
                assert!(session.on_key(NavKey::Next));
                assert_eq!(session.current_step(), Some(1));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_go_deeper_from_primary() {
        LocalSet::new()
            .run_until(async {
                let (mut session, _widget, _rx) = session(SAMPLE_STORY);
                session.start();
                assert!(session.go_deeper().is_none());

                session.controller().go_to_step(1, Direction::Forward);
                let primary = session.open_current_panel().unwrap();
                assert_eq!(primary.title, "About A");

                let deeper = session.go_deeper().unwrap();
                assert_eq!(deeper.title, "More on A");
                assert_eq!(session.panels().entries().len(), 2);

                assert_eq!(session.panel_back(), Some(LayerKind::Secondary));
                assert!(session.is_panel_open());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_glossary_over_secondary_pops_back() {
        LocalSet::new()
            .run_until(async {
                let (mut session, _widget, _rx) = session(SAMPLE_STORY);
                session.start();
                session.controller().go_to_step(1, Direction::Forward);

                session.open_current_panel().unwrap();
                let deeper = session.go_deeper().unwrap();
                let link = deeper.glossary_links.first().cloned().unwrap();
                assert_eq!(link.term_id, "warp");

                let term = session.open_glossary(&link.term_id);
                assert_eq!(term.title, "Warp");
                let kinds: Vec<LayerKind> = session.panels().entries().iter().map(|e| e.kind).collect();
                assert_eq!(
                    kinds,
                    vec![LayerKind::Primary, LayerKind::Secondary, LayerKind::Glossary]
                );

                assert_eq!(session.panel_back(), Some(LayerKind::Glossary));
                assert_eq!(session.panels().top().map(|e| e.kind), Some(LayerKind::Secondary));
                settle().await;
                assert!(session.is_panel_open());

                assert_eq!(session.panel_back(), Some(LayerKind::Secondary));
                assert_eq!(session.panels().top().map(|e| e.kind), Some(LayerKind::Primary));
                tokio::time::sleep(Duration::from_millis(500)).await;
                assert!(session.is_panel_open());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_destroys_cards() {
        LocalSet::new()
            .run_until(async {
                let (mut session, widget, _rx) = session(SAMPLE_STORY);
                session.start();
                assert_eq!(session.pool().len(), 2);

                session.teardown();
                assert!(session.pool().is_empty());
                assert!(widget.handle_for("obj-a").unwrap().is_destroyed());
                assert!(widget.handle_for("obj-b").unwrap().is_destroyed());
            })
            .await;
    }
}
