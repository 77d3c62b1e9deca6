use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::state::{Direction, SharedNavigation, StepVisual, TransitionPhase};
use crate::config::{NavigationConfig, ViewerConfig};
use crate::events::{EventSink, SessionEvent};
use crate::story::{CameraTarget, Step};
use crate::viewer::{GlideProfile, MoveMode, ViewerCardPool};

#[derive(Debug, Clone, Copy, Default)]
pub(super) struct StepTextState {
    pub(super) visual: StepVisual,
    /// Times the enter transition was (re)started
    pub(super) enter_count: u32,
}

pub(super) struct ControllerInner {
    pub(super) steps: RefCell<Vec<Step>>,
    pub(super) texts: RefCell<Vec<StepTextState>>,
    pub(super) in_flight: Cell<usize>,
    pub(super) last_direction: Cell<Direction>,
    pub(super) viewport_height: Cell<f64>,
    pub(super) nav: SharedNavigation,
    pub(super) pool: ViewerCardPool,
    pub(super) viewer_config: ViewerConfig,
    pub(super) nav_config: NavigationConfig,
    pub(super) events: EventSink,
}

/// Step navigation state machine.
///
/// `go_to_step` updates the step index synchronously and lets visual work
/// (waiting for a card to become ready) finish later on the local task set.
/// Overlapping transitions are not preempted: whichever wait completes last
/// decides what is in front.
#[derive(Clone)]
pub struct StepController {
    pub(super) inner: Rc<ControllerInner>,
}

impl StepController {
    pub fn new(
        nav: SharedNavigation,
        pool: ViewerCardPool,
        viewer_config: ViewerConfig,
        nav_config: NavigationConfig,
        events: EventSink,
    ) -> Self {
        let viewport_height = nav_config.viewport_height;
        Self {
            inner: Rc::new(ControllerInner {
                steps: RefCell::new(Vec::new()),
                texts: RefCell::new(Vec::new()),
                in_flight: Cell::new(0),
                last_direction: Cell::new(Direction::Forward),
                viewport_height: Cell::new(viewport_height),
                nav,
                pool,
                viewer_config,
                nav_config,
                events,
            }),
        }
    }

    /// Record the steps and show the first one
    pub fn initialize(&self, steps: Vec<Step>) {
        let count = steps.len();
        *self.inner.texts.borrow_mut() = vec![StepTextState::default(); count];
        *self.inner.steps.borrow_mut() = steps;
        info!(steps = count, "Step controller initialized");

        if count > 0 {
            self.go_to_step(0, Direction::Forward);
        }
    }

    /// Transition to `target`. Returns false when the index is out of range.
    pub fn go_to_step(&self, target: usize, direction: Direction) -> bool {
        self.transition(target, direction, GlideProfile::Step)
    }

    /// `glide` is the profile used when the target stays on the same card
    pub(super) fn transition(&self, target: usize, direction: Direction, glide: GlideProfile) -> bool {
        let step = match self.inner.steps.borrow().get(target) {
            Some(step) => step.clone(),
            None => {
                warn!(
                    step = target,
                    total = self.len(),
                    "Step index out of range, ignoring"
                );
                return false;
            }
        };

        let (previous_step, previous_object) = {
            let mut nav = self.inner.nav.borrow_mut();
            let previous = (nav.current_step, nav.active_object.clone());
            nav.record_transition(target);
            previous
        };
        self.inner.last_direction.set(direction);

        if direction == Direction::Backward {
            if let Some(departing) = previous_step.filter(|&p| p != target) {
                self.set_text(departing, StepVisual::Inactive);
            }
        }

        let leaving_intro = previous_step == Some(0) && target > 0;
        match step.object_id.as_deref() {
            None if target == 0 => self.show_intro(previous_object),
            Some(object_id) if leaving_intro || previous_object.as_deref() != Some(object_id) => {
                self.switch_card(&step, object_id, direction, previous_object)
            }
            _ => self.reposition(&step, direction, glide),
        }

        self.preload_around(target);
        self.inner.events.emit(SessionEvent::StepChanged {
            index: target,
            total: self.len(),
        });
        true
    }

    pub fn next_step(&self) -> bool {
        let next = self.current_step().map_or(0, |i| i + 1);
        self.go_to_step(next, Direction::Forward)
    }

    pub fn prev_step(&self) -> bool {
        match self.current_step() {
            Some(current) if current > 0 => self.go_to_step(current - 1, Direction::Backward),
            _ => {
                debug!("Already at the first step");
                false
            }
        }
    }

    pub fn current_step(&self) -> Option<usize> {
        self.inner.nav.borrow().current_step
    }

    pub fn active_object(&self) -> Option<String> {
        self.inner.nav.borrow().active_object.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.steps.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.steps.borrow().is_empty()
    }

    pub fn step(&self, index: usize) -> Option<Step> {
        self.inner.steps.borrow().get(index).cloned()
    }

    pub fn phase(&self) -> TransitionPhase {
        if self.inner.in_flight.get() > 0 {
            TransitionPhase::Transitioning(self.inner.last_direction.get())
        } else {
            TransitionPhase::Idle
        }
    }

    pub fn step_text(&self, index: usize) -> Option<StepVisual> {
        self.inner.texts.borrow().get(index).map(|t| t.visual)
    }

    /// How many times the enter animation of a step's text was started
    pub fn text_enter_count(&self, index: usize) -> u32 {
        self.inner
            .texts
            .borrow()
            .get(index)
            .map_or(0, |t| t.enter_count)
    }

    pub fn step_texts(&self) -> Vec<StepVisual> {
        self.inner.texts.borrow().iter().map(|t| t.visual).collect()
    }

    pub fn pool(&self) -> &ViewerCardPool {
        &self.inner.pool
    }

    /// Paint order of a step's card
    pub fn z_order(index: usize) -> usize {
        index + 1
    }

    fn show_intro(&self, previous_object: Option<String>) {
        self.inner.nav.borrow_mut().active_object = None;
        let hidden = self.inner.pool.hide_above(0, None);
        if !hidden.is_empty() {
            debug!(cards = ?hidden, "Hid cards for intro");
        }
        if previous_object.is_some() {
            self.inner
                .events
                .emit(SessionEvent::ActiveObjectChanged { object_id: None });
        }
        self.set_text(0, StepVisual::Active);
        debug!("Intro step shown");
    }

    fn switch_card(
        &self,
        step: &Step,
        object_id: &str,
        direction: Direction,
        previous_object: Option<String>,
    ) {
        info!(
            step = step.index,
            object = %object_id,
            direction = ?direction,
            "Switching viewer card"
        );
        self.inner.pool.get_or_create(
            object_id,
            Self::z_order(step.index),
            step.target.as_ref(),
            previous_object.as_deref(),
        );
        self.inner.nav.borrow_mut().active_object = Some(object_id.to_string());
        self.inner.events.emit(SessionEvent::ActiveObjectChanged {
            object_id: Some(object_id.to_string()),
        });

        let signal = self.inner.pool.ready_signal(object_id);
        match signal {
            Some(rx) if !*rx.borrow() => {
                let this = self.clone();
                let index = step.index;
                let object_id = object_id.to_string();
                let ceiling = self.inner.viewer_config.ready_timeout();
                self.inner.in_flight.set(self.inner.in_flight.get() + 1);

                tokio::task::spawn_local(async move {
                    if !wait_until_ready(rx, ceiling).await {
                        warn!(object = %object_id, "Viewer card not ready in time, showing it anyway");
                    }
                    this.finish_switch(index, &object_id, direction, previous_object.as_deref());
                    let in_flight = this.inner.in_flight.get();
                    this.inner.in_flight.set(in_flight.saturating_sub(1));
                });
            }
            _ => self.finish_switch(step.index, object_id, direction, previous_object.as_deref()),
        }
    }

    fn finish_switch(
        &self,
        index: usize,
        object_id: &str,
        direction: Direction,
        previous_object: Option<&str>,
    ) {
        match direction {
            Direction::Forward => {
                self.enter_text(index);
                self.inner.pool.bring_to_front(object_id);
            }
            Direction::Backward => {
                if let Some(previous) = previous_object.filter(|p| *p != object_id) {
                    self.inner.pool.hide_instantly(previous);
                }
                // Cards from steps further along would otherwise stay on top
                if let Some(z_order) = self.inner.pool.card(object_id).map(|c| c.z_order) {
                    self.inner.pool.hide_above(z_order, Some(object_id));
                }
                self.inner.pool.bring_to_front(object_id);
                self.set_text(index, StepVisual::Active);
            }
        }
        debug!(step = index, object = %object_id, "Card switch finished");
    }

    fn reposition(&self, step: &Step, direction: Direction, glide: GlideProfile) {
        if direction == Direction::Forward {
            self.enter_text(step.index);
        }

        let Some(target) = step.target else {
            debug!(step = step.index, "Step has no camera target");
            return;
        };
        let active = self.inner.nav.borrow().active_object.clone();
        match active {
            Some(object_id) => {
                let outcome = self.inner.pool.move_card(
                    &object_id,
                    &target,
                    MoveMode::Animate(glide),
                );
                debug!(
                    step = step.index,
                    object = %object_id,
                    glide = ?glide,
                    outcome = ?outcome,
                    "Repositioning card"
                );
            }
            None => debug!(step = step.index, "No active card to reposition"),
        }
    }

    fn preload_around(&self, index: usize) {
        let keep = self.inner.nav.borrow().active_object.clone();
        let ahead = self.inner.viewer_config.preload_ahead;
        let behind = self.inner.viewer_config.preload_behind;

        let candidates: Vec<(String, usize, Option<CameraTarget>)> = {
            let steps = self.inner.steps.borrow();
            let forward = (index + 1..=index + ahead).filter_map(|i| steps.get(i));
            let backward = (index.saturating_sub(behind)..index)
                .rev()
                .filter_map(|i| steps.get(i));
            forward
                .chain(backward)
                .filter_map(|s| {
                    s.object_id
                        .clone()
                        .map(|object_id| (object_id, Self::z_order(s.index), s.target))
                })
                .collect()
        };

        for (object_id, z_order, target) in candidates {
            if keep.as_deref() == Some(object_id.as_str()) {
                continue;
            }
            self.inner
                .pool
                .preload(&object_id, z_order, target.as_ref(), keep.as_deref());
        }
    }

    /// Restart the text enter animation
    fn enter_text(&self, index: usize) {
        if let Some(text) = self.inner.texts.borrow_mut().get_mut(index) {
            text.visual = StepVisual::Active;
            text.enter_count += 1;
        }
    }

    pub(super) fn set_text(&self, index: usize, visual: StepVisual) {
        if let Some(text) = self.inner.texts.borrow_mut().get_mut(index) {
            text.visual = visual;
        }
    }
}

/// Wait for a card's ready signal, giving up after `ceiling`
async fn wait_until_ready(mut rx: watch::Receiver<bool>, ceiling: Duration) -> bool {
    tokio::time::timeout(ceiling, async move { rx.wait_for(|ready| *ready).await.is_ok() })
        .await
        .unwrap_or(false)
}
