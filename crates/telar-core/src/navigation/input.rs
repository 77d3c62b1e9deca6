//! Input adapters feeding the step controller.

use tokio::time::Instant;
use tracing::debug;

use super::controller::StepController;
use super::state::{Direction, StepVisual};
use crate::viewer::GlideProfile;

/// What a wheel event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelOutcome {
    /// Scroll locked by an open panel
    Ignored,
    /// Inside the cooldown window; the accumulator was halved
    Damped,
    /// Added to the accumulator, threshold not reached
    Accumulated,
    Stepped(Direction),
    /// Threshold crossed but there is no step that way
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Next,
    Previous,
    First,
    Last,
}

impl StepController {
    /// Feed a wheel delta (positive scrolls forward)
    pub fn on_wheel(&self, delta: f64) -> WheelOutcome {
        let config = &self.inner.nav_config;
        let threshold = config.wheel_threshold(self.inner.viewport_height.get());
        let cooldown = config.step_cooldown();

        let direction = {
            let mut nav = self.inner.nav.borrow_mut();
            if nav.scroll_locked {
                return WheelOutcome::Ignored;
            }

            if nav.in_cooldown(Instant::now(), cooldown) {
                nav.scroll_accumulator /= 2.0;
                return WheelOutcome::Damped;
            }

            let delta = if delta.is_finite() { delta } else { 0.0 };
            let clamped = delta.clamp(-config.max_wheel_delta, config.max_wheel_delta);
            nav.scroll_accumulator += clamped;

            if nav.scroll_accumulator >= threshold {
                Direction::Forward
            } else if nav.scroll_accumulator <= -threshold {
                Direction::Backward
            } else {
                return WheelOutcome::Accumulated;
            }
        };

        self.inner.nav.borrow_mut().scroll_accumulator = 0.0;
        debug!(direction = ?direction, "Wheel threshold crossed");
        let moved = match direction {
            Direction::Forward => self.next_step(),
            Direction::Backward => self.prev_step(),
        };
        if moved {
            WheelOutcome::Stepped(direction)
        } else {
            WheelOutcome::Blocked
        }
    }

    /// Keyboard navigation; returns true when a step change happened
    pub fn on_key(&self, key: NavKey) -> bool {
        let (locked, cooling) = {
            let nav = self.inner.nav.borrow();
            (
                nav.scroll_locked,
                nav.in_cooldown(Instant::now(), self.inner.nav_config.step_cooldown()),
            )
        };
        if locked {
            return false;
        }

        match key {
            NavKey::Next | NavKey::Previous if cooling => {
                debug!(key = ?key, "Step change throttled");
                false
            }
            NavKey::Next => self.next_step(),
            NavKey::Previous => self.prev_step(),
            NavKey::First => self.current_step() != Some(0) && self.go_to_step(0, Direction::Backward),
            NavKey::Last => {
                let last = self.len().saturating_sub(1);
                !self.is_empty()
                    && self.current_step() != Some(last)
                    && self.go_to_step(last, Direction::Forward)
            }
        }
    }

    /// A step scrolled into view (scroll-driven variant). Same-card moves use
    /// the slow scene glide.
    pub fn on_step_enter(&self, index: usize) -> bool {
        let (locked, current) = {
            let nav = self.inner.nav.borrow();
            (nav.scroll_locked, nav.current_step)
        };
        if locked || current == Some(index) {
            return false;
        }

        let direction = match current {
            Some(current) if index < current => Direction::Backward,
            _ => Direction::Forward,
        };
        self.transition(index, direction, GlideProfile::Scene)
    }

    /// A step scrolled out of view
    pub fn on_step_exit(&self, index: usize) {
        if self.inner.nav.borrow().scroll_locked {
            return;
        }
        self.set_text(index, StepVisual::Inactive);
    }

    /// The wheel threshold scales with the viewport
    pub fn set_viewport_height(&self, height: f64) {
        self.inner.viewport_height.set(height);
    }

    pub fn scroll_accumulator(&self) -> f64 {
        self.inner.nav.borrow().scroll_accumulator
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use tokio::task::LocalSet;

    use super::*;
    use crate::config::{AnimationConfig, NavigationConfig, ViewerConfig};
    use crate::events::EventSink;
    use crate::navigation::{NavigationState, SharedNavigation};
    use crate::story::Narrative;
    use crate::testing::{FakeResolver, FakeViewerWidget, SAMPLE_STORY};
    use crate::viewer::{PositionAnimator, ViewerCardPool};

    const COOLDOWN: Duration = Duration::from_millis(800);

    fn controller() -> (StepController, SharedNavigation) {
        let narrative = Narrative::from_json(SAMPLE_STORY).unwrap();
        let nav: SharedNavigation = Rc::new(RefCell::new(NavigationState::new()));
        let viewer_config = ViewerConfig::default();
        let pool = ViewerCardPool::new(
            &viewer_config,
            FakeViewerWidget::new(),
            Rc::new(FakeResolver),
            Rc::new(PositionAnimator::new(AnimationConfig::default())),
            EventSink::new(),
        );
        let controller = StepController::new(
            Rc::clone(&nav),
            pool,
            viewer_config,
            NavigationConfig::default(),
            EventSink::new(),
        );
        controller.initialize(narrative.steps().to_vec());
        (controller, nav)
    }

    #[tokio::test(start_paused = true)]
    async fn test_wheel_exact_threshold_steps_once() {
        LocalSet::new()
            .run_until(async {
                let (controller, _nav) = controller();
                tokio::time::sleep(COOLDOWN).await;

                // Threshold is 0.25 * 800 = 200
                assert_eq!(controller.on_wheel(80.0), WheelOutcome::Accumulated);
                assert_eq!(controller.on_wheel(70.0), WheelOutcome::Accumulated);
                assert_eq!(
                    controller.on_wheel(50.0),
                    WheelOutcome::Stepped(Direction::Forward)
                );
                assert_eq!(controller.current_step(), Some(1));
                assert_eq!(controller.scroll_accumulator(), 0.0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_wheel_during_cooldown_only_decays() {
        LocalSet::new()
            .run_until(async {
                let (controller, nav) = controller();
                tokio::time::sleep(COOLDOWN).await;

                controller.on_wheel(-150.0);
                // Enter cooldown with pent-up momentum
                controller.go_to_step(2, Direction::Forward);
                let mut previous = controller.scroll_accumulator().abs();
                assert!(previous > 0.0);

                for _ in 0..5 {
                    assert_eq!(controller.on_wheel(-100.0), WheelOutcome::Damped);
                    let magnitude = controller.scroll_accumulator().abs();
                    assert!(magnitude < previous);
                    previous = magnitude;
                }
                assert_eq!(nav.borrow().current_step, Some(2));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_finite_wheel_delta_is_ignored() {
        LocalSet::new()
            .run_until(async {
                let (controller, _nav) = controller();
                tokio::time::sleep(COOLDOWN).await;

                assert_eq!(controller.on_wheel(100.0), WheelOutcome::Accumulated);
                for delta in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
                    assert_eq!(controller.on_wheel(delta), WheelOutcome::Accumulated);
                    assert_eq!(controller.scroll_accumulator(), 100.0);
                }

                assert_eq!(
                    controller.on_wheel(100.0),
                    WheelOutcome::Stepped(Direction::Forward)
                );
                assert_eq!(controller.current_step(), Some(1));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_wheel_delta_is_clamped() {
        LocalSet::new()
            .run_until(async {
                let (controller, _nav) = controller();
                tokio::time::sleep(COOLDOWN).await;

                assert_eq!(controller.on_wheel(5000.0), WheelOutcome::Accumulated);
                assert_eq!(controller.scroll_accumulator(), 100.0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_wheel_backward_at_first_step_is_blocked() {
        LocalSet::new()
            .run_until(async {
                let (controller, _nav) = controller();
                tokio::time::sleep(COOLDOWN).await;

                controller.on_wheel(-100.0);
                assert_eq!(controller.on_wheel(-100.0), WheelOutcome::Blocked);
                assert_eq!(controller.current_step(), Some(0));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_locked_input_is_ignored() {
        LocalSet::new()
            .run_until(async {
                let (controller, nav) = controller();
                tokio::time::sleep(COOLDOWN).await;
                nav.borrow_mut().set_panel_open(true);

                assert_eq!(controller.on_wheel(500.0), WheelOutcome::Ignored);
                assert!(!controller.on_key(NavKey::Next));
                assert!(!controller.on_step_enter(3));
                assert_eq!(controller.current_step(), Some(0));
                assert_eq!(controller.scroll_accumulator(), 0.0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_throttled() {
        LocalSet::new()
            .run_until(async {
                let (controller, _nav) = controller();
                tokio::time::sleep(COOLDOWN).await;

                assert!(controller.on_key(NavKey::Next));
                assert!(!controller.on_key(NavKey::Next));
                tokio::time::sleep(COOLDOWN).await;
                assert!(controller.on_key(NavKey::Next));
                assert_eq!(controller.current_step(), Some(2));

                assert!(controller.on_key(NavKey::Last));
                assert_eq!(controller.current_step(), Some(5));
                assert!(controller.on_key(NavKey::First));
                assert_eq!(controller.current_step(), Some(0));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_enter_picks_direction() {
        LocalSet::new()
            .run_until(async {
                let (controller, _nav) = controller();
                assert!(controller.on_step_enter(3));
                assert!(!controller.on_step_enter(3));
                assert!(controller.on_step_enter(1));
                assert_eq!(controller.current_step(), Some(1));
                assert_eq!(controller.step_text(3), Some(StepVisual::Inactive));

                controller.on_step_exit(1);
                assert_eq!(controller.step_text(1), Some(StepVisual::Inactive));
            })
            .await;
    }
}
