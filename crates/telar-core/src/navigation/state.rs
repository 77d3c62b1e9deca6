use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Visual state of a step's narrative text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepVisual {
    #[default]
    Inactive,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    Idle,
    Transitioning(Direction),
}

/// Session-wide navigation state
#[derive(Debug, Clone, Default)]
pub struct NavigationState {
    /// `None` until the first navigation
    pub current_step: Option<usize>,
    /// Object of the front-most card; a pool key, never an owner
    pub active_object: Option<String>,
    pub scroll_accumulator: f64,
    pub last_transition: Option<Instant>,
    pub panel_open: bool,
    pub scroll_locked: bool,
}

impl NavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Panel state and the scroll lock always move together
    pub fn set_panel_open(&mut self, open: bool) {
        self.panel_open = open;
        self.scroll_locked = open;
    }

    pub fn in_cooldown(&self, now: Instant, window: Duration) -> bool {
        self.last_transition
            .is_some_and(|at| now.saturating_duration_since(at) < window)
    }

    pub fn record_transition(&mut self, index: usize) {
        self.current_step = Some(index);
        self.last_transition = Some(Instant::now());
    }
}

pub type SharedNavigation = Rc<RefCell<NavigationState>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_mirrors_panel() {
        let mut state = NavigationState::new();
        assert_eq!(state.current_step, None);
        state.set_panel_open(true);
        assert!(state.scroll_locked);
        state.set_panel_open(false);
        assert!(!state.scroll_locked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_window() {
        let mut state = NavigationState::new();
        let window = Duration::from_millis(800);
        assert!(!state.in_cooldown(Instant::now(), window));

        state.record_transition(1);
        assert!(state.in_cooldown(Instant::now(), window));

        tokio::time::advance(Duration::from_millis(800)).await;
        assert!(!state.in_cooldown(Instant::now(), window));
    }
}
