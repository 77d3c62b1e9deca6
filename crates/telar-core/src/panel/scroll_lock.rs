use std::cell::RefCell;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use super::stack::PanelStack;
use crate::navigation::SharedNavigation;

/// Suspends navigation while a panel is open and closes every panel when
/// the reader keeps scrolling the narrative.
pub struct ScrollLock {
    nav: SharedNavigation,
    panels: PanelStack,
    idle: Duration,
    timer: RefCell<Option<JoinHandle<()>>>,
}

impl ScrollLock {
    pub fn new(nav: SharedNavigation, panels: PanelStack, idle: Duration) -> Self {
        Self {
            nav,
            panels,
            idle,
            timer: RefCell::new(None),
        }
    }

    pub fn is_engaged(&self) -> bool {
        self.nav.borrow().scroll_locked
    }

    /// Narrative scroll intent. Each call restarts the close timer.
    /// Returns false when no panel is open.
    pub fn on_narrative_scroll(&self) -> bool {
        if !self.nav.borrow().panel_open {
            return false;
        }

        let nav = self.nav.clone();
        let panels = self.panels.clone();
        let idle = self.idle;
        let task = tokio::task::spawn_local(async move {
            tokio::time::sleep(idle).await;
            if nav.borrow().panel_open {
                info!("Narrative scrolled with a panel open, closing all panels");
                panels.close_all();
            }
        });

        if let Some(previous) = self.timer.borrow_mut().replace(task) {
            previous.abort();
        }
        true
    }

    pub fn cancel(&self) {
        if let Some(timer) = self.timer.borrow_mut().take() {
            timer.abort();
        }
    }
}

impl Drop for ScrollLock {
    fn drop(&mut self) {
        self.cancel();
    }
}
