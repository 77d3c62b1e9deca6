use std::cell::RefCell;
use std::rc::Rc;

use tokio::sync::mpsc;
use tracing::warn;

/// Events emitted by the session to notify peripheral UI of changes
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The current step index changed (set before visuals settle)
    StepChanged { index: usize, total: usize },
    /// The front-most object changed; `None` on the intro step
    ActiveObjectChanged { object_id: Option<String> },
    /// A panel was opened or the last panel finished closing
    PanelStateChanged { open: bool },
    /// A viewer card finished mounting
    CardReady { object_id: String },
    /// A viewer card was evicted to stay within capacity
    CardEvicted { object_id: String },
}

/// Shared, optional event channel handed to every component of a session
#[derive(Clone, Default)]
pub struct EventSink {
    tx: Rc<RefCell<Option<mpsc::UnboundedSender<SessionEvent>>>>,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, tx: mpsc::UnboundedSender<SessionEvent>) {
        *self.tx.borrow_mut() = Some(tx);
    }

    pub fn disconnect(&self) {
        self.tx.borrow_mut().take();
    }

    /// Send an event to the UI (if an event channel is configured)
    pub fn emit(&self, event: SessionEvent) {
        if let Some(ref tx) = *self.tx.borrow() {
            if tx.send(event).is_err() {
                warn!("Failed to send session event: receiver dropped");
            }
        }
    }
}
