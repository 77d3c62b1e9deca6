use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::content::{resolve_panel_content, PanelContent};
use crate::events::{EventSink, SessionEvent};
use crate::navigation::SharedNavigation;
use crate::story::{Narrative, ObjectResolver};

/// Tier of overlay content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Primary,
    Secondary,
    Glossary,
}

impl LayerKind {
    pub const ALL: [LayerKind; 3] = [LayerKind::Primary, LayerKind::Secondary, LayerKind::Glossary];

    pub fn panel_id(&self) -> &'static str {
        match self {
            LayerKind::Primary => "panel-layer1",
            LayerKind::Secondary => "panel-layer2",
            LayerKind::Glossary => "panel-glossary",
        }
    }

    pub fn default_title(&self) -> &'static str {
        match self {
            LayerKind::Primary => "Layer 1",
            LayerKind::Secondary => "Layer 2",
            LayerKind::Glossary => "Glossary Term",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelEntry {
    pub kind: LayerKind,
    pub content_id: String,
}

/// Contract of the external overlay widget. One surface per layer kind.
pub trait OverlayWidget {
    fn show(&self, kind: LayerKind, content: &PanelContent);

    /// Request the layer be hidden; may complete later
    fn hide(&self, kind: LayerKind);

    fn is_shown(&self, kind: LayerKind) -> bool;

    fn any_shown(&self) -> bool {
        LayerKind::ALL.iter().any(|kind| self.is_shown(*kind))
    }
}

/// Back-navigable stack of overlay layers
#[derive(Clone)]
pub struct PanelStack {
    entries: Rc<RefCell<Vec<PanelEntry>>>,
    overlay: Rc<dyn OverlayWidget>,
    narrative: Rc<Narrative>,
    resolver: Rc<dyn ObjectResolver>,
    nav: SharedNavigation,
    events: EventSink,
    hide_settle: Duration,
    settle_task: Rc<RefCell<Option<JoinHandle<()>>>>,
}

impl PanelStack {
    pub fn new(
        overlay: Rc<dyn OverlayWidget>,
        narrative: Rc<Narrative>,
        resolver: Rc<dyn ObjectResolver>,
        nav: SharedNavigation,
        events: EventSink,
        hide_settle: Duration,
    ) -> Self {
        Self {
            entries: Rc::new(RefCell::new(Vec::new())),
            overlay,
            narrative,
            resolver,
            nav,
            events,
            hide_settle,
            settle_task: Rc::new(RefCell::new(None)),
        }
    }

    /// Open a layer. Primary resets the stack, other kinds push onto it.
    /// Unknown content shows a placeholder; the panel still opens.
    pub fn open(&self, kind: LayerKind, content_id: &str) -> PanelContent {
        let content = self.resolve(kind, content_id);
        let entry = PanelEntry {
            kind,
            content_id: content_id.to_string(),
        };

        let dropped: Vec<LayerKind> = {
            let mut entries = self.entries.borrow_mut();
            match kind {
                LayerKind::Primary => {
                    let dropped = entries
                        .drain(..)
                        .map(|e| e.kind)
                        .filter(|k| *k != LayerKind::Primary)
                        .collect();
                    entries.push(entry);
                    dropped
                }
                _ => {
                    entries.push(entry);
                    Vec::new()
                }
            }
        };
        for stale in dedup(dropped) {
            self.overlay.hide(stale);
        }

        self.overlay.show(kind, &content);
        info!(panel = kind.panel_id(), content = %content_id, "Panel opened");

        let was_open = {
            let mut nav = self.nav.borrow_mut();
            let was_open = nav.panel_open;
            nav.set_panel_open(true);
            was_open
        };
        if !was_open {
            self.events.emit(SessionEvent::PanelStateChanged { open: true });
        }
        content
    }

    /// Close a layer. Primary clears the stack; other kinds pop their latest
    /// entry. The panel counts as closed once the overlay shows nothing.
    pub fn close(&self, kind: LayerKind) {
        match kind {
            LayerKind::Primary => {
                let removed: Vec<LayerKind> = self.entries.borrow_mut().drain(..).map(|e| e.kind).collect();
                let mut kinds = dedup(removed);
                if !kinds.contains(&LayerKind::Primary) {
                    kinds.push(LayerKind::Primary);
                }
                for kind in kinds {
                    self.overlay.hide(kind);
                }
            }
            _ => {
                let uncovered = {
                    let mut entries = self.entries.borrow_mut();
                    if let Some(pos) = entries.iter().rposition(|e| e.kind == kind) {
                        entries.remove(pos);
                    }
                    entries.iter().rev().find(|e| e.kind == kind).cloned()
                };
                match uncovered {
                    // An earlier entry of the same kind is visible again
                    Some(entry) => {
                        let content = self.resolve(entry.kind, &entry.content_id);
                        self.overlay.show(entry.kind, &content);
                    }
                    None => self.overlay.hide(kind),
                }
            }
        }
        debug!(panel = kind.panel_id(), "Panel close requested");
        self.schedule_settle_check();
    }

    /// Close the top layer
    pub fn back(&self) -> Option<LayerKind> {
        let top = self.top()?;
        self.close(top.kind);
        Some(top.kind)
    }

    /// Hide every layer and release the lock immediately
    pub fn close_all(&self) {
        self.entries.borrow_mut().clear();
        for kind in LayerKind::ALL {
            if self.overlay.is_shown(kind) {
                self.overlay.hide(kind);
            }
        }
        self.mark_closed();
    }

    /// Overlay "hidden" notification
    pub fn on_overlay_hidden(&self) {
        if !self.overlay.any_shown() {
            self.mark_closed();
        }
    }

    pub fn entries(&self) -> Vec<PanelEntry> {
        self.entries.borrow().clone()
    }

    pub fn top(&self) -> Option<PanelEntry> {
        self.entries.borrow().last().cloned()
    }

    pub fn is_open(&self) -> bool {
        self.nav.borrow().panel_open
    }

    /// Content of a stack entry, for rendering
    pub fn content_for(&self, entry: &PanelEntry) -> PanelContent {
        self.resolve(entry.kind, &entry.content_id)
    }

    pub fn cancel(&self) {
        if let Some(task) = self.settle_task.borrow_mut().take() {
            task.abort();
        }
    }

    fn resolve(&self, kind: LayerKind, content_id: &str) -> PanelContent {
        resolve_panel_content(&self.narrative, self.resolver.as_ref(), kind, content_id)
    }

    fn schedule_settle_check(&self) {
        let this = self.clone();
        let settle = self.hide_settle;
        let task = tokio::task::spawn_local(async move {
            tokio::time::sleep(settle).await;
            this.on_overlay_hidden();
        });
        if let Some(previous) = self.settle_task.borrow_mut().replace(task) {
            previous.abort();
        }
    }

    fn mark_closed(&self) {
        let was_open = {
            let mut nav = self.nav.borrow_mut();
            let was_open = nav.panel_open;
            nav.set_panel_open(false);
            was_open
        };
        if was_open {
            info!("All panels closed");
            self.events.emit(SessionEvent::PanelStateChanged { open: false });
        }
    }
}

fn dedup(kinds: Vec<LayerKind>) -> Vec<LayerKind> {
    let mut unique = Vec::with_capacity(kinds.len());
    for kind in kinds {
        if !unique.contains(&kind) {
            unique.push(kind);
        }
    }
    unique
}
