use std::cell::RefCell;

use telar_core::panel::{LayerKind, OverlayWidget, PanelContent};

/// Overlay panels drawn over the stage, bottom to top. Hides are immediate.
#[derive(Debug, Default)]
pub struct TerminalOverlay {
    shown: RefCell<Vec<(LayerKind, PanelContent)>>,
}

impl TerminalOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shown layers, bottom first
    pub fn visible(&self) -> Vec<(LayerKind, PanelContent)> {
        self.shown.borrow().clone()
    }

    pub fn top(&self) -> Option<(LayerKind, PanelContent)> {
        self.shown.borrow().last().cloned()
    }
}

impl OverlayWidget for TerminalOverlay {
    fn show(&self, kind: LayerKind, content: &PanelContent) {
        let mut shown = self.shown.borrow_mut();
        shown.retain(|(k, _)| *k != kind);
        shown.push((kind, content.clone()));
    }

    fn hide(&self, kind: LayerKind) {
        self.shown.borrow_mut().retain(|(k, _)| *k != kind);
    }

    fn is_shown(&self, kind: LayerKind) -> bool {
        self.shown.borrow().iter().any(|(k, _)| *k == kind)
    }
}
