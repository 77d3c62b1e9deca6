use std::fmt;
use std::rc::Rc;

use tokio::sync::watch;

use super::animator::MoveMode;
use super::widget::ViewerHandle;
use crate::story::CameraTarget;

/// Pool-unique card identity, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardId(pub u64);

/// Visual state of a card. Rendering is a projection of this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardVisual {
    /// Mounted but positioned out of view
    Offscreen,
    /// Shown; stacked by z-order
    Active,
    /// Hidden instantly during a backward switch, awaiting reuse
    HiddenTransient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Initializing,
    Ready,
}

/// Camera move queued on a card that is not ready yet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingMove {
    pub target: CameraTarget,
    pub mode: MoveMode,
}

/// One viewer instance bound to one content object
pub struct ViewerCard {
    pub(crate) id: CardId,
    pub(crate) object_id: String,
    pub(crate) container_id: String,
    pub(crate) visual: CardVisual,
    pub(crate) readiness: Readiness,
    pub(crate) pending_move: Option<PendingMove>,
    pub(crate) z_order: usize,
    pub(crate) handle: Rc<dyn ViewerHandle>,
    pub(crate) ready_tx: watch::Sender<bool>,
}

impl ViewerCard {
    pub(crate) fn new(
        id: CardId,
        object_id: &str,
        z_order: usize,
        handle: Rc<dyn ViewerHandle>,
    ) -> Self {
        let (ready_tx, _) = watch::channel(false);
        Self {
            id,
            object_id: object_id.to_string(),
            container_id: handle.container_id().to_string(),
            visual: CardVisual::Offscreen,
            readiness: Readiness::Initializing,
            pending_move: None,
            z_order,
            handle,
            ready_tx,
        }
    }

    /// Queue a move for when the card becomes ready. Last write wins;
    /// returns the move that was superseded, if any.
    pub(crate) fn queue_move(&mut self, target: CameraTarget, mode: MoveMode) -> Option<PendingMove> {
        self.pending_move.replace(PendingMove { target, mode })
    }

    pub(crate) fn take_pending(&mut self) -> Option<PendingMove> {
        self.pending_move.take()
    }

    pub(crate) fn bring_to_front(&mut self) {
        self.visual = CardVisual::Active;
    }

    pub(crate) fn hide_instantly(&mut self) {
        self.visual = CardVisual::HiddenTransient;
    }

    /// Clear transient hide state left by a backward switch. Idempotent.
    pub(crate) fn reset_for_reuse(&mut self) {
        if self.visual == CardVisual::HiddenTransient {
            self.visual = CardVisual::Offscreen;
        }
    }

    /// Returns false when the card was already ready
    pub(crate) fn mark_ready(&mut self) -> bool {
        if self.readiness == Readiness::Ready {
            return false;
        }
        self.readiness = Readiness::Ready;
        self.ready_tx.send_replace(true);
        true
    }

    pub fn id(&self) -> CardId {
        self.id
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn visual(&self) -> CardVisual {
        self.visual
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }

    pub fn pending_move(&self) -> Option<&PendingMove> {
        self.pending_move.as_ref()
    }

    pub fn z_order(&self) -> usize {
        self.z_order
    }

    pub fn handle(&self) -> &Rc<dyn ViewerHandle> {
        &self.handle
    }

    pub fn snapshot(&self) -> CardSnapshot {
        CardSnapshot {
            id: self.id,
            object_id: self.object_id.clone(),
            container_id: self.container_id.clone(),
            visual: self.visual,
            readiness: self.readiness,
            z_order: self.z_order,
            has_pending_move: self.pending_move.is_some(),
        }
    }
}

impl fmt::Debug for ViewerCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewerCard")
            .field("id", &self.id)
            .field("object_id", &self.object_id)
            .field("container_id", &self.container_id)
            .field("visual", &self.visual)
            .field("readiness", &self.readiness)
            .field("pending_move", &self.pending_move)
            .field("z_order", &self.z_order)
            .finish()
    }
}

/// Owned copy of a card's state for rendering and inspection
#[derive(Debug, Clone, PartialEq)]
pub struct CardSnapshot {
    pub id: CardId,
    pub object_id: String,
    pub container_id: String,
    pub visual: CardVisual,
    pub readiness: Readiness,
    pub z_order: usize,
    pub has_pending_move: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::ViewPoint;
    use crate::testing::FakeViewerHandle;
    use crate::viewer::GlideProfile;

    fn card() -> ViewerCard {
        ViewerCard::new(CardId(1), "loom", 2, FakeViewerHandle::new("viewer-instance-1"))
    }

    fn target(x: f64) -> CameraTarget {
        CameraTarget::Point(ViewPoint { x, y: 0.5, zoom: 1.0 })
    }

    #[test]
    fn test_second_queued_move_discards_first() {
        let mut card = card();
        assert!(card.queue_move(target(0.1), MoveMode::Snap).is_none());
        let superseded = card.queue_move(target(0.9), MoveMode::Animate(GlideProfile::Step));

        assert_eq!(superseded.map(|m| m.target), Some(target(0.1)));
        let pending = card.take_pending().unwrap();
        assert_eq!(pending.target, target(0.9));
        assert!(card.take_pending().is_none());
    }

    #[test]
    fn test_reset_for_reuse_is_idempotent() {
        let mut card = card();
        card.bring_to_front();
        card.hide_instantly();
        card.reset_for_reuse();
        card.reset_for_reuse();
        assert_eq!(card.visual(), CardVisual::Offscreen);

        // Active cards keep their styling
        card.bring_to_front();
        card.reset_for_reuse();
        assert_eq!(card.visual(), CardVisual::Active);
    }

    #[test]
    fn test_mark_ready_once() {
        let mut card = card();
        let rx = card.ready_tx.subscribe();
        assert!(card.mark_ready());
        assert!(!card.mark_ready());
        assert!(*rx.borrow());
        assert!(card.is_ready());
    }
}
