use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::animator::{MoveMode, PositionAnimator};
use super::card::{CardId, CardSnapshot, CardVisual, ViewerCard};
use super::widget::{ViewerHandle, ViewerWidget};
use crate::config::ViewerConfig;
use crate::events::{EventSink, SessionEvent};
use crate::story::{CameraTarget, ObjectResolver};

/// What happened to a requested camera move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Applied,
    /// Stored as the card's pending move until it is ready
    Queued,
    /// No card for that object
    Missing,
}

struct PoolInner {
    /// Creation order, oldest first
    cards: Vec<ViewerCard>,
    next_id: u64,
    capacity: usize,
}

impl PoolInner {
    fn find(&self, object_id: &str) -> Option<&ViewerCard> {
        self.cards.iter().find(|c| c.object_id == object_id)
    }

    fn find_mut(&mut self, object_id: &str) -> Option<&mut ViewerCard> {
        self.cards.iter_mut().find(|c| c.object_id == object_id)
    }
}

/// Bounded set of viewer cards keyed by content object
#[derive(Clone)]
pub struct ViewerCardPool {
    inner: Rc<RefCell<PoolInner>>,
    widget: Rc<dyn ViewerWidget>,
    resolver: Rc<dyn ObjectResolver>,
    animator: Rc<PositionAnimator>,
    events: EventSink,
}

impl ViewerCardPool {
    pub fn new(
        config: &ViewerConfig,
        widget: Rc<dyn ViewerWidget>,
        resolver: Rc<dyn ObjectResolver>,
        animator: Rc<PositionAnimator>,
        events: EventSink,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(PoolInner {
                cards: Vec::new(),
                next_id: 0,
                capacity: config.capacity(),
            })),
            widget,
            resolver,
            animator,
            events,
        }
    }

    /// Return the card for `object_id`, creating it if needed.
    ///
    /// A reused card gets the new z-order, loses any transient hide state and
    /// snaps to `target`. A new card keeps `target` as a snap pending move.
    /// `keep` names a card eviction must not touch (the front card).
    pub fn get_or_create(
        &self,
        object_id: &str,
        z_order: usize,
        target: Option<&CameraTarget>,
        keep: Option<&str>,
    ) -> CardId {
        let existing = {
            let mut inner = self.inner.borrow_mut();
            inner.find_mut(object_id).map(|card| {
                card.z_order = z_order;
                card.reset_for_reuse();
                card.id
            })
        };

        if let Some(id) = existing {
            debug!(object = %object_id, z_order, "Reusing viewer card");
            if let Some(target) = target {
                self.move_card(object_id, target, MoveMode::Snap);
            }
            return id;
        }

        let id = self.create_card(object_id, z_order, target);
        self.evict_over_capacity(object_id, keep);
        id
    }

    /// Make sure a card exists without touching its camera or stacking
    pub fn preload(
        &self,
        object_id: &str,
        z_order: usize,
        target: Option<&CameraTarget>,
        keep: Option<&str>,
    ) -> CardId {
        let existing = {
            let mut inner = self.inner.borrow_mut();
            inner.find_mut(object_id).map(|card| {
                card.reset_for_reuse();
                card.id
            })
        };

        match existing {
            Some(id) => id,
            None => {
                debug!(object = %object_id, "Preloading viewer card");
                let id = self.create_card(object_id, z_order, target);
                self.evict_over_capacity(object_id, keep);
                id
            }
        }
    }

    /// Move a card's camera now, or queue the move if it is still initializing
    pub fn move_card(&self, object_id: &str, target: &CameraTarget, mode: MoveMode) -> MoveOutcome {
        let handle = {
            let mut inner = self.inner.borrow_mut();
            let Some(card) = inner.find_mut(object_id) else {
                warn!(object = %object_id, "No viewer card to move");
                return MoveOutcome::Missing;
            };
            if !card.is_ready() {
                if let Some(superseded) = card.queue_move(*target, mode) {
                    debug!(object = %object_id, superseded = %superseded.target, "Pending move replaced");
                }
                return MoveOutcome::Queued;
            }
            Rc::clone(&card.handle)
        };

        self.animator.apply(Some(&handle), target, mode);
        MoveOutcome::Applied
    }

    pub fn bring_to_front(&self, object_id: &str) -> bool {
        match self.inner.borrow_mut().find_mut(object_id) {
            Some(card) => {
                card.bring_to_front();
                true
            }
            None => {
                warn!(object = %object_id, "No viewer card to bring to front");
                false
            }
        }
    }

    pub fn hide_instantly(&self, object_id: &str) -> bool {
        match self.inner.borrow_mut().find_mut(object_id) {
            Some(card) => {
                card.hide_instantly();
                true
            }
            None => false,
        }
    }

    /// Hide every active card stacked above `z_order`, except `keep`.
    /// Returns the hidden object ids.
    pub fn hide_above(&self, z_order: usize, keep: Option<&str>) -> Vec<String> {
        let mut inner = self.inner.borrow_mut();
        inner
            .cards
            .iter_mut()
            .filter(|c| c.visual == CardVisual::Active && c.z_order > z_order)
            .filter(|c| keep != Some(c.object_id.as_str()))
            .map(|card| {
                card.hide_instantly();
                card.object_id.clone()
            })
            .collect()
    }

    /// Remove a card and release its widget. Safe while it is still initializing.
    pub fn destroy(&self, object_id: &str) -> bool {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            inner
                .cards
                .iter()
                .position(|c| c.object_id == object_id)
                .map(|pos| inner.cards.remove(pos))
        };
        match removed {
            Some(card) => {
                self.release(card);
                true
            }
            None => false,
        }
    }

    pub fn destroy_all(&self) {
        let cards: Vec<ViewerCard> = self.inner.borrow_mut().cards.drain(..).collect();
        let count = cards.len();
        for card in cards {
            self.release(card);
        }
        debug!(count, "All viewer cards destroyed");
    }

    /// Readiness signal of a card; `true` once its widget mounted
    pub fn ready_signal(&self, object_id: &str) -> Option<watch::Receiver<bool>> {
        self.inner
            .borrow()
            .find(object_id)
            .map(|c| c.ready_tx.subscribe())
    }

    pub fn is_ready(&self, object_id: &str) -> bool {
        self.inner
            .borrow()
            .find(object_id)
            .is_some_and(|c| c.is_ready())
    }

    pub fn contains(&self, object_id: &str) -> bool {
        self.inner.borrow().find(object_id).is_some()
    }

    pub fn handle(&self, object_id: &str) -> Option<Rc<dyn ViewerHandle>> {
        self.inner
            .borrow()
            .find(object_id)
            .map(|c| Rc::clone(&c.handle))
    }

    pub fn card(&self, object_id: &str) -> Option<CardSnapshot> {
        self.inner.borrow().find(object_id).map(|c| c.snapshot())
    }

    /// All cards, oldest first
    pub fn cards(&self) -> Vec<CardSnapshot> {
        self.inner.borrow().cards.iter().map(|c| c.snapshot()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().cards.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.borrow().capacity
    }

    fn create_card(&self, object_id: &str, z_order: usize, target: Option<&CameraTarget>) -> CardId {
        let source_url = self.resolver.source_url(object_id);
        let (id, container_id) = {
            let mut inner = self.inner.borrow_mut();
            inner.next_id += 1;
            (
                CardId(inner.next_id),
                format!("viewer-instance-{}", inner.next_id),
            )
        };

        let mount = self.widget.create(&container_id, &source_url);
        let mut card = ViewerCard::new(id, object_id, z_order, mount.handle);
        if let Some(target) = target {
            card.queue_move(*target, MoveMode::Snap);
        }
        self.inner.borrow_mut().cards.push(card);
        info!(object = %object_id, container = %container_id, source = %source_url, "Viewer card created");

        let pool: Weak<RefCell<PoolInner>> = Rc::downgrade(&self.inner);
        let animator = Rc::clone(&self.animator);
        let events = self.events.clone();
        let ready = mount.ready;
        tokio::task::spawn_local(async move {
            if ready.await.is_err() {
                debug!(card = id.0, "Viewer dropped its ready signal");
                return;
            }
            let Some(inner) = pool.upgrade() else {
                return;
            };

            let (handle, pending, object_id) = {
                let mut inner = inner.borrow_mut();
                // Card may have been evicted or destroyed while mounting
                let Some(card) = inner.cards.iter_mut().find(|c| c.id == id) else {
                    debug!(card = id.0, "Ready signal for a removed card ignored");
                    return;
                };
                if !card.mark_ready() {
                    return;
                }
                (Rc::clone(&card.handle), card.take_pending(), card.object_id.clone())
            };

            if let Some(pending) = pending {
                animator.apply(Some(&handle), &pending.target, pending.mode);
            }
            info!(object = %object_id, "Viewer card ready");
            events.emit(SessionEvent::CardReady { object_id });
        });

        id
    }

    fn evict_over_capacity(&self, newest: &str, keep: Option<&str>) {
        loop {
            let victim = {
                let mut inner = self.inner.borrow_mut();
                if inner.cards.len() <= inner.capacity {
                    return;
                }
                let position = inner
                    .cards
                    .iter()
                    .position(|c| c.object_id != newest && Some(c.object_id.as_str()) != keep);
                match position {
                    Some(pos) => inner.cards.remove(pos),
                    None => {
                        warn!(capacity = inner.capacity, "Every viewer card is protected, pool over capacity");
                        return;
                    }
                }
            };

            info!(object = %victim.object_id, "Evicting viewer card");
            let object_id = victim.object_id.clone();
            self.release(victim);
            self.events.emit(SessionEvent::CardEvicted { object_id });
        }
    }

    fn release(&self, card: ViewerCard) {
        self.animator.forget(&card.container_id);
        card.handle.destroy();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;
    use tokio::task::LocalSet;

    use super::*;
    use crate::config::AnimationConfig;
    use crate::story::ViewPoint;
    use crate::testing::{settle, FakeResolver, FakeViewerWidget, ViewerCommand};
    use crate::viewer::{CardVisual, GlideProfile, Point};

    fn pool(
        capacity: usize,
    ) -> (
        ViewerCardPool,
        Rc<FakeViewerWidget>,
        mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        let widget = FakeViewerWidget::new();
        let events = EventSink::new();
        let (tx, rx) = mpsc::unbounded_channel();
        events.connect(tx);
        let config = ViewerConfig {
            max_cards: capacity,
            ..ViewerConfig::default()
        };
        let pool = ViewerCardPool::new(
            &config,
            widget.clone(),
            Rc::new(FakeResolver),
            Rc::new(PositionAnimator::new(AnimationConfig::default())),
            events,
        );
        (pool, widget, rx)
    }

    fn point(x: f64, y: f64, zoom: f64) -> CameraTarget {
        CameraTarget::Point(ViewPoint { x, y, zoom })
    }

    #[tokio::test(start_paused = true)]
    async fn test_evicts_oldest_unprotected_card() {
        LocalSet::new()
            .run_until(async {
                let (pool, widget, mut rx) = pool(3);
                pool.get_or_create("a", 1, None, None);
                pool.get_or_create("b", 2, None, Some("a"));
                pool.get_or_create("c", 3, None, Some("b"));
                assert_eq!(pool.len(), 3);

                // "a" is the front card, so "b" is the oldest evictable one
                pool.get_or_create("d", 4, None, Some("a"));

                assert_eq!(pool.len(), 3);
                assert!(pool.contains("a"));
                assert!(!pool.contains("b"));
                assert!(widget.handle_for("b").unwrap().is_destroyed());
                assert_eq!(
                    rx.try_recv().ok(),
                    Some(SessionEvent::CardEvicted { object_id: "b".into() })
                );
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_hide_above_leaves_lower_cards() {
        LocalSet::new()
            .run_until(async {
                let (pool, _widget, _rx) = pool(4);
                for (id, z) in [("a", 2), ("b", 3), ("c", 5)] {
                    pool.get_or_create(id, z, None, None);
                    pool.bring_to_front(id);
                }

                assert_eq!(pool.hide_above(2, Some("c")), vec!["b".to_string()]);
                assert_eq!(pool.card("a").map(|c| c.visual), Some(CardVisual::Active));
                assert_eq!(pool.card("b").map(|c| c.visual), Some(CardVisual::HiddenTransient));
                assert_eq!(pool.card("c").map(|c| c.visual), Some(CardVisual::Active));

                assert_eq!(pool.hide_above(0, None), vec!["a".to_string(), "c".to_string()]);
                assert!(pool.cards().iter().all(|c| c.visual != CardVisual::Active));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_exceeds_capacity() {
        LocalSet::new()
            .run_until(async {
                let (pool, _widget, _rx) = pool(2);
                for (i, id) in ["a", "b", "c", "d", "e"].iter().enumerate() {
                    pool.preload(id, i + 1, None, Some("a"));
                    assert!(pool.len() <= 2);
                }
                assert!(pool.contains("a"));
                assert!(pool.contains("e"));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_latest_pending_move_applies() {
        LocalSet::new()
            .run_until(async {
                let (pool, widget, mut rx) = pool(4);
                pool.get_or_create("a", 1, Some(&point(0.1, 0.1, 1.0)), None);

                let step = MoveMode::Animate(GlideProfile::Step);
                assert_eq!(pool.move_card("a", &point(0.3, 0.3, 1.0), step), MoveOutcome::Queued);
                assert_eq!(pool.move_card("a", &point(0.5, 0.5, 1.0), step), MoveOutcome::Queued);
                assert!(pool.card("a").unwrap().has_pending_move);

                assert!(widget.fire_ready("a"));
                settle().await;

                let handle = widget.handle_for("a").unwrap();
                assert_eq!(
                    handle.commands(),
                    vec![
                        ViewerCommand::Pan {
                            center: Point::new(0.5, 0.375),
                            immediate: false,
                        },
                        ViewerCommand::Zoom { level: 2.0, immediate: false },
                    ]
                );
                assert!(pool.is_ready("a"));
                assert!(!pool.card("a").unwrap().has_pending_move);
                assert_eq!(
                    rx.try_recv().ok(),
                    Some(SessionEvent::CardReady { object_id: "a".into() })
                );
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_card_snaps_on_reuse() {
        LocalSet::new()
            .run_until(async {
                let (pool, widget, _rx) = pool(4);
                pool.get_or_create("a", 1, None, None);
                widget.fire_ready("a");
                settle().await;

                let outcome_id = pool.get_or_create("a", 5, Some(&point(0.5, 0.5, 1.0)), None);
                assert_eq!(pool.card("a").unwrap().id, outcome_id);
                assert_eq!(pool.card("a").unwrap().z_order, 5);
                assert!(matches!(
                    widget.handle_for("a").unwrap().commands()[0],
                    ViewerCommand::Pan { immediate: true, .. }
                ));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_mid_initialization_ignores_late_ready() {
        LocalSet::new()
            .run_until(async {
                let (pool, widget, mut rx) = pool(4);
                pool.get_or_create("a", 1, Some(&point(0.5, 0.5, 1.0)), None);
                assert!(pool.destroy("a"));

                widget.fire_ready("a");
                tokio::time::sleep(Duration::from_secs(3)).await;

                let handle = widget.handle_for("a").unwrap();
                assert!(handle.is_destroyed());
                assert!(handle.commands().is_empty());
                assert!(rx.try_recv().is_err());
                assert!(!pool.destroy("a"));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reuse_clears_transient_hide() {
        LocalSet::new()
            .run_until(async {
                let (pool, _widget, _rx) = pool(4);
                pool.get_or_create("a", 1, None, None);
                pool.bring_to_front("a");
                pool.hide_instantly("a");
                assert_eq!(pool.card("a").unwrap().visual, CardVisual::HiddenTransient);

                pool.get_or_create("a", 1, None, None);
                pool.get_or_create("a", 1, None, None);
                assert_eq!(pool.card("a").unwrap().visual, CardVisual::Offscreen);
                assert_eq!(pool.len(), 1);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_card_move_is_noop() {
        LocalSet::new()
            .run_until(async {
                let (pool, _widget, _rx) = pool(4);
                assert_eq!(
                    pool.move_card("nope", &point(0.5, 0.5, 1.0), MoveMode::Snap),
                    MoveOutcome::Missing
                );
                assert!(!pool.bring_to_front("nope"));
            })
            .await;
    }
}
