//! Simulated deep-zoom viewer for the terminal.
//!
//! Each mounted viewer owns an eased [`Camera`]; the stage widget draws the
//! front card's camera as a framed view of the normalized image.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use telar_core::viewer::{AnimationParams, Point, Rect, ViewerHandle, ViewerMount, ViewerWidget};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::debug;

use crate::camera::{Camera, CameraState, EasingType};

/// Image frame at home zoom; matches a 4:3 image
pub const HOME_BOUNDS: Rect = Rect {
    x: 0.0,
    y: 0.0,
    width: 1.0,
    height: 0.75,
};
pub const HOME_ZOOM: f64 = 1.0;

pub struct TerminalViewer {
    container_id: String,
    source_url: String,
    camera: RefCell<Camera>,
    params: Cell<AnimationParams>,
    ready: Rc<Cell<bool>>,
    destroyed: Cell<bool>,
}

impl TerminalViewer {
    fn new(container_id: &str, source_url: &str, easing: EasingType) -> Self {
        let home = CameraState::new(HOME_BOUNDS.center(), HOME_ZOOM);
        Self {
            container_id: container_id.to_string(),
            source_url: source_url.to_string(),
            camera: RefCell::new(Camera::new(home, easing)),
            params: Cell::new(AnimationParams::default()),
            ready: Rc::new(Cell::new(false)),
            destroyed: Cell::new(false),
        }
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn camera(&self) -> CameraState {
        self.camera.borrow().state()
    }

    pub fn is_gliding(&self) -> bool {
        self.camera.borrow().is_gliding()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.get()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    /// Part of the image currently in view
    pub fn visible_rect(&self) -> Rect {
        self.camera().visible_rect(HOME_BOUNDS, HOME_ZOOM)
    }

    fn tick(&self, now: Instant) {
        self.camera.borrow_mut().update(now);
    }

    fn glide_params(&self) -> (Duration, f64) {
        let params = self.params.get();
        (params.duration, params.spring_stiffness)
    }
}

impl ViewerHandle for TerminalViewer {
    fn container_id(&self) -> &str {
        &self.container_id
    }

    fn pan_to(&self, center: Point, immediate: bool) {
        if self.destroyed.get() {
            return;
        }
        let params = self.glide_params();
        self.camera
            .borrow_mut()
            .pan_to(center, immediate, Instant::now(), params);
    }

    fn zoom_to(&self, level: f64, anchor: Option<Point>, immediate: bool) {
        if self.destroyed.get() {
            return;
        }
        let params = self.glide_params();
        self.camera
            .borrow_mut()
            .zoom_to(level, anchor, immediate, Instant::now(), params);
    }

    fn fit_bounds(&self, bounds: Rect, immediate: bool) {
        if self.destroyed.get() {
            return;
        }
        let params = self.glide_params();
        self.camera.borrow_mut().fit_bounds(
            bounds,
            HOME_BOUNDS,
            HOME_ZOOM,
            immediate,
            Instant::now(),
            params,
        );
    }

    fn home_zoom(&self) -> f64 {
        HOME_ZOOM
    }

    fn home_bounds(&self) -> Rect {
        HOME_BOUNDS
    }

    fn animation_params(&self) -> AnimationParams {
        self.params.get()
    }

    fn set_animation_params(&self, params: AnimationParams) {
        self.params.set(params);
    }

    fn destroy(&self) {
        if !self.destroyed.replace(true) {
            debug!(container = %self.container_id, "Viewer destroyed");
        }
    }
}

/// Viewer factory. Mounting becomes ready after a fixed delay, standing in
/// for manifest and tile loading.
///
/// Must be used inside a `tokio::task::LocalSet`.
#[derive(Clone)]
pub struct TerminalViewerWidget {
    viewers: Rc<RefCell<HashMap<String, Rc<TerminalViewer>>>>,
    ready_delay: Duration,
    easing: EasingType,
}

impl TerminalViewerWidget {
    pub fn new(ready_delay: Duration, easing: EasingType) -> Self {
        Self {
            viewers: Rc::new(RefCell::new(HashMap::new())),
            ready_delay,
            easing,
        }
    }

    pub fn viewer(&self, container_id: &str) -> Option<Rc<TerminalViewer>> {
        self.viewers.borrow().get(container_id).cloned()
    }

    /// Number of live viewers
    pub fn len(&self) -> usize {
        self.viewers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.viewers.borrow().is_empty()
    }

    /// Advance every camera and drop destroyed viewers.
    /// Returns true while any camera is still gliding.
    pub fn tick(&self, now: Instant) -> bool {
        let mut viewers = self.viewers.borrow_mut();
        viewers.retain(|_, viewer| !viewer.is_destroyed());
        let mut gliding = false;
        for viewer in viewers.values() {
            viewer.tick(now);
            gliding |= viewer.is_gliding();
        }
        gliding
    }
}

impl ViewerWidget for TerminalViewerWidget {
    fn create(&self, container_id: &str, source_url: &str) -> ViewerMount {
        let viewer = Rc::new(TerminalViewer::new(container_id, source_url, self.easing));
        self.viewers
            .borrow_mut()
            .insert(container_id.to_string(), Rc::clone(&viewer));

        let (tx, rx) = oneshot::channel();
        let ready = Rc::clone(&viewer.ready);
        let delay = self.ready_delay;
        let container = container_id.to_string();
        tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            ready.set(true);
            if tx.send(()).is_err() {
                debug!(container = %container, "Viewer ready after its card was dropped");
            }
        });

        debug!(container = %container_id, source = %source_url, "Viewer mounted");
        ViewerMount { handle: viewer, ready: rx }
    }
}
