//! Contract of the external deep-zoom viewer widget.
//!
//! Coordinates here are in the viewer's native frame. The animator is the only
//! place that maps normalized story coordinates into it.

use std::rc::Rc;
use std::time::Duration;

use tokio::sync::oneshot;

/// Point in viewer coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Rectangle in viewer coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Mutable glide parameters of a viewer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationParams {
    pub duration: Duration,
    pub spring_stiffness: f64,
}

impl Default for AnimationParams {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(1200),
            spring_stiffness: 6.5,
        }
    }
}

/// Handle to one mounted viewer instance
pub trait ViewerHandle {
    fn container_id(&self) -> &str;

    fn pan_to(&self, center: Point, immediate: bool);

    /// Zoom to an absolute level, keeping `anchor` fixed when given
    fn zoom_to(&self, level: f64, anchor: Option<Point>, immediate: bool);

    fn fit_bounds(&self, bounds: Rect, immediate: bool);

    /// Zoom level at which the whole image fits
    fn home_zoom(&self) -> f64;

    /// Image bounds at home zoom
    fn home_bounds(&self) -> Rect;

    fn animation_params(&self) -> AnimationParams;

    fn set_animation_params(&self, params: AnimationParams);

    /// Release the widget's resources; later calls are ignored
    fn destroy(&self);
}

/// Result of mounting a viewer: the handle plus its one-shot ready signal
pub struct ViewerMount {
    pub handle: Rc<dyn ViewerHandle>,
    pub ready: oneshot::Receiver<()>,
}

/// Factory for viewer instances
pub trait ViewerWidget {
    fn create(&self, container_id: &str, source_url: &str) -> ViewerMount;
}
