//! Camera controller combining easing and timing.

use std::time::Duration;

use telar_core::viewer::{Point, Rect};
use tokio::time::Instant;

use super::easing::{EasingType, EasingTypeExt};
use super::timing::{is_complete_at, lerp, progress_at};

/// Where the camera looks and how close
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub center: Point,
    pub zoom: f64,
}

impl CameraState {
    pub fn new(center: Point, zoom: f64) -> Self {
        Self { center, zoom }
    }

    fn interpolate(&self, to: &CameraState, t: f64) -> CameraState {
        CameraState {
            center: Point::new(
                lerp(self.center.x, to.center.x, t),
                lerp(self.center.y, to.center.y, t),
            ),
            zoom: lerp(self.zoom, to.zoom, t),
        }
    }

    /// Visible rectangle for a viewport whose home frame is `home`
    pub fn visible_rect(&self, home: Rect, home_zoom: f64) -> Rect {
        let scale = if self.zoom > 0.0 { home_zoom / self.zoom } else { 1.0 };
        let width = home.width * scale;
        let height = home.height * scale;
        Rect::new(
            self.center.x - width / 2.0,
            self.center.y - height / 2.0,
            width,
            height,
        )
    }
}

#[derive(Debug, Clone)]
struct ActiveGlide {
    start: Instant,
    from: CameraState,
    duration: Duration,
    stiffness: f64,
}

/// Eased camera. Each move retargets the glide from wherever the camera
/// currently is, so a pan followed by a zoom blends into one motion.
#[derive(Debug, Clone)]
pub struct Camera {
    current: CameraState,
    target: CameraState,
    glide: Option<ActiveGlide>,
    easing: EasingType,
}

impl Camera {
    pub fn new(initial: CameraState, easing: EasingType) -> Self {
        Self {
            current: initial,
            target: initial,
            glide: None,
            easing,
        }
    }

    pub fn state(&self) -> CameraState {
        self.current
    }

    pub fn target(&self) -> CameraState {
        self.target
    }

    pub fn is_gliding(&self) -> bool {
        self.glide.is_some()
    }

    pub fn snap(&mut self, to: CameraState) {
        self.glide = None;
        self.current = to;
        self.target = to;
    }

    /// Start gliding towards `to`. A zero duration or `EasingType::None`
    /// lands immediately.
    pub fn glide_to(&mut self, to: CameraState, now: Instant, duration: Duration, stiffness: f64) {
        if duration.is_zero() || self.easing == EasingType::None {
            self.snap(to);
            return;
        }
        let from = self.update(now);
        self.target = to;
        self.glide = Some(ActiveGlide {
            start: now,
            from,
            duration,
            stiffness,
        });
    }

    pub fn pan_to(&mut self, center: Point, immediate: bool, now: Instant, params: (Duration, f64)) {
        let to = CameraState::new(center, self.target.zoom);
        self.move_to(to, immediate, now, params);
    }

    /// Zoom to `level`, keeping `anchor` at the same screen position
    pub fn zoom_to(
        &mut self,
        level: f64,
        anchor: Option<Point>,
        immediate: bool,
        now: Instant,
        params: (Duration, f64),
    ) {
        let mut center = self.target.center;
        if let Some(anchor) = anchor {
            if level > 0.0 && self.target.zoom > 0.0 {
                let ratio = self.target.zoom / level;
                center = Point::new(
                    anchor.x + (center.x - anchor.x) * ratio,
                    anchor.y + (center.y - anchor.y) * ratio,
                );
            }
        }
        self.move_to(CameraState::new(center, level), immediate, now, params);
    }

    /// Frame `bounds` inside a viewport whose home frame is `home`
    pub fn fit_bounds(
        &mut self,
        bounds: Rect,
        home: Rect,
        home_zoom: f64,
        immediate: bool,
        now: Instant,
        params: (Duration, f64),
    ) {
        let zoom = fit_zoom(bounds, home, home_zoom);
        self.move_to(CameraState::new(bounds.center(), zoom), immediate, now, params);
    }

    fn move_to(&mut self, to: CameraState, immediate: bool, now: Instant, params: (Duration, f64)) {
        if immediate {
            self.snap(to);
        } else {
            self.glide_to(to, now, params.0, params.1);
        }
    }

    /// Advance to `now` and return the current state
    pub fn update(&mut self, now: Instant) -> CameraState {
        let Some(glide) = &self.glide else {
            return self.current;
        };

        if is_complete_at(glide.start, now, glide.duration) {
            self.current = self.target;
            self.glide = None;
            return self.current;
        }

        let t = progress_at(glide.start, now, glide.duration);
        let eased = self.easing.apply(t, glide.stiffness);
        self.current = glide.from.interpolate(&self.target, eased);
        self.current
    }
}

/// Zoom at which `bounds` fills a viewport framed like `home`
pub fn fit_zoom(bounds: Rect, home: Rect, home_zoom: f64) -> f64 {
    if bounds.width <= 0.0 || bounds.height <= 0.0 {
        return home_zoom;
    }
    home_zoom * (home.width / bounds.width).min(home.height / bounds.height)
}
