use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, warn};

use super::widget::{AnimationParams, Point, Rect, ViewerHandle};
use crate::config::AnimationConfig;
use crate::story::{CameraTarget, Region, ViewPoint};

/// Which glide a call site asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlideProfile {
    /// Long cinematic pan for scene-level moves
    Scene,
    /// Shorter glide for same-card repositioning
    Step,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveMode {
    Snap,
    Animate(GlideProfile),
}

#[derive(Debug, Clone, Copy)]
struct InFlightGlide {
    /// Parameters the viewer had before the first overlapping glide
    original: AnimationParams,
    generation: u64,
}

/// Translates normalized story coordinates into viewer camera commands
pub struct PositionAnimator {
    config: AnimationConfig,
    glides: Rc<RefCell<HashMap<String, InFlightGlide>>>,
    next_generation: Cell<u64>,
}

impl PositionAnimator {
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            config,
            glides: Rc::new(RefCell::new(HashMap::new())),
            next_generation: Cell::new(0),
        }
    }

    /// Glide parameters for a profile
    pub fn profile_params(&self, profile: GlideProfile) -> AnimationParams {
        match profile {
            GlideProfile::Scene => AnimationParams {
                duration: Duration::from_millis(self.config.scene_duration_ms),
                spring_stiffness: self.config.scene_spring_stiffness,
            },
            GlideProfile::Step => AnimationParams {
                duration: Duration::from_millis(self.config.step_duration_ms),
                spring_stiffness: self.config.step_spring_stiffness,
            },
        }
    }

    /// Move the camera. Returns false (and does nothing) without a handle.
    ///
    /// Must run inside a `LocalSet` when `mode` animates: parameter
    /// restoration is a local task.
    pub fn apply(
        &self,
        handle: Option<&Rc<dyn ViewerHandle>>,
        target: &CameraTarget,
        mode: MoveMode,
    ) -> bool {
        let Some(handle) = handle else {
            warn!(%target, "No viewer handle, camera move skipped");
            return false;
        };

        let immediate = match mode {
            MoveMode::Snap => true,
            MoveMode::Animate(profile) => {
                self.begin_glide(handle, profile);
                false
            }
        };

        match target {
            CameraTarget::Point(point) => self.move_to_point(handle.as_ref(), point, immediate),
            CameraTarget::Region(region) => {
                handle.fit_bounds(map_region(handle.home_bounds(), region), immediate)
            }
        }

        debug!(
            viewer = %handle.container_id(),
            %target,
            immediate,
            "Camera move applied"
        );
        true
    }

    /// Drop glide bookkeeping for a viewer that is going away
    pub fn forget(&self, container_id: &str) {
        self.glides.borrow_mut().remove(container_id);
    }

    pub fn is_gliding(&self, container_id: &str) -> bool {
        self.glides.borrow().contains_key(container_id)
    }

    fn move_to_point(&self, handle: &dyn ViewerHandle, point: &ViewPoint, immediate: bool) {
        let home = handle.home_bounds();
        let center = Point::new(
            home.x + point.x * home.width,
            home.y + point.y * home.height,
        );
        let level = handle.home_zoom() * point.zoom;
        handle.pan_to(center, immediate);
        handle.zoom_to(level, Some(center), immediate);
    }

    fn begin_glide(&self, handle: &Rc<dyn ViewerHandle>, profile: GlideProfile) {
        let params = self.profile_params(profile);
        let key = handle.container_id().to_string();
        let generation = self.next_generation.get() + 1;
        self.next_generation.set(generation);

        {
            let mut glides = self.glides.borrow_mut();
            let original = glides
                .get(&key)
                .map(|g| g.original)
                .unwrap_or_else(|| handle.animation_params());
            glides.insert(key.clone(), InFlightGlide { original, generation });
        }
        handle.set_animation_params(params);

        let glides = Rc::clone(&self.glides);
        let handle = Rc::clone(handle);
        let wait = params.duration + self.config.restore_margin();
        tokio::task::spawn_local(async move {
            tokio::time::sleep(wait).await;
            // A newer glide owns the restore
            let current = glides.borrow().get(&key).map(|g| g.generation);
            if current != Some(generation) {
                return;
            }
            let finished = glides.borrow_mut().remove(&key);
            if let Some(glide) = finished {
                handle.set_animation_params(glide.original);
                debug!(viewer = %key, "Animation parameters restored");
            }
        });
    }
}

fn map_region(home: Rect, region: &Region) -> Rect {
    Rect::new(
        home.x + region.x * home.width,
        home.y + region.y * home.height,
        region.width * home.width,
        region.height * home.height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeViewerHandle, ViewerCommand};
    use tokio::task::LocalSet;

    fn point(x: f64, y: f64, zoom: f64) -> CameraTarget {
        CameraTarget::Point(ViewPoint { x, y, zoom })
    }

    #[test]
    fn test_missing_handle_is_noop() {
        let animator = PositionAnimator::new(AnimationConfig::default());
        assert!(!animator.apply(None, &point(0.5, 0.5, 1.0), MoveMode::Snap));
    }

    #[test]
    fn test_snap_maps_into_home_frame() {
        let animator = PositionAnimator::new(AnimationConfig::default());
        let fake = FakeViewerHandle::new("viewer-instance-1");
        let handle: Rc<dyn ViewerHandle> = fake.clone();

        assert!(animator.apply(Some(&handle), &point(0.5, 0.5, 3.0), MoveMode::Snap));

        // Home bounds are (0, 0, 1, 0.75) at home zoom 2
        let center = Point::new(0.5, 0.375);
        assert_eq!(
            fake.commands(),
            vec![
                ViewerCommand::Pan { center, immediate: true },
                ViewerCommand::Zoom { level: 6.0, immediate: true },
            ]
        );
    }

    #[test]
    fn test_region_uses_fit_bounds() {
        let animator = PositionAnimator::new(AnimationConfig::default());
        let fake = FakeViewerHandle::new("viewer-instance-1");
        let handle: Rc<dyn ViewerHandle> = fake.clone();
        let region = CameraTarget::Region(Region {
            x: 0.5,
            y: 0.0,
            width: 0.5,
            height: 1.0,
        });

        animator.apply(Some(&handle), &region, MoveMode::Snap);

        assert_eq!(
            fake.commands(),
            vec![ViewerCommand::Fit {
                bounds: Rect::new(0.5, 0.0, 0.5, 0.75),
                immediate: true,
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_animate_restores_original_params() {
        LocalSet::new()
            .run_until(async {
                let animator = PositionAnimator::new(AnimationConfig::default());
                let fake = FakeViewerHandle::new("viewer-instance-1");
                let handle: Rc<dyn ViewerHandle> = fake.clone();
                let original = fake.animation_params();

                animator.apply(
                    Some(&handle),
                    &point(0.2, 0.8, 2.0),
                    MoveMode::Animate(GlideProfile::Step),
                );
                assert_eq!(fake.animation_params(), animator.profile_params(GlideProfile::Step));
                assert!(matches!(
                    fake.commands()[0],
                    ViewerCommand::Pan { immediate: false, .. }
                ));

                tokio::time::sleep(Duration::from_millis(4050)).await;
                assert!(animator.is_gliding("viewer-instance-1"));

                tokio::time::sleep(Duration::from_millis(100)).await;
                assert_eq!(fake.animation_params(), original);
                assert!(!animator.is_gliding("viewer-instance-1"));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_glides_keep_first_original() {
        LocalSet::new()
            .run_until(async {
                let animator = PositionAnimator::new(AnimationConfig::default());
                let fake = FakeViewerHandle::new("viewer-instance-1");
                let handle: Rc<dyn ViewerHandle> = fake.clone();
                let original = fake.animation_params();

                animator.apply(
                    Some(&handle),
                    &point(0.5, 0.5, 1.0),
                    MoveMode::Animate(GlideProfile::Scene),
                );
                tokio::time::sleep(Duration::from_secs(1)).await;
                animator.apply(
                    Some(&handle),
                    &point(0.2, 0.2, 2.0),
                    MoveMode::Animate(GlideProfile::Step),
                );

                // Latest glide restores the pre-glide parameters, not the scene ones
                tokio::time::sleep(Duration::from_millis(4200)).await;
                assert_eq!(fake.animation_params(), original);

                // The superseded scene restore stays silent
                fake.set_animation_params(animator.profile_params(GlideProfile::Step));
                tokio::time::sleep(Duration::from_secs(40)).await;
                assert_eq!(
                    fake.animation_params(),
                    animator.profile_params(GlideProfile::Step)
                );
            })
            .await;
    }
}
