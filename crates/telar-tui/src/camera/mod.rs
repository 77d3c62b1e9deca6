//! Eased camera for the terminal viewer.
//!
//! - `easing` - easing curves, including the spring used for story glides
//! - `timing` - progress and interpolation helpers
//! - `glide` - the camera controller combining both

pub mod easing;
pub mod glide;
pub mod timing;

pub use easing::{EasingType, EasingTypeExt};
pub use glide::{fit_zoom, Camera, CameraState};
