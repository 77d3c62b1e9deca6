//! Easing curves mapping glide progress [0, 1] onto [0, 1].

pub use telar_core::EasingType;

/// Below this stiffness the spring curve degenerates to linear
const MIN_STIFFNESS: f64 = 1e-6;

pub trait EasingTypeExt {
    /// Apply the curve to a progress value. `stiffness` only shapes `Spring`.
    fn apply(&self, t: f64, stiffness: f64) -> f64;
}

impl EasingTypeExt for EasingType {
    #[inline]
    fn apply(&self, t: f64, stiffness: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            EasingType::None => {
                if t < 1.0 {
                    0.0
                } else {
                    1.0
                }
            }
            EasingType::Linear => t,
            EasingType::Cubic => cubic_ease_out(t),
            EasingType::Spring => spring(t, stiffness),
        }
    }
}

/// Cubic ease-out: f(t) = 1 - (1-t)³
#[inline]
fn cubic_ease_out(t: f64) -> f64 {
    let inv = 1.0 - t;
    1.0 - inv * inv * inv
}

/// Normalized exponential spring: f(t) = (1 - e^(-kt)) / (1 - e^(-k))
#[inline]
fn spring(t: f64, stiffness: f64) -> f64 {
    if stiffness.abs() < MIN_STIFFNESS {
        return t;
    }
    (1.0 - (-stiffness * t).exp()) / (1.0 - (-stiffness).exp())
}
