mod animator;
mod card;
mod pool;
mod widget;

pub use animator::{GlideProfile, MoveMode, PositionAnimator};
pub use card::{CardId, CardSnapshot, CardVisual, PendingMove, Readiness, ViewerCard};
pub use pool::{MoveOutcome, ViewerCardPool};
pub use widget::{AnimationParams, Point, Rect, ViewerHandle, ViewerMount, ViewerWidget};
