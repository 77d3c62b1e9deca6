mod controller;
mod input;
mod state;

pub use controller::StepController;
pub use input::{NavKey, WheelOutcome};
pub use state::{Direction, NavigationState, SharedNavigation, StepVisual, TransitionPhase};
