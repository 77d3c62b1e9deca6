mod models;
mod narrative;
mod parse;
mod resolver;

pub use models::{
    CameraTarget, GlossaryTerm, LayerContent, ObjectRecord, Region, Step, StepRecord, StoryData,
    ViewPoint,
};
pub use narrative::{Narrative, StoryIssue};
pub use parse::{parse_region, parse_target, TargetProblem};
pub use resolver::{ManifestResolver, ObjectResolver};
