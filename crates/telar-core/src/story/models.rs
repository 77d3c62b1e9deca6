use serde::{Deserialize, Serialize};

/// Camera framing as a point and a zoom relative to the viewer's fit ("home") zoom.
/// Coordinates are normalized to [0, 1] across the image's home bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewPoint {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

/// Normalized rectangle framed with the viewer's fit-to-bounds operation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Where a step points the camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraTarget {
    Point(ViewPoint),
    Region(Region),
}

impl std::fmt::Display for CameraTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraTarget::Point(p) => write!(f, "x={} y={} zoom={}", p.x, p.y, p.zoom),
            CameraTarget::Region(r) => {
                write!(f, "region={},{},{},{}", r.x, r.y, r.width, r.height)
            }
        }
    }
}

/// Overlay content of one layer of a step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerContent {
    pub title: Option<String>,
    /// HTML produced by the markdown pipeline
    pub text: Option<String>,
    pub media_url: Option<String>,
    /// Label of the trigger that opens the next layer
    pub button_label: Option<String>,
}

impl LayerContent {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.text.is_none() && self.media_url.is_none()
    }
}

/// One narrative unit. Immutable once the narrative is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// 0-based position in the sequence
    pub index: usize,
    /// Content id used by panel triggers (the `step` column)
    pub content_id: String,
    pub object_id: Option<String>,
    pub question: Option<String>,
    pub answer: Option<String>,
    pub target: Option<CameraTarget>,
    pub layer1: Option<LayerContent>,
    pub layer2: Option<LayerContent>,
}

impl Step {
    /// The distinguished opening step that shows no object
    pub fn is_intro(&self) -> bool {
        self.index == 0 && self.object_id.is_none()
    }
}

/// Raw step row as exported from the story spreadsheet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepRecord {
    #[serde(default)]
    pub step: Option<serde_json::Value>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub x: Option<serde_json::Value>,
    #[serde(default)]
    pub y: Option<serde_json::Value>,
    #[serde(default)]
    pub zoom: Option<serde_json::Value>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub layer1_title: Option<String>,
    #[serde(default)]
    pub layer1_text: Option<String>,
    #[serde(default)]
    pub layer1_media: Option<String>,
    #[serde(default)]
    pub layer2_title: Option<String>,
    #[serde(default)]
    pub layer2_text: Option<String>,
    #[serde(default)]
    pub layer2_media: Option<String>,
    #[serde(default)]
    pub layer2_button: Option<String>,
}

/// Object metadata row
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub object_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// External manifest; blank means "use the locally generated one"
    #[serde(default)]
    pub iiif_manifest: Option<String>,
}

/// Glossary row
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlossaryTerm {
    pub term_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub short_definition: Option<String>,
    #[serde(default)]
    pub definition: Option<String>,
}

/// Whole story document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "firstObject")]
    pub first_object: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepRecord>,
    #[serde(default)]
    pub objects: Vec<ObjectRecord>,
    #[serde(default)]
    pub glossary: Vec<GlossaryTerm>,
}
