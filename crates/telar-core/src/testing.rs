//! Recording fakes for the external widgets.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::panel::{LayerKind, OverlayWidget, PanelContent};
use crate::story::ObjectResolver;
use crate::viewer::{AnimationParams, Point, Rect, ViewerHandle, ViewerMount, ViewerWidget};

pub const SAMPLE_PAGE_URL: &str = "https://example.org/telar/stories/story-1/";

/// intro, A at (0.5, 0.5, 1), B at (0.2, 0.8, 2), B again, C, D
pub const SAMPLE_STORY: &str = r#"{
    "title": "Threads",
    "steps": [
        {"step": 0, "question": "Welcome"},
        {"step": 1, "object": "obj-a", "x": 0.5, "y": 0.5, "zoom": 1,
         "layer1_title": "About A", "layer1_text": "<p>A is a loom <img src=\"/img/a.jpg\"></p>",
         "layer2_title": "More on A", "layer2_text":
            "<p>Deep on the <a class=\"glossary-term-link\" data-term-url=\"/glossary/warp/\">warp</a></p>"},
        {"step": 2, "object": "obj-b", "x": 0.2, "y": 0.8, "zoom": 2},
        {"step": 3, "object": "obj-b", "region": "0.1,0.1,0.5,0.5",
         "layer1_text": "<p>Step three</p>", "layer2_text": "<p>Three deeper</p>",
         "layer2_button": "Dig in"},
        {"step": 4, "object": "obj-c", "x": 0.5, "y": 0.5, "zoom": 1},
        {"step": 5, "object": "obj-d", "x": 0.5, "y": 0.5, "zoom": 1}
    ],
    "objects": [
        {"object_id": "obj-a", "title": "Loom"},
        {"object_id": "obj-b", "title": "Textile"},
        {"object_id": "obj-c"},
        {"object_id": "obj-d"}
    ],
    "glossary": [
        {"term_id": "warp", "title": "Warp", "short_definition": "Lengthwise threads",
         "definition": "Threads held in tension on the loom."}
    ]
}"#;

/// Let spawned local tasks run
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Resolves every object to `fake://objects/{id}/`
pub struct FakeResolver;

impl ObjectResolver for FakeResolver {
    fn source_url(&self, object_id: &str) -> String {
        format!("fake://objects/{}/", object_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerCommand {
    Pan { center: Point, immediate: bool },
    Zoom { level: f64, immediate: bool },
    Fit { bounds: Rect, immediate: bool },
}

pub struct FakeViewerHandle {
    container_id: String,
    commands: RefCell<Vec<ViewerCommand>>,
    params: Cell<AnimationParams>,
    destroyed: Cell<bool>,
}

impl FakeViewerHandle {
    pub fn new(container_id: &str) -> Rc<Self> {
        Rc::new(Self {
            container_id: container_id.to_string(),
            commands: RefCell::new(Vec::new()),
            params: Cell::new(AnimationParams::default()),
            destroyed: Cell::new(false),
        })
    }

    pub fn commands(&self) -> Vec<ViewerCommand> {
        self.commands.borrow().clone()
    }

    pub fn clear_commands(&self) {
        self.commands.borrow_mut().clear();
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }
}

impl ViewerHandle for FakeViewerHandle {
    fn container_id(&self) -> &str {
        &self.container_id
    }

    fn pan_to(&self, center: Point, immediate: bool) {
        self.commands
            .borrow_mut()
            .push(ViewerCommand::Pan { center, immediate });
    }

    fn zoom_to(&self, level: f64, _anchor: Option<Point>, immediate: bool) {
        self.commands
            .borrow_mut()
            .push(ViewerCommand::Zoom { level, immediate });
    }

    fn fit_bounds(&self, bounds: Rect, immediate: bool) {
        self.commands
            .borrow_mut()
            .push(ViewerCommand::Fit { bounds, immediate });
    }

    fn home_zoom(&self) -> f64 {
        2.0
    }

    fn home_bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, 1.0, 0.75)
    }

    fn animation_params(&self) -> AnimationParams {
        self.params.get()
    }

    fn set_animation_params(&self, params: AnimationParams) {
        self.params.set(params);
    }

    fn destroy(&self) {
        self.destroyed.set(true);
    }
}

struct FakeMount {
    source_url: String,
    handle: Rc<FakeViewerHandle>,
    ready: Option<oneshot::Sender<()>>,
}

/// Viewer widget whose ready signals fire only on demand
#[derive(Default)]
pub struct FakeViewerWidget {
    mounts: RefCell<Vec<FakeMount>>,
}

impl FakeViewerWidget {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    fn matches(mount: &FakeMount, object_id: &str) -> bool {
        mount.source_url.contains(&format!("/{}/", object_id))
    }

    /// Fire the ready signal of the latest mount for `object_id`
    pub fn fire_ready(&self, object_id: &str) -> bool {
        let mut mounts = self.mounts.borrow_mut();
        match mounts
            .iter_mut()
            .rev()
            .find(|m| Self::matches(m, object_id))
            .and_then(|m| m.ready.take())
        {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    /// Latest handle mounted for `object_id`
    pub fn handle_for(&self, object_id: &str) -> Option<Rc<FakeViewerHandle>> {
        self.mounts
            .borrow()
            .iter()
            .rev()
            .find(|m| Self::matches(m, object_id))
            .map(|m| Rc::clone(&m.handle))
    }

    pub fn mount_count(&self, object_id: &str) -> usize {
        self.mounts
            .borrow()
            .iter()
            .filter(|m| Self::matches(m, object_id))
            .count()
    }

    pub fn total_mounts(&self) -> usize {
        self.mounts.borrow().len()
    }
}

impl ViewerWidget for FakeViewerWidget {
    fn create(&self, container_id: &str, source_url: &str) -> ViewerMount {
        let handle = FakeViewerHandle::new(container_id);
        let (tx, rx) = oneshot::channel();
        self.mounts.borrow_mut().push(FakeMount {
            source_url: source_url.to_string(),
            handle: Rc::clone(&handle),
            ready: Some(tx),
        });
        ViewerMount { handle, ready: rx }
    }
}

/// Overlay that records shows and hides immediately
#[derive(Default)]
pub struct FakeOverlay {
    shown: RefCell<HashSet<LayerKind>>,
    shows: RefCell<Vec<(LayerKind, PanelContent)>>,
}

impl FakeOverlay {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn last_shown(&self) -> Option<(LayerKind, PanelContent)> {
        self.shows.borrow().last().cloned()
    }
}

impl OverlayWidget for FakeOverlay {
    fn show(&self, kind: LayerKind, content: &PanelContent) {
        self.shown.borrow_mut().insert(kind);
        self.shows.borrow_mut().push((kind, content.clone()));
    }

    fn hide(&self, kind: LayerKind) {
        self.shown.borrow_mut().remove(&kind);
    }

    fn is_shown(&self, kind: LayerKind) -> bool {
        self.shown.borrow().contains(&kind)
    }
}
