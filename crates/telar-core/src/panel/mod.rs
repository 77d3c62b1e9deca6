mod content;
mod scroll_lock;
mod stack;

pub use content::{glossary_links, resolve_panel_content, GlossaryLink, PanelContent, NO_CONTENT_HTML};
pub use scroll_lock::ScrollLock;
pub use stack::{LayerKind, OverlayWidget, PanelEntry, PanelStack};
