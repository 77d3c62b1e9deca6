mod narrative;
mod panel;
mod popup;
mod stage;
mod status_bar;

pub use narrative::NarrativeWidget;
pub use panel::{html_to_text, PanelWidget};
pub use popup::{centered_rect, truncate_str, PopupWidget};
pub use stage::StageWidget;
pub use status_bar::StatusBarWidget;
