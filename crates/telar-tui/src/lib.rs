pub mod app;
pub mod camera;
pub mod event;
pub mod input;
pub mod overlay;
pub mod theme;
pub mod viewer;
pub mod widgets;

pub use app::App;
pub use theme::Theme;
