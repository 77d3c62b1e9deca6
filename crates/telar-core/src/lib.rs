pub mod config;
pub mod error;
pub mod events;
pub mod navigation;
pub mod panel;
pub mod session;
pub mod story;
pub mod viewer;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{AppConfig, EasingType};
pub use error::{Error, Result};
pub use events::{EventSink, SessionEvent};
pub use session::Session;
