use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub panels: PanelConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            site: SiteConfig::default(),
            viewer: ViewerConfig::default(),
            animation: AnimationConfig::default(),
            navigation: NavigationConfig::default(),
            panels: PanelConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path (log file lives here)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// URL of the page the story is served from.
    /// Local manifests and site-relative media are resolved against it.
    #[serde(default = "default_page_url")]
    pub page_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            page_url: default_page_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Maximum number of live viewer cards
    #[serde(default = "default_max_cards")]
    pub max_cards: usize,
    /// Ceiling for waiting on a card to become ready before showing it anyway
    #[serde(default = "default_ready_timeout")]
    pub ready_timeout_ms: u64,
    /// Steps ahead of the current one whose cards are created early
    #[serde(default = "default_preload_ahead")]
    pub preload_ahead: usize,
    /// Steps behind the current one whose cards are created early
    #[serde(default = "default_preload_behind")]
    pub preload_behind: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            max_cards: default_max_cards(),
            ready_timeout_ms: default_ready_timeout(),
            preload_ahead: default_preload_ahead(),
            preload_behind: default_preload_behind(),
        }
    }
}

impl ViewerConfig {
    /// Pool capacity. Never below 2: the front card and a new card must fit together.
    pub fn capacity(&self) -> usize {
        self.max_cards.max(2)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Glide duration for scene-level moves
    #[serde(default = "default_scene_duration")]
    pub scene_duration_ms: u64,
    #[serde(default = "default_scene_stiffness")]
    pub scene_spring_stiffness: f64,
    /// Glide duration for same-card repositioning during step navigation
    #[serde(default = "default_step_duration")]
    pub step_duration_ms: u64,
    #[serde(default = "default_step_stiffness")]
    pub step_spring_stiffness: f64,
    /// Extra wait after a glide before the viewer's own parameters come back
    #[serde(default = "default_restore_margin")]
    pub restore_margin_ms: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            scene_duration_ms: default_scene_duration(),
            scene_spring_stiffness: default_scene_stiffness(),
            step_duration_ms: default_step_duration(),
            step_spring_stiffness: default_step_stiffness(),
            restore_margin_ms: default_restore_margin(),
        }
    }
}

impl AnimationConfig {
    pub fn restore_margin(&self) -> Duration {
        Duration::from_millis(self.restore_margin_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Duration of the visual step transition
    #[serde(default = "default_transition_duration")]
    pub transition_duration_ms: u64,
    /// Added to the transition duration to form the step cooldown window
    #[serde(default = "default_cooldown_margin")]
    pub cooldown_margin_ms: u64,
    /// Wheel threshold as a fraction of the viewport height
    #[serde(default = "default_wheel_threshold_ratio")]
    pub wheel_threshold_ratio: f64,
    /// Largest magnitude a single wheel event may contribute
    #[serde(default = "default_max_wheel_delta")]
    pub max_wheel_delta: f64,
    /// Initial viewport height, updated on resize
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            transition_duration_ms: default_transition_duration(),
            cooldown_margin_ms: default_cooldown_margin(),
            wheel_threshold_ratio: default_wheel_threshold_ratio(),
            max_wheel_delta: default_max_wheel_delta(),
            viewport_height: default_viewport_height(),
        }
    }
}

impl NavigationConfig {
    pub fn step_cooldown(&self) -> Duration {
        Duration::from_millis(self.transition_duration_ms + self.cooldown_margin_ms)
    }

    pub fn wheel_threshold(&self, viewport_height: f64) -> f64 {
        (viewport_height * self.wheel_threshold_ratio).max(1.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Continuous scrolling for this long while a panel is open closes every panel
    #[serde(default = "default_scroll_close_idle")]
    pub scroll_close_idle_ms: u64,
    /// Wait after a hide request before checking whether any layer is still shown
    #[serde(default = "default_hide_settle")]
    pub hide_settle_ms: u64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            scroll_close_idle_ms: default_scroll_close_idle(),
            hide_settle_ms: default_hide_settle(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Tick rate in milliseconds
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,
    /// Redraw rate while the terminal front-end is running
    #[serde(default = "default_animation_fps")]
    pub animation_fps: u32,
    /// Simulated mount latency of the terminal viewer
    #[serde(default = "default_viewer_ready_delay")]
    pub viewer_ready_delay_ms: u64,
    /// Easing used by the terminal viewer camera
    #[serde(default)]
    pub camera_easing: EasingType,
    /// Wheel units contributed by one terminal scroll notch
    #[serde(default = "default_wheel_line_delta")]
    pub wheel_line_delta: f64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: default_tick_rate(),
            animation_fps: default_animation_fps(),
            viewer_ready_delay_ms: default_viewer_ready_delay(),
            camera_easing: EasingType::default(),
            wheel_line_delta: default_wheel_line_delta(),
        }
    }
}

/// Camera easing curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EasingType {
    /// Jump to the end at completion
    None,
    Linear,
    Cubic,
    /// Exponential spring driven by the viewer's stiffness
    #[default]
    Spring,
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("telar")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_page_url() -> String {
    "http://localhost:4000/stories/story/".to_string()
}

fn default_max_cards() -> usize {
    4 // front card + two ahead + one behind
}

fn default_ready_timeout() -> u64 {
    5000
}

fn default_preload_ahead() -> usize {
    2
}

fn default_preload_behind() -> usize {
    1
}

fn default_scene_duration() -> u64 {
    36_000
}

fn default_scene_stiffness() -> f64 {
    0.8
}

fn default_step_duration() -> u64 {
    4_000
}

fn default_step_stiffness() -> f64 {
    1.2
}

fn default_restore_margin() -> u64 {
    100
}

fn default_transition_duration() -> u64 {
    600
}

fn default_cooldown_margin() -> u64 {
    200
}

fn default_wheel_threshold_ratio() -> f64 {
    0.25
}

fn default_max_wheel_delta() -> f64 {
    100.0
}

fn default_viewport_height() -> f64 {
    800.0
}

fn default_scroll_close_idle() -> u64 {
    300
}

fn default_hide_settle() -> u64 {
    350
}

fn default_tick_rate() -> u64 {
    50
}

fn default_animation_fps() -> u32 {
    30
}

fn default_viewer_ready_delay() -> u64 {
    1200
}

fn default_wheel_line_delta() -> f64 {
    40.0
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from the default location or return defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path; a missing file yields defaults
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
        } else {
            Ok(Self::default())
        }
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Get the configuration file path
    /// Always uses ~/.config/telar/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("telar")
            .join("config.toml")
    }

    /// Get the log file path used while the terminal front-end owns the screen
    pub fn log_path(&self) -> PathBuf {
        self.data_dir().join("telar.log")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }
}
