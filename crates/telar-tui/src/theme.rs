use ratatui::style::Color;

/// Colors used by the widgets. Defaults to Gruvbox Material dark.
#[derive(Debug, Clone)]
pub struct Theme {
    // Background colors
    pub bg0: Color,
    pub bg1: Color,
    pub bg2: Color,

    // Foreground colors
    pub fg0: Color,
    pub fg1: Color,
    pub grey0: Color,
    pub grey1: Color,
    pub grey2: Color,

    // Palette colors
    pub yellow: Color,

    // Semantic colors
    pub selection: Color,
    /// Step text that is currently active
    pub active: Color,
    /// Step text that is inactive
    pub inactive: Color,
    pub ready: Color,
    pub loading: Color,
    pub accent: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            bg0: Color::Rgb(0x28, 0x28, 0x28),
            bg1: Color::Rgb(0x32, 0x30, 0x2f),
            bg2: Color::Rgb(0x45, 0x40, 0x3d),
            fg0: Color::Rgb(0xd4, 0xbe, 0x98),
            fg1: Color::Rgb(0xdd, 0xc7, 0xa1),
            grey0: Color::Rgb(0x7c, 0x6f, 0x64),
            grey1: Color::Rgb(0x92, 0x83, 0x74),
            grey2: Color::Rgb(0xa8, 0x99, 0x84),
            yellow: Color::Rgb(0xd8, 0xa6, 0x57),
            selection: Color::Rgb(0x45, 0x40, 0x3d),
            active: Color::Rgb(0xdd, 0xc7, 0xa1),
            inactive: Color::Rgb(0x7c, 0x6f, 0x64),
            ready: Color::Rgb(0xa9, 0xb6, 0x65),
            loading: Color::Rgb(0xe7, 0x8a, 0x4e),
            accent: Color::Rgb(0x89, 0xb4, 0x82),
        }
    }
}
