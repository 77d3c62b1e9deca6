use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, Mode};

/// Input action that can be performed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Quit,
    NextStep,
    PrevStep,
    FirstStep,
    LastStep,
    /// Raw wheel delta, positive scrolls forward
    Wheel(f64),
    OpenPanel,
    GoDeeper,
    /// Open the nth glossary term linked from the top panel
    OpenGlossary(usize),
    PanelBack,
    CloseAllPanels,
    ScrollPanelDown,
    ScrollPanelUp,
    ToggleHelp,
    ExitMode,
    None,
}

/// Handle a key event and return the corresponding action
pub fn handle_key_event(key: KeyEvent, app: &App) -> Action {
    if app.mode == Mode::Help {
        // Any key exits help
        return Action::ExitMode;
    }
    map_key(key)
}

/// Normal mode keybindings
pub fn map_key(key: KeyEvent) -> Action {
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) => Action::Quit,
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Action::Quit,

        (KeyCode::Char('j'), KeyModifiers::NONE) => Action::NextStep,
        (KeyCode::Down, _) => Action::NextStep,
        (KeyCode::Char(' '), _) => Action::NextStep,
        (KeyCode::PageDown, _) => Action::NextStep,
        (KeyCode::Char('k'), KeyModifiers::NONE) => Action::PrevStep,
        (KeyCode::Up, _) => Action::PrevStep,
        (KeyCode::PageUp, _) => Action::PrevStep,
        (KeyCode::Char('g'), KeyModifiers::NONE) => Action::FirstStep,
        (KeyCode::Home, _) => Action::FirstStep,
        (KeyCode::Char('G'), _) => Action::LastStep,
        (KeyCode::End, _) => Action::LastStep,

        (KeyCode::Enter, _) => Action::OpenPanel,
        (KeyCode::Char('d'), KeyModifiers::NONE) => Action::GoDeeper,
        (KeyCode::Char(c @ '1'..='9'), KeyModifiers::NONE) => {
            Action::OpenGlossary(c as usize - '1' as usize)
        }
        (KeyCode::Esc, _) => Action::PanelBack,
        (KeyCode::Backspace, _) => Action::PanelBack,
        (KeyCode::Char('x'), KeyModifiers::NONE) => Action::CloseAllPanels,
        (KeyCode::Char('d'), KeyModifiers::CONTROL) => Action::ScrollPanelDown,
        (KeyCode::Char('u'), KeyModifiers::CONTROL) => Action::ScrollPanelUp,

        (KeyCode::Char('?'), _) => Action::ToggleHelp,
        _ => Action::None,
    }
}

/// Map a mouse event. One wheel notch contributes `line_delta` units.
pub fn handle_mouse_event(mouse: MouseEvent, line_delta: f64) -> Action {
    match mouse.kind {
        MouseEventKind::ScrollDown => Action::Wheel(line_delta),
        MouseEventKind::ScrollUp => Action::Wheel(-line_delta),
        _ => Action::None,
    }
}
