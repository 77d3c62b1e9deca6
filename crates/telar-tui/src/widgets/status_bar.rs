use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, Mode};

pub struct StatusBarWidget;

impl StatusBarWidget {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = &app.theme;
        let mode_str = match app.mode {
            Mode::Normal if app.session.is_panel_open() => " PANEL ",
            Mode::Normal => " STORY ",
            Mode::Help => " HELP ",
        };

        let total = app.session.controller().len();
        let step_str = match app.session.current_step() {
            Some(index) => format!(" Step {}/{} ", index + 1, total),
            None => format!(" Step -/{} ", total),
        };

        let status_text = match (&app.status_message, app.session.active_object()) {
            (Some(msg), _) => format!(" {}", msg),
            (None, Some(object_id)) => {
                format!(" {}", app.session.narrative().object_title(&object_id))
            }
            (None, None) => format!(" {}", app.title()),
        };

        let help_hint = " q:quit j/k:step enter:panel ?:help ";
        let used = mode_str.len() + step_str.chars().count() + status_text.chars().count() + help_hint.len();
        let padding_len = (area.width as usize).saturating_sub(used);

        let bar = Style::default().bg(theme.bg2);
        let line = Line::from(vec![
            Span::styled(
                mode_str,
                Style::default()
                    .fg(theme.bg0)
                    .bg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(step_str, bar.fg(theme.yellow)),
            Span::styled(status_text, bar.fg(theme.fg0)),
            Span::styled(" ".repeat(padding_len), bar),
            Span::styled(help_hint, bar.fg(theme.grey2)),
        ]);

        frame.render_widget(Paragraph::new(line), area);
    }
}
