use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use tracing::warn;

use super::popup::centered_rect;
use crate::app::App;

/// Overlay panel drawn over the stage area
pub struct PanelWidget;

impl PanelWidget {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let Some((_, content)) = app.overlay.top() else {
            return;
        };
        let theme = &app.theme;

        let width = (area.width / 10 * 9).max(24).min(area.width);
        let height = (area.height / 10 * 8).max(6).min(area.height);
        let popup_area = centered_rect(width, height, area);
        frame.render_widget(Clear, popup_area);

        let trail: Vec<&str> = app
            .session
            .panels()
            .entries()
            .iter()
            .map(|entry| entry.kind.default_title())
            .collect();

        let block = Block::default()
            .title(format!(" {} ", content.title))
            .title_bottom(
                Line::from(format!(" {} ", trail.join(" › "))).alignment(Alignment::Right),
            )
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.accent))
            .style(Style::default().bg(theme.bg1));
        let inner = block.inner(popup_area);

        let text = html_to_text(&content.html, inner.width as usize);
        let mut lines: Vec<Line> = text
            .lines()
            .map(|line| Line::from(Span::styled(line.to_string(), Style::default().fg(theme.fg0))))
            .collect();
        if !content.glossary_links.is_empty() {
            let terms: Vec<String> = content
                .glossary_links
                .iter()
                .take(9)
                .enumerate()
                .map(|(i, link)| format!("[{}] {}", i + 1, link.label))
                .collect();
            lines.push(Line::default());
            lines.push(Line::from(vec![
                Span::styled("terms: ", Style::default().fg(theme.grey1)),
                Span::styled(terms.join("  "), Style::default().fg(theme.yellow)),
            ]));
        }
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "esc:back  d:deeper  1-9:term  x:close",
            Style::default().fg(theme.grey1),
        )));

        let paragraph = Paragraph::new(lines)
            .block(block)
            .scroll((app.panel_scroll, 0));
        frame.render_widget(paragraph, popup_area);
    }
}

/// Render panel HTML as wrapped plain text
pub fn html_to_text(html: &str, width: usize) -> String {
    match html2text::from_read(html.as_bytes(), width.max(10)) {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to render panel HTML: {}", e);
            html.to_string()
        }
    }
}
