use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};
use telar_core::navigation::StepVisual;

use crate::app::App;

/// Narrative column: one entry per step, the current one expanded
pub struct NarrativeWidget;

impl NarrativeWidget {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = &app.theme;
        let controller = app.session.controller();
        let narrative = app.session.narrative();
        let current = controller.current_step();
        let texts = controller.step_texts();
        let text_width = area.width.saturating_sub(7) as usize;

        let items: Vec<ListItem> = narrative
            .steps()
            .iter()
            .map(|step| {
                let is_current = current == Some(step.index);
                let visual = texts.get(step.index).copied().unwrap_or_default();
                let question_style = match visual {
                    StepVisual::Active => Style::default()
                        .fg(theme.active)
                        .add_modifier(Modifier::BOLD),
                    StepVisual::Inactive => Style::default().fg(theme.inactive),
                };
                let question = step.question.as_deref().unwrap_or(if step.is_intro() {
                    "Introduction"
                } else {
                    "Untitled step"
                });

                let mut lines = vec![Line::from(vec![
                    Span::styled(
                        if is_current { "▶ " } else { "  " },
                        Style::default().fg(theme.accent),
                    ),
                    Span::styled(format!("{:>2}  ", step.index), Style::default().fg(theme.grey0)),
                    Span::styled(question.to_string(), question_style),
                ])];

                if let Some(object_id) = &step.object_id {
                    lines.push(Line::from(Span::styled(
                        format!("      {}", narrative.object_title(object_id)),
                        Style::default().fg(theme.grey1),
                    )));
                }
                if is_current {
                    if let Some(answer) = &step.answer {
                        for row in wrap_words(answer, text_width) {
                            lines.push(Line::from(Span::styled(
                                format!("      {}", row),
                                Style::default().fg(theme.fg0),
                            )));
                        }
                    }
                }
                ListItem::new(lines)
            })
            .collect();

        let block = Block::default()
            .title(format!(" {} ", app.title()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.grey0))
            .style(Style::default().bg(theme.bg0));

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(theme.selection));

        let mut state = ListState::default();
        state.select(current);
        frame.render_stateful_widget(list, area, &mut state);
    }
}

/// Greedy word wrap; words longer than `width` get their own row
fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let width = width.max(10);
    let mut rows = Vec::new();
    let mut row = String::new();
    for word in text.split_whitespace() {
        if !row.is_empty() && row.chars().count() + 1 + word.chars().count() > width {
            rows.push(std::mem::take(&mut row));
        }
        if !row.is_empty() {
            row.push(' ');
        }
        row.push_str(word);
    }
    if !row.is_empty() {
        rows.push(row);
    }
    rows
}
