use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Rectangle},
        Block, Borders, Paragraph,
    },
    Frame,
};
use telar_core::viewer::{CardVisual, Readiness};

use super::popup::truncate_str;
use crate::app::App;
use crate::viewer::HOME_BOUNDS;

/// Viewer stage: the front card's camera over its image, plus the pool
pub struct StageWidget;

impl StageWidget {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = &app.theme;
        let front = app.front_card();
        let title = match &front {
            Some(card) => format!(" {} ", app.session.narrative().object_title(&card.object_id)),
            None => " Stage ".to_string(),
        };

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.grey0))
            .style(Style::default().bg(theme.bg0));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // Image
                Constraint::Length(1), // Camera
                Constraint::Length(1), // Pool
            ])
            .split(inner);

        match app.front_viewer() {
            Some(viewer) => {
                let visible = viewer.visible_rect();
                let frame_color = theme.grey1;
                let view_color = if viewer.is_ready() { theme.accent } else { theme.loading };
                // Canvas y grows upwards, image y grows downwards
                let flipped_y = HOME_BOUNDS.height - (visible.y + visible.height);
                let canvas = Canvas::default()
                    .marker(Marker::Braille)
                    .x_bounds([HOME_BOUNDS.x, HOME_BOUNDS.x + HOME_BOUNDS.width])
                    .y_bounds([HOME_BOUNDS.y, HOME_BOUNDS.y + HOME_BOUNDS.height])
                    .paint(move |ctx| {
                        ctx.draw(&Rectangle {
                            x: HOME_BOUNDS.x,
                            y: HOME_BOUNDS.y,
                            width: HOME_BOUNDS.width,
                            height: HOME_BOUNDS.height,
                            color: frame_color,
                        });
                        ctx.draw(&Rectangle {
                            x: visible.x,
                            y: flipped_y,
                            width: visible.width,
                            height: visible.height,
                            color: view_color,
                        });
                    });
                frame.render_widget(canvas, rows[0]);

                let camera = viewer.camera();
                let state = if viewer.is_ready() { "ready" } else { "loading" };
                let info = format!(
                    "center {:.2}, {:.2}  zoom {:.2}x  {}{}",
                    camera.center.x,
                    camera.center.y,
                    camera.zoom,
                    state,
                    if viewer.is_gliding() { "  gliding" } else { "" },
                );
                frame.render_widget(
                    Paragraph::new(Span::styled(info, Style::default().fg(theme.grey2))),
                    rows[1],
                );
            }
            None => {
                let intro = Paragraph::new(vec![
                    Line::default(),
                    Line::from(Span::styled(
                        app.title().to_string(),
                        Style::default().fg(theme.fg1).add_modifier(Modifier::BOLD),
                    )),
                ])
                .alignment(Alignment::Center);
                frame.render_widget(intro, rows[0]);
            }
        }

        frame.render_widget(Paragraph::new(Self::pool_line(app)), rows[2]);
    }

    /// One marker per pooled card: visual state and readiness
    fn pool_line(app: &App) -> Line<'static> {
        let theme = &app.theme;
        let mut cards = app.session.pool().cards();
        cards.sort_by_key(|card| card.z_order);

        let mut spans = vec![Span::styled(
            format!("pool {}/{} ", cards.len(), app.session.pool().capacity()),
            Style::default().fg(theme.grey1),
        )];
        for card in cards {
            let symbol = match card.visual {
                CardVisual::Active => "■",
                CardVisual::Offscreen => "□",
                CardVisual::HiddenTransient => "◌",
            };
            let color = match card.readiness {
                Readiness::Ready => theme.ready,
                Readiness::Initializing => theme.loading,
            };
            spans.push(Span::styled(
                format!("{} {} ", symbol, truncate_str(&card.object_id, 12)),
                Style::default().fg(color),
            ));
        }
        Line::from(spans)
    }
}
