//! Rendering
//!
//! Three stacked areas: the scrollable list, one overlay line for the
//! loading / end / error regions, and a status bar.

use infiniscroll_core::{Phase, Region};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;

/// Overlay regions in display priority order
const OVERLAYS: [Region; 3] = [Region::Error, Region::Loading, Region::End];

pub fn render(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    let list_block = Block::default()
        .borders(Borders::ALL)
        .title(" infiniscroll ");
    let inner = list_block.inner(chunks[0]);
    app.set_viewport_rows(inner.height);
    f.render_widget(list_block, chunks[0]);

    render_list(f, inner, app);
    render_overlay(f, chunks[1], app);
    render_status_bar(f, chunks[2], app);
}

fn render_list(f: &mut Frame, area: Rect, app: &App) {
    let geometry = app.coordinator.platform().geometry();
    let start = geometry.offset as usize;
    let end = start.saturating_add(area.height as usize);

    let mut lines: Vec<Line> = app
        .items
        .iter()
        .enumerate()
        .skip(start)
        .take(area.height as usize)
        .map(|(index, item)| {
            Line::from(vec![
                Span::styled(
                    format!("{:>5} ", index + 1),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(item.as_str()),
            ])
        })
        .collect();

    let sentinel_row = app.items.len();
    if geometry.sentinel_shown && sentinel_row >= start && sentinel_row < end {
        lines.push(Line::from(Span::styled(
            "      ┄┄┄",
            Style::default().fg(Color::DarkGray),
        )));
    }

    f.render_widget(Paragraph::new(lines), area);
}

fn render_overlay(f: &mut Frame, area: Rect, app: &App) {
    let presentation = app.coordinator.presentation();
    let shell = app.coordinator.shell();

    let Some(region) = OVERLAYS
        .into_iter()
        .find(|region| presentation.is_visible(*region))
    else {
        return;
    };
    let Some(text) = shell.overlay_text(region) else {
        return;
    };

    let line = match region {
        Region::Error => {
            let mut spans = vec![Span::styled(
                format!(" {text}"),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )];
            if let Some(detail) = &app.last_error {
                spans.push(Span::styled(
                    format!(" ({detail})"),
                    Style::default().fg(Color::Red),
                ));
            }
            spans.push(Span::styled(
                "  r to retry",
                Style::default().fg(Color::DarkGray),
            ));
            Line::from(spans)
        }
        Region::Loading => Line::from(Span::styled(
            format!(" {text}"),
            Style::default().fg(Color::Yellow),
        )),
        _ => Line::from(Span::styled(
            format!(" {text}"),
            Style::default().fg(Color::DarkGray),
        )),
    };
    f.render_widget(Paragraph::new(line), area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let coordinator = &app.coordinator;
    let config = coordinator.config();

    let phase_color = match coordinator.phase() {
        Phase::Ready => Color::Green,
        Phase::Loading => Color::Yellow,
        Phase::Exhausted => Color::Blue,
        Phase::Error => Color::Red,
    };
    let toggle = |enabled: bool| if enabled { "on" } else { "off" };
    let dim = Style::default().fg(Color::DarkGray);

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", coordinator.phase()),
            Style::default().fg(phase_color).add_modifier(Modifier::BOLD),
        ),
        Span::styled("│ ", dim),
        Span::raw(format!("{} items ", app.items.len())),
        Span::styled("│ ", dim),
        Span::raw(format!("{} loads ", coordinator.dispatched())),
        Span::styled("│ ", dim),
        Span::raw(format!("threshold {} ", config.threshold)),
        Span::styled("│ ", dim),
        Span::raw(format!(
            "observer {} scroll {} ",
            toggle(coordinator.observer().is_some()),
            toggle(coordinator.subscription().is_some()),
        )),
        Span::styled("│ q quit  g top  R reset  i/s toggle  +/- threshold", dim),
    ]);
    f.render_widget(Paragraph::new(line), area);
}
