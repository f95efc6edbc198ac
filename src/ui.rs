use std::time::Instant;

use editsel::{Effect, OptionId, PanelAnchor};
use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;
use crate::widgets::{
    build_emphasized_text, build_highlighted_text, cursor_column, panel_block,
    push_highlight_cursor, UiColors,
};

/// Where each part of the screen goes for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenLayout {
    pub title: Rect,
    pub input: Rect,
    /// Present while the panel is open and has room for at least one row.
    pub list: Option<Rect>,
    /// Entry rows that fit inside `list`.
    pub list_rows: usize,
    pub help: Rect,
}

/// Split the screen into title bar, input, list panel and help bar.
pub fn compute_layout(area: Rect, app: &App) -> ScreenLayout {
    // Top-level vertical layout:
    //   [title bar]
    //   [input]
    //   [body: list panel anchored to the input or the footer]
    //   [help / event bar]
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(area);
    let body = outer[2];

    let widget = &app.widget;
    let config = widget.config();
    let mut list = None;
    let mut list_rows = 0;

    if widget.is_open() && body.height > 2 {
        let mut rows = widget
            .visible_count()
            .min(config.max_rows)
            .min(body.height as usize - 2);
        if config.effects == Effect::Slide {
            let progress = widget.panel_progress(Instant::now());
            rows = (rows as f32 * progress).ceil() as usize;
        }
        if rows > 0 {
            let height = rows as u16 + 2;
            let y = match config.append_to {
                PanelAnchor::Input => body.y,
                PanelAnchor::Footer => body.y + body.height - height,
            };
            list = Some(Rect::new(body.x, y, body.width, height));
            list_rows = rows;
        }
    }

    ScreenLayout {
        title: outer[0],
        input: outer[1],
        list,
        list_rows,
        help: outer[3],
    }
}

/// Ids of the visible entries shown in a list of `rows` rows, keeping the
/// highlight on screen even when fewer rows fit than the widget expects.
pub fn visible_rows(app: &App, rows: usize) -> Vec<OptionId> {
    let widget = &app.widget;
    let visible: Vec<OptionId> = widget.visible_entries().map(|e| e.id()).collect();

    let mut start = widget.scroll_offset();
    let highlighted_row = widget
        .highlighted()
        .and_then(|id| visible.iter().position(|v| *v == id));
    if let Some(row) = highlighted_row {
        if row >= start + rows {
            start = row + 1 - rows;
        }
        if row < start {
            start = row;
        }
    }
    start = start.min(visible.len().saturating_sub(rows));

    visible.into_iter().skip(start).take(rows).collect()
}

/// Main render function called from the event loop.
pub fn render(frame: &mut Frame, app: &App) {
    let colors = UiColors::from_palette(&app.palette());
    let layout = compute_layout(frame.area(), app);

    render_title(frame, app, layout.title, &colors);
    render_input(frame, app, layout.input, &colors);
    render_help_bar(frame, app, layout.help, &colors);
    if let Some(list) = layout.list {
        render_list(frame, app, list, layout.list_rows, &colors);
    }
}

/// Title bar: program name, source name and the committed value.
fn render_title(frame: &mut Frame, app: &App, area: Rect, colors: &UiColors) {
    let mut spans = vec![Span::styled(
        " editsel",
        Style::default()
            .fg(colors.active_border)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(name) = app.widget.name() {
        spans.push(Span::styled(" ▸ ", Style::default().fg(colors.help)));
        spans.push(Span::styled(name.to_string(), Style::default().fg(colors.text)));
    }
    if let Some(selected) = app.widget.selected() {
        spans.push(Span::styled("  = ", Style::default().fg(colors.help)));
        spans.push(Span::styled(
            selected.text().to_string(),
            Style::default().fg(colors.selected_mark),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(colors.bar_bg));
    frame.render_widget(paragraph, area);
}

fn render_input(frame: &mut Frame, app: &App, area: Rect, colors: &UiColors) {
    let widget = &app.widget;
    let focused = widget.is_focused();
    let title = format!(" {} ", widget.label().unwrap_or("Select"));
    let block = panel_block(title, focused, colors);
    let inner = block.inner(area);

    let line = if widget.input_text().is_empty() {
        Line::from(Span::styled(
            widget.config().placeholder.clone(),
            Style::default()
                .fg(colors.placeholder)
                .add_modifier(Modifier::ITALIC),
        ))
    } else {
        Line::from(Span::styled(
            widget.input_text().to_string(),
            Style::default().fg(colors.text),
        ))
    };
    frame.render_widget(Paragraph::new(line).block(block), area);

    if focused && inner.height > 0 {
        let cursor = cursor_column(widget.input_text(), widget.input_cursor())
            .min(inner.width.saturating_sub(1));
        frame.set_cursor_position(Position::new(inner.x + cursor, inner.y));
    }
}

fn render_list(frame: &mut Frame, app: &App, area: Rect, rows: usize, colors: &UiColors) {
    let widget = &app.widget;
    let title = format!(" {}/{} ", widget.visible_count(), widget.entries().len());
    let block = panel_block(title, widget.is_focused(), colors);

    let items: Vec<ListItem> = visible_rows(app, rows)
        .into_iter()
        .filter_map(|id| widget.entry(id))
        .map(|entry| {
            let is_highlighted = widget.highlighted() == Some(entry.id());
            let mut spans = Vec::new();
            push_highlight_cursor(&mut spans, is_highlighted, colors);

            let base = if entry.is_disabled() {
                Style::default()
                    .fg(colors.disabled)
                    .add_modifier(Modifier::DIM)
            } else if entry.is_transient() {
                Style::default().fg(colors.transient)
            } else {
                Style::default().fg(colors.text)
            };

            match entry.emphasis() {
                Some(range) => spans.extend(build_emphasized_text(
                    entry.text(),
                    range,
                    base,
                    base.add_modifier(Modifier::BOLD),
                )),
                None => {
                    let indices = widget.match_indices(entry.text());
                    spans.extend(build_highlighted_text(
                        entry.text(),
                        &indices,
                        base,
                        base.fg(colors.matched)
                            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                    ));
                }
            }

            if entry.is_selected() {
                spans.push(Span::styled(" ✓", Style::default().fg(colors.selected_mark)));
            }

            let mut item = ListItem::new(Line::from(spans));
            if is_highlighted {
                item = item.style(Style::default().bg(colors.highlight_bg));
            }
            item
        })
        .collect();

    let mut list = List::new(items).block(block);
    if widget.config().effects == Effect::Fade && widget.panel_progress(Instant::now()) < 1.0 {
        list = list.style(Style::default().add_modifier(Modifier::DIM));
    }

    frame.render_widget(Clear, area);
    frame.render_widget(list, area);
}

/// Key hints plus the most recent widget events.
fn render_help_bar(frame: &mut Frame, app: &App, area: Rect, colors: &UiColors) {
    let key = Style::default().fg(colors.active_border);
    let help = Style::default().fg(colors.help);

    let hints = Line::from(vec![
        Span::styled(" ↑↓", key),
        Span::styled(" move  ", help),
        Span::styled("Enter/Tab", key),
        Span::styled(" select  ", help),
        Span::styled("Esc", key),
        Span::styled(" close/quit  ", help),
        Span::styled("F2", key),
        Span::styled(" theme", help),
    ]);

    let log = app.event_log.borrow();
    let events = if log.is_empty() {
        String::new()
    } else {
        format!(" events: {}", log.iter().cloned().collect::<Vec<_>>().join(" › "))
    };
    let events = Line::from(Span::styled(events, help));

    let paragraph = Paragraph::new(vec![hints, events]).style(Style::default().bg(colors.bar_bg));
    frame.render_widget(paragraph, area);
}
