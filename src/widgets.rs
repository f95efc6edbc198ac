//! Styling helpers shared by the input and list renderers.

use std::ops::Range;

use ratatui::{
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Padding},
};
use ratatui_themes::ThemePalette;
use unicode_width::UnicodeWidthStr;

/// Semantic color palette derived from the active theme.
/// Maps abstract UI roles to concrete `Color` values.
pub struct UiColors {
    pub text: Color,
    pub placeholder: Color,
    pub matched: Color,
    pub transient: Color,
    pub selected_mark: Color,
    pub disabled: Color,
    pub help: Color,
    pub active_border: Color,
    pub inactive_border: Color,
    pub highlight_bg: Color,
    pub bg: Color,
    pub bar_bg: Color,
}

impl UiColors {
    pub fn from_palette(p: &ThemePalette) -> Self {
        let bar_bg = match p.bg {
            Color::Rgb(r, g, b) => Color::Rgb(
                r.saturating_add(10),
                g.saturating_add(10),
                b.saturating_add(15),
            ),
            _ => Color::Rgb(30, 30, 40),
        };

        let highlight_bg = match p.selection {
            Color::Rgb(r, g, b) => Color::Rgb(r, g, b),
            _ => Color::Rgb(40, 40, 60),
        };

        Self {
            text: p.fg,
            placeholder: p.muted,
            matched: p.accent,
            transient: p.success,
            selected_mark: p.info,
            disabled: p.muted,
            help: p.muted,
            active_border: p.accent,
            inactive_border: p.muted,
            highlight_bg,
            bg: p.bg,
            bar_bg,
        }
    }
}

/// Build a bordered `Block` with the active/inactive border color.
pub fn panel_block(title: String, focused: bool, colors: &UiColors) -> Block<'static> {
    let border_color = if focused {
        colors.active_border
    } else {
        colors.inactive_border
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title)
        .title_style(Style::default().fg(border_color).add_modifier(Modifier::BOLD))
        .padding(Padding::horizontal(1))
}

/// Push the highlight cursor indicator (`▶ ` or `  `) onto spans.
pub fn push_highlight_cursor(spans: &mut Vec<Span<'static>>, is_highlighted: bool, colors: &UiColors) {
    if is_highlighted {
        spans.push(Span::styled(
            "▶ ",
            Style::default()
                .fg(colors.active_border)
                .add_modifier(Modifier::BOLD),
        ));
    } else {
        spans.push(Span::raw("  "));
    }
}

/// Terminal column of the cursor after `cursor` chars of `text`.
pub fn cursor_column(text: &str, cursor: usize) -> u16 {
    let end = text
        .char_indices()
        .nth(cursor)
        .map_or(text.len(), |(index, _)| index);
    u16::try_from(text[..end].width()).unwrap_or(u16::MAX)
}

/// Split `text` into spans, styling the characters at `indices` (character
/// positions, sorted) with `highlight_style`.
pub fn build_highlighted_text(
    text: &str,
    indices: &[u32],
    normal_style: Style,
    highlight_style: Style,
) -> Vec<Span<'static>> {
    if indices.is_empty() {
        return vec![Span::styled(text.to_string(), normal_style)];
    }

    let mut spans = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut last_idx = 0;

    for &match_idx in indices {
        let idx = match_idx as usize;
        if idx >= chars.len() {
            continue;
        }

        if last_idx < idx {
            let before: String = chars[last_idx..idx].iter().collect();
            spans.push(Span::styled(before, normal_style));
        }

        spans.push(Span::styled(chars[idx].to_string(), highlight_style));
        last_idx = idx + 1;
    }

    if last_idx < chars.len() {
        let after: String = chars[last_idx..].iter().collect();
        spans.push(Span::styled(after, normal_style));
    }

    spans
}

/// Split `text` around a byte range rendered with `emphasis_style`.
pub fn build_emphasized_text(
    text: &str,
    emphasis: Range<usize>,
    normal_style: Style,
    emphasis_style: Style,
) -> Vec<Span<'static>> {
    let (Some(before), Some(middle), Some(after)) = (
        text.get(..emphasis.start),
        text.get(emphasis.clone()),
        text.get(emphasis.end..),
    ) else {
        return vec![Span::styled(text.to_string(), normal_style)];
    };

    [
        (before, normal_style),
        (middle, emphasis_style),
        (after, normal_style),
    ]
    .into_iter()
    .filter(|(part, _)| !part.is_empty())
    .map(|(part, style)| Span::styled(part.to_string(), style))
    .collect()
}
