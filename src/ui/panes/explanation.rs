//! Explanation pane rendering

use super::utils::{clamp_scroll, pane_block, visible_height, wrap_text};
use crate::memory::bytes::format_address;
use crate::snapshot::Step;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Padding, Paragraph},
    Frame,
};

/// What the explanation pane shows
pub enum ExplanationContent<'a> {
    Step(&'a Step),
    /// A trace that failed, or produced no steps
    Notice { text: &'a str, is_error: bool },
}

/// Render the registers and the explanation text of the current step
pub fn render_explanation_pane(
    frame: &mut Frame,
    area: Rect,
    content: ExplanationContent,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = pane_block(" Explanation ", is_focused).padding(Padding::new(1, 0, 0, 0));
    let width = area.width.saturating_sub(3) as usize; // borders and left padding

    let mut lines = Vec::new();
    let body_style = match content {
        ExplanationContent::Step(step) => {
            lines.push(Line::from(vec![
                Span::styled("rsp ", Style::default().fg(DEFAULT_THEME.comment)),
                Span::styled(format_address(step.rsp), Style::default().fg(DEFAULT_THEME.address)),
                Span::styled("  rbp ", Style::default().fg(DEFAULT_THEME.comment)),
                Span::styled(format_address(step.rbp), Style::default().fg(DEFAULT_THEME.address)),
            ]));
            lines.push(Line::from(Span::styled(
                format!("line {}: {}", step.line, step.code),
                Style::default()
                    .fg(DEFAULT_THEME.secondary)
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::default());
            wrap_text(&step.explanation, width)
                .into_iter()
                .for_each(|text| lines.push(Line::from(text)));
            Style::default().fg(DEFAULT_THEME.fg)
        }
        ExplanationContent::Notice { text, is_error } => {
            wrap_text(text, width)
                .into_iter()
                .for_each(|text| lines.push(Line::from(text)));
            if is_error {
                Style::default()
                    .fg(DEFAULT_THEME.error)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.comment)
            }
        }
    };

    let visible = visible_height(area);
    clamp_scroll(scroll_offset, lines.len(), visible);

    let visible_lines: Vec<Line> = lines
        .into_iter()
        .skip(*scroll_offset)
        .take(visible)
        .collect();

    let paragraph = Paragraph::new(visible_lines).block(block).style(body_style);
    frame.render_widget(paragraph, area);
}
