//! Source code pane rendering with syntax highlighting
//!
//! This module renders the source code pane, which displays the traced C
//! program with basic syntax highlighting and the line of the current step.
//!
//! # Features
//!
//! - Syntax highlighting for C keywords, types, strings, numbers, and comments
//! - Current line highlighting with a marker
//! - The current line is kept at a fixed row while stepping
//! - Line numbering
//!
//! # Rendering
//!
//! The pane uses a simple character-by-character tokenizer to apply syntax
//! highlighting styles without running the tracer's lexer.

use super::utils::{pane_block, visible_height};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Simple syntax highlighting for one line of C
fn highlight_source_code(line: &str) -> Line<'_> {
    let mut spans = Vec::new();
    let mut current_word = String::new();
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let mut i = 0;

    while i < chars.len() {
        let (byte_idx, c) = chars[i];

        // Line comments run to the end of the line
        if c == '/' && chars.get(i + 1).is_some_and(|(_, next)| *next == '/') {
            flush_word(&mut spans, &mut current_word, false);
            spans.push(Span::styled(
                &line[byte_idx..],
                Style::default().fg(DEFAULT_THEME.comment),
            ));
            break;
        }

        if c == '"' || c == '\'' {
            flush_word(&mut spans, &mut current_word, false);
            let mut end = i + 1;
            while end < chars.len() && chars[end].1 != c {
                end += if chars[end].1 == '\\' { 2 } else { 1 };
            }
            end = (end + 1).min(chars.len());
            let end_byte = chars.get(end).map_or(line.len(), |(b, _)| *b);
            spans.push(Span::styled(
                &line[byte_idx..end_byte],
                Style::default().fg(DEFAULT_THEME.string),
            ));
            i = end;
            continue;
        }

        if !c.is_alphanumeric() && c != '_' {
            flush_word(&mut spans, &mut current_word, c == '(');

            let style = match c {
                '{' | '}' | '(' | ')' | '[' | ']' => Style::default().fg(DEFAULT_THEME.primary),
                '#' => Style::default().fg(DEFAULT_THEME.keyword),
                _ => Style::default().fg(DEFAULT_THEME.fg),
            };
            spans.push(Span::styled(c.to_string(), style));
            i += 1;
            continue;
        }

        current_word.push(c);
        i += 1;
    }

    flush_word(&mut spans, &mut current_word, false);
    Line::from(spans)
}

fn flush_word(spans: &mut Vec<Span<'_>>, word: &mut String, is_function: bool) {
    if word.is_empty() {
        return;
    }
    let style = get_keyword_style(word, is_function);
    spans.push(Span::styled(std::mem::take(word), style));
}

fn get_keyword_style(word: &str, is_function: bool) -> Style {
    match word {
        "int" | "char" | "void" | "long" | "short" | "unsigned" | "signed" => {
            Style::default().fg(DEFAULT_THEME.type_name)
        }
        "return" | "if" | "else" | "while" | "for" | "do" | "sizeof" => Style::default()
            .fg(DEFAULT_THEME.keyword)
            .add_modifier(Modifier::BOLD),
        "NULL" => Style::default().fg(DEFAULT_THEME.number),
        _ if word.chars().all(|c| c.is_ascii_digit()) => Style::default().fg(DEFAULT_THEME.number),
        _ if is_function => Style::default().fg(DEFAULT_THEME.function),
        _ => Style::default().fg(DEFAULT_THEME.fg),
    }
}

/// Scroll state for the source pane
#[derive(Debug, Default)]
pub struct SourceScrollState {
    pub offset: usize,
    /// Visual row the current line is pinned to (centered on first render)
    pub target_line_row: Option<usize>,
}

/// Render the source code pane. `current_line` is 1-based; 0 highlights
/// nothing.
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    source_lines: &[String],
    current_line: usize,
    is_focused: bool,
    scroll_state: &mut SourceScrollState,
) {
    let block = pane_block(" Source Code ", is_focused);
    let total_lines = source_lines.len();
    let visible_height = visible_height(area);

    let target_row = scroll_state
        .target_line_row
        .unwrap_or(visible_height / 2)
        .min(visible_height.saturating_sub(1));
    scroll_state.target_line_row = Some(target_row);

    if current_line > 0 && current_line <= total_lines {
        scroll_state.offset = (current_line - 1).saturating_sub(target_row);
        if total_lines > visible_height {
            scroll_state.offset = scroll_state.offset.min(total_lines - visible_height);
        } else {
            scroll_state.offset = 0;
        }
    }

    let visible_lines: Vec<Line> = source_lines
        .iter()
        .enumerate()
        .skip(scroll_state.offset)
        .take(visible_height)
        .map(|(idx, line)| {
            let line_num = idx + 1;
            let is_current = line_num == current_line;

            let (marker, num_style) = if is_current {
                (
                    "▶",
                    Style::default()
                        .fg(DEFAULT_THEME.secondary)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                (" ", Style::default().fg(DEFAULT_THEME.comment))
            };

            let mut content = highlight_source_code(line);
            if is_current {
                let background = Style::default().bg(DEFAULT_THEME.current_line_bg);
                for span in &mut content.spans {
                    span.style = span.style.patch(background);
                }
            }

            let mut spans = vec![Span::styled(format!("{}{:4} ", marker, line_num), num_style)];
            spans.extend(content.spans);
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(visible_lines).block(block), area);
}
