//! Stack pane rendering
//!
//! Shows every variable of the current step in declaration order:
//! - Name, type and value on the first row
//! - Address and raw little-endian bytes on the second row
//! - For pointers, an arrow to the variable or heap block it points to

use super::utils::{clamp_scroll, pane_block, visible_height};
use crate::memory::bytes::{format_address, format_bytes};
use crate::snapshot::{MemoryBlock, Step};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};

/// Scroll state for the stack pane
#[derive(Debug, Default)]
pub struct StackScrollState {
    pub offset: usize,
    pub prev_item_count: usize,
}

/// Render the stack pane for `step` (or an empty pane when there is none)
pub fn render_stack_pane(
    frame: &mut Frame,
    area: Rect,
    step: Option<&Step>,
    is_focused: bool,
    scroll_state: &mut StackScrollState,
) {
    let block = pane_block(" Stack ", is_focused);
    let items: Vec<ListItem> = match step {
        Some(step) if !step.stack.is_empty() => stack_items(step),
        _ => vec![ListItem::new("(empty)").style(Style::default().fg(DEFAULT_THEME.comment))],
    };

    let visible = visible_height(area);
    let total = items.len();

    // Follow new variables as they appear at the bottom
    if total > scroll_state.prev_item_count && total > visible {
        scroll_state.offset = total - visible;
    }
    scroll_state.prev_item_count = total;
    clamp_scroll(&mut scroll_state.offset, total, visible);

    let visible_items: Vec<ListItem> = items
        .into_iter()
        .skip(scroll_state.offset)
        .take(visible)
        .collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}

fn stack_items(step: &Step) -> Vec<ListItem<'static>> {
    let mut items = Vec::new();

    for var in &step.stack {
        let changed = mentions(&step.code, &var.name);
        let name_style = if changed {
            Style::default()
                .fg(DEFAULT_THEME.secondary)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(DEFAULT_THEME.fg)
        };

        items.push(ListItem::new(Line::from(vec![
            Span::styled(var.name.clone(), name_style),
            Span::styled(": ", Style::default().fg(DEFAULT_THEME.comment)),
            Span::styled(var.type_name.clone(), Style::default().fg(DEFAULT_THEME.type_name)),
            Span::styled(" = ", Style::default().fg(DEFAULT_THEME.comment)),
            Span::styled(var.value.clone(), value_style(var)),
        ])));

        items.push(ListItem::new(Line::from(vec![
            Span::styled(
                format!("  {} ", format_address(var.address)),
                Style::default().fg(DEFAULT_THEME.comment),
            ),
            Span::styled(format_bytes(&var.bytes), Style::default().fg(DEFAULT_THEME.number)),
        ])));

        if let Some(target) = var.points_to {
            items.push(ListItem::new(Line::from(vec![
                Span::styled("  └─▶ ", Style::default().fg(DEFAULT_THEME.address)),
                Span::styled(pointee_label(step, target), Style::default().fg(DEFAULT_THEME.address)),
            ])));
        }
    }

    items
}

fn value_style(var: &MemoryBlock) -> Style {
    if var.value == "freed" {
        Style::default()
            .fg(DEFAULT_THEME.error)
            .add_modifier(Modifier::BOLD)
    } else if var.points_to.is_some() {
        Style::default().fg(DEFAULT_THEME.address)
    } else {
        Style::default().fg(DEFAULT_THEME.number)
    }
}

/// Whether `code` uses `name` as a whole identifier
fn mentions(code: &str, name: &str) -> bool {
    code.split(|c: char| !c.is_alphanumeric() && c != '_')
        .any(|word| word == name)
}

/// `x`, `*p (heap)`, `*p (freed)` or the bare address
fn pointee_label(step: &Step, target: u64) -> String {
    if let Some(var) = step.stack.iter().find(|v| v.address == target) {
        return var.name.clone();
    }
    match step.heap.iter().find(|b| b.address == target) {
        Some(block) if block.live => format!("{} (heap)", block.name),
        Some(block) => format!("{} (freed)", block.name),
        None => format_address(target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mentions_whole_identifiers_only() {
        assert!(mentions("*p = 20", "p"));
        assert!(mentions("arr[1] = 2", "arr"));
        assert!(!mentions("int max = 1", "x"));
    }
}
