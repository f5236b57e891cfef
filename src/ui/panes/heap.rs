//! Heap pane rendering
//!
//! Lists every heap block of the current step in allocation order, freed
//! blocks included. Each block shows its address, size, state and element
//! values, followed by a hex dump of four bytes per row.

use super::utils::{clamp_scroll, pane_block, visible_height};
use crate::memory::bytes::{format_address, format_bytes};
use crate::memory::INT_SIZE;
use crate::snapshot::{MemoryBlock, Step};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};

/// Scroll state for the heap pane
#[derive(Debug, Default)]
pub struct HeapScrollState {
    pub offset: usize,
    pub prev_item_count: usize,
}

/// Render the heap pane
pub fn render_heap_pane(
    frame: &mut Frame,
    area: Rect,
    step: Option<&Step>,
    is_focused: bool,
    scroll_state: &mut HeapScrollState,
) {
    let block = pane_block(" Heap Memory ", is_focused);
    let items: Vec<ListItem> = match step {
        Some(step) if !step.heap.is_empty() => step.heap.iter().flat_map(block_items).collect(),
        _ => vec![ListItem::new("(no allocations)").style(Style::default().fg(DEFAULT_THEME.comment))],
    };

    let visible = visible_height(area);
    let total = items.len();

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

fn block_items(block: &MemoryBlock) -> Vec<ListItem<'static>> {
    let (state, state_style) = if block.live {
        (" LIVE ", Style::default().bg(DEFAULT_THEME.success).fg(Color::Black))
    } else {
        (
            " FREED ",
            Style::default()
                .bg(DEFAULT_THEME.error)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
    };

    let mut items = vec![ListItem::new(Line::from(vec![
        Span::styled(
            format_address(block.address),
            Style::default().fg(DEFAULT_THEME.address),
        ),
        Span::raw(" | "),
        Span::styled(
            format!("{} bytes", block.size),
            Style::default().fg(DEFAULT_THEME.primary),
        ),
        Span::raw(" "),
        Span::styled(state, state_style),
        Span::raw(" "),
        Span::styled(block.name.clone(), Style::default().fg(DEFAULT_THEME.fg)),
        Span::styled(
            format!(": {}", block.type_name),
            Style::default().fg(DEFAULT_THEME.type_name),
        ),
    ]))];

    let value_style = if block.live {
        Style::default().fg(DEFAULT_THEME.number)
    } else {
        Style::default()
            .fg(DEFAULT_THEME.comment)
            .add_modifier(Modifier::CROSSED_OUT)
    };
    items.push(ListItem::new(Line::from(Span::styled(
        format!("  {}", block.value),
        value_style,
    ))));

    for (row, chunk) in block.bytes.chunks(INT_SIZE).enumerate() {
        let address = block.address.saturating_add((row * INT_SIZE) as u64);
        items.push(ListItem::new(Line::from(vec![
            Span::styled(
                format!("  {}: ", format_address(address)),
                Style::default().fg(DEFAULT_THEME.comment),
            ),
            Span::styled(format_bytes(chunk), Style::default().fg(DEFAULT_THEME.fg)),
        ])));
    }

    items
}
