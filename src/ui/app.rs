//! Main TUI application state and logic

use super::panes::{
    render_explanation_pane, render_heap_pane, render_source_pane, render_stack_pane,
    render_status_bar, ExplanationContent, HeapScrollState, SourceScrollState, StackScrollState,
};
use crate::snapshot::{Step, TraceResult};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Stack,
    Heap,
    Explanation,
}

impl FocusedPane {
    /// Move focus to the next pane (clockwise: source -> explanation -> stack -> heap)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Explanation,
            FocusedPane::Explanation => FocusedPane::Stack,
            FocusedPane::Stack => FocusedPane::Heap,
            FocusedPane::Heap => FocusedPane::Source,
        }
    }

    /// Move focus to the previous pane (counter-clockwise)
    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Heap,
            FocusedPane::Explanation => FocusedPane::Source,
            FocusedPane::Stack => FocusedPane::Explanation,
            FocusedPane::Heap => FocusedPane::Stack,
        }
    }
}

/// The main application state
pub struct App {
    /// The finished trace being browsed
    pub result: TraceResult,

    /// Index of the step on screen
    pub position: usize,

    /// Currently focused pane
    pub focused_pane: FocusedPane,

    /// Per-pane scroll state
    pub source_scroll: SourceScrollState,
    pub stack_scroll: StackScrollState,
    pub heap_scroll: HeapScrollState,
    pub explanation_scroll: usize,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,

    /// Whether auto-play mode is active
    pub is_playing: bool,

    /// Last time a step was taken in play mode
    pub last_play_time: Instant,

    /// Last time space was pressed (for debouncing)
    pub last_space_press: Instant,
}

impl App {
    pub fn new(result: TraceResult) -> Self {
        let status_message = if !result.success {
            "Trace failed".to_string()
        } else if result.steps.is_empty() {
            "No steps to show".to_string()
        } else {
            "Ready!".to_string()
        };
        let now = Instant::now();

        App {
            result,
            position: 0,
            focused_pane: FocusedPane::Source,
            source_scroll: SourceScrollState::default(),
            stack_scroll: StackScrollState::default(),
            heap_scroll: HeapScrollState::default(),
            explanation_scroll: 0,
            should_quit: false,
            status_message,
            is_playing: false,
            last_play_time: now,
            last_space_press: now.checked_sub(Duration::from_secs(1)).unwrap_or(now),
        }
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.result.steps.get(self.position)
    }

    pub fn total_steps(&self) -> usize {
        self.result.steps.len()
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if self.is_playing && self.last_play_time.elapsed() >= Duration::from_secs(1) {
                if self.step_forward() {
                    self.status_message = "Playing...".to_string();
                } else {
                    self.is_playing = false;
                    self.status_message = "Playback complete".to_string();
                }
                self.last_play_time = Instant::now();
            }

            // Use poll with timeout to allow auto-play to work
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(frame.area());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(main_chunks[0]);

        // Left column: Source (top) | Explanation (bottom)
        let left_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(columns[0]);

        // Right column: Stack (top) | Heap (bottom)
        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(columns[1]);

        let step = self.result.steps.get(self.position);

        render_source_pane(
            frame,
            left_rows[0],
            &self.result.source_lines,
            step.map_or(0, |s| s.line),
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        let content = match (step, &self.result.message) {
            (Some(step), _) => ExplanationContent::Step(step),
            (None, Some(message)) => ExplanationContent::Notice {
                text: message,
                is_error: !self.result.success,
            },
            (None, None) => ExplanationContent::Notice {
                text: "No recognized statements inside main().",
                is_error: false,
            },
        };
        render_explanation_pane(
            frame,
            left_rows[1],
            content,
            self.focused_pane == FocusedPane::Explanation,
            &mut self.explanation_scroll,
        );

        render_stack_pane(
            frame,
            right_rows[0],
            step,
            self.focused_pane == FocusedPane::Stack,
            &mut self.stack_scroll,
        );

        render_heap_pane(
            frame,
            right_rows[1],
            step,
            self.focused_pane == FocusedPane::Heap,
            &mut self.heap_scroll,
        );

        render_status_bar(
            frame,
            main_chunks[1],
            &self.status_message,
            self.position,
            self.total_steps(),
            !self.result.success,
            self.is_playing,
        );
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            // Number keys step forward N times directly
            KeyCode::Char(c @ '1'..='9') => {
                self.is_playing = false;
                let n = c.to_digit(10).unwrap_or(1);
                let stepped = (0..n).take_while(|_| self.step_forward()).count();
                self.status_message = format!("Stepped forward {} step(s)", stepped);
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.prev();
            }
            KeyCode::Left => {
                self.is_playing = false;
                self.status_message = if self.step_backward() {
                    "Stepped backward".to_string()
                } else {
                    "Already at the first step".to_string()
                };
            }
            KeyCode::Right => {
                self.is_playing = false;
                self.status_message = if self.step_forward() {
                    "Stepped forward".to_string()
                } else {
                    "Already at the last step".to_string()
                };
            }
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Source => {
                    // Scrolling up makes the current line move down visually
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_add(1));
                    }
                }
                FocusedPane::Stack => {
                    self.stack_scroll.offset = self.stack_scroll.offset.saturating_sub(1);
                }
                FocusedPane::Heap => {
                    self.heap_scroll.offset = self.heap_scroll.offset.saturating_sub(1);
                }
                FocusedPane::Explanation => {
                    self.explanation_scroll = self.explanation_scroll.saturating_sub(1);
                }
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Source => {
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_sub(1));
                    }
                }
                FocusedPane::Stack => {
                    self.stack_scroll.offset = self.stack_scroll.offset.saturating_add(1);
                }
                FocusedPane::Heap => {
                    self.heap_scroll.offset = self.heap_scroll.offset.saturating_add(1);
                }
                FocusedPane::Explanation => {
                    self.explanation_scroll = self.explanation_scroll.saturating_add(1);
                }
            },
            KeyCode::Char(' ') => {
                // Toggle auto-play mode (with 200ms debounce to prevent key repeat spam)
                if self.last_space_press.elapsed() >= Duration::from_millis(200) {
                    self.last_space_press = Instant::now();
                    self.is_playing = !self.is_playing;
                    if self.is_playing {
                        let now = Instant::now();
                        self.last_play_time = now.checked_sub(Duration::from_secs(1)).unwrap_or(now);
                        self.status_message = "Playing...".to_string();
                    } else {
                        self.status_message = "Paused".to_string();
                    }
                }
            }
            KeyCode::Enter => {
                self.is_playing = false;
                self.jump_to(self.total_steps().saturating_sub(1));
                self.status_message = "Jumped to end".to_string();
            }
            KeyCode::Backspace => {
                self.is_playing = false;
                self.jump_to(0);
                self.status_message = "Jumped to start".to_string();
            }
            _ => {}
        }
    }

    /// Advance one step; false when already at the last one
    fn step_forward(&mut self) -> bool {
        if self.position + 1 < self.total_steps() {
            self.jump_to(self.position + 1);
            true
        } else {
            false
        }
    }

    fn step_backward(&mut self) -> bool {
        if self.position > 0 {
            self.jump_to(self.position - 1);
            true
        } else {
            false
        }
    }

    fn jump_to(&mut self, position: usize) {
        self.position = position;
        self.explanation_scroll = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracer::trace;
    use crossterm::event::KeyModifiers;

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn app() -> App {
        App::new(trace(
            "int main() {\n  int a = 1;\n  int b = 2;\n  int c = 3;\n  return 0;\n}",
            None,
        ))
    }

    #[test]
    fn test_stepping_is_bounded() {
        let mut app = app();
        assert_eq!(app.total_steps(), 4);

        press(&mut app, KeyCode::Left);
        assert_eq!(app.position, 0);

        press(&mut app, KeyCode::Char('9'));
        assert_eq!(app.position, 3);
        assert_eq!(app.status_message, "Stepped forward 3 step(s)");

        press(&mut app, KeyCode::Right);
        assert_eq!(app.position, 3);
        assert_eq!(app.current_step().map(|s| s.line), Some(5));
    }

    #[test]
    fn test_jumps() {
        let mut app = app();

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.position, 3);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.position, 0);
    }

    #[test]
    fn test_focus_cycles() {
        let mut app = app();

        for _ in 0..4 {
            press(&mut app, KeyCode::Tab);
        }
        assert_eq!(app.focused_pane, FocusedPane::Source);

        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.focused_pane, FocusedPane::Heap);
    }

    #[test]
    fn test_empty_trace() {
        let mut app = App::new(trace("int x;", None));

        assert!(app.current_step().is_none());
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.position, 0);

        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
