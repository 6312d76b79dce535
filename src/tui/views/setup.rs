//! API key entry view, shown until the session reaches `Ready` (and again
//! whenever the remote API rejects the credential).

use crossterm::event::{Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::tui::theme;
use crate::tui::widgets::input_buffer::InputBuffer;

/// What the setup view asks the app to do.
pub enum SetupResult {
    Consumed,
    /// Enter pressed with a non-empty key.
    Submit(String),
}

/// Status line shown under the input.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Loading,
    Success,
    Error,
}

pub struct SetupState {
    input: InputBuffer,
    status: Option<(String, StatusKind)>,
    /// True while key submission / data loading is pending; input is
    /// ignored for the duration.
    pub busy: bool,
}

impl Default for SetupState {
    fn default() -> Self {
        Self::new()
    }
}

impl SetupState {
    pub fn new() -> Self {
        Self {
            input: InputBuffer::new(),
            status: Some((
                "Enter your Generative Language API key to begin.".to_string(),
                StatusKind::Info,
            )),
            busy: false,
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>, kind: StatusKind) {
        self.status = Some((message.into(), kind));
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
    }

    pub fn handle_input(&mut self, event: &Event) -> SetupResult {
        if self.busy {
            return SetupResult::Consumed;
        }
        if let Event::Key(key) = event {
            if key.kind != KeyEventKind::Press {
                return SetupResult::Consumed;
            }
            match key.code {
                KeyCode::Enter if !self.input.is_empty() => {
                    return SetupResult::Submit(self.input.take());
                }
                KeyCode::Char(c) => self.input.insert_char(c),
                KeyCode::Backspace => self.input.backspace(),
                KeyCode::Left => self.input.move_left(),
                KeyCode::Right => self.input.move_right(),
                _ => {}
            }
        }
        SetupResult::Consumed
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .split(area);

        let intro = Paragraph::new(vec![
            Line::from(Span::styled(
                "Project Synapse needs an API key for the Generative Language API.",
                Style::default().fg(theme::TEXT),
            )),
            Line::from(Span::styled(
                "The key stays in memory for this session only.",
                theme::muted(),
            )),
        ]);
        frame.render_widget(intro, chunks[0]);

        // Never echo the key itself
        let masked = "•".repeat(self.input.char_count());
        let input = Paragraph::new(Line::from(Span::raw(masked)))
            .block(theme::block_focused("API Key"));
        frame.render_widget(input, chunks[1]);

        if let Some((message, kind)) = &self.status {
            let style = match kind {
                StatusKind::Info => theme::muted(),
                StatusKind::Loading => Style::default().fg(theme::WARNING),
                StatusKind::Success => Style::default().fg(theme::SUCCESS),
                StatusKind::Error => Style::default().fg(theme::ERROR),
            };
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(message.clone(), style))),
                chunks[2],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers};

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(state: &mut SetupState, s: &str) {
        for c in s.chars() {
            state.handle_input(&press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_enter_submits_typed_key() {
        let mut state = SetupState::new();
        type_str(&mut state, "AIzaSyD12345abcdef");
        match state.handle_input(&press(KeyCode::Enter)) {
            SetupResult::Submit(key) => assert_eq!(key, "AIzaSyD12345abcdef"),
            _ => panic!("expected Submit"),
        }
    }

    #[test]
    fn test_enter_on_empty_does_nothing() {
        let mut state = SetupState::new();
        assert!(matches!(
            state.handle_input(&press(KeyCode::Enter)),
            SetupResult::Consumed
        ));
    }

    #[test]
    fn test_busy_ignores_input() {
        let mut state = SetupState::new();
        state.busy = true;
        type_str(&mut state, "AIzaKey12345");
        state.busy = false;
        // Nothing was typed while busy
        assert!(matches!(
            state.handle_input(&press(KeyCode::Enter)),
            SetupResult::Consumed
        ));
    }
}
