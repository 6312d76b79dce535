//! Transcript + experiment input view.
//!
//! Assistant turns are rendered as markdown; user and system turns are
//! plain styled text. The input is disabled while a request is pending so
//! a second overlapping request cannot be issued for the same turn.

use crossterm::event::{Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::core::session::{Session, Speaker};
use crate::tui::theme;
use crate::tui::widgets::input_buffer::InputBuffer;
use crate::tui::widgets::markdown::render_markdown;

const SPINNER_FRAMES: [&str; 4] = ["⠋", "⠙", "⠸", "⠴"];

/// What the chat view asks the app to do.
pub enum ChatResult {
    Consumed,
    /// Enter pressed with a non-empty description.
    Send(String),
}

pub struct ChatState {
    input: InputBuffer,
    /// Lines scrolled up from the bottom of the transcript.
    scroll_up: u16,
    /// Rendered transcript cache, rebuilt when the entry count changes.
    rendered: Vec<Line<'static>>,
    rendered_entries: usize,
    /// Spinner frame index, advanced on tick while waiting.
    spinner: usize,
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatState {
    pub fn new() -> Self {
        Self {
            input: InputBuffer::new(),
            scroll_up: 0,
            rendered: Vec::new(),
            rendered_entries: 0,
            spinner: 0,
        }
    }

    pub fn on_tick(&mut self) {
        self.spinner = (self.spinner + 1) % SPINNER_FRAMES.len();
    }

    pub fn handle_input(&mut self, event: &Event, session: &Session) -> ChatResult {
        let Event::Key(key) = event else {
            return ChatResult::Consumed;
        };
        if key.kind != KeyEventKind::Press {
            return ChatResult::Consumed;
        }

        match key.code {
            KeyCode::Enter
                if !self.input.is_empty() && session.can_send() =>
            {
                self.scroll_up = 0;
                return ChatResult::Send(self.input.take());
            }
            KeyCode::Char(c) if session.can_send() => self.input.insert_char(c),
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Up => self.scroll_up = self.scroll_up.saturating_add(1),
            KeyCode::Down => self.scroll_up = self.scroll_up.saturating_sub(1),
            KeyCode::PageUp => self.scroll_up = self.scroll_up.saturating_add(10),
            KeyCode::PageDown => self.scroll_up = self.scroll_up.saturating_sub(10),
            _ => {}
        }
        ChatResult::Consumed
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, session: &Session) {
        let chunks =
            Layout::vertical([Constraint::Min(1), Constraint::Length(3)]).split(area);

        self.render_transcript(frame, chunks[0], session);
        self.render_input(frame, chunks[1], session);
    }

    fn render_transcript(&mut self, frame: &mut Frame, area: Rect, session: &Session) {
        if session.transcript().len() != self.rendered_entries {
            self.rebuild(session);
        }

        let inner_height = area.height.saturating_sub(2) as usize;
        let total = self.rendered.len();
        let from_bottom = (self.scroll_up as usize).min(total.saturating_sub(inner_height));
        let offset = total
            .saturating_sub(inner_height)
            .saturating_sub(from_bottom);

        let transcript = Paragraph::new(self.rendered.clone())
            .block(theme::block_default("Transcript"))
            .scroll((offset as u16, 0));
        frame.render_widget(transcript, area);
    }

    fn render_input(&self, frame: &mut Frame, area: Rect, session: &Session) {
        let (line, block) = if session.is_in_flight() {
            (
                Line::from(vec![
                    Span::styled(
                        SPINNER_FRAMES[self.spinner],
                        Style::default().fg(theme::WARNING),
                    ),
                    Span::styled(" Generating protocol…", theme::muted()),
                ]),
                theme::block_default("Experiment"),
            )
        } else {
            (
                Line::from(Span::raw(self.input.text().to_string())),
                theme::block_focused("Experiment"),
            )
        };
        frame.render_widget(Paragraph::new(line).block(block), area);
    }

    fn rebuild(&mut self, session: &Session) {
        self.rendered.clear();
        for entry in session.transcript() {
            match entry.speaker {
                Speaker::User => {
                    self.rendered.push(Line::from(vec![
                        Span::styled(
                            "You: ",
                            Style::default()
                                .fg(theme::ACCENT)
                                .add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(entry.text.clone(), Style::default().fg(theme::TEXT)),
                    ]));
                }
                Speaker::Synapse => {
                    self.rendered.push(Line::from(Span::styled(
                        "Synapse:",
                        Style::default()
                            .fg(theme::PRIMARY_LIGHT)
                            .add_modifier(Modifier::BOLD),
                    )));
                    self.rendered.extend(render_markdown(&entry.text));
                }
                Speaker::System => {
                    self.rendered.push(Line::from(vec![
                        Span::styled("System: ", Style::default().fg(theme::ERROR)),
                        Span::styled(entry.text.clone(), theme::muted()),
                    ]));
                }
            }
            self.rendered.push(Line::raw(""));
        }
        self.rendered_entries = session.transcript().len();
    }
}
