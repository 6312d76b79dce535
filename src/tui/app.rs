use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;

use crate::core::gateway::GenerationClient;
use crate::core::session::Session;
use crate::tui::events::{AppEvent, Notification, NotificationLevel};
use crate::tui::services::Services;
use crate::tui::theme;
use crate::tui::views::chat::{ChatResult, ChatState};
use crate::tui::views::setup::{SetupResult, SetupState, StatusKind};

const MAX_VISIBLE_NOTIFICATIONS: usize = 3;

/// Central application state (Elm architecture).
pub struct AppState {
    /// Whether the app is still running.
    pub running: bool,
    /// Bootstrap phase, in-flight gate and transcript.
    pub session: Session,
    /// Gateway client, present from key acceptance until revocation.
    client: Option<Arc<GenerationClient>>,
    /// Key entry view state.
    pub setup: SetupState,
    /// Transcript view state.
    pub chat: ChatState,
    /// Active notifications.
    pub notifications: Vec<Notification>,
    /// Monotonic counter for notification IDs.
    notification_counter: u64,
    /// Receiver for backend events.
    event_rx: mpsc::UnboundedReceiver<AppEvent>,
    /// Backend services handle.
    services: Services,
}

impl AppState {
    pub fn new(event_rx: mpsc::UnboundedReceiver<AppEvent>, services: Services) -> Self {
        Self {
            running: true,
            session: Session::new(),
            client: None,
            setup: SetupState::new(),
            chat: ChatState::new(),
            notifications: Vec::new(),
            notification_counter: 0,
            event_rx,
            services,
        }
    }

    // ── Elm event loop ──────────────────────────────────────────────────

    /// Main event loop: render → select → update → loop.
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        tick_rate: Duration,
    ) -> io::Result<()> {
        let mut tick_interval = tokio::time::interval(tick_rate);
        let mut event_stream = EventStream::new();

        while self.running {
            terminal.draw(|frame| self.render(frame))?;

            tokio::select! {
                _ = tick_interval.tick() => {
                    self.on_tick();
                }
                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event);
                }
                Some(Ok(crossterm_event)) = event_stream.next() => {
                    self.handle_event(AppEvent::Input(crossterm_event));
                }
            }
        }

        Ok(())
    }

    // ── Event handling ──────────────────────────────────────────────────

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Input(crossterm_event) => self.handle_input(crossterm_event),
            AppEvent::BootstrapComplete(result) => self.on_bootstrap_complete(result),
            AppEvent::GenerationComplete(result) => self.on_generation_complete(result),
            AppEvent::Notification(n) => self.notify(n.message, n.level),
            AppEvent::Tick => self.on_tick(),
            AppEvent::Quit => self.running = false,
        }
    }

    fn handle_input(&mut self, event: Event) {
        if let Event::Key(key) = &event {
            if key.kind == KeyEventKind::Press
                && key.code == KeyCode::Char('c')
                && key.modifiers.contains(KeyModifiers::CONTROL)
            {
                self.running = false;
                return;
            }
        }

        if self.session.is_ready() {
            if let ChatResult::Send(description) = self.chat.handle_input(&event, &self.session)
            {
                self.send_experiment(&description);
            }
        } else if let SetupResult::Submit(raw_key) = self.setup.handle_input(&event) {
            self.submit_key(&raw_key);
        }
    }

    fn submit_key(&mut self, raw_key: &str) {
        match self.session.submit_key(raw_key) {
            Ok(key) => {
                self.client = Some(Arc::new(GenerationClient::new(
                    &self.services.config.generation,
                    key,
                )));
                self.setup.busy = true;
                self.setup.set_status(
                    "Setting API Key and loading equipment data…",
                    StatusKind::Loading,
                );
                self.services.spawn_bootstrap();
            }
            Err(e) => {
                self.setup.set_status(e.to_string(), StatusKind::Error);
            }
        }
    }

    fn send_experiment(&mut self, description: &str) {
        let Some(prompt) = self.session.begin_turn(description) else {
            // Gate refused: a request is already pending for this turn
            self.notify(
                "A request is already in progress — please wait.",
                NotificationLevel::Warning,
            );
            return;
        };
        match &self.client {
            Some(client) => {
                self.services.spawn_generation(Arc::clone(client), prompt);
            }
            None => {
                // Ready without a client should be impossible
                log::error!("Session ready but no generation client — revoking key");
                self.session
                    .finish_turn(Err(crate::core::gateway::GenerationError::Http {
                        status: 0,
                        message: "internal: API key state lost".to_string(),
                    }));
            }
        }
    }

    fn on_bootstrap_complete(
        &mut self,
        result: Result<crate::core::inventory::Inventories, crate::core::inventory::DataLoadError>,
    ) {
        self.setup.busy = false;
        match result {
            Ok(data) => {
                self.session.data_loaded(data);
                self.setup.set_status(
                    "API Key set and data loaded successfully!",
                    StatusKind::Success,
                );
                self.notify("Equipment data loaded.", NotificationLevel::Success);
            }
            Err(e) => {
                // Readiness stays false; the key is kept so it can be
                // resubmitted without re-typing
                self.setup
                    .set_status(format!("Error loading equipment data: {e}"), StatusKind::Error);
                self.session.data_load_failed(&e);
            }
        }
    }

    fn on_generation_complete(
        &mut self,
        result: Result<String, crate::core::gateway::GenerationError>,
    ) {
        self.session.finish_turn(result);
        if !self.session.is_ready() {
            // The remote rejected the credential: back to key entry
            self.client = None;
            self.setup.busy = false;
            self.setup.clear_input();
            self.setup
                .set_status("API Key validation failed. Please re-enter.", StatusKind::Error);
        }
    }

    fn on_tick(&mut self) {
        if self.session.is_in_flight() {
            self.chat.on_tick();
        }
        for n in &mut self.notifications {
            n.ttl_ticks = n.ttl_ticks.saturating_sub(1);
        }
        self.notifications.retain(|n| n.ttl_ticks > 0);
    }

    pub fn notify(&mut self, message: impl Into<String>, level: NotificationLevel) {
        self.notification_counter += 1;
        self.notifications.push(Notification {
            id: self.notification_counter,
            message: message.into(),
            level,
            ttl_ticks: 60,
        });
        if self.notifications.len() > MAX_VISIBLE_NOTIFICATIONS {
            self.notifications.remove(0);
        }
    }

    // ── Rendering ───────────────────────────────────────────────────────

    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

        self.render_header(frame, chunks[0]);

        if self.session.is_ready() {
            self.chat.render(frame, chunks[1], &self.session);
        } else {
            self.setup.render(frame, chunks[1]);
        }

        self.render_footer(frame, chunks[2]);
        self.render_notifications(frame, area);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let header = Line::from(vec![
            Span::styled(" SYNAPSE ", theme::brand_badge()),
            Span::raw(" Experimental Protocol Generator  "),
            Span::styled(
                format!("[{}]", self.session.phase().label()),
                theme::muted(),
            ),
        ]);
        frame.render_widget(Paragraph::new(header), area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let hints = if self.session.is_ready() {
            " Enter:send  ↑/↓:scroll  ^C:quit "
        } else {
            " Enter:submit key  ^C:quit "
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(hints, theme::key_hint()))),
            area,
        );
    }

    fn render_notifications(&self, frame: &mut Frame, area: Rect) {
        for (i, n) in self.notifications.iter().rev().take(MAX_VISIBLE_NOTIFICATIONS).enumerate()
        {
            let width = (n.message.len() as u16 + 4).min(area.width.saturating_sub(2));
            let rect = Rect {
                x: area.width.saturating_sub(width + 1),
                y: 1 + (i as u16 * 3),
                width,
                height: 3,
            };
            let color = match n.level {
                NotificationLevel::Info => theme::INFO,
                NotificationLevel::Success => theme::SUCCESS,
                NotificationLevel::Warning => theme::WARNING,
                NotificationLevel::Error => theme::ERROR,
            };
            frame.render_widget(Clear, rect);
            frame.render_widget(
                Paragraph::new(Line::from(Span::raw(n.message.clone()))).block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(color)),
                ),
                rect,
            );
        }
    }
}
