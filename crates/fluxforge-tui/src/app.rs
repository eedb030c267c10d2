//! Application core — event loop, screen management, action dispatch.

use std::collections::HashMap;
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use fluxforge_core::Portal;

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::data_bridge;
use crate::event::{Event, EventReader};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::theme;
use crate::tui::Tui;

/// How many ticks (4 Hz) a toast stays visible.
const NOTIFICATION_TICKS: u8 = 20;

/// Connection status as seen by the TUI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Connected,
    Disconnected,
}

/// Top-level application state and event loop.
pub struct App {
    portal: Portal,
    /// Current active screen.
    active_screen: ScreenId,
    /// Previous screen for GoBack.
    previous_screen: Option<ScreenId>,
    /// All screen components, keyed by ScreenId.
    screens: HashMap<ScreenId, Box<dyn Component>>,
    /// Whether the app should keep running.
    running: bool,
    connection_status: ConnectionStatus,
    help_visible: bool,
    /// Active toast notifications with remaining tick lifetimes.
    notifications: Vec<(Notification, u8)>,
    /// Action sender — components dispatch actions through this.
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    /// Requests forwarded to the portal bridge.
    request_tx: Option<mpsc::UnboundedSender<Action>>,
    cancel: CancellationToken,
}

impl App {
    pub fn new(portal: Portal) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let screens: HashMap<ScreenId, Box<dyn Component>> =
            create_screens().into_iter().collect();

        Self {
            portal,
            active_screen: ScreenId::Dashboard,
            previous_screen: None,
            screens,
            running: true,
            connection_status: ConnectionStatus::default(),
            help_visible: false,
            notifications: Vec::new(),
            action_tx,
            action_rx,
            request_tx: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Initialize all screen components with the action sender.
    fn init_screens(&mut self) -> Result<()> {
        for screen in self.screens.values_mut() {
            screen.init(self.action_tx.clone())?;
        }
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
        Ok(())
    }

    /// Run the main event loop. This is the heart of the TUI.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.init_screens()?;

        // Spawn the portal bridge and request the initial data set. The
        // system config decides whether the setup wizard is shown.
        let request_tx = data_bridge::spawn(
            self.portal.clone(),
            self.action_tx.clone(),
            self.cancel.clone(),
        );
        for initial in [
            Action::LoadSystemConfig,
            Action::LoadSnapshot,
            Action::LoadMetrics,
            Action::LoadInflux,
            Action::LoadTelegraf,
        ] {
            let _ = request_tx.send(initial);
        }
        self.request_tx = Some(request_tx);

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!("TUI event loop started");

        while self.running {
            // 1. Wait for the next event
            let Some(event) = events.next().await else {
                break;
            };

            // 2. Map event → action(s)
            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => {
                    self.action_tx.send(Action::Resize(w, h))?;
                }
                Event::Tick => {
                    self.action_tx.send(Action::Tick)?;
                }
                Event::Render => {
                    self.action_tx.send(Action::Render)?;
                }
            }

            // 3. Drain and process all queued actions
            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        self.cancel.cancel();
        events.stop();
        info!("TUI event loop ended");
        Ok(())
    }

    /// Map a key event to an action. Global keys are handled here;
    /// screen-specific keys are delegated to the active screen component.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Ok(Some(Action::ToggleHelp)),
                _ => Ok(None),
            };
        }

        // A screen in text-entry or modal state consumes everything
        // except Ctrl+C.
        let wants_input = self
            .screens
            .get(&self.active_screen)
            .is_some_and(|s| s.wants_input());
        if wants_input {
            if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
                return Ok(Some(Action::Quit));
            }
            if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                return screen.handle_key_event(key);
            }
            return Ok(None);
        }

        // Global keybindings
        match (key.modifiers, key.code) {
            // Quit
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => return Ok(Some(Action::Quit)),
            (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),

            // Help
            (KeyModifiers::NONE, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),

            // Screen navigation via number keys
            (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='6')) => {
                #[allow(clippy::as_conversions)]
                let n = c as u8 - b'0';
                if let Some(screen) = ScreenId::from_number(n) {
                    return Ok(Some(Action::SwitchScreen(screen)));
                }
            }

            // Tab / Shift+Tab for screen cycling
            (KeyModifiers::NONE, KeyCode::Tab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.next())));
            }
            (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.prev())));
            }

            // Esc — context-dependent back
            (KeyModifiers::NONE, KeyCode::Esc) => return Ok(Some(Action::GoBack)),

            _ => {}
        }

        // Delegate to active screen component
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_key_event(key);
        }

        Ok(None)
    }

    /// Process a single action — update app state and propagate to components.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        // Portal requests leave the UI loop entirely.
        if action.is_portal_request() {
            if let Some(request_tx) = &self.request_tx {
                let _ = request_tx.send(action.clone());
            }
            return Ok(());
        }

        match action {
            Action::Quit => {
                self.running = false;
            }

            Action::SwitchScreen(target) => {
                if *target != self.active_screen {
                    debug!("switching screen: {} → {}", self.active_screen, target);
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(false);
                    }
                    self.previous_screen = Some(self.active_screen);
                    self.active_screen = *target;
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(true);
                    }
                }
            }

            Action::GoBack => {
                if let Some(prev) = self.previous_screen.take() {
                    self.action_tx.send(Action::SwitchScreen(prev))?;
                }
            }

            Action::ToggleHelp => {
                self.help_visible = !self.help_visible;
            }

            Action::Connected => {
                self.connection_status = ConnectionStatus::Connected;
            }

            Action::Disconnected(_) => {
                self.connection_status = ConnectionStatus::Disconnected;
            }

            Action::Notify(notification) => {
                self.notifications
                    .push((notification.clone(), NOTIFICATION_TICKS));
            }

            Action::DismissNotification => {
                self.notifications.clear();
            }

            Action::SystemConfigLoaded(config) => {
                // First-run: force the setup wizard until the portal
                // reports a completed setup.
                if config.setup_complete {
                    if self.active_screen == ScreenId::Setup {
                        self.action_tx
                            .send(Action::SwitchScreen(ScreenId::Dashboard))?;
                    }
                } else {
                    self.action_tx.send(Action::SwitchScreen(ScreenId::Setup))?;
                }
                self.broadcast(action)?;
            }

            Action::Tick => {
                for entry in &mut self.notifications {
                    entry.1 = entry.1.saturating_sub(1);
                }
                self.notifications.retain(|(_, ticks)| *ticks > 0);
                self.broadcast(action)?;
            }

            // Render is handled in the main loop, not here
            Action::Render | Action::Resize(..) => {}

            // Data results fan out to every screen; other actions go to
            // the active screen only.
            Action::SnapshotLoaded(_)
            | Action::MetricsLoaded(_)
            | Action::InfluxLoaded(_)
            | Action::TelegrafLoaded(_)
            | Action::ScanUpdated { .. } => {
                self.broadcast(action)?;
            }

            other => {
                if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                    if let Some(follow_up) = screen.update(other)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Send an action to every screen, queueing any follow-ups.
    fn broadcast(&mut self, action: &Action) -> Result<()> {
        for screen in self.screens.values_mut() {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    /// Render the full application frame.
    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        // Layout: [screen content] [tab bar] [status bar]
        let layout = Layout::vertical([
            Constraint::Min(1),    // Screen content
            Constraint::Length(1), // Tab bar
            Constraint::Length(1), // Status bar
        ])
        .split(area);

        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.render(frame, layout[0]);
        }

        self.render_tab_bar(frame, layout[1]);
        self.render_status_bar(frame, layout[2]);
        self.render_notifications(frame, area);

        if self.help_visible {
            self.render_help_overlay(frame, area);
        }
    }

    /// Render the bottom tab bar showing the six screens.
    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(
                    format!(" {} {} ", id.number(), id.label()),
                    style,
                ))
            })
            .collect();

        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(
                ScreenId::ALL
                    .iter()
                    .position(|&s| s == self.active_screen)
                    .unwrap_or(0),
            );

        frame.render_widget(tabs, area);
    }

    /// Render the bottom status bar with connection status and key hints.
    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let connection_indicator = match &self.connection_status {
            ConnectionStatus::Connected => {
                Span::styled("● connected", Style::default().fg(theme::SUCCESS_GREEN))
            }
            ConnectionStatus::Disconnected => {
                Span::styled("○ disconnected", Style::default().fg(theme::ERROR_RED))
            }
            ConnectionStatus::Connecting => {
                Span::styled("◐ connecting", Style::default().fg(theme::AMBER))
            }
        };

        let hints = Span::styled(" │ ? help  q quit", theme::key_hint());

        let line = Line::from(vec![Span::raw(" "), connection_indicator, hints]);
        frame.render_widget(Paragraph::new(line), area);
    }

    /// Render toast notifications in the top-right corner.
    fn render_notifications(&self, frame: &mut Frame, area: Rect) {
        for (i, (notification, _)) in self.notifications.iter().take(4).enumerate() {
            let style = match notification.level {
                NotificationLevel::Success => Style::default().fg(theme::SUCCESS_GREEN),
                NotificationLevel::Error => Style::default().fg(theme::ERROR_RED),
                NotificationLevel::Info => Style::default().fg(theme::SIGNAL_CYAN),
            };

            #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
            let width = (notification.message.len() as u16 + 4).min(area.width);
            #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
            let y = area.y + 1 + (i as u16) * 3;
            if y + 3 > area.height {
                break;
            }
            let toast = Rect::new(area.x + area.width.saturating_sub(width + 1), y, width, 3);

            frame.render_widget(Clear, toast);
            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(style);
            let inner = block.inner(toast);
            frame.render_widget(block, toast);
            frame.render_widget(
                Paragraph::new(notification.message.clone()).style(style),
                inner,
            );
        }
    }

    /// Render the help overlay centered on screen.
    fn render_help_overlay(&self, frame: &mut Frame, area: Rect) {
        let help_width = 62u16.min(area.width.saturating_sub(4));
        let help_height = 20u16.min(area.height.saturating_sub(4));

        let x = (area.width.saturating_sub(help_width)) / 2;
        let y = (area.height.saturating_sub(help_height)) / 2;

        let help_area = Rect::new(area.x + x, area.y + y, help_width, help_height);

        frame.render_widget(Clear, help_area);
        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            help_area,
        );

        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());

        let inner = block.inner(help_area);
        frame.render_widget(block, help_area);

        let help_text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "  Navigation",
                Style::default().fg(theme::SIGNAL_CYAN),
            )),
            Line::from(vec![
                Span::styled("  1-6       ", theme::key_hint_key()),
                Span::styled("Jump to screen", theme::key_hint()),
            ]),
            Line::from(vec![
                Span::styled("  Tab       ", theme::key_hint_key()),
                Span::styled("Next screen", theme::key_hint()),
            ]),
            Line::from(vec![
                Span::styled("  j/k ↑/↓   ", theme::key_hint_key()),
                Span::styled("Move up/down", theme::key_hint()),
            ]),
            Line::from(vec![
                Span::styled("  Esc       ", theme::key_hint_key()),
                Span::styled("Back / close", theme::key_hint()),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "  Tags screen",
                Style::default().fg(theme::SIGNAL_CYAN),
            )),
            Line::from(vec![
                Span::styled("  Space/a/m ", theme::key_hint_key()),
                Span::styled("Select row / all / by wildcard", theme::key_hint()),
            ]),
            Line::from(vec![
                Span::styled("  / w       ", theme::key_hint_key()),
                Span::styled("Search, wildcard pattern", theme::key_hint()),
            ]),
            Line::from(vec![
                Span::styled("  v b s o   ", theme::key_hint_key()),
                Span::styled("View, group, sort column, order", theme::key_hint()),
            ]),
            Line::from(vec![
                Span::styled("  C c E D x ", theme::key_hint_key()),
                Span::styled("Collect, class, enable, disable, remove", theme::key_hint()),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("  R         ", theme::key_hint_key()),
                Span::styled("Reload from the portal       ", theme::key_hint()),
                Span::styled("q  ", theme::key_hint_key()),
                Span::styled("Quit", theme::key_hint()),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "                         Esc or ? to close",
                theme::key_hint(),
            )),
        ];

        frame.render_widget(Paragraph::new(help_text), inner);
    }
}
