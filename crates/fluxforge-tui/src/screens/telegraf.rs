//! Telegraf screen — read-only view of the generated configuration.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use tokio::sync::mpsc::UnboundedSender;

use crate::action::{Action, Notification};
use crate::component::Component;
use crate::theme;

const DOWNLOAD_PATH: &str = "telegraf.conf";

pub struct TelegrafScreen {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    config: Option<Arc<String>>,
    scroll: u16,
}

impl TelegrafScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            action_tx: None,
            config: None,
            scroll: 0,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    fn max_scroll(&self) -> u16 {
        self.config
            .as_ref()
            .map_or(0, |c| c.lines().count().min(u16::MAX.into()) as u16)
            .saturating_sub(1)
    }

    /// Write the current config to the working directory.
    fn download(&self) -> Option<Action> {
        let config = self.config.as_ref()?;
        match std::fs::write(DOWNLOAD_PATH, config.as_bytes()) {
            Ok(()) => Some(Action::Notify(Notification::success(format!(
                "Written to ./{DOWNLOAD_PATH}"
            )))),
            Err(e) => Some(Action::Notify(Notification::error(format!(
                "Write failed: {e}"
            )))),
        }
    }
}

impl Component for TelegrafScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.scroll = (self.scroll + 1).min(self.max_scroll());
                Ok(None)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.scroll = self.scroll.saturating_sub(1);
                Ok(None)
            }
            KeyCode::PageDown => {
                self.scroll = (self.scroll + 20).min(self.max_scroll());
                Ok(None)
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(20);
                Ok(None)
            }
            KeyCode::Home => {
                self.scroll = 0;
                Ok(None)
            }
            KeyCode::Char('d') => Ok(self.download()),
            KeyCode::Char('R') => Ok(Some(Action::LoadTelegraf)),
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::TelegrafLoaded(config) = action {
            self.config = Some(Arc::clone(config));
            self.scroll = 0;
        }
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([Constraint::Min(4), Constraint::Length(1)]).split(area);

        let block = Block::default()
            .title(" Telegraf Configuration ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(layout[0]);
        frame.render_widget(block, layout[0]);

        let body = self.config.as_ref().map_or_else(
            || "Loading Telegraf configuration...".to_owned(),
            |c| c.as_ref().clone(),
        );
        frame.render_widget(
            Paragraph::new(body)
                .style(theme::table_row())
                .scroll((self.scroll, 0)),
            inner,
        );

        let footer = Line::from(vec![
            Span::styled(" j/k ", theme::key_hint_key()),
            Span::styled("scroll  ", theme::key_hint()),
            Span::styled("d ", theme::key_hint_key()),
            Span::styled("download  ", theme::key_hint()),
            Span::styled("R ", theme::key_hint_key()),
            Span::styled("reload", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(footer), layout[1]);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "telegraf"
    }
}
