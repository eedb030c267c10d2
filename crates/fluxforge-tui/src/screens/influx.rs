//! InfluxDB screen — stored connection targets.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};
use tokio::sync::mpsc::UnboundedSender;

use fluxforge_api::types::{InfluxConfig, InfluxConfigPayload};

use crate::action::{Action, Notification};
use crate::component::Component;
use crate::theme;
use crate::widgets::form::{Form, FormField};

pub struct InfluxScreen {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    configs: Arc<Vec<InfluxConfig>>,
    table_state: TableState,
    form: Option<Form>,
    pending_delete: Option<i64>,
}

impl InfluxScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            action_tx: None,
            configs: Arc::new(Vec::new()),
            table_state: TableState::default(),
            form: None,
            pending_delete: None,
        }
    }

    fn selected(&self) -> Option<&InfluxConfig> {
        self.configs.get(self.table_state.selected().unwrap_or(0))
    }

    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, clippy::as_conversions)]
    fn move_selection(&mut self, delta: isize) {
        let len = self.configs.len();
        if len == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        self.table_state.select(Some(next as usize));
    }

    fn open_form(&mut self) {
        self.form = Some(Form::new(
            "New InfluxDB target",
            vec![
                FormField::new("Name", ""),
                FormField::new("URL", "http://"),
                FormField::masked("Token", ""),
                FormField::new("Org", ""),
                FormField::new("Bucket", ""),
            ],
        ));
    }

    fn submit_form(&mut self) -> Option<Action> {
        let form = self.form.take()?;
        let name = form.value(0).trim().to_owned();
        let url = form.value(1).trim().to_owned();
        let token = form.value(2).trim().to_owned();
        let org = form.value(3).trim().to_owned();
        let bucket = form.value(4).trim().to_owned();

        for (value, label) in [
            (&name, "Name"),
            (&url, "URL"),
            (&token, "Token"),
            (&org, "Org"),
            (&bucket, "Bucket"),
        ] {
            if value.is_empty() {
                return Some(Action::Notify(Notification::error(format!(
                    "{label} is required"
                ))));
            }
        }
        if url.parse::<url::Url>().is_err() {
            return Some(Action::Notify(Notification::error(format!(
                "Invalid URL: {url}"
            ))));
        }

        Some(Action::CreateInflux(InfluxConfigPayload {
            name,
            url,
            token,
            org,
            bucket,
            is_default: self.configs.is_empty(),
        }))
    }
}

impl Component for InfluxScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.form.is_some() {
            return match key.code {
                KeyCode::Esc => {
                    self.form = None;
                    Ok(None)
                }
                KeyCode::Enter => Ok(self.submit_form()),
                _ => {
                    if let Some(form) = self.form.as_mut() {
                        form.handle_key(key);
                    }
                    Ok(None)
                }
            };
        }

        if let Some(id) = self.pending_delete {
            return match key.code {
                KeyCode::Char('y') => {
                    self.pending_delete = None;
                    Ok(Some(Action::DeleteInflux(id)))
                }
                _ => {
                    self.pending_delete = None;
                    Ok(None)
                }
            };
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                Ok(None)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                Ok(None)
            }
            KeyCode::Char('n') => {
                self.open_form();
                Ok(None)
            }
            KeyCode::Char('t') => Ok(self.selected().map(|c| Action::TestInflux(c.id))),
            KeyCode::Char('x') => {
                self.pending_delete = self.selected().map(|c| c.id);
                Ok(None)
            }
            KeyCode::Char('R') => Ok(Some(Action::LoadInflux)),
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::InfluxLoaded(configs) = action {
            self.configs = Arc::clone(configs);
            if self.table_state.selected().is_none() && !self.configs.is_empty() {
                self.table_state.select(Some(0));
            }
            self.move_selection(0);
        }
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([Constraint::Min(4), Constraint::Length(1)]).split(area);

        let block = Block::default()
            .title(" InfluxDB Targets ")
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

        let rows: Vec<Row> = self
            .configs
            .iter()
            .map(|c| {
                let default = if c.is_default {
                    Span::styled("default", theme::badge_collected())
                } else {
                    Span::raw("")
                };
                Row::new(vec![
                    Cell::from(c.id.to_string()),
                    Cell::from(c.name.clone()),
                    Cell::from(c.url.clone()),
                    Cell::from(c.org.clone()),
                    Cell::from(c.bucket.clone()),
                    Cell::from(Line::from(default)),
                    Cell::from(c.device_count.to_string()),
                ])
                .style(theme::table_row())
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(4),
                Constraint::Min(12),
                Constraint::Min(20),
                Constraint::Min(8),
                Constraint::Min(10),
                Constraint::Length(8),
                Constraint::Length(8),
            ],
        )
        .header(
            Row::new(vec!["ID", "Name", "URL", "Org", "Bucket", "Default", "Devices"])
                .style(theme::table_header()),
        )
        .row_highlight_style(theme::table_selected());
        frame.render_stateful_widget(table, inner, &mut self.table_state);

        let footer = if self.pending_delete.is_some() {
            Line::from(vec![
                Span::styled(
                    " Delete this InfluxDB target? ",
                    ratatui::style::Style::default().fg(theme::ERROR_RED),
                ),
                Span::styled("y ", theme::key_hint_key()),
                Span::styled("confirm  ", theme::key_hint()),
                Span::styled("n ", theme::key_hint_key()),
                Span::styled("cancel", theme::key_hint()),
            ])
        } else {
            Line::from(vec![
                Span::styled(" n ", theme::key_hint_key()),
                Span::styled("new  ", theme::key_hint()),
                Span::styled("t ", theme::key_hint_key()),
                Span::styled("test connection  ", theme::key_hint()),
                Span::styled("x ", theme::key_hint_key()),
                Span::styled("delete  ", theme::key_hint()),
                Span::styled("R ", theme::key_hint_key()),
                Span::styled("reload", theme::key_hint()),
            ])
        };
        frame.render_widget(Paragraph::new(footer), layout[1]);

        if let Some(form) = &self.form {
            form.render(frame, area);
        }
    }

    fn wants_input(&self) -> bool {
        self.form.is_some() || self.pending_delete.is_some()
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "influx"
    }
}
