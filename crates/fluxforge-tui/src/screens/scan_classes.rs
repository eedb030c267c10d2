//! Scan classes screen — polling-rate groups with default management.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};
use tokio::sync::mpsc::UnboundedSender;

use fluxforge_api::types::{ScanClass, ScanClassPayload};
use fluxforge_core::TagSnapshot;

use crate::action::{Action, Notification};
use crate::component::Component;
use crate::theme;
use crate::widgets::form::{Form, FormField};

pub struct ScanClassesScreen {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    snapshot: Arc<TagSnapshot>,
    table_state: TableState,
    form: Option<Form>,
    pending_delete: Option<i64>,
}

impl ScanClassesScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            action_tx: None,
            snapshot: Arc::new(TagSnapshot::default()),
            table_state: TableState::default(),
            form: None,
            pending_delete: None,
        }
    }

    fn classes(&self) -> &[ScanClass] {
        &self.snapshot.scan_classes
    }

    fn selected(&self) -> Option<&ScanClass> {
        self.classes().get(self.table_state.selected().unwrap_or(0))
    }

    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, clippy::as_conversions)]
    fn move_selection(&mut self, delta: isize) {
        let len = self.classes().len();
        if len == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        self.table_state.select(Some(next as usize));
    }

    fn open_form(&mut self) {
        self.form = Some(Form::new(
            "New scan class",
            vec![
                FormField::new("Name", ""),
                FormField::new("Interval (ms)", "1000"),
                FormField::new("Description", ""),
            ],
        ));
    }

    /// Validate the form client-side; nothing is sent when it fails.
    fn submit_form(&mut self) -> Option<Action> {
        let form = self.form.take()?;
        let name = form.value(0).trim().to_owned();
        if name.is_empty() {
            return Some(Action::Notify(Notification::error("Name is required")));
        }
        let interval_ms = match form.value(1).trim().parse::<u64>() {
            Ok(v) if v >= 1 => v,
            _ => {
                return Some(Action::Notify(Notification::error(
                    "Interval must be a number >= 1",
                )));
            }
        };

        Some(Action::CreateScanClass {
            payload: ScanClassPayload {
                name,
                interval_ms,
                description: form.value(2).trim().to_owned(),
            },
            make_default: false,
        })
    }
}

impl Component for ScanClassesScreen {
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
                    Ok(Some(Action::DeleteScanClass(id)))
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
            KeyCode::Char('d') => Ok(self
                .selected()
                .map(|sc| Action::SetDefaultScanClass(sc.id))),
            KeyCode::Char('D') => Ok(self
                .selected()
                .filter(|sc| sc.is_default)
                .map(|sc| Action::ClearDefaultScanClass(sc.id))),
            KeyCode::Char('x') => {
                self.pending_delete = self.selected().map(|sc| sc.id);
                Ok(None)
            }
            KeyCode::Char('R') => Ok(Some(Action::LoadSnapshot)),
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::SnapshotLoaded(snapshot) = action {
            self.snapshot = Arc::clone(snapshot);
            if self.table_state.selected().is_none() && !self.classes().is_empty() {
                self.table_state.select(Some(0));
            }
            self.move_selection(0);
        }
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([Constraint::Min(4), Constraint::Length(1)]).split(area);

        let block = Block::default()
            .title(" Scan Classes ")
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
            .classes()
            .iter()
            .map(|sc| {
                let default = if sc.is_default {
                    Span::styled("default", theme::badge_collected())
                } else {
                    Span::raw("")
                };
                Row::new(vec![
                    Cell::from(sc.id.to_string()),
                    Cell::from(sc.name.clone()),
                    Cell::from(format!("{} ms", sc.interval_ms)),
                    Cell::from(Line::from(default)),
                    Cell::from(sc.tag_count.to_string()),
                    Cell::from(sc.description.clone()),
                ])
                .style(theme::table_row())
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(4),
                Constraint::Min(14),
                Constraint::Length(10),
                Constraint::Length(8),
                Constraint::Length(6),
                Constraint::Min(16),
            ],
        )
        .header(
            Row::new(vec!["ID", "Name", "Interval", "Default", "Tags", "Description"])
                .style(theme::table_header()),
        )
        .row_highlight_style(theme::table_selected());
        frame.render_stateful_widget(table, inner, &mut self.table_state);

        let footer = if self.pending_delete.is_some() {
            Line::from(vec![
                Span::styled(
                    " Delete this scan class? Its tags fall back to no scan class. ",
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
                Span::styled("d ", theme::key_hint_key()),
                Span::styled("set default  ", theme::key_hint()),
                Span::styled("D ", theme::key_hint_key()),
                Span::styled("clear default  ", theme::key_hint()),
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
        "scan-classes"
    }
}
